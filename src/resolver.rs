//! Background section resolution using a dedicated thread and async-channel.
//!
//! Scenes streaming from disk or the network resolve their sections off the
//! main thread: [`SectionResolver`] feeds `(sx, sy)` requests to a worker
//! owning a host-supplied [`SectionLoader`], and resolved sections come back
//! over a channel to be installed into the store on the main thread.
//!
//! High-priority requests (e.g. sections under the viewport) jump the queue;
//! already-started work always runs to completion, and queued work is
//! abandoned when the resolver is dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use async_channel::{Receiver, Sender, TryRecvError};
use bevy::log::{debug, warn};

use crate::scene::Section;

/// Loads (or generates) scene sections; implemented by the host and run on
/// the resolver's worker thread.
pub trait SectionLoader: Send + 'static {
  /// Produces the section with the given section indices, or None when the
  /// scene has no data there.
  fn load(&mut self, sx: i32, sy: i32) -> Option<Section>;
}

/// A request for the worker.
struct ResolveCommand {
  sx: i32,
  sy: i32,
  hipri: bool,
}

/// A resolved section, ready to install.
pub struct ResolvedSection {
  pub sx: i32,
  pub sy: i32,
  pub section: Option<Section>,
}

/// Resolution taking longer than this gets logged.
const SLOW_RESOLVE_MILLIS: u128 = 500;

/// Hands section-resolution work to a background thread.
pub struct SectionResolver {
  cmd_tx: Sender<ResolveCommand>,
  result_rx: Receiver<ResolvedSection>,
  pending: Arc<AtomicUsize>,
  _worker_handle: JoinHandle<()>,
}

impl SectionResolver {
  /// Spawns the worker thread around the given loader.
  pub fn new(loader: impl SectionLoader) -> Self {
    let (cmd_tx, cmd_rx) = async_channel::unbounded::<ResolveCommand>();
    let (result_tx, result_rx) = async_channel::unbounded::<ResolvedSection>();

    let worker_handle = thread::spawn(move || {
      worker_loop(loader, cmd_rx, result_tx);
    });

    Self {
      cmd_tx,
      result_rx,
      pending: Arc::new(AtomicUsize::new(0)),
      _worker_handle: worker_handle,
    }
  }

  /// Queues a section for resolution. High-priority requests are taken
  /// before any queued low-priority ones.
  pub fn resolve(&self, sx: i32, sy: i32, hipri: bool) {
    self.pending.fetch_add(1, Ordering::AcqRel);
    let _ = self.cmd_tx.send_blocking(ResolveCommand { sx, sy, hipri });
  }

  /// Takes the next resolved section, if one is waiting.
  pub fn try_recv(&self) -> Option<ResolvedSection> {
    match self.result_rx.try_recv() {
      Ok(result) => {
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Some(result)
      }
      Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
    }
  }

  /// Requests queued or resolved but not yet collected.
  pub fn pending(&self) -> usize {
    self.pending.load(Ordering::Acquire)
  }
}

fn worker_loop(
  mut loader: impl SectionLoader,
  cmd_rx: Receiver<ResolveCommand>,
  result_tx: Sender<ResolvedSection>,
) {
  let mut queue: VecDeque<ResolveCommand> = VecDeque::new();

  loop {
    // pull everything waiting on the channel so high-priority requests can
    // jump ahead of work queued earlier
    loop {
      match cmd_rx.try_recv() {
        Ok(cmd) if cmd.hipri => queue.push_front(cmd),
        Ok(cmd) => queue.push_back(cmd),
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
      }
    }

    let cmd = match queue.pop_front() {
      Some(cmd) => cmd,
      None => match cmd_rx.recv_blocking() {
        Ok(cmd) => cmd,
        // resolver dropped; abandon whatever never got queued
        Err(_) => return,
      },
    };

    let started = Instant::now();
    let section = loader.load(cmd.sx, cmd.sy);
    let elapsed = started.elapsed().as_millis();
    if elapsed >= SLOW_RESOLVE_MILLIS {
      warn!(
        "section resolution took a long time [sx={}, sy={}, millis={elapsed}]",
        cmd.sx, cmd.sy
      );
    } else {
      debug!(
        "resolved section [sx={}, sy={}, millis={elapsed}]",
        cmd.sx, cmd.sy
      );
    }

    if result_tx
      .send_blocking(ResolvedSection {
        sx: cmd.sx,
        sy: cmd.sy,
        section,
      })
      .is_err()
    {
      return;
    }
  }
}
