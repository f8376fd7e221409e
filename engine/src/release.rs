//! Deferred surface release.
//!
//! The native dialog animates its own dismissal after `stop`. Tearing the
//! object down during that animation glitches or faults, so `close` hands
//! the surface to a detached worker that drops it after a grace delay.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};
use tracing::debug;
use uuid::Uuid;

use crate::surface::SurfaceHandle;

/// Grace delay between `stop` and release.
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_millis(900);

/// Tracks one scheduled release. Dropping the ticket does not cancel it.
#[derive(Debug)]
pub struct ReleaseTicket {
    handle_id: Uuid,
    done: Receiver<()>,
}

impl ReleaseTicket {
    /// Identity of the surface handle this release was issued for.
    pub fn handle_id(&self) -> Uuid {
        self.handle_id
    }

    /// Returns true once the surface has been dropped.
    pub fn is_released(&self) -> bool {
        match self.done.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }

    /// Block until the surface has been dropped.
    pub fn wait(&self) {
        // A disconnect also means the worker is gone
        let _ = self.done.recv();
    }

    /// Block up to `timeout`. Returns true if the surface was dropped in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

/// Drop `handle` on a worker thread after `delay`.
///
/// Returns immediately. The release always fires; there is no way to call
/// it off.
pub fn schedule_release(handle: SurfaceHandle, delay: Duration) -> ReleaseTicket {
    let handle_id = handle.id();
    let (tx, rx) = bounded::<()>(1);

    thread::spawn(move || {
        thread::sleep(delay);
        drop(handle);
        debug!(handle = %handle_id, "Released progress dialog surface");
        let _ = tx.send(());
    });

    ReleaseTicket {
        handle_id,
        done: rx,
    }
}
