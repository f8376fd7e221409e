//! # OpDialog Engine - Operation Progress Dialog Library
//!
//! A headless controller for the operating system's file-operation progress
//! dialog (the copy/move/download dialog with time remaining and
//! pause/cancel buttons).
//!
//! ## Overview
//!
//! The engine does not draw anything. It keeps the state the dialog should
//! show and forwards it to a presentation surface:
//! - Lifecycle gating (not started, running, disposed, errored)
//! - Three progress axes (points, bytes, items) with an item-driven estimate mode
//! - Source, destination and current-item locations resolved from strings
//! - Deferred release of the native dialog after it is closed
//! - Read-only observation of the user's pause/cancel choice
//!
//! ## Basic Usage
//!
//! ```no_run
//! use opdialog_engine::{DialogSession, LocationResolver, OperationKind};
//! # use opdialog_engine::SurfaceFactory;
//!
//! # fn run(factory: Box<dyn SurfaceFactory>) -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = LocationResolver::filesystem(std::env::current_dir()?);
//! let mut dialog = DialogSession::new(factory, resolver);
//!
//! dialog.set_operation(OperationKind::Copying)?;
//! dialog.set_items_total(3)?;
//! dialog.show(None)?;
//!
//! for (index, name) in ["a.txt", "b.txt", "c.txt"].iter().enumerate() {
//!     if dialog.has_user_cancelled() {
//!         break;
//!     }
//!     dialog.update_current_item(name)?;
//!     dialog.set_items_current(index as u64 + 1)?;
//! }
//!
//! dialog.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Status, option sets, progress axes, locations
//! - **error**: Error types and handling
//! - **surface**: Presentation surface and factory traits
//! - **location**: Path/URL resolution with working-context fallback
//! - **release**: Deferred release of closed surfaces
//! - **session**: The dialog controller
//! - **config**: Serializable session configuration
//! - **shell**: Windows shell dialog binding (Windows only)

pub mod model;
pub mod error;
pub mod surface;
pub mod location;
pub mod release;
pub mod session;
pub mod config;

#[cfg(windows)]
pub mod shell;

#[cfg(test)]
mod testing;

// Re-export main types and functions
pub use model::{
    DialogFlags, DialogStatus, DialogUpdate, Location, LocationRole, Locations, ModeFlags,
    OperationKind, OperationStatus, OwnerWindow, ProgressAxes, ProgressAxis, Timings,
};
pub use error::{DialogError, ResolveError, SurfaceError, UnknownOperation};
pub use surface::{LocationItems, ProgressSurface, SurfaceFactory, SurfaceHandle};
pub use location::{FsLocationService, LocationResolver, LocationService};
pub use release::{ReleaseTicket, DEFAULT_GRACE_DELAY};
pub use session::DialogSession;
pub use config::DialogConfig;
