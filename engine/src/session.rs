//! Dialog session lifecycle and progress aggregation.
//!
//! A `DialogSession` owns everything the host wants the dialog to show:
//! configuration, three progress axes and three locations. Values can be set
//! at any time. They only reach a presentation surface while the session is
//! `Running`; before `show` and after `close` they are just recorded.
//!
//! ```text
//! NotStarted --show--> Running --close--> Disposed
//!                         |                  ^
//!                   command fails            |
//!                         v                  |
//!                      Errored ----close-----+
//! ```

use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DialogConfig;
use crate::error::{DialogError, SurfaceError};
use crate::location::{LocationResolver, LocationService};
use crate::model::{
    DialogFlags, DialogStatus, DialogUpdate, Locations, ModeFlags, OperationKind,
    OperationStatus, OwnerWindow, ProgressAxes, ProgressAxis, Timings,
};
use crate::release::{schedule_release, ReleaseTicket, DEFAULT_GRACE_DELAY};
use crate::surface::{ProgressSurface, SurfaceFactory, SurfaceHandle};

/// Controller for one progress dialog.
pub struct DialogSession {
    id: Uuid,
    status: DialogStatus,
    dialog_flags: DialogFlags,
    operation: OperationKind,
    mode: ModeFlags,
    progress: ProgressAxes,
    estimate_from_items: bool,
    locations: Locations,
    grace_delay: Duration,
    factory: Box<dyn SurfaceFactory>,
    resolver: LocationResolver,
    handle: Option<SurfaceHandle>,
}

impl DialogSession {
    /// Create a session with default settings. All locations start at the
    /// resolver's working context.
    pub fn new(factory: Box<dyn SurfaceFactory>, resolver: LocationResolver) -> Self {
        let locations = Locations::uniform(resolver.default_location());
        DialogSession {
            id: Uuid::new_v4(),
            status: DialogStatus::NotStarted,
            dialog_flags: DialogFlags::empty(),
            operation: OperationKind::None,
            mode: ModeFlags::empty(),
            progress: ProgressAxes::default(),
            estimate_from_items: false,
            locations,
            grace_delay: DEFAULT_GRACE_DELAY,
            factory,
            resolver,
            handle: None,
        }
    }

    /// Create a session from a loaded configuration.
    pub fn from_config(
        factory: Box<dyn SurfaceFactory>,
        service: Box<dyn LocationService>,
        config: &DialogConfig,
    ) -> Result<Self, DialogError> {
        let resolver = LocationResolver::new(service, config.resolve_working_dir()?);
        let mut session = Self::new(factory, resolver).with_grace_delay(config.grace_delay());
        session.progress = ProgressAxes::with_total(config.initial_total);
        session.estimate_from_items = config.estimate_from_items;
        session.configure(config.dialog_flags, config.operation, config.mode);
        Ok(session)
    }

    pub fn with_grace_delay(mut self, delay: Duration) -> Self {
        self.grace_delay = delay;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> DialogStatus {
        self.status
    }

    pub fn dialog_flags(&self) -> DialogFlags {
        self.dialog_flags
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn mode(&self) -> ModeFlags {
        self.mode
    }

    pub fn progress(&self) -> ProgressAxes {
        self.progress
    }

    pub fn points(&self) -> ProgressAxis {
        self.progress.points
    }

    pub fn size(&self) -> ProgressAxis {
        self.progress.size
    }

    pub fn items(&self) -> ProgressAxis {
        self.progress.items
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn estimate_from_items(&self) -> bool {
        self.estimate_from_items
    }

    pub fn grace_delay(&self) -> Duration {
        self.grace_delay
    }

    pub fn working_dir(&self) -> &std::path::Path {
        self.resolver.working_dir()
    }

    // ---- configuration ----

    /// Stage display flags, operation kind and mode. Nothing is sent to a
    /// running dialog; the values are used the next time it is shown.
    pub fn configure(&mut self, flags: DialogFlags, operation: OperationKind, mode: ModeFlags) {
        self.dialog_flags = flags;
        self.operation = operation;
        self.mode = mode;
    }

    /// Stage display flags for the next `show`.
    pub fn set_dialog_flags(&mut self, flags: DialogFlags) {
        self.dialog_flags = flags;
    }

    /// Record the operation kind and tell a running dialog about it.
    pub fn set_operation(&mut self, kind: OperationKind) -> Result<(), DialogError> {
        self.operation = kind;
        self.forward(|surface| surface.set_operation(kind))
    }

    /// Record the mode and tell a running dialog about it.
    pub fn set_mode(&mut self, mode: ModeFlags) -> Result<(), DialogError> {
        self.mode = mode;
        self.forward(|surface| surface.set_mode(mode))
    }

    /// When enabled, the item axis overwrites the points axis on every update.
    /// Takes effect at the next update.
    pub fn set_estimate_from_items(&mut self, enabled: bool) {
        self.estimate_from_items = enabled;
    }

    // ---- lifecycle ----

    /// Show the dialog.
    ///
    /// Creates a surface, starts it with the staged flags, operation and
    /// mode, and pushes the current state. Showing a running dialog again
    /// does nothing. Showing an errored dialog retires the failed surface and
    /// starts a fresh one.
    pub fn show(&mut self, owner: Option<OwnerWindow>) -> Result<(), DialogError> {
        match self.status {
            DialogStatus::Running => {
                debug!(session = %self.id, "Dialog already running; show ignored");
                return Ok(());
            }
            DialogStatus::Disposed => return Err(DialogError::Closed),
            DialogStatus::Errored => {
                if let Some(handle) = self.handle.take() {
                    self.retire(handle);
                }
            }
            DialogStatus::NotStarted => {}
        }

        let surface = self
            .factory
            .create()
            .map_err(DialogError::SurfaceUnavailable)?;
        let mut handle = SurfaceHandle::new(surface);
        info!(
            session = %self.id,
            handle = %handle.id(),
            operation = %self.operation,
            "Showing progress dialog"
        );

        self.apply_estimate();
        let update = self.snapshot();
        let started = start_surface(
            handle.surface_mut(),
            owner,
            self.dialog_flags,
            self.operation,
            self.mode,
            &update,
        );
        self.handle = Some(handle);

        match started {
            Ok(()) => {
                self.status = DialogStatus::Running;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Close the dialog.
    ///
    /// Stops the surface, marks the session `Disposed` and schedules the
    /// surface's release after the grace delay. Returns the ticket for that
    /// release, or `None` if no surface was held. Calling it again does
    /// nothing.
    pub fn close(&mut self) -> Option<ReleaseTicket> {
        if self.status == DialogStatus::Disposed {
            return None;
        }

        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.surface_mut().stop() {
                warn!(session = %self.id, handle = %handle.id(), error = %e, "Failed to stop progress dialog");
            }
        }
        self.status = DialogStatus::Disposed;
        info!(session = %self.id, "Progress dialog closed");

        let handle = self.handle.take()?;
        Some(schedule_release(handle, self.grace_delay))
    }

    /// Exact equality of the points axis. Overshooting is not finished.
    pub fn is_finished(&self) -> bool {
        self.progress.points.is_complete()
    }

    /// True once the user has cancelled through a live dialog.
    pub fn has_user_cancelled(&self) -> bool {
        self.operation_status() == Some(OperationStatus::Cancelled)
    }

    /// The status reported by the current surface, if one is held.
    pub fn operation_status(&self) -> Option<OperationStatus> {
        self.handle
            .as_ref()
            .map(|handle| handle.surface().operation_status())
    }

    // ---- progress ----

    pub fn set_points_current(&mut self, value: u64) -> Result<(), DialogError> {
        self.progress.points.current = value;
        self.sync()
    }

    pub fn set_points_total(&mut self, value: u64) -> Result<(), DialogError> {
        self.progress.points.total = value;
        self.sync()
    }

    pub fn set_size_current(&mut self, value: u64) -> Result<(), DialogError> {
        self.progress.size.current = value;
        self.sync()
    }

    pub fn set_size_total(&mut self, value: u64) -> Result<(), DialogError> {
        self.progress.size.total = value;
        self.sync()
    }

    pub fn set_items_current(&mut self, value: u64) -> Result<(), DialogError> {
        self.progress.items.current = value;
        self.sync()
    }

    pub fn set_items_total(&mut self, value: u64) -> Result<(), DialogError> {
        self.progress.items.total = value;
        self.sync()
    }

    /// Set both ends of the points axis with one push.
    pub fn set_points(&mut self, current: u64, total: u64) -> Result<(), DialogError> {
        self.progress.points = ProgressAxis::new(current, total);
        self.sync()
    }

    pub fn set_size(&mut self, current: u64, total: u64) -> Result<(), DialogError> {
        self.progress.size = ProgressAxis::new(current, total);
        self.sync()
    }

    pub fn set_items(&mut self, current: u64, total: u64) -> Result<(), DialogError> {
        self.progress.items = ProgressAxis::new(current, total);
        self.sync()
    }

    // ---- locations ----

    /// Replace all three locations. If any string fails to resolve, none of
    /// them change.
    pub fn update_locations(
        &mut self,
        source: &str,
        destination: &str,
        item: &str,
    ) -> Result<(), DialogError> {
        self.locations = self.resolver.resolve_all(source, destination, item)?;
        self.sync()
    }

    /// Replace source and destination. If either fails, neither changes.
    pub fn update_source_and_destination(
        &mut self,
        source: &str,
        destination: &str,
    ) -> Result<(), DialogError> {
        let (source, destination) = self.resolver.resolve_pair(source, destination)?;
        self.locations.source = source;
        self.locations.destination = destination;
        self.sync()
    }

    /// Replace the current item, falling back to the working context for
    /// relative strings.
    pub fn update_current_item(&mut self, item: &str) -> Result<(), DialogError> {
        self.locations.item = self.resolver.resolve_item(item)?;
        self.sync()
    }

    // ---- timer ----

    pub fn reset_timer(&mut self) -> Result<(), DialogError> {
        self.forward(|surface| surface.reset_timer())
    }

    pub fn pause_timer(&mut self) -> Result<(), DialogError> {
        self.forward(|surface| surface.pause_timer())
    }

    pub fn resume_timer(&mut self) -> Result<(), DialogError> {
        self.forward(|surface| surface.resume_timer())
    }

    /// Elapsed and remaining time from a running dialog.
    pub fn timings(&self) -> Option<Timings> {
        if !self.status.is_running() {
            return None;
        }
        self.handle
            .as_ref()
            .and_then(|handle| handle.surface().timings())
    }

    // ---- internals ----

    fn apply_estimate(&mut self) {
        if self.estimate_from_items {
            self.progress.points = self.progress.items;
        }
    }

    fn snapshot(&self) -> DialogUpdate {
        DialogUpdate {
            progress: self.progress,
            locations: self.locations.clone(),
        }
    }

    /// Recompute the aggregate and push it if the dialog is running.
    fn sync(&mut self) -> Result<(), DialogError> {
        self.apply_estimate();
        let update = self.snapshot();
        let session = self.id;
        self.forward(|surface| {
            debug!(
                session = %session,
                points = update.progress.points.current,
                points_total = update.progress.points.total,
                items = update.progress.items.current,
                "Pushing progress update"
            );
            surface.update(&update)
        })
    }

    /// Run a command against the surface if the dialog is running.
    fn forward<F>(&mut self, command: F) -> Result<(), DialogError>
    where
        F: FnOnce(&mut dyn ProgressSurface) -> Result<(), SurfaceError>,
    {
        if !self.status.is_running() {
            return Ok(());
        }
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        match command(handle.surface_mut()) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, error: SurfaceError) -> DialogError {
        warn!(session = %self.id, error = %error, "Progress dialog command failed");
        self.status = DialogStatus::Errored;
        DialogError::Surface(error)
    }

    fn retire(&self, mut handle: SurfaceHandle) {
        if let Err(e) = handle.surface_mut().stop() {
            debug!(handle = %handle.id(), error = %e, "Failed surface did not stop cleanly");
        }
        schedule_release(handle, self.grace_delay);
    }
}

fn start_surface(
    surface: &mut dyn ProgressSurface,
    owner: Option<OwnerWindow>,
    flags: DialogFlags,
    operation: OperationKind,
    mode: ModeFlags,
    update: &DialogUpdate,
) -> Result<(), SurfaceError> {
    surface.start(owner, flags)?;
    surface.set_operation(operation)?;
    surface.set_mode(mode)?;
    surface.update(update)
}

impl Drop for DialogSession {
    fn drop(&mut self) {
        // Keep the grace delay even when the host forgets to close
        self.close();
    }
}

impl std::fmt::Debug for DialogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogSession")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("operation", &self.operation)
            .field("progress", &self.progress)
            .field("locations", &self.locations)
            .field("handle", &self.handle)
            .finish()
    }
}
