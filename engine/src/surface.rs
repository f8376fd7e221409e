//! Presentation surface traits.
//!
//! This module defines the seam between a `DialogSession` and whatever
//! actually draws the dialog. The Windows shell dialog implements it in
//! `shell`; the CLI has a stderr renderer; tests use a recorder.
//!
//! The session never learns how a surface is created: it only asks a
//! `SurfaceFactory` for one when the dialog is shown.

use uuid::Uuid;

use crate::error::SurfaceError;
use crate::model::{
    DialogFlags, DialogUpdate, Location, LocationRole, Locations, ModeFlags, OperationKind,
    OperationStatus, OwnerWindow, Timings,
};

/// A live progress dialog.
///
/// Dropping the value releases the underlying native resource.
/// Commands are issued from one thread at a time; the value may be moved to
/// another thread for its deferred release.
pub trait ProgressSurface: Send {
    /// Display the dialog.
    fn start(&mut self, owner: Option<OwnerWindow>, flags: DialogFlags) -> Result<(), SurfaceError>;

    /// Begin dismissing the dialog.
    fn stop(&mut self) -> Result<(), SurfaceError>;

    fn set_operation(&mut self, kind: OperationKind) -> Result<(), SurfaceError>;

    fn set_mode(&mut self, mode: ModeFlags) -> Result<(), SurfaceError>;

    /// Apply all six progress numbers and all three locations at once.
    fn update(&mut self, update: &DialogUpdate) -> Result<(), SurfaceError>;

    /// What the user has done with the dialog's buttons.
    fn operation_status(&self) -> OperationStatus;

    fn reset_timer(&mut self) -> Result<(), SurfaceError>;

    fn pause_timer(&mut self) -> Result<(), SurfaceError>;

    fn resume_timer(&mut self) -> Result<(), SurfaceError>;

    /// Elapsed and estimated remaining time, if the surface tracks them.
    fn timings(&self) -> Option<Timings>;
}

/// Creates presentation surfaces.
pub trait SurfaceFactory: Send {
    /// Instantiate a new surface. Failure is fatal for `show`.
    fn create(&self) -> Result<Box<dyn ProgressSurface>, SurfaceError>;
}

/// A surface created for one `show`, tagged with its own identity.
///
/// Deferred releases are tied to the handle they were issued for, never to
/// whatever surface the session holds when the delay elapses.
pub struct SurfaceHandle {
    id: Uuid,
    surface: Box<dyn ProgressSurface>,
}

impl SurfaceHandle {
    pub fn new(surface: Box<dyn ProgressSurface>) -> Self {
        SurfaceHandle {
            id: Uuid::new_v4(),
            surface,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn surface(&self) -> &dyn ProgressSurface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn ProgressSurface {
        self.surface.as_mut()
    }
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle").field("id", &self.id).finish()
    }
}

const ROLES: [LocationRole; 3] = [LocationRole::Source, LocationRole::Destination, LocationRole::Item];

/// Native items built from the most recently pushed `Locations`.
///
/// A slot is rebuilt only when its location changes. If the rebuild fails the
/// slot keeps its previous item, so a current item that was moved or deleted
/// after it was shown does not block later pushes.
pub struct LocationItems<T> {
    slots: [Option<(Location, T)>; 3],
}

impl<T> LocationItems<T> {
    pub fn new() -> Self {
        LocationItems {
            slots: [None, None, None],
        }
    }

    /// Build items for the slots whose location differs from the cached one.
    ///
    /// Returns the failures by role; the matching slots are left as they were.
    pub fn refresh<E, F>(&mut self, locations: &Locations, mut build: F) -> Vec<(LocationRole, E)>
    where
        F: FnMut(&Location) -> Result<T, E>,
    {
        let mut failures = Vec::new();
        for (slot, role) in self.slots.iter_mut().zip(ROLES) {
            let location = locations.get(role);
            if slot.as_ref().is_some_and(|(cached, _)| cached == location) {
                continue;
            }
            match build(location) {
                Ok(item) => *slot = Some((location.clone(), item)),
                Err(err) => failures.push((role, err)),
            }
        }
        failures
    }

    /// Source, destination and current item, once all three have been built.
    pub fn items(&self) -> Option<(&T, &T, &T)> {
        match &self.slots {
            [Some((_, source)), Some((_, destination)), Some((_, item))] => {
                Some((source, destination, item))
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.slots = [None, None, None];
    }
}

impl<T> Default for LocationItems<T> {
    fn default() -> Self {
        Self::new()
    }
}
