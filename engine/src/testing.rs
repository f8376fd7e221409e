//! Recording surface used by the engine's tests.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{ResolveError, SurfaceError};
use crate::location::LocationService;
use crate::model::{
    DialogFlags, DialogUpdate, Location, ModeFlags, OperationKind, OperationStatus, OwnerWindow,
    Timings,
};
use crate::surface::{ProgressSurface, SurfaceFactory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Created,
    Start {
        owner: Option<OwnerWindow>,
        flags: DialogFlags,
    },
    Stop,
    SetOperation(OperationKind),
    SetMode(ModeFlags),
    Update(DialogUpdate),
    ResetTimer,
    PauseTimer,
    ResumeTimer,
    Released,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<SurfaceCall>>,
    status: Mutex<Option<OperationStatus>>,
    fail_commands: AtomicBool,
    created: AtomicUsize,
}

impl Shared {
    fn record(&self, call: SurfaceCall) {
        self.calls.lock().expect("Call log poisoned").push(call);
    }

    fn command(&self, command: &'static str, call: SurfaceCall) -> Result<(), SurfaceError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(SurfaceError::CommandFailed {
                command,
                reason: "injected failure".to_string(),
            });
        }
        self.record(call);
        Ok(())
    }
}

/// Factory whose surfaces log every command into one shared list.
#[derive(Clone)]
pub struct RecordingFactory {
    shared: Arc<Shared>,
    unavailable: bool,
}

impl RecordingFactory {
    pub fn new() -> Self {
        RecordingFactory {
            shared: Arc::new(Shared::default()),
            unavailable: false,
        }
    }

    /// A factory that cannot create surfaces.
    pub fn unavailable() -> Self {
        RecordingFactory {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.shared.calls.lock().expect("Call log poisoned").clone()
    }

    pub fn updates(&self) -> Vec<DialogUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Update(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &SurfaceCall) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    pub fn created(&self) -> usize {
        self.shared.created.load(Ordering::SeqCst)
    }

    /// Make the user's button presses visible through `operation_status`.
    pub fn set_status(&self, status: OperationStatus) {
        *self.shared.status.lock().expect("Status poisoned") = Some(status);
    }

    /// Make every subsequent command fail.
    pub fn fail_commands(&self, fail: bool) {
        self.shared.fail_commands.store(fail, Ordering::SeqCst);
    }
}

impl SurfaceFactory for RecordingFactory {
    fn create(&self) -> Result<Box<dyn ProgressSurface>, SurfaceError> {
        if self.unavailable {
            return Err(SurfaceError::Unavailable {
                reason: "class not registered".to_string(),
            });
        }
        self.shared.created.fetch_add(1, Ordering::SeqCst);
        self.shared.record(SurfaceCall::Created);
        Ok(Box::new(RecordingSurface {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct RecordingSurface {
    shared: Arc<Shared>,
}

impl ProgressSurface for RecordingSurface {
    fn start(&mut self, owner: Option<OwnerWindow>, flags: DialogFlags) -> Result<(), SurfaceError> {
        self.shared.command("start", SurfaceCall::Start { owner, flags })
    }

    fn stop(&mut self) -> Result<(), SurfaceError> {
        self.shared.command("stop", SurfaceCall::Stop)
    }

    fn set_operation(&mut self, kind: OperationKind) -> Result<(), SurfaceError> {
        self.shared.command("set_operation", SurfaceCall::SetOperation(kind))
    }

    fn set_mode(&mut self, mode: ModeFlags) -> Result<(), SurfaceError> {
        self.shared.command("set_mode", SurfaceCall::SetMode(mode))
    }

    fn update(&mut self, update: &DialogUpdate) -> Result<(), SurfaceError> {
        self.shared.command("update", SurfaceCall::Update(update.clone()))
    }

    fn operation_status(&self) -> OperationStatus {
        self.shared
            .status
            .lock()
            .expect("Status poisoned")
            .unwrap_or(OperationStatus::Running)
    }

    fn reset_timer(&mut self) -> Result<(), SurfaceError> {
        self.shared.command("reset_timer", SurfaceCall::ResetTimer)
    }

    fn pause_timer(&mut self) -> Result<(), SurfaceError> {
        self.shared.command("pause_timer", SurfaceCall::PauseTimer)
    }

    fn resume_timer(&mut self) -> Result<(), SurfaceError> {
        self.shared.command("resume_timer", SurfaceCall::ResumeTimer)
    }

    fn timings(&self) -> Option<Timings> {
        Some(Timings {
            elapsed: Duration::from_secs(3),
            remaining: Duration::from_secs(7),
        })
    }
}

impl Drop for RecordingSurface {
    fn drop(&mut self) {
        self.shared.record(SurfaceCall::Released);
    }
}

/// Location service that only knows a fixed set of strings.
pub struct KnownLocations {
    known: HashSet<String>,
}

impl KnownLocations {
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KnownLocations {
            known: known.into_iter().map(Into::into).collect(),
        }
    }
}

impl LocationService for KnownLocations {
    fn resolve(&self, input: &str) -> Result<Location, ResolveError> {
        if self.known.contains(input) {
            Ok(Location::Path(PathBuf::from(input)))
        } else {
            Err(ResolveError::NotFound {
                input: input.to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }
}
