//! Windows shell binding.
//!
//! `ShellSurfaceFactory` instantiates the shell's operations progress dialog
//! (`IOperationsProgressDialog`) through COM and `ShellProgressSurface`
//! translates each surface command into the matching native call.

use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::time::Duration;

use tracing::warn;

use windows::core::HSTRING;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_INPROC_SERVER,
    COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Shell::{
    IOperationsProgressDialog, IShellItem, ProgressDialog, SHCreateItemFromParsingName,
    OPPROGDLGF, PDMODE, SPACTION,
};

use crate::error::SurfaceError;
use crate::model::{
    DialogFlags, DialogUpdate, Location, ModeFlags, OperationKind, OperationStatus, OwnerWindow,
    Timings,
};
use crate::surface::{LocationItems, ProgressSurface, SurfaceFactory};

fn command_failed(command: &'static str, err: windows::core::Error) -> SurfaceError {
    SurfaceError::CommandFailed {
        command,
        reason: err.to_string(),
    }
}

/// COM initialization of the current thread, undone on drop.
struct Apartment {
    initialized: bool,
}

impl Apartment {
    fn enter() -> Self {
        // S_FALSE still needs a matching CoUninitialize; RPC_E_CHANGED_MODE does not
        let initialized = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }.is_ok();
        Apartment { initialized }
    }
}

impl Drop for Apartment {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

thread_local! {
    // One initialization per creating thread, balanced when the thread exits
    static CREATOR_APARTMENT: Apartment = Apartment::enter();
}

/// Creates shell progress dialogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellSurfaceFactory;

impl SurfaceFactory for ShellSurfaceFactory {
    fn create(&self) -> Result<Box<dyn ProgressSurface>, SurfaceError> {
        CREATOR_APARTMENT.with(|_| ());
        let dialog: IOperationsProgressDialog =
            unsafe { CoCreateInstance(&ProgressDialog, None, CLSCTX_INPROC_SERVER) }.map_err(
                |e| SurfaceError::Unavailable {
                    reason: e.to_string(),
                },
            )?;
        Ok(Box::new(ShellProgressSurface {
            dialog: ManuallyDrop::new(dialog),
            items: LocationItems::new(),
        }))
    }
}

/// A live shell progress dialog.
///
/// The shell items for the three locations are built once per location and
/// reused by every later push.
pub struct ShellProgressSurface {
    dialog: ManuallyDrop<IOperationsProgressDialog>,
    items: LocationItems<IShellItem>,
}

// SAFETY: every command is issued from the thread that created the dialog.
// The only other thread that touches it is the release worker, which enters
// its own apartment in `Drop` before releasing the interfaces.
unsafe impl Send for ShellProgressSurface {}

impl Drop for ShellProgressSurface {
    fn drop(&mut self) {
        let _apartment = Apartment::enter();
        self.items.clear();
        // SAFETY: `dialog` is not used again after this point
        unsafe { ManuallyDrop::drop(&mut self.dialog) };
    }
}

fn shell_item(location: &Location) -> windows::core::Result<IShellItem> {
    let name = HSTRING::from(location.parsing_name());
    unsafe { SHCreateItemFromParsingName(&name, None) }
}

impl ProgressSurface for ShellProgressSurface {
    fn start(&mut self, owner: Option<OwnerWindow>, flags: DialogFlags) -> Result<(), SurfaceError> {
        let owner = owner.map(|window| HWND(window.0 as *mut c_void));
        unsafe { self.dialog.StartProgressDialog(owner, OPPROGDLGF(flags.bits() as _)) }
            .map_err(|e| command_failed("start", e))
    }

    fn stop(&mut self) -> Result<(), SurfaceError> {
        unsafe { self.dialog.StopProgressDialog() }.map_err(|e| command_failed("stop", e))
    }

    fn set_operation(&mut self, kind: OperationKind) -> Result<(), SurfaceError> {
        unsafe { self.dialog.SetOperation(SPACTION(kind.native_code() as _)) }
            .map_err(|e| command_failed("set_operation", e))
    }

    fn set_mode(&mut self, mode: ModeFlags) -> Result<(), SurfaceError> {
        unsafe { self.dialog.SetMode(PDMODE(mode.bits() as _)) }
            .map_err(|e| command_failed("set_mode", e))
    }

    fn update(&mut self, update: &DialogUpdate) -> Result<(), SurfaceError> {
        let progress = &update.progress;
        unsafe {
            self.dialog.UpdateProgress(
                progress.points.current,
                progress.points.total,
                progress.size.current,
                progress.size.total,
                progress.items.current,
                progress.items.total,
            )
        }
        .map_err(|e| command_failed("update_progress", e))?;

        for (role, err) in self.items.refresh(&update.locations, shell_item) {
            warn!(
                %role,
                location = %update.locations.get(role),
                error = %err,
                "Failed to build shell item, keeping the previous one"
            );
        }
        let Some((source, target, item)) = self.items.items() else {
            return Ok(());
        };
        unsafe { self.dialog.UpdateLocations(source, target, item) }
            .map_err(|e| command_failed("update_locations", e))
    }

    fn operation_status(&self) -> OperationStatus {
        unsafe { self.dialog.GetOperationStatus() }
            .ok()
            .and_then(|status| OperationStatus::from_native_code(status.0 as i32))
            .unwrap_or(OperationStatus::Running)
    }

    fn reset_timer(&mut self) -> Result<(), SurfaceError> {
        unsafe { self.dialog.ResetTimer() }.map_err(|e| command_failed("reset_timer", e))
    }

    fn pause_timer(&mut self) -> Result<(), SurfaceError> {
        unsafe { self.dialog.PauseTimer() }.map_err(|e| command_failed("pause_timer", e))
    }

    fn resume_timer(&mut self) -> Result<(), SurfaceError> {
        unsafe { self.dialog.ResumeTimer() }.map_err(|e| command_failed("resume_timer", e))
    }

    fn timings(&self) -> Option<Timings> {
        let mut elapsed = 0u64;
        let mut remaining = 0u64;
        unsafe { self.dialog.GetMilliseconds(&mut elapsed, &mut remaining) }.ok()?;
        Some(Timings {
            elapsed: Duration::from_millis(elapsed),
            remaining: Duration::from_millis(remaining),
        })
    }
}
