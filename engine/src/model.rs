//! Core data model for progress dialog sessions.
//!
//! This module defines the values exchanged between a `DialogSession` and the
//! presentation surface:
//! - DialogStatus: lifecycle of a session
//! - DialogFlags, ModeFlags: option sets with the native bit values
//! - OperationKind, OperationStatus: what is happening and what the user did
//! - ProgressAxes, Locations, DialogUpdate: the consolidated push payload

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::UnknownOperation;

/// Lifecycle state of a dialog session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogStatus {
    /// Constructed, dialog not shown yet
    NotStarted,
    /// Dialog shown; updates are forwarded to the surface
    Running,
    /// Dialog closed; the surface is released (or about to be)
    Disposed,
    /// The surface rejected a command while running
    Errored,
}

impl DialogStatus {
    /// Returns true if updates should be forwarded to a surface.
    pub fn is_running(&self) -> bool {
        matches!(self, DialogStatus::Running)
    }
}

impl fmt::Display for DialogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogStatus::NotStarted => write!(f, "not started"),
            DialogStatus::Running => write!(f, "running"),
            DialogStatus::Disposed => write!(f, "disposed"),
            DialogStatus::Errored => write!(f, "errored"),
        }
    }
}

bitflags! {
    /// Display options passed when the dialog is started.
    ///
    /// The empty set is the normal, modeless dialog.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DialogFlags: u32 {
        /// Modal to the owner window.
        const MODAL = 0x0000_0001;
        /// Show the time remaining (implied by the operations dialog).
        const AUTO_TIME = 0x0000_0002;
        /// Do not show the time remaining.
        const NO_TIME = 0x0000_0004;
        /// No minimize button.
        const NO_MINIMIZE = 0x0000_0008;
        /// No progress bar.
        const NO_PROGRESS_BAR = 0x0000_0010;
        /// Marquee bar. Rejected by the operations dialog; use `ModeFlags::INDETERMINATE`.
        const MARQUEE = 0x0000_0020;
        /// No cancel button.
        const NO_CANCEL = 0x0000_0040;
        /// Show a pause button.
        const ENABLE_PAUSE = 0x0000_0080;
        /// Stop becomes Undo.
        const ALLOW_UNDO = 0x0000_0100;
        const DONT_DISPLAY_SOURCE_PATH = 0x0000_0200;
        const DONT_DISPLAY_DEST_PATH = 0x0000_0400;
        /// Hide estimates longer than a day.
        const NO_MULTI_DAY_ESTIMATES = 0x0000_0800;
        /// Hide the location line.
        const DONT_DISPLAY_LOCATIONS = 0x0000_1000;
    }
}

impl Default for DialogFlags {
    fn default() -> Self {
        DialogFlags::empty()
    }
}

bitflags! {
    /// Current mode of the operation being reported.
    ///
    /// The empty set is the default mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ModeFlags: u32 {
        const RUN = 0x0000_0001;
        /// Gathering data before the operation begins.
        const PREFLIGHT = 0x0000_0002;
        /// Rolling back after the user pressed Undo.
        const UNDOING = 0x0000_0004;
        /// Error dialogs are blocking progress. Only honoured once progress has begun.
        const ERRORS_BLOCKING = 0x0000_0008;
        /// Unknown length: no timer, marquee bar.
        const INDETERMINATE = 0x0000_0010;
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        ModeFlags::empty()
    }
}

/// The kind of operation shown as descriptive text by the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    #[default]
    None,
    Moving,
    Copying,
    /// Files are being sent to the recycle bin
    Recycling,
    ApplyingAttributes,
    Downloading,
    SearchingInternet,
    Calculating,
    Uploading,
    SearchingFiles,
    Deleting,
    Renaming,
    Formatting,
    CopyMoving,
}

impl OperationKind {
    const ALL: [OperationKind; 14] = [
        OperationKind::None,
        OperationKind::Moving,
        OperationKind::Copying,
        OperationKind::Recycling,
        OperationKind::ApplyingAttributes,
        OperationKind::Downloading,
        OperationKind::SearchingInternet,
        OperationKind::Calculating,
        OperationKind::Uploading,
        OperationKind::SearchingFiles,
        OperationKind::Deleting,
        OperationKind::Renaming,
        OperationKind::Formatting,
        OperationKind::CopyMoving,
    ];

    /// The value the native dialog expects for this operation.
    pub fn native_code(&self) -> i32 {
        match self {
            OperationKind::None => 0,
            OperationKind::Moving => 1,
            OperationKind::Copying => 2,
            OperationKind::Recycling => 3,
            OperationKind::ApplyingAttributes => 4,
            OperationKind::Downloading => 5,
            OperationKind::SearchingInternet => 6,
            OperationKind::Calculating => 7,
            OperationKind::Uploading => 8,
            OperationKind::SearchingFiles => 9,
            OperationKind::Deleting => 10,
            OperationKind::Renaming => 11,
            OperationKind::Formatting => 12,
            OperationKind::CopyMoving => 13,
        }
    }
}

/// Accepts the display name (case-insensitive, `-` or `_`) or the plain verb
/// for the file operations, so `copy` and `copying` both parse.
impl FromStr for OperationKind {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        let verb = match wanted.as_str() {
            "move" => Some(OperationKind::Moving),
            "copy" => Some(OperationKind::Copying),
            "recycle" => Some(OperationKind::Recycling),
            "download" => Some(OperationKind::Downloading),
            "upload" => Some(OperationKind::Uploading),
            "delete" => Some(OperationKind::Deleting),
            "rename" => Some(OperationKind::Renaming),
            "format" => Some(OperationKind::Formatting),
            _ => None,
        };
        verb.or_else(|| Self::ALL.into_iter().find(|kind| kind.to_string() == wanted))
            .ok_or_else(|| UnknownOperation {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::None => "none",
            OperationKind::Moving => "moving",
            OperationKind::Copying => "copying",
            OperationKind::Recycling => "recycling",
            OperationKind::ApplyingAttributes => "applying_attributes",
            OperationKind::Downloading => "downloading",
            OperationKind::SearchingInternet => "searching_internet",
            OperationKind::Calculating => "calculating",
            OperationKind::Uploading => "uploading",
            OperationKind::SearchingFiles => "searching_files",
            OperationKind::Deleting => "deleting",
            OperationKind::Renaming => "renaming",
            OperationKind::Formatting => "formatting",
            OperationKind::CopyMoving => "copy_moving",
        };
        write!(f, "{}", name)
    }
}

/// Operation status as reported by the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    /// Running, no user intervention
    Running,
    /// Paused by the user
    Paused,
    /// Cancelled by the user; the operation should be undone
    Cancelled,
    /// Stopped by the user; terminate completely
    Stopped,
    /// Error dialogs are blocking further progress
    ErrorsBlocking,
}

impl OperationStatus {
    /// Map a native status code to an `OperationStatus`.
    pub fn from_native_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(OperationStatus::Running),
            2 => Some(OperationStatus::Paused),
            3 => Some(OperationStatus::Cancelled),
            4 => Some(OperationStatus::Stopped),
            5 => Some(OperationStatus::ErrorsBlocking),
            _ => None,
        }
    }
}

/// One (current, total) progress pair.
///
/// `current <= total` is the caller's responsibility; nothing clamps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressAxis {
    pub current: u64,
    pub total: u64,
}

impl ProgressAxis {
    pub fn new(current: u64, total: u64) -> Self {
        ProgressAxis { current, total }
    }

    /// Exact equality; `current > total` is not finished.
    pub fn is_complete(&self) -> bool {
        self.current == self.total
    }
}

impl Default for ProgressAxis {
    fn default() -> Self {
        ProgressAxis::new(0, 100)
    }
}

/// The three independent progress axes reported to the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressAxes {
    /// Generic progress points (drives the bar)
    pub points: ProgressAxis,
    /// Bytes
    pub size: ProgressAxis,
    /// Item count
    pub items: ProgressAxis,
}

impl ProgressAxes {
    /// All axes start at zero with the given total.
    pub fn with_total(total: u64) -> Self {
        let axis = ProgressAxis::new(0, total);
        ProgressAxes {
            points: axis,
            size: axis,
            items: axis,
        }
    }
}

/// Which of the three locations an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationRole {
    Source,
    Destination,
    Item,
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationRole::Source => write!(f, "source"),
            LocationRole::Destination => write!(f, "destination"),
            LocationRole::Item => write!(f, "current item"),
        }
    }
}

/// A resolved filesystem path or URL shown by the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Path(PathBuf),
    Url(Url),
}

impl Location {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Path(path) => Some(path),
            Location::Url(_) => None,
        }
    }

    /// The string a shell would parse back into this location.
    pub fn parsing_name(&self) -> String {
        match self {
            Location::Path(path) => path.display().to_string(),
            Location::Url(url) => url.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parsing_name())
    }
}

/// Source, destination and current-item locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locations {
    pub source: Location,
    pub destination: Location,
    pub item: Location,
}

impl Locations {
    /// All three locations pointing at the same place.
    pub fn uniform(location: Location) -> Self {
        Locations {
            source: location.clone(),
            destination: location.clone(),
            item: location,
        }
    }

    pub fn get(&self, role: LocationRole) -> &Location {
        match role {
            LocationRole::Source => &self.source,
            LocationRole::Destination => &self.destination,
            LocationRole::Item => &self.item,
        }
    }
}

/// A consolidated snapshot pushed to the surface in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogUpdate {
    pub progress: ProgressAxes,
    pub locations: Locations,
}

/// Native handle of the window that owns the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerWindow(pub isize);

/// Timer readings from the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub elapsed: Duration,
    pub remaining: Duration,
}
