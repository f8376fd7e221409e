//! Stderr presentation surface.
//!
//! Used where the shell dialog is not available. Renders a one-line
//! progress bar and lets the host (or a test) simulate the cancel button.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use opdialog_engine::{
    DialogFlags, DialogUpdate, ModeFlags, OperationKind, OperationStatus, OwnerWindow,
    ProgressSurface, SurfaceError, SurfaceFactory, Timings,
};

/// Creates `ConsoleSurface`s sharing one cancel switch.
#[derive(Debug, Clone)]
pub struct ConsoleSurfaceFactory {
    quiet: bool,
    cancelled: Arc<AtomicBool>,
}

impl ConsoleSurfaceFactory {
    pub fn new(quiet: bool) -> Self {
        ConsoleSurfaceFactory {
            quiet,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the flag makes every surface report `Cancelled`.
    pub fn cancel_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl SurfaceFactory for ConsoleSurfaceFactory {
    fn create(&self) -> Result<Box<dyn ProgressSurface>, SurfaceError> {
        Ok(Box::new(ConsoleSurface::new(
            self.quiet,
            Arc::clone(&self.cancelled),
        )))
    }
}

pub struct ConsoleSurface {
    quiet: bool,
    cancelled: Arc<AtomicBool>,
    flags: DialogFlags,
    mode: ModeFlags,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
    last_render: Option<Instant>,
    last_update: Option<DialogUpdate>,
}

impl ConsoleSurface {
    fn new(quiet: bool, cancelled: Arc<AtomicBool>) -> Self {
        ConsoleSurface {
            quiet,
            cancelled,
            flags: DialogFlags::empty(),
            mode: ModeFlags::empty(),
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            last_render: None,
            last_update: None,
        }
    }

    fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_idx])
    }

    fn format_duration(elapsed: Duration) -> String {
        let secs = elapsed.as_secs();
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, mins, secs)
        } else if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    }

    /// Overshoot is drawn as a full bar with the real percentage.
    fn progress_bar(current: u64, total: u64) -> String {
        let percent = if total == 0 {
            100
        } else {
            (current as f64 / total as f64 * 100.0) as u64
        };
        let filled = (percent.min(100) / 5) as usize;
        let empty = 20 - filled;
        format!("[{}{}] {}%", "=".repeat(filled), " ".repeat(empty), percent)
    }

    fn elapsed(&self) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        let paused = self.paused_total
            + self
                .paused_at
                .map(|at| at.elapsed())
                .unwrap_or(Duration::ZERO);
        started.elapsed().saturating_sub(paused)
    }

    fn render(&mut self, update: &DialogUpdate) {
        if self.quiet {
            return;
        }

        // Throttle to one line per 200ms, but always draw completion
        let complete = update.progress.points.is_complete();
        if let Some(last) = self.last_render {
            if last.elapsed() < Duration::from_millis(200) && !complete {
                return;
            }
        }
        self.last_render = Some(Instant::now());

        let progress = &update.progress;
        let mut line = String::new();
        if !self.flags.contains(DialogFlags::NO_PROGRESS_BAR) {
            if self.mode.contains(ModeFlags::INDETERMINATE) {
                line.push_str("[ working... ]");
            } else {
                line.push_str(&Self::progress_bar(progress.points.current, progress.points.total));
            }
        }
        line.push_str(&format!(
            " | {}/{} items | {}/{}",
            progress.items.current,
            progress.items.total,
            Self::format_bytes(progress.size.current),
            Self::format_bytes(progress.size.total)
        ));
        if !self.flags.contains(DialogFlags::DONT_DISPLAY_LOCATIONS) {
            line.push_str(&format!(" | {}", update.locations.item));
        }

        eprint!("\r{}", line);
        let _ = std::io::stderr().flush();
    }
}

impl ProgressSurface for ConsoleSurface {
    fn start(&mut self, _owner: Option<OwnerWindow>, flags: DialogFlags) -> Result<(), SurfaceError> {
        self.flags = flags;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SurfaceError> {
        if !self.quiet && self.last_render.is_some() {
            eprintln!();
        }
        if !self.quiet && !self.flags.contains(DialogFlags::NO_TIME) {
            eprintln!("Elapsed: {}", Self::format_duration(self.elapsed()));
        }
        Ok(())
    }

    fn set_operation(&mut self, kind: OperationKind) -> Result<(), SurfaceError> {
        if !self.quiet && kind != OperationKind::None {
            eprintln!("Operation: {}", kind);
        }
        Ok(())
    }

    fn set_mode(&mut self, mode: ModeFlags) -> Result<(), SurfaceError> {
        self.mode = mode;
        Ok(())
    }

    fn update(&mut self, update: &DialogUpdate) -> Result<(), SurfaceError> {
        let locations_changed = self
            .last_update
            .as_ref()
            .map(|last| {
                last.locations.source != update.locations.source
                    || last.locations.destination != update.locations.destination
            })
            .unwrap_or(true);
        if locations_changed && !self.quiet && !self.flags.contains(DialogFlags::DONT_DISPLAY_LOCATIONS) {
            if !self.flags.contains(DialogFlags::DONT_DISPLAY_SOURCE_PATH) {
                eprintln!("  Source: {}", update.locations.source);
            }
            if !self.flags.contains(DialogFlags::DONT_DISPLAY_DEST_PATH) {
                eprintln!("  Destination: {}", update.locations.destination);
            }
        }

        self.render(update);
        self.last_update = Some(update.clone());
        Ok(())
    }

    fn operation_status(&self) -> OperationStatus {
        if self.cancelled.load(Ordering::SeqCst) {
            OperationStatus::Cancelled
        } else if self.paused_at.is_some() {
            OperationStatus::Paused
        } else {
            OperationStatus::Running
        }
    }

    fn reset_timer(&mut self) -> Result<(), SurfaceError> {
        self.started_at = Some(Instant::now());
        self.paused_total = Duration::ZERO;
        self.paused_at = None;
        Ok(())
    }

    fn pause_timer(&mut self) -> Result<(), SurfaceError> {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
        Ok(())
    }

    fn resume_timer(&mut self) -> Result<(), SurfaceError> {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += at.elapsed();
        }
        Ok(())
    }

    fn timings(&self) -> Option<Timings> {
        self.started_at?;
        let elapsed = self.elapsed();
        let points = self.last_update.as_ref()?.progress.points;
        let remaining = if points.current == 0 || points.current >= points.total {
            Duration::ZERO
        } else {
            let per_point = elapsed.as_secs_f64() / points.current as f64;
            Duration::from_secs_f64(per_point * (points.total - points.current) as f64)
        };
        Some(Timings { elapsed, remaining })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opdialog_engine::{Location, Locations, ProgressAxes, ProgressAxis};

    fn update(current: u64, total: u64) -> DialogUpdate {
        let mut progress = ProgressAxes::default();
        progress.points = ProgressAxis::new(current, total);
        DialogUpdate {
            progress,
            locations: Locations::uniform(Location::Path(std::env::temp_dir())),
        }
    }

    #[test]
    fn test_progress_bar_rendering() {
        assert_eq!(
            ConsoleSurface::progress_bar(50, 100),
            format!("[{}{}] 50%", "=".repeat(10), " ".repeat(10))
        );
        assert_eq!(ConsoleSurface::progress_bar(0, 0), format!("[{}] 100%", "=".repeat(20)));
        assert!(ConsoleSurface::progress_bar(150, 100).ends_with("150%"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(ConsoleSurface::format_bytes(512), "512.00 B");
        assert_eq!(ConsoleSurface::format_bytes(1536), "1.50 KB");
    }

    #[test]
    fn test_cancel_switch_is_shared() {
        let factory = ConsoleSurfaceFactory::new(true);
        let surface = factory.create().expect("Failed to create surface");
        assert_eq!(surface.operation_status(), OperationStatus::Running);

        factory.cancel_switch().store(true, Ordering::SeqCst);
        assert_eq!(surface.operation_status(), OperationStatus::Cancelled);
    }

    #[test]
    fn test_pause_reports_paused_status() {
        let factory = ConsoleSurfaceFactory::new(true);
        let mut surface = factory.create().expect("Failed to create surface");
        surface.start(None, DialogFlags::empty()).expect("Failed to start");

        surface.pause_timer().expect("Failed to pause");
        assert_eq!(surface.operation_status(), OperationStatus::Paused);
        surface.resume_timer().expect("Failed to resume");
        assert_eq!(surface.operation_status(), OperationStatus::Running);
    }

    #[test]
    fn test_timings_need_a_start_and_an_update() {
        let factory = ConsoleSurfaceFactory::new(true);
        let mut surface = factory.create().expect("Failed to create surface");
        assert!(surface.timings().is_none());

        surface.start(None, DialogFlags::empty()).expect("Failed to start");
        surface.update(&update(100, 100)).expect("Failed to update");
        let timings = surface.timings().expect("Expected timings");
        assert_eq!(timings.remaining, Duration::ZERO);
    }
}
