//! OpDialog - command-line host for the progress dialog engine.
//!
//! Copies or moves a directory tree and reports progress through a
//! `DialogSession`: the shell's operations dialog on Windows, a stderr
//! progress line elsewhere (or with `--console`).

mod console;
mod transfer;

use std::path::{Path, PathBuf};

use clap::Parser;
use opdialog_engine::{
    DialogConfig, DialogFlags, DialogSession, FsLocationService, ModeFlags, OperationKind,
    SurfaceFactory,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleSurfaceFactory;
use crate::transfer::{copy_file, move_file, plan_tree};

/// OpDialog - copy files with the system progress dialog
#[derive(Parser, Debug)]
#[command(name = "opdialog")]
#[command(version = "0.1.0")]
#[command(about = "Copy or move a directory tree with a progress dialog")]
struct Args {
    /// Source directory
    #[arg(long, value_name = "PATH")]
    src: PathBuf,

    /// Destination directory
    #[arg(long, value_name = "PATH")]
    dst: PathBuf,

    /// Operation: copy or move
    #[arg(long, value_name = "OPERATION", default_value = "copy")]
    operation: String,

    /// Drive the progress bar from the item count instead of bytes
    #[arg(long)]
    estimate: bool,

    /// Make the dialog modal
    #[arg(long)]
    modal: bool,

    /// Hide the time remaining
    #[arg(long)]
    no_time: bool,

    /// Show a pause button
    #[arg(long)]
    allow_pause: bool,

    /// Delay between closing the dialog and releasing it, in milliseconds
    #[arg(long, value_name = "MS")]
    grace_ms: Option<u64>,

    /// JSON dialog configuration; flags above override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report progress without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Use the stderr renderer even where a native dialog exists
    #[arg(long)]
    console: bool,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

/// What happened during a run.
#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    transferred: usize,
    failed: Vec<(PathBuf, String)>,
    bytes: u64,
    cancelled: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let factory = surface_factory(args.console);

    let exit_code = match run_cli(&args, factory) {
        Ok(summary) if summary.cancelled => {
            eprintln!("Cancelled after {} items", summary.transferred);
            1
        }
        Ok(summary) if !summary.failed.is_empty() => {
            eprintln!("Failed items:");
            for (path, message) in &summary.failed {
                eprintln!("  {}: {}", path.display(), message);
            }
            2
        }
        Ok(_) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

#[cfg(windows)]
fn surface_factory(console: bool) -> Box<dyn SurfaceFactory> {
    if console {
        Box::new(ConsoleSurfaceFactory::new(false))
    } else {
        Box::new(opdialog_engine::shell::ShellSurfaceFactory)
    }
}

#[cfg(not(windows))]
fn surface_factory(_console: bool) -> Box<dyn SurfaceFactory> {
    Box::new(ConsoleSurfaceFactory::new(false))
}

/// Merge the config file (if any) with command-line overrides.
fn build_config(args: &Args) -> Result<DialogConfig, String> {
    let mut config = match &args.config {
        Some(path) => DialogConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => DialogConfig::default(),
    };

    config.operation = match args.operation.parse::<OperationKind>() {
        Ok(kind @ (OperationKind::Copying | OperationKind::Moving)) => kind,
        _ => {
            return Err(format!(
                "Invalid operation '{}'. Must be 'copy' or 'move'",
                args.operation
            ))
        }
    };
    if let Some(ms) = args.grace_ms {
        config.grace_delay_ms = ms;
    }
    if args.estimate {
        config.estimate_from_items = true;
    }
    if args.modal {
        config.dialog_flags |= DialogFlags::MODAL;
    }
    if args.no_time {
        config.dialog_flags |= DialogFlags::NO_TIME;
    }
    if args.allow_pause {
        config.dialog_flags |= DialogFlags::ENABLE_PAUSE;
    }
    if config.mode.is_empty() {
        config.mode = ModeFlags::RUN;
    }
    if config.working_dir.is_none() {
        config.working_dir = Some(args.src.clone());
    }
    Ok(config)
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args, factory: Box<dyn SurfaceFactory>) -> Result<RunSummary, String> {
    if !args.src.is_dir() {
        return Err(format!("Source is not a directory: {}", args.src.display()));
    }

    let config = build_config(args)?;
    let plan = plan_tree(&args.src, &args.dst)
        .map_err(|e| format!("Failed to enumerate {}: {}", args.src.display(), e))?;
    info!(files = plan.files.len(), bytes = plan.total_bytes, "Planned transfer");

    if !args.dry_run {
        std::fs::create_dir_all(&args.dst)
            .map_err(|e| format!("Failed to create {}: {}", args.dst.display(), e))?;
    }

    let mut dialog = DialogSession::from_config(factory, Box::new(FsLocationService), &config)
        .map_err(|e| e.to_string())?;

    if args.dst.exists() {
        dialog
            .update_source_and_destination(&path_string(&args.src), &path_string(&args.dst))
            .map_err(|e| e.to_string())?;
    } else {
        warn!(destination = %args.dst.display(), "Destination does not exist; keeping default location");
    }
    let item_count = plan.files.len() as u64;
    dialog.set_size(0, plan.total_bytes).map_err(|e| e.to_string())?;
    dialog.set_items(0, item_count).map_err(|e| e.to_string())?;
    if !dialog.estimate_from_items() {
        dialog.set_points(0, plan.total_bytes).map_err(|e| e.to_string())?;
    }
    dialog.show(None).map_err(|e| e.to_string())?;

    let mut summary = RunSummary::default();
    for (index, file) in plan.files.iter().enumerate() {
        if dialog.has_user_cancelled() {
            summary.cancelled = true;
            break;
        }

        dialog
            .update_current_item(&path_string(&file.source))
            .map_err(|e| e.to_string())?;

        let result = if args.dry_run {
            Ok(file.size)
        } else if config.operation == OperationKind::Moving {
            move_file(&file.source, &file.destination)
        } else {
            copy_file(&file.source, &file.destination)
        };

        match result {
            Ok(bytes) => {
                debug!(file = %file.relative.display(), bytes, "Transferred");
                summary.transferred += 1;
            }
            Err(e) => {
                warn!(file = %file.relative.display(), error = %e, "Transfer failed");
                summary.failed.push((file.relative.clone(), e.to_string()));
            }
        }

        // Failed files still count as processed so the dialog reaches the end
        summary.bytes += file.size;
        dialog.set_size_current(summary.bytes).map_err(|e| e.to_string())?;
        dialog.set_items_current(index as u64 + 1).map_err(|e| e.to_string())?;
        if !dialog.estimate_from_items() {
            dialog.set_points_current(summary.bytes).map_err(|e| e.to_string())?;
        }
    }

    debug!(finished = dialog.is_finished(), "Closing dialog");
    if let Some(ticket) = dialog.close() {
        // The process must outlive the dialog's closing animation
        ticket.wait();
    }

    Ok(summary)
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}
