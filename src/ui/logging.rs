//! Logging utilities
//!
//! The terminal belongs to the UI, so log records go to a size-rotated file
//! in the user's cache directory instead of stderr.

use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use env_logger::{Builder, Target, fmt::TimestampPrecision};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use log::LevelFilter;

/// Name of the active log file.
const LOG_FILE_NAME: &str = "tactical_morse.log";

/// Rotate once the active file reaches this size.
const MAX_LOG_BYTES: usize = 1024 * 1024;

/// Rotated files kept next to the active one.
const KEPT_LOG_FILES: usize = 3;

/// Directory the log files live in.
///
/// # Errors
///
/// Returns an error if the user's cache directory can't be determined.
pub fn log_dir() -> Result<PathBuf>
{
    let project_dirs = ProjectDirs::from("", "", "tactical_morse")
        .context("Failed to determine project directories")?;

    Ok(project_dirs.cache_dir().to_path_buf())
}

/// Opens the rotating log writer inside `dir`.
///
/// # Errors
///
/// Returns an error if the directory can't be created.
pub fn open_log_writer(dir: &Path) -> Result<FileRotate<AppendCount>>
{
    create_dir_all(dir).context("Failed to create log directory")?;

    Ok(FileRotate::new(
        dir.join(LOG_FILE_NAME),
        AppendCount::new(KEPT_LOG_FILES),
        ContentLimit::BytesSurpassed(MAX_LOG_BYTES),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}

/// Initializes the logging system for the application.
///
/// Everything at `Info` and above is recorded, this crate's own records
/// from `Debug` up.
///
/// # Errors
///
/// Returns an error if the log directory can't be created or a logger is
/// already installed.
pub fn init_logging(dir: &Path) -> Result<()>
{
    let writer = open_log_writer(dir)?;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("tactical_morse", LevelFilter::Debug)
        .format_timestamp(Some(TimestampPrecision::Millis))
        .target(Target::Pipe(Box::new(writer)))
        .try_init()
        .context("Failed to install logger")
}

/// Removes the active and rotated log files in `dir`.
///
/// # Errors
///
/// Returns an error if the directory can't be read or a file can't be
/// removed.
pub fn clear_log_files(dir: &Path) -> Result<()>
{
    if !dir.exists()
    {
        return Ok(());
    }

    let entries = fs::read_dir(dir).context("Failed to read log directory")?;

    for entry in entries
    {
        let path = entry
            .context("Failed to read log directory entry")?
            .path();

        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_NAME));

        if is_log && path.is_file()
        {
            fs::remove_file(&path)
                .context(format!("Failed to remove log file: {}", path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests
{
    use std::io::Write;

    use super::*;

    #[test]
    fn writer_creates_log_file()
    {
        let dir = tempfile::tempdir().expect("temp dir");
        let nested = dir.path().join("cache");

        let mut writer = open_log_writer(&nested).expect("writer opens");
        writeln!(writer, "keyed .-").expect("write succeeds");
        writer.flush().expect("flush succeeds");

        let written = fs::read_to_string(nested.join(LOG_FILE_NAME)).expect("log exists");
        assert!(written.contains("keyed .-"));
    }

    #[test]
    fn clear_removes_only_log_files()
    {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(LOG_FILE_NAME), "now").expect("write active");
        fs::write(dir.path().join(format!("{LOG_FILE_NAME}.1")), "old").expect("write rotated");
        fs::write(dir.path().join("notes.txt"), "keep").expect("write other");

        clear_log_files(dir.path()).expect("clear succeeds");

        assert!(!dir.path().join(LOG_FILE_NAME).exists());
        assert!(!dir.path().join(format!("{LOG_FILE_NAME}.1")).exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn clear_on_missing_directory_is_fine()
    {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(clear_log_files(&dir.path().join("absent")).is_ok());
    }
}
