//! Reading logs and projects from disk.
//!
//! Logs are JSON Lines files of operation records. A project is a directory
//! of such files; one file may carry records of several source files.

use crate::config::Config;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use indexmap::IndexMap;
use palimpsest_core::Timestamp;
use palimpsest_log::{Normalizer, OperationLog, OperationRecord, Project, read_records};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

/// Decode every record of a JSON Lines file
///
/// # Errors
///
/// Returns error if the file cannot be opened or a line does not decode
pub fn read_file(path: &Path) -> Result<Vec<OperationRecord>> {
    let file = File::open(path).wrap_err_with(|| format!("could not open {}", path.display()))?;
    read_records(BufReader::new(file)).wrap_err_with(|| format!("could not decode {}", path.display()))
}

fn finish(log: OperationLog, config: &Config) -> Result<OperationLog> {
    if !config.replay.heal_on_load {
        return Ok(log);
    }
    let (healed, report) = palimpsest_replay::heal(&log)
        .wrap_err_with(|| format!("could not heal {}", log.file_path()))?;
    if !report.is_empty() {
        info!(file = log.file_path(), inserted = report.inserted(), "healed on load");
    }
    Ok(healed)
}

/// Load and normalize the log of a single file
///
/// # Errors
///
/// Returns error if the file cannot be read or its records do not form a log
pub fn load_log(path: &Path, config: &Config) -> Result<OperationLog> {
    let records = read_file(path)?;
    let log = Normalizer::from_config(&config.normalize)
        .normalize(records)
        .wrap_err_with(|| format!("could not index {}", path.display()))?;
    debug!(file = log.file_path(), records = log.len(), "loaded log");
    finish(log, config)
}

fn modified(path: &Path) -> Result<Timestamp> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .wrap_err_with(|| format!("could not stat {}", path.display()))?;
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0);
    Ok(Timestamp::from_millis(millis))
}

/// JSON Lines files of a directory, sorted by name
///
/// # Errors
///
/// Returns error if the directory cannot be listed
pub fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).wrap_err_with(|| format!("could not list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every log of a project directory
///
/// A source file's history may be split over several log files. Records
/// are merged across files in `(time, sequence)` order before they are
/// normalized, and a source file is as new as the newest log mentioning it.
///
/// # Errors
///
/// Returns error if any file cannot be read or indexed
pub fn load_project(dir: &Path, config: &Config) -> Result<Project> {
    let name = dir
        .file_name()
        .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned());

    let mut records = Vec::new();
    let mut last_modified: IndexMap<String, Timestamp> = IndexMap::new();
    for path in log_files(dir)? {
        let stamp = modified(&path)?;
        let file_records = read_file(&path)?;
        debug!(log = %path.display(), records = file_records.len(), "read log file");
        for rec in &file_records {
            let newest = last_modified.entry(rec.file_path.clone()).or_insert(stamp);
            *newest = (*newest).max(stamp);
        }
        records.extend(file_records);
    }
    records.sort_by_key(OperationRecord::order_key);

    let logs = Normalizer::from_config(&config.normalize)
        .normalize_by_file(records)
        .wrap_err_with(|| format!("could not index {}", dir.display()))?;
    let mut project = Project::new(name);
    for (path, log) in logs {
        let modified = last_modified.get(&path).copied().unwrap_or_default();
        project.insert(finish(log, config)?, modified);
    }
    info!(
        project = project.name(),
        files = project.len(),
        records = project.record_count(),
        "loaded project"
    );
    Ok(project)
}
