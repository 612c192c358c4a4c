//! Subcommand implementations.
//!
//! Each command writes its report to `out` so tests can capture it.

use crate::config::Config;
use crate::load::{load_log, load_project};
use crate::progress::BarProgress;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use palimpsest_core::{ProgressMonitor, Timestamp};
use palimpsest_graph::GraphRepository;
use palimpsest_log::{OperationLog, write_records};
use palimpsest_replay::{ReplayEngine, heal};
use palimpsest_slice::{Criterion, Slicer, Snippet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Where a restore or slice reads the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum At {
    /// After the record at this index
    Index(usize),
    /// At this time
    Time(Timestamp),
}

impl At {
    fn resolve(self, log: &OperationLog) -> Result<usize> {
        match self {
            At::Index(index) => Ok(index),
            At::Time(time) => log
                .find_by_time(time)
                .ok_or_else(|| eyre!("no record of {} is visible at {time}", log.file_path())),
        }
    }
}

/// Print a summary of a log
///
/// # Errors
///
/// Returns error if the log cannot be loaded or written out
pub fn inspect(log_path: &Path, config: &Config, out: &mut dyn Write) -> Result<()> {
    let log = load_log(log_path, config)?;
    writeln!(out, "file: {}", log.file_path())?;
    writeln!(out, "records: {}", log.len())?;
    if let Some((first, last)) = log.time_span() {
        writeln!(out, "span: {first} .. {last} ({})", last.duration_since(&first))?;
    }
    writeln!(out, "restoration points: {}", log.restoration_point_count())?;
    for point in log.restoration_points() {
        writeln!(out, "  #{} at {} {}", point.index, point.time, point.digest.short())?;
    }
    let authors = log.authors();
    if !authors.is_empty() {
        writeln!(out, "authors: {}", authors.join(", "))?;
    }

    let report = ReplayEngine::new(&log).with_config(config.replay.clone()).verify();
    writeln!(
        out,
        "replay: {} replayed, {} divergences, {} failures",
        report.replayed,
        report.divergences.len(),
        report.failures.len()
    )?;
    for failure in &report.failures {
        writeln!(out, "  {failure}")?;
    }
    Ok(())
}

/// Print the content of a file at a point of its history
///
/// # Errors
///
/// Returns error if the log cannot be loaded or replay fails
pub fn restore(
    log_path: &Path,
    at: At,
    from: Option<usize>,
    config: &Config,
    out: &mut dyn Write,
) -> Result<()> {
    let log = load_log(log_path, config)?;
    let index = at.resolve(&log)?;
    let engine = ReplayEngine::new(&log).with_config(config.replay.clone());
    let content = match from {
        Some(known_index) => {
            let known = engine
                .restore(known_index)
                .wrap_err_with(|| format!("could not restore starting index {known_index}"))?;
            engine.restore_from(&known, known_index, index)?
        }
        None => engine.restore(index)?,
    };
    write!(out, "{content}")?;
    Ok(())
}

/// Print the index of the record visible at `time`
///
/// # Errors
///
/// Returns error if the log cannot be loaded or `time` is outside it
pub fn find(log_path: &Path, time: Timestamp, config: &Config, out: &mut dyn Write) -> Result<()> {
    let log = load_log(log_path, config)?;
    let index = At::Time(time).resolve(&log)?;
    writeln!(out, "{index}")?;
    Ok(())
}

/// Write the healed log to `out_path`
///
/// # Errors
///
/// Returns error if the log cannot be loaded, healed or written
pub fn heal_log(log_path: &Path, out_path: &Path, config: &Config, out: &mut dyn Write) -> Result<()> {
    let mut load_config = config.clone();
    load_config.replay.heal_on_load = false;
    let log = load_log(log_path, &load_config)?;

    let (healed, report) = heal(&log)?;
    let file = File::create(out_path).wrap_err_with(|| format!("could not create {}", out_path.display()))?;
    write_records(file, healed.records())?;

    for gap in &report.gaps {
        writeln!(
            out,
            "close #{} / open #{}: {} edits",
            gap.close_index, gap.open_index, gap.inserted
        )?;
    }
    writeln!(out, "inserted {} records into {}", report.inserted(), out_path.display())?;
    Ok(())
}

/// Print node and edge counts of a project graph
///
/// # Errors
///
/// Returns error if the project cannot be loaded or the build fails
pub fn graph(
    project_dir: &Path,
    config: &Config,
    progress: &mut dyn ProgressMonitor,
    out: &mut dyn Write,
) -> Result<()> {
    let project = load_project(project_dir, config)?;
    let mut repository = GraphRepository::new(config.graph.clone());
    let graph = repository.build_project_graph(&project, progress)?;

    for file in graph.files() {
        writeln!(
            out,
            "{}: {} nodes, {} edges",
            file.path(),
            file.node_count(),
            file.edge_count()
        )?;
    }
    writeln!(out, "cut/paste edges: {}", graph.cut_paste_edges().len())?;
    writeln!(out, "total: {} nodes, {} edges", graph.node_count(), graph.edge_count())?;
    Ok(())
}

/// Options of the `slice` command
#[derive(Debug, Clone)]
pub struct SliceArgs<'a> {
    /// Project directory
    pub project_dir: &'a Path,
    /// File the snippet is read from
    pub file: &'a str,
    /// First char of the snippet
    pub start: usize,
    /// End of the snippet, exclusive
    pub end: usize,
    /// Point of history the snippet is read at
    pub at: At,
    /// Forward instead of backward
    pub forward: bool,
}

/// Print a slice, with its direction and criterion, as JSON
///
/// # Errors
///
/// Returns error if the project cannot be loaded, the graph build fails or
/// the snippet names an unknown file
pub fn slice(
    args: &SliceArgs<'_>,
    config: &Config,
    progress: &mut dyn ProgressMonitor,
    out: &mut dyn Write,
) -> Result<()> {
    let project = load_project(args.project_dir, config)?;
    let file = project
        .file(args.file)
        .ok_or_else(|| eyre!("{} is not part of {}", args.file, project.name()))?;
    let range = args.start..args.end;
    let snippet = match args.at {
        At::Index(index) => Snippet::at_index(&file.log, range, index)?,
        At::Time(time) => Snippet::at_time(&file.log, range, time)?,
    };

    let mut repository = GraphRepository::new(config.graph.clone());
    let graph = repository.build_project_graph(&project, progress)?;

    let criterion = Criterion::from(snippet);
    let slicer = Slicer::new(&graph);
    let slice = if args.forward {
        slicer.forward_slice(&criterion)?
    } else {
        slicer.backward_slice(&criterion)?
    };

    serde_json::to_writer_pretty(&mut *out, &slice.report())?;
    writeln!(out)?;
    Ok(())
}

/// Progress reporter for commands that build graphs
#[must_use]
pub fn progress_for(quiet: bool) -> BarProgress {
    if quiet {
        BarProgress::hidden()
    } else {
        BarProgress::new("building graph")
    }
}
