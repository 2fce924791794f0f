// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use memfs_core::{
    AbstractPath, BasicFileAttributes, FsError, MemoryFileSystem, MemoryFileSystemProvider,
    MemoryFsConfig, PathStyle, Root,
};
use memfs_logging::CliLoggingArgs;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::time::Instant;
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.logging.init("memfs-stress")?;

    match cli.command {
        Command::Run(args) => {
            let json_output = args.json_output.clone();
            let report = run_workload(args)?;
            if let Some(path) = json_output {
                let file = File::create(&path)
                    .with_context(|| format!("failed to create report {}", path.display()))?;
                serde_json::to_writer_pretty(file, &report)?;
            }
            write_json_to_stdout(&report)?;
            if !report.passed() {
                bail!(
                    "verification failed: expected {} directories, found {}, {} errors",
                    report.directories_expected,
                    report.directories_found,
                    report.errors.values().sum::<u64>()
                );
            }
        }
    }
    Ok(())
}

fn write_json_to_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    out.flush()?;
    Ok(())
}

#[derive(Parser)]
#[command(author, version, about = "Concurrent workload runner for the in-memory filesystem")]
struct Cli {
    #[command(flatten)]
    logging: CliLoggingArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Run(RunArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    Unix,
    Windows,
}

impl From<StyleArg> for PathStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Unix => PathStyle::Unix,
            StyleArg::Windows => PathStyle::Windows,
        }
    }
}

#[derive(Args, Clone, Debug)]
struct RunArgs {
    /// Number of worker threads to spawn
    #[arg(long, default_value_t = 8)]
    threads: usize,

    /// Levels of directories each worker builds below its own top directory
    #[arg(long, default_value_t = 3)]
    depth: u32,

    /// Subdirectories per directory
    #[arg(long, default_value_t = 4)]
    fanout: usize,

    /// JSON filesystem configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path style, overriding the configuration file
    #[arg(long, value_enum)]
    path_style: Option<StyleArg>,

    /// Optional path for writing the JSON report
    #[arg(long)]
    json_output: Option<PathBuf>,
}

#[derive(Serialize, Debug)]
struct RunReport {
    threads: usize,
    depth: u32,
    fanout: usize,
    directories_created: u64,
    directories_expected: u64,
    directories_found: u64,
    attribute_reads: u64,
    errors: BTreeMap<String, u64>,
    elapsed_ms: u64,
    status: String,
}

impl RunReport {
    fn passed(&self) -> bool {
        self.status == "passed"
    }
}

#[derive(Default)]
struct WorkerResult {
    directories_created: u64,
    attribute_reads: u64,
    errors: BTreeMap<String, u64>,
}

impl WorkerResult {
    fn record_error(&mut self, err: &FsError) {
        *self.errors.entry(error_label(err).to_string()).or_insert(0) += 1;
    }

    fn merge(&mut self, other: WorkerResult) {
        self.directories_created += other.directories_created;
        self.attribute_reads += other.attribute_reads;
        for (label, count) in other.errors {
            *self.errors.entry(label).or_insert(0) += count;
        }
    }
}

fn error_label(err: &FsError) -> &'static str {
    match err {
        FsError::ClosedFileSystem => "closed_file_system",
        FsError::NoSuchFile(_) => "no_such_file",
        FsError::NotADirectory(_) => "not_a_directory",
        FsError::AccessDenied(_) => "access_denied",
        FsError::AlreadyExists(_) => "already_exists",
        FsError::ReadOnlyFileSystem => "read_only",
        _ => "other",
    }
}

fn load_config(args: &RunArgs) -> Result<MemoryFsConfig> {
    let mut config = match &args.config {
        Some(path) => MemoryFsConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MemoryFsConfig::default(),
    };
    if let Some(style) = args.path_style {
        config.path_style = style.into();
        config.roots = None;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Directories one worker creates: its top directory plus `depth` full levels.
/// `None` when the count does not fit in a `u64`.
fn directories_per_worker(depth: u32, fanout: usize) -> Option<u64> {
    let fanout = u64::try_from(fanout).ok()?;
    (0..=depth).try_fold(0u64, |total, level| total.checked_add(fanout.checked_pow(level)?))
}

fn run_workload(args: RunArgs) -> Result<RunReport> {
    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }
    let directories_expected = directories_per_worker(args.depth, args.fanout)
        .and_then(|per_worker| per_worker.checked_mul(args.threads as u64))
        .with_context(|| {
            format!(
                "--depth {} with --fanout {} on {} threads is too large",
                args.depth, args.fanout, args.threads
            )
        })?;
    let config = load_config(&args)?;
    let provider = MemoryFileSystemProvider::new();
    let fs = provider
        .new_file_system("memfs-stress", config)
        .context("failed to create file system")?;
    let root = fs
        .root_directories()?
        .iter()
        .next()
        .cloned()
        .context("file system has no roots")?;
    let separator = fs.separator()?;

    info!(
        threads = args.threads,
        depth = args.depth,
        fanout = args.fanout,
        root = %root,
        "starting concurrent directory workload"
    );

    let started = Instant::now();
    let barrier = Arc::new(Barrier::new(args.threads));
    let handles: Vec<_> = (0..args.threads)
        .map(|worker_id| {
            let worker = Worker {
                id: worker_id,
                fs: Arc::clone(&fs),
                root: root.clone(),
                separator,
                depth: args.depth,
                fanout: args.fanout,
            };
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                worker.run()
            })
        })
        .collect();

    let mut total = WorkerResult::default();
    for handle in handles {
        match handle.join() {
            Ok(result) => total.merge(result),
            Err(_) => {
                warn!("worker thread panicked");
                *total.errors.entry("thread_panic".to_string()).or_insert(0) += 1;
            }
        }
    }

    let directories_found = count_directories(&fs, &AbstractPath::from(root.clone()))?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    fs.close();

    // The root itself is not part of the workload
    let directories_found = directories_found.saturating_sub(1);
    let status = if total.errors.is_empty() && directories_found == directories_expected {
        "passed"
    } else {
        "failed"
    };
    info!(directories_found, directories_expected, elapsed_ms, status, "workload finished");

    Ok(RunReport {
        threads: args.threads,
        depth: args.depth,
        fanout: args.fanout,
        directories_created: total.directories_created,
        directories_expected,
        directories_found,
        attribute_reads: total.attribute_reads,
        errors: total.errors,
        elapsed_ms,
        status: status.to_string(),
    })
}

/// Count the directory at `path` and every directory below it
fn count_directories(fs: &MemoryFileSystem, path: &AbstractPath) -> Result<u64> {
    let mut count = 1;
    for name in fs.list_children(path)? {
        let child = join(path, &name);
        let attrs: BasicFileAttributes = fs.read_attributes(&child)?;
        if attrs.is_directory() {
            count += count_directories(fs, &child)?;
        }
    }
    Ok(count)
}

fn join(parent: &AbstractPath, name: &str) -> AbstractPath {
    let mut segments: Vec<String> =
        (0..parent.segment_count()).filter_map(|i| parent.segment(i)).map(str::to_string).collect();
    segments.push(name.to_string());
    let root = parent.root().cloned();
    let separator = root.as_ref().map(Root::separator).unwrap_or('/');
    // Never empty: `segments` has at least `name`
    AbstractPath::from_parts(root, segments, separator).unwrap_or_else(|| parent.clone())
}

struct Worker {
    id: usize,
    fs: Arc<MemoryFileSystem>,
    root: Root,
    separator: char,
    depth: u32,
    fanout: usize,
}

impl Worker {
    fn path(&self, segments: &[String]) -> AbstractPath {
        AbstractPath::from_parts(Some(self.root.clone()), segments.to_vec(), self.separator)
            .unwrap_or_else(|| AbstractPath::Root(self.root.clone()))
    }

    /// Read attributes of `segments` and of every prefix of it, root included
    fn read_along(&self, segments: &[String], result: &mut WorkerResult) {
        for len in 0..=segments.len() {
            match self.fs.read_attributes::<BasicFileAttributes>(&self.path(&segments[..len])) {
                Ok(_) => result.attribute_reads += 1,
                Err(err) => result.record_error(&err),
            }
        }
    }

    fn run(self) -> WorkerResult {
        let mut result = WorkerResult::default();
        let top = vec![format!("worker-{}", self.id)];
        let mut frontier = vec![top];
        let mut level = 0;

        loop {
            let mut next = Vec::new();
            for segments in frontier {
                match self.fs.create_directory(&self.path(&segments)) {
                    Ok(()) => result.directories_created += 1,
                    Err(err) => {
                        result.record_error(&err);
                        continue;
                    }
                }
                self.read_along(&segments, &mut result);
                if level < self.depth {
                    next.extend((0..self.fanout).map(|i| {
                        let mut child = segments.clone();
                        child.push(format!("d{i}"));
                        child
                    }));
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
            level += 1;
        }

        debug!(
            worker = self.id,
            created = result.directories_created,
            reads = result.attribute_reads,
            "worker finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn run_args(threads: usize, depth: u32, fanout: usize) -> RunArgs {
        RunArgs {
            threads,
            depth,
            fanout,
            config: None,
            path_style: None,
            json_output: None,
        }
    }

    #[test]
    fn test_directories_per_worker() {
        assert_eq!(directories_per_worker(0, 5), Some(1));
        assert_eq!(directories_per_worker(2, 3), Some(1 + 3 + 9));
        assert_eq!(directories_per_worker(3, 0), Some(1));
        assert_eq!(directories_per_worker(64, 2), None);
        assert_eq!(directories_per_worker(3, usize::MAX), None);
    }

    #[test]
    fn test_oversized_tree_rejected_before_spawning() {
        let err = run_workload(run_args(2, 100, 1000)).unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
    }

    #[test]
    fn test_workload_passes() {
        let report = run_workload(run_args(4, 2, 3)).unwrap();
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.directories_created, 4 * 13);
        assert_eq!(report.directories_found, report.directories_expected);
        assert!(report.attribute_reads >= report.directories_created);
    }

    #[test]
    fn test_windows_workload() {
        let mut args = run_args(2, 1, 2);
        args.path_style = Some(StyleArg::Windows);
        let report = run_workload(args).unwrap();
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.directories_found, 2 * 3);
    }

    #[test]
    fn test_read_only_config_reports_failures() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"read_only":true}}"#).unwrap();
        let mut args = run_args(2, 1, 1);
        args.config = Some(file.path().to_path_buf());

        let report = run_workload(args).unwrap();
        assert!(!report.passed());
        assert_eq!(report.directories_found, 0);
        assert_eq!(report.errors.get("read_only"), Some(&2));
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(run_workload(run_args(0, 1, 1)).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let report = run_workload(run_args(1, 0, 0)).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["threads"], 1);
        assert_eq!(value["directories_created"], 1);
        assert_eq!(value["status"], "passed");
        assert!(value.get("elapsed_ms").is_some());
    }
}
