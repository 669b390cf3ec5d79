use crate::config::{LoggingConfig, Section};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{level_filters::LevelFilter, Level, Metadata};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 5;

/// `None` means the sink is switched off.
fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        "" => Some(Level::INFO),
        _ => Some(Level::INFO),
    }
}

/// True if `target` is `prefix` or nested under it (`prefix::...`).
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- rotating file sinks --------

#[derive(Clone)]
struct LogFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl LogFile {
    fn open(path: &Path, section: &Section) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
        let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
        let rot = FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::MaxFiles(backups)),
            ContentLimit::BytesSurpassed(max_bytes as usize),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rot))))
    }
}

/// Writer handed to the fmt layer; writes are dropped when no file is routed.
struct RoutedWriter(Option<LogFile>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(f) => f.0.lock().write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(f) => f.0.lock().flush(),
            None => Ok(()),
        }
    }
}

/// Picks the log file of the longest matching subsystem prefix, else the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<LogFile>,
    by_prefix: Vec<(String, LogFile)>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<LogFile> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, f)| f.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve(meta.target()))
    }
}

/// Relative log paths live under `base_dir` (the server home dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_sink(name: &str, section: &Section, base_dir: &Path) -> Option<LogFile> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = resolve_log_path(&section.file, base_dir);
    match LogFile::open(&path, section) {
        Ok(f) => Some(f),
        Err(e) => {
            // The subscriber is not installed yet, so stderr is the only channel.
            eprintln!(
                "failed to open log file for '{}' at {}: {}",
                name,
                path.display(),
                e
            );
            None
        }
    }
}

// -------- filters --------

/// Split of the logging map into explicit subsystems and the "default" catch-all.
struct Plan<'a> {
    default: Option<&'a Section>,
    subsystems: Vec<(&'a str, &'a Section)>,
}

impl<'a> Plan<'a> {
    fn from_config(cfg: &'a LoggingConfig) -> Self {
        let mut subsystems: Vec<_> = cfg
            .iter()
            .filter(|(k, _)| k.as_str() != "default")
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        subsystems.sort_by(|a, b| a.0.cmp(b.0));
        Self {
            default: cfg.get("default"),
            subsystems,
        }
    }

    fn subsystem_names(&self) -> Vec<String> {
        self.subsystems.iter().map(|(n, _)| n.to_string()).collect()
    }

    fn targets(&self, pick: impl Fn(&Section) -> Option<Level>) -> Targets {
        self.subsystems
            .iter()
            .fold(Targets::new().with_default(LevelFilter::OFF), |t, (name, s)| {
                match pick(s) {
                    Some(level) => t.with_target(*name, LevelFilter::from_level(level)),
                    None => t,
                }
            })
    }
}

type CatchAll = FilterFn<Box<dyn Fn(&Metadata<'_>) -> bool + Send + Sync + 'static>>;

/// Passes events at or above `max_level` whose target is not claimed by a subsystem.
fn catch_all_filter(claimed: Vec<String>, max_level: Level) -> CatchAll {
    FilterFn::new(Box::new(move |meta: &Metadata<'_>| {
        !claimed.iter().any(|c| matches_prefix(meta.target(), c)) && *meta.level() <= max_level
    }))
}

// -------- public init --------

/// Install the global subscriber described by `cfg`.
///
/// Console output is human readable, files get one JSON object per line.
/// Relative file paths are resolved against `base_dir`. Calling this twice is a no-op.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records into tracing before the subscriber goes live.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let plan = Plan::from_config(cfg);
    let ansi = std::io::stdout().is_terminal();

    let mut router = FileRouter::default();
    for (name, section) in &plan.subsystems {
        if let Some(f) = open_sink(name, section, base_dir) {
            router.by_prefix.push((name.to_string(), f));
        }
    }
    if let Some(section) = plan.default {
        router.default = open_sink("default", section, base_dir);
    }

    let console_subsystems = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(plan.targets(|s| parse_level(&s.console_level)));

    let file_subsystems = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_current_span(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router.clone())
            .with_filter(plan.targets(|s| {
                if s.file.trim().is_empty() {
                    None
                } else {
                    parse_level(&s.file_level)
                }
            }))
    });

    let console_default = plan
        .default
        .and_then(|s| parse_level(&s.console_level))
        .map(|level| {
            fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(catch_all_filter(plan.subsystem_names(), level))
        });

    let file_default = plan
        .default
        .filter(|_| router.default.is_some())
        .and_then(|s| parse_level(&s.file_level))
        .map(|level| {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_current_span(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router.clone())
                .with_filter(catch_all_filter(plan.subsystem_names(), level))
        });

    let _ = Registry::default()
        .with(console_subsystems)
        .with(file_subsystems)
        .with(console_default)
        .with(file_default)
        .try_init();
}
