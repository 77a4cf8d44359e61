//! Tracing subscriber setup from the `logging` config section.
//!
//! Each non-`default` section names a crate (target prefix) and gets its own
//! console level and JSON log file. The `default` section covers every
//! target no other section claims.

use crate::config::{LoggingConfig, Section};
use parking_lot::Mutex;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{level_filters::LevelFilter, Metadata};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt::{self, time::UtcTime, MakeWriter},
    layer::{Filter, SubscriberExt},
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// `off` and `none` disable output; anything unrecognized means INFO.
fn level_filter(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => LevelFilter::OFF,
        other => other.parse().unwrap_or(LevelFilter::INFO),
    }
}

/// `events` matches `events` and `events::domain`, not `events_extra`.
fn in_crate(target: &str, krate: &str) -> bool {
    target
        .strip_prefix(krate)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Absolute paths are kept; relative ones are joined onto `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[derive(Clone)]
struct LogFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl LogFile {
    fn open(path: &Path, section: &Section) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
        let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
        let rotate = FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::MaxFiles(backups)),
            ContentLimit::BytesSurpassed(max_bytes as usize),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rotate))))
    }
}

/// Writer for one record; discards output when no file applies.
struct Sink(Option<LogFile>);

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.0 {
            Some(file) => file.0.lock().write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.0 {
            Some(file) => file.0.lock().flush(),
            None => Ok(()),
        }
    }
}

/// Picks the log file for a record by its target.
#[derive(Clone, Default)]
struct TargetFiles {
    fallback: Option<LogFile>,
    per_crate: Vec<(String, LogFile)>,
}

impl TargetFiles {
    fn pick(&self, target: &str) -> Option<LogFile> {
        self.per_crate
            .iter()
            .find(|(krate, _)| in_crate(target, krate))
            .map(|(_, file)| file.clone())
            .or_else(|| self.fallback.clone())
    }

    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.per_crate.is_empty()
    }
}

impl<'a> MakeWriter<'a> for TargetFiles {
    type Writer = Sink;

    fn make_writer(&'a self) -> Sink {
        Sink(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Sink {
        Sink(self.pick(meta.target()))
    }
}

fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<LogFile> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = resolve_log_path(&section.file, base_dir);
    LogFile::open(&path, section)
        .map_err(|e| eprintln!("log file for '{name}' unavailable at {}: {e}", path.display()))
        .ok()
}

fn console_layer<F>(ansi: bool, filter: F) -> BoxedLayer
where
    F: Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_filter(filter)
        .boxed()
}

fn json_file_layer<F>(files: TargetFiles, filter: F) -> BoxedLayer
where
    F: Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(files)
        .with_filter(filter)
        .boxed()
}

/// Accepts records at or above `max` whose target no named section claims.
fn outside_crates(
    crates: Vec<String>,
    max: LevelFilter,
) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &Metadata<'_>| {
        *meta.level() <= max && !crates.iter().any(|c| in_crate(meta.target(), c))
    })
}

/// The logging config split into the fallback section and per-crate sections.
struct LogPlan<'a> {
    fallback: Option<&'a Section>,
    crates: Vec<(&'a str, &'a Section)>,
}

impl<'a> LogPlan<'a> {
    fn new(cfg: &'a LoggingConfig) -> Self {
        let mut crates: Vec<_> = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .map(|(name, section)| (name.as_str(), section))
            .collect();
        crates.sort_by_key(|(name, _)| *name);
        Self {
            fallback: cfg.get(DEFAULT_SECTION),
            crates,
        }
    }

    fn crate_names(&self) -> Vec<String> {
        self.crates.iter().map(|(name, _)| name.to_string()).collect()
    }

    fn targets(&self, level_of: impl Fn(&Section) -> LevelFilter) -> Targets {
        Targets::new()
            .with_default(LevelFilter::OFF)
            .with_targets(self.crates.iter().map(|(name, s)| (name.to_string(), level_of(s))))
    }

    fn open_files(&self, base_dir: &Path) -> TargetFiles {
        TargetFiles {
            fallback: self
                .fallback
                .and_then(|s| open_section_file(DEFAULT_SECTION, s, base_dir)),
            per_crate: self
                .crates
                .iter()
                .filter_map(|(name, s)| {
                    open_section_file(name, s, base_dir).map(|f| (name.to_string(), f))
                })
                .collect(),
        }
    }

    fn layers(&self, files: TargetFiles) -> Vec<BoxedLayer> {
        let ansi = atty::is(atty::Stream::Stdout);
        let mut layers = vec![console_layer(
            ansi,
            self.targets(|s| level_filter(&s.console_level)),
        )];

        if !files.is_empty() {
            let file_targets = self.targets(|s| {
                if s.file.trim().is_empty() {
                    LevelFilter::OFF
                } else {
                    level_filter(&s.file_level)
                }
            });
            layers.push(json_file_layer(files.clone(), file_targets));
        }

        let Some(fallback) = self.fallback else {
            return layers;
        };
        let console_level = level_filter(&fallback.console_level);
        if console_level != LevelFilter::OFF {
            layers.push(console_layer(
                ansi,
                outside_crates(self.crate_names(), console_level),
            ));
        }
        let file_level = level_filter(&fallback.file_level);
        if files.fallback.is_some() && file_level != LevelFilter::OFF {
            layers.push(json_file_layer(
                files,
                outside_crates(self.crate_names(), file_level),
            ));
        }
        layers
    }
}

/// Installs the global subscriber. Relative log files resolve against
/// `base_dir`, normally `server.home_dir`. Later calls are no-ops.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_timer(UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let plan = LogPlan::new(cfg);
    let files = plan.open_files(base_dir);
    let _ = Registry::default().with(plan.layers(files)).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(file: &str) -> Section {
        Section {
            console_level: "info".into(),
            file: file.into(),
            file_level: "debug".into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn level_names() {
        assert_eq!(level_filter("trace"), LevelFilter::TRACE);
        assert_eq!(level_filter("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(level_filter(" warn "), LevelFilter::WARN);
        assert_eq!(level_filter("Error"), LevelFilter::ERROR);
        assert_eq!(level_filter("none"), LevelFilter::OFF);
        assert_eq!(level_filter("off"), LevelFilter::OFF);
        assert_eq!(level_filter("loud"), LevelFilter::INFO);
        assert_eq!(level_filter(""), LevelFilter::INFO);
    }

    #[test]
    fn crate_targets() {
        assert!(in_crate("events", "events"));
        assert!(in_crate("events::domain::ledger", "events"));
        assert!(!in_crate("events_extra", "events"));
        assert!(!in_crate("api_ingress", "events"));
    }

    #[test]
    fn plan_separates_default_and_sorts_crates() {
        let mut cfg = default_logging_config();
        cfg.insert("modkit".into(), section(""));
        cfg.insert("events".into(), section("logs/events.log"));

        let plan = LogPlan::new(&cfg);
        assert!(plan.fallback.is_some());
        assert_eq!(plan.crate_names(), ["events", "modkit"]);
    }

    #[test]
    fn relative_paths_land_under_base_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let absolute = tmp.path().join("abs.log");
        let kept = resolve_log_path(absolute.to_str().unwrap(), Path::new("/elsewhere"));
        assert_eq!(kept, absolute);
    }

    #[test]
    fn opening_a_log_file_creates_its_directory() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/dir/app.log");
        assert!(LogFile::open(&path, &section("ignored")).is_ok());
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn blank_file_means_no_file() {
        let tmp = tempdir().unwrap();
        assert!(open_section_file("events", &section("  "), tmp.path()).is_none());
    }

    #[test]
    fn crate_file_wins_over_fallback() {
        let tmp = tempdir().unwrap();
        let fallback = LogFile::open(&tmp.path().join("d.log"), &section("")).unwrap();
        let events = LogFile::open(&tmp.path().join("e.log"), &section("")).unwrap();
        let files = TargetFiles {
            fallback: Some(fallback.clone()),
            per_crate: vec![("events".into(), events.clone())],
        };

        let picked = files.pick("events::domain").unwrap();
        assert!(Arc::ptr_eq(&picked.0, &events.0));
        let other = files.pick("api_ingress").unwrap();
        assert!(Arc::ptr_eq(&other.0, &fallback.0));
        assert!(TargetFiles::default().pick("events").is_none());
    }
}
