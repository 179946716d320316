//! Opt-in stage timing and a render debug log.
//!
//! Every timing scope belongs to a [`Stage`] of the edit-to-screen pipeline.
//! With `--perf` each scope prints to stderr as it closes and is folded into
//! per-stage totals that [`report`] prints on exit. Scopes and events also
//! go to the debug log file when one is configured.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG_ON: AtomicBool = AtomicBool::new(false);
static DEBUG_LOGGER: LazyLock<Mutex<DebugLogger>> = LazyLock::new(|| Mutex::new(DebugLogger::new()));
static TOTALS: Mutex<[StageStats; Stage::ALL.len()]> = Mutex::new([StageStats::EMPTY; Stage::ALL.len()]);

/// A timed step of loading, editing, or drawing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Parse,
    Render,
    Reflow,
    CursorRestore,
    Reconcile,
    Layout,
    Save,
    Session,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Load,
        Stage::Parse,
        Stage::Render,
        Stage::Reflow,
        Stage::CursorRestore,
        Stage::Reconcile,
        Stage::Layout,
        Stage::Save,
        Stage::Session,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Load => "app.load_document",
            Stage::Parse => "markdown.parse",
            Stage::Render => "render.document",
            Stage::Reflow => "editor.reflow",
            Stage::CursorRestore => "cursor.preserve",
            Stage::Reconcile => "reconcile",
            Stage::Layout => "ui.layout",
            Stage::Save => "autosave.save",
            Stage::Session => "app.run.total",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Running totals for one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageStats {
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    const EMPTY: Self = Self {
        count: 0,
        total_ms: 0.0,
        max_ms: 0.0,
    };

    pub fn record(&mut self, elapsed_ms: f64) {
        self.count += 1;
        self.total_ms += elapsed_ms;
        self.max_ms = self.max_ms.max(elapsed_ms);
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

impl Default for StageStats {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Guard that times a stage until dropped.
#[derive(Debug)]
pub struct Scope {
    stage: Stage,
    start: Instant,
    detail: Option<String>,
}

impl Scope {
    /// Attach a detail (sizes, offsets) shown next to the timing.
    pub fn note(&mut self, detail: impl Into<String>) {
        if is_enabled() || is_debug_log_enabled() {
            self.detail = Some(detail.into());
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let timing = is_enabled();
        let logging = is_debug_log_enabled();
        if !timing && !logging {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        let line = match &self.detail {
            Some(detail) => format!("{elapsed_ms:.3} ms ({detail})"),
            None => format!("{elapsed_ms:.3} ms"),
        };
        if timing {
            if let Ok(mut totals) = TOTALS.lock() {
                totals[self.stage.index()].record(elapsed_ms);
            }
            eprintln!("[perf] {}: {line}", self.stage);
        }
        if logging {
            log_event(self.stage.label(), line);
        }
    }
}

#[derive(Debug)]
struct DebugLogger {
    enabled: bool,
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            enabled: false,
            start: Instant::now(),
            writer: None,
        }
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn scope(stage: Stage) -> Scope {
    Scope {
        stage,
        start: Instant::now(),
        detail: None,
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Per-stage totals of the stages that ran at least once.
pub fn summary() -> Vec<(Stage, StageStats)> {
    let Ok(totals) = TOTALS.lock() else {
        return Vec::new();
    };
    Stage::ALL
        .into_iter()
        .map(|stage| (stage, totals[stage.index()]))
        .filter(|(_, stats)| stats.count > 0)
        .collect()
}

/// Print the per-stage totals to stderr when timing is on.
pub fn report() {
    if !is_enabled() {
        return;
    }
    for (stage, stats) in summary() {
        eprintln!(
            "[perf] total {stage}: {} runs, {:.2} ms, mean {:.3} ms, max {:.3} ms",
            stats.count,
            stats.total_ms,
            stats.mean_ms(),
            stats.max_ms
        );
    }
}

pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = DEBUG_LOGGER.lock().expect("debug logger lock poisoned");
    if let Some(path) = path {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "synapse render debug log start")?;
        writer.flush()?;
        logger.enabled = true;
        logger.start = Instant::now();
        logger.writer = Some(writer);
        DEBUG_LOG_ON.store(true, Ordering::Relaxed);
    } else {
        logger.enabled = false;
        logger.writer = None;
        DEBUG_LOG_ON.store(false, Ordering::Relaxed);
    }
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    DEBUG_LOG_ON.load(Ordering::Relaxed)
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    if !is_debug_log_enabled() {
        return;
    }
    let mut logger = DEBUG_LOGGER.lock().expect("debug logger lock poisoned");
    if !logger.enabled {
        return;
    }
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = logger.writer.as_mut() {
        let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_stage_stats_track_count_total_and_max() {
        let mut stats = StageStats::default();
        assert_eq!(stats.mean_ms(), 0.0);
        stats.record(2.0);
        stats.record(6.0);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_ms, 8.0);
        assert_eq!(stats.max_ms, 6.0);
        assert_eq!(stats.mean_ms(), 4.0);
    }

    #[test]
    fn test_stage_labels_are_distinct() {
        let mut labels: Vec<&str> = Stage::ALL.iter().map(|s| s.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), Stage::ALL.len());
        assert_eq!(Stage::Reflow.to_string(), "editor.reflow");
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn test_debug_log_path_enables_logging_and_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("test.event", "hello world");
        drop(scope(Stage::Parse));
        let mut noted = scope(Stage::Reflow);
        noted.note("edit=3..4");
        drop(noted);
        set_debug_log_path(None).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("synapse render debug log start"));
        assert!(content.contains("test.event: hello world"));
        assert!(content.contains("markdown.parse: "));
        assert!(content.contains("editor.reflow: "));
        assert!(content.contains("(edit=3..4)"));
    }
}
