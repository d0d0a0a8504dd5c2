//! The classification engine.
//!
//! [`Classifier::classify`] walks a file list strictly in order. Before each
//! file it consults the [`ControlHandle`]: a cancel stops the loop, a pause
//! parks it in a sleep loop (polled every [`PAUSE_POLL_INTERVAL`]) until the
//! caller resumes or cancels. Each file then runs through the pipeline:
//!
//! ```text
//! probe ─▶ ratio ─▶ rule lookup ─▶ destination ─▶ mkdir ─▶ copy/move
//!   │                                              │          │
//!   └─ fail: ratio 0, no destination               └──────────┴─ fail: error
//! ```
//!
//! Per-file failures become failed results and never abort the run. There is
//! no retry. Cancellation is cooperative: the file in flight always finishes.
//!
//! ## Summary arithmetic
//!
//! `total_files` is the length of the input list even when the run is
//! cancelled, and `failed_files = total_files - successful_files`, so files a
//! cancelled run never reached are counted as failed while `results` holds
//! only the processed ones.

use crate::control::{ControlHandle, EngineState};
use crate::events::EventSink;
use crate::operations::{self, OperationError};
use crate::probe::{MediaProbe, NativeProbe, ProbeError};
use crate::ratio::AspectRatio;
use crate::rules::{Rule, RuleSet};
use crate::scan::{self, ScanError};
use crate::types::{
    ClassificationError, ClassificationOptions, ClassificationResult, ClassificationSummary,
};
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// How often a paused run re-checks its control signal.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct Classifier<P = NativeProbe> {
    probe: P,
    control: ControlHandle,
}

impl Classifier<NativeProbe> {
    pub fn new() -> Self {
        Self::with_probe(NativeProbe::new())
    }
}

impl Default for Classifier<NativeProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MediaProbe> Classifier<P> {
    pub fn with_probe(probe: P) -> Self {
        Self {
            probe,
            control: ControlHandle::new(),
        }
    }

    /// A handle for steering this engine from another thread.
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Clear pause/cancel left over from a previous run. Not done
    /// implicitly: a run started while cancelled stops before its first file.
    pub fn reset_control_state(&self) {
        self.control.reset();
    }

    pub fn state(&self) -> EngineState {
        self.control.engine_state()
    }

    /// Scan `root` and classify what was found.
    ///
    /// A scan failure is the only run-level error; nothing is classified.
    pub fn classify_directory(
        &self,
        root: &Path,
        include_subfolders: bool,
        rules: &RuleSet,
        base_directory: &Path,
        options: &ClassificationOptions,
        sink: &impl EventSink,
    ) -> Result<ClassificationSummary, ScanError> {
        let files = scan::scan(root, include_subfolders).inspect_err(|e| {
            log::error!("Scan of {} failed: {e}", root.display());
        })?;
        Ok(self.classify(&files, rules, base_directory, options, sink))
    }

    /// Classify `files` in order and return the run summary.
    pub fn classify(
        &self,
        files: &[PathBuf],
        rules: &RuleSet,
        base_directory: &Path,
        options: &ClassificationOptions,
        sink: &impl EventSink,
    ) -> ClassificationSummary {
        let total = files.len();
        let start_time = Utc::now();
        self.control.mark_running();
        log::info!(
            "Classifying {total} files into {} ({} mode, {} on conflict)",
            base_directory.display(),
            options.mode,
            options.conflict_resolution
        );
        sink.on_start(total);

        let mut results = Vec::with_capacity(total);
        let mut successful_files = 0;
        let mut cancelled = false;

        for (index, file) in files.iter().enumerate() {
            if !self.checkpoint() {
                cancelled = true;
                log::info!("Cancelled after {index} of {total} files");
                break;
            }

            let result = self.process_file(file, rules, base_directory, options);
            if result.success {
                successful_files += 1;
            }
            sink.on_file_processed(index + 1, total, &result);
            results.push(result);
        }

        let summary = ClassificationSummary {
            start_time,
            end_time: Utc::now(),
            total_files: total,
            successful_files,
            failed_files: total - successful_files,
            cancelled,
            results,
        };
        self.control.mark_finished(cancelled);
        log::info!(
            "Finished: {} succeeded, {} failed of {} in {} ms",
            summary.successful_files,
            summary.failed_files,
            summary.total_files,
            summary.duration().num_milliseconds()
        );
        sink.on_completed(&summary);
        summary
    }

    /// Run one file through the pipeline.
    pub fn process_file(
        &self,
        file: &Path,
        rules: &RuleSet,
        base_directory: &Path,
        options: &ClassificationOptions,
    ) -> ClassificationResult {
        let original = file.to_path_buf();

        let dimensions = match self.probe.probe(file) {
            Ok(d) if d.is_valid() => d,
            Ok(_) => {
                return self.failure(
                    original,
                    AspectRatio::unknown(),
                    None,
                    ProbeError::UnreadableDimensions(file.to_path_buf()),
                );
            }
            Err(e) => return self.failure(original, AspectRatio::unknown(), None, e),
        };

        let aspect_ratio = AspectRatio::compute(dimensions.width, dimensions.height);
        let matched_rule = rules.find_matching_rule(&aspect_ratio).cloned();
        let folder_name = matched_rule
            .as_ref()
            .map_or(options.default_folder_name.as_str(), |rule| {
                rule.destination_path.as_str()
            });

        let Some(file_name) = file.file_name() else {
            let error = OperationError::failed(
                file,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            );
            return self.failure(original, aspect_ratio, matched_rule, error);
        };
        let destination_folder = base_directory.join(folder_name);
        let destination_file = destination_folder.join(file_name);

        let Some(operation) = options.mode.file_operation() else {
            log::debug!(
                "[dry run] {} ({}) -> {}",
                file.display(),
                aspect_ratio,
                destination_file.display()
            );
            return ClassificationResult::succeeded(
                original,
                destination_file,
                aspect_ratio,
                matched_rule,
            );
        };

        if options.create_subfolders {
            if let Err(e) = operations::ensure_directory(&destination_folder) {
                return self.failure(original, aspect_ratio, matched_rule, e);
            }
        }

        match operations::transfer(
            file,
            &destination_file,
            operation,
            options.conflict_resolution,
        ) {
            Ok(placed) => {
                log::info!(
                    "{} ({}) -> {}",
                    file.display(),
                    aspect_ratio,
                    placed.display()
                );
                ClassificationResult::succeeded(original, placed, aspect_ratio, matched_rule)
            }
            Err(e) => self.failure(original, aspect_ratio, matched_rule, e),
        }
    }

    fn failure(
        &self,
        original: PathBuf,
        aspect_ratio: AspectRatio,
        matched_rule: Option<Rule>,
        error: impl Into<ClassificationError>,
    ) -> ClassificationResult {
        let result = ClassificationResult::failed(original, None, aspect_ratio, matched_rule, error);
        if let Some(e) = &result.error {
            log::warn!("{}: {e}", result.original_path.display());
        }
        result
    }

    /// `false` when the run must stop. Blocks (sleep-polling) while paused.
    fn checkpoint(&self) -> bool {
        if self.control.is_cancelled() {
            return false;
        }
        if self.control.is_paused() {
            log::info!("Paused");
            while self.control.is_paused() {
                thread::sleep(PAUSE_POLL_INTERVAL);
            }
            if !self.control.is_cancelled() {
                log::info!("Resumed");
            }
        }
        !self.control.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlState;
    use crate::events::ClassificationEvent;
    use crate::probe::backend::tests::MockProbe;
    use crate::rules::Rule;
    use crate::test_helpers::{RecordingSink, listing, touch_files, tree};
    use crate::types::{ClassificationError, ConflictResolution, OperationMode};
    use std::fs;
    use std::time::Instant;
    use tempfile::TempDir;

    const FIVE: [(&str, f64, f64); 5] = [
        ("square.jpg", 1000.0, 1000.0),
        ("wide.jpg", 1780.0, 1000.0),
        ("classic.jpg", 1330.0, 1000.0),
        ("tall.jpg", 562.5, 1000.0),
        ("portrait.jpg", 750.0, 1000.0),
    ];

    struct Fixture {
        _tmp: TempDir,
        source: PathBuf,
        base: PathBuf,
        files: Vec<PathBuf>,
    }

    fn fixture(entries: &[(&str, f64, f64)]) -> (Fixture, MockProbe) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("in");
        let base = tmp.path().join("out");
        fs::create_dir_all(&base).unwrap();
        let names: Vec<&str> = entries.iter().map(|(n, _, _)| *n).collect();
        let files = touch_files(&source, &names);
        let probe = entries
            .iter()
            .fold(MockProbe::new(), |probe, (name, w, h)| probe.with(name, *w, *h));
        (
            Fixture {
                _tmp: tmp,
                source,
                base,
                files,
            },
            probe,
        )
    }

    fn copy_rename() -> ClassificationOptions {
        ClassificationOptions {
            mode: OperationMode::Copy,
            conflict_resolution: ConflictResolution::Rename,
            ..Default::default()
        }
    }

    #[test]
    fn five_shapes_land_in_five_folders() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let summary = engine.classify(
            &fx.files,
            &RuleSet::default_rules(),
            &fx.base,
            &copy_rename(),
            &(),
        );

        assert_eq!(summary.total_files, 5);
        assert_eq!(summary.successful_files, 5);
        assert_eq!(summary.failed_files, 0);
        assert!(!summary.cancelled);
        assert_eq!(
            listing(&fx.base),
            vec![
                "Landscape_16-9",
                "Landscape_4-3",
                "Portrait_3-4",
                "Portrait_9-16",
                "Square"
            ]
        );
        assert_eq!(listing(&fx.base.join("Square")), vec!["square.jpg"]);
        assert_eq!(listing(&fx.base.join("Landscape_16-9")), vec!["wide.jpg"]);
        assert_eq!(listing(&fx.base.join("Landscape_4-3")), vec!["classic.jpg"]);
        assert_eq!(listing(&fx.base.join("Portrait_9-16")), vec!["tall.jpg"]);
        assert_eq!(listing(&fx.base.join("Portrait_3-4")), vec!["portrait.jpg"]);
        // Copy leaves sources in place.
        assert_eq!(listing(&fx.source).len(), 5);
        assert_eq!(engine.state(), EngineState::Completed);
    }

    #[test]
    fn results_carry_rule_and_ratio() {
        let (fx, probe) = fixture(&FIVE[..1]);
        let engine = Classifier::with_probe(probe);
        let summary = engine.classify(
            &fx.files,
            &RuleSet::default_rules(),
            &fx.base,
            &copy_rename(),
            &(),
        );
        let result = &summary.results[0];
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.matched_rule.as_ref().unwrap().name, "Square");
        assert_eq!(result.aspect_ratio.label(), "1:1");
        assert_eq!(
            result.destination_path.as_deref(),
            Some(fx.base.join("Square/square.jpg").as_path())
        );
    }

    #[test]
    fn unmatched_files_go_to_default_folder() {
        let (fx, probe) = fixture(&[("banner.png", 3000.0, 500.0)]);
        let engine = Classifier::with_probe(probe);
        let options = ClassificationOptions {
            default_folder_name: "Unsorted".into(),
            ..copy_rename()
        };
        let summary = engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &options, &());

        assert!(summary.results[0].success);
        assert!(summary.results[0].matched_rule.is_none());
        assert_eq!(listing(&fx.base.join("Unsorted")), vec!["banner.png"]);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let (fx, probe) = fixture(&FIVE);
        let before_source = tree(&fx.source);
        let engine = Classifier::with_probe(probe);
        let options = ClassificationOptions {
            mode: OperationMode::DryRun,
            ..copy_rename()
        };
        let summary = engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &options, &());

        assert_eq!(summary.successful_files, 5);
        assert!(listing(&fx.base).is_empty());
        assert_eq!(tree(&fx.source), before_source);
        assert_eq!(
            summary.results[1].destination_path.as_deref(),
            Some(fx.base.join("Landscape_16-9/wide.jpg").as_path())
        );
    }

    #[test]
    fn probe_failure_stops_the_pipeline_for_that_file() {
        let (fx, probe) = fixture(&FIVE[..2]);
        let probe = probe.failing("square.jpg", ProbeError::NoVisualTrack("square.jpg".into()));
        let engine = Classifier::with_probe(probe);
        let summary = engine.classify(
            &fx.files,
            &RuleSet::default_rules(),
            &fx.base,
            &copy_rename(),
            &(),
        );

        let failed = summary
            .results
            .iter()
            .find(|r| r.original_path.ends_with("square.jpg"))
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.aspect_ratio.ratio(), 0.0);
        assert!(failed.destination_path.is_none());
        assert!(failed.matched_rule.is_none());
        assert!(matches!(
            failed.error,
            Some(ClassificationError::Probe(ProbeError::NoVisualTrack(_)))
        ));
        assert_eq!(summary.successful_files, 1);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(listing(&fx.base), vec!["Landscape_16-9"]);
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let (fx, probe) = fixture(&[("flat.jpg", 100.0, 0.0)]);
        let engine = Classifier::with_probe(probe);
        let summary = engine.classify(
            &fx.files,
            &RuleSet::default_rules(),
            &fx.base,
            &copy_rename(),
            &(),
        );
        assert!(matches!(
            summary.results[0].error,
            Some(ClassificationError::Probe(ProbeError::UnreadableDimensions(_)))
        ));
        assert!(listing(&fx.base).is_empty());
    }

    #[test]
    fn second_run_follows_conflict_policy() {
        let (fx, probe) = fixture(&FIVE[..1]);
        let engine = Classifier::with_probe(probe);
        let rules = RuleSet::default_rules();
        engine.classify(&fx.files, &rules, &fx.base, &copy_rename(), &());

        let skip = ClassificationOptions {
            conflict_resolution: ConflictResolution::Skip,
            ..copy_rename()
        };
        let summary = engine.classify(&fx.files, &rules, &fx.base, &skip, &());
        assert_eq!(summary.failed_files, 1);
        assert!(matches!(
            summary.results[0].error,
            Some(ClassificationError::Operation(OperationError::FileSkipped(_)))
        ));

        let summary = engine.classify(&fx.files, &rules, &fx.base, &copy_rename(), &());
        assert_eq!(
            summary.results[0].destination_path.as_deref(),
            Some(fx.base.join("Square/square_1.jpg").as_path())
        );
        assert_eq!(
            listing(&fx.base.join("Square")),
            vec!["square.jpg", "square_1.jpg"]
        );
    }

    #[test]
    fn move_mode_empties_the_source() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let options = ClassificationOptions {
            mode: OperationMode::Move,
            ..copy_rename()
        };
        let summary = engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &options, &());
        assert_eq!(summary.successful_files, 5);
        assert!(listing(&fx.source).is_empty());
    }

    #[test]
    fn missing_folder_without_create_subfolders_fails() {
        let (fx, probe) = fixture(&FIVE[..1]);
        let engine = Classifier::with_probe(probe);
        let options = ClassificationOptions {
            create_subfolders: false,
            ..copy_rename()
        };
        let summary = engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &options, &());
        assert!(matches!(
            summary.results[0].error,
            Some(ClassificationError::Operation(
                OperationError::FileOperationFailed { .. }
            ))
        ));
    }

    #[test]
    fn disabled_rule_sends_file_elsewhere() {
        let (fx, probe) = fixture(&FIVE[..1]);
        let engine = Classifier::with_probe(probe);
        let rules = RuleSet::new(vec![
            Rule::new("Square", AspectRatio::exact(1.0), "Square")
                .unwrap()
                .disabled(),
            Rule::new("Near square", AspectRatio::new(1.0, 0.2), "Squarish").unwrap(),
        ]);
        let summary = engine.classify(&fx.files, &rules, &fx.base, &copy_rename(), &());
        assert_eq!(summary.results[0].folder_name().as_deref(), Some("Squarish"));
    }

    #[test]
    fn events_are_emitted_once_and_in_order() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let sink = RecordingSink::new();
        engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &copy_rename(), &sink);

        let events = sink.events();
        assert_eq!(events.len(), 7);
        assert!(matches!(events[0], ClassificationEvent::Started { total_files: 5 }));
        for (i, event) in events[1..6].iter().enumerate() {
            match event {
                ClassificationEvent::FileProcessed {
                    index,
                    total,
                    result,
                } => {
                    assert_eq!(*index, i + 1);
                    assert_eq!(*total, 5);
                    assert_eq!(result.original_path, fx.files[i]);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(matches!(
            &events[6],
            ClassificationEvent::Completed { summary } if summary.results.len() == 5
        ));
    }

    #[test]
    fn cancelled_run_counts_unreached_files_as_failed() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let control = engine.control();
        let sink = RecordingSink::new().on_file(move |index| {
            if index == 2 {
                control.cancel();
            }
        });
        let summary = engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &copy_rename(), &sink);

        assert!(summary.cancelled);
        assert_eq!(summary.total_files, 5);
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.successful_files, 2);
        // Deliberate: the three files never reached are reported as failed.
        assert_eq!(summary.failed_files, 3);
        assert_eq!(summary.successful_files + summary.failed_files, summary.total_files);
        assert_eq!(summary.unprocessed_files(), 3);
        assert_eq!(engine.state(), EngineState::Cancelled);

        let events = sink.events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[3], ClassificationEvent::Completed { .. }));
    }

    #[test]
    fn stale_cancel_blocks_next_run_until_reset() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let rules = RuleSet::default_rules();
        engine.cancel();

        let summary = engine.classify(&fx.files, &rules, &fx.base, &copy_rename(), &());
        assert!(summary.results.is_empty());
        assert_eq!(summary.failed_files, 5);
        assert!(engine.probe.probed_paths().is_empty());

        engine.reset_control_state();
        let summary = engine.classify(&fx.files, &rules, &fx.base, &copy_rename(), &());
        assert_eq!(summary.successful_files, 5);
    }

    #[test]
    fn pause_suspends_until_resumed() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let control = engine.control();
        let observed = std::sync::Arc::new(std::sync::Mutex::new(None));
        let observed_in_thread = observed.clone();
        let sink = RecordingSink::new().on_file(move |index| {
            if index == 1 {
                control.pause();
                let control = control.clone();
                let observed = observed_in_thread.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(300));
                    *observed.lock().unwrap() = Some(control.engine_state());
                    control.resume();
                });
            }
        });

        let started = Instant::now();
        let summary = engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &copy_rename(), &sink);

        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(summary.successful_files, 5);
        assert_eq!(summary.results.len(), 5);
        assert_eq!(*observed.lock().unwrap(), Some(EngineState::Paused));
        assert_eq!(engine.control().state(), ControlState::Running);
    }

    #[test]
    fn cancel_while_paused_stops_the_run() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let control = engine.control();
        let sink = RecordingSink::new().on_file(move |index| {
            if index == 3 {
                control.pause();
                let control = control.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(150));
                    control.cancel();
                });
            }
        });

        let summary = engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &copy_rename(), &sink);
        assert!(summary.cancelled);
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.failed_files, 2);
    }

    #[test]
    fn cancel_from_another_thread_is_observed() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let control = engine.control();
        engine.pause();

        let summary = thread::scope(|scope| {
            scope.spawn(move || {
                thread::sleep(Duration::from_millis(150));
                control.cancel();
            });
            engine.classify(&fx.files, &RuleSet::default_rules(), &fx.base, &copy_rename(), &())
        });
        assert!(summary.results.is_empty());
        assert!(summary.cancelled);
        assert_eq!(summary.total_files, 5);
    }

    #[test]
    fn classify_directory_reports_scan_errors() {
        let tmp = TempDir::new().unwrap();
        let engine = Classifier::with_probe(MockProbe::new());
        let result = engine.classify_directory(
            &tmp.path().join("missing"),
            false,
            &RuleSet::default_rules(),
            tmp.path(),
            &copy_rename(),
            &(),
        );
        assert!(matches!(result, Err(ScanError::InvalidPath(_))));
    }

    #[test]
    fn classify_directory_uses_scan_order() {
        let (fx, probe) = fixture(&FIVE);
        let engine = Classifier::with_probe(probe);
        let summary = engine
            .classify_directory(
                &fx.source,
                false,
                &RuleSet::default_rules(),
                &fx.base,
                &ClassificationOptions {
                    mode: OperationMode::DryRun,
                    ..copy_rename()
                },
                &(),
            )
            .unwrap();
        let order: Vec<String> = summary
            .results
            .iter()
            .map(|r| r.original_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            order,
            vec!["classic.jpg", "portrait.jpg", "square.jpg", "tall.jpg", "wide.jpg"]
        );
    }

    #[test]
    fn empty_input() {
        let tmp = TempDir::new().unwrap();
        let engine = Classifier::with_probe(MockProbe::new());
        let sink = RecordingSink::new();
        let summary = engine.classify(&[], &RuleSet::default_rules(), tmp.path(), &copy_rename(), &sink);
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.success_rate(), 0.0);
        assert_eq!(sink.events().len(), 2);
    }
}
