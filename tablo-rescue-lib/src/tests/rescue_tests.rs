use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use tablo_rescue_core::RawRow;

use super::*;
use crate::tags::TagArg;
use crate::tools::{MediaProbe, ProbeReport, SegmentMerger, TagWriter};

// -- Fakes --

#[derive(Default)]
struct FakeProbe {
    durations: HashMap<String, f64>,
}

impl MediaProbe for FakeProbe {
    fn probe(&self, path: &Path) -> Result<ProbeReport, RescueError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        Ok(ProbeReport::with_duration(
            self.durations.get(&name).copied().unwrap_or(10.0),
        ))
    }
}

#[derive(Default)]
struct FakeMerger {
    calls: RefCell<Vec<PathBuf>>,
    fail: bool,
    /// Leave a truncated file behind when failing.
    partial: bool,
}

impl SegmentMerger for FakeMerger {
    fn merge(&self, _manifest: &Path, output: &Path) -> Result<(), RescueError> {
        self.calls.borrow_mut().push(output.to_path_buf());
        if self.fail {
            if self.partial {
                fs::write(output, b"trunc")?;
            }
            return Err(RescueError::merge_failure("boom"));
        }
        fs::write(output, b"merged").map_err(RescueError::from)
    }
}

#[derive(Default)]
struct FakeTagger {
    calls: RefCell<Vec<Vec<TagArg>>>,
    fail: bool,
}

impl TagWriter for FakeTagger {
    fn write_tags(&self, _file: &Path, tags: &[TagArg]) -> Result<(), RescueError> {
        self.calls.borrow_mut().push(tags.to_vec());
        if self.fail {
            return Err(RescueError::tag_failure("no mp4tags"));
        }
        Ok(())
    }
}

struct Fixture {
    mount: tempfile::TempDir,
    out: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            mount: tempfile::tempdir().unwrap(),
            out: tempfile::tempdir().unwrap(),
        }
    }

    fn add_segments(&self, id: i64, count: usize) {
        let dir = segment_dir(self.mount.path(), id);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            fs::write(dir.join(format!("{i:05}.ts")), b"ts").unwrap();
        }
    }

    fn options(&self, force: bool) -> RescueOptions {
        RescueOptions {
            mount: self.mount.path().to_path_buf(),
            output_dir: self.out.path().to_path_buf(),
            force,
        }
    }
}

fn snapshot() -> IndexSnapshot {
    IndexSnapshot::new(
        vec![
            RawRow::new()
                .with("ID", 100)
                .with("title", "Show A")
                .with("channelID", 5)
                .with("entityType", "Episode")
                .with("subType", "episode")
                .with("episodeNum", "3")
                .with("seasonNum", "1"),
            RawRow::new()
                .with("ID", 200)
                .with("title", "Film B")
                .with("entityType", "Movie")
                .with("subType", "feature"),
        ],
        Vec::new(),
    )
}

fn toolchain<'a>(probe: &'a FakeProbe, merger: &'a FakeMerger, tagger: &'a FakeTagger) -> Toolchain<'a> {
    Toolchain {
        probe,
        merger,
        tagger,
    }
}

// -- Tests --

#[test]
fn rescues_and_tags() {
    let fx = Fixture::new();
    fx.add_segments(100, 2);
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[100], &|_| {});
    assert_eq!(report.rescued(), 1);
    let output = report.outcomes[0].output.clone().unwrap();
    assert_eq!(
        output,
        fx.out.path().join("100 Show A - s01e03 -  - [Episode episode] [TVRip].mp4")
    );
    assert!(output.exists());
    let tags = tagger.calls.borrow();
    assert_eq!(tags.len(), 1);
    assert!(tags[0].contains(&TagArg::new("-comment", "TabloID=100")));
}

#[test]
fn missing_segment_dir_fails() {
    let fx = Fixture::new();
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[100], &|_| {});
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.outcomes[0].error, Some(RescueError::NoSegments(_))));
    assert!(merger.calls.borrow().is_empty());
}

#[test]
fn empty_segment_dir_fails_without_output() {
    let fx = Fixture::new();
    fx.add_segments(100, 0);
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[100], &|_| {});
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.outcomes[0].error, Some(RescueError::NoSegments(_))));
    assert!(merger.calls.borrow().is_empty());
    assert_eq!(fs::read_dir(fx.out.path()).unwrap().count(), 0);
}

#[test]
fn existing_output_is_skipped() {
    let fx = Fixture::new();
    fx.add_segments(200, 1);
    let existing = fx.out.path().join("200 Film B - [Movie feature] [TVRip].mp4");
    fs::write(&existing, b"old").unwrap();
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[200], &|_| {});
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.outcomes[0].output.as_deref(), Some(existing.as_path()));
    assert!(merger.calls.borrow().is_empty());
    assert!(tagger.calls.borrow().is_empty());
    assert_eq!(fs::read(&existing).unwrap(), b"old");
}

#[test]
fn force_overwrites_existing_output() {
    let fx = Fixture::new();
    fx.add_segments(200, 1);
    let existing = fx.out.path().join("200 Film B - [Movie feature] [TVRip].mp4");
    fs::write(&existing, b"old").unwrap();
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(true));

    let report = rescuer.rescue_ids(&snapshot(), &[200], &|_| {});
    assert_eq!(report.rescued(), 1);
    assert_eq!(fs::read(&existing).unwrap(), b"merged");
}

#[test]
fn tag_failure_downgrades_to_failed() {
    let fx = Fixture::new();
    fx.add_segments(200, 1);
    let (probe, merger) = (FakeProbe::default(), FakeMerger::default());
    let tagger = FakeTagger {
        fail: true,
        ..Default::default()
    };
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[200], &|_| {});
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.outcomes[0].error, Some(RescueError::TagToolFailure(_))));
}

#[test]
fn failures_do_not_abort_batch() {
    let fx = Fixture::new();
    fx.add_segments(200, 1);
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[999, 100, 200], &|_| {});
    let kinds: Vec<OutcomeKind> = report.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![OutcomeKind::Failed, OutcomeKind::Failed, OutcomeKind::Rescued]
    );
    assert!(matches!(report.outcomes[0].error, Some(RescueError::NotFound(999))));
    assert!(!report.cancelled);
}

#[test]
fn merge_failure_is_failed() {
    let fx = Fixture::new();
    fx.add_segments(200, 2);
    let (probe, tagger) = (FakeProbe::default(), FakeTagger::default());
    let merger = FakeMerger {
        fail: true,
        ..Default::default()
    };
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[200], &|_| {});
    assert!(matches!(report.outcomes[0].error, Some(RescueError::MergeToolFailure(_))));
    assert!(tagger.calls.borrow().is_empty());
}

#[test]
fn failed_merge_removes_partial_output() {
    let fx = Fixture::new();
    fx.add_segments(200, 2);
    let (probe, tagger) = (FakeProbe::default(), FakeTagger::default());
    let broken = FakeMerger {
        fail: true,
        partial: true,
        ..Default::default()
    };
    let rescuer = Rescuer::new(toolchain(&probe, &broken, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[200], &|_| {});
    assert_eq!(report.failed(), 1);
    let output = broken.calls.borrow()[0].clone();
    assert!(!output.exists());

    // a rerun merges again instead of skipping the broken file
    let merger = FakeMerger::default();
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));
    let report = rescuer.rescue_ids(&snapshot(), &[200], &|_| {});
    assert_eq!(report.rescued(), 1);
    assert_eq!(merger.calls.borrow().len(), 1);
}

#[test]
fn short_segment_is_probe_failure() {
    let fx = Fixture::new();
    fx.add_segments(200, 2);
    let probe = FakeProbe {
        durations: HashMap::from([("00001.ts".to_string(), 0.4)]),
    };
    let (merger, tagger) = (FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let report = rescuer.rescue_ids(&snapshot(), &[200], &|_| {});
    assert!(matches!(report.outcomes[0].error, Some(RescueError::ProbeFailure { .. })));
    assert!(merger.calls.borrow().is_empty());
}

#[test]
fn cancel_stops_between_recordings() {
    let fx = Fixture::new();
    fx.add_segments(100, 1);
    fx.add_segments(200, 1);
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let cancel = AtomicBool::new(false);
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false))
        .with_cancel(&cancel);

    let report = rescuer.rescue_ids(&snapshot(), &[100, 200], &|event| {
        if matches!(event, RescueProgress::Finished { .. }) {
            cancel.store(true, Ordering::SeqCst);
        }
    });
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.cancelled);
}

#[test]
fn cancel_during_last_recording_is_reported() {
    let fx = Fixture::new();
    fx.add_segments(200, 2);
    let (probe, tagger) = (FakeProbe::default(), FakeTagger::default());
    let merger = FakeMerger {
        fail: true,
        ..Default::default()
    };
    let cancel = AtomicBool::new(false);
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false))
        .with_cancel(&cancel);

    let report = rescuer.rescue_ids(&snapshot(), &[200], &|event| {
        if matches!(event, RescueProgress::Merging { .. }) {
            cancel.store(true, Ordering::SeqCst);
        }
    });
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.failed(), 1);
    assert!(report.cancelled);
}

#[test]
fn rescue_all_only_visits_recordings_with_segments() {
    let fx = Fixture::new();
    fx.add_segments(200, 3);
    let (probe, merger, tagger) = (FakeProbe::default(), FakeMerger::default(), FakeTagger::default());
    let rescuer = Rescuer::new(toolchain(&probe, &merger, &tagger), fx.options(false));

    let events = RefCell::new(Vec::new());
    let report = rescuer.rescue_all(&snapshot(), &|e| events.borrow_mut().push(e));
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].id, 200);
    assert_eq!(report.rescued(), 1);

    let probes = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, RescueProgress::ProbingSegment { .. }))
        .count();
    assert_eq!(probes, 3);
}
