mod common;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use common::*;
use powerhour_cli::domain::errors::DomainError;

#[tokio::test]
async fn test_short_sources_are_dropped_before_planning() {
    let fixture = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
    let probe = Arc::new(FakeProbe::with_durations(&[
        ("a.mp4", 50.0),
        ("b.mp4", 90.0),
        ("c.mp4", 200.0),
    ]));
    let engine = Arc::new(FakeEngine::default());

    let report = interactor(probe, Arc::clone(&engine))
        .execute(fixture.settings(1.0), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.files_found, 3);
    assert_eq!(report.considered, 3);
    assert_eq!(report.rejected_duration, 1);
    assert_eq!(report.planned, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.output.as_deref(), Some(fixture.output.as_path()));

    let lines = fixture.output_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "bell.mp4");
    let mut segments = vec![lines[0].clone(), lines[2].clone()];
    segments.sort();
    assert_eq!(segments, vec!["b.mp4", "c.mp4"]);

    let requests = engine.segment_requests();
    assert!(requests.iter().all(|request| file_name(&request.input) != "a.mp4"));
    assert!(fixture.scratch_is_empty());
}

#[tokio::test]
async fn test_offsets_stay_inside_source() {
    let names: Vec<String> = (0..12).map(|i| format!("v{:02}.mp4", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&refs);
    let durations: Vec<(&str, f64)> = refs
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, if i % 2 == 0 { 80.0 } else { 81.0 }))
        .collect();
    let probe = Arc::new(FakeProbe::with_durations(&durations));
    let engine = Arc::new(FakeEngine::default());

    let report = interactor(probe, Arc::clone(&engine))
        .execute(fixture.settings(2.0), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.planned, 12);

    for request in engine.segment_requests() {
        let index: usize = file_name(&request.input)[1..3].parse().unwrap();
        let duration = if index % 2 == 0 { 80.0 } else { 81.0 };
        assert!(request.start >= 10.0);
        assert!(request.start <= f64::floor(duration) - 70.0);
        assert_eq!(request.length, 60.0);
    }
}

#[tokio::test]
async fn test_common_clip_failure_aborts_before_clip_jobs() {
    let fixture = Fixture::new(&["a.mp4", "b.mp4"]);
    let probe = Arc::new(FakeProbe::with_durations(&[("a.mp4", 120.0), ("b.mp4", 120.0)]));
    let engine = Arc::new(FakeEngine::failing(&["bell.mp4"]));

    let report = interactor(probe, Arc::clone(&engine))
        .execute(fixture.settings(1.0), CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed, 0);
    assert_eq!(report.succeeded, 0);
    let reason = report.abort_reason.unwrap();
    assert!(reason.contains("Failed to re-encode common clip"));
    assert_eq!(engine.encode_count(), 1);
    assert!(engine.segment_requests().is_empty());
    assert_eq!(engine.concat_count(), 0);
    assert!(!fixture.output.exists());
    assert!(fixture.scratch_is_empty());
}

#[tokio::test]
async fn test_partial_failures_still_produce_output() {
    let names = ["v1.mp4", "v2.mp4", "v3.mp4", "v4.mp4", "v5.mp4"];
    let fixture = Fixture::new(&names);
    let durations: Vec<(&str, f64)> = names.iter().map(|name| (*name, 200.0)).collect();
    let probe = Arc::new(FakeProbe::with_durations(&durations));
    let engine = Arc::new(FakeEngine::failing(&["v2.mp4", "v4.mp4"]));

    let report = interactor(probe, Arc::clone(&engine))
        .execute(fixture.settings(1.5), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.planned, 5);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 2);
    let mut failed: Vec<String> = report
        .failures
        .iter()
        .map(|failure| file_name(&failure.source))
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["v2.mp4", "v4.mp4"]);

    let lines = fixture.output_lines();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "bell.mp4");
    assert_eq!(lines[3], "bell.mp4");
    assert_ne!(lines[0], "bell.mp4");
    assert_ne!(lines[4], "bell.mp4");
    assert!(fixture.scratch_is_empty());
}

#[tokio::test]
async fn test_zero_successes_skip_concatenation() {
    let fixture = Fixture::new(&["a.mp4", "b.mp4"]);
    let probe = Arc::new(FakeProbe::with_durations(&[("a.mp4", 100.0), ("b.mp4", 100.0)]));
    let engine = Arc::new(FakeEngine::failing(&["a.mp4", "b.mp4"]));

    let report = interactor(probe, Arc::clone(&engine))
        .execute(fixture.settings(1.0), CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed, 2);
    assert_eq!(
        report.abort_reason.as_deref(),
        Some(DomainError::NothingToAssemble.to_string().as_str())
    );
    assert_eq!(engine.concat_count(), 0);
    assert!(!fixture.output.exists());
    assert!(fixture.scratch_is_empty());
}

#[tokio::test]
async fn test_assembly_follows_planning_order_not_completion_order() {
    let names = ["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4"];
    let fixture = Fixture::new(&names);
    let durations: Vec<(&str, f64)> = names.iter().map(|name| (*name, 150.0)).collect();
    let probe = Arc::new(FakeProbe::with_durations(&durations));
    let engine = Arc::new(FakeEngine {
        reverse_completion: true,
        ..FakeEngine::default()
    });

    let mut settings = fixture.settings(1.0);
    settings.jobs = 5;
    let report = interactor(probe, Arc::clone(&engine))
        .execute(settings, CancellationToken::new())
        .await
        .unwrap();
    assert!(report.is_success());

    let mut planned: Vec<_> = engine.segment_requests();
    planned.sort_by(|a, b| a.output.cmp(&b.output));
    let expected: Vec<String> = planned
        .iter()
        .map(|request| file_name(&request.input))
        .collect();

    let segments: Vec<String> = fixture
        .output_lines()
        .into_iter()
        .step_by(2)
        .collect();
    assert_eq!(segments, expected);
}

#[tokio::test]
async fn test_loudness_failures_are_skipped() {
    let fixture = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
    let probe = Arc::new(
        FakeProbe::with_durations(&[("a.mp4", 100.0), ("b.mp4", 100.0), ("c.mp4", 100.0)])
            .failing_loudness("b.mp4"),
    );
    let engine = Arc::new(FakeEngine::default());

    let report = interactor(probe, Arc::clone(&engine))
        .execute(fixture.settings(1.0), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.rejected_loudness, 1);
    assert_eq!(report.planned, 2);
    assert!(!fixture.output_lines().contains(&"b.mp4".to_string()));
}

#[tokio::test]
async fn test_preflight_failures_leave_no_workspace() {
    let fixture = Fixture::new(&["a.mp4"]);
    let probe = Arc::new(FakeProbe::with_durations(&[("a.mp4", 100.0)]));
    let engine = Arc::new(FakeEngine::default());
    let run = interactor(Arc::clone(&probe), Arc::clone(&engine));

    let mut missing_dir = fixture.settings(1.0);
    missing_dir.input_dir = fixture.root.path().join("nope");
    assert!(matches!(
        run.execute(missing_dir, CancellationToken::new()).await,
        Err(DomainError::FileNotFound(_))
    ));

    let mut missing_clip = fixture.settings(1.0);
    missing_clip.common_clip = fixture.root.path().join("nope.mp4");
    assert!(matches!(
        run.execute(missing_clip, CancellationToken::new()).await,
        Err(DomainError::FileNotFound(_))
    ));

    let empty = Fixture::new(&[]);
    assert!(matches!(
        run.execute(empty.settings(1.0), CancellationToken::new()).await,
        Err(DomainError::EmptyInput(_))
    ));

    let unavailable = Arc::new(FakeProbe {
        unavailable: true,
        ..FakeProbe::default()
    });
    assert!(matches!(
        interactor(unavailable, Arc::clone(&engine))
            .execute(fixture.settings(1.0), CancellationToken::new())
            .await,
        Err(DomainError::ToolUnavailable(_))
    ));

    assert_eq!(engine.encode_count(), 0);
    assert!(fixture.scratch_is_empty());
    assert!(empty.scratch_is_empty());
}

#[tokio::test]
async fn test_common_clip_in_input_folder_is_not_selected() {
    let fixture = Fixture::new(&["a.mp4", "b.mp4"]);
    let mut settings = fixture.settings(1.0);
    let inside = fixture.input_dir.join("bell.mp4");
    std::fs::write(&inside, b"bell").unwrap();
    settings.common_clip = inside;

    let probe = Arc::new(FakeProbe::with_durations(&[
        ("a.mp4", 100.0),
        ("b.mp4", 100.0),
        ("bell.mp4", 100.0),
    ]));
    let engine = Arc::new(FakeEngine::default());
    let report = interactor(probe, engine)
        .execute(settings, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.files_found, 2);
    assert_eq!(report.planned, 2);
    assert_eq!(fixture.output_lines().len(), 3);
}

#[tokio::test]
async fn test_same_seed_reproduces_selection() {
    let names: Vec<String> = (0..20).map(|i| format!("v{:02}.mp4", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let durations: Vec<(&str, f64)> = refs.iter().map(|name| (*name, 300.0)).collect();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let fixture = Fixture::new(&refs);
        let mut settings = fixture.settings(1.0);
        settings.max_videos = 6;
        settings.seed = Some(1234);
        let engine = Arc::new(FakeEngine::default());
        let probe = Arc::new(FakeProbe::with_durations(&durations));
        let report = interactor(probe, Arc::clone(&engine))
            .execute(settings, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.seed, 1234);
        assert_eq!(report.considered, 6);
        let starts: Vec<f64> = engine.segment_requests().iter().map(|r| r.start).collect();
        runs.push((fixture.output_lines(), starts));
    }
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_cancellation_cleans_up() {
    let fixture = Fixture::new(&["a.mp4"]);
    let probe = Arc::new(FakeProbe::with_durations(&[("a.mp4", 100.0)]));
    let engine = Arc::new(FakeEngine::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = interactor(probe, Arc::clone(&engine))
        .execute(fixture.settings(1.0), cancel)
        .await
        .unwrap();

    assert_eq!(
        report.abort_reason.as_deref(),
        Some(DomainError::Cancelled.to_string().as_str())
    );
    assert_eq!(engine.encode_count(), 0);
    assert!(!fixture.output.exists());
    assert!(fixture.scratch_is_empty());
}

#[tokio::test]
async fn test_concat_failure_is_fatal() {
    let fixture = Fixture::new(&["a.mp4"]);
    let probe = Arc::new(FakeProbe::with_durations(&[("a.mp4", 100.0)]));
    let engine = Arc::new(FakeEngine {
        fail_concat: true,
        ..FakeEngine::default()
    });

    let report = interactor(probe, engine)
        .execute(fixture.settings(1.0), CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(report
        .abort_reason
        .unwrap()
        .starts_with("Failed to concatenate videos. See"));
    assert!(!fixture.output.exists());
    assert!(fixture.scratch_is_empty());
}

#[tokio::test]
async fn test_keep_logs_preserves_failure_logs() {
    let fixture = Fixture::new(&["a.mp4", "b.mp4"]);
    let probe = Arc::new(FakeProbe::with_durations(&[("a.mp4", 100.0), ("b.mp4", 100.0)]));
    let engine = Arc::new(FakeEngine::failing(&["b.mp4"]));
    let keep = fixture.root.path().join("kept");
    let mut settings = fixture.settings(1.0);
    settings.keep_logs = Some(keep.clone());

    let report = interactor(probe, engine)
        .execute(settings, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.preserved_logs.as_deref(), Some(keep.as_path()));
    assert_eq!(report.failures.len(), 1);
    let log = &report.failures[0].log;
    assert!(log.starts_with(&keep));
    assert!(log.is_file());
    assert!(fixture.scratch_is_empty());
}
