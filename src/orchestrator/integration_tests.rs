// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fleet runs and status boards over synthetic work units.

use std::fs;
use std::path::Path;
use std::time::Duration;

use super::*;
use crate::config::TrackingParams;
use crate::status::RunState;
use crate::test_support::{write_movie, CENTERS};

fn params() -> TrackingParams {
    let mut params = TrackingParams::with_search_range(3.0);
    params.threshold = 0.1;
    params
}

/// `units` work units of `frames` frames each, sharing quickparams.
fn fleet(dir: &Path, units: usize, frames: usize) -> FleetConfig {
    let locations = (0..units)
        .map(|i| {
            let unit = dir.join(format!("movie{:02}", i));
            fs::create_dir(&unit).unwrap();
            write_movie(&unit, frames, &CENTERS);
            unit
        })
        .collect();
    let mut config = FleetConfig::new(locations);
    config.frames_pattern = Some("frame_*.png".to_string());
    config.quickparams = Some(params());
    config.max_concurrency = Some(1);
    config
}

fn write_record(unit: &WorkUnit, body: &str) -> SystemTime {
    fs::write(&unit.status, body).unwrap();
    fs::metadata(&unit.status).unwrap().modified().unwrap()
}

#[test]
fn test_heartbeat_reclassifies_stale_worker() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 1, 1));
    let written = write_record(
        &orchestrator.units()[0],
        r#"{"state": "working", "seconds_per_frame": 1.0, "most_recent_frame": 7}"#,
    );

    let fresh = &orchestrator.status_board_at(written + Duration::from_secs(299))[0];
    assert_eq!(fresh.state, UnitState::Reported(RunState::Working));
    assert_eq!(fresh.most_recent_frame, Some(7));

    let stale = &orchestrator.status_board_at(written + Duration::from_secs(301))[0];
    assert_eq!(stale.state, UnitState::Dead);
    assert_eq!(stale.cells()[7], "DEAD");
    assert_eq!(stale.cells()[9], "00:05:01");
}

#[test]
fn test_stale_done_record_without_output_is_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 1, 1));
    let unit = &orchestrator.units()[0];
    write_record(unit, r#"{"state": "done", "seconds_per_frame": 1.0}"#);

    assert_eq!(orchestrator.status_board()[0].state, UnitState::Waiting);

    fs::create_dir(&unit.output).unwrap();
    let row = &orchestrator.status_board()[0];
    assert_eq!(row.state, UnitState::Reported(RunState::Done));
    assert!(row.has_output);
}

#[test]
fn test_output_without_record_is_unaccounted() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 2, 1));
    fs::create_dir(&orchestrator.units()[1].output).unwrap();

    let board = orchestrator.status_board();
    assert_eq!(board[0].state, UnitState::Waiting);
    assert_eq!(board[0].time_since_update, None);
    assert_eq!(board[1].state, UnitState::Unaccounted);
    assert_eq!(board[1].cells()[7], "??");
}

#[test]
fn test_unreadable_record_only_affects_its_row() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 2, 1));
    write_record(&orchestrator.units()[0], "{\"state\": ");
    write_record(&orchestrator.units()[1], r#"{"state": "starting", "total_frames": 1}"#);

    let board = orchestrator.status_board();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].state, UnitState::Unreadable);
    assert_eq!(board[0].total_frames, None);
    assert_eq!(board[1].state, UnitState::Reported(RunState::Starting));
    assert_eq!(board[1].total_frames, Some(1));
}

#[test]
fn test_run_inline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 1, 3));

    let summary = orchestrator.run_inline(0, false).unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.rows, 9);

    let row = &orchestrator.status_board()[0];
    assert_eq!(row.state, UnitState::Reported(RunState::Done));
    assert!(row.has_output);
    assert_eq!(row.total_frames, Some(3));
    assert_eq!(row.process_id, Some(std::process::id()));

    assert!(matches!(
        orchestrator.run_inline(0, false),
        Err(OrchestratorError::Pipeline(PipelineError::DestinationExists(_)))
    ));
    assert_eq!(orchestrator.run_inline(0, true).unwrap().rows, 9);
}

#[test]
fn test_prepare_surfaces_configuration_errors() {
    let dir = tempfile::tempdir().unwrap();
    let base = fleet(dir.path(), 1, 2);
    let location = base.units[0].clone();

    let orchestrator = FleetOrchestrator::in_process(base.clone());
    assert!(matches!(
        orchestrator.prepare(5),
        Err(OrchestratorError::UnknownUnit(5))
    ));

    let mut config = base.clone();
    config.frames_pattern = None;
    assert!(matches!(
        FleetOrchestrator::in_process(config).prepare(0),
        Err(OrchestratorError::Config(ConfigError::MissingFramesPattern(_)))
    ));

    let mut config = base.clone();
    config.frames_pattern = Some("*.tif".to_string());
    assert!(matches!(
        FleetOrchestrator::in_process(config).prepare(0),
        Err(OrchestratorError::Config(ConfigError::NoFrames(_)))
    ));

    let mut config = base.clone();
    config.quickparams = None;
    assert!(matches!(
        FleetOrchestrator::in_process(config.clone()).prepare(0),
        Err(OrchestratorError::Config(ConfigError::MissingParameters(_)))
    ));

    fs::write(
        location.join("bigtracking.yaml"),
        "maxdisp: 3.0\nthreshold: 0.1\n",
    )
    .unwrap();
    let job = FleetOrchestrator::in_process(config).prepare(0).unwrap();
    assert_eq!(job.request.params.search_range, 3.0);
    assert_eq!(job.request.images.len(), 2);
    assert_eq!(job.request.status.as_deref(), Some(location.join("trackingstatus.json").as_path()));

    let mut config = base;
    if let Some(params) = config.quickparams.as_mut() {
        params.detector = "hough".to_string();
    }
    assert!(matches!(
        FleetOrchestrator::in_process(config).prepare(0),
        Err(OrchestratorError::Config(ConfigError::UnknownDetector { .. }))
    ));
}

#[test]
fn test_window_file_limits_frames() {
    let dir = tempfile::tempdir().unwrap();
    let config = fleet(dir.path(), 1, 4);
    fs::write(config.units[0].join("window.yaml"), "firstframe: 2\nlastframe: 3\n").unwrap();

    let orchestrator = FleetOrchestrator::in_process(config);
    let job = orchestrator.prepare(0).unwrap();
    assert_eq!(job.request.frame_selection().unwrap(), vec![2, 3]);
}

#[tokio::test]
async fn test_submit_and_wait_for_every_unit() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 2, 3));

    for result in orchestrator.start_all(false).await {
        result.unwrap();
    }
    let results = orchestrator.wait_all().await;
    assert_eq!(results.len(), 2);
    for (_, result) in results {
        assert_eq!(result.unwrap().rows, 9);
    }

    for row in orchestrator.status_board() {
        assert_eq!(row.state, UnitState::Reported(RunState::Done));
    }
}

#[tokio::test]
async fn test_failing_unit_does_not_affect_others() {
    let dir = tempfile::tempdir().unwrap();
    let config = fleet(dir.path(), 2, 2);
    for entry in fs::read_dir(&config.units[0]).unwrap() {
        fs::remove_file(entry.unwrap().path()).unwrap();
    }
    let mut orchestrator = FleetOrchestrator::in_process(config);

    let results = orchestrator.start_all(false).await;
    assert!(matches!(
        results[0],
        Err(OrchestratorError::Config(ConfigError::NoFrames(_)))
    ));
    assert!(results[1].is_ok());

    assert_eq!(orchestrator.wait(1).await.unwrap().rows, 6);
    assert!(matches!(
        orchestrator.wait(0).await,
        Err(OrchestratorError::NotSubmitted(0))
    ));

    let board = orchestrator.status_board();
    assert_eq!(board[0].state, UnitState::Waiting);
    assert_eq!(board[1].state, UnitState::Reported(RunState::Done));
}

#[tokio::test]
async fn test_abort_queued_unit() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 2, 2));

    orchestrator.submit(0, false).await.unwrap();
    orchestrator.submit(1, false).await.unwrap();
    orchestrator.abort(1).unwrap();

    let aborted = orchestrator.wait(1).await;
    assert!(
        matches!(
            aborted,
            Err(OrchestratorError::Cancelled(1))
                | Err(OrchestratorError::Pipeline(PipelineError::Aborted { .. }))
        ),
        "unexpected result {:?}",
        aborted
    );
    assert!(!orchestrator.units()[1].has_output());
    assert!(orchestrator.wait(0).await.is_ok());
}

#[tokio::test]
async fn test_resubmit_with_clear_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 1, 2));
    orchestrator.run_inline(0, false).unwrap();

    orchestrator.submit(0, false).await.unwrap();
    assert!(matches!(
        orchestrator.wait(0).await,
        Err(OrchestratorError::Pipeline(PipelineError::DestinationExists(_)))
    ));

    orchestrator.submit(0, true).await.unwrap();
    assert_eq!(orchestrator.wait(0).await.unwrap().rows, 6);
}

#[test]
fn test_abort_requires_submission() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = FleetOrchestrator::in_process(fleet(dir.path(), 1, 1));
    assert!(matches!(
        orchestrator.abort(0),
        Err(OrchestratorError::NotSubmitted(0))
    ));
    assert!(matches!(
        orchestrator.abort(3),
        Err(OrchestratorError::UnknownUnit(3))
    ));
}
