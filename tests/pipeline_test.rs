//! Pipeline Integration Tests
//!
//! End-to-end coverage of the batch pipeline over synthetic trial exports:
//! - CSV ingestion -> segmentation -> jump table -> normalization -> outputs
//! - Per-unit failure isolation (one malformed participant never aborts
//!   the batch)
//! - Determinism of the persisted artifacts

use jumplab::batch::{BatchOptions, BatchRunner, UnitStatus};
use jumplab::normalize::{NormalizeConfig, TimeNormalizer};
use jumplab::segmentation::{detect_jumps, SegmenterConfig};
use jumplab::series::{load_trial_csv, Condition};
use jumplab::table::JumpTable;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PREAMBLE: &str = "device;Forceplate X1\nfirmware;2.1\nexported;2024-03-11\n";

/// Write a synthetic trial export: 100 Hz bilateral force at 400 N per
/// plate, dropping to 10 N inside each flight window, plus one kinematic
/// channel.
fn write_trial(path: &Path, flight_windows: &[(f64, f64)], duration_s: f64) {
    let dt = 0.01;
    let samples = (duration_s / dt).round() as usize;
    let mut csv = String::from(PREAMBLE);
    csv.push_str("time;LT Force (N);RT Force (N);Knee Flexion (deg)\n");
    for i in 0..samples {
        let t = i as f64 * dt;
        let airborne = flight_windows.iter().any(|(a, b)| t >= *a && t < *b);
        let force = if airborne { 10.0 } else { 400.0 };
        let knee = 20.0 + 10.0 * t.sin();
        csv.push_str(&format!("{t:.2};{force};{force};{knee:.4}\n"));
    }
    std::fs::write(path, csv).unwrap();
}

fn write_participant(data_dir: &Path, participant: &str, trials: &[(Condition, Vec<(f64, f64)>)]) {
    let dir = data_dir.join(participant);
    std::fs::create_dir_all(&dir).unwrap();
    for (condition, windows) in trials {
        let path = dir.join(format!("{participant}_{condition}.csv"));
        write_trial(&path, windows, 8.0);
    }
}

fn batch_options(data_dir: PathBuf, output_dir: PathBuf, participants: &[&str]) -> BatchOptions {
    BatchOptions {
        data_dir,
        output_dir,
        participants: participants.iter().map(|p| p.to_string()).collect(),
        parallel: false,
        render_charts: false,
        chart_channels: vec![],
    }
}

#[test]
fn test_full_batch_over_two_participants() {
    let root = TempDir::new().unwrap();
    let data_dir = root.path().join("data");
    let output_dir = root.path().join("out");

    write_participant(
        &data_dir,
        "ID_1",
        &[
            (Condition::Real1, vec![(2.0, 2.3), (4.0, 4.35)]),
            (Condition::Vr1, vec![(3.0, 3.3)]),
        ],
    );
    write_participant(&data_dir, "ID_2", &[(Condition::Real1, vec![(2.5, 2.8)])]);

    let runner = BatchRunner::new(
        SegmenterConfig::default(),
        NormalizeConfig::default(),
        batch_options(data_dir, output_dir.clone(), &["ID_1", "ID_2"]),
    );
    let summary = runner.run().unwrap();

    assert_eq!(summary.processed_units, 3);
    assert_eq!(summary.failed_units, 0);
    assert_eq!(summary.total_jumps, 4);
    assert_eq!(summary.normalized_jumps, 4);
    assert_eq!(summary.skipped_jumps, 0);

    // Jump tables exist and reload with chronological, dense indices
    let table = JumpTable::load(&output_dir.join("tables"), "ID_1").unwrap();
    let real1 = table.jumps_for(Condition::Real1);
    assert_eq!(real1.len(), 2);
    assert_eq!(real1[0].index, 1);
    assert_eq!(real1[1].index, 2);
    assert!(real1[0].takeoff_time < real1[1].takeoff_time);
    for jump in table.records() {
        assert!(jump.start_ana <= jump.takeoff_time);
        assert!(jump.takeoff_time < jump.landing_time);
        assert!(jump.landing_time <= jump.end_ana);
        assert!(jump.flight_duration > 0.0);
    }

    // Normalized long-format CSV: header + jumps * points rows
    let normalized = output_dir.join("normalized").join("ID_1_REAL_1_normalized.csv");
    let content = std::fs::read_to_string(&normalized).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1 + 2 * 100);
    assert!(lines[0].starts_with("key,jump_nr,time_normalized"));
    assert!(lines[1].starts_with("REAL_1_jump_1,1,0"));

    // Machine-readable run summary on disk
    let summary_json = std::fs::read_to_string(output_dir.join("run_summary.json")).unwrap();
    assert!(summary_json.contains("\"processed_units\": 3"));
}

#[test]
fn test_malformed_participant_does_not_abort_batch() {
    let root = TempDir::new().unwrap();
    let data_dir = root.path().join("data");
    let output_dir = root.path().join("out");

    write_participant(&data_dir, "ID_1", &[(Condition::Real1, vec![(2.0, 2.3)])]);

    // Non-monotonic time channel: fatal for this participant only
    let bad_dir = data_dir.join("ID_2");
    std::fs::create_dir_all(&bad_dir).unwrap();
    std::fs::write(
        bad_dir.join("ID_2_REAL_1.csv"),
        format!(
            "{PREAMBLE}time;LT Force (N);RT Force (N)\n0.00;400;400\n0.02;400;400\n0.01;400;400\n"
        ),
    )
    .unwrap();

    let runner = BatchRunner::new(
        SegmenterConfig::default(),
        NormalizeConfig::default(),
        batch_options(data_dir, output_dir, &["ID_1", "ID_2", "ID_3"]),
    );
    let summary = runner.run().unwrap();

    // ID_1 processed; ID_2 (malformed) and ID_3 (missing directory) failed
    assert_eq!(summary.processed_units, 1);
    assert_eq!(summary.failed_units, 2);

    let failed: Vec<_> = summary
        .units
        .iter()
        .filter(|u| u.status == UnitStatus::Failed)
        .collect();
    assert!(failed.iter().all(|u| u.error.is_some()));
    assert!(failed.iter().any(|u| u.participant == "ID_2"));
    assert!(failed.iter().any(|u| u.participant == "ID_3"));
}

#[test]
fn test_zero_jump_trial_is_processed_not_failed() {
    let root = TempDir::new().unwrap();
    let data_dir = root.path().join("data");
    let output_dir = root.path().join("out");

    // Constant ground contact: zero transitions, valid empty result
    write_participant(&data_dir, "ID_1", &[(Condition::Vr2, vec![])]);

    let runner = BatchRunner::new(
        SegmenterConfig::default(),
        NormalizeConfig::default(),
        batch_options(data_dir, output_dir.clone(), &["ID_1"]),
    );
    let summary = runner.run().unwrap();

    assert_eq!(summary.processed_units, 1);
    assert_eq!(summary.failed_units, 0);
    assert_eq!(summary.total_jumps, 0);

    // An empty table is still persisted for the participant
    let table = JumpTable::load(&output_dir.join("tables"), "ID_1").unwrap();
    assert!(table.is_empty());
}

#[test]
fn test_batch_outputs_are_deterministic() {
    let root = TempDir::new().unwrap();
    let data_dir = root.path().join("data");
    write_participant(
        &data_dir,
        "ID_1",
        &[(Condition::Real1, vec![(2.0, 2.3), (5.0, 5.4)])],
    );

    let run = |output: PathBuf| {
        let runner = BatchRunner::new(
            SegmenterConfig::default(),
            NormalizeConfig::default(),
            batch_options(data_dir.clone(), output, &["ID_1"]),
        );
        runner.run().unwrap()
    };

    let out_a = root.path().join("out_a");
    let out_b = root.path().join("out_b");
    run(out_a.clone());
    run(out_b.clone());

    for relative in [
        "tables/ID_1_jumps.csv",
        "normalized/ID_1_REAL_1_normalized.csv",
    ] {
        let a = std::fs::read_to_string(out_a.join(relative)).unwrap();
        let b = std::fs::read_to_string(out_b.join(relative)).unwrap();
        assert_eq!(a, b, "artifact {relative} differs between identical runs");
    }
}

#[test]
fn test_segment_then_normalize_through_persisted_table() {
    // The two passes communicate only through the persisted artifact
    let root = TempDir::new().unwrap();
    let trial = root.path().join("ID_7_REAL_2.csv");
    write_trial(&trial, &[(1.5, 1.8)], 6.0);

    let series = load_trial_csv(&trial).unwrap();
    let jumps = detect_jumps(&series, Condition::Real2, &SegmenterConfig::default()).unwrap();
    assert_eq!(jumps.len(), 1);

    let tables_dir = root.path().join("tables");
    let mut table = JumpTable::new("ID_7");
    table.extend(jumps);
    table.save(&tables_dir).unwrap();

    let reloaded = JumpTable::load(&tables_dir, "ID_7").unwrap();
    let record = reloaded.lookup(Condition::Real2, 1).unwrap();

    let normalizer = TimeNormalizer::new(NormalizeConfig::default());
    let normalized = normalizer.normalize(&series, record).unwrap().unwrap();

    assert_eq!(normalized.key, "REAL_2_jump_1");
    assert_eq!(normalized.points(), 100);
    for (_, values) in &normalized.numeric {
        assert_eq!(values.len(), 100);
    }
    assert_eq!(normalized.time_normalized[0], 0.0);
    assert_eq!(normalized.time_normalized[99], 1.0);

    // Normalizing the same record twice yields identical output
    let again = normalizer.normalize(&series, record).unwrap().unwrap();
    assert_eq!(normalized, again);
}

#[test]
fn test_parallel_and_serial_runs_agree() {
    let root = TempDir::new().unwrap();
    let data_dir = root.path().join("data");
    for participant in ["ID_1", "ID_2", "ID_3"] {
        write_participant(
            &data_dir,
            participant,
            &[
                (Condition::Real1, vec![(2.0, 2.3)]),
                (Condition::Vr1, vec![(3.0, 3.4)]),
            ],
        );
    }

    let run = |output: PathBuf, parallel: bool| {
        let mut options = batch_options(
            data_dir.clone(),
            output,
            &["ID_1", "ID_2", "ID_3"],
        );
        options.parallel = parallel;
        BatchRunner::new(
            SegmenterConfig::default(),
            NormalizeConfig::default(),
            options,
        )
        .run()
        .unwrap()
    };

    let serial_out = root.path().join("serial");
    let parallel_out = root.path().join("parallel");
    let serial = run(serial_out.clone(), false);
    let parallel = run(parallel_out.clone(), true);

    assert_eq!(serial.processed_units, parallel.processed_units);
    assert_eq!(serial.total_jumps, parallel.total_jumps);

    // Unit reports merge in participant order either way
    let serial_order: Vec<_> = serial
        .units
        .iter()
        .map(|u| (u.participant.clone(), u.condition))
        .collect();
    let parallel_order: Vec<_> = parallel
        .units
        .iter()
        .map(|u| (u.participant.clone(), u.condition))
        .collect();
    assert_eq!(serial_order, parallel_order);

    for participant in ["ID_1", "ID_2", "ID_3"] {
        let a = std::fs::read_to_string(
            serial_out.join(format!("tables/{participant}_jumps.csv")),
        )
        .unwrap();
        let b = std::fs::read_to_string(
            parallel_out.join(format!("tables/{participant}_jumps.csv")),
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
