use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use gps_round_report::chart::ChartModel;
use gps_round_report::dataset::{Cell, ObservationTable, RawSheet};
use gps_round_report::family::{
    ACCEL_3_4_COLUMN, ACCEL_4_PLUS_COLUMN, DECEL_3_4_COLUMN, DECEL_4_PLUS_COLUMN,
    DISTANCE_PER_MIN_COLUMN, ENERGY_COLUMN, Family, IMPACTS_COLUMN, PLAYER_LOAD_COLUMN,
    POWER_PLAYS_COLUMN, POWER_SCORE_COLUMN, SPRINT_DISTANCE_COLUMN, TOP_SPEED_COLUMN,
    WORK_RATIO_COLUMN,
};
use gps_round_report::rounds::{self, SortPolicy};

const METRICS: [&str; 13] = [
    POWER_PLAYS_COLUMN,
    SPRINT_DISTANCE_COLUMN,
    PLAYER_LOAD_COLUMN,
    ENERGY_COLUMN,
    IMPACTS_COLUMN,
    POWER_SCORE_COLUMN,
    WORK_RATIO_COLUMN,
    TOP_SPEED_COLUMN,
    DISTANCE_PER_MIN_COLUMN,
    ACCEL_3_4_COLUMN,
    ACCEL_4_PLUS_COLUMN,
    DECEL_3_4_COLUMN,
    DECEL_4_PLUS_COLUMN,
];

/// 22 players over a 30-round season, three split rows per round.
fn season_table() -> ObservationTable {
    let mut headers = vec![
        "Player Name".to_string(),
        "Round".to_string(),
        "Date".to_string(),
        "Split Name".to_string(),
        "Mins played".to_string(),
    ];
    headers.extend(METRICS.iter().map(|m| m.to_string()));

    let mut rows = Vec::new();
    for player in 0..22 {
        for round in 0..30u32 {
            for (split, minutes) in [("1st.half", 45.0), ("2nd.half", 44.0), ("game", 89.0)] {
                let mut row = vec![
                    Cell::Text(format!("Player {player}")),
                    Cell::Text(format!("R{}", round + 1)),
                    Cell::Number(45658.0 + f64::from(round * 7)),
                    Cell::Text(split.to_string()),
                    Cell::Number(minutes),
                ];
                row.extend(
                    (0..METRICS.len())
                        .map(|i| Cell::Number(f64::from((player * 31 + round as usize * 7 + i) as u32 % 97))),
                );
                rows.push(row);
            }
        }
    }

    ObservationTable::from_sheet(RawSheet { headers, rows })
        .expect("synthetic sheet is complete")
        .0
}

fn bench_round_build(c: &mut Criterion) {
    let table = season_table();
    let rows = table.for_player("Player 7");
    c.bench_function("round_build_all_families", |b| {
        b.iter(|| {
            for family in Family::ALL {
                let records = rounds::build(black_box(&rows), family, SortPolicy::ByValue).unwrap();
                black_box(records.len());
            }
        })
    });
}

fn bench_chart_models(c: &mut Criterion) {
    let table = season_table();
    let rows = table.for_player("Player 7");
    let records = rounds::build(&rows, Family::SprintDistance, SortPolicy::Chronological).unwrap();
    c.bench_function("sprint_chart_model", |b| {
        b.iter(|| {
            let model = ChartModel::build(Family::SprintDistance, "Player 7", black_box(&records));
            black_box(model.len());
        })
    });
}

fn bench_player_lookup(c: &mut Criterion) {
    let table = season_table();
    c.bench_function("player_rows_lookup", |b| {
        b.iter(|| {
            let rows = table.for_player(black_box("Player 21"));
            black_box(rows.rows().len());
        })
    });
}

criterion_group!(
    perf,
    bench_round_build,
    bench_chart_models,
    bench_player_lookup
);
criterion_main!(perf);
