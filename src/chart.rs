use serde::Serialize;

use crate::family::{
    ACCELERATIONS_FIELD, ChartKind, DECELERATIONS_FIELD, DISTANCE_PER_MIN_COLUMN, ENERGY_COLUMN,
    Family, IMPACTS_COLUMN, PLAYER_LOAD_COLUMN, POWER_PLAYS_COLUMN, POWER_SCORE_COLUMN, Precision,
    TOP_SPEED_COLUMN, WORK_RATIO_COLUMN,
};
use crate::rounds::RoundRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: &'static str,
    pub values: Vec<f64>,
}

/// Render-neutral chart: one x label per round, one or two series, and the
/// detail lines shown for the round under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartModel {
    pub family: Family,
    pub title: String,
    pub kind: ChartKind,
    pub y_label: &'static str,
    pub precision: Precision,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub details: Vec<Vec<String>>,
}

impl ChartModel {
    pub fn build(family: Family, player: &str, records: &[RoundRecord]) -> Self {
        let spec = family.spec();
        let labels = records.iter().map(|r| r.round.clone()).collect();
        let column = |f: fn(&RoundRecord) -> f64| records.iter().map(f).collect::<Vec<_>>();

        let series = match family {
            Family::SprintDistance | Family::TopSpeed => vec![
                Series {
                    name: "1st Half",
                    values: column(RoundRecord::first_half_value),
                },
                Series {
                    name: "2nd Half",
                    values: column(RoundRecord::second_half_value),
                },
            ],
            Family::PowerPlays => vec![Series {
                name: "Power Plays",
                values: column(|r| r.game_value(POWER_PLAYS_COLUMN)),
            }],
            Family::PlayerLoad => vec![Series {
                name: "Player Load",
                values: column(|r| r.game_value(PLAYER_LOAD_COLUMN)),
            }],
            Family::DistancePerMin => vec![Series {
                name: "Game",
                values: column(|r| r.game_value(DISTANCE_PER_MIN_COLUMN)),
            }],
            Family::AccelDecel => vec![
                Series {
                    name: "Accelerations",
                    values: column(|r| r.game_value(ACCELERATIONS_FIELD)),
                },
                Series {
                    name: "Decelerations",
                    values: column(|r| r.game_value(DECELERATIONS_FIELD)),
                },
            ],
        };

        let details = records.iter().map(|r| detail_lines(family, r)).collect();

        Self {
            family,
            title: format!("{} - {player}", spec.title),
            kind: spec.chart,
            y_label: spec.axis_label,
            precision: spec.precision,
            labels,
            series,
            details,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    pub fn format_value(&self, value: f64) -> String {
        self.precision.format(value)
    }
}

fn int(value: f64) -> String {
    Precision::Integer.format(value)
}

fn dec(value: f64) -> String {
    Precision::OneDecimal.format(value)
}

fn opt_int(value: Option<f64>) -> String {
    int(value.unwrap_or(0.0))
}

/// The lines shown for one round, mirroring what each chart reports on hover.
pub fn detail_lines(family: Family, r: &RoundRecord) -> Vec<String> {
    let mut lines = vec![
        format!("Round: {}", r.round),
        format!("Date: {}", r.date.format("%d-%m-%Y")),
    ];
    match family {
        Family::SprintDistance => {
            let first = r.first_half.unwrap_or_default();
            let second = r.second_half.unwrap_or_default();
            lines.push(format!(
                "1st Half: {} m | {} min | {} m/min",
                int(first.value),
                opt_int(first.minutes),
                int(first.rate)
            ));
            lines.push(format!(
                "2nd Half: {} m | {} min | {} m/min",
                int(second.value),
                opt_int(second.minutes),
                int(second.rate)
            ));
            lines.push(format!("Total Sprint Distance: {} m", int(r.half_total)));
            lines.push(format!("Total Minutes Played: {} min", opt_int(r.minutes)));
            lines.push(format!("Total Avg per min: {} m/min", int(r.rate)));
        }
        Family::PowerPlays => {
            lines.push(format!(
                "Power Plays: {} PP",
                int(r.game_value(POWER_PLAYS_COLUMN))
            ));
            lines.push(format!("PP per 10min: {}", int(r.rate)));
            lines.push(format!("Mins Played: {} min", opt_int(r.minutes)));
        }
        Family::PlayerLoad => {
            lines.push(format!(
                "Player Load: {}",
                int(r.game_value(PLAYER_LOAD_COLUMN))
            ));
            lines.push(format!("Energy: {} kcal", int(r.game_value(ENERGY_COLUMN))));
            lines.push(format!("Impacts: {}", int(r.game_value(IMPACTS_COLUMN))));
            lines.push(format!(
                "Power Score: {} w/kg",
                dec(r.game_value(POWER_SCORE_COLUMN))
            ));
            lines.push(format!("Work Ratio: {}", dec(r.game_value(WORK_RATIO_COLUMN))));
            lines.push(format!("Total Minutes Played: {} min", opt_int(r.minutes)));
        }
        Family::TopSpeed => {
            lines.push(format!("1st Half: {} m/s", dec(r.first_half_value())));
            lines.push(format!("2nd Half: {} m/s", dec(r.second_half_value())));
            lines.push(format!("Game: {} m/s", dec(r.game_value(TOP_SPEED_COLUMN))));
            lines.push(format!("Total Minutes Played: {} min", opt_int(r.minutes)));
        }
        Family::DistancePerMin => {
            lines.push(format!(
                "Total: {} m/min",
                int(r.game_value(DISTANCE_PER_MIN_COLUMN))
            ));
            lines.push(format!("2nd Half: {} m/min", int(r.second_half_value())));
            lines.push(format!("1st Half: {} m/min", int(r.first_half_value())));
            lines.push(format!("Mins Played: {} min", opt_int(r.minutes)));
        }
        Family::AccelDecel => {
            lines.push(format!(
                "Accelerations: {}",
                int(r.game_value(ACCELERATIONS_FIELD))
            ));
            lines.push(format!(
                "Decelerations: {}",
                int(r.game_value(DECELERATIONS_FIELD))
            ));
        }
    }
    lines
}
