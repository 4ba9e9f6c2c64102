use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::MINUTES_COLUMN;

pub const SPRINT_DISTANCE_COLUMN: &str = "Sprint Distance (m)";
pub const POWER_PLAYS_COLUMN: &str = "Power Plays";
pub const PLAYER_LOAD_COLUMN: &str = "Player Load";
pub const ENERGY_COLUMN: &str = "Energy (kcal)";
pub const IMPACTS_COLUMN: &str = "Impacts";
pub const POWER_SCORE_COLUMN: &str = "Power Score (w/kg)";
pub const WORK_RATIO_COLUMN: &str = "Work Ratio";
pub const TOP_SPEED_COLUMN: &str = "Top Speed (m/s)";
pub const DISTANCE_PER_MIN_COLUMN: &str = "Distance Per Min (m/min)";
pub const ACCEL_3_4_COLUMN: &str = "Accelerations Zone Count: 3 - 4 m/s/s";
pub const ACCEL_4_PLUS_COLUMN: &str = "Accelerations Zone Count: > 4 m/s/s";
pub const DECEL_3_4_COLUMN: &str = "Deceleration Zone Count: 3 - 4 m/s/s";
pub const DECEL_4_PLUS_COLUMN: &str = "Deceleration Zone Count: > 4 m/s/s";

pub const ACCELERATIONS_FIELD: &str = "Accelerations >3m/s/s";
pub const DECELERATIONS_FIELD: &str = "Decelerations >3m/s/s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    SprintDistance,
    PowerPlays,
    PlayerLoad,
    TopSpeed,
    DistancePerMin,
    AccelDecel,
}

impl Family {
    /// Dashboard order.
    pub const ALL: [Family; 6] = [
        Family::SprintDistance,
        Family::PowerPlays,
        Family::PlayerLoad,
        Family::TopSpeed,
        Family::DistancePerMin,
        Family::AccelDecel,
    ];

    pub fn index(self) -> usize {
        match self {
            Family::SprintDistance => 0,
            Family::PowerPlays => 1,
            Family::PlayerLoad => 2,
            Family::TopSpeed => 3,
            Family::DistancePerMin => 4,
            Family::AccelDecel => 5,
        }
    }

    pub fn spec(self) -> &'static FamilySpec {
        match self {
            Family::SprintDistance => &SPRINT_DISTANCE,
            Family::PowerPlays => &POWER_PLAYS,
            Family::PlayerLoad => &PLAYER_LOAD,
            Family::TopSpeed => &TOP_SPEED,
            Family::DistancePerMin => &DISTANCE_PER_MIN,
            Family::AccelDecel => &ACCEL_DECEL,
        }
    }

    pub fn label(self) -> &'static str {
        self.spec().title
    }

    pub fn slug(self) -> &'static str {
        match self {
            Family::SprintDistance => "sprint",
            Family::PowerPlays => "power-plays",
            Family::PlayerLoad => "player-load",
            Family::TopSpeed => "top-speed",
            Family::DistancePerMin => "distance-per-min",
            Family::AccelDecel => "accel-decel",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|family| family.slug() == wanted)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    Line,
    Bars,
}

/// How a value is shown: whole counts/metres, or one decimal for speeds and ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Precision {
    Integer,
    OneDecimal,
}

impl Precision {
    pub fn format(self, value: f64) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        match self {
            Precision::Integer => format!("{}", value.trunc() as i64),
            Precision::OneDecimal => format!("{value:.1}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rounding {
    Truncate,
    /// Nearest integer, ties to even.
    Nearest,
}

impl Rounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::Truncate => value.trunc(),
            Rounding::Nearest => value.round_ties_even(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateSource {
    /// Each half over its own minutes, and the half total over game minutes.
    HalfTotal,
    /// A game field over game minutes.
    GameField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateSpec {
    pub label: &'static str,
    pub per_minutes: f64,
    pub rounding: Rounding,
    pub source: RateSource,
}

/// A whole-game value: the sum of one or more game-split columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameField {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub precision: Precision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HalfMetric {
    pub column: &'static str,
    /// Whether the two halves add up to a meaningful whole-game total.
    pub additive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Primary {
    HalfTotal,
    GameField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FamilySpec {
    pub family: Family,
    pub title: &'static str,
    pub axis_label: &'static str,
    pub unit: &'static str,
    pub chart: ChartKind,
    pub halves: Option<HalfMetric>,
    pub game_fields: &'static [GameField],
    pub rate: Option<RateSpec>,
    pub primary: Primary,
    pub precision: Precision,
}

impl FamilySpec {
    /// Every source column the family reads, without duplicates.
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        let mut push = |column: &'static str| {
            if !columns.contains(&column) {
                columns.push(column);
            }
        };
        if let Some(halves) = self.halves {
            push(halves.column);
        }
        for field in self.game_fields {
            for column in field.columns {
                push(*column);
            }
        }
        push(MINUTES_COLUMN);
        columns
    }

    pub fn game_field(&self, name: &str) -> Option<&'static GameField> {
        self.game_fields.iter().find(|field| field.name == name)
    }
}

pub static SPRINT_DISTANCE: FamilySpec = FamilySpec {
    family: Family::SprintDistance,
    title: "Sprint Distance",
    axis_label: "Sprint Distance (m)",
    unit: "m",
    chart: ChartKind::Bars,
    halves: Some(HalfMetric {
        column: SPRINT_DISTANCE_COLUMN,
        additive: true,
    }),
    game_fields: &[],
    rate: Some(RateSpec {
        label: "Avg per min",
        per_minutes: 1.0,
        rounding: Rounding::Truncate,
        source: RateSource::HalfTotal,
    }),
    primary: Primary::HalfTotal,
    precision: Precision::Integer,
};

pub static POWER_PLAYS: FamilySpec = FamilySpec {
    family: Family::PowerPlays,
    title: "Power Plays",
    axis_label: "Power Plays",
    unit: "PP",
    chart: ChartKind::Line,
    halves: None,
    game_fields: &[GameField {
        name: POWER_PLAYS_COLUMN,
        columns: &[POWER_PLAYS_COLUMN],
        precision: Precision::Integer,
    }],
    rate: Some(RateSpec {
        label: "PP per 10min",
        per_minutes: 10.0,
        rounding: Rounding::Nearest,
        source: RateSource::GameField(POWER_PLAYS_COLUMN),
    }),
    primary: Primary::GameField(POWER_PLAYS_COLUMN),
    precision: Precision::Integer,
};

pub static PLAYER_LOAD: FamilySpec = FamilySpec {
    family: Family::PlayerLoad,
    title: "Player Load",
    axis_label: "Player Load",
    unit: "",
    chart: ChartKind::Line,
    halves: None,
    game_fields: &[
        GameField {
            name: PLAYER_LOAD_COLUMN,
            columns: &[PLAYER_LOAD_COLUMN],
            precision: Precision::Integer,
        },
        GameField {
            name: ENERGY_COLUMN,
            columns: &[ENERGY_COLUMN],
            precision: Precision::Integer,
        },
        GameField {
            name: IMPACTS_COLUMN,
            columns: &[IMPACTS_COLUMN],
            precision: Precision::Integer,
        },
        GameField {
            name: POWER_SCORE_COLUMN,
            columns: &[POWER_SCORE_COLUMN],
            precision: Precision::OneDecimal,
        },
        GameField {
            name: WORK_RATIO_COLUMN,
            columns: &[WORK_RATIO_COLUMN],
            precision: Precision::OneDecimal,
        },
    ],
    rate: None,
    primary: Primary::GameField(PLAYER_LOAD_COLUMN),
    precision: Precision::Integer,
};

pub static TOP_SPEED: FamilySpec = FamilySpec {
    family: Family::TopSpeed,
    title: "Top Speed",
    axis_label: "Top Speed (m/s)",
    unit: "m/s",
    chart: ChartKind::Bars,
    halves: Some(HalfMetric {
        column: TOP_SPEED_COLUMN,
        additive: false,
    }),
    game_fields: &[GameField {
        name: TOP_SPEED_COLUMN,
        columns: &[TOP_SPEED_COLUMN],
        precision: Precision::OneDecimal,
    }],
    rate: None,
    primary: Primary::GameField(TOP_SPEED_COLUMN),
    precision: Precision::OneDecimal,
};

pub static DISTANCE_PER_MIN: FamilySpec = FamilySpec {
    family: Family::DistancePerMin,
    title: "Distance Per Min",
    axis_label: "Distance Per Min (m/min)",
    unit: "m/min",
    chart: ChartKind::Bars,
    halves: Some(HalfMetric {
        column: DISTANCE_PER_MIN_COLUMN,
        additive: false,
    }),
    game_fields: &[GameField {
        name: DISTANCE_PER_MIN_COLUMN,
        columns: &[DISTANCE_PER_MIN_COLUMN],
        precision: Precision::Integer,
    }],
    rate: None,
    primary: Primary::GameField(DISTANCE_PER_MIN_COLUMN),
    precision: Precision::Integer,
};

pub static ACCEL_DECEL: FamilySpec = FamilySpec {
    family: Family::AccelDecel,
    title: "Accelerations/Decelerations >3m/s/s",
    axis_label: "Count",
    unit: "",
    chart: ChartKind::Bars,
    halves: None,
    game_fields: &[
        GameField {
            name: ACCELERATIONS_FIELD,
            columns: &[ACCEL_3_4_COLUMN, ACCEL_4_PLUS_COLUMN],
            precision: Precision::Integer,
        },
        GameField {
            name: DECELERATIONS_FIELD,
            columns: &[DECEL_3_4_COLUMN, DECEL_4_PLUS_COLUMN],
            precision: Precision::Integer,
        },
    ],
    rate: None,
    primary: Primary::GameField(ACCELERATIONS_FIELD),
    precision: Precision::Integer,
};
