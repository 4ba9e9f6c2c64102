//! Per-round records for one player and one metric family.
//!
//! `build` runs the three steps in order: `merge` joins the half and game
//! rows into one record per (round, date), `derive` fills in totals, rates
//! and the primary metric, and `order` applies the requested sort policy.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::dataset::{MINUTES_COLUMN, Observation, PlayerRows, Split};
use crate::family::{Family, FamilySpec, Primary, RateSource, RateSpec};

/// Number of rounds shown by the recent-form view.
pub const FORM_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortPolicy {
    #[default]
    Chronological,
    ByValue,
    RecentForm,
}

impl SortPolicy {
    pub const ALL: [SortPolicy; 3] = [
        SortPolicy::Chronological,
        SortPolicy::ByValue,
        SortPolicy::RecentForm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortPolicy::Chronological => "Round Order",
            SortPolicy::ByValue => "Lowest to Highest",
            SortPolicy::RecentForm => "Form (Last 5 Rounds)",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            SortPolicy::Chronological => "date",
            SortPolicy::ByValue => "value",
            SortPolicy::RecentForm => "form",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "date" | "round" | "chronological" => Some(SortPolicy::Chronological),
            "value" | "by-value" => Some(SortPolicy::ByValue),
            "form" | "recent-form" => Some(SortPolicy::RecentForm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("{family}: missing column `{column}`")]
    MissingField { family: Family, column: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HalfSplit {
    pub value: f64,
    pub minutes: Option<f64>,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameValue {
    pub name: &'static str,
    /// `None` when the round has no game row or every source cell is blank.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub player: String,
    pub round: String,
    pub date: NaiveDate,
    pub first_half: Option<HalfSplit>,
    pub second_half: Option<HalfSplit>,
    /// Minutes from the game row.
    pub minutes: Option<f64>,
    pub game: Vec<GameValue>,
    pub half_total: f64,
    pub rate: f64,
    pub primary: f64,
}

impl RoundRecord {
    pub fn key(&self) -> (&str, &str, NaiveDate) {
        (&self.player, &self.round, self.date)
    }

    pub fn first_half_value(&self) -> f64 {
        self.first_half.map(|half| half.value).unwrap_or(0.0)
    }

    pub fn second_half_value(&self) -> f64 {
        self.second_half.map(|half| half.value).unwrap_or(0.0)
    }

    pub fn game_value(&self, name: &str) -> f64 {
        self.game
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.value)
            .unwrap_or(0.0)
    }

    pub fn minutes_or_zero(&self) -> f64 {
        self.minutes.unwrap_or(0.0)
    }
}

pub fn build(
    rows: &PlayerRows<'_>,
    family: Family,
    policy: SortPolicy,
) -> Result<Vec<RoundRecord>, AggregateError> {
    let spec = family.spec();
    let mut records = merge(rows, spec)?;
    derive(&mut records, spec);
    Ok(order(records, policy))
}

pub fn check_columns(rows: &PlayerRows<'_>, spec: &FamilySpec) -> Result<(), AggregateError> {
    match spec
        .required_columns()
        .into_iter()
        .find(|column| !rows.has_column(column))
    {
        Some(column) => Err(AggregateError::MissingField {
            family: spec.family,
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

#[derive(Default)]
struct Slot<'a> {
    first: Option<&'a Observation>,
    second: Option<&'a Observation>,
    game: Option<&'a Observation>,
}

/// One record per (round, date) seen in the half or game rows, in order of
/// first appearance. Missing halves stay `None`; a missing game row leaves
/// minutes and game fields empty.
pub fn merge(rows: &PlayerRows<'_>, spec: &FamilySpec) -> Result<Vec<RoundRecord>, AggregateError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    check_columns(rows, spec)?;

    let mut order: Vec<(&str, NaiveDate)> = Vec::new();
    let mut slots: HashMap<(&str, NaiveDate), Slot<'_>> = HashMap::new();

    for obs in rows.rows().iter().copied() {
        if spec.halves.is_none() && obs.split != Split::Game {
            continue;
        }
        let key = (obs.round.as_str(), obs.date);
        let slot = match slots.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                order.push(key);
                entry.insert(Slot::default())
            }
        };
        let target = match obs.split {
            Split::FirstHalf => &mut slot.first,
            Split::SecondHalf => &mut slot.second,
            Split::Game => &mut slot.game,
        };
        if target.is_some() {
            warn!(
                player = rows.player(),
                round = %obs.round,
                date = %obs.date,
                split = obs.split.label(),
                "duplicate split row, keeping the first"
            );
            continue;
        }
        *target = Some(obs);
    }

    let records = order
        .into_iter()
        .filter_map(|key| slots.remove(&key).map(|slot| (key, slot)))
        .map(|((round, date), slot)| record_from_slot(rows.player(), round, date, &slot, spec))
        .collect();
    Ok(records)
}

fn record_from_slot(
    player: &str,
    round: &str,
    date: NaiveDate,
    slot: &Slot<'_>,
    spec: &FamilySpec,
) -> RoundRecord {
    let half = |obs: Option<&Observation>| {
        let obs = obs?;
        let metric = spec.halves?;
        Some(HalfSplit {
            value: obs.metric(metric.column).unwrap_or(0.0),
            minutes: obs.metric(MINUTES_COLUMN),
            rate: 0.0,
        })
    };

    let game = spec
        .game_fields
        .iter()
        .map(|field| GameValue {
            name: field.name,
            value: slot.game.and_then(|obs| sum_present(obs, field.columns)),
        })
        .collect();

    RoundRecord {
        player: player.to_string(),
        round: round.to_string(),
        date,
        first_half: half(slot.first),
        second_half: half(slot.second),
        minutes: slot.game.and_then(|obs| obs.metric(MINUTES_COLUMN)),
        game,
        half_total: 0.0,
        rate: 0.0,
        primary: 0.0,
    }
}

fn sum_present(obs: &Observation, columns: &[&str]) -> Option<f64> {
    columns
        .iter()
        .filter_map(|column| obs.metric(column))
        .fold(None, |acc, value| Some(acc.unwrap_or(0.0) + value))
}

/// Fills totals, rates and the primary metric from the merged values.
/// Running it twice gives the same records.
pub fn derive(records: &mut [RoundRecord], spec: &FamilySpec) {
    for record in records.iter_mut() {
        record.half_total = match spec.halves {
            Some(halves) if halves.additive => {
                normalize(record.first_half_value() + record.second_half_value())
            }
            _ => 0.0,
        };

        record.rate = 0.0;
        if let Some(rate) = &spec.rate {
            match rate.source {
                RateSource::HalfTotal => {
                    for half in [&mut record.first_half, &mut record.second_half]
                        .into_iter()
                        .flatten()
                    {
                        half.rate = per_minute(half.value, half.minutes, rate);
                    }
                    record.rate = per_minute(record.half_total, record.minutes, rate);
                }
                RateSource::GameField(name) => {
                    record.rate = per_minute(record.game_value(name), record.minutes, rate);
                }
            }
        }

        record.primary = normalize(match spec.primary {
            Primary::HalfTotal => record.half_total,
            Primary::GameField(name) => record.game_value(name),
        });
    }
}

/// `value / minutes` scaled and rounded per the rate; zero when minutes are
/// missing or not positive.
pub fn per_minute(value: f64, minutes: Option<f64>, rate: &RateSpec) -> f64 {
    let Some(minutes) = minutes.filter(|m| m.is_finite() && *m > 0.0) else {
        return 0.0;
    };
    normalize(rate.rounding.apply(value / minutes * rate.per_minutes))
}

pub fn normalize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

pub fn order(mut records: Vec<RoundRecord>, policy: SortPolicy) -> Vec<RoundRecord> {
    // All sorts are stable, so equal keys keep their merge order.
    match policy {
        SortPolicy::Chronological => records.sort_by(|a, b| a.date.cmp(&b.date)),
        SortPolicy::ByValue => records.sort_by(|a, b| {
            a.primary
                .total_cmp(&b.primary)
                .then_with(|| a.date.cmp(&b.date))
        }),
        SortPolicy::RecentForm => {
            records.sort_by(|a, b| b.date.cmp(&a.date));
            records.truncate(FORM_WINDOW);
            records.sort_by(|a, b| a.date.cmp(&b.date));
        }
    }
    records
}
