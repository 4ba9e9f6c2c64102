use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const PLAYER_COLUMN: &str = "Player Name";
pub const ROUND_COLUMN: &str = "Round";
pub const DATE_COLUMN: &str = "Date";
pub const SPLIT_COLUMN: &str = "Split Name";
pub const MINUTES_COLUMN: &str = "Mins played";

pub const DEFAULT_SHEET: &str = "individual stats";

const IDENTITY_COLUMNS: [&str; 4] = [PLAYER_COLUMN, ROUND_COLUMN, DATE_COLUMN, SPLIT_COLUMN];
const MAX_SKIP_NOTES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Split {
    FirstHalf,
    SecondHalf,
    Game,
}

impl Split {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1st.half" => Some(Split::FirstHalf),
            "2nd.half" => Some(Split::SecondHalf),
            "game" => Some(Split::Game),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Split::FirstHalf => "1st.half",
            Split::SecondHalf => "2nd.half",
            Split::Game => "game",
        }
    }
}

/// One spreadsheet row: a player's numbers for one split of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub player: String,
    pub round: String,
    pub date: NaiveDate,
    pub split: Split,
    pub metrics: BTreeMap<String, f64>,
}

impl Observation {
    pub fn metric(&self, column: &str) -> Option<f64> {
        self.metrics.get(column).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    fn label(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(text) => Some(text.clone()),
            Cell::Number(value) if value.fract() == 0.0 => Some(format!("{}", *value as i64)),
            Cell::Number(value) => Some(value.to_string()),
            Cell::Date(date) => Some(date.to_string()),
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(date) => Some(*date),
            Cell::Number(serial) => date_from_serial(*serial),
            Cell::Text(text) => parse_date_text(text),
            Cell::Empty => None,
        }
    }
}

/// Header row plus data rows, before any schema checks.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to open workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet `{sheet}` not found in {path}")]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("unable to read csv {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("unsupported data file {path} (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedFormat { path: PathBuf },
    #[error("data file has no header row")]
    EmptySheet,
    #[error("missing required column `{0}`")]
    MissingColumn(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub players: usize,
    pub metric_columns: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    fn skip(&mut self, line: usize, reason: impl Into<String>) {
        self.rows_skipped += 1;
        if self.skipped.len() < MAX_SKIP_NOTES {
            self.skipped.push(SkippedRow {
                line,
                reason: reason.into(),
            });
        }
    }
}

/// The season's observations, loaded once and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    columns: BTreeSet<String>,
    rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(columns: impl IntoIterator<Item = String>, rows: Vec<Observation>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    pub fn from_sheet(sheet: RawSheet) -> Result<(Self, LoadReport), LoadError> {
        let headers: Vec<String> = sheet.headers.iter().map(|h| h.trim().to_string()).collect();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };
        let player_idx = position(PLAYER_COLUMN)?;
        let round_idx = position(ROUND_COLUMN)?;
        let date_idx = position(DATE_COLUMN)?;
        let split_idx = position(SPLIT_COLUMN)?;

        let metric_columns: Vec<(usize, &String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty() && !IDENTITY_COLUMNS.contains(&name.as_str()))
            .collect();

        let mut report = LoadReport {
            metric_columns: metric_columns.len(),
            ..LoadReport::default()
        };
        let mut rows = Vec::with_capacity(sheet.rows.len());
        let empty = Cell::Empty;

        for (idx, row) in sheet.rows.iter().enumerate() {
            // Line 1 is the header.
            let line = idx + 2;
            if row.iter().all(|cell| matches!(cell, Cell::Empty)) {
                continue;
            }
            let cell = |col: usize| row.get(col).unwrap_or(&empty);

            let Some(player) = cell(player_idx).label() else {
                report.skip(line, "blank player name");
                continue;
            };
            let Some(round) = cell(round_idx).label() else {
                report.skip(line, "blank round");
                continue;
            };
            let Some(date) = cell(date_idx).date() else {
                report.skip(line, format!("unreadable date {:?}", cell(date_idx)));
                continue;
            };
            let split_label = cell(split_idx).label().unwrap_or_default();
            let Some(split) = Split::from_label(&split_label) else {
                report.skip(line, format!("unknown split `{split_label}`"));
                continue;
            };

            let metrics = metric_columns
                .iter()
                .filter_map(|(col, name)| cell(*col).number().map(|v| ((*name).clone(), v)))
                .collect();

            rows.push(Observation {
                player,
                round,
                date,
                split,
                metrics,
            });
        }

        let table = Self::new(
            metric_columns.into_iter().map(|(_, name)| name.clone()),
            rows,
        );
        report.rows_loaded = table.rows.len();
        report.players = table.players().len();
        Ok((table, report))
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Sorted, de-duplicated player names.
    pub fn players(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.player.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn for_player(&self, player: &str) -> PlayerRows<'_> {
        PlayerRows {
            player: player.to_string(),
            table: self,
            rows: self.rows.iter().filter(|row| row.player == player).collect(),
        }
    }
}

/// One player's rows, in file order.
#[derive(Debug, Clone)]
pub struct PlayerRows<'a> {
    player: String,
    table: &'a ObservationTable,
    rows: Vec<&'a Observation>,
}

impl<'a> PlayerRows<'a> {
    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn rows(&self) -> &[&'a Observation] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }
}

pub fn load_table(path: &Path, sheet: &str) -> Result<(ObservationTable, LoadReport), LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let raw = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, sheet)?,
        "csv" => read_csv_file(path)?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    debug!(
        path = %path.display(),
        columns = raw.headers.len(),
        rows = raw.rows.len(),
        "read raw sheet"
    );

    let (table, report) = ObservationTable::from_sheet(raw)?;
    info!(
        path = %path.display(),
        loaded = report.rows_loaded,
        skipped = report.rows_skipped,
        players = report.players,
        "loaded observation table"
    );
    Ok((table, report))
}

pub fn read_workbook(path: &Path, sheet: &str) -> Result<RawSheet, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(LoadError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(LoadError::EmptySheet);
    };
    let headers = header
        .iter()
        .map(|data| cell_from_data(data).label().unwrap_or_default())
        .collect();
    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Ok(RawSheet { headers, rows })
}

pub fn read_csv_file(path: &Path) -> Result<RawSheet, LoadError> {
    let file = std::fs::File::open(path).map_err(|err| LoadError::Csv {
        path: path.to_path_buf(),
        source: csv::Error::from(err),
    })?;
    parse_csv(file).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_csv(reader: impl Read) -> Result<RawSheet, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(RawSheet { headers, rows })
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(text) => Cell::from_text(text),
        other => match other.as_date() {
            Some(date) => Cell::Date(date),
            None => other
                .as_string()
                .map(|text| Cell::from_text(&text))
                .unwrap_or(Cell::Empty),
        },
    }
}

/// Spreadsheet serial day number (1900 date system) to a calendar date.
fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

    let cleaned = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return Some(dt.date());
        }
    }
    None
}
