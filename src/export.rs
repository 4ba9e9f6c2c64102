use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::dataset::ObservationTable;
use crate::family::{Family, FamilySpec};
use crate::rounds::{self, RoundRecord, SortPolicy};

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub path: PathBuf,
    pub sheets: usize,
    pub rows: usize,
    pub skipped: Vec<String>,
}

enum ExportCell {
    Text(String),
    Number(f64),
    Blank,
}

impl From<&str> for ExportCell {
    fn from(value: &str) -> Self {
        ExportCell::Text(value.to_string())
    }
}

impl From<f64> for ExportCell {
    fn from(value: f64) -> Self {
        ExportCell::Number(value)
    }
}

impl From<Option<f64>> for ExportCell {
    fn from(value: Option<f64>) -> Self {
        value.map(ExportCell::Number).unwrap_or(ExportCell::Blank)
    }
}

/// `<player>-gps.xlsx` with spaces and path separators replaced.
pub fn default_file_name(player: &str) -> String {
    let cleaned: String = player
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}-gps.xlsx", cleaned.trim_matches('_'))
}

/// One sheet per family with the player's ordered round records. A family
/// whose columns are missing gets a sheet holding the error instead.
pub fn export_player_workbook(
    path: &Path,
    table: &ObservationTable,
    player: &str,
    policy: SortPolicy,
) -> Result<ExportReport> {
    let rows = table.for_player(player);
    let mut workbook = Workbook::new();
    let mut report = ExportReport {
        path: path.to_path_buf(),
        ..ExportReport::default()
    };

    for family in Family::ALL {
        let spec = family.spec();
        let sheet_rows = match rounds::build(&rows, family, policy) {
            Ok(records) => {
                report.rows += records.len();
                family_rows(spec, &records)
            }
            Err(err) => {
                report.skipped.push(err.to_string());
                vec![vec![ExportCell::from(err.to_string().as_str())]]
            }
        };

        let sheet = workbook.add_worksheet();
        sheet
            .set_name(sheet_name(family))
            .with_context(|| format!("name sheet for {family}"))?;
        write_rows(sheet, &sheet_rows)?;
        report.sheets += 1;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(report)
}

/// Worksheet names are capped at 31 characters and may not contain `/`.
fn sheet_name(family: Family) -> &'static str {
    match family {
        Family::SprintDistance => "Sprint Distance",
        Family::PowerPlays => "Power Plays",
        Family::PlayerLoad => "Player Load",
        Family::TopSpeed => "Top Speed",
        Family::DistancePerMin => "Distance Per Min",
        Family::AccelDecel => "Accel Decel",
    }
}

fn family_rows(spec: &FamilySpec, records: &[RoundRecord]) -> Vec<Vec<ExportCell>> {
    let mut header: Vec<ExportCell> = vec!["Round".into(), "Date".into()];
    if let Some(halves) = spec.halves {
        header.push(format!("{} 1st Half", halves.column).as_str().into());
        header.push("Mins played 1st Half".into());
        header.push(format!("{} 2nd Half", halves.column).as_str().into());
        header.push("Mins played 2nd Half".into());
        if halves.additive {
            header.push(format!("Total {}", halves.column).as_str().into());
        }
    }
    for field in spec.game_fields {
        header.push(field.name.into());
    }
    header.push("Mins played".into());
    if let Some(rate) = &spec.rate {
        header.push(rate.label.into());
    }

    let mut out = vec![header];
    for record in records {
        let mut row: Vec<ExportCell> = vec![
            record.round.as_str().into(),
            record.date.format("%Y-%m-%d").to_string().as_str().into(),
        ];
        if let Some(halves) = spec.halves {
            row.push(record.first_half.map(|h| h.value).into());
            row.push(record.first_half.and_then(|h| h.minutes).into());
            row.push(record.second_half.map(|h| h.value).into());
            row.push(record.second_half.and_then(|h| h.minutes).into());
            if halves.additive {
                row.push(record.half_total.into());
            }
        }
        for field in &record.game {
            row.push(field.value.into());
        }
        row.push(record.minutes.into());
        if spec.rate.is_some() {
            row.push(record.rate.into());
        }
        out.push(row);
    }
    out
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<ExportCell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match cell {
                ExportCell::Text(value) => worksheet.write_string(r, c, value).map(|_| ()),
                ExportCell::Number(value) => worksheet.write_number(r, c, *value).map(|_| ()),
                ExportCell::Blank => Ok(()),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
