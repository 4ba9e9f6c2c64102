use std::fs;

use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;

use gps_round_report::dataset::{
    self, Cell, DEFAULT_SHEET, LoadError, MINUTES_COLUMN, ObservationTable, RawSheet, Split,
};
use gps_round_report::family::POWER_PLAYS_COLUMN;

const SAMPLE_CSV: &str = "\
Player Name,Round,Date,Split Name,Mins played,Power Plays,Sprint Distance (m)
Zoe Hart,R1,2025-03-01,1st.half,45,2,110
Zoe Hart,R1,2025-03-01,2nd.half,44,1,95
Zoe Hart,R1,2025-03-01,game,89,3,205
Amy Lee,R1,01/03/2025,game,60,,40
Amy Lee,R1,2025-03-01,warmup,10,0,0
Amy Lee,R2,not a date,game,90,4,80
,R2,2025-03-08,game,90,4,80
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn sample_table() -> (ObservationTable, dataset::LoadReport) {
    let raw = dataset::parse_csv(SAMPLE_CSV.as_bytes()).expect("csv should parse");
    ObservationTable::from_sheet(raw).expect("schema is complete")
}

#[test]
fn csv_rows_become_observations() {
    let (table, report) = sample_table();

    assert_eq!(report.rows_loaded, 4);
    assert_eq!(report.rows_skipped, 3);
    assert_eq!(report.players, 2);
    assert_eq!(report.metric_columns, 3);
    assert_eq!(table.players(), vec!["Amy Lee".to_string(), "Zoe Hart".to_string()]);

    let zoe = table.for_player("Zoe Hart");
    assert_eq!(zoe.rows().len(), 3);
    assert_eq!(zoe.rows()[0].split, Split::FirstHalf);
    assert_eq!(zoe.rows()[2].metric(POWER_PLAYS_COLUMN), Some(3.0));
    assert_eq!(zoe.rows()[2].metric(MINUTES_COLUMN), Some(89.0));
}

#[test]
fn blank_cells_are_absent_metrics() {
    let (table, _) = sample_table();
    let amy = table.for_player("Amy Lee");
    assert_eq!(amy.rows().len(), 1);
    let row = amy.rows()[0];
    assert_eq!(row.date, date(2025, 3, 1));
    assert_eq!(row.metric(POWER_PLAYS_COLUMN), None);
    assert!(table.has_column(POWER_PLAYS_COLUMN));
}

#[test]
fn skipped_rows_carry_reasons() {
    let (_, report) = sample_table();
    let reasons: Vec<&str> = report.skipped.iter().map(|s| s.reason.as_str()).collect();
    assert!(reasons.iter().any(|r| r.contains("unknown split `warmup`")));
    assert!(reasons.iter().any(|r| r.contains("unreadable date")));
    assert!(reasons.iter().any(|r| r.contains("blank player name")));
    assert_eq!(report.skipped[0].line, 6);
}

#[test]
fn missing_identity_column_is_fatal() {
    let raw = dataset::parse_csv("Player Name,Round,Date,Mins played\nA,R1,2025-03-01,90\n".as_bytes())
        .expect("csv should parse");
    let err = ObservationTable::from_sheet(raw).expect_err("split column is missing");
    assert!(matches!(err, LoadError::MissingColumn(ref name) if name == "Split Name"));
}

#[test]
fn numeric_rounds_and_serial_dates_are_accepted() {
    let raw = RawSheet {
        headers: vec![
            "Player Name".to_string(),
            "Round".to_string(),
            "Date".to_string(),
            " Split Name ".to_string(),
            "Mins played".to_string(),
        ],
        rows: vec![vec![
            Cell::Text("Amy Lee".to_string()),
            Cell::Number(3.0),
            Cell::Number(45672.0),
            Cell::Text("Game".to_string()),
            Cell::Number(75.0),
        ]],
    };
    let (table, report) = ObservationTable::from_sheet(raw).expect("schema is complete");
    assert_eq!(report.rows_loaded, 1);
    let row = &table.rows()[0];
    assert_eq!(row.round, "3");
    assert_eq!(row.date, date(2025, 1, 15));
    assert_eq!(row.split, Split::Game);
}

#[test]
fn date_text_formats() {
    assert_eq!(dataset::parse_date_text("2025-03-01"), Some(date(2025, 3, 1)));
    assert_eq!(dataset::parse_date_text("01-03-2025"), Some(date(2025, 3, 1)));
    assert_eq!(dataset::parse_date_text("01/03/2025"), Some(date(2025, 3, 1)));
    assert_eq!(
        dataset::parse_date_text("2025-03-01 00:00:00"),
        Some(date(2025, 3, 1))
    );
    assert_eq!(dataset::parse_date_text("March 1st"), None);
}

#[test]
fn load_table_reads_csv_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stats.csv");
    fs::write(&path, SAMPLE_CSV).expect("write csv");

    let (table, report) = dataset::load_table(&path, DEFAULT_SHEET).expect("csv loads");
    assert_eq!(report.rows_loaded, 4);
    assert_eq!(table.len(), 4);
}

#[test]
fn load_table_rejects_unknown_extensions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stats.txt");
    fs::write(&path, SAMPLE_CSV).expect("write txt");

    let err = dataset::load_table(&path, DEFAULT_SHEET).expect_err("txt is not supported");
    assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
}

fn write_sample_workbook(path: &std::path::Path, sheet_name: &str) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).expect("sheet name");
    let mut lines = SAMPLE_CSV.lines();
    let headers = lines.next().expect("header line");
    for (col, header) in headers.split(',').enumerate() {
        sheet
            .write_string(0, col as u16, header)
            .expect("write header");
    }
    for (row, line) in lines.enumerate() {
        for (col, value) in line.split(',').enumerate() {
            let (r, c) = (row as u32 + 1, col as u16);
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(number) => sheet.write_number(r, c, number).map(|_| ()),
                Err(_) => sheet.write_string(r, c, value).map(|_| ()),
            }
            .expect("write cell");
        }
    }
    workbook.save(path).expect("save workbook");
}

#[test]
fn workbook_and_csv_load_the_same_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stats.xlsx");
    write_sample_workbook(&path, DEFAULT_SHEET);

    let (from_xlsx, report) = dataset::load_table(&path, DEFAULT_SHEET).expect("xlsx loads");
    let (from_csv, _) = sample_table();

    assert_eq!(report.rows_loaded, 4);
    assert_eq!(from_xlsx.rows(), from_csv.rows());
    assert_eq!(
        from_xlsx.columns().collect::<Vec<_>>(),
        from_csv.columns().collect::<Vec<_>>()
    );
}

#[test]
fn missing_sheet_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stats.xlsx");
    write_sample_workbook(&path, "team stats");

    let err = dataset::load_table(&path, DEFAULT_SHEET).expect_err("sheet is missing");
    assert!(matches!(err, LoadError::MissingSheet { ref sheet, .. } if sheet == DEFAULT_SHEET));
}
