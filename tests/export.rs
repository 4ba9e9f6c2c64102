use calamine::{Data, Reader, open_workbook_auto};

use gps_round_report::dataset::{self, ObservationTable};
use gps_round_report::export::{default_file_name, export_player_workbook};
use gps_round_report::rounds::SortPolicy;

const SEASON_CSV: &str = "\
Player Name,Round,Date,Split Name,Mins played,Power Plays,Sprint Distance (m),Player Load,Energy (kcal),Impacts,Power Score (w/kg),Work Ratio,Top Speed (m/s),Distance Per Min (m/min),Accelerations Zone Count: 3 - 4 m/s/s,Accelerations Zone Count: > 4 m/s/s,Deceleration Zone Count: 3 - 4 m/s/s,Deceleration Zone Count: > 4 m/s/s
P,R1,2025-01-01,1st.half,20,2,60,150,300,10,4.1,12.5,7.1,100,3,1,2,1
P,R1,2025-01-01,2nd.half,20,2,40,140,280,9,4.0,12.1,7.3,95,2,1,3,0
P,R1,2025-01-01,game,40,4,100,290,580,19,4.0,12.3,7.3,98,5,2,5,1
P,R2,2025-01-08,game,20,2,30,120,240,5,3.8,11.0,6.8,90,1,0,2,2
";

fn load(csv: &str) -> ObservationTable {
    let raw = dataset::parse_csv(csv.as_bytes()).expect("csv should parse");
    ObservationTable::from_sheet(raw).expect("schema is complete").0
}

fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

#[test]
fn file_names_are_filesystem_safe() {
    assert_eq!(default_file_name("Zoe Hart"), "Zoe_Hart-gps.xlsx");
    assert_eq!(default_file_name("a/b"), "a_b-gps.xlsx");
}

#[test]
fn workbook_has_one_sheet_per_family() {
    let table = load(SEASON_CSV);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(default_file_name("P"));

    let report =
        export_player_workbook(&path, &table, "P", SortPolicy::ByValue).expect("export works");
    assert_eq!(report.sheets, 6);
    assert_eq!(report.rows, 12);
    assert!(report.skipped.is_empty());

    let mut workbook = open_workbook_auto(&path).expect("workbook reopens");
    assert_eq!(
        workbook.sheet_names(),
        vec![
            "Sprint Distance",
            "Power Plays",
            "Player Load",
            "Top Speed",
            "Distance Per Min",
            "Accel Decel",
        ]
    );

    let range = workbook.worksheet_range("Power Plays").expect("sheet exists");
    assert_eq!(range.height(), 3);
    assert_eq!(range.get_value((0, 0)), Some(&text("Round")));
    assert_eq!(range.get_value((0, 4)), Some(&text("PP per 10min")));
    assert_eq!(range.get_value((1, 0)), Some(&text("R2")));
    assert_eq!(range.get_value((2, 0)), Some(&text("R1")));
    assert_eq!(range.get_value((2, 1)), Some(&text("2025-01-01")));
    assert_eq!(range.get_value((2, 2)), Some(&Data::Float(4.0)));
    assert_eq!(range.get_value((2, 4)), Some(&Data::Float(1.0)));

    let sprint = workbook.worksheet_range("Sprint Distance").expect("sheet exists");
    assert_eq!(
        sprint.get_value((0, 6)),
        Some(&text("Total Sprint Distance (m)"))
    );
    assert_eq!(sprint.get_value((2, 6)), Some(&Data::Float(100.0)));
}

#[test]
fn missing_columns_leave_a_note_sheet() {
    let table = load("Player Name,Round,Date,Split Name,Mins played,Power Plays\nP,R1,2025-01-01,game,40,4\n");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("thin.xlsx");

    let report = export_player_workbook(&path, &table, "P", SortPolicy::Chronological)
        .expect("export works");
    assert_eq!(report.sheets, 6);
    assert_eq!(report.rows, 1);
    assert_eq!(report.skipped.len(), 5);

    let mut workbook = open_workbook_auto(&path).expect("workbook reopens");
    let range = workbook.worksheet_range("Sprint Distance").expect("sheet exists");
    assert_eq!(
        range.get_value((0, 0)),
        Some(&text("Sprint Distance: missing column `Sprint Distance (m)`"))
    );
}
