use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use gps_round_report::config::{Config, flag_value};
use gps_round_report::dataset;
use gps_round_report::family::Family;
use gps_round_report::logging;
use gps_round_report::rounds::{self, RoundRecord, SortPolicy};

#[derive(Serialize)]
struct Report<'a> {
    player: &'a str,
    family: Family,
    sort: SortPolicy,
    records: Vec<RoundRecord>,
}

fn main() -> Result<()> {
    logging::init_stderr_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::load(&args);

    let (table, report) = dataset::load_table(&config.data_file, &config.sheet)
        .with_context(|| format!("unable to load {}", config.data_file.display()))?;
    if report.rows_skipped > 0 {
        eprintln!("Skipped rows: {}", report.rows_skipped);
        for row in report.skipped.iter().take(8) {
            eprintln!(" - line {}: {}", row.line, row.reason);
        }
    }

    if args.iter().any(|arg| arg == "--players") {
        for player in table.players() {
            println!("{player}");
        }
        return Ok(());
    }

    let player = flag_value(&args, "player").context("missing --player <name>")?;
    let families = match flag_value(&args, "family") {
        Some(raw) => vec![Family::from_slug(&raw).ok_or_else(|| anyhow!("unknown family `{raw}`"))?],
        None => Family::ALL.to_vec(),
    };
    let sort = match flag_value(&args, "sort") {
        Some(raw) => SortPolicy::from_slug(&raw).ok_or_else(|| anyhow!("unknown sort `{raw}`"))?,
        None => SortPolicy::default(),
    };

    let rows = table.for_player(&player);
    if rows.is_empty() {
        eprintln!("No rows for player `{player}`");
    }

    let mut out = Vec::new();
    for family in families {
        // A missing column only empties that family's output.
        let records = match rounds::build(&rows, family, sort) {
            Ok(records) => records,
            Err(err) => {
                eprintln!("{err}");
                Vec::new()
            }
        };
        out.push(Report {
            player: &player,
            family,
            sort,
            records,
        });
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
