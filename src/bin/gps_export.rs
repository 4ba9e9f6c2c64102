use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use gps_round_report::config::{Config, flag_value};
use gps_round_report::dataset;
use gps_round_report::export;
use gps_round_report::logging;
use gps_round_report::rounds::SortPolicy;

fn main() -> Result<()> {
    logging::init_stderr_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::load(&args);

    let (table, _) = dataset::load_table(&config.data_file, &config.sheet)
        .with_context(|| format!("unable to load {}", config.data_file.display()))?;

    let sort = match flag_value(&args, "sort") {
        Some(raw) => SortPolicy::from_slug(&raw).ok_or_else(|| anyhow!("unknown sort `{raw}`"))?,
        None => SortPolicy::default(),
    };
    let players = match flag_value(&args, "player") {
        Some(player) => vec![player],
        None => table.players(),
    };
    let out_dir = flag_value(&args, "out")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.export_dir.clone());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("unable to create {}", out_dir.display()))?;

    let mut errors = Vec::new();
    for player in &players {
        let path = out_dir.join(export::default_file_name(player));
        match export::export_player_workbook(&path, &table, player, sort) {
            Ok(report) => {
                println!(
                    "{player}: {} sheets, {} rounds -> {}",
                    report.sheets,
                    report.rows,
                    report.path.display()
                );
                for skipped in report.skipped {
                    println!(" - {skipped}");
                }
            }
            Err(err) => errors.push(format!("{player}: {err:#}")),
        }
    }

    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }
    Ok(())
}
