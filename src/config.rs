use std::env;
use std::path::PathBuf;

use crate::dataset::DEFAULT_SHEET;
use crate::state::Theme;

pub const DEFAULT_DATA_FILE: &str = "2025-Belconnen-NPLW-data.xlsx";
pub const DEFAULT_TITLE: &str = "2025 NPLW";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_file: PathBuf,
    pub sheet: String,
    pub theme: Theme,
    pub title: String,
    pub log_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            sheet: DEFAULT_SHEET.to_string(),
            theme: Theme::default(),
            title: DEFAULT_TITLE.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// `.env.local` then `.env`, then the process environment, then `args`.
    pub fn load(args: &[String]) -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        let mut config = Self::from_lookup(|key| env::var(key).ok());
        config.apply_args(args);
        config
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };
        Self {
            data_file: non_empty("GPS_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            sheet: non_empty("GPS_SHEET").unwrap_or(defaults.sheet),
            theme: non_empty("GPS_THEME")
                .and_then(|val| Theme::from_label(&val))
                .unwrap_or(defaults.theme),
            title: non_empty("GPS_TITLE").unwrap_or(defaults.title),
            log_dir: non_empty("GPS_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            export_dir: non_empty("GPS_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
        }
    }

    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(path) = flag_value(args, "data") {
            self.data_file = PathBuf::from(path);
        }
        if let Some(sheet) = flag_value(args, "sheet") {
            self.sheet = sheet;
        }
        if let Some(theme) = flag_value(args, "theme").and_then(|val| Theme::from_label(&val)) {
            self.theme = theme;
        }
    }
}

/// Value of `--name=value` or `--name value`.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let long = format!("--{name}");
    let prefix = format!("{long}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == long {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
