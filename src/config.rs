//! Runtime configuration for the `scorecard` binary.

use chrono::NaiveDateTime;
use clap::Parser;
use std::path::PathBuf;

use crate::util::parse_datetime_safe;

#[derive(Debug, Clone, Parser)]
#[command(name = "scorecard", about = "Task coverage and performance reports per municipality")]
pub struct AppConfig {
    /// Directory holding divisions.csv, municipalities.csv, tasks.csv and deliveries.csv
    #[arg(long, env = "SCORECARD_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Where report CSV/JSON files are written
    #[arg(long, env = "SCORECARD_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// tracing filter used when RUST_LOG is unset
    #[arg(long, env = "SCORECARD_LOG", default_value = "info")]
    pub log_level: String,

    /// Fixed reference instant (`YYYY-MM-DD HH:MM:SS`); defaults to the local clock
    #[arg(long, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,
}

impl AppConfig {
    pub fn reference_now(&self) -> NaiveDateTime {
        self.now
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }
}

fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    parse_datetime_safe(Some(s)).ok_or_else(|| format!("cannot parse `{}` as a timestamp", s))
}
