use clap::Parser;
use std::path::PathBuf;

use crate::mode::ReportMode;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rssi-export",
    version,
    about = "Export wireless client RSSI/SNR history to CSV and XLSX"
)]
pub struct Args {
    #[arg(long, value_enum, default_value_t = ReportMode::PerDevice)]
    pub mode: ReportMode,
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
    /// Target SSID for `--mode ssid`; overrides the SSID environment variable.
    #[arg(long)]
    pub ssid: Option<String>,
}
