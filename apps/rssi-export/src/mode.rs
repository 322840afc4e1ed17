use clap::ValueEnum;

/// Which client source feeds the report.
///
/// `PerDevice` asks every access point for its recent clients and reports
/// every signal sample. `Ssid` lists clients network-wide, keeps the ones on
/// the target SSID and reports only weak-signal samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportMode {
    PerDevice,
    Ssid,
}

impl ReportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerDevice => "per-device",
            Self::Ssid => "ssid",
        }
    }
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
