use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::mode::ReportMode;
use crate::model::{ClientRecord, RecordDetail};

pub const PER_DEVICE_CSV: &str = "rssi_data.csv";
pub const PER_DEVICE_XLSX: &str = "rssi_data.xlsx";
pub const SSID_CSV: &str = "weak_rssi_data.csv";
pub const SHEET_NAME: &str = "RSSI Report";

const PER_DEVICE_COLUMNS: &[&str] = &[
    "client",
    "clientMac",
    "clientDescription",
    "clientHostName",
    "apSerial",
    "apName",
    "apMac",
    "apLat",
    "apLng",
    "apAddress",
    "rssi",
    "snr",
    "startTs",
    "endTs",
];

const SSID_COLUMNS: &[&str] = &[
    "client",
    "clientMac",
    "clientDescription",
    "ssid",
    "apSerial",
    "apName",
    "apMac",
    "apTags",
    "rssi",
    "snr",
    "startTs",
    "endTs",
];

/// A client, its access point and one signal bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub record: ClientRecord,
    pub rssi: Option<i64>,
    pub snr: Option<i64>,
    pub start_ts: Option<String>,
    pub end_ts: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Empty,
    Text(&'a str),
    Int(i64),
    Float(f64),
}

impl Cell<'_> {
    fn to_csv_field(self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.to_string(),
            Cell::Int(value) => value.to_string(),
            Cell::Float(value) => value.to_string(),
        }
    }
}

fn text(value: &Option<String>) -> Cell<'_> {
    value.as_deref().map_or(Cell::Empty, Cell::Text)
}

fn int(value: Option<i64>) -> Cell<'static> {
    value.map_or(Cell::Empty, Cell::Int)
}

fn float(value: Option<f64>) -> Cell<'static> {
    value.map_or(Cell::Empty, Cell::Float)
}

pub fn columns(mode: ReportMode) -> &'static [&'static str] {
    match mode {
        ReportMode::PerDevice => PER_DEVICE_COLUMNS,
        ReportMode::Ssid => SSID_COLUMNS,
    }
}

impl OutputRow {
    /// Cells in the order of [`columns`] for the row's report mode.
    pub fn cells(&self) -> Vec<Cell<'_>> {
        let record = &self.record;
        let mut cells = vec![
            Cell::Text(&record.client_id),
            text(&record.client_mac),
            text(&record.client_description),
        ];
        match &record.detail {
            RecordDetail::PerDevice {
                client_host_name,
                ap_lat,
                ap_lng,
                ap_address,
            } => cells.extend([
                text(client_host_name),
                text(&record.ap_serial),
                text(&record.ap_name),
                text(&record.ap_mac),
                float(*ap_lat),
                float(*ap_lng),
                text(ap_address),
            ]),
            RecordDetail::Ssid { ssid, ap_tags } => cells.extend([
                text(ssid),
                text(&record.ap_serial),
                text(&record.ap_name),
                text(&record.ap_mac),
                Cell::Text(ap_tags),
            ]),
        }
        cells.extend([
            int(self.rssi),
            int(self.snr),
            text(&self.start_ts),
            text(&self.end_ts),
        ]);
        cells
    }
}

/// Writes the report files for `mode` into `output_dir` and returns their
/// paths. Rows are written as given; an empty set still gets a header row.
pub fn write_report(rows: &[OutputRow], mode: ReportMode, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let mut written = Vec::new();
    match mode {
        ReportMode::PerDevice => {
            let csv_path = output_dir.join(PER_DEVICE_CSV);
            write_csv(&csv_path, columns(mode), rows)?;
            written.push(csv_path);

            let xlsx_path = output_dir.join(PER_DEVICE_XLSX);
            write_xlsx(&xlsx_path, columns(mode), rows)?;
            written.push(xlsx_path);
        }
        ReportMode::Ssid => {
            let csv_path = output_dir.join(SSID_CSV);
            write_csv(&csv_path, columns(mode), rows)?;
            written.push(csv_path);
        }
    }

    info!(rows = rows.len(), files = ?written, "RSSI data exported");
    Ok(written)
}

pub fn write_csv(path: &Path, columns: &[&str], rows: &[OutputRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer
        .write_record(columns)
        .with_context(|| format!("failed to write header to {}", path.display()))?;
    for row in rows {
        let fields: Vec<String> = row.cells().into_iter().map(Cell::to_csv_field).collect();
        writer
            .write_record(&fields)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

pub fn write_xlsx(path: &Path, columns: &[&str], rows: &[OutputRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in (0u16..).zip(columns) {
        sheet.write_string_with_format(0, col, *name, &header)?;
    }
    for (row_idx, row) in (1u32..).zip(rows) {
        for (col, cell) in (0u16..).zip(row.cells()) {
            match cell {
                Cell::Empty => {}
                Cell::Text(value) => {
                    sheet.write_string(row_idx, col, value)?;
                }
                Cell::Int(value) => {
                    sheet.write_number(row_idx, col, value as f64)?;
                }
                Cell::Float(value) => {
                    sheet.write_number(row_idx, col, value)?;
                }
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write workbook {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_part(path: &Path, name: &str) -> Result<String> {
        use std::io::Read;

        let mut archive = zip::ZipArchive::new(fs::File::open(path)?)?;
        let mut part = archive.by_name(name)?;
        let mut contents = String::new();
        part.read_to_string(&mut contents)?;
        Ok(contents)
    }

    fn per_device_row(rssi: Option<i64>) -> OutputRow {
        OutputRow {
            record: ClientRecord {
                client_id: "k74272e".to_string(),
                client_mac: Some("22:33:44:55:66:77".to_string()),
                client_description: Some("Front desk, laptop".to_string()),
                ap_serial: Some("Q2XX-0001".to_string()),
                ap_name: Some("Lobby".to_string()),
                ap_mac: None,
                detail: RecordDetail::PerDevice {
                    client_host_name: Some("desk-01".to_string()),
                    ap_lat: Some(37.5),
                    ap_lng: Some(-122.25),
                    ap_address: None,
                },
            },
            rssi,
            snr: Some(24),
            start_ts: Some("2024-05-01T00:00:00Z".to_string()),
            end_ts: Some("2024-05-01T00:05:00Z".to_string()),
        }
    }

    fn ssid_row() -> OutputRow {
        let mut row = per_device_row(Some(-80));
        row.record.detail = RecordDetail::Ssid {
            ssid: Some("CorpWiFi".to_string()),
            ap_tags: "floor-1,west".to_string(),
        };
        row
    }

    #[test]
    fn cells_line_up_with_columns() {
        assert_eq!(
            per_device_row(None).cells().len(),
            columns(ReportMode::PerDevice).len()
        );
        assert_eq!(ssid_row().cells().len(), columns(ReportMode::Ssid).len());
    }

    #[test]
    fn csv_has_header_and_quoted_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        write_csv(
            &path,
            columns(ReportMode::PerDevice),
            &[per_device_row(Some(-67)), per_device_row(None)],
        )?;

        let contents = fs::read_to_string(&path)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "client,clientMac,clientDescription,clientHostName,apSerial,apName,apMac,apLat,apLng,apAddress,rssi,snr,startTs,endTs"
        );
        assert_eq!(
            lines[1],
            "k74272e,22:33:44:55:66:77,\"Front desk, laptop\",desk-01,Q2XX-0001,Lobby,,37.5,-122.25,,-67,24,2024-05-01T00:00:00Z,2024-05-01T00:05:00Z"
        );
        assert!(lines[2].contains("-122.25,,,24,"));
        assert_eq!(lines.len(), 3);
        Ok(())
    }

    #[test]
    fn empty_report_writes_header_only() -> Result<()> {
        let dir = tempdir()?;
        let written = write_report(&[], ReportMode::Ssid, dir.path())?;

        assert_eq!(written, vec![dir.path().join(SSID_CSV)]);
        let contents = fs::read_to_string(&written[0])?;
        assert_eq!(
            contents.trim_end(),
            "client,clientMac,clientDescription,ssid,apSerial,apName,apMac,apTags,rssi,snr,startTs,endTs"
        );
        Ok(())
    }

    #[test]
    fn per_device_report_writes_csv_and_workbook() -> Result<()> {
        let dir = tempdir()?;
        let written = write_report(&[per_device_row(Some(-70))], ReportMode::PerDevice, dir.path())?;

        assert_eq!(
            written,
            vec![dir.path().join(PER_DEVICE_CSV), dir.path().join(PER_DEVICE_XLSX)]
        );
        let workbook = read_part(&written[1], "xl/workbook.xml")?;
        assert_eq!(workbook.matches("<sheet ").count(), 1);
        assert!(workbook.contains(r#"name="RSSI Report""#), "{workbook}");

        let strings = read_part(&written[1], "xl/sharedStrings.xml")?;
        for column in columns(ReportMode::PerDevice) {
            assert!(strings.contains(&format!(">{column}<")), "{column}");
        }

        let sheet = read_part(&written[1], "xl/worksheets/sheet1.xml")?;
        // rssi is column K; numeric cells carry no string type.
        let rssi = sheet
            .split("<c ")
            .find(|cell| cell.starts_with(r#"r="K2""#))
            .expect("rssi cell");
        assert!(!rssi.contains(r#"t="s""#), "{rssi}");
        assert!(rssi.contains("<v>-70</v>"), "{rssi}");
        Ok(())
    }

    #[test]
    fn empty_workbook_keeps_header_row() -> Result<()> {
        let dir = tempdir()?;
        let written = write_report(&[], ReportMode::PerDevice, dir.path())?;

        let sheet = read_part(&written[1], "xl/worksheets/sheet1.xml")?;
        assert!(sheet.contains(r#"r="A1""#));
        assert!(sheet.contains(r#"r="N1""#));
        assert!(!sheet.contains(r#"r="A2""#));
        Ok(())
    }
}
