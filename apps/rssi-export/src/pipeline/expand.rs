use crate::error::RecordError;
use crate::export::OutputRow;

use super::history::ClientHistory;

const SAMPLE_RECORD: &str = "signal sample of client";

/// Which samples survive expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFilter {
    /// Every sample, including ones without an RSSI reading.
    All,
    /// Samples with an RSSI reading at or below the threshold (dBm), weakest
    /// first.
    WeakSignal { threshold_dbm: i64 },
}

impl SampleFilter {
    fn keeps(self, rssi: Option<i64>) -> bool {
        match self {
            Self::All => true,
            Self::WeakSignal { threshold_dbm } => rssi.is_some_and(|rssi| rssi <= threshold_dbm),
        }
    }
}

/// Emits one row per history bucket. Fails on the first sample lacking an
/// expected key; no partial row set is returned.
pub fn expand_rows(
    histories: &[ClientHistory],
    filter: SampleFilter,
) -> Result<Vec<OutputRow>, RecordError> {
    let mut rows = Vec::new();
    for history in histories {
        let client_id = history.record.client_id.as_str();
        for sample in &history.samples {
            let snr = sample.snr.require(SAMPLE_RECORD, client_id, "snr")?;
            let start_ts = sample.start_ts.require(SAMPLE_RECORD, client_id, "startTs")?;
            let end_ts = sample.end_ts.require(SAMPLE_RECORD, client_id, "endTs")?;
            if !filter.keeps(sample.rssi) {
                continue;
            }
            rows.push(OutputRow {
                record: history.record.clone(),
                rssi: sample.rssi,
                snr,
                start_ts,
                end_ts,
            });
        }
    }

    if let SampleFilter::WeakSignal { .. } = filter {
        // Stable: equal readings keep client then bucket order.
        rows.sort_by_key(|row| row.rssi);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientRecord, RecordDetail, Reported, SignalSample};

    fn record(id: &str) -> ClientRecord {
        ClientRecord {
            client_id: id.to_string(),
            client_mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
            client_description: None,
            ap_serial: Some("Q2XX-0001".to_string()),
            ap_name: Some("Lobby".to_string()),
            ap_mac: None,
            detail: RecordDetail::Ssid {
                ssid: Some("CorpWiFi".to_string()),
                ap_tags: String::new(),
            },
        }
    }

    fn sample(rssi: Option<i64>, start: &str) -> SignalSample {
        SignalSample {
            rssi,
            snr: Reported::Value(20),
            start_ts: Reported::Value(start.to_string()),
            end_ts: Reported::Value(format!("{start}+5m")),
        }
    }

    fn history(id: &str, samples: Vec<SignalSample>) -> ClientHistory {
        ClientHistory {
            record: record(id),
            samples,
        }
    }

    fn rssi_values(rows: &[OutputRow]) -> Vec<Option<i64>> {
        rows.iter().map(|row| row.rssi).collect()
    }

    #[test]
    fn all_filter_keeps_every_bucket_including_missing_rssi() {
        let histories = vec![history(
            "c1",
            vec![sample(Some(-60), "t0"), sample(None, "t1"), sample(Some(-90), "t2")],
        )];

        let rows = expand_rows(&histories, SampleFilter::All).unwrap();

        assert_eq!(rssi_values(&rows), vec![Some(-60), None, Some(-90)]);
        assert_eq!(rows[1].start_ts.as_deref(), Some("t1"));
        assert!(rows.iter().all(|row| row.record.client_id == "c1"));
    }

    #[test]
    fn weak_signal_filter_is_inclusive_and_drops_missing_rssi() {
        let histories = vec![history(
            "c1",
            vec![
                sample(Some(-80), "t0"),
                sample(Some(-70), "t1"),
                sample(None, "t2"),
                sample(Some(-75), "t3"),
                sample(Some(-74), "t4"),
            ],
        )];

        let rows =
            expand_rows(&histories, SampleFilter::WeakSignal { threshold_dbm: -75 }).unwrap();

        assert_eq!(rssi_values(&rows), vec![Some(-80), Some(-75)]);
    }

    #[test]
    fn weak_signal_rows_are_sorted_weakest_first() {
        let histories = vec![
            history("c1", vec![sample(Some(-76), "a0"), sample(Some(-90), "a1")]),
            history("c2", vec![sample(Some(-82), "b0"), sample(Some(-76), "b1")]),
        ];

        let rows =
            expand_rows(&histories, SampleFilter::WeakSignal { threshold_dbm: -75 }).unwrap();

        assert_eq!(
            rssi_values(&rows),
            vec![Some(-90), Some(-82), Some(-76), Some(-76)]
        );
        assert!(rows.windows(2).all(|pair| pair[0].rssi <= pair[1].rssi));
        let ties: Vec<&str> = rows[2..].iter().map(|row| row.record.client_id.as_str()).collect();
        assert_eq!(ties, vec!["c1", "c2"]);
    }

    #[test]
    fn expansion_is_repeatable() {
        let histories = vec![
            history("c1", vec![sample(Some(-81), "t0"), sample(Some(-77), "t1")]),
            history("c2", vec![sample(Some(-95), "t0")]),
        ];
        let filter = SampleFilter::WeakSignal { threshold_dbm: -75 };

        let first = expand_rows(&histories, filter).unwrap();
        let second = expand_rows(&histories, filter).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_sample_field_fails_expansion() {
        let mut broken = sample(Some(-80), "t1");
        broken.end_ts = Reported::Missing;
        let histories = vec![history("c1", vec![sample(Some(-80), "t0"), broken])];

        let err = expand_rows(&histories, SampleFilter::All).unwrap_err();
        assert_eq!(
            err.to_string(),
            "signal sample of client c1 is missing expected field `endTs`"
        );
    }
}
