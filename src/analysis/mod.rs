// Candle pattern analysis
use crate::models::Kline;
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Direction of a single candle body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleKind {
    Bull,
    Bear,
    Doji,
}

/// Classify one candle by comparing close against open.
///
/// Unparsable prices classify as doji: NaN compares false both ways,
/// and a candle we cannot read should not extend an alternating run.
pub fn classify(kline: &Kline) -> CandleKind {
    let open: f64 = kline.open.parse().unwrap_or(f64::NAN);
    let close: f64 = kline.close.parse().unwrap_or(f64::NAN);

    if close > open {
        CandleKind::Bull
    } else if close < open {
        CandleKind::Bear
    } else {
        CandleKind::Doji
    }
}

/// Find the lengths of pure bull/bear alternations, in order.
///
/// Doji runs and same-kind runs of two or more candles are separators;
/// whatever sits between separators is a fragment, and fragments of at
/// least two candles count as alternating runs. A fragment never
/// includes any candle of a separator run, so an alternation that ends
/// right where a same-kind run begins is counted without its final
/// candle.
pub fn alternating_runs(kinds: &[CandleKind]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut fragment = 0usize;
    let mut i = 0;

    while i < kinds.len() {
        if kinds[i] == CandleKind::Doji {
            if fragment >= 2 {
                runs.push(fragment);
            }
            fragment = 0;
            while i < kinds.len() && kinds[i] == CandleKind::Doji {
                i += 1;
            }
            continue;
        }

        if i + 1 < kinds.len() && kinds[i + 1] == kinds[i] {
            // A same-kind run starts here; swallow it whole
            if fragment >= 2 {
                runs.push(fragment);
            }
            fragment = 0;
            let kind = kinds[i];
            while i < kinds.len() && kinds[i] == kind {
                i += 1;
            }
            continue;
        }

        fragment += 1;
        i += 1;
    }

    if fragment >= 2 {
        runs.push(fragment);
    }

    runs
}

/// Aggregated alternation statistics across day files
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternationReport {
    pub total_days_analyzed: u64,
    pub total_candles_analyzed: u64,
    /// Run length -> number of runs of that length seen
    pub alternating_sequence_counts: BTreeMap<usize, u64>,
    pub total_candles_in_alternating_sequences: u64,
}

impl AlternationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one day of candles into the report
    pub fn record_day(&mut self, klines: &[Kline]) {
        self.total_days_analyzed += 1;
        self.total_candles_analyzed += klines.len() as u64;

        let kinds: Vec<CandleKind> = klines.iter().map(classify).collect();
        for run in alternating_runs(&kinds) {
            *self.alternating_sequence_counts.entry(run).or_insert(0) += 1;
            self.total_candles_in_alternating_sequences += run as u64;
        }
    }

    /// Write the report as `alternating_report_{YYYY-MM-DD}.json`,
    /// dated with today's UTC date
    pub async fn save(&self, results_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(results_dir).await?;

        let filename = format!("alternating_report_{}.json", Utc::now().format("%Y-%m-%d"));
        let path = results_dir.join(filename);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json).await?;

        tracing::info!("Saved alternation report to {}", path.display());

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_kline(open: &str, close: &str) -> Kline {
        Kline {
            open_time: 0,
            open: open.to_string(),
            high: "1".to_string(),
            low: "0".to_string(),
            close: close.to_string(),
            volume: "1000".to_string(),
        }
    }

    /// Shorthand: H = bull, B = bear, D = doji
    fn kinds(pattern: &str) -> Vec<CandleKind> {
        pattern
            .chars()
            .map(|c| match c {
                'H' => CandleKind::Bull,
                'B' => CandleKind::Bear,
                'D' => CandleKind::Doji,
                other => panic!("unknown kind {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_classify_by_body_direction() {
        assert_eq!(classify(&create_test_kline("0.5", "0.51")), CandleKind::Bull);
        assert_eq!(classify(&create_test_kline("0.5", "0.49")), CandleKind::Bear);
        assert_eq!(classify(&create_test_kline("0.5", "0.5")), CandleKind::Doji);
    }

    #[test]
    fn test_classify_unparsable_as_doji() {
        assert_eq!(classify(&create_test_kline("oops", "0.5")), CandleKind::Doji);
        assert_eq!(classify(&create_test_kline("0.5", "")), CandleKind::Doji);
    }

    #[test]
    fn test_runs_split_by_same_kind_runs() {
        assert_eq!(alternating_runs(&kinds("HHHBHBHBBBHB")), vec![4, 2]);
    }

    #[test]
    fn test_run_ending_at_same_kind_pair_loses_final_candle() {
        assert_eq!(alternating_runs(&kinds("HBHH")), vec![2]);
    }

    #[test]
    fn test_doji_separates_runs() {
        assert_eq!(alternating_runs(&kinds("HBDBH")), vec![2, 2]);
    }

    #[test]
    fn test_single_candles_do_not_count() {
        assert_eq!(alternating_runs(&kinds("DHD")), Vec::<usize>::new());
        assert_eq!(alternating_runs(&kinds("BHH")), Vec::<usize>::new());
        assert_eq!(alternating_runs(&kinds("H")), Vec::<usize>::new());
        assert_eq!(alternating_runs(&kinds("")), Vec::<usize>::new());
    }

    #[test]
    fn test_whole_day_alternating() {
        assert_eq!(alternating_runs(&kinds("HBHBHB")), vec![6]);
    }

    #[test]
    fn test_record_day_aggregates_counts() {
        let mut report = AlternationReport::new();

        // HBHB then BB: one run of 4
        let day1 = vec![
            create_test_kline("0.5", "0.51"),
            create_test_kline("0.51", "0.50"),
            create_test_kline("0.50", "0.52"),
            create_test_kline("0.52", "0.51"),
            create_test_kline("0.51", "0.50"),
            create_test_kline("0.50", "0.49"),
        ];
        // HB only: one run of 2
        let day2 = vec![
            create_test_kline("0.5", "0.51"),
            create_test_kline("0.51", "0.50"),
        ];

        report.record_day(&day1);
        report.record_day(&day2);

        assert_eq!(report.total_days_analyzed, 2);
        assert_eq!(report.total_candles_analyzed, 8);
        assert_eq!(report.alternating_sequence_counts.get(&4), Some(&1));
        assert_eq!(report.alternating_sequence_counts.get(&2), Some(&1));
        assert_eq!(report.total_candles_in_alternating_sequences, 6);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let mut report = AlternationReport::new();
        report.record_day(&[
            create_test_kline("0.5", "0.51"),
            create_test_kline("0.51", "0.50"),
        ]);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"totalDaysAnalyzed\":1"));
        assert!(json.contains("\"totalCandlesAnalyzed\":2"));
        assert!(json.contains("\"alternatingSequenceCounts\":{\"2\":1}"));
        assert!(json.contains("\"totalCandlesInAlternatingSequences\":2"));
    }

    #[tokio::test]
    async fn test_save_writes_dated_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = AlternationReport::new();
        report.record_day(&[
            create_test_kline("0.5", "0.51"),
            create_test_kline("0.51", "0.50"),
        ]);

        let path = report.save(dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("alternating_report_"));
        assert!(name.ends_with(".json"));

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let loaded: AlternationReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(loaded, report);
    }
}
