//! Summary statistics over iteration and batch results.
//!
//! Defines `RunStats` (single mode) and `BulkStats` (bulk mode), each
//! with counts, pre-formatted percentages, and timing aggregates.
use std::time::Duration;

use crate::runner::{BulkIterationResult, IterationResult};

fn pct(n: usize, d: usize) -> String {
    if d == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", (n as f64) / (d as f64) * 100.0)
}

/// Aggregates for a single-record run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub attempted: usize,
    pub successful: usize,
    pub matched: usize,
    pub success_percentage: String,
    pub match_percentage: String,
    /// Wall-clock time for the whole loop.
    pub total: Duration,
    /// Mean per-iteration time (both calls).
    pub average: Duration,
}

pub fn run_stats(results: &[IterationResult], total: Duration) -> RunStats {
    let attempted = results.len();
    let successful = results.iter().filter(|r| r.succeeded()).count();
    let matched = results.iter().filter(|r| r.matched()).count();
    let summed: Duration = results.iter().map(|r| r.elapsed).sum();
    let average = if attempted > 0 {
        summed / attempted as u32
    } else {
        Duration::ZERO
    };
    RunStats {
        attempted,
        successful,
        matched,
        success_percentage: pct(successful, attempted),
        match_percentage: pct(matched, attempted),
        total,
        average,
    }
}

/// Aggregates for a bulk run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkStats {
    pub batches: usize,
    pub items: usize,
    pub successful_batches: usize,
    pub matched_items: usize,
    pub match_percentage: String,
    /// Sum of per-batch times.
    pub total: Duration,
    pub average_batch: Duration,
}

pub fn bulk_stats(results: &[BulkIterationResult]) -> BulkStats {
    let batches = results.len();
    let items: usize = results.iter().map(|b| b.inputs.len()).sum();
    let successful_batches = results.iter().filter(|b| b.succeeded()).count();
    let matched_items: usize = results.iter().map(|b| b.matched_count()).sum();
    let total: Duration = results.iter().map(|b| b.elapsed).sum();
    let average_batch = if batches > 0 {
        total / batches as u32
    } else {
        Duration::ZERO
    };
    BulkStats {
        batches,
        items,
        successful_batches,
        matched_items,
        match_percentage: pct(matched_items, items),
        total,
        average_batch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiResponse;
    use serde_json::json;

    fn iteration(data: &str, status: u16, restored: Option<&str>, ms: u64) -> IterationResult {
        IterationResult {
            data: data.to_string(),
            protect_response: ApiResponse::json(status, json!({})),
            reveal_response: ApiResponse::json(status, json!({})),
            protected_token: Some("tok".to_string()),
            restored: restored.map(|s| s.to_string()),
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn run_stats_counts_and_percentages() {
        let results = vec![
            iteration("001", 200, Some("001"), 10),
            iteration("002", 200, Some("xxx"), 20),
            iteration("003", 500, None, 30),
        ];
        let s = run_stats(&results, Duration::from_millis(100));
        assert_eq!(s.attempted, 3);
        assert_eq!(s.successful, 2);
        assert_eq!(s.matched, 1);
        assert_eq!(s.success_percentage, "66.67%");
        assert_eq!(s.match_percentage, "33.33%");
        assert_eq!(s.average, Duration::from_millis(20));
        assert_eq!(s.total, Duration::from_millis(100));
    }

    #[test]
    fn empty_run_has_zeroed_stats() {
        let s = run_stats(&[], Duration::ZERO);
        assert_eq!(s.attempted, 0);
        assert_eq!(s.success_percentage, "0.00%");
        assert_eq!(s.average, Duration::ZERO);
    }

    fn batch(inputs: &[&str], restored: &[&str], status: u16, ms: u64) -> BulkIterationResult {
        BulkIterationResult {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            protect_response: ApiResponse::json(status, json!({})),
            reveal_response: ApiResponse::json(status, json!({})),
            protected_tokens: Vec::new(),
            restored_values: restored.iter().map(|s| s.to_string()).collect(),
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn bulk_stats_sums_batches() {
        let results = vec![
            batch(&["001", "002"], &["001", "002"], 200, 40),
            batch(&["003", "004"], &["003", "bad"], 500, 60),
        ];
        let s = bulk_stats(&results);
        assert_eq!(s.batches, 2);
        assert_eq!(s.items, 4);
        assert_eq!(s.successful_batches, 1);
        assert_eq!(s.matched_items, 3);
        assert_eq!(s.match_percentage, "75.00%");
        assert_eq!(s.total, Duration::from_millis(100));
        assert_eq!(s.average_batch, Duration::from_millis(50));
    }
}
