//! Iteration drivers: one protect/reveal round trip per record, or one
//! per batch in bulk mode.
//!
//! Typical usage:
//!
//! ```no_run
//! use std::time::Duration;
//! use protect_reveal::client::ProtectRevealClient;
//! use protect_reveal::runner::run_iteration;
//! # fn main() -> anyhow::Result<()> {
//! let client =
//!     ProtectRevealClient::new("192.168.0.231", 32082, "P03", Duration::from_secs(10), None)?;
//! let result = run_iteration(&client, "0123456789123");
//! println!("matched: {}", result.matched());
//! # Ok(())
//! # }
//! ```
use std::time::{Duration, Instant};

use crate::client::{ApiResponse, ProtectApi};
use crate::extract::{
    extract_protected, extract_protected_list, extract_restored, extract_restored_list,
};

/// One protect-then-reveal round trip over a single record.
#[derive(Debug, Clone)]
pub struct IterationResult {
    pub data: String,
    pub protect_response: ApiResponse,
    pub reveal_response: ApiResponse,
    pub protected_token: Option<String>,
    pub restored: Option<String>,
    pub elapsed: Duration,
}

impl IterationResult {
    /// Both calls came back 2xx.
    pub fn succeeded(&self) -> bool {
        self.protect_response.is_success() && self.reveal_response.is_success()
    }

    /// The revealed value equals the value originally sent.
    pub fn matched(&self) -> bool {
        self.restored.as_deref() == Some(self.data.as_str())
    }
}

/// Send protect then reveal for one record, timing the pair. A protect
/// failure still issues the reveal call with an empty token so the
/// iteration produces a countable result row.
pub fn run_iteration<C: ProtectApi>(client: &C, data: &str) -> IterationResult {
    let start = Instant::now();
    let protect_response = client.protect(data);
    let protected_token = extract_protected(&protect_response);
    let reveal_response = client.reveal(protected_token.as_deref().unwrap_or(""));
    let restored = extract_restored(&reveal_response);
    IterationResult {
        data: data.to_string(),
        protect_response,
        reveal_response,
        protected_token,
        restored,
        elapsed: start.elapsed(),
    }
}

/// One protect-bulk/reveal-bulk round trip over a batch of records.
#[derive(Debug, Clone)]
pub struct BulkIterationResult {
    pub inputs: Vec<String>,
    pub protect_response: ApiResponse,
    pub reveal_response: ApiResponse,
    pub protected_tokens: Vec<String>,
    pub restored_values: Vec<String>,
    pub elapsed: Duration,
}

impl BulkIterationResult {
    pub fn succeeded(&self) -> bool {
        self.protect_response.is_success() && self.reveal_response.is_success()
    }

    /// Restored values that equal the input at the same position.
    pub fn matched_count(&self) -> usize {
        self.inputs
            .iter()
            .zip(&self.restored_values)
            .filter(|(sent, got)| sent == got)
            .count()
    }
}

/// Chunk `inputs` by `batch_size` and run each batch sequentially:
/// protect bulk, extract tokens, reveal bulk with those tokens. A
/// failed protect batch still issues the reveal call with whatever
/// tokens were extracted and still yields a result row.
pub fn run_bulk_iteration<C: ProtectApi>(
    client: &C,
    inputs: &[String],
    batch_size: usize,
    username: Option<&str>,
) -> Vec<BulkIterationResult> {
    let batch_size = batch_size.max(1);
    inputs
        .chunks(batch_size)
        .map(|chunk| {
            let start = Instant::now();
            let protect_response = client.protect_bulk(chunk);
            let protected_tokens = extract_protected_list(&protect_response);
            let reveal_response = client.reveal_bulk(&protected_tokens, username);
            let restored_values = extract_restored_list(&reveal_response);
            BulkIterationResult {
                inputs: chunk.to_vec(),
                protect_response,
                reveal_response,
                protected_tokens,
                restored_values,
                elapsed: start.elapsed(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// Canned transport: tokens are "tok-" + data, reveal strips the
    /// prefix back off. Records reveal arguments for assertions.
    struct FakeApi {
        protect_status: u16,
        fail_second_protect_batch: bool,
        protect_batches_seen: RefCell<usize>,
        revealed: RefCell<Vec<String>>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                protect_status: 200,
                fail_second_protect_batch: false,
                protect_batches_seen: RefCell::new(0),
                revealed: RefCell::new(Vec::new()),
            }
        }

        fn untoken(token: &str) -> String {
            token.strip_prefix("tok-").unwrap_or(token).to_string()
        }
    }

    impl ProtectApi for FakeApi {
        fn policy(&self) -> &str {
            "P-test"
        }

        fn protect(&self, data: &str) -> ApiResponse {
            if self.protect_status != 200 {
                return ApiResponse::json(self.protect_status, json!({"error": "server error"}));
            }
            ApiResponse::json(200, json!({"protected_data": format!("tok-{data}")}))
        }

        fn reveal(&self, protected: &str) -> ApiResponse {
            self.revealed.borrow_mut().push(protected.to_string());
            if protected.is_empty() {
                return ApiResponse::json(404, json!({"error": "unknown token"}));
            }
            ApiResponse::json(200, json!({"data": Self::untoken(protected)}))
        }

        fn protect_bulk(&self, items: &[String]) -> ApiResponse {
            let batch = {
                let mut seen = self.protect_batches_seen.borrow_mut();
                *seen += 1;
                *seen
            };
            if self.fail_second_protect_batch && batch == 2 {
                return ApiResponse::json(500, json!({"error": "server error"}));
            }
            let tokens: Vec<_> = items
                .iter()
                .map(|d| json!({"protected_data": format!("tok-{d}")}))
                .collect();
            ApiResponse::json(200, json!({"protected_data_array": tokens}))
        }

        fn reveal_bulk(&self, protected_items: &[String], _username: Option<&str>) -> ApiResponse {
            let values: Vec<_> = protected_items
                .iter()
                .map(|t| json!({"data": Self::untoken(t)}))
                .collect();
            ApiResponse::json(200, json!({"data_array": values}))
        }
    }

    #[test]
    fn iteration_round_trip_matches() {
        let api = FakeApi::new();
        let r = run_iteration(&api, "0042");
        assert!(r.succeeded());
        assert!(r.matched());
        assert_eq!(r.protected_token.as_deref(), Some("tok-0042"));
        assert_eq!(r.restored.as_deref(), Some("0042"));
    }

    #[test]
    fn protect_failure_still_reveals_with_empty_token() {
        let api = FakeApi {
            protect_status: 500,
            ..FakeApi::new()
        };
        let r = run_iteration(&api, "0042");
        assert!(!r.succeeded());
        assert!(!r.matched());
        assert_eq!(r.protected_token, None);
        assert_eq!(api.revealed.borrow().as_slice(), ["".to_string()]);
    }

    #[test]
    fn bulk_chunks_and_round_trips() {
        let api = FakeApi::new();
        let inputs: Vec<String> = ["001", "002", "003", "004"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = run_bulk_iteration(&api, &inputs, 2, None);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].protected_tokens, vec!["tok-001", "tok-002"]);
        assert_eq!(results[0].restored_values, vec!["001", "002"]);
        assert_eq!(results[1].protected_tokens, vec!["tok-003", "tok-004"]);
        assert_eq!(results[1].restored_values, vec!["003", "004"]);
        assert_eq!(results[0].matched_count(), 2);
    }

    #[test]
    fn bulk_partial_failure_keeps_result_rows() {
        let api = FakeApi {
            fail_second_protect_batch: true,
            ..FakeApi::new()
        };
        let inputs: Vec<String> = ["001", "002", "003", "004"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = run_bulk_iteration(&api, &inputs, 2, None);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].protect_response.status, Some(200));
        assert!(results[0].succeeded());
        assert_eq!(results[1].protect_response.status, Some(500));
        assert!(!results[1].succeeded());
        assert!(results[1].protected_tokens.is_empty());
        assert_eq!(results[1].matched_count(), 0);
    }

    #[test]
    fn bulk_uneven_final_batch() {
        let api = FakeApi::new();
        let inputs: Vec<String> = ["001", "002", "003"].iter().map(|s| s.to_string()).collect();
        let results = run_bulk_iteration(&api, &inputs, 2, None);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].inputs, vec!["003"]);
    }

    #[test]
    fn bulk_batch_size_zero_is_clamped() {
        let api = FakeApi::new();
        let inputs: Vec<String> = ["001", "002"].iter().map(|s| s.to_string()).collect();
        let results = run_bulk_iteration(&api, &inputs, 0, None);
        assert_eq!(results.len(), 2);
    }
}
