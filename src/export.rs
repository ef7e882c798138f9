//! Export helpers for writing run results to CSV files.
//!
//! - `save_iterations_csv` writes one row per protect/reveal round trip.
//! - `save_batches_csv` writes one row per bulk batch.
use std::path::Path;

use anyhow::Result;
use csv::Writer;

use crate::runner::{BulkIterationResult, IterationResult};

fn status_field(status: Option<u16>) -> String {
    match status {
        Some(s) => s.to_string(),
        None => "none".to_string(),
    }
}

pub fn save_iterations_csv<P: AsRef<Path>>(results: &[IterationResult], path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record([
        "Iteration",
        "Data",
        "ProtectStatus",
        "RevealStatus",
        "ProtectedToken",
        "Restored",
        "Match",
        "TimeS",
    ])?;
    for (i, r) in results.iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            r.data.clone(),
            status_field(r.protect_response.status),
            status_field(r.reveal_response.status),
            r.protected_token.clone().unwrap_or_default(),
            r.restored.clone().unwrap_or_default(),
            r.matched().to_string(),
            format!("{:.4}", r.elapsed.as_secs_f64()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_batches_csv<P: AsRef<Path>>(results: &[BulkIterationResult], path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record([
        "Batch",
        "Items",
        "ProtectStatus",
        "RevealStatus",
        "TokensExtracted",
        "RestoredExtracted",
        "MatchedItems",
        "TimeS",
    ])?;
    for (i, b) in results.iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            b.inputs.len().to_string(),
            status_field(b.protect_response.status),
            status_field(b.reveal_response.status),
            b.protected_tokens.len().to_string(),
            b.restored_values.len().to_string(),
            b.matched_count().to_string(),
            format!("{:.4}", b.elapsed.as_secs_f64()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
