//! Human-readable report rendering for terminal output.
//!
//! Produces the run summary block, per-iteration progress lines, and the
//! optional request/response body dumps. Everything renders to `String`
//! so the CLI decides what gets printed.
use colored::*;
use serde_json::{Value, json};

use crate::client::{ResponseBody, protect_payload, reveal_payload};
use crate::runner::{BulkIterationResult, IterationResult};
use crate::stats::{BulkStats, RunStats};

fn visible_len(s: &str) -> usize {
    // Strip ANSI escape sequences (\x1b[ ... m) to compute printable width
    let mut len = 0;
    let mut iter = s.chars().peekable();
    while let Some(ch) = iter.next() {
        if ch == '\u{1b}' {
            if let Some('[') = iter.peek().cloned() {
                let _ = iter.next();
            }
            for c in iter.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            len += 1;
        }
    }
    len
}

fn section_header(title: &str) -> String {
    let len = visible_len(title);
    let mut s = String::new();
    s.push('\n');
    s.push_str(title);
    s.push('\n');
    s.push_str(&"─".repeat(len));
    s.push_str("\n\n");
    s
}

pub fn pretty_json(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn render_body(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Json(v) => pretty_json(v),
        ResponseBody::Text(t) => t.clone(),
    }
}

fn status_str(status: Option<u16>) -> String {
    match status {
        Some(s) => s.to_string(),
        None => "none".to_string(),
    }
}

fn secs(d: std::time::Duration) -> String {
    format!("{:.4}s", d.as_secs_f64())
}

/// One-line progress entry for a single iteration.
pub fn render_progress_line(index: usize, r: &IterationResult) -> String {
    format!(
        "#{:03} data={} time={} protect_status={} reveal_status={} match={}",
        index,
        r.data,
        secs(r.elapsed),
        status_str(r.protect_response.status),
        status_str(r.reveal_response.status),
        r.matched(),
    )
}

/// Request payloads and response bodies for one iteration, indented
/// under its progress line.
pub fn render_iteration_bodies(policy: &str, r: &IterationResult) -> String {
    let protect_sent = protect_payload(policy, &r.data);
    let reveal_sent = reveal_payload(policy, r.protected_token.as_deref().unwrap_or(""));
    let mut out = String::new();
    out.push_str(&format!("  Sent protect payload:\n{}\n", pretty_json(&protect_sent)));
    out.push_str(&format!(
        "  Received protect body:\n{}\n",
        render_body(&r.protect_response.body)
    ));
    out.push_str(&format!("  Sent reveal payload:\n{}\n", pretty_json(&reveal_sent)));
    out.push_str(&format!(
        "  Received reveal body:\n{}\n",
        render_body(&r.reveal_response.body)
    ));
    out
}

fn batch_side(
    resp_status: Option<u16>,
    resp_body: Option<&Value>,
    total: usize,
    extracted: &[String],
    list_key: &str,
    item_key: &str,
) -> Value {
    let body = resp_body.and_then(Value::as_object);
    let get = |k: &str| body.and_then(|m| m.get(k)).cloned();
    let default_status = if matches!(resp_status, Some(s) if (200..300).contains(&s)) {
        "Success"
    } else {
        "Error"
    };
    let items: Vec<Value> = extracted
        .iter()
        .map(|v| {
            let mut obj = serde_json::Map::new();
            obj.insert(item_key.to_string(), json!(v));
            Value::Object(obj)
        })
        .collect();
    let mut side = json!({
        "status": get("status").unwrap_or_else(|| json!(default_status)),
        "total_count": get("total_count").unwrap_or_else(|| json!(total)),
        "success_count": get("success_count").unwrap_or_else(|| json!(extracted.len())),
        "error_count": get("error_count")
            .unwrap_or_else(|| json!(total.saturating_sub(extracted.len()))),
    });
    side[list_key] = Value::Array(items);
    side
}

/// Normalized per-batch body dump: whatever counts the server reported,
/// filled in from the extracted lists where it reported none.
pub fn render_batch_bodies(index: usize, b: &BulkIterationResult) -> String {
    let total = b.inputs.len();
    let out = json!({
        "batch": index,
        "protect": batch_side(
            b.protect_response.status,
            b.protect_response.body_json(),
            total,
            &b.protected_tokens,
            "protected_data_array",
            "protected_data",
        ),
        "reveal": batch_side(
            b.reveal_response.status,
            b.reveal_response.body_json(),
            total,
            &b.restored_values,
            "data_array",
            "data",
        ),
        "time_s": b.elapsed.as_secs_f64(),
    });
    pretty_json(&out)
}

pub fn render_run_summary(stats: &RunStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        "Protect/Reveal Round-Trip Results".bold().cyan()
    ));
    out.push_str(&section_header(&"Summary".bold().yellow().to_string()));
    out.push_str(&format!("Iterations attempted: {}\n", stats.attempted));
    out.push_str(&format!(
        "Successful (both 2xx): {} ({})\n",
        stats.successful, stats.success_percentage
    ));
    out.push_str(&format!(
        "Revealed matched original data: {} ({})\n",
        stats.matched, stats.match_percentage
    ));
    out.push_str(&format!("Total time: {}\n", secs(stats.total)));
    out.push_str(&format!("Average per-iteration time: {}\n", secs(stats.average)));
    out
}

pub fn render_bulk_summary(stats: &BulkStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        "Protect/Reveal Round-Trip Results".bold().cyan()
    ));
    out.push_str(&section_header(
        &"Bulk run summary".bold().yellow().to_string(),
    ));
    out.push_str(&format!("Batches processed: {}\n", stats.batches));
    out.push_str(&format!("Items processed: {}\n", stats.items));
    out.push_str(&format!(
        "Successful batches (both 2xx): {}\n",
        stats.successful_batches
    ));
    out.push_str(&format!(
        "Items revealed matching input: {} ({})\n",
        stats.matched_items, stats.match_percentage
    ));
    out.push_str(&format!(
        "Total bulk time (sum of batch times): {}\n",
        secs(stats.total)
    ));
    out.push_str(&format!("Average batch time: {}\n", secs(stats.average_batch)));
    out
}
