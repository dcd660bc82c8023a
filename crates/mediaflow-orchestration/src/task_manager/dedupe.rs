//! Deduplication key derivation, pulled out of the Task Manager proper
//! so it is independently unit-testable — the reference implementation
//! keeps this logic as an inline closure inside `find_task_by_params`.

use serde_json::Value;

/// The canonical identity of a submission for dedupe/recycle purposes.
/// Two tasks of the same `type` sharing a `DedupeKey` are considered
/// the same submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeKey(String);

/// Derive the comparison key for a task's `request_params`:
/// 1. if `params.steps[0]` is a `download` step with a `url`, that URL;
/// 2. else if `params.url` exists, that URL;
/// 3. else the canonical (sorted-key) JSON encoding of `params`.
pub fn dedupe_key(params: &Value) -> DedupeKey {
    if let Some(url) = first_download_step_url(params) {
        return DedupeKey(url.to_string());
    }
    if let Some(url) = params.get("url").and_then(Value::as_str) {
        return DedupeKey(url.to_string());
    }
    // `serde_json::Value::Object` is backed by a `BTreeMap` (this
    // workspace never enables the `preserve_order` feature), so
    // `to_string()` already yields a sorted-key canonical encoding.
    DedupeKey(params.to_string())
}

fn first_download_step_url(params: &Value) -> Option<&str> {
    let steps = params.get("steps")?.as_array()?;
    let first = steps.first()?;
    if first.get("step_name")?.as_str()? != "download" {
        return None;
    }
    first.get("params")?.get("url")?.as_str()
}
