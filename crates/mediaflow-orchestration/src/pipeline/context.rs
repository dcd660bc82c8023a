//! The mutable bag passed through a pipeline run.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry in the execution trace, appended after each step.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TraceEntry {
    pub step: String,
    pub duration_seconds: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: f64,
}

/// Created fresh by the Pipeline Runner at the start of a run; never
/// shared across runs.
#[derive(Debug, Default)]
pub struct PipelineContext {
    data: BTreeMap<String, Value>,
    pub history: Vec<String>,
    pub trace: Vec<TraceEntry>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes `value` to JSON and stores it under `key`. Panics only
    /// if `value`'s `Serialize` impl itself fails, which none of the
    /// bundled steps' output types can do (plain structs/strings/vecs).
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) {
        let value = serde_json::to_value(value).expect("pipeline context value must serialize");
        self.data.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn add_trace(
        &mut self,
        step: impl Into<String>,
        duration_seconds: f64,
        status: impl Into<String>,
        error: Option<String>,
        timestamp: f64,
    ) {
        self.trace.push(TraceEntry {
            step: step.into(),
            duration_seconds,
            status: status.into(),
            error,
            timestamp,
        });
    }
}
