// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output extraction, validation, retry, and rate limiting (C8), grounded in
//! `original_source/src/amon/taskgraph2/node_executor.py`. Pure with respect
//! to LLM transport, cancellation, and filesystem — the runtime (C7) owns
//! those.

use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::TaskGraphError;
use crate::schema::{TaskNodeOutput, TaskNodeRetry};

/// One numeric-anomaly warning surfaced from a node's extracted output.
/// Non-fatal; the caller decides whether to log or append a run event.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericAnomaly {
    pub path: String,
    pub value: String,
    pub reason: &'static str,
}

/// Retries an LLM call up to `retry.max_attempts`, injecting a
/// `[repair_error]` message on each retry and honoring an optional
/// minimum call interval. `generate` is invoked once per attempt with the
/// accumulated message list.
pub struct NodeExecutor {
    min_call_interval: Duration,
    last_call_started_at: Mutex<Option<Instant>>,
}

impl NodeExecutor {
    pub fn new(min_call_interval: Duration) -> Self {
        Self {
            min_call_interval,
            last_call_started_at: Mutex::new(None),
        }
    }

    /// `on_retry` is invoked once per non-final failed attempt, with the
    /// 1-based attempt number that just failed and the error that caused
    /// it — the caller's hook for recording a `node_retry` event, matching
    /// `original_source`'s `on_retry` callback.
    pub async fn run_llm_with_retry<F, Fut>(
        &self,
        base_messages: &[(String, String)],
        output_spec: &TaskNodeOutput,
        retry_spec: &TaskNodeRetry,
        mut generate: F,
        mut on_retry: impl FnMut(u32, &TaskGraphError),
    ) -> Result<(String, Value, Vec<NumericAnomaly>), TaskGraphError>
    where
        F: FnMut(Vec<(String, String)>) -> Fut,
        Fut: Future<Output = Result<String, TaskGraphError>>,
    {
        let attempts = retry_spec.max_attempts.max(1);
        let mut last_error: Option<TaskGraphError> = None;

        for attempt in 1..=attempts {
            self.apply_rate_limit().await;

            let mut messages = base_messages.to_vec();
            if let Some(error) = &last_error {
                messages.push(("user".to_string(), format!("[repair_error]\n{error}")));
            }

            let output_text = generate(messages).await?;
            match extract_output(&output_text, &output_spec.r#type)
                .and_then(|extracted| validate_output(&extracted, output_spec).map(|_| extracted))
            {
                Ok(extracted) => {
                    let anomalies = collect_numeric_anomalies(&extracted, "$");
                    return Ok((output_text, extracted, anomalies));
                }
                Err(error) => {
                    if attempt >= attempts {
                        last_error = Some(error);
                        break;
                    }
                    on_retry(attempt, &error);
                    last_error = Some(error);
                    let backoff = retry_spec.backoff_s.max(0.0);
                    if backoff > 0.0 {
                        tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
                    }
                }
            }
        }

        Err(TaskGraphError::ValidationFailed(format!(
            "node execution failed after retries: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn apply_rate_limit(&self) {
        if self.min_call_interval.is_zero() {
            *self.last_call_started_at.lock() = Some(Instant::now());
            return;
        }
        let wait = {
            let mut guard = self.last_call_started_at.lock();
            let now = Instant::now();
            let wait = guard
                .map(|last| self.min_call_interval.saturating_sub(now.duration_since(last)))
                .unwrap_or(Duration::ZERO);
            *guard = Some(now + wait);
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Attempts strict JSON decode; on failure, locates the first balanced
/// `{…}` or `[…]` span and retries. Non-`json` output types pass through
/// as a JSON string.
pub fn extract_output(text: &str, expected_type: &str) -> Result<Value, TaskGraphError> {
    if expected_type != "json" {
        return Ok(Value::String(text.to_string()));
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if end > start {
                let candidate = &text[start..=end];
                if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                    return Ok(value);
                }
            }
        }
    }

    Err(TaskGraphError::ExtractionFailed(format!(
        "json extraction failed: length={}, object_start={:?}, object_end={:?}, array_start={:?}, array_end={:?}",
        text.len(),
        text.find('{'),
        text.rfind('}'),
        text.find('['),
        text.rfind(']'),
    )))
}

/// Validates `required_keys` membership and a `types` map of
/// `{string,integer,number,boolean,object,array,null}` against `output`.
/// Unknown expected-type aliases pass unconditionally.
pub fn validate_output(output: &Value, output_spec: &TaskNodeOutput) -> Result<(), TaskGraphError> {
    let Some(schema) = output_spec.schema.as_ref().and_then(Value::as_object) else {
        return Ok(());
    };

    if let Some(required_keys) = schema.get("required_keys").and_then(Value::as_array) {
        let Some(obj) = output.as_object() else {
            return Err(TaskGraphError::ValidationFailed("required_keys requires dict output".to_string()));
        };
        let missing: Vec<String> = required_keys
            .iter()
            .filter_map(Value::as_str)
            .filter(|key| !obj.contains_key(*key))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(TaskGraphError::ValidationFailed(format!("missing required keys: {missing:?}")));
        }
    }

    if let Some(type_map) = schema.get("types").and_then(Value::as_object) {
        let Some(obj) = output.as_object() else {
            return Err(TaskGraphError::ValidationFailed("types validation requires dict output".to_string()));
        };
        for (key, expected) in type_map {
            let Some(actual) = obj.get(key) else { continue };
            let expected_str = expected.as_str().unwrap_or_default();
            if !matches_type(actual, expected_str) {
                return Err(TaskGraphError::ValidationFailed(format!(
                    "type mismatch for key='{key}': expected={expected_str}, actual={actual}"
                )));
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    let normalized = match expected.trim().to_lowercase().as_str() {
        "str" => "string".to_string(),
        "int" => "integer".to_string(),
        "bool" => "boolean".to_string(),
        other => other.to_string(),
    };
    match normalized.as_str() {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn collect_numeric_anomalies(value: &Value, path: &str) -> Vec<NumericAnomaly> {
    let mut anomalies = Vec::new();
    walk_numeric_anomalies(value, path, &mut anomalies);
    anomalies
}

fn walk_numeric_anomalies(value: &Value, path: &str, out: &mut Vec<NumericAnomaly>) {
    match value {
        Value::Number(number) => {
            if let Some(f) = number.as_f64() {
                if f.is_nan() || f.is_infinite() || f.abs() > 1e18 {
                    out.push(NumericAnomaly {
                        path: path.to_string(),
                        value: number.to_string(),
                        reason: "nan_or_inf_or_out_of_bound",
                    });
                }
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                walk_numeric_anomalies(child, &format!("{path}.{key}"), out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                walk_numeric_anomalies(child, &format!("{path}[{idx}]"), out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "node_executor_tests.rs"]
mod tests;
