// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repair and validation of raw model output.
//!
//! Models wrap JSON in markdown fences, prefix it with prose, forget ids or
//! number them twice. [`normalize`] cuts the text down to the outermost JSON
//! array, checks that it is a non-empty array of objects, and guarantees that
//! every record carries a numeric `id` unique within the result.

use std::collections::HashSet;

use mockgen_core::types::{FieldValue, GeneratedRecord};
use mockgen_core::MockgenError;
use serde_json::Value;

/// Parse raw provider text into records.
///
/// Records whose `id` is missing or not numeric get `index + 1`. If the ids
/// still collide afterwards, every record is renumbered from 1.
pub fn normalize(raw: &str) -> Result<Vec<GeneratedRecord>, MockgenError> {
    let body = array_slice(raw)
        .ok_or_else(|| MockgenError::MalformedOutput("no JSON array in model output".into()))?;

    let value: Value = serde_json::from_str(body)
        .map_err(|e| MockgenError::MalformedOutput(format!("invalid JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(MockgenError::MalformedOutput(
            "top-level value is not an array".into(),
        ));
    };
    if items.is_empty() {
        return Err(MockgenError::MalformedOutput("array is empty".into()));
    }

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(MockgenError::MalformedOutput(format!(
                "element {index} is not an object"
            )));
        }
        let mut record: GeneratedRecord = serde_json::from_value(item).map_err(|e| {
            MockgenError::MalformedOutput(format!("element {index} is not a record: {e}"))
        })?;
        if !record.id().is_some_and(FieldValue::is_number) {
            record.set_id(sequential_id(index));
        }
        records.push(record);
    }

    if has_duplicate_ids(&records) {
        for (index, record) in records.iter_mut().enumerate() {
            record.set_id(sequential_id(index));
        }
    }

    Ok(records)
}

/// Truncate `records` to the requested count. Shorter results are kept as-is.
pub fn fit_to_count(mut records: Vec<GeneratedRecord>, expected: u32) -> Vec<GeneratedRecord> {
    records.truncate(expected as usize);
    records
}

/// From the first `[` to the last `]`, inclusive.
fn array_slice(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (start < end).then(|| &raw[start..=end])
}

fn sequential_id(index: usize) -> i64 {
    i64::try_from(index).map_or(i64::MAX, |i| i.saturating_add(1))
}

fn has_duplicate_ids(records: &[GeneratedRecord]) -> bool {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter_map(GeneratedRecord::id)
        .any(|id| !seen.insert(id_key(id)))
}

// 1 and 1.0 are the same id.
fn id_key(id: &FieldValue) -> String {
    match id {
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Unsigned(u) => u.to_string(),
        FieldValue::Float(f) => f.to_string(),
        other => format!("{other:?}"),
    }
}
