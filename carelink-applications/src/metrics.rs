//! Grouped rate metrics
//!
//! An endpoint declares which query parameters are optional narrowing
//! filters and which are grouping dimensions. The same row set is then
//! aggregated twice, once with every filter applied and once with only
//! the mandatory scoping, and the two are compared per dimension group
//! to produce completion-style rates.
//!
//! Parameter stripping is pure: `params_base` is a derived map and the
//! caller's parameters are never touched. Groups are matched by
//! dimension-key lookup, so a filtered group can never be attributed to
//! the wrong base group regardless of ordering.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

/// An optional narrowing filter, activated when its parameter appears
/// in the query.
pub struct OptionalFilter<R> {
    pub param: &'static str,
    pub matches: fn(&R, &str) -> bool,
}

/// A grouping dimension, activated by its `group_by_*` parameter.
pub struct GroupDim<R> {
    /// Query parameter that switches the dimension on.
    pub param: &'static str,
    /// Field name used for the dimension in result rows.
    pub field: &'static str,
    pub extract: fn(&R) -> Value,
}

/// The filter and dimension vocabulary of one metrics endpoint.
pub struct MetricsSpec<R> {
    pub filters: Vec<OptionalFilter<R>>,
    pub dimensions: Vec<GroupDim<R>>,
}

/// Aggregation output: applied parameters, the derived base parameters,
/// the filtered total, and one row per base group.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub params: BTreeMap<String, String>,
    pub params_base: BTreeMap<String, String>,
    pub count: u64,
    pub results: Vec<Value>,
}

/// Parameter that prunes result rows below a count floor. Applied after
/// rate computation so it cannot skew base totals.
const MIN_COUNT_PARAM: &str = "min_count";

/// Truthiness for switch-style parameters (`group_by_nurse=true`).
fn param_enabled(value: &str) -> bool {
    !matches!(value, "" | "0" | "false" | "no")
}

/// Aggregate `rows` (already scoped to what the caller may see) against
/// the endpoint's spec and the request's query parameters.
pub fn compute<R>(
    rows: &[R],
    params: &BTreeMap<String, String>,
    spec: &MetricsSpec<R>,
) -> MetricsResponse {
    let optional_names: Vec<&str> = spec.filters.iter().map(|f| f.param).collect();

    let params_base: BTreeMap<String, String> = params
        .iter()
        .filter(|(name, _)| !optional_names.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let active_filters: Vec<(&OptionalFilter<R>, &str)> = spec
        .filters
        .iter()
        .filter_map(|filter| {
            params
                .get(filter.param)
                .map(|value| (filter, value.as_str()))
        })
        .collect();

    let active_dims: Vec<&GroupDim<R>> = spec
        .dimensions
        .iter()
        .filter(|dim| params.get(dim.param).is_some_and(|v| param_enabled(v)))
        .collect();

    let filtered: Vec<&R> = rows
        .iter()
        .filter(|row| {
            active_filters
                .iter()
                .all(|(filter, value)| (filter.matches)(row, value))
        })
        .collect();

    let count = filtered.len() as u64;

    if active_dims.is_empty() {
        return MetricsResponse {
            params: params.clone(),
            params_base,
            count,
            results: Vec::new(),
        };
    }

    let key_of = |row: &R| -> Vec<Value> {
        active_dims.iter().map(|dim| (dim.extract)(row)).collect()
    };

    // Base groups drive the output: every combination seen without the
    // optional filters appears, with a zero count when the filtered set
    // no longer contains it.
    let mut base_order: Vec<Vec<Value>> = Vec::new();
    let mut base_counts: HashMap<String, u64> = HashMap::new();
    for row in rows {
        let key = key_of(row);
        let tag = key_tag(&key);
        if !base_counts.contains_key(&tag) {
            base_order.push(key);
        }
        *base_counts.entry(tag).or_insert(0) += 1;
    }

    let mut filtered_counts: HashMap<String, u64> = HashMap::new();
    for row in &filtered {
        *filtered_counts.entry(key_tag(&key_of(row))).or_insert(0) += 1;
    }

    base_order.sort_by(|a, b| cmp_keys(a, b));

    let min_count = params
        .get(MIN_COUNT_PARAM)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let results = base_order
        .into_iter()
        .filter_map(|key| {
            let tag = key_tag(&key);
            let base_count = base_counts.get(&tag).copied().unwrap_or(0);
            let group_count = filtered_counts.get(&tag).copied().unwrap_or(0);

            let rate = if base_count > 0 {
                Some(group_count as f64 / base_count as f64)
            } else {
                None
            };

            if group_count < min_count {
                return None;
            }

            let mut row = Map::new();
            for (dim, value) in active_dims.iter().zip(key) {
                row.insert(dim.field.to_string(), value);
            }
            row.insert("count".to_string(), Value::from(group_count));
            row.insert("base_count".to_string(), Value::from(base_count));
            row.insert(
                "rate".to_string(),
                rate.map(Value::from).unwrap_or(Value::Null),
            );
            Some(Value::Object(row))
        })
        .collect();

    MetricsResponse {
        params: params.clone(),
        params_base,
        count,
        results,
    }
}

/// Canonical string tag for a dimension key, used for map lookups.
fn key_tag(key: &[Value]) -> String {
    serde_json::to_string(key).unwrap_or_default()
}

fn cmp_keys(a: &[Value], b: &[Value]) -> std::cmp::Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        let ordering = cmp_value(left, right);
        if ordering != std::cmp::Ordering::Equal {
            return ordering;
        }
    }
    a.len().cmp(&b.len())
}

fn cmp_value(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
