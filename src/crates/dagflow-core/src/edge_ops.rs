//! Edge operator: rename / transform / filter applied to one inbound edge's
//! upstream value (§4.2).

use crate::graph::{Edge, NodeId};
use serde_json::Value;

/// Apply one edge's shaping to an upstream value, yielding the `(key,
/// value)` contribution to the consumer's input mapping, or `None` if the
/// edge's filter omitted it.
///
/// `transform` always runs before `filter` — this order is observable.
pub(crate) fn apply(edge: &Edge, producer: &NodeId, value: Value) -> Option<(String, Value)> {
    let (transform, filter, name) = match &edge.options {
        Some(opts) => (opts.transform.as_ref(), opts.filter.as_ref(), opts.name.as_ref()),
        None => (None, None, None),
    };

    let value = match transform {
        Some(t) => t(value),
        None => value,
    };

    if let Some(f) = filter {
        if !f(&value) {
            return None;
        }
    }

    let key = name.cloned().unwrap_or_else(|| producer.clone());
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeOptions;
    use serde_json::json;

    #[test]
    fn default_key_is_producer_id() {
        let edge = Edge::new("a", "b");
        let (key, value) = apply(&edge, &"a".to_string(), json!(5)).unwrap();
        assert_eq!(key, "a");
        assert_eq!(value, json!(5));
    }

    #[test]
    fn rename_overrides_key() {
        let edge = Edge::with_options("a", "b", EdgeOptions::new().name("n1"));
        let (key, _) = apply(&edge, &"a".to_string(), json!(5)).unwrap();
        assert_eq!(key, "n1");
    }

    #[test]
    fn transform_runs_before_filter() {
        let edge = Edge::with_options(
            "a",
            "b",
            EdgeOptions::new()
                .transform(|v| json!(v.as_i64().unwrap() * 2))
                .filter(|v| v.as_i64().unwrap() % 2 == 0),
        );
        // raw value 3 is odd, but transform doubles it to 6 before the filter runs
        assert!(apply(&edge, &"a".to_string(), json!(3)).is_some());
    }

    #[test]
    fn filter_omits_the_contribution() {
        let edge = Edge::with_options("a", "b", EdgeOptions::new().filter(|v| v.as_i64().unwrap() % 2 != 0));
        assert!(apply(&edge, &"a".to_string(), json!(2)).is_none());
        assert!(apply(&edge, &"a".to_string(), json!(1)).is_some());
    }
}
