//! Normalization of heterogeneous model output into a list of locators.
//!
//! The service may hand back a bare string, a list, a mapping keyed by one
//! of several names, or a handle object. [`STRATEGIES`] lists one extractor
//! per shape in priority order; [`normalize`] returns the first hit.

use serde_json::Value;

use super::service::ModelOutput;

/// One extraction attempt. `None` means "not my shape".
pub type Strategy = fn(&ModelOutput) -> Option<Vec<String>>;

/// Mapping keys that may hold a single locator string, in priority order.
const STRING_KEYS: &[&str] = &["audio", "audio_url", "output", "url"];
/// Mapping keys that may hold a list of locators, in priority order.
const LIST_KEYS: &[&str] = &["audio", "output"];

/// Named strategies in the order they are tried.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("string", bare_string),
    ("list", string_list),
    ("keyed string", keyed_string),
    ("keyed list", keyed_list),
    ("handle", locator_handle),
];

/// Apply [`STRATEGIES`] in order and return the first extraction.
///
/// A returned list may be empty (a list shape with no string entries);
/// callers decide whether that is acceptable.
pub fn normalize(output: &ModelOutput) -> Option<Vec<String>> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let locators = strategy(output)?;
        log::debug!("model output matched '{name}' ({} locator(s))", locators.len());
        Some(locators)
    })
}

fn strings_in(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

pub fn bare_string(output: &ModelOutput) -> Option<Vec<String>> {
    match output {
        ModelOutput::Json(Value::String(s)) => Some(vec![s.clone()]),
        _ => None,
    }
}

pub fn string_list(output: &ModelOutput) -> Option<Vec<String>> {
    match output {
        ModelOutput::Json(Value::Array(items)) => Some(strings_in(items)),
        _ => None,
    }
}

pub fn keyed_string(output: &ModelOutput) -> Option<Vec<String>> {
    let ModelOutput::Json(Value::Object(map)) = output else {
        return None;
    };
    STRING_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(|s| vec![s.to_string()])
}

pub fn keyed_list(output: &ModelOutput) -> Option<Vec<String>> {
    let ModelOutput::Json(Value::Object(map)) = output else {
        return None;
    };
    LIST_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_array))
        .map(|items| strings_in(items))
}

pub fn locator_handle(output: &ModelOutput) -> Option<Vec<String>> {
    match output {
        ModelOutput::Handle(handle) => Some(vec![handle.url()]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::service::LocatorHandle;
    use serde_json::json;
    use std::sync::Arc;

    struct FileOutput(&'static str);

    impl LocatorHandle for FileOutput {
        fn url(&self) -> String {
            self.0.to_string()
        }
    }

    fn json(v: Value) -> ModelOutput {
        ModelOutput::Json(v)
    }

    #[test]
    fn bare_string_is_single_locator() {
        assert_eq!(
            normalize(&json(json!("https://cdn/a.wav"))),
            Some(vec!["https://cdn/a.wav".to_string()])
        );
    }

    #[test]
    fn list_keeps_only_strings() {
        let out = json(json!(["https://cdn/a.wav", 3, null, "https://cdn/b.wav"]));
        assert_eq!(
            normalize(&out),
            Some(vec!["https://cdn/a.wav".into(), "https://cdn/b.wav".into()])
        );
    }

    #[test]
    fn list_without_strings_is_empty_not_none() {
        assert_eq!(normalize(&json(json!([1, 2]))), Some(Vec::new()));
    }

    #[test]
    fn mapping_keys_follow_priority() {
        let out = json(json!({"url": "u", "audio_url": "au", "output": "o"}));
        assert_eq!(normalize(&out), Some(vec!["au".to_string()]));
    }

    #[test]
    fn mapping_with_list_under_known_key() {
        let out = json(json!({"output": ["x", {"nested": true}, "y"]}));
        assert_eq!(normalize(&out), Some(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn mapping_string_wins_over_mapping_list() {
        let out = json(json!({"audio": ["a1"], "url": "u"}));
        assert_eq!(normalize(&out), Some(vec!["u".to_string()]));
    }

    #[test]
    fn handle_yields_its_url() {
        let out = ModelOutput::Handle(Arc::new(FileOutput("https://cdn/h.flac")));
        assert_eq!(normalize(&out), Some(vec!["https://cdn/h.flac".to_string()]));
    }

    #[test]
    fn unrecognized_shapes_are_none() {
        assert_eq!(normalize(&ModelOutput::Empty), None);
        assert_eq!(normalize(&json(json!(42))), None);
        assert_eq!(normalize(&json(json!({"status": "ok"}))), None);
        assert_eq!(normalize(&json(json!({"audio": 7}))), None);
    }

    #[test]
    fn each_strategy_ignores_other_shapes() {
        let handle = ModelOutput::Handle(Arc::new(FileOutput("h")));
        assert_eq!(bare_string(&handle), None);
        assert_eq!(string_list(&json(json!("s"))), None);
        assert_eq!(keyed_string(&json(json!(["s"]))), None);
        assert_eq!(keyed_list(&json(json!({"audio": "s"}))), None);
        assert_eq!(locator_handle(&json(json!("s"))), None);
    }
}
