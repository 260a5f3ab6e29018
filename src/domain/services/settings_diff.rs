use serde_json::Value;
use std::collections::BTreeSet;

/// Field names expected in a health_profile settings blob. Diffing is
/// restricted to these (plus non-numeric extras) so history entries are
/// not polluted with array-index artifacts.
pub const EXPECTED_FIELDS: [&str; 10] = [
    "hasSickness",
    "sicknessType",
    "age",
    "gender",
    "height",
    "weight",
    "waist",
    "activityLevel",
    "goal",
    "location",
];

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Field names whose values differ between the previous and next
/// settings blobs. On a first save (or when nothing differs) falls back
/// to the populated expected fields of the new value.
pub fn changed_fields(previous: &Value, next: &Value) -> Vec<String> {
    let prev_map = previous.as_object();
    let next_map = match next.as_object() {
        Some(m) => m,
        None => return Vec::new(),
    };

    let mut changed: Vec<String> = Vec::new();

    if let Some(prev_map) = prev_map.filter(|m| !m.is_empty()) {
        let all_keys: BTreeSet<&String> = prev_map.keys().chain(next_map.keys()).collect();
        for key in all_keys {
            if !EXPECTED_FIELDS.contains(&key.as_str()) && is_numeric_key(key) {
                continue;
            }
            let old_value = prev_map.get(key.as_str()).unwrap_or(&Value::Null);
            let new_value = next_map.get(key.as_str()).unwrap_or(&Value::Null);
            if old_value != new_value {
                changed.push(key.clone());
            }
        }
    } else {
        changed = populated_expected_fields(next_map);
    }

    if changed.is_empty() {
        changed = populated_expected_fields(next_map);
    }
    if changed.is_empty() {
        changed = next_map
            .iter()
            .filter(|(k, v)| !is_numeric_key(k) && has_value(v))
            .map(|(k, _)| k.clone())
            .collect();
    }

    changed
}

fn populated_expected_fields(map: &serde_json::Map<String, Value>) -> Vec<String> {
    EXPECTED_FIELDS
        .iter()
        .filter(|field| map.get(**field).map(has_value).unwrap_or(false))
        .map(|field| field.to_string())
        .collect()
}

/// Drops `"<n> (removed)"` artifact entries left behind by older clients
/// that diffed arrays element-by-element.
pub fn meaningful_fields(fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .filter(|field| {
            match field.strip_suffix("(removed)") {
                Some(prefix) => {
                    let prefix = prefix.trim_end();
                    !(is_numeric_key(prefix))
                }
                None => true,
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_field_change_is_recorded_alone() {
        let previous = json!({"age": 30, "gender": "male", "goal": "maintain"});
        let next = json!({"age": 31, "gender": "male", "goal": "maintain"});
        assert_eq!(changed_fields(&previous, &next), vec!["age".to_string()]);
    }

    #[test]
    fn first_save_records_populated_expected_fields() {
        let next = json!({"age": 28, "gender": "female", "height": null, "location": ""});
        let fields = changed_fields(&json!({}), &next);
        assert_eq!(fields, vec!["age".to_string(), "gender".to_string()]);
    }

    #[test]
    fn numeric_artifact_keys_are_ignored_in_diff() {
        let previous = json!({"age": 30, "0": "a"});
        let next = json!({"age": 30, "0": "b"});
        // The only difference is a numeric key, so the fallback kicks in.
        assert_eq!(changed_fields(&previous, &next), vec!["age".to_string()]);
    }

    #[test]
    fn unchanged_save_falls_back_to_populated_fields() {
        let settings = json!({"age": 30, "goal": "bulk"});
        let fields = changed_fields(&settings.clone(), &settings);
        assert_eq!(fields, vec!["age".to_string(), "goal".to_string()]);
    }

    #[test]
    fn unexpected_non_numeric_fields_still_diff() {
        let previous = json!({"age": 30, "customNote": "x"});
        let next = json!({"age": 30, "customNote": "y"});
        assert_eq!(changed_fields(&previous, &next), vec!["customNote".to_string()]);
    }

    #[test]
    fn removed_artifacts_are_filtered() {
        let fields = vec![
            "age".to_string(),
            "0 (removed)".to_string(),
            "12 (removed)".to_string(),
            "goal".to_string(),
        ];
        assert_eq!(meaningful_fields(&fields), vec!["age".to_string(), "goal".to_string()]);
    }
}
