use serde_json::Value;

/// Overlays `source` onto `target` in place.
///
/// Objects merge key by key, recursively. Any other value replaces the
/// target value wholesale. `null` in `source` never overwrites.
pub fn merge_json(target: &mut Value, source: &Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None if !value.is_null() => {
                        target.insert(key.clone(), value.clone());
                    }
                    None => {}
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
