//! Layered merging of definition files.
//!
//! A project definition may be spread over the user's global config, the
//! project's `kettle.yml` and a machine-local `kettle.local.yml`. Later
//! layers win:
//!
//! - mappings merge key by key
//! - sequences are replaced whole, so a local file can redefine `steps`
//! - an explicit `null` removes the inherited key
//! - any other value replaces the inherited one

use serde_yaml::Value;

/// Merge `overlay` on top of `base`.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut merged = base_map.clone();

            for (key, value) in overlay_map {
                if value.is_null() {
                    merged.remove(key);
                    continue;
                }
                let next = match base_map.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }

            Value::Mapping(merged)
        }

        // An empty layer (a blank file) contributes nothing.
        (base, Value::Null) => base.clone(),

        (_, overlay) => overlay.clone(),
    }
}

/// Fold layers in order, first is lowest priority.
pub fn merge_layers(layers: &[Value]) -> Value {
    layers
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, layer| {
            deep_merge(&acc, layer)
        })
}
