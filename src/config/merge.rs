//! Configuration merge logic
//!
//! Partial option layers are folded left to right with:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)
//! - Null: skipped (never erases an earlier value)
//! - Containers with nothing underneath: copied whole

use serde_json::{Map, Value};

/// Merge `overlay` into `base` in place.
///
/// Merge semantics:
/// - Null overlay values are skipped wherever both sides are objects
/// - Objects on both sides: deep-merge by key (recursive)
/// - Object overlay with no object underneath: copied as-is, nulls included
/// - Everything else (scalars, arrays, type changes): overlay wins
///
/// Falsy but present values (`false`, `0`, `""`) are not skipped.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Null => {}
        Value::Object(overlay_map) => {
            if !base.is_object() {
                *base = Value::Object(overlay_map);
                return;
            }
            if let Value::Object(base_map) = base {
                for (key, overlay_value) in overlay_map {
                    if overlay_value.is_null() {
                        continue;
                    }
                    match base_map.get_mut(&key) {
                        Some(slot) => deep_merge(slot, overlay_value),
                        None => {
                            base_map.insert(key, overlay_value);
                        }
                    }
                }
            }
        }
        overlay => *base = overlay,
    }
}

/// Merge multiple layers in order (first is base, last has highest precedence).
///
/// The fold starts from an empty object, so an empty list yields `{}`.
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), |mut merged, layer| {
            deep_merge(&mut merged, layer);
            merged
        })
}
