//! The JSON merge primitive behind composed-value resolution.
//!
//! One rule set for every call site: object keys merge deeply, arrays are
//! replaced wholesale, and a `null` on the patch side deletes the key
//! unless deletion is suppressed, in which case the `null` is written
//! through literally.

use serde_json::{Map, Value};

/// Merge `patch` into `target`.
///
/// With `null_as_delete`, nulls anywhere in the patch delete rather than
/// write, including inside nested objects that do not yet exist in the
/// target, so a patch never materializes a key just to hold `null`.
pub(crate) fn merge_object(
    target: &mut Map<String, Value>,
    patch: &Map<String, Value>,
    null_as_delete: bool,
) {
    for (key, value) in patch {
        match value {
            Value::Null if null_as_delete => {
                target.remove(key);
            }
            Value::Object(patch_child) => match target.get_mut(key) {
                Some(Value::Object(existing)) => {
                    merge_object(existing, patch_child, null_as_delete);
                }
                _ => {
                    let mut fresh = Map::new();
                    merge_object(&mut fresh, patch_child, null_as_delete);
                    target.insert(key.clone(), Value::Object(fresh));
                }
            },
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}
