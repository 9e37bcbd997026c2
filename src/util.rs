//! Small helpers shared across modules.

use serde_json::Value;

/// Joins values into one pipe-separated parameter value.
pub fn concat_params<T, I>(values: I) -> String
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<String>>()
        .join("|")
}

/// Recursive JSON merge used when folding continuation pages: objects merge
/// key-wise, arrays concatenate, anything else takes the newer value.
pub(crate) fn merge_values(base: &mut Value, addition: Value) {
    match (base, addition) {
        (Value::Object(base_map), Value::Object(add_map)) => {
            for (key, value) in add_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base_arr), Value::Array(add_arr)) => {
            base_arr.extend(add_arr);
        }
        (slot, value) => {
            *slot = value;
        }
    }
}
