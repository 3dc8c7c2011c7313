//! JSON schemas for structured model output, generated from Rust types with
//! `schemars` and rewritten into the strict dialect chat-completion endpoints
//! accept: every object closed, every property required, no `$ref`s.

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keywords strict mode rejects.
const UNSUPPORTED_KEYWORDS: &[&str] = &["format", "$schema"];

pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn response_schema() -> Value {
        let mut value = schema_for!(Self).to_value();

        let definitions = match &value {
            Value::Object(map) => map.get("$defs").or_else(|| map.get("definitions")).cloned(),
            _ => None,
        };
        if let Some(defs) = definitions {
            inline_refs(&mut value, &defs);
        }
        if let Value::Object(map) = &mut value {
            map.remove("$defs");
            map.remove("definitions");
        }
        close_objects(&mut value);
        strip_keywords(&mut value);

        value
    }

    fn response_name() -> String {
        <Self as JsonSchema>::schema_name().into_owned()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                let name = ref_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(ref_path.as_str());
                if let Some(Value::Object(def)) = definitions.get(name) {
                    let mut inlined = def.clone();
                    // Keep sibling keywords such as a field's description.
                    for (k, v) in map.iter() {
                        if k != "$ref" {
                            inlined.entry(k.clone()).or_insert_with(|| v.clone());
                        }
                    }
                    *value = Value::Object(inlined);
                    inline_refs(value, definitions);
                    return;
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(props)) = map.get("properties") {
                let all_keys: Vec<Value> = props.keys().cloned().map(Value::String).collect();
                map.insert("required".to_string(), Value::Array(all_keys));
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for (_, v) in map.iter_mut() {
                close_objects(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                close_objects(item);
            }
        }
        _ => {}
    }
}

fn strip_keywords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            // A property may itself be named "format"; its schema is an object.
            map.retain(|k, v| !(UNSUPPORTED_KEYWORDS.contains(&k.as_str()) && !v.is_object()));
            for (_, v) in map.iter_mut() {
                strip_keywords(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                strip_keywords(item);
            }
        }
        _ => {}
    }
}
