use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::vars::VarMap;

/// Parses an environment document into a flat variable map.
///
/// Two shapes are accepted: the Postman environment export
/// (`{"values": [{"key", "value", "enabled"}]}`, disabled entries skipped)
/// and a plain JSON object of scalars. Numbers and booleans are
/// stringified; nested values are ignored.
pub fn parse_environment(content: &str) -> Result<VarMap> {
    let value: Value = serde_json::from_str(content).context("invalid environment format")?;
    environment_from_value(&value)
}

pub fn environment_from_value(value: &Value) -> Result<VarMap> {
    let Some(object) = value.as_object() else {
        bail!("environment file should contain key-value pairs");
    };

    if object.contains_key("info") && object.get("item").is_some_and(Value::is_array) {
        bail!("file looks like a collection, not an environment");
    }

    let mut vars = VarMap::new();

    if let Some(values) = object.get("values").and_then(Value::as_array) {
        for entry in values {
            let Some(key) = entry.get("key").and_then(Value::as_str) else {
                continue;
            };
            if entry.get("enabled").and_then(Value::as_bool) == Some(false) {
                continue;
            }
            vars.insert(
                key.to_string(),
                entry.get("value").map(scalar_to_string).unwrap_or_default(),
            );
        }
        return Ok(vars);
    }

    for (key, entry) in object {
        match entry {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                vars.insert(key.clone(), scalar_to_string(entry));
            }
            _ => {}
        }
    }
    Ok(vars)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

pub fn load_environment_file(path: &Path) -> Result<VarMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading environment {}", path.display()))?;
    parse_environment(&content)
        .with_context(|| format!("parsing environment {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postman_environment_values() {
        let vars = parse_environment(
            r#"{"name":"staging","values":[
                {"key":"base","value":"https://api.test","enabled":true},
                {"key":"off","value":"x","enabled":false},
                {"key":"retries","value":3}
            ]}"#,
        )
        .unwrap();
        assert_eq!(vars.get("base").map(String::as_str), Some("https://api.test"));
        assert_eq!(vars.get("retries").map(String::as_str), Some("3"));
        assert!(!vars.contains_key("off"));
    }

    #[test]
    fn parses_flat_key_value_objects() {
        let vars =
            parse_environment(r#"{"host":"localhost","port":9090,"secure":false}"#).unwrap();
        assert_eq!(vars.get("host").map(String::as_str), Some("localhost"));
        assert_eq!(vars.get("port").map(String::as_str), Some("9090"));
        assert_eq!(vars.get("secure").map(String::as_str), Some("false"));
    }

    #[test]
    fn nested_values_are_ignored() {
        let vars = parse_environment(r#"{"ok":"1","nested":{"a":"b"}}"#).unwrap();
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn rejects_collections_uploaded_as_environments() {
        let err = parse_environment(r#"{"info":{"name":"C"},"item":[]}"#).unwrap_err();
        assert!(err.to_string().contains("looks like a collection"));
    }

    #[test]
    fn rejects_non_object_documents() {
        let err = parse_environment(r#"["a","b"]"#).unwrap_err();
        assert!(err.to_string().contains("key-value pairs"));
    }
}
