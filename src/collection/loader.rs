use std::path::Path;

use anyhow::{Context, Result};

use super::Collection;

/// Parses and structurally validates collection JSON. Missing `info` or
/// `item`, or a node that is not exactly one of folder/request, is a
/// structural failure surfaced before any run starts.
pub fn parse_collection(content: &str) -> Result<Collection> {
    serde_json::from_str(content).context("invalid collection format")
}

pub fn load_collection_file(path: &Path) -> Result<Collection> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading collection {}", path.display()))?;
    parse_collection(&content)
        .with_context(|| format!("parsing collection {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_collection_requires_info_and_items() {
        assert!(parse_collection(r#"{"item":[]}"#).is_err());
        assert!(parse_collection(r#"{"info":{"name":"X"}}"#).is_err());
        assert!(parse_collection(r#"{"info":{"name":"X"},"item":[]}"#).is_ok());
    }

    #[test]
    fn parse_collection_rejects_malformed_json() {
        let err = parse_collection("not json").unwrap_err();
        assert!(err.to_string().contains("invalid collection format"));
    }

    #[test]
    fn load_collection_file_reports_the_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing.json");
        let err = load_collection_file(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
