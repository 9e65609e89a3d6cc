use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::collection::{count_requests, parse_collection, Collection};
use crate::vars::{parse_environment, VarMap};

const COLLECTIONS_DIR: &str = "collections";
const ENVIRONMENTS_DIR: &str = "environments";

/// File-backed store for uploaded collections and environments. Artifacts
/// are keyed by their upload-time millisecond timestamp and kept as the
/// original JSON under `{id}_{sanitized-name}.json`.
pub struct Store {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCollection {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub schema: String,
    pub total_requests: usize,
    pub uploaded_at: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEnvironment {
    pub id: i64,
    pub name: String,
    pub variables: usize,
    pub uploaded_at: String,
    pub filename: String,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn add_collection(&self, source: &Path) -> Result<StoredCollection> {
        let content = fs::read_to_string(source)
            .with_context(|| format!("reading collection {}", source.display()))?;
        let collection = parse_collection(&content)
            .with_context(|| format!("validating collection {}", source.display()))?;

        let id = Utc::now().timestamp_millis();
        let filename = stored_filename(id, source);
        let dir = self.root.join(COLLECTIONS_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating store directory {}", dir.display()))?;
        fs::write(dir.join(&filename), &content)
            .with_context(|| format!("storing collection {filename}"))?;

        Ok(describe_collection(id, &filename, &collection))
    }

    pub fn list_collections(&self) -> Result<Vec<StoredCollection>> {
        let mut collections = Vec::new();
        for (id, path) in self.entries(COLLECTIONS_DIR)? {
            match read_stored_collection(id, &path) {
                Ok(stored) => collections.push(stored),
                Err(error) => {
                    warn!(file = %path.display(), error = %format!("{error:#}"), "skipping unreadable collection");
                }
            }
        }
        collections.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(collections)
    }

    pub fn collection_info(&self, id: &str) -> Result<StoredCollection> {
        let (parsed_id, path) = self.find(COLLECTIONS_DIR, id, "collection")?;
        read_stored_collection(parsed_id, &path)
    }

    pub fn load_collection(&self, id: &str) -> Result<Collection> {
        let (_, path) = self.find(COLLECTIONS_DIR, id, "collection")?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading collection {}", path.display()))?;
        parse_collection(&content).with_context(|| format!("parsing collection {}", path.display()))
    }

    pub fn remove_collection(&self, id: &str) -> Result<()> {
        let (_, path) = self.find(COLLECTIONS_DIR, id, "collection")?;
        fs::remove_file(&path).with_context(|| format!("deleting {}", path.display()))
    }

    pub fn add_environment(&self, source: &Path) -> Result<StoredEnvironment> {
        let content = fs::read_to_string(source)
            .with_context(|| format!("reading environment {}", source.display()))?;
        let vars = parse_environment(&content)
            .with_context(|| format!("validating environment {}", source.display()))?;

        let id = Utc::now().timestamp_millis();
        let filename = stored_filename(id, source);
        let dir = self.root.join(ENVIRONMENTS_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating store directory {}", dir.display()))?;
        fs::write(dir.join(&filename), &content)
            .with_context(|| format!("storing environment {filename}"))?;

        Ok(describe_environment(id, &filename, &content, &vars))
    }

    pub fn list_environments(&self) -> Result<Vec<StoredEnvironment>> {
        let mut environments = Vec::new();
        for (id, path) in self.entries(ENVIRONMENTS_DIR)? {
            match read_stored_environment(id, &path) {
                Ok(stored) => environments.push(stored),
                Err(error) => {
                    warn!(file = %path.display(), error = %format!("{error:#}"), "skipping unreadable environment");
                }
            }
        }
        environments.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(environments)
    }

    pub fn load_environment(&self, id: &str) -> Result<VarMap> {
        let (_, path) = self.find(ENVIRONMENTS_DIR, id, "environment")?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading environment {}", path.display()))?;
        parse_environment(&content)
            .with_context(|| format!("parsing environment {}", path.display()))
    }

    pub fn remove_environment(&self, id: &str) -> Result<()> {
        let (_, path) = self.find(ENVIRONMENTS_DIR, id, "environment")?;
        fs::remove_file(&path).with_context(|| format!("deleting {}", path.display()))
    }

    /// All stored files in a subdirectory as `(id, path)` pairs. Files
    /// without the `{id}_` prefix are ignored.
    fn entries(&self, subdir: &str) -> Result<Vec<(i64, PathBuf)>> {
        let dir = self.root.join(subdir);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in
            fs::read_dir(&dir).with_context(|| format!("listing store {}", dir.display()))?
        {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }
            if let Some(id) = name.split('_').next().and_then(|id| id.parse().ok()) {
                entries.push((id, path));
            }
        }
        Ok(entries)
    }

    fn find(&self, subdir: &str, id: &str, kind: &str) -> Result<(i64, PathBuf)> {
        let prefix = format!("{id}_");
        for (parsed_id, path) in self.entries(subdir)? {
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(&prefix));
            if matches {
                return Ok((parsed_id, path));
            }
        }
        bail!("{kind} {id} not found");
    }
}

fn stored_filename(id: i64, source: &Path) -> String {
    let original = source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.json".to_string());
    let mut sanitized = sanitize(&original);
    if !sanitized.ends_with(".json") {
        sanitized.push_str(".json");
    }
    format!("{id}_{sanitized}")
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn uploaded_at(id: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(id)
        .map(|moment| moment.to_rfc3339())
        .unwrap_or_default()
}

fn describe_collection(id: i64, filename: &str, collection: &Collection) -> StoredCollection {
    StoredCollection {
        id,
        name: collection.info.title().to_string(),
        description: collection.info.description.clone().unwrap_or_default(),
        schema: collection
            .info
            .schema
            .clone()
            .unwrap_or_else(|| "v2.1.0".to_string()),
        total_requests: count_requests(&collection.items),
        uploaded_at: uploaded_at(id),
        filename: filename.to_string(),
    }
}

fn read_stored_collection(id: i64, path: &Path) -> Result<StoredCollection> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let collection =
        parse_collection(&content).with_context(|| format!("parsing {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(describe_collection(id, &filename, &collection))
}

fn describe_environment(id: i64, filename: &str, content: &str, vars: &VarMap) -> StoredEnvironment {
    let name = serde_json::from_str::<serde_json::Value>(content)
        .ok()
        .and_then(|value| value.get("name").and_then(|n| n.as_str()).map(String::from))
        .unwrap_or_else(|| "Untitled Environment".to_string());
    StoredEnvironment {
        id,
        name,
        variables: vars.len(),
        uploaded_at: uploaded_at(id),
        filename: filename.to_string(),
    }
}

fn read_stored_environment(id: i64, path: &Path) -> Result<StoredEnvironment> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let vars =
        parse_environment(&content).with_context(|| format!("parsing {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(describe_environment(id, &filename, &content, &vars))
}
