use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed Postman-style collection: metadata plus an ordered tree of
/// folders and request definitions.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub info: CollectionInfo,
    #[serde(rename = "item")]
    pub items: Vec<CollectionNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectionInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schema: Option<String>,
}

impl CollectionInfo {
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled Collection")
    }
}

/// One node of the collection tree. A node is exactly one of folder or
/// request; the raw-item conversion rejects anything ambiguous.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawItem")]
pub enum CollectionNode {
    Folder {
        name: String,
        children: Vec<CollectionNode>,
    },
    Request {
        name: String,
        request: RequestSpec,
    },
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    request: Option<RequestSpec>,
    #[serde(default)]
    item: Option<Vec<CollectionNode>>,
}

impl TryFrom<RawItem> for CollectionNode {
    type Error = String;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let name = raw.name.unwrap_or_default();
        match (raw.request, raw.item) {
            (Some(request), None) => Ok(Self::Request { name, request }),
            (None, Some(children)) => Ok(Self::Folder { name, children }),
            (Some(_), Some(_)) => Err(format!(
                "collection item {name:?} has both a request and child items"
            )),
            (None, None) => Err(format!(
                "collection item {name:?} has neither a request nor child items"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestSpec {
    pub method: Option<String>,
    pub url: Option<UrlSpec>,
    pub header: Vec<KeyValue>,
    pub body: Option<BodySpec>,
}

/// Postman URLs appear either as a bare string or as a structured object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UrlSpec {
    Raw(String),
    Detailed(UrlParts),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UrlParts {
    pub raw: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<Segments>,
    pub port: Option<Port>,
    pub path: Option<Segments>,
    pub query: Vec<KeyValue>,
}

/// Host and path components come as a single string or a list of segments.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Segments {
    One(String),
    Many(Vec<String>),
}

impl Segments {
    pub fn join(&self, separator: &str) -> String {
        match self {
            Self::One(value) => value.clone(),
            Self::Many(values) => values.join(separator),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Port {
    Number(u64),
    Text(String),
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

/// Request body, tagged by Postman's `mode` field. Unknown modes degrade to
/// no body rather than failing the whole collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BodySpec {
    Raw {
        #[serde(default)]
        raw: String,
    },
    Formdata {
        #[serde(default)]
        formdata: Vec<KeyValue>,
    },
    Urlencoded {
        #[serde(default)]
        urlencoded: Vec<KeyValue>,
    },
    #[serde(other)]
    Other,
}

/// A key/value entry from headers, query parameters, or form fields.
/// Entries missing either side are skipped downstream, not rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyValue {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Counts leaf requests across the whole tree.
pub fn count_requests(nodes: &[CollectionNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            CollectionNode::Request { .. } => 1,
            CollectionNode::Folder { children, .. } => count_requests(children),
        })
        .sum()
}
