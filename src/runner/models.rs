use std::collections::{BTreeMap, HashMap};

use reqwest::Method;
use serde::Serialize;

use crate::collection::{BodySpec, KeyValue};

/// Outcome of one leaf request. Created once per leaf and never mutated;
/// a run always yields exactly one of these per leaf, whether the request
/// succeeded, failed at the server, or never reached the network.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub name: String,
    pub method: String,
    pub url: String,
    /// 0 when the request never reached the network.
    pub status: u16,
    pub status_text: String,
    pub response_time_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_size: usize,
    pub response_data: String,
    pub response_headers: Vec<(String, String)>,
    pub original_request: OriginalRequest,
}

/// Echo of the declarative request as submitted, before substitution.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalRequest {
    pub headers: Vec<KeyValue>,
    pub body: Option<BodySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub average_response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub summary: ExecutionSummary,
    pub results: Vec<ExecutionResult>,
}

/// A leaf request after substitution, ready for dispatch.
#[derive(Debug, Clone)]
pub struct MaterializedRequest {
    pub name: String,
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<BodyPayload>,
    pub original: OriginalRequest,
}

/// Body as the dispatcher sends it: raw text, or a field map serialized as
/// a JSON object (the behavior the historical runner exhibited for form
/// modes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPayload {
    Text(String),
    Map(BTreeMap<String, String>),
}
