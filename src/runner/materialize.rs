use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use reqwest::Method;

use crate::collection::{BodySpec, KeyValue, RequestSpec};
use crate::vars::{substitute, VarMap};

use super::models::{BodyPayload, MaterializedRequest, OriginalRequest};
use super::url::build_url;

/// Turns a declarative leaf request into an executable specification:
/// method defaulted to GET, URL built and substituted, headers and body
/// substituted. An invalid method name is the materialization failure path
/// the walker isolates per item.
pub fn materialize(
    request: &RequestSpec,
    name: &str,
    vars: &VarMap,
) -> Result<MaterializedRequest> {
    let method_text = request.method.as_deref().unwrap_or("GET");
    let method = Method::from_bytes(method_text.as_bytes())
        .with_context(|| format!("invalid HTTP method {method_text:?}"))?;

    let url = build_url(request.url.as_ref(), vars);
    let mut headers = substitute_headers(&request.header, vars);
    let body = request.body.as_ref().and_then(|body| build_body(body, vars));

    if let Some(body) = &body {
        if !headers.keys().any(|key| key.eq_ignore_ascii_case("content-type")) {
            headers.insert("Content-Type".to_string(), infer_content_type(body).to_string());
        }
    }

    Ok(MaterializedRequest {
        name: name.to_string(),
        method,
        url,
        headers,
        body,
        original: OriginalRequest {
            headers: request.header.clone(),
            body: request.body.clone(),
        },
    })
}

/// Both sides of every header are substituted; entries missing either side
/// are skipped rather than rejected.
fn substitute_headers(entries: &[KeyValue], vars: &VarMap) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for entry in entries {
        let (Some(key), Some(value)) = (&entry.key, &entry.value) else {
            continue;
        };
        headers.insert(substitute(key, vars), substitute(value, vars));
    }
    headers
}

fn build_body(body: &BodySpec, vars: &VarMap) -> Option<BodyPayload> {
    match body {
        BodySpec::Raw { raw } => Some(BodyPayload::Text(substitute(raw, vars))),
        BodySpec::Formdata { formdata } => Some(BodyPayload::Map(substitute_fields(formdata, vars))),
        BodySpec::Urlencoded { urlencoded } => {
            Some(BodyPayload::Map(substitute_fields(urlencoded, vars)))
        }
        BodySpec::Other => None,
    }
}

fn substitute_fields(fields: &[KeyValue], vars: &VarMap) -> BTreeMap<String, String> {
    fields
        .iter()
        .filter_map(|field| match (&field.key, &field.value) {
            (Some(key), Some(value)) => Some((substitute(key, vars), substitute(value, vars))),
            _ => None,
        })
        .collect()
}

/// Advisory only: a raw body that parses as JSON gets `application/json`,
/// anything else `text/plain`. The payload itself is never altered or
/// rejected on a parse failure.
fn infer_content_type(body: &BodyPayload) -> &'static str {
    match body {
        BodyPayload::Map(_) => "application/json",
        BodyPayload::Text(text) => {
            if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                "application/json"
            } else {
                "text/plain"
            }
        }
    }
}
