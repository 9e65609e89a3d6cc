use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Client;
use tracing::warn;

use crate::collection::{CollectionNode, RequestSpec};
use crate::vars::VarMap;

use super::dispatch::dispatch;
use super::materialize::materialize;
use super::models::{ExecutionResult, OriginalRequest};
use super::url::build_url;

/// Recursive descent over one sibling sequence. Strictly sequential in
/// declaration order: collections may encode implicit request-order
/// dependencies, so ordering is a correctness requirement here, not an
/// optimization target. The result vector is append-only and owned by the
/// run for its whole duration.
pub(super) fn walk<'a>(
    client: &'a Client,
    nodes: &'a [CollectionNode],
    vars: &'a VarMap,
    parent_path: String,
    results: &'a mut Vec<ExecutionResult>,
    observe: &'a mut (dyn FnMut(&ExecutionResult) + Send),
) -> BoxFuture<'a, ()> {
    async move {
        for node in nodes {
            match node {
                CollectionNode::Request { name, request } => {
                    let display_name = join_path(&parent_path, name);
                    let result = match materialize(request, &display_name, vars) {
                        Ok(materialized) => dispatch(client, materialized).await,
                        // One bad item must not abort the run: record it
                        // and move on to the next sibling.
                        Err(error) => {
                            warn!(name = %display_name, error = %format!("{error:#}"), "item processing failed");
                            processing_failure(&display_name, request, vars, &error)
                        }
                    };
                    observe(&result);
                    results.push(result);
                }
                CollectionNode::Folder { name, children } => {
                    walk(
                        client,
                        children,
                        vars,
                        join_path(&parent_path, name),
                        results,
                        observe,
                    )
                    .await;
                }
            }
        }
    }
    .boxed()
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent} > {name}")
    }
}

fn processing_failure(
    name: &str,
    request: &RequestSpec,
    vars: &VarMap,
    error: &anyhow::Error,
) -> ExecutionResult {
    ExecutionResult {
        name: name.to_string(),
        method: request
            .method
            .clone()
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        url: build_url(request.url.as_ref(), vars),
        status: 0,
        status_text: "Processing Failed".to_string(),
        response_time_ms: 0,
        success: false,
        error: Some(format!("{error:#}")),
        response_size: 0,
        response_data: String::new(),
        response_headers: Vec::new(),
        original_request: OriginalRequest {
            headers: request.header.clone(),
            body: request.body.clone(),
        },
    }
}
