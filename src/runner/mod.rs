mod dispatch;
mod materialize;
mod models;
mod printer;
mod summary;
mod url;
mod walker;

use thiserror::Error;
use tracing::info;

use crate::collection::{count_requests, Collection};
use crate::vars::VarMap;

pub use dispatch::{build_client, dispatch};
pub use materialize::materialize;
pub use models::{
    BodyPayload, ExecutionResult, ExecutionSummary, MaterializedRequest, OriginalRequest,
    RunReport,
};
pub use printer::print_run_report;
pub use summary::summarize;
pub use url::build_url;

/// Structural failures: the only error class that rejects a run before any
/// request executes. Everything downstream is recovered per item and
/// represented as an `ExecutionResult`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("collection has no requests to execute")]
    EmptyCollection,
    #[error("building HTTP client")]
    Client(#[from] reqwest::Error),
}

/// Executes every leaf request in the collection, strictly sequentially,
/// and always completes with a full report once it starts: partial
/// failures are data, not errors.
pub async fn run(collection: &Collection, vars: &VarMap) -> Result<RunReport, RunError> {
    run_with_observer(collection, vars, |_| {}).await
}

/// Like [`run`], but invokes `observe` with each result as it completes.
/// The CLI uses this to advance its progress bar between requests.
pub async fn run_with_observer<F>(
    collection: &Collection,
    vars: &VarMap,
    mut observe: F,
) -> Result<RunReport, RunError>
where
    F: FnMut(&ExecutionResult) + Send,
{
    if collection.items.is_empty() {
        return Err(RunError::EmptyCollection);
    }

    let client = build_client()?;
    info!(
        collection = collection.info.title(),
        total = count_requests(&collection.items),
        "starting collection run"
    );

    let mut results = Vec::new();
    walker::walk(
        &client,
        &collection.items,
        vars,
        String::new(),
        &mut results,
        &mut observe,
    )
    .await;

    let summary = summarize(&results);
    info!(
        total = summary.total_requests,
        failed = summary.failed_requests,
        average_ms = summary.average_response_time_ms,
        "collection run finished"
    );

    Ok(RunReport { summary, results })
}
