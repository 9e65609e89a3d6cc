use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::{header::HeaderMap, redirect, Client};
use tracing::{debug, warn};

use super::models::{BodyPayload, ExecutionResult, MaterializedRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 3;

pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}

/// Executes one materialized request. Non-2xx statuses are results, not
/// errors; transport faults (DNS, refused connection, timeout) are caught
/// here and converted into a `status = 0` result carrying the fault
/// message. Wall-clock time is measured from just before dispatch to the
/// response or the fault, whichever comes first.
pub async fn dispatch(client: &Client, request: MaterializedRequest) -> ExecutionResult {
    debug!(method = %request.method, url = %request.url, name = %request.name, "dispatching");
    let start = Instant::now();

    match send(client, &request).await {
        Ok(response) => {
            let elapsed_ms = elapsed_ms(start);
            debug!(status = response.status, elapsed_ms, name = %request.name, "response received");
            ExecutionResult {
                name: request.name,
                method: request.method.to_string(),
                url: request.url,
                status: response.status,
                status_text: response.status_text,
                response_time_ms: elapsed_ms,
                success: (200..300).contains(&response.status),
                error: None,
                response_size: response.body.len(),
                response_data: render_body(&response.body),
                response_headers: response.headers,
                original_request: request.original,
            }
        }
        Err(error) => {
            let elapsed_ms = elapsed_ms(start);
            let message = format!("{error:#}");
            warn!(error = %message, elapsed_ms, name = %request.name, "request failed");
            ExecutionResult {
                name: request.name,
                method: request.method.to_string(),
                url: request.url,
                status: 0,
                status_text: "Request Failed".to_string(),
                response_time_ms: elapsed_ms,
                success: false,
                error: Some(message),
                response_size: 0,
                response_data: String::new(),
                response_headers: Vec::new(),
                original_request: request.original,
            }
        }
    }
}

struct RawResponse {
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: String,
}

async fn send(client: &Client, request: &MaterializedRequest) -> Result<RawResponse> {
    let mut builder = client.request(request.method.clone(), &request.url);

    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }

    match &request.body {
        Some(BodyPayload::Text(text)) => {
            builder = builder.body(text.clone());
        }
        Some(BodyPayload::Map(fields)) => {
            builder = builder.body(serde_json::to_string(fields)?);
        }
        None => {}
    }

    let response = builder.send().await?;
    let status = response.status();
    let headers = collect_headers(response.headers());
    let body = response.text().await?;

    Ok(RawResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        headers,
        body,
    })
}

/// Structured payloads are stored pretty-printed; anything else verbatim.
fn render_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_body_pretty_prints_json() {
        let rendered = render_body(r#"{"a":1,"b":[2,3]}"#);
        assert!(rendered.contains("\n"));
        assert!(rendered.contains("\"a\": 1"));
    }

    #[test]
    fn render_body_keeps_plain_text_verbatim() {
        assert_eq!(render_body("hello world"), "hello world");
    }

    #[test]
    fn collect_headers_preserves_values() {
        let mut map = HeaderMap::new();
        map.insert("X-Test", "value".parse().unwrap());
        map.insert("content-type", "application/json".parse().unwrap());

        let headers = collect_headers(&map);
        assert!(headers
            .iter()
            .any(|(name, value)| name == "x-test" && value == "value"));
        assert!(headers
            .iter()
            .any(|(name, value)| name == "content-type" && value == "application/json"));
    }
}
