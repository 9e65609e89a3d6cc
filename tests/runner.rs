use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

use postrun::collection::Collection;
use postrun::runner::{run, run_with_observer, RunError};
use postrun::vars::VarMap;

fn collection(value: serde_json::Value) -> Collection {
    serde_json::from_value(value).expect("collection should parse")
}

fn vars(pairs: &[(&str, &str)]) -> VarMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn nested_folders_produce_path_names_and_mixed_outcomes() {
    let server = MockServer::start_async().await;
    let ok = server
        .mock_async(|when, then| {
            when.method(GET).path("/ok");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"ok":true}"#);
        })
        .await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("gone");
        })
        .await;

    let collection = collection(json!({
        "info": {"name": "Smoke"},
        "item": [
            {"name": "Ping", "request": {"method": "GET", "url": "{{base}}/ok"}},
            {"name": "Auth", "item": [
                {"name": "Login", "request": {"method": "GET", "url": "{{base}}/missing"}}
            ]}
        ]
    }));

    let report = run(&collection, &vars(&[("base", &server.url(""))]))
        .await
        .expect("run should complete");

    assert_eq!(report.results.len(), 2);

    let first = &report.results[0];
    assert_eq!(first.name, "Ping");
    assert_eq!(first.status, 200);
    assert!(first.success);
    assert!(first.error.is_none());
    assert!(first.response_data.contains("\"ok\": true"));

    let second = &report.results[1];
    assert_eq!(second.name, "Auth > Login");
    assert_eq!(second.status, 404);
    assert!(!second.success);
    // server responded but failed: no error field, unlike transport faults
    assert!(second.error.is_none());

    assert_eq!(report.summary.total_requests, 2);
    assert_eq!(report.summary.successful_requests, 1);
    assert_eq!(report.summary.failed_requests, 1);

    ok.assert_async().await;
    missing.assert_async().await;
}

#[tokio::test]
async fn a_processing_failure_never_aborts_the_run() {
    let server = MockServer::start_async().await;
    let hits = server
        .mock_async(|when, then| {
            when.method(GET).path("/ping");
            then.status(200);
        })
        .await;

    let collection = collection(json!({
        "info": {"name": "Isolation"},
        "item": [
            {"name": "First", "request": {"method": "GET", "url": "{{base}}/ping"}},
            {"name": "Broken", "request": {"method": "NOT A METHOD", "url": "{{base}}/ping"}},
            {"name": "Third", "request": {"method": "GET", "url": "{{base}}/ping"}}
        ]
    }));

    let report = run(&collection, &vars(&[("base", &server.url(""))]))
        .await
        .expect("run should complete");

    assert_eq!(report.results.len(), 3);
    assert!(report.results[0].success);
    assert!(report.results[2].success);

    let broken = &report.results[1];
    assert_eq!(broken.status, 0);
    assert_eq!(broken.status_text, "Processing Failed");
    assert!(!broken.success);
    assert!(broken.error.as_deref().unwrap().contains("invalid HTTP method"));

    assert_eq!(hits.hits_async().await, 2);
}

#[tokio::test]
async fn transport_faults_become_results_with_an_error_message() {
    // nothing listens on this port
    let collection = collection(json!({
        "info": {"name": "X"},
        "item": [
            {"name": "A", "request": {"method": "GET", "url": "{{base}}/ping"}}
        ]
    }));

    let report = run(&collection, &vars(&[("base", "http://localhost:9")]))
        .await
        .expect("run should complete");

    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.status, 0);
    assert!(!result.success);
    assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    assert_eq!(result.url, "http://localhost:9/ping");
    assert_eq!(report.summary.failed_requests, 1);
}

#[tokio::test]
async fn redirect_chains_deeper_than_three_hops_fail_the_request() {
    let server = MockServer::start_async().await;
    for (from, to) in [
        ("/hop0", "/hop1"),
        ("/hop1", "/hop2"),
        ("/hop2", "/hop3"),
        ("/hop3", "/end"),
    ] {
        let location = server.url(to);
        server
            .mock_async(move |when, then| {
                when.method(GET).path(from);
                then.status(302).header("location", location);
            })
            .await;
    }
    let end = server
        .mock_async(|when, then| {
            when.method(GET).path("/end");
            then.status(200);
        })
        .await;

    let collection = collection(json!({
        "info": {"name": "Redirects"},
        "item": [
            {"name": "Deep", "request": {"method": "GET", "url": "{{base}}/hop0"}}
        ]
    }));

    let report = run(&collection, &vars(&[("base", &server.url(""))]))
        .await
        .expect("run should complete");

    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.status, 0);
    assert!(!result.success);
    assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    // client gives up after the third redirect, before the final hop
    assert_eq!(end.hits_async().await, 0);
}

#[tokio::test]
async fn redirect_chains_within_the_cap_are_followed() {
    let server = MockServer::start_async().await;
    for (from, to) in [("/r0", "/r1"), ("/r1", "/done")] {
        let location = server.url(to);
        server
            .mock_async(move |when, then| {
                when.method(GET).path(from);
                then.status(302).header("location", location);
            })
            .await;
    }
    let done = server
        .mock_async(|when, then| {
            when.method(GET).path("/done");
            then.status(200);
        })
        .await;

    let collection = collection(json!({
        "info": {"name": "Redirects"},
        "item": [
            {"name": "Shallow", "request": {"method": "GET", "url": "{{base}}/r0"}}
        ]
    }));

    let report = run(&collection, &vars(&[("base", &server.url(""))]))
        .await
        .expect("run should complete");

    assert_eq!(report.results[0].status, 200);
    assert!(report.results[0].success);
    done.assert_async().await;
}

#[tokio::test]
async fn observer_sees_each_result_as_it_completes() {
    let server = MockServer::start_async().await;
    for step in ["one", "two"] {
        server
            .mock_async(move |when, then| {
                when.method(GET).path(format!("/{step}"));
                then.status(200);
            })
            .await;
    }

    let collection = collection(json!({
        "info": {"name": "Observed"},
        "item": [
            {"name": "one", "request": {"method": "GET", "url": "{{base}}/one"}},
            {"name": "folder", "item": [
                {"name": "two", "request": {"method": "GET", "url": "{{base}}/two"}}
            ]}
        ]
    }));

    let mut seen = Vec::new();
    let report = run_with_observer(&collection, &vars(&[("base", &server.url(""))]), |result| {
        seen.push(result.name.clone())
    })
    .await
    .expect("run should complete");

    assert_eq!(seen, ["one", "folder > two"]);
    assert_eq!(report.results.len(), 2);
}

#[tokio::test]
async fn empty_root_is_rejected_before_walking() {
    let collection = collection(json!({"info": {"name": "Empty"}, "item": []}));
    let err = run(&collection, &VarMap::new()).await.unwrap_err();
    assert!(matches!(err, RunError::EmptyCollection));
}

#[tokio::test]
async fn folders_without_leaves_contribute_nothing() {
    let collection = collection(json!({
        "info": {"name": "Hollow"},
        "item": [
            {"name": "Outer", "item": [
                {"name": "Inner", "item": []}
            ]}
        ]
    }));

    let report = run(&collection, &VarMap::new())
        .await
        .expect("run should complete");
    assert!(report.results.is_empty());
    assert_eq!(report.summary.total_requests, 0);
    assert_eq!(report.summary.average_response_time_ms, 0);
}

#[tokio::test]
async fn variables_flow_into_headers_and_bodies() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/login")
                .header("x-auth", "Bearer secret-1")
                .header("content-type", "application/json")
                .json_body(json!({"token": "secret-1"}));
            then.status(201).body(r#"{"session":"s"}"#);
        })
        .await;

    let collection = collection(json!({
        "info": {"name": "Vars"},
        "item": [
            {"name": "Login", "request": {
                "method": "POST",
                "url": {
                    "host": ["localhost"],
                    "port": server.port(),
                    "path": ["login"]
                },
                "header": [{"key": "X-Auth", "value": "Bearer {{token}}"}],
                "body": {"mode": "raw", "raw": "{\"token\": \"{{token}}\"}"}
            }}
        ]
    }));

    let report = run(&collection, &vars(&[("token", "secret-1")]))
        .await
        .expect("run should complete");

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, 201);
    assert!(report.results[0].success);
    mock.assert_async().await;
}

#[tokio::test]
async fn requests_execute_strictly_in_declaration_order() {
    let server = MockServer::start_async().await;
    for step in ["one", "two", "three"] {
        server
            .mock_async(move |when, then| {
                when.method(GET).path(format!("/{step}"));
                then.status(200);
            })
            .await;
    }

    let collection = collection(json!({
        "info": {"name": "Order"},
        "item": [
            {"name": "one", "request": {"method": "GET", "url": "{{base}}/one"}},
            {"name": "folder", "item": [
                {"name": "two", "request": {"method": "GET", "url": "{{base}}/two"}}
            ]},
            {"name": "three", "request": {"method": "GET", "url": "{{base}}/three"}}
        ]
    }));

    let report = run(&collection, &vars(&[("base", &server.url(""))]))
        .await
        .expect("run should complete");

    let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["one", "folder > two", "three"]);
}
