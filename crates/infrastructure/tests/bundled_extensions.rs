//! Bundled plugins and default filters rendered through the engine.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tessera_application::{PluginSource, RenderContext, RenderEngine, RenderOptions};
use tessera_domain::{Cookie, CookieJar, ErrorReason, Request, Response, TemplatingConfig, Workspace};
use tessera_infrastructure::{InMemoryModelStore, PluginRegistry, default_filters};

async fn store() -> InMemoryModelStore {
    let store = InMemoryModelStore::new();
    store.insert_workspace(Workspace::new("wrk_1", "Main")).await;
    store
        .insert_request(
            Request::new("req_login", "wrk_1", "Login")
                .with_method("POST")
                .with_url("https://api.example.com/login"),
        )
        .await;
    store
        .insert_request(Request::new("req_me", "wrk_1", "Me"))
        .await;
    store
        .insert_response(
            Response::new("res_1", "req_login", 200).with_created(Utc::now() - Duration::hours(1)),
            Some(br#"{"token": "old"}"#.to_vec()),
        )
        .await;
    store
        .insert_response(
            Response::new("res_2", "req_login", 200),
            Some(br#"{"token": "fresh", "user": {"id": 7}}"#.to_vec()),
        )
        .await;
    let mut jar = CookieJar::new("jar_1", "wrk_1");
    jar.add(Cookie::new("session", "s3cr3t", "example.com"));
    store.insert_cookie_jar(jar).await;
    store
}

async fn engine_with(plugins: Arc<PluginRegistry>) -> RenderEngine {
    RenderEngine::builder()
        .config(TemplatingConfig::default())
        .plugin_source(plugins)
        .default_filters(default_filters())
        .model_store(Arc::new(store().await))
        .build()
        .unwrap()
}

fn for_request(request_id: &str) -> RenderOptions {
    RenderOptions::new(
        RenderContext::builder()
            .meta("requestId", request_id)
            .variable("payload", json!({"a": {"b": 1}}))
            .variable("payload_text", r#"{"a":{"b":1}}"#)
            .variable("greeting", "hello")
            .variable("left", r#"{"a":1}"#)
            .variable("right", r#"{"a":2}"#)
            .build(),
    )
}

#[tokio::test]
async fn response_tag_reads_latest_body() {
    let engine = engine_with(Arc::new(PluginRegistry::with_bundled())).await;
    let out = engine
        .render(
            "Bearer {% response 'req_login', '$.token' %} / {% response 'req_login', '$.user.id' %}",
            for_request("req_me"),
        )
        .await
        .unwrap();
    assert_eq!(out, "Bearer fresh / 7");
}

#[tokio::test]
async fn response_tag_without_responses_fails_at_the_tag() {
    let engine = engine_with(Arc::new(PluginRegistry::with_bundled())).await;
    let err = engine
        .render("x {% response 'req_me' %}", for_request("req_me"))
        .await
        .unwrap_err();
    assert!(err.message.contains("no responses for request req_me"));
    assert_eq!(err.location().column, 3);
}

#[tokio::test]
async fn cookie_tag_uses_workspace_jar() {
    let engine = engine_with(Arc::new(PluginRegistry::with_bundled())).await;
    let out = engine
        .render(
            "{% cookie 'https://example.com/app', 'session' %}",
            for_request("req_me"),
        )
        .await
        .unwrap();
    assert_eq!(out, "s3cr3t");
}

#[tokio::test]
async fn current_request_wraps_previous_value() {
    let engine = engine_with(Arc::new(PluginRegistry::new())).await;
    let out = engine
        .render(
            "{{ greeting | currentRequest | jmespath('[method, __previousValue]') | join('-') }}",
            for_request("req_login"),
        )
        .await
        .unwrap();
    assert_eq!(out, "POST-hello");
}

#[tokio::test]
async fn current_request_without_request_is_undefined() {
    let engine = engine_with(Arc::new(PluginRegistry::new())).await;
    let err = engine
        .render(
            "{{ payload | currentRequest }}",
            RenderOptions::new(RenderContext::builder().variable("payload", 1).build()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.reason, ErrorReason::Undefined);
}

#[tokio::test]
async fn jmespath_agrees_on_string_and_object_input() {
    let engine = engine_with(Arc::new(PluginRegistry::new())).await;
    let out = engine
        .render(
            "{{ payload | jmespath('a.b') }}={{ payload_text | jmespath('a.b') }}",
            for_request("req_me"),
        )
        .await
        .unwrap();
    assert_eq!(out, "1=1");
}

#[tokio::test]
async fn json_diff_reports_updates_only_when_values_differ() {
    let engine = engine_with(Arc::new(PluginRegistry::new())).await;
    let changed = engine
        .render(
            "{{ left | jsonDiff(right) | json_path('$.updated[*].path') }}",
            for_request("req_me"),
        )
        .await
        .unwrap();
    assert_eq!(changed, r#"["a"]"#);

    let same = engine
        .render(
            "{{ payload | jsonDiff(payload) | jmespath('[updated, added, removed][]') }}",
            for_request("req_me"),
        )
        .await
        .unwrap();
    assert_eq!(same, "[]");
}

#[tokio::test]
async fn json_diff_accepts_string_operands() {
    let engine = engine_with(Arc::new(PluginRegistry::new())).await;
    let out = engine
        .render(
            "{{ left | jsonDiff(right) | jmespath('updated[0].[old, new]') }}",
            for_request("req_me"),
        )
        .await
        .unwrap();
    assert_eq!(out, "[1,2]");
}

#[tokio::test]
async fn generator_tags_render() {
    let engine = engine_with(Arc::new(PluginRegistry::with_bundled())).await;
    let out = engine
        .render(
            "{% uuid 'v4' %}|{% base64 'encode', 'standard', 'hi' %}|{% random 'int', 2, 2 %}",
            RenderOptions::default(),
        )
        .await
        .unwrap();
    let parts: Vec<&str> = out.split('|').collect();
    assert_eq!(parts[0].len(), 36);
    assert_eq!(parts[1], "aGk=");
    assert_eq!(parts[2], "2");
}

#[tokio::test]
async fn removed_plugin_disappears_after_reload() {
    let plugins = Arc::new(PluginRegistry::with_bundled());
    let engine = engine_with(Arc::clone(&plugins)).await;
    assert!(engine.render("{% uuid %}", RenderOptions::default()).await.is_ok());

    assert!(plugins.remove("tessera-plugin-uuid"));
    engine.reload();
    let err = engine
        .render("{% uuid %}", RenderOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.message, "unknown block tag: uuid");
}

#[tokio::test]
async fn ignored_bundled_plugin_is_not_listed() {
    let plugins = Arc::new(PluginRegistry::with_bundled());
    let config = TemplatingConfig {
        ignored_plugins: vec!["tessera-plugin-random".to_string()],
        ..TemplatingConfig::default()
    };
    let engine = RenderEngine::builder()
        .config(config)
        .plugin_source(Arc::clone(&plugins) as Arc<dyn PluginSource>)
        .default_filters(default_filters())
        .build()
        .unwrap();

    let tags: Vec<String> = engine
        .tag_definitions()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert!(tags.contains(&"uuid".to_string()));
    assert!(!tags.contains(&"random".to_string()));

    let filters = engine.filter_definitions().await.unwrap();
    let xml = filters.iter().find(|f| f.name == "xml_to_json").unwrap();
    assert!(!xml.is_plugin);
}
