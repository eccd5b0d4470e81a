//! Messages served against artifacts produced by the route compiler.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_matches::assert_matches;
use serde_json::{Value, json};
use wsroute_compiler::Compiler;
use wsroute_core::constants::SCHEMAS_DIR;
use wsroute_core::logging::capture_logs;
use wsroute_core::{IncomingMessage, ParsedMessage, Response, artifact_file_name};
use wsroute_runtime::{
    App, HandlerResult, InitializationError, RouteHandler, Router, RuntimeState, ValidatorState,
    handler_fn,
};
use wsroute_settings::{BuildSettings, RuntimeSettings, ValidatorFailurePolicy};

fn chat_routes() -> Value {
    json!({
        "sendMessage": {
            "parser": "json",
            "schema": {
                "type": "object",
                "required": ["text"],
                "properties": { "text": { "type": "string" } }
            }
        },
        "joinRoom": { "parser": "formdata", "schema": { "type": "object", "required": ["room"] } },
        "leaveRoom": {}
    })
}

/// Compile a one-function project and return the deployed schemas directory.
async fn deploy(project: &Path) -> PathBuf {
    let functions = project.join("serverless/functions");
    std::fs::create_dir_all(&functions).unwrap();
    std::fs::write(
        functions.join("chat.websocket.json"),
        serde_json::to_string_pretty(&chat_routes()).unwrap(),
    )
    .unwrap();

    let settings = BuildSettings::for_project(project);
    let _ = Compiler::new(settings.clone()).build().await.unwrap();
    settings.output_path().join("chat").join(SCHEMAS_DIR)
}

fn state(schemas_dir: &Path, policy: ValidatorFailurePolicy) -> Arc<RuntimeState> {
    Arc::new(RuntimeState::new(RuntimeSettings {
        schemas_dir: schemas_dir.to_path_buf(),
        validator_failure: policy,
        ..RuntimeSettings::default()
    }))
}

struct Recorder {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl RouteHandler for Recorder {
    async fn handle(&self, message: ParsedMessage, _event: &IncomingMessage) -> HandlerResult {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Response::json(200, &json!({ "echo": message.body })))
    }
}

fn chat_router(send_calls: &Arc<AtomicUsize>, join_calls: &Arc<AtomicUsize>) -> Router {
    Router::builder()
        .register(
            "sendMessage",
            Recorder {
                calls: Arc::clone(send_calls),
            },
        )
        .register(
            "joinRoom",
            Recorder {
                calls: Arc::clone(join_calls),
            },
        )
        .build()
}

#[tokio::test]
async fn unregistered_route_is_404_naming_key() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        chat_router(&send, &join),
    );

    let resp = app.handle(IncomingMessage::new("leaveRoom", "")).await.unwrap();
    assert_eq!(resp.status_code, 404);
    assert!(resp.body.unwrap().contains("leaveRoom"));
    assert_eq!(send.load(Ordering::SeqCst) + join.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn route_missing_from_manifest_is_404() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        chat_router(&send, &join),
    );

    let resp = app.handle(IncomingMessage::new("kick", "")).await.unwrap();
    assert_eq!(resp.status_code, 404);
    assert_eq!(
        resp.json_body().unwrap(),
        json!({ "message": "No route defined for kick" })
    );
}

#[tokio::test]
async fn valid_message_reaches_only_its_handler() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        chat_router(&send, &join),
    );

    let resp = app
        .handle(IncomingMessage::new("sendMessage", r#"{"text":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(
        resp,
        Response::json(200, &json!({ "echo": { "text": "hi" } }))
    );
    assert_eq!(send.load(Ordering::SeqCst), 1);
    assert_eq!(join.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn schema_violation_is_400_listing_violations() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        chat_router(&send, &join),
    );

    let resp = app
        .handle(IncomingMessage::new("sendMessage", "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status_code, 400);
    let body = resp.json_body().unwrap();
    assert_eq!(body["message"], "Invalid Request Body");
    let errors = body["errors"].as_array().unwrap();
    assert!(!errors.is_empty());
    assert!(
        errors
            .iter()
            .any(|e| e["message"].as_str().unwrap().contains("text"))
    );
    assert_eq!(send.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        chat_router(&send, &join),
    );

    let resp = app
        .handle(IncomingMessage::new("sendMessage", r#"{"text":"#))
        .await
        .unwrap();
    assert_eq!(resp.status_code, 400);
    assert_eq!(send.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn formdata_route_end_to_end() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        chat_router(&send, &join),
    );

    let resp = app
        .handle(IncomingMessage::new("joinRoom", "room=lobby&nick=a%20b"))
        .await
        .unwrap();
    assert_eq!(
        resp.json_body().unwrap(),
        json!({ "echo": { "room": "lobby", "nick": "a b" } })
    );
    assert_eq!(join.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn formdata_repeated_keys_reach_handler_as_array() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        chat_router(&send, &join),
    );

    let resp = app
        .handle(IncomingMessage::new("joinRoom", "room=lobby&tag=a&tag=b"))
        .await
        .unwrap();
    assert_eq!(
        resp.json_body().unwrap(),
        json!({ "echo": { "room": "lobby", "tag": ["a", "b"] } })
    );
}

#[tokio::test]
async fn missing_manifest_fails_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::new(
        state(&dir.path().join(SCHEMAS_DIR), ValidatorFailurePolicy::Open),
        Router::builder().build(),
    );
    assert_matches!(
        app.handle(IncomingMessage::new("sendMessage", "{}")).await,
        Err(InitializationError::ManifestMissing { .. })
    );
}

#[tokio::test(flavor = "current_thread")]
async fn corrupt_artifact_fails_open_by_default() {
    let (logs, _guard) = capture_logs();
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    std::fs::write(
        schemas.join(artifact_file_name("sendMessage")),
        "{ corrupted",
    )
    .unwrap();

    let (send, join) = (Arc::default(), Arc::default());
    let state = state(&schemas, ValidatorFailurePolicy::Open);
    let app = App::new(Arc::clone(&state), chat_router(&send, &join));

    // validation is disabled for the route, so an invalid body passes
    let resp = app
        .handle(IncomingMessage::new("sendMessage", "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status_code, 200);
    assert_eq!(send.load(Ordering::SeqCst), 1);
    assert!(logs.has_event(tracing::Level::ERROR, "error loading validator"));
    assert_eq!(
        state.validators().await.unwrap().state("sendMessage"),
        Some(ValidatorState::Fallback)
    );

    // other routes are unaffected
    let resp = app
        .handle(IncomingMessage::new("joinRoom", "nick=x"))
        .await
        .unwrap();
    assert_eq!(resp.status_code, 400);
}

#[tokio::test]
async fn corrupt_artifact_rejects_when_fail_closed() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    std::fs::remove_file(schemas.join(artifact_file_name("sendMessage"))).unwrap();

    let (send, join) = (Arc::default(), Arc::default());
    let app = App::new(
        state(&schemas, ValidatorFailurePolicy::Closed),
        chat_router(&send, &join),
    );

    let resp = app
        .handle(IncomingMessage::new("sendMessage", r#"{"text":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp, Response::new(500));
    assert_eq!(send.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cold_and_warm_dispatch_agree() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;
    let (send, join) = (Arc::default(), Arc::default());
    let state = state(&schemas, ValidatorFailurePolicy::Open);
    let app = App::new(Arc::clone(&state), chat_router(&send, &join));
    let message = IncomingMessage::new("sendMessage", r#"{"text":"hi"}"#);

    let cold = app.handle(message.clone()).await.unwrap();
    assert_eq!(
        state.validators().await.unwrap().state("sendMessage"),
        Some(ValidatorState::Loaded)
    );
    let warm = app.handle(message).await.unwrap();
    assert_eq!(cold, warm);
    assert_eq!(send.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn preloaded_state_serves_the_same_responses() {
    let project = tempfile::tempdir().unwrap();
    let schemas = deploy(project.path()).await;

    let lazy = App::new(
        state(&schemas, ValidatorFailurePolicy::Open),
        Router::builder()
            .register(
                "joinRoom",
                handler_fn(|_, _| async { Ok(Response::new(204)) }),
            )
            .build(),
    );
    let eager_state = state(&schemas, ValidatorFailurePolicy::Open);
    eager_state.initialize().await.unwrap();
    let eager = App::new(eager_state, lazy.router().clone());

    for body in ["room=a", "nick=b"] {
        let a = lazy
            .handle(IncomingMessage::new("joinRoom", body))
            .await
            .unwrap();
        let b = eager
            .handle(IncomingMessage::new("joinRoom", body))
            .await
            .unwrap();
        assert_eq!(a, b, "{body}");
    }
}
