//! Wires the engine together and executes one CLI invocation.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tessera_application::{RenderContext, RenderEngine, RenderOptions};
use tessera_infrastructure::{
    ConfigRepository, InMemoryModelStore, ModelSnapshot, PluginRegistry, default_filters,
    from_json_bytes, to_json_stable,
};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::cli::{Args, ListKind};
use crate::error::AppError;

/// Runs the command described by `args` and returns what should be printed.
pub async fn execute(args: Args) -> Result<String, AppError> {
    let engine = build_engine(&args).await?;

    if let Some(kind) = args.list {
        return list(&engine, kind).await;
    }

    let template = match args.template.clone() {
        Some(template) => template,
        None => read_stdin().await?,
    };
    let context = build_context(&args).await?;

    let mut options = RenderOptions::new(context).with_mode(args.mode);
    if let Some(path) = args.path {
        options = options.with_path(path);
    }

    info!(mode = %args.mode, bytes = template.len(), "Rendering template");
    Ok(engine.render(&template, options).await?)
}

async fn build_engine(args: &Args) -> Result<RenderEngine, AppError> {
    let repository = args
        .config
        .as_ref()
        .map_or_else(ConfigRepository::new, ConfigRepository::at);
    let config = repository.load().await?;

    let mut builder = RenderEngine::builder()
        .config(config)
        .plugin_source(Arc::new(PluginRegistry::with_bundled()))
        .default_filters(default_filters());

    if let Some(path) = &args.models {
        let snapshot = ModelSnapshot::read(path).await?;
        debug!(
            documents = snapshot.documents.len(),
            responses = snapshot.responses.len(),
            "Loaded model snapshot"
        );
        builder = builder.model_store(Arc::new(InMemoryModelStore::from_snapshot(snapshot).await));
    }

    Ok(builder.build()?)
}

async fn list(engine: &RenderEngine, kind: ListKind) -> Result<String, AppError> {
    let json = match kind {
        ListKind::Filters => to_json_stable(&engine.filter_definitions().await?)?,
        ListKind::Tags => to_json_stable(&engine.tag_definitions().await?)?,
        ListKind::Tests => to_json_stable(&engine.test_definitions().await?)?,
    };
    Ok(json)
}

async fn build_context(args: &Args) -> Result<RenderContext, AppError> {
    let mut builder = RenderContext::builder();
    if let Some(path) = &args.context {
        builder = builder.variables(read_variables(path).await?);
    }
    if let Some(id) = &args.request_id {
        builder = builder.meta("requestId", id.as_str());
    }
    if let Some(id) = &args.environment_id {
        builder = builder.environment_id(id.as_str());
    }
    Ok(builder.build())
}

async fn read_variables(path: &Path) -> Result<Map<String, Value>, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let value: Value =
        from_json_bytes(&bytes).map_err(|e| AppError::Context(format!("{}: {e}", path.display())))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Context(format!(
            "{}: expected a JSON object, found {}",
            path.display(),
            kind_of(&other)
        ))),
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

async fn read_stdin() -> Result<String, AppError> {
    let mut template = String::new();
    tokio::io::stdin().read_to_string(&mut template).await?;
    Ok(template)
}
