use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use cmdref::constants::{
    DEFAULT_API_LIMIT, DEFAULT_BIND_ADDR, DEFAULT_CACHE_CAPACITY, DEFAULT_DATA_DIR,
};
use cmdref::logging::init_logging;
use cmdref::model::Command;
use cmdref::{CommandService, Error, ServiceConfig};

#[derive(Parser)]
#[command(name = "server", about = "HTTP JSON API over the command reference")]
struct Args {
    #[arg(short, long, env = "CMDREF_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    #[arg(long, env = "CMDREF_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct CategoryQuery {
    name: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct ReloadResponse {
    generation: u64,
    commands: usize,
}

type AppState = Arc<CommandService>;

fn commands_json(commands: &[Arc<Command>]) -> Json<Vec<Command>> {
    Json(commands.iter().map(|c| (**c).clone()).collect())
}

fn error_response(status: StatusCode, err: &Error) -> Response {
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging("info");
    let args = Args::parse();

    let config = ServiceConfig {
        data_dir: args.data_dir,
        cache_capacity: args.cache_capacity,
    };
    info!(data_dir = %config.data_dir.display(), "loading command data");
    let service = CommandService::open(&config)
        .await
        .context("failed to load command data")?;

    let app = Router::new()
        .route("/api/search", get(search_api))
        .route("/api/commands/{name}", get(command_api))
        .route("/api/categories", get(categories_api))
        .route("/api/categories/commands", get(category_commands_api))
        .route("/api/platforms/{platform}", get(platform_api))
        .route("/api/reload", post(reload_api))
        .with_state(Arc::new(service));

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!("Server running at http://{}", args.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn search_api(
    State(service): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<Command>> {
    let hits = service.search(&params.q);
    let limit = params.limit.unwrap_or(DEFAULT_API_LIMIT).min(hits.len());
    commands_json(&hits[..limit])
}

async fn command_api(State(service): State<AppState>, Path(name): Path<String>) -> Response {
    match service.command(&name) {
        Ok(cmd) => Json((*cmd).clone()).into_response(),
        Err(err) => error_response(StatusCode::NOT_FOUND, &err),
    }
}

async fn categories_api(State(service): State<AppState>) -> Json<Vec<String>> {
    Json(service.categories().into_iter().collect())
}

async fn category_commands_api(
    State(service): State<AppState>,
    Query(params): Query<CategoryQuery>,
) -> Json<Vec<Command>> {
    commands_json(&service.by_category(&params.name))
}

async fn platform_api(
    State(service): State<AppState>,
    Path(platform): Path<String>,
) -> Json<Vec<Command>> {
    commands_json(&service.by_platform(&platform))
}

async fn reload_api(State(service): State<AppState>) -> Response {
    match service.reload().await {
        Ok(generation) => Json(ReloadResponse {
            generation,
            commands: service.command_count(),
        })
        .into_response(),
        Err(err) => {
            warn!(error = %err, "reload request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    }
}
