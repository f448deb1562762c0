/// HTTP server exposing the datasets, filters and views as JSON
use actix_web::{error::InternalError, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::io;

use crate::chart::{build_view, EmptyResultNotice};
use crate::dataset::{DatasetName, Registry};
use crate::error::{Error, Result};
use crate::messages::{QueryRequest, ServerMessage};

/// Listen address, read from `HOST` and `PORT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn from_env() -> io::Result<Self> {
        Self::from_vars(std::env::var("HOST").ok(), std::env::var("PORT").ok())
    }

    fn from_vars(host: Option<String>, port: Option<String>) -> io::Result<Self> {
        let port = match port {
            Some(port) => port.trim().parse().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("PORT must be a number between 0 and 65535, got '{}'", port),
                )
            })?,
            None => Self::DEFAULT_PORT,
        };
        Ok(ServerConfig {
            host: host.unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            port,
        })
    }
}

/// Shared, read-only state for all requests
#[derive(Clone, Copy)]
pub struct AppState {
    registry: &'static Registry,
}

impl AppState {
    pub fn new() -> Result<Self> {
        Ok(AppState {
            registry: Registry::global()?,
        })
    }
}

fn error_response(err: &Error) -> HttpResponse {
    let status = match err {
        Error::UnknownDataset(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    log::warn!("rejected request: {}", err);
    HttpResponse::build(status).json(ServerMessage::Error {
        message: err.to_string(),
    })
}

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Annexome server is running"
    }))
}

async fn list_datasets(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ServerMessage::DatasetList {
        datasets: state.registry.names().to_vec(),
    })
}

async fn get_table(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match path.parse::<DatasetName>() {
        Ok(name) => HttpResponse::Ok().json(ServerMessage::table_data(state.registry.rows(name))),
        Err(err) => error_response(&err),
    }
}

async fn query(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<QueryRequest>,
) -> HttpResponse {
    match run_query(state.registry, &path, &body) {
        Ok(message) => HttpResponse::Ok().json(message),
        Err(err) => error_response(&err),
    }
}

fn run_query(registry: &Registry, dataset: &str, request: &QueryRequest) -> Result<ServerMessage> {
    let name: DatasetName = dataset.parse()?;
    let rows = request.selection()?.apply(&registry.rows(name))?;
    let view = request
        .view
        .as_ref()
        .map(|spec| build_view(&rows, spec))
        .transpose()?;
    let notice = match &view {
        Some(view) => view.notice(),
        None => EmptyResultNotice::for_rows(&rows),
    };

    Ok(ServerMessage::QueryResult {
        table_name: name.to_string(),
        matched: rows.len(),
        rows,
        view,
        notice,
    })
}

/// Register the routes on an app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("rejected request body: {}", err);
        let response = HttpResponse::BadRequest().json(ServerMessage::Error {
            message: err.to_string(),
        });
        InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .route("/health", web::get().to(health_check))
        .route("/datasets", web::get().to(list_datasets))
        .route("/datasets/{name}", web::get().to(get_table))
        .route("/datasets/{name}/query", web::post().to(query));
}

/// Start the HTTP server
pub async fn run_server(config: &ServerConfig) -> io::Result<()> {
    let state = web::Data::new(AppState::new().map_err(io::Error::other)?);

    log::info!("Annexome server listening on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            // Enable logger
            .wrap(middleware::Logger::default())
            // CORS for development
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
