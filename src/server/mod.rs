// src/server/mod.rs
// =============================================================================
// The HTTP front door: an actix-web server exposing the crawler as a JSON
// API.
//
// Routes:
//   POST /api/crawl   run one crawl
//   GET  /api/test    API liveness
//   GET  /            development only
//   GET  /health      development only
//   /*                production only: the built front-end, with index.html
//                     served for any path that isn't a file
// =============================================================================

mod handlers;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use std::path::{Path, PathBuf};

use crate::crawler::Crawler;
use crate::error::ApiError;

/// Shared application state.
pub struct AppState {
    pub crawler: Crawler,
}

/// Where and how to serve.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub static_dir: PathBuf,
}

/// Registers the `/api` routes.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    // Malformed JSON gets the same `{error}` body as our own 400s
    let json = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());

    cfg.service(
        web::scope("/api")
            .app_data(json)
            .route("/crawl", web::post().to(handlers::crawl))
            .route("/test", web::get().to(handlers::api_test)),
    );
}

/// Registers the development-only routes.
pub fn dev_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health));
}

// Static files with a single-page-app fallback to index.html
fn spa_files(static_dir: &Path) -> Files {
    let index = static_dir.join("index.html");

    Files::new("/", static_dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let file = NamedFile::open_async(&index).await?;
                let res = file.into_response(&req);
                Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
            }
        }))
}

/// Starts the API server and runs until it is shut down.
pub async fn run_server(crawler: Crawler, options: ServerOptions) -> std::io::Result<()> {
    let state = web::Data::new(AppState { crawler });

    info!(
        "Server running on http://{}:{} ({})",
        options.host,
        options.port,
        if options.production { "production" } else { "development" }
    );

    let production = options.production;
    let static_dir = options.static_dir.clone();

    HttpServer::new(move || {
        let app = App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(api_routes);

        if production {
            app.service(spa_files(&static_dir))
        } else {
            app.configure(dev_routes)
        }
    })
    .bind((options.host.as_str(), options.port))?
    .run()
    .await
}
