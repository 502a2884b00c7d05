use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsbrew_common::Config;
use newsbrew_store::{ArticleReader, ArticleWriter};

mod auth;
mod rest;

pub struct AppState {
    pub reader: ArticleReader,
    pub writer: ArticleWriter,
    pub api_key: String,
    pub article_base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("newsbrew_api=info".parse()?)
                .add_directive("newsbrew_store=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    newsbrew_store::migrate(&pool).await?;

    let state = Arc::new(AppState {
        reader: ArticleReader::new(pool.clone(), config.article_base_url.clone()),
        writer: ArticleWriter::new(pool),
        api_key: config.api_key,
        article_base_url: config.article_base_url,
    });

    let api = Router::new()
        .route("/api/articles/search", get(rest::api_search))
        .route("/api/articles/historical", post(rest::api_historical))
        .route("/api/articles/details", post(rest::api_details))
        .route("/api/articles/latest", get(rest::api_latest))
        .route("/api/articles/by-index/{index}", get(rest::api_by_index))
        .route("/api/articles/unreviewed", get(rest::api_unreviewed))
        .route(
            "/api/articles/missing-haiku-image",
            get(rest::api_missing_haiku_image),
        )
        .route("/api/articles", post(rest::api_publish))
        .route("/api/articles/{id}/images", post(rest::api_update_images))
        .route("/api/articles/{id}/review", post(rest::api_update_review))
        .route("/api/dashboard", get(rest::api_dashboard))
        .route("/api/wordcloud", get(rest::api_word_cloud))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_api_key,
        ));

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .merge(api)
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Results are point-in-time snapshots; don't let clients cache them
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Newsbrew API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
