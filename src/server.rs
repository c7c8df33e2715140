// ABOUTME: HTTP server assembly: router composition, tower middleware stack and serve loop
// ABOUTME: Every request gets a correlation id header, a trace span, a timeout and a body limit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::ServerConfig;
use crate::constants::endpoints::API_BASE;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::{
    HealthRoutes, ParameterRoutes, ProfileParameterRoutes, ProfileRoutes, ServerRoutes,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Request, Uri},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// Generates `req_<uuid>` request ids
#[derive(Debug, Clone, Copy, Default)]
struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = format!("req_{}", Uuid::new_v4().simple());
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let http = resources.config.http.clone();
    let request_id_header = http.request_id_header_name();
    let span_header = request_id_header.clone();

    let api = Router::new()
        .merge(ProfileParameterRoutes::routes(Arc::clone(&resources)))
        .merge(ProfileRoutes::routes(Arc::clone(&resources)))
        .merge(ParameterRoutes::routes(Arc::clone(&resources)))
        .merge(ServerRoutes::routes(Arc::clone(&resources)));

    Router::new()
        .merge(HealthRoutes::routes(resources))
        .nest(API_BASE, api)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(http.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            http.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(&span_header)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id_header, RequestIdGenerator))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Open the store, bind the listener and serve until Ctrl-C
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the address cannot be bound, or
/// the server fails while running
pub async fn run(config: ServerConfig) -> Result<()> {
    let address = format!("{}:{}", config.http.host, config.http.port);
    let resources = Arc::new(
        ServerResources::from_config(config)
            .await
            .context("Failed to initialize server resources")?,
    );

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(address = %address, api = API_BASE, "HTTP API listening");

    axum::serve(listener, build_router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP API stopped");
    Ok(())
}
