// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::Request, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{EventEnvelope, FileRequest, FileWriteRequest, LoginRequest},
    state::AppState,
};

pub mod health;
pub mod socket;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/ws", get(socket::connect))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(CorsLayer::permissive())
}

/// Request span without the query string, which carries the session token.
fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        socket::connect,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            EventEnvelope,
            LoginRequest,
            FileWriteRequest,
            FileRequest,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Events", description = "WebSocket event channel (login and file operations)"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;
