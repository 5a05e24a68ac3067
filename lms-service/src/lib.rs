use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    LatencyUnit,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod courses;
pub mod error;
pub mod routes;

/// Builds the full router. The frontend calls with trailing slashes, so both forms are routed.
pub fn app(app_state: config::AppState) -> Router {
    let request_timeout_in_ms = app_state.env_vars.request_timeout_in_ms;
    let request_body_size_limit = app_state.env_vars.request_body_size_limit;

    let api = Router::new()
        .route("/events", post(routes::post_event))
        .route("/events/", post(routes::post_event))
        .route(
            "/courses",
            post(routes::post_course).get(routes::get_courses),
        )
        .route(
            "/courses/",
            post(routes::post_course).get(routes::get_courses),
        )
        .route("/courses/{course_id}", get(routes::get_course));

    Router::new()
        .route("/", get(routes::get_root))
        .route("/health", get(routes::get_health))
        .nest("/api", api)
        .layer(TimeoutLayer::new(Duration::from_millis(
            request_timeout_in_ms,
        )))
        .layer(RequestBodyLimitLayer::new(request_body_size_limit))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .with_state(app_state)
}
