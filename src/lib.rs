pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod secrets;
pub mod services;
pub mod startup;
pub mod use_cases;
pub mod utils;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AllowedIps;
use crate::health::DependencyChecker;
use crate::middleware::IpFilterLayer;
use crate::ports::{PaymentGateway, TransactionRepository};
use crate::services::{BalanceProjector, WebhookReconciler};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn TransactionRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub reconciler: Arc<WebhookReconciler>,
    pub balances: Arc<BalanceProjector>,
    pub health_checkers: Vec<Arc<dyn DependencyChecker>>,
    pub webhook_allowed_ips: AllowedIps,
    pub trusted_proxy_depth: usize,
    pub start_time: Instant,
}

pub fn create_app(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route("/webhooks/paystack", post(handlers::webhook::paystack_webhook))
        .route_layer(IpFilterLayer::new(
            state.webhook_allowed_ips.clone(),
            state.trusted_proxy_depth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/transactions/wallet-funding",
            post(handlers::transactions::fund_wallet),
        )
        .route("/transactions/:id", get(handlers::transactions::get_transaction))
        .route("/wallets/me/balance", get(handlers::wallets::get_balance))
        .merge(webhook_routes)
        .with_state(state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", handlers::ApiDoc::openapi()),
        )
        .layer(axum_middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
