use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use comply_core::config::Config;
use comply_core::tracing::init_tracing;
use comply_gateway::config::GatewayConfig;
use comply_gateway::hub::HubHandle;
use comply_gateway::infra::proxy::HttpForwarder;
use comply_gateway::router::build_router;
use comply_gateway::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = GatewayConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let forwarder =
        HttpForwarder::new(config.proxy_timeout()).expect("failed to build HTTP client");

    let state = AppState {
        db,
        redis,
        forwarder,
        rate_limit: config.rate_limit_policy(),
        upstreams: Arc::new(config.upstreams()),
        hub: HubHandle::spawn(),
        jwt_secret: config.jwt_secret,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.api_gateway_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("api gateway listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
