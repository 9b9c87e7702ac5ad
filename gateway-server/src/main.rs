// gateway-server/src/main.rs
mod api;
mod auth;
mod error;
mod forwarder;
mod query;
mod staging;

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use api::publish::AppState;
use common::{setup_tracing, Config};
use forwarder::RpcForwarder;
use staging::StagingAllocator;
use std::sync::Arc;
use std::time::Duration;

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().body("Publish Gateway")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load configuration
    let config = Config::from_env();

    // Save address before moving config into web::Data
    let server_addr = config.gateway_addr.clone();

    tracing::info!("Starting Publish Gateway on {}", server_addr);
    tracing::info!("Staging uploads under {}", config.staging_root);
    tracing::info!("Backend publishing service at {}", config.backend.rpc_url);

    let allocator = StagingAllocator::new(&config.staging_root);
    let publisher = Arc::new(RpcForwarder::new(
        config.backend.rpc_url.clone(),
        Duration::from_secs(config.backend.timeout_secs),
    ));

    // Create data references
    let config_data = web::Data::new(config);
    let state = web::Data::new(AppState {
        allocator,
        publisher,
    });

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(state.clone())
            .service(index)
            .configure(api::configure)
    })
    .bind(&server_addr)?
    .run()
    .await
}
