use std::process;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ticketing_server::config::Config;
use ticketing_server::routes::create_routes;
use ticketing_server::services::payments::{RazorpayGateway, SignatureVerifier};
use ticketing_server::state::AppState;
use ticketing_server::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ticketing_server=info,tower_http=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            process::exit(1);
        }
    };

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Successfully connected to database");

            store.migrate().await.expect("Failed to run migrations");
            tracing::info!("Migrations run successfully");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let verifier = SignatureVerifier::new(config.gateway.key_secret.as_bytes())
        .expect("Razorpay key secret not found");
    let gateway = Arc::new(RazorpayGateway::new(&config.gateway));
    let state = AppState::new(store, gateway, verifier, config.gateway.currency.clone());

    let app = create_routes(state, &config);

    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
