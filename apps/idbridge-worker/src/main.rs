//! idbridge provisioning worker
//!
//! Background ingestion worker: consumes user-created notifications from the
//! bus, resolves each into a full profile via the identity service, and
//! idempotently materializes the user into the local account store.

mod config;
mod logging;

use config::WorkerConfig;
use idbridge_events::EventConsumer;
use idbridge_identity::{ClientCredentials, IdentityClient, TokenSource};
use idbridge_provisioning::UserCreatedHandler;
use idbridge_store::PgAccountStore;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// How long the startup broker metadata probe may take.
const BROKER_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on invalid values)
    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        topic = %config.topic,
        consumer_group = %config.consumer_group,
        bootstrap_servers = %config.kafka.bootstrap_servers,
        "Starting idbridge worker"
    );

    // Account store
    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            info!("Database connection established");
            pool
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };
    let store = PgAccountStore::new(pool);

    // Identity resolver
    let resolver = match build_resolver(&config) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to build identity client");
            std::process::exit(1);
        }
    };

    let handler = UserCreatedHandler::new(resolver, store);

    // Bus consumer; connect and subscription failures are fatal, there is
    // no reconnect loop around subscription establishment.
    let consumer = match EventConsumer::new(&config.kafka, &config.consumer_group) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to create bus consumer");
            std::process::exit(1);
        }
    };

    if let Err(e) = consumer.subscribe(&config.topic) {
        error!(error = %e, "Failed to subscribe to topic");
        std::process::exit(1);
    }

    match consumer.health_check(BROKER_PROBE_TIMEOUT) {
        Ok(status) if status.is_healthy() => {
            info!(
                brokers = status.brokers,
                topics = status.topics,
                "Connected to bus"
            );
        }
        Ok(_) => {
            error!("Bus reports no brokers");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Failed to reach bus");
            std::process::exit(1);
        }
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.cancel();
        });
    }

    consumer.run(&handler, &shutdown).await;

    info!("idbridge worker stopped");
}

/// Wire the identity client from configuration.
fn build_resolver(config: &WorkerConfig) -> Result<IdentityClient, idbridge_identity::IdentityError> {
    let http_client = reqwest::Client::builder()
        .timeout(config.identity.request_timeout)
        .build()
        .map_err(|e| {
            idbridge_identity::IdentityError::InvalidConfig(format!(
                "Failed to build HTTP client: {e}"
            ))
        })?;

    let auth = TokenSource::new(
        ClientCredentials {
            client_id: config.identity.client_id.clone(),
            client_secret: config.identity.client_secret.clone(),
            token_endpoint: config.identity.token_endpoint.clone(),
            scopes: config.identity.scopes.clone(),
        },
        http_client,
    )?;

    IdentityClient::new(
        config.identity.api_base_url.clone(),
        config.identity.user_path_template.clone(),
        auth,
        config.identity.request_timeout,
    )
}

/// Graceful shutdown signal handler (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                // Fall through - we still want to wait for terminate signal
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
