//! LMS Server - library record service
//!
//! REST API server for books, borrowers and borrow/return transactions.

use anyhow::Context;
use axum::{
    http::HeaderName,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lms_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    AppState,
};

const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting LMS Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, &config);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Console logging, plus daily rolling JSON files when a directory is configured
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lms_server={},tower_http=debug", logging.level).into());
    let json = logging.format.eq_ignore_ascii_case("json");

    let (file_writer, guard) = match logging.directory {
        Some(ref directory) => {
            let appender = tracing_appender::rolling::daily(directory, "lms-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .with(file_writer.map(|writer| fmt::layer().json().with_ansi(false).with_writer(writer)))
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let correlation_id = HeaderName::from_static(CORRELATION_ID_HEADER);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Users
        .route("/users", post(api::users::create_user))
        .route("/users/login", post(api::users::login))
        // Books
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/:reference", get(api::books::get_book))
        .route("/books/:reference", put(api::books::update_book))
        .route("/books/:reference", delete(api::books::delete_book))
        .route("/books/:reference/soft-delete", put(api::books::soft_delete_book))
        // Authors
        .route("/authors", get(api::authors::list_authors))
        .route("/authors", post(api::authors::create_author))
        .route("/authors/:reference", get(api::authors::get_author))
        .route("/authors/:reference", put(api::authors::update_author))
        .route("/authors/:reference", delete(api::authors::delete_author))
        .route("/authors/:reference/soft-delete", put(api::authors::soft_delete_author))
        .route("/authors/:reference/books", get(api::authors::list_author_books))
        // Genres
        .route("/genres", get(api::genres::list_genres))
        .route("/genres", post(api::genres::create_genre))
        .route("/genres/:reference", get(api::genres::get_genre))
        .route("/genres/:reference", put(api::genres::update_genre))
        .route("/genres/:reference", delete(api::genres::delete_genre))
        .route("/genres/:reference/books", get(api::genres::list_genre_books))
        // Borrowers
        .route("/borrowers", get(api::borrowers::list_borrowers))
        .route("/borrowers", post(api::borrowers::create_borrower))
        .route("/borrowers/:reference", get(api::borrowers::get_borrower))
        .route("/borrowers/:reference", put(api::borrowers::update_borrower))
        .route("/borrowers/:reference", delete(api::borrowers::delete_borrower))
        .route("/borrowers/:reference/soft-delete", put(api::borrowers::soft_delete_borrower))
        .route(
            "/borrowers/:reference/transactions",
            get(api::borrowers::list_borrower_transactions),
        )
        // Transactions
        .route("/transactions/borrow", post(api::transactions::borrow_book))
        .route("/transactions/:reference", get(api::transactions::get_transaction))
        .route("/transactions/:reference/return", post(api::transactions::return_book))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(PropagateRequestIdLayer::new(correlation_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(correlation_id, MakeRequestUuid))
        .layer(cors)
}
