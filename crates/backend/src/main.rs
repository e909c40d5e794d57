pub mod domain;
pub mod handlers;
pub mod shared;
pub mod store;

use domain::article::ArticleService;
use domain::booking::BookingService;
use domain::user::UserService;
use store::SqliteStore;

/// Shared application state: every service holds a handle to the same
/// document store.
pub struct AppContext {
    pub articles: ArticleService<SqliteStore>,
    pub users: UserService<SqliteStore>,
    pub bookings: BookingService<SqliteStore>,
}

impl AppContext {
    pub fn new(store: std::sync::Arc<SqliteStore>) -> Self {
        Self {
            articles: ArticleService::new(std::sync::Arc::clone(&store)),
            users: UserService::new(std::sync::Arc::clone(&store)),
            bookings: BookingService::new(store),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::{
        routing::{get, post},
        Router,
    };
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join("backend.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                // keep driver noise out, keep application logs
                "info,sqlx=warn,sea_orm=warn".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let config = shared::config::load_config()?;
    let db_path = shared::config::resolve_store_path(&config)?;
    let store = SqliteStore::connect(&db_path.to_string_lossy())
        .await
        .map_err(|e| anyhow::anyhow!("store init failed: {e}"))?;
    let ctx = Arc::new(AppContext::new(Arc::new(store)));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // ARTICLE ROUTES
        // ========================================
        .route(
            "/api/articles",
            post(handlers::articles::upsert),
        )
        .route(
            "/api/articles/by-ids",
            post(handlers::articles::by_ids),
        )
        .route(
            "/api/articles/:category",
            get(handlers::articles::list_by_category),
        )
        .route(
            "/api/articles/:category/:id",
            get(handlers::articles::get_by_id).delete(handlers::articles::delete),
        )
        // ========================================
        // BOOKING ROUTES
        // ========================================
        .route("/api/bookings", post(handlers::bookings::create))
        .route("/api/bookings/quote", post(handlers::bookings::quote))
        // ========================================
        // USER ROUTES
        // ========================================
        .route("/api/users", post(handlers::users::upsert))
        .route("/api/users/:id", get(handlers::users::get_by_id))
        .route(
            "/api/users/:id/favorites",
            get(handlers::users::favorites),
        )
        .route(
            "/api/users/:id/favorites/:article_id/toggle",
            post(handlers::users::toggle_favorite),
        )
        .route(
            "/api/users/:id/purchases",
            get(handlers::users::purchases),
        )
        .layer(cors)
        .with_state(ctx);

    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    config.server.port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", config.server.port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
