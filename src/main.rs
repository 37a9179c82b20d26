//! Horse Registry Server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_files::Files;
use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use horse_registry_lib::api;
use horse_registry_lib::auth::AdminKey;
use horse_registry_lib::config::Config;
use horse_registry_lib::db::DbPool;
use horse_registry_lib::middleware;
use horse_registry_lib::services::{FileStore, Lifecycle};

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        if health_check().await {
            std::process::exit(0);
        } else {
            std::process::exit(1);
        }
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and ADMIN_TOKEN must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Horse Registry Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and ADMIN_TOKEN");
    }

    let store = FileStore::new(&config.storage_dir);
    if let Err(e) = store.init().await {
        error!("Failed to initialize file storage: {}", e);
        std::process::exit(1);
    }

    let pool = match DbPool::new(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    // Prepare shared state
    let bind_address = config.bind_address();
    let admin_key = AdminKey::new(config.admin_token.clone());
    if !admin_key.is_configured() {
        warn!("ADMIN_TOKEN is not set - admin endpoints will reject every request");
    }
    let limits = config.uploads;
    let lifecycle = Lifecycle::new(pool.clone(), store, limits.max_file_size);
    let static_dir = config.static_dir.clone();

    info!(
        "Upload limits: {}MB per file, {}MB per request",
        limits.max_file_size / 1024 / 1024,
        limits.max_request_size / 1024 / 1024
    );

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if config.is_development() {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let mut app = App::new()
            .wrap(middleware::RequestLogger)
            // Outermost, so preflights and every error response get CORS headers
            .wrap(middleware::PermissiveCors)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(lifecycle.clone()))
            .app_data(web::Data::new(admin_key.clone()))
            .app_data(web::Data::new(limits))
            .app_data(api::json_config())
            .app_data(web::PayloadConfig::new(
                usize::try_from(limits.max_request_size).unwrap_or(usize::MAX),
            ))
            .service(web::scope("/api").configure(api::configure_api));

        if let Some(ref dir) = static_dir {
            app = app.service(Files::new("/", dir.clone()).index_file("index.html"));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
