use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

use roomwarden::bootstrap;
use roomwarden::config;
use roomwarden::routes;
use roomwarden::scheduler;
use roomwarden::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration
    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!(
        "Starting Roomwarden server on {}:{} ({:?} store)",
        config.host,
        config.port,
        config.storage
    );

    let store = bootstrap::build_store(&config).await.map_err(|e| {
        log::error!("Allocation store error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let state = web::Data::new(AppState::from_config(store, &config));

    if let Err(e) = bootstrap::seed_settings_if_needed(&state.settings).await {
        log::error!("Failed to seed hostel settings: {}", e);
    }

    bootstrap::warn_if_token_missing(&config);

    if config.sweep.grace_applied_at_creation {
        log::info!("Sweep treats stored payment deadlines as already including the grace period");
    }

    let scheduler_handle = if config.sweep.scheduler_enabled {
        Some(scheduler::spawn(
            state.clone().into_inner(),
            config.sweep.run_hour_utc,
            config.sweep.startup_delay,
        ))
    } else {
        log::info!(
            "In-process scheduler disabled; trigger POST /api/check-payment-deadlines externally"
        );
        None
    };

    let host = config.host.clone();
    let port = config.port;

    let server = HttpServer::new(move || {
        // Admin dashboards call the API from the browser
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(cors)
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    // Spawn graceful shutdown handler
    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        if let Some(handle) = scheduler_handle {
            handle.abort();
        }
        server_handle.stop(true).await;
    });

    server.await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
