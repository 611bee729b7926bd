use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use discussion_service::clients::{AssetClient, AuthServiceClient, DiscourseClient};
use discussion_service::db::{self, PgCategoryStore};
use discussion_service::events::KafkaEventPublisher;
use discussion_service::handlers;
use discussion_service::middleware::{JwtAuthMiddleware, JwtValidator};
use discussion_service::openapi::ApiDoc;
use discussion_service::{Config, DiscussionService};
use std::io;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn other_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Exit status for `discussion-service healthcheck`, used by container probes.
async fn run_healthcheck() -> io::Result<()> {
    let port = std::env::var("DISCUSSION_SERVICE_PORT").unwrap_or_else(|_| "8090".to_string());
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return run_healthcheck().await;
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting discussion-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(env = %config.app.env, discourse = %config.discourse.host, "Configuration loaded");

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| other_error("Failed to create database pool", e))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| other_error("Failed to run migrations", e))?;

    let forum = DiscourseClient::new(&config.discourse)
        .map_err(|e| other_error("Failed to create Discourse client", e))?;
    let assets = AssetClient::new(
        &config.services.asset_management_url,
        config.services.request_timeout_ms,
    )
    .map_err(|e| other_error("Failed to create asset-management client", e))?;
    let users = AuthServiceClient::new(&config.services.auth_url, config.services.request_timeout_ms)
        .map_err(|e| other_error("Failed to create auth client", e))?;
    let events = KafkaEventPublisher::new(&config.kafka)
        .map_err(|e| other_error("Failed to create Kafka producer", e))?;

    let service = web::Data::new(DiscussionService::new(
        Arc::new(forum),
        Arc::new(PgCategoryStore::new(pool.clone())),
        Arc::new(assets),
        Arc::new(users),
        Arc::new(events),
    ));

    // PEM keys passed through env files often carry escaped newlines.
    let public_key = config
        .jwt
        .public_key_pem
        .as_ref()
        .map(|pem| pem.replace("\\n", "\n"));
    let validator = Arc::new(
        JwtValidator::from_public_key_pem(public_key.as_deref())
            .map_err(|e| other_error("Failed to initialize JWT validation", e))?,
    );

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(service.clone())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url(ApiDoc::openapi_json_path(), ApiDoc::openapi()),
            )
            .route(
                "/metrics",
                web::get().to(discussion_service::metrics::serve_metrics),
            )
            .configure(handlers::configure)
            .wrap(JwtAuthMiddleware::new(validator.clone()))
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
    })
    .workers(config.app.workers)
    .bind(&bind_address)?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await?;
    pool.close().await;
    tracing::info!("discussion-service stopped");
    Ok(())
}
