use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_cors::Cors;
use actix_web::{
    http::{header, Method},
    middleware::Logger,
    web, App, HttpServer,
};
use env_logger::Env;
use log::{debug, info, warn};

use crate::{
    config::{Config, Environment, SiteConfig},
    db::Database,
    errors::AppError,
    middleware::{security_headers, RequestLogger},
    routes,
    services::{
        self, email::HttpMailer, rate_limiter::{spawn_cleanup, RateLimiter},
        ConsultationServiceType, ConsultationSettings,
    },
    types::AppState,
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> Result<(), AppError> {
    // Configure log level based on environment and config
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info,sqlx=warn".to_string(),
        Environment::Production => "info,actix_web=warn,sqlx=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

/// CORS for the configured origins; with none configured only same-origin
/// requests get through.
fn cors(site: &SiteConfig) -> Cors {
    site.cors_allowed_origins.iter().fold(
        Cors::default()
            .allowed_methods([Method::GET, Method::POST, Method::PATCH])
            .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(3600),
        |cors, origin| cors.allowed_origin(origin),
    )
}

pub async fn server() -> AppResult<()> {
    // Load application configuration
    let config = Config::load()?;

    // Setup enhanced logging based on configuration
    setup_logging(&config)?;

    // Capture start time for uptime calculation
    let start_time = Instant::now();

    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );

    if config.app.environment == Environment::Development {
        debug!("Debug logging enabled");
    }
    if config.admin.api_key.is_none() {
        warn!("ADMIN_API_KEY is not set, admin endpoints will reject every request");
    }
    if config.site.ip_hash_salt.is_empty() {
        warn!("IP_HASH_SALT is not set, client fingerprints use an empty salt");
    }
    if config.email.provider.is_none() {
        warn!("EMAIL_SERVICE_PROVIDER is not set, notification emails are disabled");
    }

    let db = Database::connect(&config.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    // One limiter for the whole process, shared by every worker
    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    let cleanup = spawn_cleanup(
        Arc::clone(&limiter),
        Duration::from_secs(config.rate_limit.cleanup_interval_seconds),
    );

    let mailer = HttpMailer::new(config.email.clone())
        .map_err(|e| AppError::Config(format!("Failed to build email client: {}", e)))?;

    let consultation_service = services::build(
        db.clone(),
        mailer,
        limiter,
        ConsultationSettings {
            notify_address: config.email.notify_address.clone(),
            ip_hash_salt: config.site.ip_hash_salt.clone(),
        },
    );

    let state = web::Data::new(AppState {
        start_time,
        db: db.clone(),
        version: config.app.version.clone(),
        secure: config.app.environment == Environment::Production,
    });

    // Determine if we should enable more verbose logging
    let enable_debug_logging = config.app.environment != Environment::Production;

    // Access log never includes the peer address
    let log_format = if enable_debug_logging {
        "\"%r\" %s %b %T \"%{Referer}i\" \"%{User-Agent}i\" %{X-Request-ID}i"
    } else {
        "\"%r\" %s %b %T"
    };

    let app_config = config.clone();

    HttpServer::new(move || {
        let payload_limit = app_config.server.payload_limit_bytes;

        App::new()
            .app_data(state.clone())
            .app_data(web::Data::new(app_config.admin.clone()))
            .app_data(web::Data::new(app_config.rate_limit.clone()))
            .app_data(routes::json_config(payload_limit))
            .app_data(routes::form_config(payload_limit))
            .configure(|cfg| services::register(consultation_service.clone(), cfg))
            .wrap(RequestLogger::new(enable_debug_logging))
            .wrap(cors(&app_config.site))
            .wrap(security_headers())
            .wrap(Logger::new(log_format))
            .configure(routes::configure_routes::<ConsultationServiceType>)
            .service(routes::spa_service(&app_config.site.static_dir))
    })
    .workers(config.server.workers)
    .bind((config.server.host.to_string(), config.server.port))?
    .run()
    .await?;

    cleanup.abort();
    db.shutdown().await;

    Ok(())
}
