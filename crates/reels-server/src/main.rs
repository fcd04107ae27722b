mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use reels_api::auth::{AppState, AppStateInner};
use reels_db::Database;
use reels_notify::{Dispatcher, HttpMailer, LogMailer, Mailer};
use reels_payments::{PaymentGateway, StripeGateway};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reels=debug,reels_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            std::process::exit(1);
        }
    };

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let mailer: Arc<dyn Mailer> = match &config.mail {
        Some(mail) => {
            info!("Sending email through {}", mail.api_url);
            Arc::new(HttpMailer::new(mail.api_url.clone(), mail.api_key.clone(), mail.from.clone())?)
        }
        None => {
            warn!("REELS_MAIL_API_URL not set; outgoing email will only be logged");
            Arc::new(LogMailer)
        }
    };

    let payments: Option<Arc<dyn PaymentGateway>> = match &config.stripe_secret_key {
        Some(key) => {
            let gateway = StripeGateway::new(key.clone(), config.stripe_api_base.clone())?;
            Some(Arc::new(gateway) as Arc<dyn PaymentGateway>)
        }
        None => {
            warn!("REELS_STRIPE_SECRET_KEY not set; payment routes are disabled");
            None
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: chrono::Duration::minutes(config.token_ttl_minutes),
        dispatcher: Dispatcher::new(db, mailer),
        payments,
        frontend_url: config.frontend_url.clone(),
        currency: config.currency.clone(),
        require_verified_email: config.require_verified_email,
    });

    let app = reels_api::router(state)
        .layer(cors(&config.allowed_origins)?)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Reels server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn cors(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }

    let origins = allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;
    info!("CORS restricted to {} origin(s)", origins.len());
    Ok(layer.allow_origin(origins).allow_credentials(true))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
