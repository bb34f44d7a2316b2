mod assistant;
mod billing;
mod config;
mod enrollment;
mod errors;
mod handlers;
mod inactivity;
mod notify;
mod payments;
mod resolver;
mod subscriptions;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Main entry point.
///
/// Initializes tracing and configuration, builds the remote platform clients,
/// starts the notification worker, and serves the HTTP routes with CORS,
/// request-size and rate limiting middleware.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_billing_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Remote platform clients
    let flexge = enrollment::FlexgeClient::new(
        config.flexge_base_url.clone(),
        config.flexge_api_key.clone(),
    )?;
    tracing::info!("Flexge client initialized: {}", config.flexge_base_url);

    let asaas =
        billing::AsaasClient::new(config.asaas_base_url.clone(), config.asaas_api_key.clone())?;
    tracing::info!("Asaas client initialized: {}", config.asaas_base_url);

    let assistant = assistant::OpenAiClient::new(
        "https://api.openai.com/v1".to_string(),
        config.openai_api_key.clone(),
    )?;

    // Notification side channel: mail + WhatsApp behind a worker so workflows
    // never wait on delivery.
    let mailer = notify::Mailer::new(&config)?;
    let zaia = notify::ZaiaClient::new(
        config.zaia_base_url.clone(),
        config.zaia_api_key.clone(),
        config.zaia_agent_id,
    )?;
    let notifier = notify::start_notification_worker(mailer, zaia);
    tracing::info!("Notification worker started");

    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        flexge,
        asaas,
        assistant,
        notifier,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    let protected_routes = Router::new()
        .route("/analyze-image", post(handlers::analyze_image))
        .route("/grammar-explanation", post(handlers::grammar_explanation))
        .route("/enable-student", post(handlers::enable_student))
        .route("/check-inactivity", get(handlers::check_inactivity))
        .route("/send-charge", post(handlers::send_charge))
        .route("/resend-charge", post(handlers::resend_charge))
        .route(
            "/switch-subscription-card",
            post(handlers::switch_subscription_card),
        )
        .route(
            "/switch-subscription-boleto",
            post(handlers::switch_subscription_boleto),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit matches the image upload cap
                .layer(RequestBodyLimitLayer::new(config::MAX_UPLOAD_BYTES))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
