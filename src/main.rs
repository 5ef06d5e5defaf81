use std::panic;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use studio_live::bus::relay::{relay_handler, RelayState};
use studio_live::config::Config;
use studio_live::docs::ApiDoc;
use studio_live::handlers::AppState;
use studio_live::lifecycle::SessionLifecycleController;
use studio_live::registry::SessionRegistry;
use studio_live::routes::create_api_routes;
use studio_live::store::session_store::SessionStore;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "studio_live=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Load the persisted session list
    let store = SessionStore::new(&config.session_store_path);
    let registry = Arc::new(SessionRegistry::load(store).await);

    // The relay doubles as the controller's signal bus, so END_SESSION
    // broadcasts land on the same topics the observers' sockets are on.
    let relay = Arc::new(RelayState::new());
    let lifecycle = Arc::new(SessionLifecycleController::new(registry.clone(), relay.clone()));

    let state = Arc::new(AppState {
        registry,
        lifecycle,
        relay: relay.clone(),
    });

    // Create API routes
    let api_routes = create_api_routes(state);

    // WebSocket relay for session topics
    let relay_routes = Router::new()
        .route("/ws/sessions/:session_id", get(relay_handler))
        .with_state(relay);

    // Combine all routes
    let mut app_routes = Router::new()
        // Mount API routes
        .nest("/api", api_routes)
        // Mount the session topic relay
        .merge(relay_routes)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http());

    if config.cors_origins.is_some() {
        app_routes = app_routes.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    // Start the HTTP/API server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!(
        "📡 Session relay available at ws://{}/ws/sessions/:session_id",
        config.server_address()
    );
    info!(
        "📚 Swagger UI available at http://{}/swagger",
        config.server_address()
    );

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
