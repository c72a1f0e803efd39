//! AgoraX is a small account and meeting-room backend over a schemaless
//! document store.

#![forbid(unsafe_code)]

mod account;
pub mod config;
mod crypto;
pub mod error;
mod identity;
mod mail;
mod meeting;
mod router;
mod store;
mod token;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
pub use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub users: Arc<dyn store::DocumentStore>,
    pub meetings: Arc<dyn store::DocumentStore>,
    pub crypto: Arc<crypto::PasswordManager>,
    pub token: token::TokenManager,
    pub identity: Arc<dyn identity::IdentityProvider>,
    pub mail: Arc<dyn mail::Mailer>,
}

impl AppState {
    /// Account flows bound to the users collection.
    pub fn accounts(&self) -> account::AccountService {
        account::AccountService::new(
            Arc::clone(&self.users),
            Arc::clone(&self.crypto),
            self.token.clone(),
            Arc::clone(&self.identity),
            Arc::clone(&self.mail),
        )
    }

    /// Meeting flows bound to the meetings collection.
    pub fn rooms(&self) -> meeting::MeetingService {
        meeting::MeetingService::new(Arc::clone(&self.meetings))
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let api = Router::new()
        .nest("/auth", router::auth::router())
        .nest("/users", router::users::router())
        .nest("/meetings", router::meetings::router());

    Router::new()
        // `GET /` answers liveness probes.
        .route("/", get(router::status::handler))
        .nest("/api", api)
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read();

    let store_config = config.store.clone().unwrap_or_default();
    let (users, meetings): (Arc<dyn store::DocumentStore>, Arc<dyn store::DocumentStore>) =
        match store_config.backend {
            config::Backend::Mongodb => {
                let database = store::connect(
                    store_config
                        .address
                        .as_deref()
                        .unwrap_or(store::DEFAULT_ADDRESS),
                    store_config
                        .database
                        .as_deref()
                        .unwrap_or(store::DEFAULT_DATABASE),
                )
                .await?;

                (
                    Arc::new(store::MongoStore::new(&database, "users", "id")),
                    Arc::new(store::MongoStore::new(&database, "meetings", "id")),
                )
            },
            config::Backend::Memory => {
                tracing::warn!("no persistent backend configured, documents stay in memory");

                (
                    Arc::new(store::MemoryStore::new("id")),
                    Arc::new(store::MemoryStore::new("id")),
                )
            },
        };

    let crypto = Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    // handle jwt.
    let secret = std::env::var("JWT_SECRET")
        .expect("missing `JWT_SECRET` environment variable");
    let token = token::TokenManager::new(
        &secret,
        config.token.as_ref().and_then(|token| token.expiration),
    );

    // handle the federated identity bridge.
    let identity: Arc<dyn identity::IdentityProvider> =
        match (&config.identity, std::env::var("IDENTITY_API_KEY")) {
            (Some(cfg), Ok(api_key)) => {
                Arc::new(identity::HttpIdentityProvider::new(&cfg.endpoint, &api_key))
            },
            _ => {
                tracing::warn!("identity provider not configured, federated sign-in disabled");
                Arc::new(identity::DisabledProvider)
            },
        };

    // handle mail sender.
    let mail: Arc<dyn mail::Mailer> =
        match (&config.mail, std::env::var("MAIL_API_KEY")) {
            (Some(cfg), Ok(api_key)) => Arc::new(mail::HttpMailer::new(cfg, &api_key)),
            _ => {
                tracing::warn!("mail gateway not configured, reset emails disabled");
                Arc::new(mail::DisabledMailer)
            },
        };

    Ok(AppState {
        config,
        users,
        meetings,
        crypto,
        token,
        identity,
        mail,
    })
}
