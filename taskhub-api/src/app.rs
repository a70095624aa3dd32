/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware. The service graph is composed
/// explicitly here (state in, router out) with no container or reflection
/// involved.
///
/// # Example
///
/// ```no_run
/// use taskhub_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::middleware::security::SecurityHeadersLayer;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::auth::middleware::authenticate;
use taskhub_shared::storage::{FileStore, MAX_UPLOAD_BYTES};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Attachment file store
    pub files: FileStore,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let files = FileStore::new(config.storage.upload_root.clone());
        Self {
            db,
            config: Arc::new(config),
            files,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /v1/                          # API v1
///     ├── /auth/login               # Login (public)
///     ├── /users                    # User management
///     ├── /projects                 # Projects + membership rosters
///     ├── /tasks                    # Tasks + comments
///     ├── /comments/:id             # Comment update/delete
///     └── /attachments              # File attachments
/// ```
///
/// Everything under `/v1` except `/v1/auth` sits behind the JWT layer; a
/// request that fails authentication is rejected with 401 before any
/// handler logic runs.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new().route("/login", post(routes::auth::login));

    // Everything below requires a valid bearer token
    let protected_routes = Router::new()
        .route("/users", get(routes::users::list_users))
        .route("/users", post(routes::users::create_user))
        .route("/users/:id", get(routes::users::get_user))
        .route("/users/:id", put(routes::users::update_user))
        .route("/users/:id", delete(routes::users::delete_user))
        .route("/projects", get(routes::projects::list_projects))
        .route("/projects", post(routes::projects::create_project))
        .route("/projects/:id", get(routes::projects::get_project))
        .route("/projects/:id", put(routes::projects::update_project))
        .route("/projects/:id", delete(routes::projects::delete_project))
        .route("/projects/:id/members", post(routes::members::add_member))
        .route(
            "/projects/:id/members/:user_id",
            put(routes::members::update_member),
        )
        .route(
            "/projects/:id/members/:user_id",
            delete(routes::members::remove_member),
        )
        .route("/tasks", get(routes::tasks::list_tasks))
        .route("/tasks", post(routes::tasks::create_task))
        .route("/tasks/:id", get(routes::tasks::get_task))
        .route("/tasks/:id", put(routes::tasks::update_task))
        .route("/tasks/:id", delete(routes::tasks::delete_task))
        .route("/tasks/:id/comments", get(routes::comments::list_comments))
        .route("/tasks/:id/comments", post(routes::comments::create_comment))
        .route("/comments/:id", put(routes::comments::update_comment))
        .route("/comments/:id", delete(routes::comments::delete_comment))
        .route(
            "/attachments",
            post(routes::attachments::upload_attachment)
                // Multipart bodies carry the file; allow the limit plus
                // headroom for the other form fields.
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/attachments/:id", get(routes::attachments::get_attachment))
        .route(
            "/attachments/:id",
            delete(routes::attachments::delete_attachment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(false))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects the [`Principal`] into request
/// extensions for handlers to extract. Runs before any route logic.
///
/// [`Principal`]: taskhub_shared::auth::middleware::Principal
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let principal = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
