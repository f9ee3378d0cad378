//! Pagecraft access API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use pagecraft_application::{
    AccessService, AssignmentService, ContextResolver, PolicyService, RoleService,
};
use pagecraft_core::{AppError, OrgId};
use pagecraft_domain::CapabilityRegistry;
use pagecraft_infrastructure::{
    PostgresAccessRepository, PostgresAuditRepository, PostgresDirectoryRepository,
    TenantScopeRegistry,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let bootstrap_org_id = env::var("PAGECRAFT_BOOTSTRAP_ORG_ID")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| OrgId::parse(value.as_str()))
        .transpose()
        .map_err(|error| {
            AppError::Validation(format!("invalid PAGECRAFT_BOOTSTRAP_ORG_ID: {error}"))
        })?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let registry = Arc::new(CapabilityRegistry::builtin()?);
    let access_repository = Arc::new(PostgresAccessRepository::new(pool.clone()));
    let directory_repository = Arc::new(PostgresDirectoryRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));

    let role_service = RoleService::new(
        registry.clone(),
        access_repository.clone(),
        access_repository.clone(),
        audit_repository.clone(),
    );
    let assignment_service = AssignmentService::new(
        access_repository.clone(),
        access_repository.clone(),
        directory_repository.clone(),
        audit_repository.clone(),
    );
    let policy_service = PolicyService::new(
        registry.clone(),
        access_repository.clone(),
        audit_repository,
    );
    let access_service = AccessService::new(
        registry,
        access_repository.clone(),
        access_repository.clone(),
        access_repository,
    );
    let context_resolver = ContextResolver::new(directory_repository);

    if let Some(org_id) = bootstrap_org_id {
        role_service.ensure_system_roles(org_id).await?;
        info!(%org_id, "system roles seeded for bootstrap organization");
    }

    let app_state = AppState {
        access_service,
        role_service,
        assignment_service,
        policy_service,
        context_resolver,
        isolation: Arc::new(TenantScopeRegistry::new()),
    };

    let protected_routes = Router::new()
        .route(
            "/api/access/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/access/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .patch(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/access/assignments",
            get(handlers::assignments::list_assignments_handler)
                .post(handlers::assignments::create_assignment_handler),
        )
        .route(
            "/api/access/assignments/{assignment_id}",
            axum::routing::delete(handlers::assignments::delete_assignment_handler),
        )
        .route(
            "/api/access/policies",
            get(handlers::policies::list_policies_handler)
                .put(handlers::policies::upsert_policy_handler),
        )
        .route(
            "/api/access/capabilities",
            get(handlers::capabilities::list_capabilities_handler),
        )
        .route(
            "/api/access/me/capabilities",
            get(handlers::capabilities::effective_capabilities_handler),
        )
        .route(
            "/api/access/check",
            post(handlers::capabilities::check_capability_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::resolve_tenant,
        ))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "pagecraft-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
