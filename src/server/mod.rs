//! HTTP server setup and routing

use crate::api;
use crate::cache::{CacheStore, MemoryStore, RedisStore};
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{
    ActivityRepositoryImpl, ArticleRepositoryImpl, NotificationRepositoryImpl,
    SavedArticleRepositoryImpl, UserRepositoryImpl, WriterRequestRepositoryImpl,
};
use crate::service::{
    ActivityService, ArticleService, NotificationService, SavedArticleService, UserService,
    WriterRequestService,
};
use crate::session::{ProfileEvents, SessionCache, SessionService};
use crate::state::HasJwt;
use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub article_service: Arc<ArticleService<ArticleRepositoryImpl, UserRepositoryImpl>>,
    pub user_service: Arc<UserService<UserRepositoryImpl>>,
    pub writer_request_service: Arc<
        WriterRequestService<
            WriterRequestRepositoryImpl,
            UserRepositoryImpl,
            NotificationRepositoryImpl,
        >,
    >,
    pub saved_article_service: Arc<
        SavedArticleService<SavedArticleRepositoryImpl, ArticleRepositoryImpl, UserRepositoryImpl>,
    >,
    pub notification_service:
        Arc<NotificationService<NotificationRepositoryImpl, UserRepositoryImpl>>,
    pub activity_service: Arc<ActivityService<ActivityRepositoryImpl, UserRepositoryImpl>>,
    pub session_service: Arc<SessionService<dyn CacheStore, UserRepositoryImpl>>,
    pub session_cache: Arc<SessionCache<dyn CacheStore>>,
    pub profile_events: Arc<ProfileEvents>,
    pub jwt_manager: JwtManager,
}

impl HasJwt for AppState {
    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }
}

impl AppState {
    pub fn build(config: Config, db_pool: MySqlPool, store: Arc<dyn CacheStore>) -> Self {
        let users = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
        let articles = Arc::new(ArticleRepositoryImpl::new(db_pool.clone()));
        let writer_requests = Arc::new(WriterRequestRepositoryImpl::new(db_pool.clone()));
        let saved_articles = Arc::new(SavedArticleRepositoryImpl::new(db_pool.clone()));
        let notifications = Arc::new(NotificationRepositoryImpl::new(db_pool.clone()));
        let activities = Arc::new(ActivityRepositoryImpl::new(db_pool.clone()));

        let profile_events = Arc::new(ProfileEvents::new());
        let session_cache = Arc::new(SessionCache::new(store, &config.session_cache));
        let jwt_manager = JwtManager::new(&config.jwt);

        Self {
            article_service: Arc::new(ArticleService::new(articles.clone(), users.clone())),
            user_service: Arc::new(UserService::new(users.clone(), profile_events.clone())),
            writer_request_service: Arc::new(WriterRequestService::new(
                writer_requests,
                users.clone(),
                notifications.clone(),
                profile_events.clone(),
            )),
            saved_article_service: Arc::new(SavedArticleService::new(
                saved_articles,
                articles,
                users.clone(),
            )),
            notification_service: Arc::new(NotificationService::new(notifications, users.clone())),
            activity_service: Arc::new(ActivityService::new(activities, users.clone())),
            session_service: Arc::new(SessionService::new(
                session_cache.clone(),
                users,
                profile_events.clone(),
            )),
            session_cache,
            profile_events,
            jwt_manager,
            config: Arc::new(config),
            db_pool,
        }
    }
}

/// Run the server
pub async fn run(config: Config) -> Result<()> {
    crate::migration::run_migrations(&config).await?;

    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    let store: Arc<dyn CacheStore> = if config.redis.enabled {
        info!("Using Redis session cache at {}", config.redis.url);
        Arc::new(RedisStore::new(&config.redis).await?)
    } else {
        info!("Using in-memory session cache");
        Arc::new(MemoryStore::new())
    };

    let http_addr = config.http_addr();
    let state = AppState::build(config, db_pool, store);
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with all routes
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.cors_allowed_origins);

    Router::new()
        // Health
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready))
        // Session
        .route("/api/v1/session/permissions", get(api::session::permissions))
        .route("/api/v1/session/logout", post(api::session::logout))
        // Users
        .route("/api/v1/users", get(api::user::list).post(api::user::create))
        .route("/api/v1/users/me", get(api::user::me))
        .route(
            "/api/v1/users/{uid}",
            get(api::user::get)
                .put(api::user::update)
                .delete(api::user::delete),
        )
        // Articles
        .route(
            "/api/v1/articles",
            get(api::article::list).post(api::article::create),
        )
        .route(
            "/api/v1/articles/{id}",
            get(api::article::get)
                .put(api::article::update)
                .delete(api::article::delete),
        )
        // Writer requests
        .route(
            "/api/v1/writer-requests",
            get(api::writer_request::list).post(api::writer_request::create),
        )
        .route(
            "/api/v1/writer-requests/{id}",
            get(api::writer_request::get).delete(api::writer_request::delete),
        )
        .route(
            "/api/v1/writer-requests/{id}/approve",
            post(api::writer_request::approve),
        )
        .route(
            "/api/v1/writer-requests/{id}/deny",
            post(api::writer_request::deny),
        )
        // Saved articles
        .route(
            "/api/v1/saved-articles",
            get(api::saved_article::list).post(api::saved_article::create),
        )
        .route(
            "/api/v1/saved-articles/{id}",
            get(api::saved_article::get).delete(api::saved_article::delete),
        )
        // Notifications
        .route(
            "/api/v1/notifications",
            get(api::notification::list).post(api::notification::create),
        )
        .route(
            "/api/v1/notifications/{id}",
            get(api::notification::get).delete(api::notification::delete),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            put(api::notification::mark_read),
        )
        // Activity
        .route(
            "/api/v1/activity",
            get(api::activity::list).post(api::activity::record),
        )
        .route("/api/v1/activity/{id}", get(api::activity::get))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
