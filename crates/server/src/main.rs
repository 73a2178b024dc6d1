//! Blog server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use blog_api::{AppState, router as api_router};
use blog_common::Config;
use blog_core::{
    ArticleService, CommentService, EmailService, LikeService, RecoveryService, TokenService,
    UserService, VerificationCodeCache,
};
use blog_db::repositories::{
    CategoryRepository, CommentRepository, DraftRepository, LikeRepository, PostRepository,
    ReplyRepository, TagRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Drops expired verification codes every `every`.
fn spawn_code_sweeper(codes: VerificationCodeCache, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = codes.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Purged expired verification codes");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting blog server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = blog_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    blog_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let draft_repo = DraftRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reply_repo = ReplyRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));

    // Initialize services
    let tokens = TokenService::new(&config.auth);
    let codes = VerificationCodeCache::new(&config.verification);
    let email = EmailService::new(config.email.as_ref())?;
    if !email.is_enabled() {
        info!("SMTP not configured, outgoing mail will be logged");
    }

    let article_service = ArticleService::new(
        Arc::clone(&db),
        post_repo.clone(),
        draft_repo.clone(),
        category_repo,
        tag_repo,
        comment_repo.clone(),
        reply_repo.clone(),
        like_repo.clone(),
        user_repo.clone(),
    );
    let comment_service = CommentService::new(
        Arc::clone(&db),
        post_repo.clone(),
        comment_repo.clone(),
        reply_repo.clone(),
        like_repo.clone(),
        user_repo.clone(),
    );
    let like_service = LikeService::new(Arc::clone(&db), comment_repo, reply_repo, like_repo);
    let user_service = UserService::new(
        user_repo.clone(),
        post_repo,
        draft_repo,
        tokens.clone(),
        &config.auth,
    );
    let recovery_service = RecoveryService::new(
        user_repo,
        user_service.clone(),
        codes.clone(),
        tokens,
        email,
        &config.server.url,
    );

    spawn_code_sweeper(
        codes,
        Duration::from_secs(config.verification.sweep_interval_secs.max(1)),
    );

    let state = AppState {
        article_service,
        comment_service,
        like_service,
        user_service,
        recovery_service,
    };

    // Build router
    let app = Router::new()
        .merge(api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            blog_api::auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
