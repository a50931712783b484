use std::{future::IntoFuture, process, sync::Arc};

use pressroom::{
    application::{
        articles::ArticleService,
        auth::{AuthService, PasswordHasher, TokenSigner},
        error::AppError,
        exchange_rates::ExchangeRateService,
        likes::LikeService,
        users::UserService,
    },
    cache::{ArticleCache, CacheBackend, CacheConfig, MemoryCache},
    config::{self, CacheSettings, Settings},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        redis::RedisCache,
        security::{Argon2PasswordHasher, JwtTokenSigner},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!("migrations applied");
    Ok(())
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let backend = init_cache_backend(&settings.cache).await;
    let state = build_http_state(repositories, backend, &settings)?;

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stop_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = &mut server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            if stop_rx.await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out; dropping open connections");
        }
    }

    info!("server stopped");
    Ok(())
}

async fn init_repositories(settings: &Settings) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

/// Redis when configured and reachable, otherwise the in-process backend.
async fn init_cache_backend(settings: &CacheSettings) -> Arc<dyn CacheBackend> {
    let Some(url) = settings.redis_url.as_deref() else {
        info!(target: "pressroom::cache", "no redis url configured; using in-process cache");
        return Arc::new(MemoryCache::new());
    };

    match RedisCache::connect(url, settings.pool_size.get()).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            warn!(
                target: "pressroom::cache",
                error = %err,
                "redis unavailable; falling back to in-process cache"
            );
            Arc::new(MemoryCache::new())
        }
    }
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    backend: Arc<dyn CacheBackend>,
    settings: &Settings,
) -> Result<HttpState, AppError> {
    let secret = settings
        .auth
        .jwt_secret
        .as_deref()
        .ok_or_else(|| InfraError::configuration("auth.jwt_secret is not configured"))?;

    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
    let signer: Arc<dyn TokenSigner> = Arc::new(JwtTokenSigner::new(
        secret.as_bytes(),
        settings.auth.token_ttl,
    ));
    let cache = Arc::new(ArticleCache::new(
        backend.clone(),
        CacheConfig::from(&settings.cache),
    ));

    Ok(HttpState {
        articles: Arc::new(ArticleService::new(
            repositories.clone(),
            repositories.clone(),
            cache,
        )),
        likes: Arc::new(LikeService::new(backend)),
        auth: Arc::new(AuthService::new(
            repositories.clone(),
            hasher.clone(),
            signer,
        )),
        users: Arc::new(UserService::new(repositories.clone(), hasher)),
        exchange_rates: Arc::new(ExchangeRateService::new(repositories.clone())),
        health: repositories,
        page_limits: settings.pagination,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
