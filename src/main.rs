use std::{process, sync::Arc, time::Duration};

use tasklane::{
    application::{
        error::AppError,
        repos::{TodosRepo, TodosWriteRepo},
        todos::TodoService,
    },
    cache::{CacheAside, CacheBackend, CacheConfig, CacheStore, MemoryCacheStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        health::HealthProbe,
        http::{self, HttpState},
        redis::RedisCacheStore,
        telemetry,
    },
};
use tokio::sync::Notify;
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

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let (cache_store, cache_probe) = init_cache_store(&settings.cache).await?;

    let reader: Arc<dyn TodosRepo> = repositories.clone();
    let writer: Arc<dyn TodosWriteRepo> = repositories.clone();
    let todos = Arc::new(TodoService::new(
        reader,
        writer,
        CacheAside::new(cache_store),
        settings.cache.namespace.clone(),
    ));

    let db_probe: Arc<dyn HealthProbe> = repositories;
    let mut probes = vec![db_probe];
    probes.extend(cache_probe);

    serve_http(&settings, HttpState::new(todos, probes)).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = database_url(&settings)?;
    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "tasklane::migrate", "Migrations applied");
    Ok(())
}

fn database_url(settings: &config::Settings) -> Result<&str, AppError> {
    settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = database_url(settings)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn init_cache_store(
    cache: &CacheConfig,
) -> Result<(Arc<dyn CacheStore>, Option<Arc<dyn HealthProbe>>), AppError> {
    match cache.backend {
        CacheBackend::Memory => {
            info!(
                target = "tasklane::cache",
                backend = %cache.backend,
                namespace = cache.namespace.as_str(),
                "Using in-process cache store"
            );
            let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
            Ok((store, None))
        }
        CacheBackend::Redis => {
            let url = cache
                .url
                .as_deref()
                .ok_or_else(|| InfraError::configuration("cache url is not configured"))?;
            let store = RedisCacheStore::connect(url)
                .await
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
            store
                .ping()
                .await
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;

            info!(
                target = "tasklane::cache",
                backend = %cache.backend,
                namespace = cache.namespace.as_str(),
                "Using redis cache store"
            );
            let store = Arc::new(store);
            let probe: Arc<dyn HealthProbe> = store.clone();
            let store: Arc<dyn CacheStore> = store;
            Ok((store, Some(probe)))
        }
    }
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "tasklane::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let stop = stop.clone();
        async move { stop.notified().await }
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut server => return flatten_server_result(result),
        _ = tokio::signal::ctrl_c() => {
            info!(target = "tasklane::serve", "Shutdown request received, draining connections");
        }
    }

    stop.notify_one();
    drain(server, settings.server.graceful_shutdown).await
}

async fn drain(
    server: tokio::task::JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<(), AppError> {
    match tokio::time::timeout(grace, server).await {
        Ok(result) => flatten_server_result(result),
        Err(_) => {
            warn!(
                target = "tasklane::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

fn flatten_server_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}
