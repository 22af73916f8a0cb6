use std::{fs, io, process, sync::OnceLock};

use application::{browse, config, Args, Config, Session};
use service::{
    browse::{coordinator::Queries, State},
    infra::{Memory, Rest},
    Service,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    if start().await.is_err() {
        process::exit(1);
    }
}

async fn start() -> Result<(), ()> {
    let Args {
        config,
        fixture,
        scope,
        filters,
        relative_dates,
        find,
    } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let config = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(config.log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let session = Session {
        scope: scope.into_scope(config.browse.statuses.iter().copied()),
        params: filters,
        relative_dates,
        find,
    };

    if let Some(path) = fixture {
        let json = fs::read_to_string(&path).map_err(|e| {
            log::error!("failed to read `{path}`: {e}");
        })?;
        let memory = Memory::from_json(&json).map_err(|e| {
            log::error!("failed to load dataset from `{path}`: {e}");
        })?;
        log::info!("browsing dataset `{path}`");
        let service = Service::new((&config.browse).into(), memory);
        run(service, &config, session).await
    } else {
        let config::Backend {
            url,
            api_key,
            currency,
        } = config.backend.clone();
        log::info!("browsing `{url}`");
        let rest = Rest::new(url, api_key, currency);
        let service = Service::new((&config.browse).into(), rest);
        run(service, &config, session).await
    }
}

async fn run<S: Queries>(
    service: S,
    config: &Config,
    session: Session,
) -> Result<(), ()> {
    let coordinator = browse(service, io::stdout(), config, session).await;
    match coordinator.state() {
        State::Rendered(_) => Ok(()),
        State::Idle | State::Loading { .. } | State::Failed(_) => Err(()),
    }
}
