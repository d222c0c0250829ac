use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{Local, NaiveTime, Utc};
use chrono_tz::Tz;
use fanctl_common::{ConfigError, ControlPolicy, FanEngine, LoggingConfig, RuntimeConfig};
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::{ipmi::IpmiTool, scheduler::Scheduler};

const DEFAULT_CONFIG_PATH: &str = "./fanctl.json";

pub async fn run() -> anyhow::Result<()> {
    let config_path = std::env::var("FANCTL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let loaded = load_runtime_config(&config_path)
        .await
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    let policy = config
        .validate()
        .context("invalid fan control configuration")?;
    let clock = WallClock::from_config(config.timezone.as_deref())
        .context("invalid fan control configuration")?;

    let _log_guard = init_tracing(&config.logging)?;
    if !found {
        info!("no config at {}, using defaults", config_path.display());
    }

    log_startup(&config, &policy);

    let gateway = IpmiTool::new(&config.ipmi, policy.command_timeout);
    let mut scheduler = Scheduler::new(gateway, FanEngine::new(policy), move || clock.now());

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        watch_signals(tokio::signal::ctrl_c, shutdown_tx).await;
        warn!("received second shutdown signal, exiting without waiting for the current cycle");
        std::process::exit(130);
    });

    scheduler
        .run_until(async {
            let _ = shutdown_rx.await;
        })
        .await;

    info!("fan controller exited");
    Ok(())
}

/// The first signal asks the loop to stop after the current cycle. Returns
/// on the second signal, when the caller should exit at once.
async fn watch_signals<F, Fut>(mut next_signal: F, shutdown_tx: oneshot::Sender<()>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = next_signal().await {
        error!("failed to listen for shutdown signal: {err}");
        // Keep the sender alive so the loop never sees a spurious shutdown.
        std::future::pending::<()>().await;
        drop(shutdown_tx);
        return;
    }

    info!("received shutdown signal, stopping after the current cycle");
    let _ = shutdown_tx.send(());

    if let Err(err) = next_signal().await {
        warn!("failed to listen for a second shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

/// Stdout plus, when `logging.dir` is set, a daily rotating file. The
/// returned guard flushes the file writer on drop.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    match std::env::var("FANCTL_LOG_FORMAT").as_deref() {
        Ok("plain") => layers.push(
            fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .boxed(),
        ),
        _ => layers.push(fmt::layer().with_thread_names(true).boxed()),
    }

    let guard = match logging.dir.as_deref() {
        Some(dir) => {
            let appender = file_appender(Path::new(dir), logging)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .with_ansi(false)
                    .with_thread_names(true)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry().with(layers).with(filter).init();

    Ok(guard)
}

fn file_appender(dir: &Path, logging: &LoggingConfig) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(logging.file_name.clone())
        .max_log_files(logging.retention_days)
        .build(dir)
        .with_context(|| format!("failed to open log file in {}", dir.display()))
}

/// `None` when there is no file at `path`.
async fn load_runtime_config(path: &Path) -> anyhow::Result<Option<RuntimeConfig>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(Some(RuntimeConfig::from_json_slice(&raw)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn apply_env_overrides(config: &mut RuntimeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("IPMI_HOST") {
        config.ipmi.host = host;
    }
    if let Some(user) = lookup("IPMI_USER") {
        config.ipmi.user = user;
    }
    if let Some(password) = lookup("IPMI_PASSWORD") {
        config.ipmi.password = password;
    }
    if let Some(cmd) = lookup("IPMITOOL_CMD") {
        config.ipmi.ipmitool_cmd = cmd;
    }
}

fn log_startup(config: &RuntimeConfig, policy: &ControlPolicy) {
    info!("IPMI fan controller starting");
    info!(
        "poll interval {}s, target host {}",
        policy.interval.as_secs(),
        config.ipmi.host
    );

    if policy.night.enabled {
        info!(
            "night limit enabled: {}, max {}%",
            policy.night.window, policy.night.max_percent
        );
    } else {
        info!("night limit disabled");
    }
}

/// Source of wall-clock time for the night window.
#[derive(Debug, Clone, Copy)]
enum WallClock {
    Local,
    Zone(Tz),
}

impl WallClock {
    fn from_config(timezone: Option<&str>) -> Result<Self, ConfigError> {
        match timezone {
            None => Ok(Self::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Zone)
                .map_err(|_| ConfigError::InvalidTimezone(name.to_string())),
        }
    }

    fn now(&self) -> NaiveTime {
        match self {
            Self::Local => Local::now().time(),
            Self::Zone(tz) => Utc::now().with_timezone(tz).time(),
        }
    }
}
