//! Beacon daemon entrypoint.
//!
//! A single-writer service: one worker owns the poll loop, the presence
//! session, and the activity log. Startup is the only fatal path — a missing
//! config or an exhausted connection retry exits the process; everything
//! after that degrades gracefully.

use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use beacon_core::config::ConfigManager;
use beacon_core::events::EventBus;

mod activity_log;
mod backoff;
mod client;
mod orchestrator;
mod sensing;

use activity_log::ActivityLog;
use client::PresenceClient;
use orchestrator::Orchestrator;

const CONFIG_FILE: &str = "config.json";
const ACTIVITY_LOG_FILE: &str = "status_history.log";

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "beacon-daemon", version, about = "Publishes desktop activity as rich presence")]
struct Args {
    /// Configuration file (defaults to ~/.beacon/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Activity log file (defaults to ~/.beacon/status_history.log)
    #[arg(long)]
    activity_log: Option<PathBuf>,
}

fn main() {
    init_logging();
    let args = Args::parse();

    let config_path = args
        .config
        .or_else(|| beacon_dir_file(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    let config = match ConfigManager::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, path = %config_path.display(), "Failed to load configuration");
            std::process::exit(1);
        }
    };
    info!(
        path = %config_path.display(),
        provider = config.config().provider.label(),
        persona = %config.config().persona,
        interval = config.config().update_interval,
        tracked = config.config().tracked_apps.len(),
        "Configuration loaded"
    );

    install_signal_handlers();

    let client = connect_with_retry(&config.config().client_id);

    let activity_log_path = args
        .activity_log
        .or_else(|| beacon_dir_file(ACTIVITY_LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(ACTIVITY_LOG_FILE));
    let activity_log = ActivityLog::new(activity_log_path);

    let bus = Arc::new(EventBus::new());
    let mut orchestrator = Orchestrator::new(config, client, activity_log, bus, &SHUTDOWN);

    info!("Main loop started; stop with Ctrl+C");
    orchestrator.run();

    info!("Shutting down");
    orchestrator.close();
    info!("Beacon stopped");
}

fn connect_with_retry(client_id: &str) -> PresenceClient {
    let mut client = PresenceClient::new(client_id);
    for attempt in 1..=backoff::MAX_ATTEMPTS {
        info!(attempt, max = backoff::MAX_ATTEMPTS, "Connecting to the presence endpoint");
        match client.connect() {
            Ok(()) => {
                info!(
                    session_start = client.session_start(),
                    "Presence connection established"
                );
                return client;
            }
            Err(err) => warn!(error = %err, "Connection failed"),
        }
        if SHUTDOWN.load(Ordering::SeqCst) {
            break;
        }
        if attempt < backoff::MAX_ATTEMPTS {
            let delay = backoff::delay_after_attempt(attempt);
            info!(delay_secs = delay.as_secs(), "Retrying after backoff");
            thread::sleep(delay);
        }
    }
    error!("Could not connect: is the chat client running, and is client_id correct?");
    std::process::exit(1);
}

fn init_logging() {
    let debug_enabled = std::env::var("BEACON_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn beacon_dir_file(name: &str) -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".beacon").join(name))
}

extern "C" fn handle_shutdown_signal(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

fn install_signal_handlers() {
    let handler = handle_shutdown_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    unsafe {
        libc::signal(libc::SIGINT, handler);
        #[cfg(unix)]
        libc::signal(libc::SIGTERM, handler);
    }
}
