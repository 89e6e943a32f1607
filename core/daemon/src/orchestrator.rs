//! The poll loop binding sensing, fusion, composition, and publication.
//!
//! One dedicated worker runs this loop; each cycle is fully synchronous. Any
//! error inside a cycle is caught, logged, and followed by the normal sleep —
//! the loop only ends on the shutdown flag, which is checked at the
//! inter-cycle wait. A call already in flight completes first, so shutdown
//! latency is bounded by one cycle.

use beacon_core::compose::StatusComposer;
use beacon_core::config::{Config, ConfigManager};
use beacon_core::context::{Context, UNKNOWN_APP};
use beacon_core::events::{EventBus, LogEvent};
use beacon_core::{fusion, provider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::activity_log::ActivityLog;
use crate::client::{PresenceClient, PresenceUpdate};
use crate::sensing::OsSignals;

const RELOAD_CHECK_CYCLES: u64 = 5;
const STATS_LOG_CYCLES: u64 = 10;
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

const DEFAULT_ICON: &str = "logo";

/// Presentation asset keys by display name. Priority when picking one:
/// game > browser platform > active app.
const APP_ICONS: &[(&str, &str)] = &[
    ("YouTube", "youtube"),
    ("VS Code", "vscode"),
    ("Spotify", "spotify"),
    ("Discord", "discord"),
    ("Chrome", "chrome"),
    ("Telegram", "telegram"),
    ("Steam", "steam"),
    ("GitHub", "github"),
    ("Twitch", "twitch"),
    ("VALORANT", "valorant"),
    ("League of Legends", "steam"),
    ("CS2", "steam"),
    ("CS:GO", "steam"),
];

pub struct Orchestrator {
    config: ConfigManager,
    client: PresenceClient,
    composer: StatusComposer,
    signals: OsSignals,
    activity_log: ActivityLog,
    bus: Arc<EventBus>,
    shutdown: &'static AtomicBool,
}

impl Orchestrator {
    pub fn new(
        config: ConfigManager,
        client: PresenceClient,
        activity_log: ActivityLog,
        bus: Arc<EventBus>,
        shutdown: &'static AtomicBool,
    ) -> Self {
        Self {
            config,
            client,
            composer: StatusComposer::new(),
            signals: OsSignals::new(),
            activity_log,
            bus,
            shutdown,
        }
    }

    pub fn run(&mut self) {
        let mut last_ctx: Option<Context> = None;
        let mut current_status = String::new();
        let mut offline_mode = false;
        let mut cycle: u64 = 0;

        while !self.shutdown.load(Ordering::SeqCst) {
            cycle += 1;

            if cycle % RELOAD_CHECK_CYCLES == 0 && self.config.check_reload() {
                info!(
                    interval = self.config.config().update_interval,
                    tracked = self.config.config().tracked_apps.len(),
                    "Config reloaded"
                );
                self.bus
                    .publish(LogEvent::new("config", "Configuration reloaded"));
            }
            let config = self.config.config().clone();
            let interval = Duration::from_secs(config.update_interval);

            let ctx = fusion::fuse(&self.signals, &config.tracked_apps, &config.blacklist);

            // Debounce: an unchanged snapshot with a status already showing
            // skips composition and publication entirely.
            if !ctx.has_changed(last_ctx.as_ref()) && !current_status.is_empty() {
                self.wait(interval);
                continue;
            }

            let prompt = ctx.build_prompt();
            debug!(prompt = %prompt, "Fused context");
            if !ctx.running_apps.is_empty() {
                debug!(running = ?ctx.running_apps, "Tracked apps running");
            }

            let provider = provider::resolve(config.provider, &config.api_key, &config.model);
            let new_status = self.composer.compose(&ctx, &config, provider.as_ref());

            if new_status != current_status {
                current_status = new_status;
                info!(status = %current_status, "Status changed");
                self.bus
                    .publish(LogEvent::new("status", current_status.clone()));
                self.activity_log.append(&prompt, &current_status);

                let update = presence_for(&ctx, &current_status, &config);
                match self.client.update(&update) {
                    Ok(()) => {
                        if offline_mode {
                            offline_mode = false;
                            info!("Presence connection recovered");
                            self.bus.publish(LogEvent::new("rpc", "Back online"));
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "Presence update failed");
                        self.bus
                            .publish(LogEvent::new("error", format!("RPC error: {}", err)));
                        offline_mode = true;
                        self.publish_offline(&config);
                    }
                }
            }

            last_ctx = Some(ctx);

            if cycle % STATS_LOG_CYCLES == 0 {
                self.log_stats(&config);
            }

            self.wait(interval);
        }
    }

    /// Log the final stats and tear the session down (clear, then release).
    pub fn close(&mut self) {
        let config = self.config.config().clone();
        self.log_stats(&config);
        self.client.close();
    }

    /// On sustained transport failure the peer shows a fixed fallback line
    /// rather than stale state. Best-effort by design.
    fn publish_offline(&mut self, config: &Config) {
        warn!(fallback = %config.fallback_status, "Publishing offline fallback presence");
        let update = PresenceUpdate {
            state: Some(config.fallback_status.clone()),
            large_image: Some(DEFAULT_ICON.to_string()),
            large_text: Some("Beacon — offline".to_string()),
            ..Default::default()
        };
        if let Err(err) = self.client.update(&update) {
            debug!(error = %err, "Offline fallback publish failed");
        }
    }

    fn log_stats(&self, config: &Config) {
        let stats = self.composer.stats();
        info!(
            provider = config.provider.label(),
            persona = %config.persona,
            uptime = %stats.uptime(),
            calls = stats.total_calls,
            ok = stats.successful_calls,
            success_rate = %stats.success_rate(),
            cache_hits = stats.cache_hits,
            "Engine stats"
        );
    }

    /// Cooperative cancellation point: the only place the shutdown flag is
    /// observed.
    fn wait(&self, interval: Duration) {
        let deadline = Instant::now() + interval;
        while !self.shutdown.load(Ordering::SeqCst) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(SHUTDOWN_POLL));
        }
    }
}

/// Build the published activity for a snapshot and its composed status.
fn presence_for(ctx: &Context, status: &str, config: &Config) -> PresenceUpdate {
    let details = if !ctx.game_name.is_empty() {
        Some(ctx.game_name.clone())
    } else if !ctx.active_app.is_empty() && ctx.active_app != UNKNOWN_APP {
        Some(ctx.active_app.clone())
    } else {
        None
    };

    let buttons = if config.show_button
        && !config.button_label.is_empty()
        && !config.button_url.is_empty()
    {
        vec![(config.button_label.clone(), config.button_url.clone())]
    } else {
        Vec::new()
    };

    PresenceUpdate {
        state: Some(status.to_string()),
        details,
        large_image: Some(select_icon(ctx).to_string()),
        large_text: Some(if ctx.active_app.is_empty() {
            "Beacon".to_string()
        } else {
            ctx.active_app.clone()
        }),
        small_image: Some(DEFAULT_ICON.to_string()),
        small_text: Some(format!("Beacon v{}", env!("CARGO_PKG_VERSION"))),
        buttons,
    }
}

/// First non-empty candidate with a known asset key wins; `logo` otherwise.
fn select_icon(ctx: &Context) -> &'static str {
    for candidate in [&ctx.game_name, &ctx.browser_platform, &ctx.active_app] {
        if candidate.is_empty() {
            continue;
        }
        if let Some((_, icon)) = APP_ICONS.iter().find(|(app, _)| app == candidate) {
            return icon;
        }
    }
    DEFAULT_ICON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_priority_is_game_then_platform_then_app() {
        let ctx = Context {
            game_name: "VALORANT".to_string(),
            browser_platform: "YouTube".to_string(),
            active_app: "Spotify".to_string(),
            ..Default::default()
        };
        assert_eq!(select_icon(&ctx), "valorant");

        let ctx = Context {
            browser_platform: "YouTube".to_string(),
            active_app: "Spotify".to_string(),
            ..Default::default()
        };
        assert_eq!(select_icon(&ctx), "youtube");

        let ctx = Context {
            active_app: "Spotify".to_string(),
            ..Default::default()
        };
        assert_eq!(select_icon(&ctx), "spotify");
    }

    #[test]
    fn unknown_names_fall_back_to_the_default_icon() {
        let ctx = Context {
            active_app: "Obscure App".to_string(),
            ..Default::default()
        };
        assert_eq!(select_icon(&ctx), DEFAULT_ICON);
    }

    #[test]
    fn details_prefer_the_game_over_the_active_app() {
        let config = Config::default();
        let ctx = Context {
            game_name: "CS2".to_string(),
            active_app: "CS2".to_string(),
            ..Default::default()
        };
        let update = presence_for(&ctx, "Playing CS2 🎮", &config);
        assert_eq!(update.details.as_deref(), Some("CS2"));

        let ctx = Context {
            active_app: UNKNOWN_APP.to_string(),
            ..Default::default()
        };
        let update = presence_for(&ctx, "status", &config);
        assert!(update.details.is_none());
    }

    #[test]
    fn button_requires_the_flag_plus_label_and_url() {
        let ctx = Context::default();
        let mut config = Config::default();
        config.show_button = true;
        config.button_label = "⚡ Beacon".to_string();
        assert!(presence_for(&ctx, "s", &config).buttons.is_empty());

        config.button_url = "https://beacon.example".to_string();
        let update = presence_for(&ctx, "s", &config);
        assert_eq!(update.buttons.len(), 1);

        config.show_button = false;
        assert!(presence_for(&ctx, "s", &config).buttons.is_empty());
    }
}
