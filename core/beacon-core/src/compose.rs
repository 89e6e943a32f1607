//! Status composition: a literal template for media, an AI-backed
//! storyteller for everything else.
//!
//! Composition must always return usable text. Provider failures, empty
//! responses, and guardrail prompts all resolve to the configured fallback
//! status; nothing propagates past this module.

use crate::cache::{EngineStats, StatusCache};
use crate::config::Config;
use crate::context::{Context, IDLE_PROMPT, UNKNOWN_APP};
use crate::patterns::HIDDEN_SENTINEL;
use crate::persona;
use crate::provider::TextProvider;

/// Hard ceiling for any status line shown to the peer.
pub const MAX_STATUS_LEN: usize = 128;

const TRACK_CAP: usize = 40;
const ARTIST_CAP: usize = 20;
const VIDEO_TITLE_CAP: usize = 50;
const SANITIZE_PASSES: usize = 3;

/// Deterministic template composition for media snapshots. Titles are shown
/// literally; no provider is involved. Returns `None` when the snapshot has
/// no usable media, in which case the caller should use the storyteller.
pub fn direct_status(ctx: &Context) -> Option<String> {
    if !ctx.game_name.is_empty() {
        return Some(enforce_direct_cap(format!("Playing {} 🎮", ctx.game_name)));
    }

    let mut media_part = String::new();

    if ctx.browser_platform == "YouTube" && !ctx.browser_page_title.is_empty() {
        let mut title = ctx.browser_page_title.trim();
        for suffix in [" - YouTube", " — YouTube"] {
            if let Some(stripped) = title.strip_suffix(suffix) {
                title = stripped.trim_end();
            }
        }
        media_part = format!(
            "Watching \"{}\" on YouTube 🎵",
            cap_with_ellipsis(title, VIDEO_TITLE_CAP)
        );
    }

    // A playing track wins over a YouTube tab when both exist.
    if !ctx.media_track.is_empty() {
        let track = cap_with_ellipsis(&ctx.media_track, TRACK_CAP);
        media_part = if ctx.media_artist.is_empty() {
            format!("Listening to \"{}\" 🎧", track)
        } else {
            format!(
                "Listening to \"{}\" by {} 🎧",
                track,
                cap_with_ellipsis(&ctx.media_artist, ARTIST_CAP)
            )
        };
    }

    if media_part.is_empty() {
        return None;
    }

    let activity_part = if !ctx.editor_file.is_empty() {
        let project = if ctx.editor_project.is_empty() {
            String::new()
        } else {
            format!(" ({})", ctx.editor_project)
        };
        format!("editing {}{}", ctx.editor_file, project)
    } else if ctx.is_messaging {
        "chatting".to_string()
    } else if ctx.active_app == "Discord" {
        "hanging out on Discord".to_string()
    } else if !matches!(
        ctx.active_app.as_str(),
        "" | UNKNOWN_APP | "Browser" | "explorer"
    ) && ctx.active_app != HIDDEN_SENTINEL
    {
        format!("using {}", ctx.active_app)
    } else {
        String::new()
    };

    let status = if activity_part.is_empty() {
        media_part
    } else {
        format!("{} while {}", media_part, activity_part)
    };

    Some(enforce_direct_cap(status))
}

/// Strip the wrapping a model tends to add — quotes, backticks, bullets,
/// markdown — then enforce the length ceiling, breaking on the last
/// whitespace when it falls past the midpoint.
pub fn sanitize(text: &str) -> String {
    let mut text = text.to_string();
    for _ in 0..SANITIZE_PASSES {
        text = text
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .trim_matches('`')
            .to_string();
        loop {
            let stripped = text
                .strip_prefix("- ")
                .or_else(|| text.strip_prefix("• "))
                .or_else(|| text.strip_prefix("* "))
                .or_else(|| text.strip_prefix("# "));
            match stripped {
                Some(rest) => text = rest.to_string(),
                None => break,
            }
        }
    }

    let mut text = text.trim().to_string();
    while let Some(first) = text.chars().next() {
        if matches!(first, '-' | '•' | '"' | '\'' | '`' | '#' | '*' | '>') {
            text = text[first.len_utf8()..].trim_start().to_string();
        } else {
            break;
        }
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_STATUS_LEN {
        return text;
    }
    let truncated: String = chars[..MAX_STATUS_LEN - 1].iter().collect();
    let cut = match truncated.rfind(' ') {
        Some(pos) if truncated[..pos].chars().count() > MAX_STATUS_LEN / 2 => &truncated[..pos],
        _ => truncated.as_str(),
    };
    format!("{}…", cut.trim_end())
}

fn cap_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

fn enforce_direct_cap(status: String) -> String {
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }
    let kept: String = status.chars().take(MAX_STATUS_LEN - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Narrative composition with a short-term cache and recent-output history.
pub struct StatusComposer {
    cache: StatusCache,
    stats: EngineStats,
}

impl StatusComposer {
    pub fn new() -> Self {
        Self {
            cache: StatusCache::new(),
            stats: EngineStats::new(),
        }
    }

    #[cfg(test)]
    fn with_cache(cache: StatusCache) -> Self {
        Self {
            cache,
            stats: EngineStats::new(),
        }
    }

    /// Compose the status for a snapshot: literal when it has media, the
    /// storyteller otherwise (and as fallback when the literal part is
    /// empty).
    pub fn compose(
        &mut self,
        ctx: &Context,
        config: &Config,
        provider: &dyn TextProvider,
    ) -> String {
        if ctx.has_media() {
            if let Some(status) = direct_status(ctx) {
                return status;
            }
        }
        let prompt = ctx.build_prompt();
        self.narrative(&prompt, config, provider)
    }

    /// Generate a storyteller status for a fused prompt.
    pub fn narrative(
        &mut self,
        prompt: &str,
        config: &Config,
        provider: &dyn TextProvider,
    ) -> String {
        if prompt.trim().is_empty() || prompt == IDLE_PROMPT {
            return config.fallback_status.clone();
        }

        if let Some(cached) = self.cache.get(prompt) {
            self.stats.cache_hits += 1;
            return cached;
        }

        self.stats.total_calls += 1;
        let system = persona::build_system_instruction(config);
        let user = self.user_prompt(prompt);

        match provider.generate(&system, &user) {
            Ok(text) => {
                let status = sanitize(&text);
                if status.is_empty() {
                    self.stats.failed_calls += 1;
                    tracing::warn!("Storyteller returned nothing usable after sanitizing");
                    return config.fallback_status.clone();
                }
                self.stats.successful_calls += 1;
                self.cache.set(prompt, &status);
                status
            }
            Err(err) => {
                self.stats.failed_calls += 1;
                tracing::warn!(error = %err, "Storyteller generation failed");
                config.fallback_status.clone()
            }
        }
    }

    fn user_prompt(&self, context: &str) -> String {
        let recent = self.cache.recent();
        if recent.is_empty() {
            return context.to_string();
        }
        let avoid = recent
            .iter()
            .map(|status| format!("\"{}\"", status))
            .collect::<Vec<_>>()
            .join(" | ");
        format!(
            "{}\n\nPREVIOUS STATUSES (write something different): {}",
            context, avoid
        )
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}

impl Default for StatusComposer {
    fn default() -> Self {
        Self::new()
    }
}
