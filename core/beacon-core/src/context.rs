//! The fused activity snapshot and change detection.

/// Prompt used when nothing was sensed this cycle. The composer treats it as
/// a guardrail and never sends it to a provider.
pub const IDLE_PROMPT: &str = "At the computer";

/// Display name used when no foreground process could be identified.
pub const UNKNOWN_APP: &str = "Unknown";

const TITLE_PROMPT_CAP: usize = 80;

/// Everything the user is doing simultaneously, captured for one poll cycle.
///
/// A snapshot is immutable once built: fusion always produces a new instance
/// and never mutates a prior one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    // Foreground window
    pub active_app: String,
    pub active_title: String,
    pub process_name: String,

    // Code editor (foreground or background)
    pub editor_file: String,
    pub editor_project: String,

    // Media player (background scan)
    pub media_track: String,
    pub media_artist: String,

    // Browser
    pub browser_platform: String,
    pub browser_page_title: String,

    // Game (overrides all other presentation)
    pub game_name: String,

    /// Friendly names of tracked executables currently running, sorted.
    pub running_apps: Vec<String>,

    /// Forces title scrubbing when the foreground process is a messaging app.
    pub is_messaging: bool,
}

impl Context {
    /// Whether publishing a new presence update is warranted.
    ///
    /// `None` for `prev` (first cycle) always counts as changed.
    pub fn has_changed(&self, prev: Option<&Context>) -> bool {
        let Some(prev) = prev else {
            return true;
        };
        self.active_app != prev.active_app
            || self.active_title != prev.active_title
            || self.editor_file != prev.editor_file
            || self.media_track != prev.media_track
            || self.browser_platform != prev.browser_platform
            || self.game_name != prev.game_name
            || self.is_messaging != prev.is_messaging
    }

    /// True when there is a playing track or a YouTube page with a title.
    /// Media snapshots use the literal composition strategy.
    pub fn has_media(&self) -> bool {
        !self.media_track.is_empty()
            || (self.browser_platform == "YouTube" && !self.browser_page_title.is_empty())
    }

    /// Build the structured prompt handed to the storyteller. Only labeled,
    /// sensed data goes in — never free text the user typed.
    pub fn build_prompt(&self) -> String {
        if !self.game_name.is_empty() {
            return format!("GAME: playing {}", self.game_name);
        }

        let mut lines: Vec<String> = Vec::new();

        if !self.active_app.is_empty() && self.active_app != UNKNOWN_APP {
            if self.is_messaging {
                lines.push("ACTIVE: chatting in a messaging app".to_string());
            } else if !self.active_title.is_empty() {
                lines.push(format!(
                    "ACTIVE: {} — {}",
                    self.active_app,
                    truncate_chars(&self.active_title, TITLE_PROMPT_CAP)
                ));
            } else {
                lines.push(format!("ACTIVE: {}", self.active_app));
            }
        }

        if !self.editor_file.is_empty() {
            let project = if self.editor_project.is_empty() {
                String::new()
            } else {
                format!(" ({} project)", self.editor_project)
            };
            lines.push(format!("CODE: editing {}{}", self.editor_file, project));
        }

        if !self.media_track.is_empty() {
            let artist = if self.media_artist.is_empty() {
                String::new()
            } else {
                format!(" ({})", self.media_artist)
            };
            lines.push(format!("MUSIC: listening to {}{}", self.media_track, artist));
        }

        if !self.browser_platform.is_empty() {
            if self.browser_page_title.is_empty() {
                lines.push(format!("BROWSER: browsing {}", self.browser_platform));
            } else {
                lines.push(format!(
                    "BROWSER: on {} — {}",
                    self.browser_platform, self.browser_page_title
                ));
            }
        }

        if lines.is_empty() {
            IDLE_PROMPT.to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Character-safe truncation without an ellipsis marker.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing_context() -> Context {
        Context {
            active_app: "VS Code".to_string(),
            active_title: "main.rs — beacon — Visual Studio Code".to_string(),
            process_name: "Code.exe".to_string(),
            editor_file: "main.rs".to_string(),
            editor_project: "beacon".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn identical_snapshots_are_unchanged() {
        let ctx = editing_context();
        assert!(!ctx.has_changed(Some(&ctx.clone())));
    }

    #[test]
    fn missing_previous_snapshot_is_always_changed() {
        assert!(Context::default().has_changed(None));
    }

    #[test]
    fn track_change_is_detected() {
        let prev = editing_context();
        let mut curr = prev.clone();
        curr.media_track = "Lo-fi Beats".to_string();
        assert!(curr.has_changed(Some(&prev)));
    }

    #[test]
    fn game_prompt_short_circuits_everything_else() {
        let mut ctx = editing_context();
        ctx.game_name = "VALORANT".to_string();
        assert_eq!(ctx.build_prompt(), "GAME: playing VALORANT");
    }

    #[test]
    fn messaging_prompt_carries_no_detail() {
        let ctx = Context {
            active_app: "Telegram".to_string(),
            is_messaging: true,
            ..Default::default()
        };
        let prompt = ctx.build_prompt();
        assert!(prompt.contains("messaging"));
        assert!(!prompt.contains("Telegram"));
    }

    #[test]
    fn empty_snapshot_yields_the_idle_prompt() {
        assert_eq!(Context::default().build_prompt(), IDLE_PROMPT);
    }

    #[test]
    fn has_media_spots_tracks_and_youtube() {
        let mut ctx = Context::default();
        assert!(!ctx.has_media());

        ctx.media_track = "Song".to_string();
        assert!(ctx.has_media());

        let yt = Context {
            browser_platform: "YouTube".to_string(),
            browser_page_title: "Some video".to_string(),
            ..Default::default()
        };
        assert!(yt.has_media());

        let yt_no_title = Context {
            browser_platform: "YouTube".to_string(),
            ..Default::default()
        };
        assert!(!yt_no_title.has_media());
    }

    #[test]
    fn long_titles_are_capped_in_the_prompt() {
        let ctx = Context {
            active_app: "Notepad".to_string(),
            active_title: "x".repeat(200),
            ..Default::default()
        };
        let prompt = ctx.build_prompt();
        let line = prompt.lines().next().expect("active line");
        assert!(line.chars().count() <= "ACTIVE: Notepad — ".chars().count() + 80);
    }
}
