//! Context fusion: combines raw OS signals into one canonical [`Context`].
//!
//! Each enrichment step is independent and individually skippable — a failed
//! probe leaves its fields empty and never aborts the rest. Games are the one
//! exception: a foreground game short-circuits everything else.

use crate::context::{truncate_chars, Context, UNKNOWN_APP};
use crate::patterns::{
    self, BROWSER_PROCESSES, BROWSER_SUFFIXES, HIDDEN_SENTINEL, NSFW_PATTERNS, PLATFORM_PATTERNS,
};
use std::collections::BTreeMap;

/// Process probed for editor activity, foreground or background.
pub const EDITOR_PROCESS: &str = "Code.exe";

/// Process probed for a playing track.
pub const MEDIA_PROCESS: &str = "Spotify.exe";

const PAGE_TITLE_CAP: usize = 80;
const UNKNOWN_SITE_CAP: usize = 60;

/// Platform-name tokens recognized as a trailing " - Site" style suffix.
const PLATFORM_SUFFIX_TOKENS: &[&str] = &[
    "youtube",
    "github",
    "reddit",
    "stackoverflow",
    "twitch",
    "linkedin",
    "figma",
    "notion",
    "trello",
];

/// Best-effort OS queries. Any OS error or access-denied condition yields
/// empty results — "no signal this cycle" — never a panic or an error.
pub trait SignalSource {
    /// Title and process name of the foreground window.
    fn foreground_window(&self) -> (String, String);

    fn is_process_running(&self, name: &str) -> bool;

    /// First visible window title owned by the named process, or empty.
    fn window_title_for_process(&self, name: &str) -> String;
}

/// Fuse the current signals into a fresh snapshot.
pub fn fuse(
    signals: &dyn SignalSource,
    tracked_apps: &BTreeMap<String, String>,
    blacklist: &[String],
) -> Context {
    let mut ctx = Context::default();
    let (window_title, process_name) = signals.foreground_window();
    ctx.process_name = process_name.clone();

    // Games take total precedence; no further enrichment is meaningful.
    if let Some(game) = patterns::game_title(&process_name) {
        ctx.game_name = game.to_string();
        ctx.active_app = game.to_string();
        ctx.running_apps = running_tracked(signals, tracked_apps);
        return ctx;
    }

    let foreground_is_browser = patterns::is_browser_process(&process_name);
    if foreground_is_browser {
        let (platform, page_title) = classify_browser_title(&window_title);
        ctx.active_app = if platform.is_empty() {
            "Browser".to_string()
        } else {
            platform.clone()
        };
        ctx.active_title = page_title.clone();
        ctx.browser_platform = platform;
        ctx.browser_page_title = page_title;
    } else {
        ctx.active_app = friendly_name(&process_name, tracked_apps);
        ctx.active_title = window_title.clone();
    }

    // User blacklist runs after platform classification and the NSFW check.
    apply_blacklist(&mut ctx, blacklist, foreground_is_browser);

    // Messaging apps always scrub the title, whatever the prior steps did.
    if patterns::is_messaging_process(&process_name) {
        ctx.is_messaging = true;
        ctx.active_title.clear();
    }

    // Independent probes: simultaneous activity sources must all surface
    // even when a different app holds the foreground.
    probe_editor(signals, &process_name, &window_title, &mut ctx);
    probe_media(signals, &mut ctx);
    if !foreground_is_browser && !ctx.is_messaging {
        probe_background_browser(signals, &mut ctx);
    }

    ctx.running_apps = running_tracked(signals, tracked_apps);
    ctx
}

/// Classify a browser window title into (platform label, cleaned page title).
///
/// NSFW patterns are checked first, unconditionally, before any platform
/// match or user blacklist. An unrecognized site keeps its cleaned title but
/// gets no platform label.
pub fn classify_browser_title(title: &str) -> (String, String) {
    let mut clean = title.to_string();
    for suffix in BROWSER_SUFFIXES {
        if let Some(pos) = clean.find(suffix) {
            clean = clean[..pos].trim().to_string();
            break;
        }
    }
    let lowered = clean.to_lowercase();

    if NSFW_PATTERNS.iter().any(|pattern| pattern.is_match(&lowered)) {
        return (HIDDEN_SENTINEL.to_string(), String::new());
    }

    for (pattern, platform) in PLATFORM_PATTERNS.iter() {
        if pattern.is_match(&lowered) {
            let page_title = strip_platform_suffix(&clean, platform);
            return (
                (*platform).to_string(),
                truncate_chars(&page_title, PAGE_TITLE_CAP),
            );
        }
    }

    if clean.chars().count() > 3 {
        return (String::new(), truncate_chars(&clean, UNKNOWN_SITE_CAP));
    }
    (String::new(), String::new())
}

/// Extract (file, project) from an editor title of the form
/// `"file — project — Editor"` or `"file — Editor"`.
pub fn extract_editor_title(title: &str) -> (String, String) {
    let parts: Vec<&str> = title.split(" — ").collect();
    match parts.len() {
        n if n >= 3 => (parts[0].trim().to_string(), parts[1].trim().to_string()),
        2 => (parts[0].trim().to_string(), String::new()),
        _ => (String::new(), String::new()),
    }
}

/// Extract (track, artist) from a media player title of the form
/// `"Track - Artist"`. A bare player placeholder title yields nothing.
pub fn extract_media_title(title: &str) -> (String, String) {
    if title.is_empty() || title.to_lowercase().starts_with("spotify") {
        return (String::new(), String::new());
    }
    match title.split_once(" - ") {
        Some((track, artist)) => (track.trim().to_string(), artist.trim().to_string()),
        None => (title.trim().to_string(), String::new()),
    }
}

fn strip_platform_suffix(title: &str, platform: &str) -> String {
    let platform_lower = platform.to_lowercase();
    let collapsed = platform_lower.replace(' ', "");
    for sep in [" - ", " — ", " | "] {
        if let Some(pos) = title.rfind(sep) {
            let tail = title[pos + sep.len()..].trim().to_lowercase();
            if tail == platform_lower
                || tail == collapsed
                || PLATFORM_SUFFIX_TOKENS.contains(&tail.as_str())
            {
                return title[..pos].trim().to_string();
            }
        }
    }
    title.to_string()
}

fn friendly_name(process_name: &str, tracked_apps: &BTreeMap<String, String>) -> String {
    if process_name.is_empty() {
        return UNKNOWN_APP.to_string();
    }
    if let Some(name) = tracked_apps.get(process_name) {
        return name.clone();
    }
    if let Some((_, name)) = tracked_apps
        .iter()
        .find(|(exe, _)| exe.eq_ignore_ascii_case(process_name))
    {
        return name.clone();
    }
    strip_exe_suffix(process_name).to_string()
}

fn strip_exe_suffix(process_name: &str) -> &str {
    let len = process_name.len();
    if len > 4
        && process_name.is_char_boundary(len - 4)
        && process_name[len - 4..].eq_ignore_ascii_case(".exe")
    {
        &process_name[..len - 4]
    } else {
        process_name
    }
}

fn apply_blacklist(ctx: &mut Context, blacklist: &[String], foreground_is_browser: bool) {
    if blacklist.is_empty() {
        return;
    }
    let matches = |title: &str| {
        let lowered = title.to_lowercase();
        blacklist
            .iter()
            .filter(|word| !word.is_empty())
            .any(|word| lowered.contains(&word.to_lowercase()))
    };

    if foreground_is_browser {
        if matches(&ctx.browser_page_title) {
            ctx.browser_platform = HIDDEN_SENTINEL.to_string();
            ctx.browser_page_title.clear();
            ctx.active_app = HIDDEN_SENTINEL.to_string();
            ctx.active_title.clear();
        }
    } else if matches(&ctx.active_title) {
        ctx.active_app = HIDDEN_SENTINEL.to_string();
        ctx.active_title.clear();
    }
}

fn probe_editor(
    signals: &dyn SignalSource,
    process_name: &str,
    window_title: &str,
    ctx: &mut Context,
) {
    let title = if process_name.eq_ignore_ascii_case(EDITOR_PROCESS) {
        window_title.to_string()
    } else if signals.is_process_running(EDITOR_PROCESS) {
        signals.window_title_for_process(EDITOR_PROCESS)
    } else {
        return;
    };
    if title.is_empty() {
        return;
    }
    let (file, project) = extract_editor_title(&title);
    ctx.editor_file = file;
    ctx.editor_project = project;
}

fn probe_media(signals: &dyn SignalSource, ctx: &mut Context) {
    let title = signals.window_title_for_process(MEDIA_PROCESS);
    if title.is_empty() {
        return;
    }
    let (track, artist) = extract_media_title(&title);
    ctx.media_track = track;
    ctx.media_artist = artist;
}

fn probe_background_browser(signals: &dyn SignalSource, ctx: &mut Context) {
    for browser in BROWSER_PROCESSES {
        if !signals.is_process_running(browser) {
            continue;
        }
        let title = signals.window_title_for_process(browser);
        if title.is_empty() {
            continue;
        }
        let (platform, page_title) = classify_browser_title(&title);
        ctx.browser_platform = platform;
        ctx.browser_page_title = page_title;
        break;
    }
}

fn running_tracked(
    signals: &dyn SignalSource,
    tracked_apps: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut running: Vec<String> = tracked_apps
        .iter()
        .filter(|(exe, _)| signals.is_process_running(exe))
        .map(|(_, name)| name.clone())
        .collect();
    running.sort();
    running.dedup();
    running
}
