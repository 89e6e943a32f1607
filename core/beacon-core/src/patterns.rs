//! Classification tables for context fusion.
//!
//! Patterns are compiled once on first use. The order of `PLATFORM_PATTERNS`
//! is a contract: classification is first-match-wins, so more specific
//! patterns must stay ahead of broader ones.

use once_cell::sync::Lazy;
use regex::Regex;

/// Label shown in place of anything the privacy filters suppressed.
pub const HIDDEN_SENTINEL: &str = "Hidden";

// ═══════════════════════════════════════════════════════════════════════════════
// Browser Platform Classification
// ═══════════════════════════════════════════════════════════════════════════════

pub static PLATFORM_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"github\.com|github", "GitHub"),
        (r"stackoverflow\.com|stack overflow", "StackOverflow"),
        (r"reddit\.com|reddit", "Reddit"),
        (r"youtube\.com|youtu\.be|youtube", "YouTube"),
        (r"twitter\.com|x\.com", "X/Twitter"),
        (r"linkedin\.com|linkedin", "LinkedIn"),
        (r"medium\.com", "Medium"),
        (r"dev\.to", "Dev.to"),
        (r"npmjs\.com|npm", "npm"),
        (r"pypi\.org", "PyPI"),
        (r"docs\.python\.org", "Python Docs"),
        (r"developer\.mozilla\.org|mdn", "MDN"),
        (r"vercel\.com", "Vercel"),
        (r"netlify\.com", "Netlify"),
        (r"docker\.com|docker hub", "Docker Hub"),
        (r"aws\.amazon\.com", "AWS"),
        (r"cloud\.google\.com", "Google Cloud"),
        (r"azure\.microsoft\.com", "Azure"),
        (r"figma\.com|figma", "Figma"),
        (r"notion\.so|notion", "Notion"),
        (r"trello\.com|trello", "Trello"),
        (r"chatgpt\.com|openai\.com|chatgpt", "ChatGPT"),
        (r"gemini\.google\.com", "Gemini"),
        (r"claude\.ai", "Claude"),
        (r"discord\.com", "Discord Web"),
        (r"twitch\.tv|twitch", "Twitch"),
        (r"spotify\.com", "Spotify Web"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).unwrap(), label))
    .collect()
});

/// Checked before platform classification and before any user blacklist.
pub static NSFW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"pornhub\.com",
        r"xvideos\.com",
        r"xnxx\.com",
        r"xhamster\.com",
        r"onlyfans\.com",
        r"rule34",
        r"nhentai",
        r"e621",
        r"gelbooru",
        r"hanime",
        r"hentai",
        r"porn",
        r"sex",
        r"chaturbate",
        r"stripchat",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Window-chrome suffixes stripped from browser titles before classification.
pub const BROWSER_SUFFIXES: &[&str] = &[
    " - Google Chrome",
    " - Mozilla Firefox",
    " - Microsoft Edge",
    " — Mozilla Firefox",
    " - Brave",
    " - Opera",
    " - Supermium",
    " - Chromium",
];

/// Background-scan order is fixed; the first running browser with a non-empty
/// title wins.
pub const BROWSER_PROCESSES: &[&str] = &[
    "chrome.exe",
    "firefox.exe",
    "msedge.exe",
    "brave.exe",
    "opera.exe",
    "supermium.exe",
    "vivaldi.exe",
    "chromium.exe",
];

// ═══════════════════════════════════════════════════════════════════════════════
// Privacy: Messaging Apps
// ═══════════════════════════════════════════════════════════════════════════════

pub const MESSAGING_APPS: &[&str] = &[
    "whatsapp.exe",
    "telegram.exe",
    "signal.exe",
    "slack.exe",
    "teams.exe",
    "skype.exe",
    "messenger.exe",
    "viber.exe",
];

// ═══════════════════════════════════════════════════════════════════════════════
// Known Games (executable → display title)
// ═══════════════════════════════════════════════════════════════════════════════

pub const KNOWN_GAMES: &[(&str, &str)] = &[
    ("League of Legends.exe", "League of Legends"),
    ("LeagueClient.exe", "League of Legends"),
    ("VALORANT.exe", "VALORANT"),
    ("VALORANT-Win64-Shipping.exe", "VALORANT"),
    ("csgo.exe", "CS:GO"),
    ("cs2.exe", "CS2"),
    ("GTA5.exe", "GTA V"),
    ("RocketLeague.exe", "Rocket League"),
    ("FortniteClient-Win64-Shipping.exe", "Fortnite"),
    ("r5apex.exe", "Apex Legends"),
    ("minecraft.exe", "Minecraft"),
    ("javaw.exe", "Minecraft"),
    ("Overwatch.exe", "Overwatch 2"),
    ("RainbowSix.exe", "Rainbow Six Siege"),
    ("EscapeFromTarkov.exe", "Escape from Tarkov"),
    ("PUBG-Win64-Shipping.exe", "PUBG"),
    ("dota2.exe", "Dota 2"),
];

pub fn is_browser_process(name: &str) -> bool {
    BROWSER_PROCESSES
        .iter()
        .any(|process| process.eq_ignore_ascii_case(name))
}

pub fn is_messaging_process(name: &str) -> bool {
    MESSAGING_APPS
        .iter()
        .any(|process| process.eq_ignore_ascii_case(name))
}

pub fn game_title(process_name: &str) -> Option<&'static str> {
    KNOWN_GAMES
        .iter()
        .find(|(exe, _)| exe.eq_ignore_ascii_case(process_name))
        .map(|(_, title)| *title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_table_is_first_match_wins() {
        // A title mentioning two platforms classifies as the earlier entry.
        let title = "watching a youtube clip linked from github";
        let label = PLATFORM_PATTERNS
            .iter()
            .find(|(pattern, _)| pattern.is_match(title))
            .map(|(_, label)| *label);
        assert_eq!(label, Some("GitHub"));
    }

    #[test]
    fn github_precedes_youtube_in_the_table() {
        let position = |wanted: &str| {
            PLATFORM_PATTERNS
                .iter()
                .position(|(_, label)| *label == wanted)
                .expect("label present")
        };
        assert!(position("GitHub") < position("YouTube"));
    }

    #[test]
    fn browser_and_messaging_lookups_ignore_case() {
        assert!(is_browser_process("Chrome.exe"));
        assert!(is_browser_process("FIREFOX.EXE"));
        assert!(!is_browser_process("code.exe"));
        assert!(is_messaging_process("Telegram.exe"));
        assert!(!is_messaging_process("spotify.exe"));
    }

    #[test]
    fn game_lookup_resolves_titles() {
        assert_eq!(game_title("valorant.exe"), Some("VALORANT"));
        assert_eq!(game_title("cs2.exe"), Some("CS2"));
        assert_eq!(game_title("notepad.exe"), None);
    }

    #[test]
    fn nsfw_patterns_match_lowercased_titles() {
        assert!(NSFW_PATTERNS.iter().any(|p| p.is_match("pornhub.com - home")));
        assert!(!NSFW_PATTERNS.iter().any(|p| p.is_match("rust playlist")));
    }
}
