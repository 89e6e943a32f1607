//! Persona presets, language names, and the storyteller system instruction.

use crate::compose::MAX_STATUS_LEN;
use crate::config::Config;
use rand::seq::SliceRandom;

const EXAMPLES_PER_PROMPT: usize = 3;

pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "tr" => "Türkçe",
        "de" => "Deutsch",
        "fr" => "Français",
        "es" => "Español",
        other => other,
    }
}

/// Example lines are grounded and realistic on purpose: they teach the model
/// the register without licensing it to invent activity.
pub fn persona_examples(key: &str) -> &'static [&'static str] {
    match key {
        "hacker" => &[
            "Watching a synthwave mix on YouTube while editing config files 🎧",
            "Digging through StackOverflow while wiring up an API ⚡",
            "Reviewing PRs on GitHub with Spotify in the background 🔍",
            "Chatting on Discord while a bot build runs behind it 🛠️",
        ],
        "sigma" => &[
            "Music on YouTube, code in the editor, no stopping 💪",
            "Researching on StackOverflow and tightening the backend ⚡",
            "Prepping a deploy with Spotify on, the night is young 🔥",
            "Pushing commits on GitHub while planning the next feature 🎯",
        ],
        "chill" => &[
            "Writing code at an easy pace with a YouTube playlist on ☕",
            "Spotify on, coffee ready, bug hunt in progress 🌿",
            "Hanging out on Discord while a side project grows 🎧",
            "Quiet night, editor open, working to the music ✨",
        ],
        "gamer" => &[
            "Playing VALORANT, break time unknown 🎮",
            "Chatting on Discord between League matches ⚔️",
            "Watching game videos on YouTube, ranked is next 🏆",
            "Twitch open, side project compiling on the other screen 🎯",
        ],
        "poet" => &[
            "Music drifts from YouTube while the code finds its rhythm 🎵",
            "A new page opens on GitHub, the story continues ✨",
            "Quietly sketching architecture to a Spotify soundtrack 📝",
            "A silent night, just keystrokes and music 🌙",
        ],
        _ => &[
            "Listening to a mix on YouTube while building a project in the editor ⚡",
            "Researching on StackOverflow and writing an API of their own 🔍",
            "Chatting on Discord with Spotify playing in the background 🎧",
            "Reviewing on GitHub while the music plays 🛠️",
        ],
    }
}

/// Persona description used in the system instruction: literal custom text
/// wins, then a configured preset, then the key itself.
pub fn resolve_persona(config: &Config) -> String {
    if config.persona == "custom" {
        let custom = config.custom_persona_text.trim();
        if !custom.is_empty() {
            return custom.to_string();
        }
    }
    if let Some(preset) = config.persona_presets.get(&config.persona) {
        return preset.clone();
    }
    config.persona.clone()
}

/// Build the storyteller system instruction: persona, language, strict
/// anti-hallucination rules, the length ceiling, and a few example lines
/// sampled without replacement from the persona pool.
pub fn build_system_instruction(config: &Config) -> String {
    let pool = persona_examples(&config.persona);
    let mut rng = rand::thread_rng();
    let examples = pool
        .choose_multiple(&mut rng, EXAMPLES_PER_PROMPT.min(pool.len()))
        .map(|example| format!("- {}", example))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You write rich-presence status lines. Your job: turn the user's real \
computer activity into ONE charismatic sentence.\n\
\n\
## HARD RULES\n\
\n\
1. At most {max_len} characters.\n\
2. Use ONLY the labeled data below. NEVER state anything that is not in the data.\n\
3. Data labels: ACTIVE, CODE, MUSIC, BROWSER, GAME. Combine what they say.\n\
4. Inventing is strictly forbidden. No \"database design\", \"the matrix\", \
\"hacking\" or anything else absent from the data.\n\
5. A music video on YouTube counts as listening or watching.\n\
6. No quotes, dashes, bullet points, or terminal formatting (root@, $).\n\
7. You may use 1-2 emoji.\n\
8. Plain text, a single sentence, nothing else.\n\
9. Language: {language}\n\
10. Persona tone: {persona}\n\
\n\
## COMBINING\n\
\n\
When several labels are present, merge them into ONE natural sentence:\n\
- MUSIC + CODE → \"editing X while listening to Y\"\n\
- BROWSER(YouTube) + CODE → \"watching Z on YouTube while writing code\"\n\
- ACTIVE(Discord) → \"chatting on Discord\"\n\
- ACTIVE(messaging) → \"Chatting\" (no detail)\n\
\n\
### Good examples:\n\
{examples}\n\
\n\
### FORBIDDEN examples:\n\
- \"Defying gravity\" → NOT IN THE DATA\n\
- \"Designing a database\" → NOT IN THE DATA\n\
- \"root@dev:~$ coding\" → TERMINAL FORMATTING\n\
- \"Lost in the matrix\" → EXAGGERATION\n\
- \"Unfortunately this response...\" → NO EXPLANATIONS, JUST THE SENTENCE\n",
        max_len = MAX_STATUS_LEN,
        language = language_name(&config.language),
        persona = resolve_persona(config),
        examples = examples,
    )
}
