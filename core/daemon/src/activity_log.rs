//! Append-only log of published statuses.

use chrono::Local;
use fs_err as fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// One `[YYYY-MM-DD HH:MM:SS] <prompt> → "<status>"` line per published
    /// status. Multi-line prompts are flattened to keep the one-line format.
    /// Best-effort: a failed append is logged and otherwise ignored.
    pub fn append(&self, prompt: &str, status: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let prompt = prompt.replace('\n', " | ");
        let line = format!("[{}] {} → \"{}\"\n", timestamp, prompt, status);

        let result = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = result {
            warn!(error = %err, path = %self.path.display(), "Failed to append to the activity log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_lines_carry_prompt_and_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("status_history.log");
        let log = ActivityLog::new(&path);

        log.append("CODE: editing main.rs\nMUSIC: listening to Song", "Deep in the code 🎧");
        log.append("GAME: playing CS2", "Playing CS2 🎮");

        let contents = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("CODE: editing main.rs | MUSIC: listening to Song"));
        assert!(lines[0].ends_with("→ \"Deep in the code 🎧\""));
        assert!(lines[1].contains("GAME: playing CS2"));
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let log = ActivityLog::new("/definitely/not/a/real/dir/status.log");
        log.append("prompt", "status");
    }
}
