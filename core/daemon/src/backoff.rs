//! Retry schedule for the startup connection to the presence endpoint.

use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 5;
const INITIAL_DELAY_SECS: u64 = 3;
const MAX_DELAY_SECS: u64 = 30;

/// Delay before retrying after the given failed attempt (1-based): 3s,
/// doubling, capped at 30s.
pub fn delay_after_attempt(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let delay = INITIAL_DELAY_SECS << exponent;
    Duration::from_secs(delay.min(MAX_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_doubles_then_caps() {
        let secs: Vec<u64> = (1..=MAX_ATTEMPTS)
            .map(|attempt| delay_after_attempt(attempt).as_secs())
            .collect();
        assert_eq!(secs, vec![3, 6, 12, 24, 30]);
    }

    #[test]
    fn large_attempt_numbers_stay_capped() {
        assert_eq!(delay_after_attempt(40).as_secs(), MAX_DELAY_SECS);
    }
}
