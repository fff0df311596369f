//! Plain-text rendering of game events for the terminal host.

use lickrun_core::{GameEvent, LeaderboardEntry, Outcome};

fn secs(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

/// One line per event worth showing. Per-frame time and progress updates
/// are folded into [`status_line`] instead.
pub fn event_line(event: &GameEvent) -> Option<String> {
    let line = match event {
        GameEvent::SessionCreated { player, .. } => format!("Get ready, {}!", player.name),
        GameEvent::CountdownTick { remaining } => format!("  {remaining}..."),
        GameEvent::PlayStarted { duration_ms, goal_ms } => format!(
            "GO! Lick for {} within {}. Press Enter to start/stop licking.",
            secs(*goal_ms),
            secs(*duration_ms)
        ),
        GameEvent::FinalStretch { remaining_ms } => {
            format!("Hurry! {} left", secs(*remaining_ms))
        }
        GameEvent::Warning { .. } => "!! The watcher is about to turn around".into(),
        GameEvent::StareStarted { duration_ms } => {
            format!("(o_o) Staring for {}. Don't move!", secs(*duration_ms))
        }
        GameEvent::StareEnded => "The watcher looks away.".into(),
        GameEvent::FakeAlertStarted { .. } => "(-_-) ...false alarm.".into(),
        GameEvent::FakeAlertEnded => return None,
        GameEvent::ActionChanged { acting: true } => "* licking *".into(),
        GameEvent::ActionChanged { acting: false } => "- stopped -".into(),
        GameEvent::SessionEnded { outcome, stats } => match outcome {
            Outcome::Win => format!(
                "YOU WIN! Licked {} in {}s.",
                secs(stats.action_ms),
                stats.completion_secs
            ),
            Outcome::Caught => format!(
                "CAUGHT after {}s with {:.0}% done.",
                stats.completion_secs, stats.progress_pct
            ),
            Outcome::Timeout => format!("Time's up! {:.0}% done.", stats.progress_pct),
        },
        GameEvent::SessionReset => "Session abandoned.".into(),
        GameEvent::TimeChanged { .. }
        | GameEvent::ProgressChanged { .. }
        | GameEvent::LeaderboardRecord { .. } => return None,
    };
    Some(line)
}

pub fn status_line(remaining_ms: u64, percent: f64) -> String {
    let filled = (percent / 5.0).floor().clamp(0.0, 20.0) as usize;
    format!(
        "[{}{}] {:>3.0}%  {:>5} left",
        "#".repeat(filled),
        ".".repeat(20 - filled),
        percent,
        secs(remaining_ms)
    )
}

pub fn leaderboard_line(rank: usize, entry: &LeaderboardEntry) -> String {
    format!(
        "{rank:>2}. {:<20} {:>4}s  {}",
        entry.name,
        entry.completion_secs(),
        entry.timestamp.format("%Y-%m-%d %H:%M")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn per_frame_events_are_silent() {
        assert!(event_line(&GameEvent::TimeChanged { remaining_ms: 500 }).is_none());
        assert!(event_line(&GameEvent::ProgressChanged { percent: 10.0 }).is_none());
        assert!(event_line(&GameEvent::CountdownTick { remaining: 2 }).is_some());
    }

    #[test]
    fn status_bar_fills_with_progress() {
        assert_eq!(status_line(12_000, 50.0), "[##########..........]  50%  12.0s left");
        assert!(status_line(0, 100.0).starts_with("[####################]"));
    }

    #[test]
    fn leaderboard_line_shows_whole_seconds() {
        let entry = LeaderboardEntry {
            name: "Ada".into(),
            completion_ms: 41_900,
            action_ms: 15_000,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };
        let line = leaderboard_line(1, &entry);
        assert!(line.starts_with(" 1. Ada"));
        assert!(line.contains("  41s"));
        assert!(line.ends_with("2024-05-01 12:30"));
    }
}
