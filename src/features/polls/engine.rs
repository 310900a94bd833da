//! Poll runner and reaction tally
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use log::{info, warn};
use std::time::Duration;
use tokio::time::sleep;

use crate::platform::{ChatPlatform, ReactionCount};

pub const MIN_ANSWERS: usize = 2;
pub const MAX_ANSWERS: usize = 10;

/// Everything needed to run one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSpec {
    /// Full text posted to the channel, answers included
    pub prompt: String,
    pub answers: Vec<String>,
    /// One reaction marker per answer, in answer order
    pub markers: Vec<String>,
    pub duration_secs: i64,
}

impl PollSpec {
    pub fn new<M: AsRef<str>>(
        prompt: impl Into<String>,
        answers: Vec<String>,
        markers: &[M],
        duration_secs: i64,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            answers,
            markers: markers.iter().map(|m| m.as_ref().to_string()).collect(),
            duration_secs,
        }
    }

    /// Whether the poll can be run at all
    pub fn is_valid(&self) -> bool {
        (MIN_ANSWERS..=MAX_ANSWERS).contains(&self.answers.len())
            && self.markers.len() >= self.answers.len()
            && self.duration_secs > 0
    }
}

/// Result of a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// One marker had strictly the most votes
    Winner {
        /// 1-based position of the marker in the poll
        index: usize,
        marker: String,
        votes: u64,
    },
    /// Several markers share the highest count
    Tie { markers: Vec<String>, votes: u64 },
    /// The poll was never started
    Invalid,
}

impl PollOutcome {
    /// Winner position, `0` for a tie, `-1` when no poll ran
    pub fn winner_index(&self) -> i64 {
        match self {
            PollOutcome::Winner { index, .. } => *index as i64,
            PollOutcome::Tie { .. } => 0,
            PollOutcome::Invalid => -1,
        }
    }

    pub fn is_win_for(&self, position: usize) -> bool {
        matches!(self, PollOutcome::Winner { index, .. } if *index == position)
    }

    /// Announcement posted when the poll closes
    pub fn announcement(&self) -> Option<String> {
        match self {
            PollOutcome::Winner { marker, votes, .. } => {
                Some(format!("{marker} wins with {votes} votes."))
            }
            PollOutcome::Tie { markers, votes } => {
                let mut text = String::from("The result is a tie between ");
                for (i, marker) in markers.iter().enumerate() {
                    if i + 1 == markers.len() {
                        text.push_str(&format!("and {marker} at {votes} votes."));
                    } else {
                        text.push_str(&format!("{marker}, "));
                    }
                }
                Some(text)
            }
            PollOutcome::Invalid => None,
        }
    }
}

/// Post a poll, wait for it to close and announce the result.
///
/// Invalid polls return [`PollOutcome::Invalid`] right away without posting,
/// reacting or waiting. Reaction counts are always re-fetched once the wait is
/// over, since they change while the poll is open.
pub async fn run_poll(
    platform: &dyn ChatPlatform,
    channel_id: u64,
    spec: &PollSpec,
) -> Result<PollOutcome> {
    if !spec.is_valid() {
        warn!(
            "Refusing to run poll with {} answers, {} markers and duration {}",
            spec.answers.len(),
            spec.markers.len(),
            spec.duration_secs
        );
        return Ok(PollOutcome::Invalid);
    }

    let markers = &spec.markers[..spec.answers.len()];
    let posted = platform.send(channel_id, &spec.prompt).await?;
    for marker in markers {
        platform.add_reaction(&posted, marker).await?;
    }

    info!(
        "Poll {} open in channel {} for {}s",
        posted.id, channel_id, spec.duration_secs
    );
    sleep(Duration::from_secs(spec.duration_secs as u64)).await;

    let counts = platform.fetch_reactions(&posted).await?;
    let outcome = tally(markers, &counts);
    if let Some(text) = outcome.announcement() {
        platform.send(channel_id, &text).await?;
    }
    info!("Poll {} closed: {:?}", posted.id, outcome);
    Ok(outcome)
}

/// Decide the winner from raw reaction counts.
///
/// Counts include the bot's own reaction, so each reported vote total is one
/// less than the raw count. Only the poll's own markers are considered; a
/// marker missing from `counts` has a raw count of zero.
pub fn tally<M: AsRef<str>>(markers: &[M], counts: &[ReactionCount]) -> PollOutcome {
    if markers.is_empty() {
        return PollOutcome::Invalid;
    }

    let raw: Vec<u64> = markers
        .iter()
        .map(|marker| {
            counts
                .iter()
                .filter(|c| same_marker(&c.marker, marker.as_ref()))
                .map(|c| c.count)
                .sum()
        })
        .collect();

    let highest = raw.iter().copied().max().unwrap_or(0);
    let leaders: Vec<usize> = raw
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count == highest)
        .map(|(i, _)| i)
        .collect();
    let votes = highest.saturating_sub(1);

    match leaders.as_slice() {
        [only] => PollOutcome::Winner {
            index: only + 1,
            marker: markers[*only].as_ref().to_string(),
            votes,
        },
        _ => PollOutcome::Tie {
            markers: leaders
                .iter()
                .map(|&i| markers[i].as_ref().to_string())
                .collect(),
            votes,
        },
    }
}

/// Compare markers, ignoring emoji variation selectors
fn same_marker(a: &str, b: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|&c| c != '\u{fe0f}').collect::<String>();
    strip(a) == strip(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::polls::{NUMBER_MARKERS, YES_NO_MARKERS};
    use crate::platform::mock::{MockPlatform, BOT_CHANNEL};

    fn counts(pairs: &[(&str, u64)]) -> Vec<ReactionCount> {
        pairs
            .iter()
            .map(|(m, c)| ReactionCount {
                marker: m.to_string(),
                count: *c,
            })
            .collect()
    }

    fn answers(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("answer {i}")).collect()
    }

    #[test]
    fn test_tally_tie_between_first_two() {
        let markers = &NUMBER_MARKERS[..3];
        let raw = counts(&[(markers[0], 6), (markers[1], 6), (markers[2], 3)]);

        let outcome = tally(markers, &raw);
        assert_eq!(outcome.winner_index(), 0);
        assert_eq!(
            outcome,
            PollOutcome::Tie {
                markers: vec![markers[0].to_string(), markers[1].to_string()],
                votes: 5,
            }
        );
        assert_eq!(
            outcome.announcement().unwrap(),
            format!(
                "The result is a tie between {}, and {} at 5 votes.",
                markers[0], markers[1]
            )
        );
    }

    #[test]
    fn test_tally_clear_winner() {
        let markers = &NUMBER_MARKERS[..2];
        let outcome = tally(markers, &counts(&[(markers[0], 4), (markers[1], 9)]));

        assert_eq!(outcome.winner_index(), 2);
        assert!(outcome.is_win_for(2));
        assert_eq!(
            outcome.announcement().unwrap(),
            format!("{} wins with 8 votes.", markers[1])
        );
    }

    #[test]
    fn test_tally_uses_marker_order_not_fetch_order() {
        let outcome = tally(
            &YES_NO_MARKERS,
            &counts(&[(YES_NO_MARKERS[1], 2), (YES_NO_MARKERS[0], 5)]),
        );
        assert_eq!(outcome.winner_index(), 1);
    }

    #[test]
    fn test_tally_ignores_foreign_reactions_and_missing_markers() {
        let outcome = tally(&YES_NO_MARKERS, &counts(&[("🍕", 40), (YES_NO_MARKERS[1], 3)]));
        assert_eq!(
            outcome,
            PollOutcome::Winner {
                index: 2,
                marker: YES_NO_MARKERS[1].to_string(),
                votes: 2,
            }
        );
    }

    #[test]
    fn test_tally_matches_markers_without_variation_selector() {
        let outcome = tally(&NUMBER_MARKERS[..2], &counts(&[("1\u{20e3}", 3), ("2\u{20e3}", 1)]));
        assert_eq!(outcome.winner_index(), 1);
    }

    #[test]
    fn test_tally_no_votes_is_a_full_tie() {
        let outcome = tally(&YES_NO_MARKERS, &counts(&[(YES_NO_MARKERS[0], 1), (YES_NO_MARKERS[1], 1)]));
        assert_eq!(
            outcome,
            PollOutcome::Tie {
                markers: YES_NO_MARKERS.iter().map(|m| m.to_string()).collect(),
                votes: 0,
            }
        );
    }

    #[test]
    fn test_invalid_outcome_sentinel() {
        assert_eq!(PollOutcome::Invalid.winner_index(), -1);
        assert!(PollOutcome::Invalid.announcement().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_poll_rejects_answer_counts_out_of_range() {
        let platform = MockPlatform::new();
        for n in [0, 1, 11, 15] {
            let spec = PollSpec::new("q", answers(n), &NUMBER_MARKERS, 60);
            let outcome = run_poll(&platform, BOT_CHANNEL, &spec).await.unwrap();
            assert_eq!(outcome, PollOutcome::Invalid);
        }
        assert!(platform.sent_texts().is_empty());
        assert!(platform.reaction_markers().is_empty());
        assert!(platform.fetch_calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_poll_rejects_non_positive_duration() {
        let platform = MockPlatform::new();
        for duration in [0, -1] {
            let spec = PollSpec::new("q", answers(2), &NUMBER_MARKERS, duration);
            let outcome = run_poll(&platform, BOT_CHANNEL, &spec).await.unwrap();
            assert_eq!(outcome.winner_index(), -1);
        }
        assert!(platform.sent_texts().is_empty());
        assert!(platform.reaction_markers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_poll_posts_reacts_waits_and_announces() {
        let platform = MockPlatform::new();
        platform.queue_counts(&[(NUMBER_MARKERS[0], 4), (NUMBER_MARKERS[1], 9)]);
        let spec = PollSpec::new("Pizza?", answers(2), &NUMBER_MARKERS, 90);

        let started = tokio::time::Instant::now();
        let outcome = run_poll(&platform, BOT_CHANNEL, &spec).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(90));
        assert_eq!(outcome.winner_index(), 2);
        assert_eq!(platform.reaction_markers(), NUMBER_MARKERS[..2].to_vec());
        assert_eq!(platform.fetch_calls.lock().unwrap().len(), 1);
        assert_eq!(
            platform.sent_texts(),
            vec![
                "Pizza?".to_string(),
                format!("{} wins with 8 votes.", NUMBER_MARKERS[1])
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_poll_ten_answers_use_every_marker() {
        let platform = MockPlatform::new();
        let spec = PollSpec::new("Pick", answers(10), &NUMBER_MARKERS, 60);

        let outcome = run_poll(&platform, BOT_CHANNEL, &spec).await.unwrap();

        assert_eq!(platform.reaction_markers().len(), 10);
        assert_eq!(outcome.winner_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_poll_does_not_block_other_tasks() {
        let platform = std::sync::Arc::new(MockPlatform::new());
        let spec = PollSpec::new("Slow", answers(2), &YES_NO_MARKERS, 600);

        let poll = {
            let platform = platform.clone();
            tokio::spawn(async move { run_poll(platform.as_ref(), BOT_CHANNEL, &spec).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        platform.send(BOT_CHANNEL, "meanwhile").await.unwrap();

        poll.await.unwrap().unwrap();
        let texts = platform.sent_texts();
        assert_eq!(texts[0], "Slow");
        assert_eq!(texts[1], "meanwhile");
    }
}
