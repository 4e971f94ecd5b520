use enb_core::{Notifier, ScoredPickup};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PAUSE_EVERY: usize = 5;
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateOutcome {
    /// Records at or above the threshold, before the count cap.
    pub eligible: usize,
    /// Records handed to the notifier.
    pub forwarded: usize,
    /// Forwarded records the notifier rejected.
    pub failed: usize,
}

/// Threshold filter in front of a notifier, with a pause every few posts.
#[derive(Clone)]
pub struct NotificationGate {
    notifier: Arc<dyn Notifier>,
    pause_every: usize,
    pause: Duration,
}

impl NotificationGate {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            pause_every: DEFAULT_PAUSE_EVERY,
            pause: DEFAULT_PAUSE,
        }
    }

    pub fn with_rate_limit(mut self, pause_every: usize, pause: Duration) -> Self {
        self.pause_every = pause_every;
        self.pause = pause;
        self
    }

    /// Records with `score >= threshold`, first `max_count` of them, in input order.
    pub fn select(records: &[ScoredPickup], threshold: f64, max_count: usize) -> Vec<&ScoredPickup> {
        records
            .iter()
            .filter(|record| record.score >= threshold)
            .take(max_count)
            .collect()
    }

    pub async fn select_and_send(
        &self,
        records: &[ScoredPickup],
        threshold: f64,
        max_count: usize,
    ) -> GateOutcome {
        let eligible = records.iter().filter(|r| r.score >= threshold).count();
        let selected = Self::select(records, threshold, max_count);

        let mut outcome = GateOutcome {
            eligible,
            ..Default::default()
        };
        let total = selected.len();
        for (i, pickup) in selected.into_iter().enumerate() {
            if !self.notifier.post(pickup).await {
                warn!("📭 {} rejected {}", self.notifier.name(), pickup.record.url);
                outcome.failed += 1;
            }
            outcome.forwarded += 1;

            let sent = i + 1;
            if self.pause_every > 0 && sent % self.pause_every == 0 && sent < total {
                tokio::time::sleep(self.pause).await;
            }
        }

        info!(
            "📬 Forwarded {} of {} eligible articles to {} ({} failed)",
            outcome.forwarded,
            outcome.eligible,
            self.notifier.name(),
            outcome.failed
        );
        outcome
    }
}
