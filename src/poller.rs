use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    diff,
    fetcher::SnapshotFetcher,
    queue::DeliverySender,
    watermark::{Clock, Watermark},
};

/// What one cycle did, for logging and tests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: bool,
    pub scanned: usize,
    pub emitted: usize,
    pub bad_times: usize,
}

pub struct Poller {
    fetcher: Arc<dyn SnapshotFetcher>,
    clock: Arc<dyn Clock>,
    queue: DeliverySender,
    account_id: String,
    tz: Tz,
    interval: Duration,
}

impl Poller {
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        clock: Arc<dyn Clock>,
        queue: DeliverySender,
        account_id: String,
        tz: Tz,
        interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            clock,
            queue,
            account_id,
            tz,
            interval,
        }
    }

    /// Fetch, diff, sleep; forever.
    pub async fn run(self, mut watermark: Watermark) -> eyre::Result<()> {
        info!(
            "Poller started for {} every {:?} (watermark {})",
            self.account_id,
            self.interval,
            watermark.value()
        );

        loop {
            let report = self.poll_once(&mut watermark).await;
            if report.fetched {
                info!(
                    "Cycle done: {} scanned → {} new, {} bad times",
                    report.scanned, report.emitted, report.bad_times
                );
            }
            sleep(self.interval).await;
        }
    }

    /// One cycle. The watermark moves to "now" before the fetch, so a failed
    /// fetch still consumes the window.
    pub async fn poll_once(&self, watermark: &mut Watermark) -> CycleReport {
        let since = watermark.capture_and_advance(self.clock.now());
        let mut report = CycleReport::default();

        let snapshot = match self.fetcher.fetch(&self.account_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Fetch failed this round: {}", e);
                self.queue.notice(format!("Error: {e}"));
                return report;
            }
        };
        report.fetched = true;
        report.scanned = snapshot.transaction_count();
        for group in &snapshot.groups {
            debug!("Group {}: {} listed, {} on page", group.date, group.count, group.transactions.len());
        }

        for item in diff::changes_since(&snapshot, since, self.tz) {
            match item {
                Ok(new) => {
                    let t = &new.transaction;
                    debug!(
                        "New {} {} via {} from {} / {} at {} ({})",
                        t.direction,
                        t.transaction_amount,
                        t.method,
                        t.other_bank_name,
                        t.other_account_name,
                        new.occurred_at,
                        t.id
                    );
                    self.queue.transaction(new);
                    report.emitted += 1;
                }
                Err(e) => {
                    warn!("Skipping transaction: {}", e);
                    self.queue.notice(format!("Error: {e}"));
                    report.bad_times += 1;
                }
            }
        }

        report
    }
}
