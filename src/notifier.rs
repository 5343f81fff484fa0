// src/notifier.rs
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{debug, error, info};

use crate::format::transaction_message;
use crate::models::Direction;
use crate::queue::{DeliveryReceiver, Outbound};
use crate::telegram::Messenger;

/// Consumer side of the delivery queue.
///
/// Send failures are logged and the item is dropped; there is no retry.
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    admin_id: i64,
    channel_id: i64,
    tz: Tz,
    notify_debits: bool,
}

impl Notifier {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        admin_id: i64,
        channel_id: i64,
        tz: Tz,
        notify_debits: bool,
    ) -> Self {
        Self {
            messenger,
            admin_id,
            channel_id,
            tz,
            notify_debits,
        }
    }

    /// Drains the queue until every sender is gone.
    pub async fn run(self, mut rx: DeliveryReceiver) -> eyre::Result<()> {
        info!("Notifier started");
        while let Some(item) = rx.recv().await {
            self.deliver(item).await;
        }
        info!("Delivery queue closed, notifier stopping");
        Ok(())
    }

    async fn deliver(&self, item: Outbound) {
        match item {
            Outbound::Notice(text) => {
                if let Err(e) = self.messenger.send(self.admin_id, &text).await {
                    error!("Admin notice failed: {}", e);
                }
            }
            Outbound::Transaction(new) => {
                let tx = &new.transaction;
                if !self.wants(&tx.direction) {
                    debug!("Skipping {} transaction {}", tx.direction, tx.id);
                    return;
                }
                let text = transaction_message(&new, self.tz);
                match self.messenger.send(self.channel_id, &text).await {
                    Ok(()) => info!(
                        "Announced {} {} from {} ({})",
                        tx.direction, tx.transaction_amount, tx.user_name, tx.id
                    ),
                    Err(e) => error!("Channel message for {} failed: {}", tx.id, e),
                }
            }
        }
    }

    fn wants(&self, direction: &Direction) -> bool {
        match direction {
            Direction::Credit => true,
            Direction::Debit => self.notify_debits,
            Direction::Other(_) => false,
        }
    }
}
