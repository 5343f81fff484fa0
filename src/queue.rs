// src/queue.rs
//! Hand-off between the poll loop and the notifier.
//!
//! The channel is unbounded: `push` never waits, so a slow Telegram send can
//! not delay the next fetch. A consumer that falls permanently behind makes the
//! queue grow without limit; with a handful of donations a day that is
//! acceptable, and this is where backpressure would go if it ever is not.

use tokio::sync::mpsc;
use tracing::error;

use crate::models::NewTransaction;

/// Work item for the notifier, delivered in push order
#[derive(Debug)]
pub enum Outbound {
    /// Post to the tracked channel
    Transaction(NewTransaction),
    /// Post to the administrator
    Notice(String),
}

#[derive(Debug, Clone)]
pub struct DeliverySender {
    tx: mpsc::UnboundedSender<Outbound>,
}

pub type DeliveryReceiver = mpsc::UnboundedReceiver<Outbound>;

pub fn delivery_queue() -> (DeliverySender, DeliveryReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliverySender { tx }, rx)
}

impl DeliverySender {
    pub fn push(&self, item: Outbound) {
        if let Err(e) = self.tx.send(item) {
            error!("Delivery queue closed, dropping {:?}", e.0);
        }
    }

    pub fn transaction(&self, tx: NewTransaction) {
        self.push(Outbound::Transaction(tx));
    }

    pub fn notice(&self, text: impl Into<String>) {
        self.push(Outbound::Notice(text.into()));
    }
}
