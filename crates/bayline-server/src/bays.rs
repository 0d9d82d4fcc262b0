use std::sync::Arc;

use bayline_core::{Bay, BayStatusProvider};
use tokio::sync::watch;

/// Push-style bay occupancy feed.
///
/// Whoever owns the live bay list calls [`BayFeed::publish`] with the full
/// list on every change; subscribers get the latest list through a
/// `watch` channel. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct BayFeed {
    tx: Arc<watch::Sender<Vec<Bay>>>,
}

impl BayFeed {
    pub fn new(initial: Vec<Bay>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the whole bay list and notify subscribers.
    pub fn publish(&self, bays: Vec<Bay>) {
        self.tx.send_replace(bays);
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Bay>> {
        self.tx.subscribe()
    }
}

impl Default for BayFeed {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl BayStatusProvider for BayFeed {
    fn bays(&self) -> Vec<Bay> {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_lists() {
        let feed = BayFeed::new(vec![Bay::new("b1", "Bay 1")]);
        let mut rx = feed.subscribe();
        assert_eq!(rx.borrow_and_update().len(), 1);

        feed.clone().publish(vec![Bay::new("b1", "Bay 1"), Bay::new("b2", "Bay 2")]);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 2);
        assert_eq!(feed.find("b2").map(|b| b.name), Some("Bay 2".to_string()));
    }

    #[test]
    fn publish_without_subscribers_still_updates() {
        let feed = BayFeed::default();
        feed.publish(vec![Bay::new("b7", "Bay 7")]);
        assert_eq!(feed.bays().len(), 1);
    }
}
