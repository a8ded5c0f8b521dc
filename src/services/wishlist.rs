//! Wishlist service
//!
//! One wishlist per shopper session. Saves and removals are published to
//! subscribers, the same way cart changes are.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use crate::domain::aggregates::{Product, Wishlist};
use crate::domain::events::WishlistEvent;
use crate::Result;

const EVENT_BUFFER: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WishlistNotification {
    pub session_id: String,
    #[serde(flatten)]
    pub event: WishlistEvent,
}

pub struct WishlistService {
    lists: RwLock<HashMap<String, Wishlist>>,
    events: broadcast::Sender<WishlistNotification>,
}

impl Default for WishlistService {
    fn default() -> Self { Self::new() }
}

impl WishlistService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { lists: RwLock::new(HashMap::new()), events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WishlistNotification> { self.events.subscribe() }

    pub async fn list(&self, session: &str) -> Wishlist {
        self.lists.read().await.get(session).cloned().unwrap_or_else(|| Wishlist::new(session))
    }

    /// Saves `product`; the flag is `false` when it was already saved.
    pub async fn add(&self, session: &str, product: &Product) -> (Wishlist, bool) {
        let mut lists = self.lists.write().await;
        let list = lists.entry(session.to_string()).or_insert_with(|| Wishlist::new(session));
        let added = list.add(product);
        self.publish(list);
        (list.clone(), added)
    }

    pub async fn remove(&self, session: &str, product_id: &str) -> Result<Wishlist> {
        let mut lists = self.lists.write().await;
        let mut list = lists.get(session).cloned().unwrap_or_else(|| Wishlist::new(session));
        list.remove(product_id)?;
        self.publish(&mut list);
        Self::store(&mut lists, list.clone());
        Ok(list)
    }

    pub async fn toggle(&self, session: &str, product: &Product) -> Wishlist {
        let mut lists = self.lists.write().await;
        let mut list = lists.get(session).cloned().unwrap_or_else(|| Wishlist::new(session));
        list.toggle(product);
        self.publish(&mut list);
        Self::store(&mut lists, list.clone());
        list
    }

    // Empty wishlists are not kept.
    fn store(lists: &mut HashMap<String, Wishlist>, list: Wishlist) {
        if list.is_empty() {
            lists.remove(list.session_id());
        } else {
            lists.insert(list.session_id().to_string(), list);
        }
    }

    fn publish(&self, list: &mut Wishlist) {
        for event in list.take_events() {
            info!(session = list.session_id(), product_id = event.product_id(), event = event.name(), "wishlist changed");
            // No receivers is not an error.
            let _ = self.events.send(WishlistNotification { session_id: list.session_id().to_string(), event });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::WishlistError;
    use crate::domain::value_objects::Money;
    use crate::StorefrontError;

    fn cap() -> Product { Product::new("P3", "Dad Cap", Money::idr(129_000)) }
    fn tee() -> Product { Product::new("P1", "Boxy Tee", Money::idr(199_000)) }

    #[tokio::test]
    async fn test_subscribers_receive_wishlist_events() {
        let service = WishlistService::new();
        let mut rx = service.subscribe();

        let (list, added) = service.add("s1", &cap()).await;
        assert!(added);
        assert_eq!(list.len(), 1);
        let note = rx.recv().await.unwrap();
        assert_eq!(note.session_id, "s1");
        assert_eq!(note.event, WishlistEvent::Added { product_id: "P3".into() });

        let (_, added) = service.add("s1", &cap()).await;
        assert!(!added);
        assert!(rx.try_recv().is_err());

        service.remove("s1", "P3").await.unwrap();
        assert_eq!(rx.recv().await.unwrap().event.name(), "removed");
    }

    #[tokio::test]
    async fn test_toggle_and_isolation() {
        let service = WishlistService::new();
        assert!(service.toggle("a", &tee()).await.contains("P1"));
        assert!(service.list("b").await.is_empty());
        assert!(!service.toggle("a", &tee()).await.contains("P1"));
        assert!(service.lists.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_item() {
        let service = WishlistService::new();
        let err = service.remove("a", "P9").await.unwrap_err();
        assert_eq!(err, StorefrontError::Wishlist(WishlistError::ItemNotFound("P9".into())));
        assert!(service.lists.read().await.is_empty());
    }
}
