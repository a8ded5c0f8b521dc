//! Cart service
//!
//! Owns one cart per shopper session. Callers invoke it directly; anyone
//! interested in cart changes calls [`CartService::subscribe`] and receives
//! the events raised by the cart aggregate.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::domain::aggregates::{Cart, Product};
use crate::domain::events::CartEvent;
use crate::{Result, StorefrontError};

const EVENT_BUFFER: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartNotification {
    pub session_id: String,
    #[serde(flatten)]
    pub event: CartEvent,
}

pub struct CartService {
    carts: RwLock<HashMap<String, Cart>>,
    currency: String,
    events: broadcast::Sender<CartNotification>,
}

impl CartService {
    pub fn new(currency: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { carts: RwLock::new(HashMap::new()), currency: currency.to_uppercase(), events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartNotification> { self.events.subscribe() }

    /// Current cart for `session`; an empty cart when the session has none.
    pub async fn list(&self, session: &str) -> Cart {
        self.carts.read().await.get(session).cloned().unwrap_or_else(|| Cart::new(session, &self.currency))
    }

    /// Validates against a copy of the session's cart; the stored cart is
    /// only replaced (or created) when the add succeeds.
    pub async fn add_item(&self, session: &str, product: &Product, variant_id: Option<&str>, qty: u32) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        let mut cart = carts.get(session).cloned().unwrap_or_else(|| Cart::new(session, &self.currency));
        if let Err(e) = cart.add_item(product, variant_id, qty) {
            warn!(session, product_id = product.id(), ?variant_id, qty, error = %e, "add to cart rejected");
            return Err(e.into());
        }
        info!(session, product_id = product.id(), ?variant_id, qty, "added to cart");
        self.publish(&mut cart);
        carts.insert(session.to_string(), cart.clone());
        Ok(cart)
    }

    pub async fn update_quantity(&self, session: &str, product_id: &str, variant_id: &str, qty: u32) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(session).ok_or(StorefrontError::CartNotFound)?;
        cart.update_quantity(product_id, variant_id, qty)?;
        self.publish(cart);
        let cart = cart.clone();
        Self::drop_if_empty(&mut carts, session);
        Ok(cart)
    }

    pub async fn remove_item(&self, session: &str, product_id: &str, variant_id: &str) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(session).ok_or(StorefrontError::CartNotFound)?;
        cart.remove_item(product_id, variant_id)?;
        self.publish(cart);
        let cart = cart.clone();
        Self::drop_if_empty(&mut carts, session);
        Ok(cart)
    }

    pub async fn clear(&self, session: &str) {
        if let Some(mut cart) = self.carts.write().await.remove(session) {
            cart.clear();
            self.publish(&mut cart);
        }
    }

    // Only carts with items are kept.
    fn drop_if_empty(carts: &mut HashMap<String, Cart>, session: &str) {
        if carts.get(session).is_some_and(Cart::is_empty) {
            carts.remove(session);
        }
    }

    fn publish(&self, cart: &mut Cart) {
        for event in cart.take_events() {
            // No receivers is not an error.
            let _ = self.events.send(CartNotification { session_id: cart.session_id().to_string(), event });
        }
    }
}
