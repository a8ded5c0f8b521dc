//! HTTP API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use validator::Validate;

use crate::backend::{CatalogBackend, Category};
use crate::domain::aggregates::{Cart, CartError, Wishlist, WishlistError};
use crate::domain::catalog::{FilterState, PriceBand, SortKey, ViewResult, DEFAULT_PAGE_SIZE};
use crate::services::{
    Campaign, CampaignService, CampaignSnapshot, CartNotification, CartService, CatalogService, HomeSections, ProductDetail,
    WishlistNotification, WishlistService,
};
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: Arc<CartService>,
    pub wishlists: Arc<WishlistService>,
    pub campaign: Arc<CampaignService>,
}

impl AppState {
    pub fn new(backend: Arc<dyn CatalogBackend>, fetch_size: u32, currency: &str, campaign: Campaign) -> Self {
        Self {
            catalog: CatalogService::new(backend, fetch_size),
            carts: Arc::new(CartService::new(currency)),
            wishlists: Arc::new(WishlistService::new()),
            campaign: Arc::new(CampaignService::new(campaign)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-catalog"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:slug", get(get_product))
        .route("/api/v1/best-sellers", get(best_sellers))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/home", get(home))
        .route("/api/v1/campaign", get(campaign))
        .route("/api/v1/campaign/countdown", get(campaign_countdown))
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/items", post(add_to_cart).put(update_cart_item))
        .route("/api/v1/cart/:session/items/:product_id/:variant_id", delete(remove_cart_item))
        .route("/api/v1/cart/:session/events", get(cart_events))
        .route("/api/v1/wishlist/:session", get(get_wishlist))
        .route("/api/v1/wishlist/:session/items", post(add_to_wishlist))
        .route("/api/v1/wishlist/:session/items/:product_id", delete(remove_from_wishlist))
        .route("/api/v1/wishlist/:session/toggle", post(toggle_wishlist))
        .route("/api/v1/wishlist/:session/events", get(wishlist_events))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody { error: String }

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProductNotFound(_)
            | Self::CartNotFound
            | Self::Cart(CartError::ItemNotFound)
            | Self::Wishlist(WishlistError::ItemNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Cart(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

fn validated<T: Validate>(input: T) -> Result<T> {
    input.validate().map_err(|e| StorefrontError::InvalidRequest(e.to_string()))?;
    Ok(input)
}

// =============================================================================
// Catalogue
// =============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListingQuery {
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default)]
    pub featured_only: bool,
    #[serde(default)]
    pub discounted_only: bool,
    pub price_band: Option<PriceBand>,
    pub sort: Option<SortKey>,
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<usize>,
}

impl ListingQuery {
    pub fn to_filters(&self) -> FilterState {
        FilterState {
            search_text: self.search.clone().unwrap_or_default(),
            category: self.category.clone(),
            in_stock_only: self.in_stock_only,
            featured_only: self.featured_only,
            discounted_only: self.discounted_only,
            price_band: self.price_band,
            sort_key: self.sort.unwrap_or_default(),
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

async fn list_products(State(s): State<AppState>, Query(q): Query<ListingQuery>) -> Result<Json<ViewResult>> {
    let q = validated(q)?;
    Ok(Json(s.catalog.list_view(&q.to_filters()).await?))
}

async fn best_sellers(State(s): State<AppState>, Query(q): Query<ListingQuery>) -> Result<Json<ViewResult>> {
    let q = validated(q)?;
    Ok(Json(s.catalog.best_sellers(&q.to_filters(), q.sort).await?))
}

async fn get_product(State(s): State<AppState>, Path(slug): Path<String>) -> Result<Json<ProductDetail>> {
    Ok(Json(s.catalog.product_detail(&slug).await?))
}

async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.catalog.categories().await?))
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    #[serde(flatten)]
    pub sections: HomeSections,
    pub campaign: CampaignSnapshot,
}

async fn home(State(s): State<AppState>) -> Result<Json<HomeResponse>> {
    let sections = s.catalog.home().await?;
    Ok(Json(HomeResponse { sections, campaign: s.campaign.snapshot(Utc::now()) }))
}

async fn campaign(State(s): State<AppState>) -> Json<CampaignSnapshot> {
    Json(s.campaign.snapshot(Utc::now()))
}

/// One `countdown` event per second. The ticker lives inside the stream, so
/// it stops as soon as the client goes away.
async fn campaign_countdown(State(s): State<AppState>) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let ticker = s.campaign.start_ticker();
    let mut rx = ticker.subscribe();
    let stream = async_stream::stream! {
        let _ticker = ticker;
        loop {
            let countdown = *rx.borrow_and_update();
            match Event::default().event("countdown").json_data(countdown) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!(error = %e, "failed to encode countdown"),
            }
            if countdown.finished || rx.changed().await.is_err() {
                break;
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    #[validate(length(min = 1, max = 200))]
    pub slug: String,
    pub variant_id: Option<String>,
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub variant_id: String,
    #[validate(range(max = 999))]
    pub quantity: u32,
}

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Json<Cart> {
    Json(s.carts.list(&session).await)
}

async fn add_to_cart(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddToCartRequest>) -> Result<(StatusCode, Json<Cart>)> {
    let r = validated(r)?;
    // Stock and variants come from the backend at add time, not from the client.
    let detail = s.catalog.product_detail(&r.slug).await?;
    let cart = s.carts.add_item(&session, &detail.product, r.variant_id.as_deref(), r.quantity).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

async fn update_cart_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<UpdateCartItemRequest>) -> Result<Json<Cart>> {
    let r = validated(r)?;
    Ok(Json(s.carts.update_quantity(&session, &r.product_id, &r.variant_id, r.quantity).await?))
}

async fn remove_cart_item(State(s): State<AppState>, Path((session, product_id, variant_id)): Path<(String, String, String)>) -> Result<Json<Cart>> {
    Ok(Json(s.carts.remove_item(&session, &product_id, &variant_id).await?))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> StatusCode {
    s.carts.clear(&session).await;
    StatusCode::NO_CONTENT
}

/// Server-sent events for one session's cart.
async fn cart_events(State(s): State<AppState>, Path(session): Path<String>) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    Sse::new(session_events(s.carts.subscribe(), session)).keep_alive(KeepAlive::default())
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct WishlistRequest {
    #[validate(length(min = 1, max = 200))]
    pub slug: String,
}

async fn get_wishlist(State(s): State<AppState>, Path(session): Path<String>) -> Json<Wishlist> {
    Json(s.wishlists.list(&session).await)
}

async fn add_to_wishlist(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<WishlistRequest>) -> Result<(StatusCode, Json<Wishlist>)> {
    let r = validated(r)?;
    let product = s.catalog.product(&r.slug).await?;
    let (list, added) = s.wishlists.add(&session, &product).await;
    Ok((if added { StatusCode::CREATED } else { StatusCode::OK }, Json(list)))
}

async fn toggle_wishlist(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<WishlistRequest>) -> Result<Json<Wishlist>> {
    let r = validated(r)?;
    let product = s.catalog.product(&r.slug).await?;
    Ok(Json(s.wishlists.toggle(&session, &product).await))
}

async fn remove_from_wishlist(State(s): State<AppState>, Path((session, product_id)): Path<(String, String)>) -> Result<Json<Wishlist>> {
    Ok(Json(s.wishlists.remove(&session, &product_id).await?))
}

async fn wishlist_events(State(s): State<AppState>, Path(session): Path<String>) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    Sse::new(session_events(s.wishlists.subscribe(), session)).keep_alive(KeepAlive::default())
}

// =============================================================================
// Session event streams
// =============================================================================

/// A change addressed to one shopper session.
pub trait SessionNotification: Serialize + Clone + Send + 'static {
    fn session_id(&self) -> &str;
    fn event_name(&self) -> &'static str;
}

impl SessionNotification for CartNotification {
    fn session_id(&self) -> &str { &self.session_id }
    fn event_name(&self) -> &'static str { self.event.name() }
}

impl SessionNotification for WishlistNotification {
    fn session_id(&self) -> &str { &self.session_id }
    fn event_name(&self) -> &'static str { self.event.name() }
}

/// Forwards `session`'s notifications as SSE events. A lagging subscriber
/// skips what it missed and keeps going; the stream ends with the channel.
pub fn session_events<N: SessionNotification>(
    mut rx: broadcast::Receiver<N>,
    session: String,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(note) if note.session_id() == session => {
                    match Event::default().event(note.event_name()).json_data(&note) {
                        Ok(event) => yield Ok(event),
                        Err(e) => warn!(error = %e, "failed to encode session event"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(%session, skipped, "session event subscriber lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    }
}
