//! JSON API over the suggestion service.
//!
//! - `POST /api/v1/suggestions`       ranked suggestions plus a message for the top pick
//! - `POST /api/v1/suggestions/next`  one replacement suggestion ("try another")
//! - `POST /api/v1/messages`          fresh message for a product already shown
//! - `GET  /api/v1/products`          browse the active catalog

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use giftmatch_core::{
    ApplicationError, BrowseQuery, InterfaceError, MatchResult, MessageRequest,
    NextSuggestionRequest, Product, ProductId, SuggestionRequest, SuggestionService,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    service: SuggestionService,
}

pub fn router(service: SuggestionService) -> Router {
    Router::new()
        .route("/api/v1/suggestions", post(suggest))
        .route("/api/v1/suggestions/next", post(next_suggestion))
        .route("/api/v1/messages", post(message))
        .route("/api/v1/products", get(products))
        .with_state(ApiState { service })
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub product_id: ProductId,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub count: usize,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

/// Failed request, already mapped to the interface layer.
#[derive(Debug)]
pub struct ApiFailure(InterfaceError);

impl ApiFailure {
    fn from_application(error: ApplicationError, correlation_id: &str) -> Self {
        Self(error.into_interface(correlation_id))
    }

    fn bad_request(message: String, correlation_id: &str) -> Self {
        Self(InterfaceError::BadRequest { message, correlation_id: correlation_id.to_string() })
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::LimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        let interface = self.0;

        // Server-side detail stays in the log.
        let message = match interface {
            InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => {
                error!(
                    event_name = "api.request.failed",
                    correlation_id = %interface.correlation_id(),
                    code = interface.code(),
                    detail = %interface.message(),
                    "request failed"
                );
                interface.user_message().to_string()
            }
            _ => {
                warn!(
                    event_name = "api.request.rejected",
                    correlation_id = %interface.correlation_id(),
                    code = interface.code(),
                    detail = %interface.message(),
                    "request rejected"
                );
                interface.message().to_string()
            }
        };

        let body = ApiErrorEnvelope {
            error: ApiErrorBody {
                code: interface.code(),
                message,
                correlation_id: interface.correlation_id().to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

pub async fn suggest(
    State(state): State<ApiState>,
    payload: Result<Json<SuggestionRequest>, JsonRejection>,
) -> Result<Json<MatchResult>, ApiFailure> {
    let correlation_id = correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiFailure::bad_request(rejection.body_text(), &correlation_id))?;

    let mut rng = StdRng::from_entropy();
    let result = state
        .service
        .suggest(&request, &mut rng)
        .await
        .map_err(|error| ApiFailure::from_application(error, &correlation_id))?;

    info!(
        event_name = "api.suggestions.served",
        correlation_id = %correlation_id,
        returned = result.ranked.len(),
        fallback_used = result.fallback_used,
        "suggestions served"
    );
    Ok(Json(result))
}

pub async fn next_suggestion(
    State(state): State<ApiState>,
    payload: Result<Json<NextSuggestionRequest>, JsonRejection>,
) -> Result<Json<MatchResult>, ApiFailure> {
    let correlation_id = correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiFailure::bad_request(rejection.body_text(), &correlation_id))?;

    let mut rng = StdRng::from_entropy();
    let result = state
        .service
        .next_suggestion(&request, &mut rng)
        .await
        .map_err(|error| ApiFailure::from_application(error, &correlation_id))?;

    info!(
        event_name = "api.suggestions.next_served",
        correlation_id = %correlation_id,
        attempt = request.attempt,
        excluded = request.exclude_ids.len(),
        "replacement suggestion served"
    );
    Ok(Json(result))
}

pub async fn message(
    State(state): State<ApiState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiFailure> {
    let correlation_id = correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiFailure::bad_request(rejection.body_text(), &correlation_id))?;

    let mut rng = StdRng::from_entropy();
    let message = state
        .service
        .message(&request, &mut rng)
        .await
        .map_err(|error| ApiFailure::from_application(error, &correlation_id))?;

    Ok(Json(MessageResponse { product_id: request.product_id, message }))
}

pub async fn products(
    State(state): State<ApiState>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> Result<Json<ProductsResponse>, ApiFailure> {
    let correlation_id = correlation_id();
    let Query(query) =
        query.map_err(|rejection| ApiFailure::bad_request(rejection.body_text(), &correlation_id))?;

    let products = state
        .service
        .browse(&query)
        .await
        .map_err(|error| ApiFailure::from_application(error, &correlation_id))?;

    Ok(Json(ProductsResponse { count: products.len(), products }))
}

fn correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use giftmatch_core::config::AppConfig;
    use giftmatch_core::{CatalogError, CatalogStore, Product, ProductId, SuggestionService};
    use giftmatch_db::InMemoryCatalogStore;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::router;

    fn gift(id: &str, category: &str, price: i64, interest: &str) -> Product {
        let mut facets = giftmatch_core::MatchFacets::default();
        facets.occasions = ["Birthday"].into_iter().collect();
        facets.relationships = ["Friend"].into_iter().collect();
        facets.interests = [interest].into_iter().collect();
        Product {
            id: ProductId::from(id),
            title: format!("{interest} Gift"),
            description: format!("A {category} gift for {interest} fans."),
            price: Decimal::from(price),
            category: category.to_string(),
            retailer: "Various Retailers".to_string(),
            rating: 4.5,
            review_count: 100,
            features: Vec::new(),
            tags: Default::default(),
            facets,
            is_active: true,
            priority: 0,
        }
    }

    fn app() -> Router {
        let store = InMemoryCatalogStore::with_products([
            gift("board-game", "Games", 40, "Gaming"),
            gift("headset", "Electronics", 90, "Gaming"),
            gift("apron", "Kitchen", 25, "Cooking"),
        ]);
        let service = SuggestionService::new(Arc::new(store), &AppConfig::default().matching)
            .expect("service");
        router(service)
    }

    struct DownCatalog;

    #[async_trait]
    impl CatalogStore for DownCatalog {
        async fn list_active_products(&self) -> Result<Vec<Product>, CatalogError> {
            Err(CatalogError::Unavailable("database is locked".to_string()))
        }
    }

    async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        send(app, request).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn gamer() -> Value {
        json!({
            "recipientName": "Alex",
            "occasion": "Birthday",
            "relationship": "Friend",
            "interests": ["Gaming"],
            "tone": "Casual"
        })
    }

    #[tokio::test]
    async fn suggestions_return_ranked_products_and_message() {
        let (status, body) =
            post(app(), "/api/v1/suggestions", json!({ "profile": gamer(), "topN": 2 })).await;

        assert_eq!(status, StatusCode::OK);
        let ranked = body["ranked"].as_array().expect("ranked array");
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|entry| entry["product"]["id"] != "apron"));
        assert_eq!(body["selected"]["product"]["id"], ranked[0]["product"]["id"]);
        assert!(body["message"].as_str().is_some_and(|message| message.contains("Alex")));
        assert_eq!(body["fallback_used"], false);
    }

    #[tokio::test]
    async fn missing_required_field_is_a_bad_request_with_correlation_id() {
        let (status, body) = post(
            app(),
            "/api/v1/suggestions",
            json!({ "profile": { "relationship": "Friend", "interests": ["Gaming"], "tone": "Funny" } }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
        assert!(body["error"]["message"].as_str().is_some_and(|message| message.contains("occasion")));
        assert!(body["error"]["correlation_id"].as_str().is_some_and(|id| id.starts_with("req-")));
    }

    #[tokio::test]
    async fn malformed_json_uses_the_error_envelope() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/suggestions")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .expect("request");

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn next_suggestion_honours_exclusions_and_retry_limit() {
        let (status, body) = post(
            app(),
            "/api/v1/suggestions/next",
            json!({ "profile": gamer(), "excludeIds": ["board-game"], "attempt": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ranked"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["selected"]["product"]["id"], "headset");

        let (status, body) = post(
            app(),
            "/api/v1/suggestions/next",
            json!({ "profile": gamer(), "attempt": 4 }),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "limit_reached");
    }

    #[tokio::test]
    async fn message_for_unknown_product_is_not_found() {
        let (status, body) = post(
            app(),
            "/api/v1/messages",
            json!({ "profile": gamer(), "productId": "missing" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");

        let (status, body) = post(
            app(),
            "/api/v1/messages",
            json!({ "profile": gamer(), "productId": "apron" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["product_id"], "apron");
        assert!(body["message"].as_str().is_some_and(|message| message.contains("cooking gift")));
    }

    #[tokio::test]
    async fn products_filters_by_category_and_price() {
        let request = Request::builder()
            .uri("/api/v1/products?category=games&maxPrice=50")
            .body(Body::empty())
            .expect("request");

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["products"][0]["id"], "board-game");
    }

    #[tokio::test]
    async fn store_outage_is_service_unavailable_without_internal_detail() {
        let service =
            SuggestionService::new(Arc::new(DownCatalog), &AppConfig::default().matching)
                .expect("service");

        let (status, body) =
            post(router(service), "/api/v1/suggestions", json!({ "profile": gamer() })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "service_unavailable");
        assert!(body["error"]["message"].as_str().is_some_and(|message| !message.contains("locked")));
    }
}
