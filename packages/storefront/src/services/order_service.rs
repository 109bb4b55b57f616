use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::http::ApiRequest;
use crate::models::order::{CartLine, Checkout, OrderWithPaymentRequest, DEFAULT_PAYMENT_METHOD};
use crate::models::user::UserId;
use crate::services::api_support::{send, send_with, StatusOverrides, Wording};
use crate::services::auth_service::PROFILE_PATH;
use crate::services::dispatcher::RequestDispatcher;
use crate::services::errors::api_service_errors::ApiServiceError;

const CHECKOUT_ERRORS: &StatusOverrides = &[
    (
        400,
        Wording::Validation("Invalid order data. Please check laptop IDs and payment method."),
    ),
    (401, Wording::Fixed("Please login to place an order")),
    (
        403,
        Wording::Fixed("Access denied. You may not have permission to place orders."),
    ),
    (404, Wording::Fixed("One or more laptops in your order were not found")),
];

const ORDER_DETAILS_ERRORS: &StatusOverrides = &[
    (404, Wording::Fixed("Order not found")),
    (403, Wording::Fixed("Access denied to this order")),
];

/// Result of probing the caller's order listing.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointProbe {
    pub accessible: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
}

pub struct OrderService {
    dispatcher: Arc<RequestDispatcher>,
}

impl OrderService {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        OrderService { dispatcher }
    }

    pub async fn create_order(&self, order: Value) -> Result<Value, ApiServiceError> {
        let request = ApiRequest::post("/orders/create").json(order);
        let response = send(&self.dispatcher, request).await?;
        Ok(response.json_value())
    }

    /// Places an order for the signed-in user, one laptop id per unit.
    pub async fn create_order_with_payment(
        &self,
        checkout: &Checkout,
    ) -> Result<Value, ApiServiceError> {
        let laptop_ids = expand_laptop_ids(&checkout.laptops)?;

        let me = send(&self.dispatcher, ApiRequest::get(PROFILE_PATH))
            .await?
            .json_value();
        let user_id = user_id_of(&me).ok_or_else(|| {
            ApiServiceError::Validation("Unable to get current user information".to_string())
        })?;

        let request = OrderWithPaymentRequest {
            user_id,
            laptop_ids,
            payment_method: checkout
                .payment_method
                .clone()
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        };
        debug!(
            "Placing order for user {} with {} item(s)",
            request.user_id,
            request.laptop_ids.len()
        );

        let response = send_with(
            &self.dispatcher,
            ApiRequest::post("/orders/create-with-payment").json(json!(request)),
            CHECKOUT_ERRORS,
        )
        .await?;
        info!("Order placed for user {}", request.user_id);
        Ok(response.json_value())
    }

    /// Orders of the given user, or of the stored profile's user.
    pub async fn user_orders(&self, user_id: Option<UserId>) -> Result<Value, ApiServiceError> {
        let user_id = match user_id {
            Some(id) => id,
            None => self
                .dispatcher
                .session()
                .user_profile()
                .await
                .and_then(|profile| profile.id)
                .ok_or_else(|| {
                    ApiServiceError::Validation(
                        "Missing user id for fetching user orders".to_string(),
                    )
                })?,
        };
        let response = send(
            &self.dispatcher,
            ApiRequest::get(format!("/orders/user/{}", user_id)),
        )
        .await?;
        Ok(response.json_value())
    }

    pub async fn my_orders(&self) -> Result<Value, ApiServiceError> {
        let response = send(&self.dispatcher, ApiRequest::get("/orders/my")).await?;
        Ok(response.json_value())
    }

    pub async fn order(&self, id: i64) -> Result<Value, ApiServiceError> {
        let request = ApiRequest::get(format!("/orders/read/{}", id));
        let response = send(&self.dispatcher, request).await?;
        Ok(response.json_value())
    }

    pub async fn order_details(&self, id: i64) -> Result<Value, ApiServiceError> {
        let response = send_with(
            &self.dispatcher,
            ApiRequest::get(format!("/orders/{}/details", id)),
            ORDER_DETAILS_ERRORS,
        )
        .await?;
        Ok(response.json_value())
    }

    /// Never fails; reports whether `/orders/my` answers for this session.
    pub async fn check_order_endpoint(&self) -> EndpointProbe {
        match self.dispatcher.dispatch(ApiRequest::get("/orders/my")).await {
            Ok(response) => EndpointProbe {
                accessible: true,
                status: Some(response.status.as_u16()),
                error: None,
            },
            Err(error) => {
                warn!("Order endpoint probe failed: {}", error);
                EndpointProbe {
                    accessible: false,
                    status: error.status().map(|status| status.as_u16()),
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

/// Most units of one laptop a single cart line may ask for.
pub const MAX_LINE_QUANTITY: u32 = 100;

/// One id per unit ordered. Quantities below one count as one.
pub fn expand_laptop_ids(lines: &[CartLine]) -> Result<Vec<i64>, ApiServiceError> {
    let mut ids = Vec::new();
    for line in lines {
        if line.laptop_id <= 0 {
            return Err(ApiServiceError::Validation(format!(
                "Invalid laptop ID: {}",
                line.laptop_id
            )));
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(ApiServiceError::Validation(format!(
                "Quantity for laptop {} cannot exceed {}",
                line.laptop_id, MAX_LINE_QUANTITY
            )));
        }
        let quantity = line.quantity.max(1) as usize;
        ids.extend(std::iter::repeat(line.laptop_id).take(quantity));
    }

    if ids.is_empty() {
        return Err(ApiServiceError::Validation(
            "No valid laptop IDs found in order".to_string(),
        ));
    }
    Ok(ids)
}

fn user_id_of(profile: &Value) -> Option<UserId> {
    ["userID", "userId", "id"]
        .iter()
        .filter_map(|key| profile.get(*key))
        .find(|value| !value.is_null())
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::http::{ApiResponse, RequestBody};
    use crate::models::user::{Role, UserProfile};
    use crate::repositories::session_repository::InMemorySessionRepository;
    use crate::services::dispatcher::{LogNavigator, MockHttpTransport};
    use crate::services::errors::api_errors::TransportError;
    use crate::services::session_service::SessionStore;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use reqwest::StatusCode;
    use rstest::rstest;

    fn valid_token() -> String {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        encode(
            &Header::default(),
            &json!({ "sub": "user-1", "exp": exp }),
            &EncodingKey::from_secret("test-secret-key".as_ref()),
        )
        .unwrap()
    }

    async fn order_service(transport: MockHttpTransport, user_id: Option<i64>) -> OrderService {
        let session = Arc::new(SessionStore::new(Arc::new(InMemorySessionRepository::new())));
        if let Some(id) = user_id {
            let mut profile = UserProfile::new(
                "Cara".to_string(),
                "Customer".to_string(),
                "cara@example.com".to_string(),
                Role::Customer,
            );
            profile.id = Some(UserId::Number(id));
            session.persist_session(&valid_token(), &profile).await.unwrap();
        }
        let dispatcher =
            RequestDispatcher::new(Arc::new(transport), session, Arc::new(LogNavigator));
        OrderService::new(Arc::new(dispatcher))
    }

    fn line(laptop_id: i64, quantity: u32) -> CartLine {
        CartLine { laptop_id, quantity }
    }

    fn with_me(transport: &mut MockHttpTransport) {
        transport
            .expect_send()
            .withf(|request| request.path == PROFILE_PATH)
            .returning(|_| {
                Ok(ApiResponse::new(
                    StatusCode::OK,
                    r#"{"userID":42,"role":"CUSTOMER"}"#,
                ))
            });
    }

    #[test]
    fn test_expand_repeats_ids_by_quantity() {
        let ids = expand_laptop_ids(&[line(3, 2), line(8, 1), line(5, 0)]).unwrap();
        assert_eq!(ids, vec![3, 3, 8, 5]);
    }

    #[rstest]
    #[case(vec![line(0, 1)], "Invalid laptop ID: 0")]
    #[case(vec![line(2, 1), line(-4, 3)], "Invalid laptop ID: -4")]
    #[case(vec![], "No valid laptop IDs found in order")]
    #[case(vec![line(6, u32::MAX)], "Quantity for laptop 6 cannot exceed 100")]
    fn test_expand_rejects_bad_carts(#[case] lines: Vec<CartLine>, #[case] expected: &str) {
        let error = expand_laptop_ids(&lines).unwrap_err();
        assert_eq!(error, ApiServiceError::Validation(expected.to_string()));
    }

    #[tokio::test]
    async fn test_checkout_posts_expanded_ids() {
        let mut transport = MockHttpTransport::new();
        with_me(&mut transport);
        transport
            .expect_send()
            .withf(|request| {
                request.path == "/orders/create-with-payment"
                    && request.body
                        == RequestBody::Json(json!({
                            "userId": 42,
                            "laptopIds": [1, 1, 1, 2],
                            "paymentMethod": "CASH_ON_DELIVERY"
                        }))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::CREATED, r#"{"orderID":77}"#)));

        let service = order_service(transport, Some(42)).await;
        let checkout = Checkout {
            laptops: vec![line(1, 3), line(2, 1)],
            payment_method: None,
        };
        let order = service.create_order_with_payment(&checkout).await.unwrap();
        assert_eq!(order["orderID"], 77);
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart_without_network() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let service = order_service(transport, Some(42)).await;
        let checkout = Checkout {
            laptops: vec![],
            payment_method: None,
        };
        let error = service.create_order_with_payment(&checkout).await.unwrap_err();
        assert!(matches!(error, ApiServiceError::Validation(_)));
    }

    #[rstest]
    #[case(400, r#"{"message":"Laptop sold out"}"#, "Validation Error: Laptop sold out")]
    #[case(403, "", "Access denied. You may not have permission to place orders.")]
    #[case(404, "", "One or more laptops in your order were not found")]
    #[tokio::test]
    async fn test_checkout_failure_wording(
        #[case] status: u16,
        #[case] body: &'static str,
        #[case] expected: &str,
    ) {
        let mut transport = MockHttpTransport::new();
        with_me(&mut transport);
        transport
            .expect_send()
            .withf(|request| request.path == "/orders/create-with-payment")
            .returning(move |_| {
                Ok(ApiResponse::new(StatusCode::from_u16(status).unwrap(), body))
            });

        let service = order_service(transport, Some(42)).await;
        let checkout = Checkout {
            laptops: vec![line(1, 1)],
            payment_method: Some("CARD".to_string()),
        };
        let error = service.create_order_with_payment(&checkout).await.unwrap_err();
        assert_eq!(error.message(), expected);
    }

    #[tokio::test]
    async fn test_user_orders_uses_stored_profile_id() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| request.path == "/orders/user/42")
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::OK, "[]")));

        let service = order_service(transport, Some(42)).await;
        assert_eq!(service.user_orders(None).await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_user_orders_without_id_is_validation_error() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let service = order_service(transport, None).await;
        let error = service.user_orders(None).await.unwrap_err();
        assert_eq!(error.message(), "Missing user id for fetching user orders");
    }

    #[tokio::test]
    async fn test_order_details_not_found_wording() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(ApiResponse::new(StatusCode::NOT_FOUND, "")));

        let service = order_service(transport, Some(42)).await;
        let error = service.order_details(9).await.unwrap_err();
        assert_eq!(
            error,
            ApiServiceError::rejected(Some(StatusCode::NOT_FOUND), "Order not found")
        );
    }

    #[tokio::test]
    async fn test_check_order_endpoint_reports_failure() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(TransportError("connection refused".to_string())));

        let service = order_service(transport, Some(42)).await;
        let probe = service.check_order_endpoint().await;
        assert!(!probe.accessible);
        assert_eq!(probe.status, None);
        assert!(probe.error.is_some());
    }

    #[test]
    fn test_user_id_of_accepts_alternate_keys() {
        assert_eq!(user_id_of(&json!({ "userId": 5 })), Some(UserId::Number(5)));
        assert_eq!(
            user_id_of(&json!({ "id": "u-9" })),
            Some(UserId::Text("u-9".to_string()))
        );
        assert_eq!(user_id_of(&json!({ "email": "x@example.com" })), None);
    }
}
