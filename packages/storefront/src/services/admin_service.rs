use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::models::http::ApiRequest;
use crate::models::order::StatusUpdateStyle;
use crate::models::user::UserId;
use crate::services::api_support::{send, send_with, StatusOverrides, Wording};
use crate::services::auth_service::PROFILE_PATH;
use crate::services::dispatcher::RequestDispatcher;
use crate::services::errors::api_service_errors::ApiServiceError;

const CURRENT_USER_FAILED: Wording = Wording::Remote("Failed to get current user information");

const CURRENT_USER_ERRORS: &StatusOverrides = &[
    (400, CURRENT_USER_FAILED),
    (403, CURRENT_USER_FAILED),
    (404, CURRENT_USER_FAILED),
    (500, CURRENT_USER_FAILED),
];

pub struct AdminService {
    dispatcher: Arc<RequestDispatcher>,
}

impl AdminService {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        AdminService { dispatcher }
    }

    /// Profile of whoever the stored token belongs to. A 401 still goes
    /// through the session policy.
    pub async fn current_user(&self) -> Result<Value, ApiServiceError> {
        let response = send_with(
            &self.dispatcher,
            ApiRequest::get(PROFILE_PATH),
            CURRENT_USER_ERRORS,
        )
        .await?;
        Ok(response.json_value())
    }

    pub async fn all_users(&self) -> Result<Value, ApiServiceError> {
        let response = send(&self.dispatcher, ApiRequest::get("/admin/users")).await?;
        Ok(response.json_value())
    }

    pub async fn delete_user(&self, user_id: &UserId) -> Result<Value, ApiServiceError> {
        let response = send(
            &self.dispatcher,
            ApiRequest::delete(format!("/admin/users/{}", user_id)),
        )
        .await?;
        info!("Deleted user {}", user_id);
        Ok(response.json_value())
    }

    pub async fn all_orders(&self) -> Result<Value, ApiServiceError> {
        let response = send(&self.dispatcher, ApiRequest::get("/admin/orders")).await?;
        Ok(response.json_value())
    }

    /// The backend has accepted the new status in three shapes; `style`
    /// picks one.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        status: &str,
        style: StatusUpdateStyle,
    ) -> Result<Value, ApiServiceError> {
        let path = format!("/admin/orders/{}/status", order_id);
        let request = match style {
            StatusUpdateStyle::Body => ApiRequest::put(path).json(json!({ "status": status })),
            StatusUpdateStyle::Query => ApiRequest::put(path).query("status", status),
            StatusUpdateStyle::Path => ApiRequest::put(format!("{}/{}", path, status)),
        };
        let response = send(&self.dispatcher, request).await?;
        info!("Order {} moved to {}", order_id, status);
        Ok(response.json_value())
    }

    pub async fn order_statuses(&self) -> Result<Value, ApiServiceError> {
        let response = send(&self.dispatcher, ApiRequest::get("/admin/orders/statuses")).await?;
        Ok(response.json_value())
    }

    pub async fn update_payment_status(
        &self,
        payment_id: i64,
        status: &str,
    ) -> Result<Value, ApiServiceError> {
        let request = ApiRequest::put(format!("/admin/payments/{}/status", payment_id))
            .query("status", status);
        let response = send(&self.dispatcher, request).await?;
        Ok(response.json_value())
    }

    pub async fn payment_statuses(&self) -> Result<Value, ApiServiceError> {
        let response = send(&self.dispatcher, ApiRequest::get("/payments/statuses")).await?;
        Ok(response.json_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::http::{ApiResponse, RequestBody};
    use crate::repositories::session_repository::InMemorySessionRepository;
    use crate::services::dispatcher::{LogNavigator, MockHttpTransport, ACCESS_DENIED_MESSAGE};
    use crate::services::session_service::SessionStore;
    use reqwest::{Method, StatusCode};
    use test_case::test_case;

    fn admin_service(transport: MockHttpTransport) -> AdminService {
        let session = Arc::new(SessionStore::new(Arc::new(InMemorySessionRepository::new())));
        let dispatcher =
            RequestDispatcher::new(Arc::new(transport), session, Arc::new(LogNavigator));
        AdminService::new(Arc::new(dispatcher))
    }

    #[test_case(StatusUpdateStyle::Body, "/admin/orders/3/status", &[], RequestBody::Json(json!({ "status": "SHIPPED" })))]
    #[test_case(StatusUpdateStyle::Query, "/admin/orders/3/status", &[("status", "SHIPPED")], RequestBody::Empty)]
    #[test_case(StatusUpdateStyle::Path, "/admin/orders/3/status/SHIPPED", &[], RequestBody::Empty)]
    #[tokio::test]
    async fn test_update_order_status_shapes(
        style: StatusUpdateStyle,
        path: &'static str,
        query: &'static [(&'static str, &'static str)],
        body: RequestBody,
    ) {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(move |request| {
                let expected_query: Vec<(String, String)> = query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                request.method == Method::PUT
                    && request.path == path
                    && request.query == expected_query
                    && request.body == body
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::OK, r#"{"status":"SHIPPED"}"#)));

        let service = admin_service(transport);
        let updated = service.update_order_status(3, "SHIPPED", style).await.unwrap();
        assert_eq!(updated["status"], "SHIPPED");
    }

    #[tokio::test]
    async fn test_update_payment_status_uses_query() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.path == "/admin/payments/11/status"
                    && request.query == vec![("status".to_string(), "PAID".to_string())]
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::OK, "")));

        let service = admin_service(transport);
        assert_eq!(service.update_payment_status(11, "PAID").await.unwrap(), Value::Null);
    }

    #[test_case(404, "", "Failed to get current user information" ; "default wording")]
    #[test_case(500, r#"{"message":"User store offline"}"#, "User store offline" ; "remote message")]
    #[tokio::test]
    async fn test_current_user_failure_wording(status: u16, body: &'static str, expected: &str) {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| request.method == Method::GET && request.path == PROFILE_PATH)
            .times(1)
            .returning(move |_| {
                Ok(ApiResponse::new(StatusCode::from_u16(status).unwrap(), body))
            });

        let service = admin_service(transport);
        let error = service.current_user().await.unwrap_err();
        assert_eq!(error.message(), expected);
    }

    #[tokio::test]
    async fn test_all_users_forbidden_is_normalized() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(ApiResponse::new(StatusCode::FORBIDDEN, r#"{"message":"no"}"#)));

        let service = admin_service(transport);
        let error = service.all_users().await.unwrap_err();
        assert_eq!(error.message(), ACCESS_DENIED_MESSAGE);
    }

    #[tokio::test]
    async fn test_delete_user_accepts_text_ids() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.method == Method::DELETE && request.path == "/admin/users/u-17"
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::NO_CONTENT, "")));

        let service = admin_service(transport);
        service
            .delete_user(&UserId::Text("u-17".to_string()))
            .await
            .unwrap();
    }
}
