pub mod api_errors;
pub mod api_service_errors;
pub mod auth_service_errors;
