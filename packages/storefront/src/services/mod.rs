pub mod admin_service;
pub mod api_support;
pub mod auth_service;
pub mod dispatcher;
pub mod errors;
pub mod laptop_service;
pub mod order_service;
pub mod review_eligibility;
pub mod review_service;
pub mod session_service;
pub mod token_service;
