pub mod auth;
pub mod http;
pub mod laptop;
pub mod order;
pub mod review;
pub mod user;
