pub mod auth;

pub use auth::{customer_auth_middleware, optional_customer_middleware, CustomerClaims};
