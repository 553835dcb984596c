pub mod auth_service;
pub use auth_service::{AuthError, AuthService, require_self_or_superuser, require_superuser};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;
