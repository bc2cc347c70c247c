pub mod auth;
pub mod ip_filter;
pub mod request_logger;

pub use auth::AuthenticatedUser;
pub use ip_filter::IpFilterLayer;
