pub mod auth;

pub use auth::{AdminUser, CurrentUser, CustomerUser, StaffUser};
