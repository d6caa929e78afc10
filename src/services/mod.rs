pub mod auth;
pub mod catalog;
pub mod error;
pub mod invoice;
pub mod session;
pub mod token;
pub mod wallet;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use error::ServiceError;
pub use invoice::{InvoiceService, InvoiceStatistics};
pub use session::SessionService;
pub use token::TokenService;
pub use wallet::WalletService;
