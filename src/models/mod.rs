pub mod invoice;
pub mod product;
pub mod role;
pub mod session;
pub mod user;

pub use invoice::{
    DiscountType, Invoice, InvoiceFilter, InvoiceItem, PaymentStatus, TransactionType,
    WalletTransaction,
};
pub use product::{Category, Product, StockStatus};
pub use role::UserRole;
pub use session::Session;
pub use user::{Customer, Principal, User};
