pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{AuthService, CatalogService, InvoiceService, WalletService};

#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub config: Config,
    pub auth: AuthService,
    pub catalog: CatalogService,
    pub wallet: WalletService,
    pub invoices: InvoiceService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Auth and sessions
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/validate", get(handlers::auth::validate))
        .route("/api/auth/register", post(handlers::auth::register))
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route(
            "/api/auth/customer-check/:phone",
            get(handlers::auth::check_customer),
        )
        .route(
            "/api/auth/set-customer-password",
            post(handlers::auth::set_customer_password),
        )
        .route(
            "/api/auth/sessions",
            get(handlers::auth::list_sessions).delete(handlers::auth::revoke_all_sessions),
        )
        .route(
            "/api/auth/sessions/purge",
            post(handlers::auth::purge_sessions),
        )
        .route(
            "/api/auth/sessions/:id",
            delete(handlers::auth::revoke_session),
        )
        // Invoices
        .route(
            "/api/invoices",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route(
            "/api/invoices/statistics",
            get(handlers::invoices::invoice_statistics),
        )
        .route("/api/invoices/my", get(handlers::invoices::my_invoices))
        .route(
            "/api/invoices/:id",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route(
            "/api/invoices/:id/status",
            patch(handlers::invoices::update_invoice_status),
        )
        .route(
            "/api/invoices/customer/:customer_id",
            get(handlers::invoices::customer_invoices),
        )
        // Customers and wallets
        .route(
            "/api/customers",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/api/customers/me/wallet",
            get(handlers::customers::my_wallet),
        )
        .route(
            "/api/customers/me/wallet/transactions",
            get(handlers::customers::my_wallet_transactions),
        )
        .route("/api/customers/:id", get(handlers::customers::get_customer))
        .route(
            "/api/customers/:id/password",
            post(handlers::customers::set_password),
        )
        .route(
            "/api/customers/:id/wallet",
            get(handlers::customers::wallet_balance).post(handlers::customers::adjust_wallet),
        )
        .route(
            "/api/customers/:id/wallet/transactions",
            get(handlers::customers::wallet_transactions),
        )
        // Catalog
        .route(
            "/api/products",
            post(handlers::products::create_product).get(handlers::products::list_products),
        )
        .route("/api/products/:id", get(handlers::products::get_product))
        .route(
            "/api/products/:id/stock",
            patch(handlers::products::update_stock),
        )
        .route(
            "/api/categories",
            post(handlers::categories::create_category).get(handlers::categories::list_categories),
        )
        .route(
            "/api/categories/:id",
            delete(handlers::categories::delete_category),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
