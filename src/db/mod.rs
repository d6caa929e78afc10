//! MongoDB client construction and index initialization.
//!
//! Collection names are part of the external contract and must not change.

use anyhow::Result;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{bson::doc, Client, Database, IndexModel};
use secrecy::ExposeSecret;

use crate::config::Config;

pub const SESSIONS: &str = "sessions";
pub const USERS: &str = "users";
pub const CUSTOMERS: &str = "customers";
pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const INVOICES: &str = "invoices";
pub const INVOICE_ITEMS: &str = "invoice_items";
pub const WALLET_TRANSACTIONS: &str = "wallet_transactions";

pub async fn connect(config: &Config) -> Result<Database> {
    let mut client_options = ClientOptions::parse(config.database.url.expose_secret()).await?;
    client_options.app_name = Some(config.service_name.clone());

    let client = Client::with_options(client_options)?;
    Ok(client.database(&config.database.db_name))
}

/// Create the unique and lookup indexes the services rely on.
pub async fn init_indexes(db: &Database) -> Result<()> {
    let unique = |name: &str| {
        IndexOptions::builder()
            .unique(true)
            .name(name.to_string())
            .build()
    };

    db.collection::<bson::Document>(SESSIONS)
        .create_indexes(
            [
                IndexModel::builder()
                    .keys(doc! { "token": 1 })
                    .options(unique("session_token_idx"))
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "is_active": 1 })
                    .options(IndexOptions::builder().name("session_user_idx".to_string()).build())
                    .build(),
            ],
            None,
        )
        .await?;

    db.collection::<bson::Document>(USERS)
        .create_indexes(
            [IndexModel::builder()
                .keys(doc! { "phone": 1 })
                .options(unique("user_phone_idx"))
                .build()],
            None,
        )
        .await?;

    db.collection::<bson::Document>(CUSTOMERS)
        .create_indexes(
            [IndexModel::builder()
                .keys(doc! { "phone": 1 })
                .options(unique("customer_phone_idx"))
                .build()],
            None,
        )
        .await?;

    // product_id is optional on older documents, so the unique index is sparse
    db.collection::<bson::Document>(PRODUCTS)
        .create_indexes(
            [IndexModel::builder()
                .keys(doc! { "product_id": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("product_code_idx".to_string())
                        .build(),
                )
                .build()],
            None,
        )
        .await?;

    db.collection::<bson::Document>(CATEGORIES)
        .create_indexes(
            [IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(unique("category_name_idx"))
                .build()],
            None,
        )
        .await?;

    db.collection::<bson::Document>(INVOICES)
        .create_indexes(
            [IndexModel::builder()
                .keys(doc! { "customer_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("invoice_customer_idx".to_string())
                        .build(),
                )
                .build()],
            None,
        )
        .await?;

    db.collection::<bson::Document>(INVOICE_ITEMS)
        .create_indexes(
            [IndexModel::builder()
                .keys(doc! { "invoice_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("item_invoice_idx".to_string())
                        .build(),
                )
                .build()],
            None,
        )
        .await?;

    db.collection::<bson::Document>(WALLET_TRANSACTIONS)
        .create_indexes(
            [IndexModel::builder()
                .keys(doc! { "customer_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("wallet_customer_idx".to_string())
                        .build(),
                )
                .build()],
            None,
        )
        .await?;

    tracing::info!("Database indexes initialized");
    Ok(())
}
