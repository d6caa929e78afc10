//! Application startup and lifecycle management.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::services::{
    AuthService, CatalogService, InvoiceService, SessionService, TokenService, WalletService,
};
use crate::{db, router, AppState};

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let database = db::connect(&config).await?;
        db::init_indexes(&database).await?;

        let tokens = TokenService::new(&config.auth);
        let sessions = SessionService::new(&database, config.auth.session_ttl_minutes);
        let auth = AuthService::new(&database, tokens, sessions);
        let catalog = CatalogService::new(&database);
        let wallet = WalletService::new(&database);
        let invoices = InvoiceService::new(&database, catalog.clone(), wallet.clone());

        let admin_phone =
            std::env::var("MARKET_ADMIN_PHONE").unwrap_or_else(|_| "1234567890".to_string());
        let admin_password =
            std::env::var("MARKET_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        auth.ensure_admin(&admin_phone, &admin_password).await?;

        let state = AppState {
            db: database,
            config: config.clone(),
            auth,
            catalog,
            wallet,
            invoices,
        };

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}:{}", config.server.host, port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let app = router(self.state);
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}
