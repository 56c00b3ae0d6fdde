//! Application state
//!
//! One bundle of the stores and services every handler needs, built
//! once at startup and cloned cheaply into the router.

use std::sync::Arc;

use anyhow::Context;
use carelink_applications::{
    Authenticator, CareStore, Notifier, SignedTokenService, TokenStore,
};
use tracing::info;

use crate::WebConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub store: Arc<CareStore>,
    pub tokens: Arc<TokenStore>,
    pub signer: Arc<SignedTokenService>,
    pub authenticator: Arc<Authenticator>,
    pub notifier: Notifier,
}

impl AppState {
    /// Build the state from configuration: database-backed stores when
    /// a database URL is configured, in-memory stores otherwise.
    pub async fn new(config: WebConfig, notifier: Notifier) -> anyhow::Result<Self> {
        let (store, tokens) = match &config.database_url {
            Some(url) => {
                let options = url
                    .parse::<sqlx::sqlite::SqliteConnectOptions>()
                    .context("invalid database URL")?
                    .create_if_missing(true);
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .connect_with(options)
                    .await
                    .context("failed to open database")?;

                info!(url = %url, "using sqlite-backed stores");
                (
                    CareStore::database(pool.clone()).await?,
                    TokenStore::database(pool).await?,
                )
            }
            None => {
                info!("no database configured; using in-memory stores");
                (CareStore::memory(), TokenStore::memory())
            }
        };

        let store = Arc::new(store);
        let tokens = Arc::new(tokens);
        let signer = Arc::new(SignedTokenService::new(config.signing_secret.as_bytes()));
        let authenticator = Arc::new(Authenticator::standard(
            tokens.clone(),
            store.clone(),
            signer.clone(),
            config.internal_secret.clone(),
        ));

        Ok(Self {
            config,
            store,
            tokens,
            signer,
            authenticator,
            notifier,
        })
    }
}
