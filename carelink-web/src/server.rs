//! Server bootstrap

use carelink_applications::Notifier;
use tracing::{info, warn};

use crate::{routes::router, state::AppState, WebConfig};

/// Build state, start the notification drain, bind, and serve.
pub async fn run(config: WebConfig) -> anyhow::Result<()> {
    let (notifier, mut notifications) = Notifier::channel();

    // Stand-in for the queue worker: drain and log. The request path
    // only ever enqueues.
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            info!(
                model = %notification.model,
                messenger = %notification.messenger,
                subject = %notification.subject,
                "notification dispatched"
            );
        }
        warn!("notification queue closed");
    });

    let bind_address = config.bind_address();
    let state = AppState::new(config, notifier).await?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("carelink-web listening on {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
