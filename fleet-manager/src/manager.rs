//! Fleet-wide subscription orchestration.
//!
//! Fans one create attempt out per server, fans the results back in, and
//! rolls every created subscription back if any single server fails. The
//! fleet either ends fully subscribed or untouched.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};

use redfish_api::{
    ClientConfig, Connector, HttpConnector, ServerDescriptor, Session, SubscriptionPayload,
};

use crate::error::{FleetError, Result};

/// Orchestrates subscription lifecycle across a fleet of controllers.
///
/// All controller traffic goes through the injected [`Connector`], so the
/// whole fan-out/rollback machinery is testable without a network.
///
/// # Example
///
/// ```rust,ignore
/// use fleet_manager::FleetManager;
/// use redfish_api::{ServerDescriptor, SubscriptionPayload};
///
/// let manager = FleetManager::with_defaults();
/// let payload = SubscriptionPayload {
///     destination: "http://hook.example/x".to_string(),
///     ..Default::default()
/// };
///
/// match manager.create_subscriptions_for_all_servers(&servers, &payload).await {
///     Ok(created) => println!("subscribed {} servers", created.len()),
///     Err(e) => eprintln!("rollout failed and was rolled back: {}", e),
/// }
/// ```
pub struct FleetManager {
    connector: Arc<dyn Connector>,
}

impl FleetManager {
    /// Create a manager that drives controllers through the given connector.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Create a manager backed by the HTTP connector with default settings.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(HttpConnector::new(ClientConfig::default())))
    }

    /// Create the subscription on every server concurrently.
    ///
    /// Each server's attempt connects, deletes any existing subscription
    /// with the same destination, creates the new one and records the
    /// remote-assigned identifier. If any attempt fails, every subscription
    /// created by this call is deleted again and the per-server failures
    /// come back as a single [`FleetError::Aggregate`]; no partial result
    /// is returned.
    ///
    /// On success the returned map holds exactly one identifier per input
    /// server, keyed by server address.
    pub async fn create_subscriptions_for_all_servers(
        &self,
        servers: &[ServerDescriptor],
        payload: &SubscriptionPayload,
    ) -> Result<HashMap<String, String>> {
        let created: Arc<Mutex<HashMap<String, String>>> = Arc::new(Mutex::new(HashMap::new()));
        // Capacity matches the worker count so no worker blocks on send.
        let (error_tx, mut error_rx) = mpsc::channel(servers.len().max(1));

        let mut workers = Vec::with_capacity(servers.len());
        for server in servers {
            let connector = Arc::clone(&self.connector);
            let server = server.clone();
            let payload = payload.clone();
            let created = Arc::clone(&created);
            let error_tx = error_tx.clone();

            workers.push(tokio::spawn(async move {
                match subscribe_one(connector.as_ref(), &server, &payload).await {
                    Ok(id) => {
                        // Lock held only for the insert, never across I/O.
                        created
                            .lock()
                            .await
                            .insert(server.address.clone(), id.clone());
                        tracing::info!(
                            address = %server.address,
                            id = %id,
                            "created subscription"
                        );
                    }
                    Err(e) => {
                        let _ = error_tx
                            .send(format!(
                                "subscription failed on server {}: {}",
                                server.address, e
                            ))
                            .await;
                    }
                }
            }));
        }
        drop(error_tx);

        // Join barrier: every attempt finishes before the outcome is decided.
        let mut failures = Vec::new();
        for result in join_all(workers).await {
            if let Err(e) = result {
                failures.push(format!("subscription worker terminated abnormally: {}", e));
            }
        }
        while let Some(message) = error_rx.recv().await {
            failures.push(message);
        }

        let created = {
            let mut map = created.lock().await;
            std::mem::take(&mut *map)
        };

        if !failures.is_empty() {
            self.delete_subscriptions_from_all_servers(servers, &created)
                .await;
            return Err(FleetError::Aggregate { failures });
        }

        Ok(created)
    }

    /// Delete every subscription in the map from its server, concurrently.
    ///
    /// Best effort throughout: a map entry whose address has no matching
    /// descriptor is skipped without contacting any server, and delete
    /// failures are logged, never escalated. Returns once every delete
    /// attempt has finished.
    pub async fn delete_subscriptions_from_all_servers(
        &self,
        servers: &[ServerDescriptor],
        subscriptions: &HashMap<String, String>,
    ) {
        if subscriptions.is_empty() {
            return;
        }

        tracing::info!(
            count = subscriptions.len(),
            "removing subscriptions across fleet"
        );

        let mut workers = Vec::with_capacity(subscriptions.len());
        for (address, id) in subscriptions {
            let server = match servers.iter().find(|s| s.address == *address) {
                Some(s) => s.clone(),
                None => {
                    tracing::warn!(
                        address = %address,
                        "no descriptor matches address, skipping delete"
                    );
                    continue;
                }
            };

            let connector = Arc::clone(&self.connector);
            let id = id.clone();

            workers.push(tokio::spawn(async move {
                match unsubscribe_one(connector.as_ref(), &server, &id).await {
                    Ok(()) => {
                        tracing::info!(
                            address = %server.address,
                            id = %id,
                            "deleted subscription"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            address = %server.address,
                            id = %id,
                            error = %e,
                            "failed to delete subscription"
                        );
                    }
                }
            }));
        }

        for result in join_all(workers).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "delete worker terminated abnormally");
            }
        }
    }
}

/// One server's create attempt: connect, clear conflicting subscriptions,
/// create. The session is released on every path through here.
async fn subscribe_one(
    connector: &dyn Connector,
    server: &ServerDescriptor,
    payload: &SubscriptionPayload,
) -> redfish_api::Result<String> {
    let session = connector.connect(server).await?;
    let result = async {
        delete_conflicting_subscriptions(session.as_ref(), payload).await?;
        session.create_subscription(payload).await
    }
    .await;
    session.close().await;
    result
}

/// Delete every active subscription whose destination equals the payload's.
///
/// Matching is on destination URL only; filters, headers and context are
/// ignored, so re-rolling out with different filters still replaces the old
/// entry. A failure here aborts the caller's create attempt.
async fn delete_conflicting_subscriptions(
    session: &dyn Session,
    payload: &SubscriptionPayload,
) -> redfish_api::Result<()> {
    let existing = session.list_subscriptions().await?;
    for subscription in existing {
        if subscription.destination == payload.destination {
            session.delete_subscription(&subscription.odata_id).await?;
            tracing::info!(
                address = %session.address(),
                id = %subscription.id,
                "deleted conflicting subscription"
            );
        }
    }
    Ok(())
}

/// Delete one identifier from one server, releasing the session either way.
async fn unsubscribe_one(
    connector: &dyn Connector,
    server: &ServerDescriptor,
    id: &str,
) -> redfish_api::Result<()> {
    let session = connector.connect(server).await?;
    let result = session.delete_subscription(id).await;
    session.close().await;
    result
}
