//! HTTP implementation of the collaborator seam.
//!
//! Speaks the Redfish REST protocol directly with reqwest: session login and
//! logout, subscription list/create/delete, and version-dependent request
//! shaping against the `EventService/Subscriptions` collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{ApiError, Result};
use crate::session::{Connector, Session};
use crate::types::{AuthMethod, EventDestination, ServerDescriptor, SubscriptionPayload};
use crate::version::RedfishVersion;

const SERVICE_ROOT_PATH: &str = "/redfish/v1/";
const SESSIONS_PATH: &str = "/redfish/v1/SessionService/Sessions";
const SUBSCRIPTIONS_PATH: &str = "/redfish/v1/EventService/Subscriptions";

/// Configuration for the HTTP connector.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout applied to every individual controller request. There is no
    /// fleet-wide deadline; this bound is what keeps a hung controller from
    /// hanging a whole fleet operation indefinitely.
    pub request_timeout: Duration,
    /// Verify controller TLS certificates. BMCs overwhelmingly ship
    /// self-signed certificates, so this defaults to off.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            verify_tls: false,
        }
    }
}

/// Production [`Connector`] that opens authenticated Redfish sessions.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: ClientConfig,
}

impl HttpConnector {
    /// Create a connector with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug)]
enum SessionAuth {
    /// Basic auth on every request, nothing to release remotely.
    Basic { username: String, password: String },
    /// Redfish session token; `session_uri` is deleted on close when the
    /// controller reported one.
    Token {
        token: String,
        session_uri: Option<String>,
    },
}

/// A live session to one controller over HTTP.
#[derive(Debug)]
pub struct HttpSession {
    http: reqwest::Client,
    address: String,
    auth: SessionAuth,
    version: RedfishVersion,
}

#[derive(Deserialize)]
struct ServiceRoot {
    #[serde(rename = "RedfishVersion")]
    redfish_version: Option<String>,
}

#[derive(Deserialize)]
struct ResourceRef {
    #[serde(rename = "@odata.id", default)]
    odata_id: String,
}

#[derive(Deserialize)]
struct ResourceCollection {
    #[serde(rename = "Members", default)]
    members: Vec<ResourceRef>,
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, server: &ServerDescriptor) -> Result<Box<dyn Session>> {
        let address = server.address.trim_end_matches('/').to_string();

        url::Url::parse(&address).map_err(|e| ApiError::Connection {
            address: address.clone(),
            reason: format!("invalid controller address: {}", e),
        })?;

        let http = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .danger_accept_invalid_certs(!self.config.verify_tls)
            .build()
            .map_err(|e| ApiError::Connection {
                address: address.clone(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        // The service root is unauthenticated and advertises the protocol
        // version that picks the create-request shape for this session.
        let root = fetch_service_root(&http, &address).await?;
        let version = match root.redfish_version {
            Some(raw) => raw.parse().map_err(|_| ApiError::Version {
                address: address.clone(),
                version: raw,
            })?,
            // No advertised version predates 1.5, so the legacy shape applies.
            None => RedfishVersion::new(1, 0, 0),
        };

        let auth = match server.auth_method {
            AuthMethod::Basic => SessionAuth::Basic {
                username: server.username.clone(),
                password: server.password.clone(),
            },
            AuthMethod::Session => open_session(&http, &address, server).await?,
        };

        tracing::debug!(address = %address, version = %version, "connected to controller");

        Ok(Box::new(HttpSession {
            http,
            address,
            auth,
            version,
        }))
    }
}

async fn fetch_service_root(http: &reqwest::Client, address: &str) -> Result<ServiceRoot> {
    let response = http
        .get(format!("{}{}", address, SERVICE_ROOT_PATH))
        .send()
        .await
        .map_err(|e| ApiError::Connection {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(ApiError::Connection {
            address: address.to_string(),
            reason: format!("service root returned HTTP {}", response.status()),
        });
    }

    response.json().await.map_err(|e| ApiError::Connection {
        address: address.to_string(),
        reason: format!("malformed service root: {}", e),
    })
}

async fn open_session(
    http: &reqwest::Client,
    address: &str,
    server: &ServerDescriptor,
) -> Result<SessionAuth> {
    let body = json!({
        "UserName": server.username,
        "Password": server.password,
    });

    let response = http
        .post(format!("{}{}", address, SESSIONS_PATH))
        .json(&body)
        .send()
        .await
        .map_err(|e| ApiError::Connection {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let reason = if status == StatusCode::UNAUTHORIZED {
            "authentication rejected".to_string()
        } else {
            format!("session create returned HTTP {}", status)
        };
        return Err(ApiError::Connection {
            address: address.to_string(),
            reason,
        });
    }

    let token = response
        .headers()
        .get("X-Auth-Token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Connection {
            address: address.to_string(),
            reason: "missing X-Auth-Token header in session response".to_string(),
        })?;

    let session_uri = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    Ok(SessionAuth::Token { token, session_uri })
}

impl HttpSession {
    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.auth {
            SessionAuth::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            SessionAuth::Token { token, .. } => builder.header("X-Auth-Token", token),
        }
    }

    /// Resolve a resource identifier to a full URL. Controllers return both
    /// absolute URLs and bare `@odata.id` paths.
    fn resource_url(&self, id: &str) -> String {
        if id.starts_with("http://") || id.starts_with("https://") {
            id.to_string()
        } else {
            format!("{}{}", self.address, id)
        }
    }

    async fn status_reason(response: Response) -> String {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        if detail.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, detail)
        }
    }
}

/// Build the create-request body for the shape the controller understands.
///
/// The modern shape (Redfish >= 1.5) carries registry-prefix and
/// resource-type filters plus the delivery-retry policy; the legacy shape
/// carries event-type filters and nothing else. Empty collections are
/// omitted, matching controller expectations for absent fields.
fn subscription_request_body(payload: &SubscriptionPayload, modern: bool) -> Value {
    let mut body = Map::new();
    body.insert("Destination".to_string(), json!(payload.destination));

    if modern {
        if !payload.registry_prefixes.is_empty() {
            body.insert(
                "RegistryPrefixes".to_string(),
                json!(payload.registry_prefixes),
            );
        }
        if !payload.resource_types.is_empty() {
            body.insert("ResourceTypes".to_string(), json!(payload.resource_types));
        }
        if let Some(policy) = payload.delivery_retry_policy {
            body.insert("DeliveryRetryPolicy".to_string(), json!(policy));
        }
    } else if !payload.event_types.is_empty() {
        body.insert("EventTypes".to_string(), json!(payload.event_types));
    }

    if !payload.http_headers.is_empty() {
        body.insert("HttpHeaders".to_string(), json!(payload.http_headers));
    }
    body.insert("Protocol".to_string(), json!(payload.protocol));
    if !payload.context.is_empty() {
        body.insert("Context".to_string(), json!(payload.context));
    }
    if let Some(oem) = &payload.oem {
        body.insert("Oem".to_string(), oem.clone());
    }

    Value::Object(body)
}

#[async_trait]
impl Session for HttpSession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn list_subscriptions(&self) -> Result<Vec<EventDestination>> {
        let url = format!("{}{}", self.address, SUBSCRIPTIONS_PATH);
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| ApiError::Query {
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Query {
                address: self.address.clone(),
                reason: Self::status_reason(response).await,
            });
        }

        let collection: ResourceCollection =
            response.json().await.map_err(|e| ApiError::Query {
                address: self.address.clone(),
                reason: format!("malformed subscription collection: {}", e),
            })?;

        let mut subscriptions = Vec::with_capacity(collection.members.len());
        for member in collection.members {
            let response = self
                .request(Method::GET, self.resource_url(&member.odata_id))
                .send()
                .await
                .map_err(|e| ApiError::Query {
                    address: self.address.clone(),
                    reason: e.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(ApiError::Query {
                    address: self.address.clone(),
                    reason: Self::status_reason(response).await,
                });
            }

            let subscription = response.json().await.map_err(|e| ApiError::Query {
                address: self.address.clone(),
                reason: format!("malformed subscription resource: {}", e),
            })?;
            subscriptions.push(subscription);
        }

        Ok(subscriptions)
    }

    async fn create_subscription(&self, payload: &SubscriptionPayload) -> Result<String> {
        let body = subscription_request_body(payload, self.version.supports_event_filters());

        let url = format!("{}{}", self.address, SUBSCRIPTIONS_PATH);
        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Subscription {
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Subscription {
                address: self.address.clone(),
                reason: Self::status_reason(response).await,
            });
        }

        // Controllers report the new resource in the Location header; some
        // only include it in the response body.
        if let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        {
            return Ok(location.to_string());
        }

        let created: ResourceRef = response.json().await.map_err(|e| ApiError::Subscription {
            address: self.address.clone(),
            reason: format!("malformed create response: {}", e),
        })?;

        if created.odata_id.is_empty() {
            return Err(ApiError::Subscription {
                address: self.address.clone(),
                reason: "create response carried no subscription identifier".to_string(),
            });
        }

        Ok(created.odata_id)
    }

    async fn delete_subscription(&self, id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, self.resource_url(id))
            .send()
            .await
            .map_err(|e| ApiError::Subscription {
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Subscription {
                address: self.address.clone(),
                reason: Self::status_reason(response).await,
            });
        }

        Ok(())
    }

    async fn close(self: Box<Self>) {
        if let SessionAuth::Token {
            token,
            session_uri: Some(uri),
        } = &self.auth
        {
            let result = self
                .http
                .delete(self.resource_url(uri))
                .header("X-Auth-Token", token)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(address = %self.address, "released controller session");
                }
                Ok(response) => {
                    tracing::warn!(
                        address = %self.address,
                        status = %response.status(),
                        "failed to release controller session"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        address = %self.address,
                        error = %e,
                        "failed to release controller session"
                    );
                }
            }
        }
    }
}
