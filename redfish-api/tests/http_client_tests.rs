//! Integration tests for the HTTP connector against a mock controller.
//!
//! These tests verify the wire behavior of connect (both auth methods and
//! version negotiation), list, create (both request shapes), delete and
//! session release, using mockito in place of a real BMC.

use std::collections::HashMap;

use mockito::Matcher;
use serde_json::json;

use redfish_api::{
    AuthMethod, ClientConfig, Connector, EventType, HttpConnector, ServerDescriptor,
    SubscriptionPayload,
};

fn descriptor(address: &str, auth_method: AuthMethod) -> ServerDescriptor {
    ServerDescriptor::new(address, "root", "calvin", auth_method, "node-001")
}

async fn service_root_mock(server: &mut mockito::ServerGuard, version: &str) -> mockito::Mock {
    server
        .mock("GET", "/redfish/v1/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"RedfishVersion": "{}"}}"#, version))
        .create_async()
        .await
}

async fn session_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/redfish/v1/SessionService/Sessions")
        .match_body(Matcher::PartialJson(json!({
            "UserName": "root",
            "Password": "calvin",
        })))
        .with_status(201)
        .with_header("X-Auth-Token", "tok-123")
        .with_header("Location", "/redfish/v1/SessionService/Sessions/42")
        .create_async()
        .await
}

#[tokio::test]
async fn test_connect_with_basic_auth_negotiates_version() {
    let mut server = mockito::Server::new_async().await;
    let root = service_root_mock(&mut server, "1.6.0").await;

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Basic))
        .await
        .expect("connect should succeed");

    assert_eq!(session.address(), server.url());
    root.assert_async().await;
    session.close().await;
}

#[tokio::test]
async fn test_connect_with_session_auth_sends_credentials() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.6.0").await;
    let login = session_mock(&mut server).await;

    // Subsequent requests must carry the token from the login response.
    let list = server
        .mock("GET", "/redfish/v1/EventService/Subscriptions")
        .match_header("x-auth-token", "tok-123")
        .with_status(200)
        .with_body(r#"{"Members": []}"#)
        .create_async().await;

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Session))
        .await
        .expect("connect should succeed");

    let subscriptions = session.list_subscriptions().await.unwrap();
    assert!(subscriptions.is_empty());

    login.assert_async().await;
    list.assert_async().await;
    session.close().await;
}

#[tokio::test]
async fn test_connect_rejected_credentials() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.6.0").await;
    let _login = server
        .mock("POST", "/redfish/v1/SessionService/Sessions")
        .with_status(401)
        .create_async().await;

    let connector = HttpConnector::new(ClientConfig::default());
    let error = connector
        .connect(&descriptor(&server.url(), AuthMethod::Session))
        .await
        .expect_err("connect should fail");

    assert!(error.to_string().contains("authentication rejected"));
}

#[tokio::test]
async fn test_connect_unparseable_version() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "one-point-five").await;

    let connector = HttpConnector::new(ClientConfig::default());
    let error = connector
        .connect(&descriptor(&server.url(), AuthMethod::Basic))
        .await
        .expect_err("connect should fail");

    assert!(error.to_string().contains("one-point-five"));
}

#[tokio::test]
async fn test_create_uses_legacy_shape_below_1_5() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.2.0").await;

    let create = server
        .mock("POST", "/redfish/v1/EventService/Subscriptions")
        .match_body(Matcher::PartialJson(json!({
            "Destination": "http://hook.example/x",
            "EventTypes": ["Alert"],
            "Protocol": "Redfish",
        })))
        .with_status(201)
        .with_header("Location", "/redfish/v1/EventService/Subscriptions/7")
        .create_async().await;

    let payload = SubscriptionPayload {
        destination: "http://hook.example/x".to_string(),
        event_types: vec![EventType::Alert],
        registry_prefixes: vec!["Task".to_string()],
        ..Default::default()
    };

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Basic))
        .await
        .unwrap();

    let id = session.create_subscription(&payload).await.unwrap();
    assert_eq!(id, "/redfish/v1/EventService/Subscriptions/7");

    create.assert_async().await;
    session.close().await;
}

#[tokio::test]
async fn test_create_uses_modern_shape_from_1_5() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.6.0").await;

    let create = server
        .mock("POST", "/redfish/v1/EventService/Subscriptions")
        .match_body(Matcher::PartialJson(json!({
            "Destination": "http://hook.example/x",
            "RegistryPrefixes": ["Task"],
            "Protocol": "Redfish",
        })))
        .with_status(201)
        .with_header("Location", "/redfish/v1/EventService/Subscriptions/8")
        .create_async().await;

    let payload = SubscriptionPayload {
        destination: "http://hook.example/x".to_string(),
        event_types: vec![EventType::Alert],
        registry_prefixes: vec!["Task".to_string()],
        ..Default::default()
    };

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Basic))
        .await
        .unwrap();

    let id = session.create_subscription(&payload).await.unwrap();
    assert_eq!(id, "/redfish/v1/EventService/Subscriptions/8");

    create.assert_async().await;
    session.close().await;
}

#[tokio::test]
async fn test_list_follows_collection_members() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.6.0").await;

    let _collection = server
        .mock("GET", "/redfish/v1/EventService/Subscriptions")
        .with_status(200)
        .with_body(
            r#"{"Members": [
                {"@odata.id": "/redfish/v1/EventService/Subscriptions/1"},
                {"@odata.id": "/redfish/v1/EventService/Subscriptions/2"}
            ]}"#,
        )
        .create_async().await;
    let _member1 = server
        .mock("GET", "/redfish/v1/EventService/Subscriptions/1")
        .with_status(200)
        .with_body(
            r#"{"Id": "1", "@odata.id": "/redfish/v1/EventService/Subscriptions/1",
                "Destination": "http://hook.example/x"}"#,
        )
        .create_async().await;
    let _member2 = server
        .mock("GET", "/redfish/v1/EventService/Subscriptions/2")
        .with_status(200)
        .with_body(
            r#"{"Id": "2", "@odata.id": "/redfish/v1/EventService/Subscriptions/2",
                "Destination": "http://other.example/y"}"#,
        )
        .create_async().await;

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Basic))
        .await
        .unwrap();

    let subscriptions = session.list_subscriptions().await.unwrap();
    assert_eq!(subscriptions.len(), 2);
    assert_eq!(subscriptions[0].destination, "http://hook.example/x");
    assert_eq!(subscriptions[1].id, "2");

    session.close().await;
}

#[tokio::test]
async fn test_delete_missing_subscription_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.6.0").await;

    let _delete = server
        .mock("DELETE", "/redfish/v1/EventService/Subscriptions/9")
        .with_status(404)
        .create_async().await;

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Basic))
        .await
        .unwrap();

    let error = session
        .delete_subscription("/redfish/v1/EventService/Subscriptions/9")
        .await
        .expect_err("delete should fail");
    assert!(error.to_string().contains("404"));

    session.close().await;
}

#[tokio::test]
async fn test_close_releases_the_controller_session() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.6.0").await;
    let _login = session_mock(&mut server).await;

    let logout = server
        .mock("DELETE", "/redfish/v1/SessionService/Sessions/42")
        .match_header("x-auth-token", "tok-123")
        .with_status(204)
        .create_async().await;

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Session))
        .await
        .unwrap();

    session.close().await;
    logout.assert_async().await;
}

#[tokio::test]
async fn test_custom_headers_and_context_are_sent() {
    let mut server = mockito::Server::new_async().await;
    let _root = service_root_mock(&mut server, "1.6.0").await;

    let create = server
        .mock("POST", "/redfish/v1/EventService/Subscriptions")
        .match_body(Matcher::PartialJson(json!({
            "HttpHeaders": {"X-Fleet": "rollout"},
            "Context": "fleet-rollout",
        })))
        .with_status(201)
        .with_header("Location", "/redfish/v1/EventService/Subscriptions/10")
        .create_async().await;

    let payload = SubscriptionPayload {
        destination: "http://hook.example/x".to_string(),
        http_headers: HashMap::from([("X-Fleet".to_string(), "rollout".to_string())]),
        context: "fleet-rollout".to_string(),
        ..Default::default()
    };

    let connector = HttpConnector::new(ClientConfig::default());
    let session = connector
        .connect(&descriptor(&server.url(), AuthMethod::Basic))
        .await
        .unwrap();

    session.create_subscription(&payload).await.unwrap();
    create.assert_async().await;
    session.close().await;
}
