//! Integration tests for sale delivery to the automation webhook.

use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::{TimeZone, Utc};
use url::Url;

use techstore_chat::webhook::{SaleEvent, WebhookClient, WebhookError};
use techstore_integration_tests::{ScriptedModel, TestContext, open_instant, serve};

type Received = Arc<Mutex<Vec<serde_json::Value>>>;

/// Receiver answering every POST with `status` and recording the body.
async fn spawn_receiver(status: StatusCode) -> (Url, Received) {
    let received: Received = Arc::default();

    let app = Router::new()
        .route(
            "/hooks/catch/123/abc/",
            post(
                move |State(received): State<Received>, Json(body): Json<serde_json::Value>| async move {
                    received.lock().expect("received lock").push(body);
                    status
                },
            ),
        )
        .with_state(Arc::clone(&received));
    let addr = serve(app).await;

    let url = Url::parse(&format!("http://{addr}/hooks/catch/123/abc/")).expect("url");
    (url, received)
}

fn sample_event() -> SaleEvent {
    SaleEvent {
        timestamp: Utc
            .with_ymd_and_hms(2026, 3, 10, 17, 5, 0)
            .single()
            .expect("timestamp"),
        summary: "2x Cabo HDMI 2m".to_string(),
        session: "ab12cd34".to_string(),
        origin: "TechStore Chat".to_string(),
    }
}

#[tokio::test]
async fn test_post_sale_delivers_payload() {
    let (url, received) = spawn_receiver(StatusCode::OK).await;
    let client = WebhookClient::new(url).expect("client");

    client.post_sale(&sample_event()).await.expect("delivered");

    let received = received.lock().expect("received lock");
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0],
        serde_json::json!({
            "timestamp": "2026-03-10T17:05:00Z",
            "summary": "2x Cabo HDMI 2m",
            "session": "ab12cd34",
            "origin": "TechStore Chat"
        })
    );
}

#[tokio::test]
async fn test_rejected_delivery_is_an_error() {
    let (url, _) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let client = WebhookClient::new(url).expect("client");

    let result = client.post_sale(&sample_event()).await;
    assert!(matches!(result, Err(WebhookError::Rejected { status: 500, .. })));
}

#[tokio::test]
async fn test_chat_sale_reaches_webhook() {
    let (url, received) = spawn_receiver(StatusCode::OK).await;
    let ctx = TestContext::builder()
        .at(open_instant())
        .model(Some(ScriptedModel::replying("Pedido: 1x Webcam Full HD. [SALE_CONFIRMED]")))
        .notifier(Arc::new(WebhookClient::new(url).expect("client")))
        .spawn()
        .await;

    let (status, _) = ctx.chat("pode fechar").await;
    assert_eq!(status, 200);

    let received = received.lock().expect("received lock");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["summary"], "Pedido: 1x Webcam Full HD.");
    assert_eq!(received[0]["origin"], "TechStore Chat");
    assert_eq!(received[0]["timestamp"], "2026-03-10T17:00:00Z");
}

#[tokio::test]
async fn test_failing_webhook_does_not_fail_chat() {
    let (url, received) = spawn_receiver(StatusCode::SERVICE_UNAVAILABLE).await;
    let ctx = TestContext::builder()
        .at(open_instant())
        .model(Some(ScriptedModel::replying("Fechado! [SALE_CONFIRMED]")))
        .notifier(Arc::new(WebhookClient::new(url).expect("client")))
        .spawn()
        .await;

    let (status, body) = ctx.chat("sim").await;
    assert_eq!(status, 200);
    assert!(body["reply"].as_str().expect("reply").starts_with("Fechado!"));
    assert_eq!(received.lock().expect("received lock").len(), 1);
}
