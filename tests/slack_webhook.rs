// tests/slack_webhook.rs
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{TimeZone, Utc};
use job_feed_notifier::ingest::types::{permalink, Author, Engagement};
use job_feed_notifier::notify::slack::SlackNotifier;
use job_feed_notifier::{Item, NotificationSink};
use serde_json::Value;

#[derive(Clone)]
struct Hook {
    status: StatusCode,
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn receive(State(hook): State<Hook>, Json(body): Json<Value>) -> (StatusCode, &'static str) {
    hook.bodies.lock().unwrap().push(body);
    let text = if hook.status.is_success() {
        "ok"
    } else {
        "invalid_blocks"
    };
    (hook.status, text)
}

/// Serve a fake incoming webhook; returns its URL and captured bodies.
async fn spawn_hook(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/services/T0/B0/x", post(receive))
        .with_state(Hook {
            status,
            bodies: bodies.clone(),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/services/T0/B0/x"), bodies)
}

fn job() -> Item {
    let author = Author {
        name: "Lagos Tech Jobs".into(),
        username: "lagostech".into(),
    };
    Item {
        id: "1834567890123456789".into(),
        text: "Hiring a DevOps engineer. ".repeat(30),
        created_at: Utc.with_ymd_and_hms(2025, 9, 6, 9, 5, 0).unwrap(),
        url: permalink(Some(&author), "1834567890123456789"),
        author: Some(author),
        metrics: Engagement {
            likes: 12,
            reposts: 3,
        },
    }
}

#[tokio::test]
async fn delivered_on_200_with_block_payload() {
    let (url, bodies) = spawn_hook(StatusCode::OK).await;
    let sink = SlackNotifier::new(url).with_timeout(5);

    let delivered = sink.notify(&job()).await.expect("delivered");
    assert_eq!(delivered.status, 200);

    let bodies = bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let blocks = bodies[0]["blocks"].as_array().unwrap();
    assert_eq!(blocks[0]["text"]["text"], "🎯 New Job Posting Found");

    let desc = blocks[2]["text"]["text"].as_str().unwrap();
    let body = desc.strip_prefix("*Job Description:*\n").unwrap();
    assert_eq!(body.chars().count(), 503);
    assert!(body.ends_with("..."));

    assert_eq!(
        blocks[4]["elements"][0]["url"],
        "https://twitter.com/lagostech/status/1834567890123456789"
    );
}

#[tokio::test]
async fn non_2xx_is_a_sink_error_with_status_and_body() {
    let (url, bodies) = spawn_hook(StatusCode::BAD_REQUEST).await;
    let sink = SlackNotifier::new(url);

    let err = sink.notify(&job()).await.unwrap_err();
    assert_eq!(err.status, Some(400));
    assert_eq!(err.body, "invalid_blocks");
    assert_eq!(bodies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_webhook_is_a_sink_error_without_status() {
    // bind then drop, so nothing listens on the port
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = SlackNotifier::new(format!("http://{addr}/hook")).with_timeout(2);
    let err = sink.notify(&job()).await.unwrap_err();
    assert_eq!(err.status, None);
}
