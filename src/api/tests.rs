use crate::server::{build_router, config::AppConfig};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use homefix_core::HomeRepairService;
use homefix_llm::MockProvider;
use homefix_store::Store;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "homefix-test-boundary";

const FULL_ANALYSIS: &str = r#"```json
{"needsMoreInfo": false, "confidence": 0.88, "summary": "Slow drain from a clogged P-trap",
 "problemShort": "Clogged P-trap", "diyFriendly": "yes", "difficulty": "easy",
 "tools": ["bucket", {"name": "slip-joint pliers", "description": "loosen trap nuts"}],
 "steps": ["Place bucket", "Remove trap", "Clear debris", "Reassemble"],
 "suggestedQuestions": ["What if it still drains slowly?"]}
```"#;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config
}

fn app(mock: &MockProvider, store: Option<Store>) -> Router {
    let service = Arc::new(HomeRepairService::new(Arc::new(mock.clone())));
    build_router(service, store, &test_config())
}

async fn memory_store() -> Store {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = Store::new(pool);
    store.init().await.unwrap();
    store
}

fn multipart_request(metadata: &Value, files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\r\n{}\r\n",
            metadata
        )
        .as_bytes(),
    );
    for (i, (content_type, data)) in files.iter().enumerate() {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"photo{i}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 180, 160]));
    let mut data = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut data), image::ImageFormat::Png)
        .unwrap();
    data
}

#[tokio::test]
async fn test_health() {
    let response = app(&MockProvider::new(), None)
        .oneshot(get("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_analyze_questions_round() {
    let mock = MockProvider::with_reply(
        r#"{"needsMoreInfo": true, "confidence": 0.4, "summary": "Need more detail",
            "questions": [{"question": "Where is the leak?", "suggestions": ["Sink", "Toilet", "Wall"]}]}"#,
    );
    let response = app(&mock, None)
        .oneshot(multipart_request(
            &json!({"description": "Water on the bathroom floor", "location": "bathroom"}),
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["needsMoreInfo"], true);
    assert_eq!(body["data"]["confidenceLevel"], "low");
    assert_eq!(body["data"]["questions"][0]["suggestions"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["materials"], json!([]));
    assert!(body.get("analysisId").is_none());
}

#[tokio::test]
async fn test_analyze_with_photo_persists_full_result() {
    let mock = MockProvider::with_reply(FULL_ANALYSIS);
    let store = memory_store().await;
    let photo = png(40, 30);

    let response = app(&mock, Some(store.clone()))
        .oneshot(multipart_request(
            &json!({"description": "Sink drains slowly", "userId": "user-7"}),
            &[("image/png", &photo)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["needsMoreInfo"], false);
    assert_eq!(body["data"]["tools"][0], json!({"name": "bucket", "description": ""}));
    assert_eq!(mock.last_request().unwrap().image_count(), 1);

    let id = body["analysisId"].as_str().unwrap();
    let saved = store.list_analyses("user-7", 10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id.to_string(), id);
    assert_eq!(saved[0].description, "Sink drains slowly");
}

#[tokio::test]
async fn test_analyze_requires_metadata() {
    let mock = MockProvider::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();

    let response = app(&mock, None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_missing_description() {
    let mock = MockProvider::new();
    let response = app(&mock, None)
        .oneshot(multipart_request(&json!({"description": "  "}), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn test_analyze_unsupported_media() {
    let mock = MockProvider::new();
    let response = app(&mock, None)
        .oneshot(multipart_request(
            &json!({"description": "Cracked tile"}),
            &[("image/gif", b"GIF89a")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["code"], "unsupported_media_type");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_too_many_files() {
    let mock = MockProvider::new();
    let junk: &[u8] = b"junk";
    let files = vec![("image/jpeg", junk); 5];

    let response = app(&mock, None)
        .oneshot(multipart_request(&json!({"description": "Cracked tile"}), &files))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "too_many_files");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_extra_file_rejected_before_its_bytes_are_read() {
    let mock = MockProvider::new();
    let mut config = test_config();
    config.server.max_body_bytes = 16 * 1024;
    let service = Arc::new(HomeRepairService::new(Arc::new(mock.clone())));
    let router = build_router(service, None, &config);

    // Everything up to the fifth file's headers fits the body limit; the
    // fifth file's data alone does not.
    let mut head = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\r\n{}\r\n",
        json!({"description": "Water stain on ceiling"})
    );
    for i in 0..5 {
        if i > 0 {
            head.push_str("junk\r\n");
        }
        head.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"photo{i}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        ));
    }
    let mut tail = vec![0xAB; 64 * 1024];
    tail.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![Ok(head.into_bytes()), Ok(tail)];
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from_stream(futures::stream::iter(chunks)))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "too_many_files");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_malformed_model_output() {
    let mock = MockProvider::with_reply("I think it is probably fine.");
    let response = app(&mock, None)
        .oneshot(multipart_request(&json!({"description": "Cracked tile"}), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "malformed_model_output");
}

#[tokio::test]
async fn test_analyze_upstream_unavailable() {
    let mock = MockProvider::new();
    mock.push_error(homefix_llm::Error::ServerError("overloaded".to_string()));

    let response = app(&mock, None)
        .oneshot(multipart_request(&json!({"description": "Cracked tile"}), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "generation_unavailable");
    assert!(!body["error"].as_str().unwrap().contains("overloaded"));
}

#[tokio::test]
async fn test_chat() {
    let mock = MockProvider::with_reply("  Turn the water off first.  ");
    let response = app(&mock, None)
        .oneshot(json_request(
            "POST",
            "/api/chat",
            &json!({
                "originalDescription": "Leaky faucet",
                "analysisContext": {"problemSummary": "Worn washer"},
                "history": [],
                "message": "Where do I start?"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["reply"], "Turn the water off first.");
}

#[tokio::test]
async fn test_chat_empty_message() {
    let response = app(&MockProvider::new(), None)
        .oneshot(json_request(
            "POST",
            "/api/chat",
            &json!({"originalDescription": "Leaky faucet", "message": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_routes_without_store() {
    let app = app(&MockProvider::new(), None);

    let response = app.clone().oneshot(get("/api/profile/user-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "persistence_disabled");

    let response = app.oneshot(get("/api/analyses/user-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_profile_crud() {
    let app = app(&MockProvider::new(), Some(memory_store().await));

    let response = app.clone().oneshot(get("/api/profile/user-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/profile/user-1",
            &json!({"homeType": "townhouse", "yearBuilt": 1978}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/api/profile/user-1")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["profile"]["homeType"], "townhouse");
    assert_eq!(body["data"]["profile"]["yearBuilt"], "1978");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/profile/user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["deleted"], true);

    let response = app.oneshot(get("/api/profile/user-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_analysis_by_id() {
    let store = memory_store().await;
    let mut result = homefix_core::AnalysisResult::empty(0.9);
    result.problem_short = "Loose hinge".to_string();
    let id = store
        .save_analysis(Some("user-2"), "Door sags", &result)
        .await
        .unwrap();
    let app = app(&MockProvider::new(), Some(store));

    let response = app
        .clone()
        .oneshot(get(&format!("/api/analysis/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["result"]["problemShort"], "Loose hinge");

    let response = app.clone().oneshot(get("/api/analysis/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get(&format!("/api/analysis/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
