use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use modelgate::{
    config::TextFlavor,
    server::{AppState, router},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

mod common;
use common::{MockImageModel, MockTextModel, create_image_service, create_text_service};

fn create_test_app(text: &MockTextModel, image: &MockImageModel) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let app_state = AppState {
        text: Arc::new(create_text_service(text, TextFlavor::Dialogue)),
        image: Arc::new(create_image_service(image, &temp_dir)),
    };

    (router(app_state), temp_dir)
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_text_endpoint_valid_request() {
    let model = MockTextModel::new().with_replies(["I am fine."]);
    let (app, _temp_dir) = create_test_app(&model, &MockImageModel::new());

    let request = json_request(
        "/v1/text",
        json!({
            "input": "Hello, how are you?",
            "user_id": "test-user-1"
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({"user_id": "test-user-1", "response": "I am fine."})
    );
}

#[tokio::test]
async fn test_text_endpoint_generates_user_id() {
    let (app, _temp_dir) = create_test_app(&MockTextModel::new(), &MockImageModel::new());

    let request = json_request("/v1/text", json!({"input": "Test message without user ID"}));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let user_id = body["user_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(user_id).is_ok());
}

#[tokio::test]
async fn test_text_endpoint_empty_input() {
    let model = MockTextModel::new();
    let (app, _temp_dir) = create_test_app(&model, &MockImageModel::new());

    let request = json_request("/v1/text", json!({"input": "", "user_id": "test-empty-input"}));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({"user_id": "test-empty-input", "error": "No input text provided"})
    );
    assert!(model.get_calls().is_empty());
}

#[tokio::test]
async fn test_text_endpoint_generation_failure() {
    let model = MockTextModel::new().with_error("backend offline");
    let (app, _temp_dir) = create_test_app(&model, &MockImageModel::new());

    let request = json_request("/v1/text", json!({"input": "hi", "user_id": "u"}));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Text generation failed: backend offline");
}

#[tokio::test]
async fn test_image_endpoint_returns_file_path() {
    let image = MockImageModel::new();
    let (app, temp_dir) = create_test_app(&MockTextModel::new(), &image);

    let request = json_request(
        "/v1/images",
        json!({"prompt": "a lighthouse at dusk", "user_id": "painter", "guidance_scale": 5.0}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let path = body["image_file_path"].as_str().unwrap();
    assert_eq!(
        std::path::Path::new(path),
        temp_dir.path().join("images").join("painter_generated_image.png")
    );
    assert!(body.get("error").is_none());
    assert_eq!(image.get_calls()[0].params.guidance_scale, 5.0);
}

#[tokio::test]
async fn test_image_endpoint_generation_failure() {
    let image = MockImageModel::new().with_error("sampler diverged");
    let (app, _temp_dir) = create_test_app(&MockTextModel::new(), &image);

    let request = json_request("/v1/images", json!({"prompt": "anything"}));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Image generation failed: sampler diverged");
    assert!(body.get("image_file_path").is_none());
}

#[tokio::test]
async fn test_wrong_http_method() {
    let (app, _temp_dir) = create_test_app(&MockTextModel::new(), &MockImageModel::new());

    let request = Request::builder()
        .method("GET")
        .uri("/v1/text")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // Should return 405 Method Not Allowed
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_wrong_path() {
    let (app, _temp_dir) = create_test_app(&MockTextModel::new(), &MockImageModel::new());

    let request = Request::builder()
        .method("POST")
        .uri("/wrong-path")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // Should return 404 Not Found
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_content_type_validation() {
    let (app, _temp_dir) = create_test_app(&MockTextModel::new(), &MockImageModel::new());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/text")
        .header("content-type", "text/plain")
        .body(Body::from(json!({"input": "Test message"}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_concurrent_requests_keep_users_apart() {
    let model = MockTextModel::new();
    let (app, _temp_dir) = create_test_app(&model, &MockImageModel::new());

    let mut handles = vec![];

    for i in 0..5 {
        let app_clone = app.clone();
        let handle = tokio::spawn(async move {
            let request = json_request(
                "/v1/text",
                json!({
                    "input": format!("Concurrent request {}", i),
                    "user_id": format!("concurrent-user-{}", i)
                }),
            );
            app_clone.oneshot(request).await.unwrap()
        });
        handles.push(handle);
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Each user's context holds only that user's turn
    let mut contexts = model.get_contexts();
    contexts.sort();
    let expected: Vec<String> = (0..5).map(|i| format!("Concurrent request {}", i)).collect();
    assert_eq!(contexts, expected);
}
