pub mod health;

use std::any::Any;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
};

use crate::resume::handlers::{self, UPLOAD_BODY_LIMIT};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resume/compile", post(handlers::handle_compile))
        .route("/api/v1/resume/generate", post(handlers::handle_generate))
        .route(
            "/api/v1/resume/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// CORS for the browser editor: explicit origins only, since credentials are allowed.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300)))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("Handler panicked: {detail}");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::resume::handlers::MAX_UPLOAD_BYTES;
    use crate::resume::writer::ResumeWriter;
    use crate::test_support::{FakeBackend, FakeRenderer, Reply};

    const DOC: &str = "\\documentclass{article}\n\\begin{document}\nJane\n\\end{document}";
    const BOUNDARY: &str = "resume-test-boundary";

    fn app(reply: Reply, renderer: FakeRenderer) -> (Router, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::new(reply));
        let state = AppState {
            writer: ResumeWriter::new(backend.clone()),
            renderer: Arc::new(renderer),
        };
        (build_router(state), backend)
    }

    fn default_app() -> Router {
        app(Reply::text(DOC), FakeRenderer::Pdf(b"%PDF-1.5 fake")).0
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_post(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/resume/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    fn text(body: &[u8]) -> String {
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, _, body) = send(default_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(text(&body), "OK");
    }

    #[tokio::test]
    async fn test_compile_returns_pdf() {
        let request = json_post("/api/v1/resume/compile", json!({ "latex_code": DOC }));
        let (status, content_type, body) = send(default_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/pdf"));
        assert!(body.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_compile_failure_is_500_with_log() {
        let (app, _) = app(
            Reply::text(DOC),
            FakeRenderer::CompilerLog("! Missing \\end{itemize}.\nl.9"),
        );
        let request = json_post("/api/v1/resume/compile", json!({ "latex_code": "\\documentclass" }));

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = text(&body);
        assert!(body.starts_with("Compilation failed: "));
        assert!(body.contains("l.9"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let request = Request::post("/api/v1/resume/compile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, _, body) = send(default_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text(&body), "Invalid request body");
    }

    #[tokio::test]
    async fn test_missing_json_content_type_is_400() {
        let request = Request::post("/api/v1/resume/generate")
            .body(Body::from(r#"{"prompt":"hi"}"#))
            .unwrap();

        let (status, _, _) = send(default_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_returns_latex_json() {
        let (app, backend) = app(
            Reply::text(&format!("```latex\n{DOC}\n```")),
            FakeRenderer::Pdf(b"%PDF"),
        );
        let request = json_post(
            "/api/v1/resume/generate",
            json!({ "prompt": "Add a skills section", "current_latex": "\\documentclass{old}" }),
        );

        let (status, content_type, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "latex": DOC }));
        assert_eq!(backend.last_request().contents[0].parts.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_empty_reply_is_500() {
        let (app, _) = app(Reply::NoCandidates, FakeRenderer::Pdf(b"%PDF"));
        let request = json_post("/api/v1/resume/generate", json!({ "prompt": "hi" }));

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(&body), "AI Generation failed: no content generated");
    }

    #[tokio::test]
    async fn test_generate_backend_error_is_surfaced() {
        let (app, _) = app(
            Reply::ApiError(503, "The model is overloaded."),
            FakeRenderer::Pdf(b"%PDF"),
        );
        let request = json_post("/api/v1/resume/generate", json!({ "prompt": "hi" }));

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text(&body).contains("The model is overloaded."));
    }

    #[tokio::test]
    async fn test_upload_converts_file() {
        let (app, backend) = app(Reply::text(DOC), FakeRenderer::Pdf(b"%PDF"));
        let request = multipart_post("resume", "cv.pdf", "application/pdf", b"%PDF-1.4 resume");

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["latex"], DOC);
        let request = backend.last_request();
        let blob = request.contents[0].parts[1].inline_data.as_ref().unwrap();
        assert_eq!(blob.mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_upload_sniffs_generic_mime() {
        let (app, backend) = app(Reply::text(DOC), FakeRenderer::Pdf(b"%PDF"));
        let request = multipart_post("resume", "scan", "application/octet-stream", b"\xff\xd8\xff\xe0jpeg");

        let (status, _, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        let request = backend.last_request();
        let blob = request.contents[0].parts[1].inline_data.as_ref().unwrap();
        assert_eq!(blob.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_upload_without_resume_field_is_400() {
        let request = multipart_post("document", "cv.pdf", "application/pdf", b"%PDF-1.4");

        let (status, _, body) = send(default_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text(&body), "Failed to get file 'resume'");
    }

    #[tokio::test]
    async fn test_upload_without_multipart_is_400() {
        let request = json_post("/api/v1/resume/upload", json!({ "resume": "nope" }));

        let (status, _, _) = send(default_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_400() {
        let (app, backend) = app(Reply::text(DOC), FakeRenderer::Pdf(b"%PDF"));
        let file = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        let request = multipart_post("resume", "huge.pdf", "application/pdf", &file);

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text(&body), "File too large or invalid multipart");
        assert_eq!(backend.requests_seen(), 0);
    }

    #[tokio::test]
    async fn test_upload_conversion_failure_is_500() {
        let (app, _) = app(Reply::NoParts, FakeRenderer::Pdf(b"%PDF"));
        let request = multipart_post("resume", "cv.png", "image/png", b"\x89PNG\r\n\x1a\n");

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(&body), "AI Conversion failed: no content generated");
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_500() {
        let (app, _) = app(Reply::text(DOC), FakeRenderer::Panic);
        let request = json_post("/api/v1/resume/compile", json!({ "latex_code": DOC }));

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(&body), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_with_credentials() {
        let origins = vec!["http://localhost:5173".to_string()];
        let app = default_app().layer(cors_layer(&origins).unwrap());
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/resume/compile")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let origins = vec!["http://localhost:5173".to_string()];
        let app = default_app().layer(cors_layer(&origins).unwrap());
        let request = Request::get("/health")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
