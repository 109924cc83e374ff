//! HTTP router.
//!
//! The page is served at `/`; JSON routes live under `/api/`.
//! Every response carries `Cache-Control: no-store` since it reflects
//! volatile workflow state.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::types::AppState;

/// Build the application router.
///
/// No global body limit: the upload handler streams each file and keeps at
/// most the policy's file size, so an oversized file is rejected on its own
/// instead of failing the whole batch.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/images",
            get(endpoints::images::list).post(endpoints::images::upload),
        )
        .route(
            "/images/:id",
            axum::routing::delete(endpoints::images::remove),
        )
        .route("/previews/:id", get(endpoints::images::preview))
        .route(
            "/analysis",
            get(endpoints::analysis::status)
                .post(endpoints::analysis::start)
                .delete(endpoints::analysis::reset),
        )
        .route("/results", get(endpoints::results::current))
        .route("/report", get(endpoints::report::download));

    Router::new()
        .route("/", get(endpoints::page::index))
        .route("/health", get(endpoints::health::check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::disable())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::detection::{DetectionError, MockDetectionClient};
    use crate::intake::staging::test_support::{JPEG_MAGIC, PNG_MAGIC};
    use crate::intake::{IntakePolicy, PreviewRegistry};
    use crate::orchestrator::AnalysisOrchestrator;

    const BOUNDARY: &str = "urinevision-test-boundary";

    fn app_with_policy(detector: MockDetectionClient, policy: IntakePolicy) -> (Router, AppState) {
        let previews = PreviewRegistry::new();
        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            policy,
            previews.clone(),
            Arc::new(detector),
            Duration::from_secs(5),
        ));
        let state = AppState::new(orchestrator, previews, "P2025-001234");
        (build_router(state.clone()), state)
    }

    fn app_with(detector: MockDetectionClient) -> (Router, AppState) {
        app_with_policy(detector, IntakePolicy::default())
    }

    fn test_app() -> (Router, AppState) {
        app_with(MockDetectionClient::new(Duration::ZERO))
    }

    fn multipart_body(files: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, content_type, bytes) in files {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(files: &[(&str, &str, Vec<u8>)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/images")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(files)))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn jpeg_bytes() -> Vec<u8> {
        let mut bytes = JPEG_MAGIC.to_vec();
        bytes.resize(256, 0);
        bytes
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_idle_and_no_store() {
        let (app, _) = test_app();
        let response = app.oneshot(request("GET", "/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["workflow"], "idle");
        assert_eq!(body["detector"], "mock");
    }

    #[tokio::test]
    async fn index_serves_page() {
        let (app, _) = test_app();
        let response = app.oneshot(request("GET", "/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("UrineVision AI"));
        assert!(html.contains("/api/analysis"));
        // Reset stays available while an analysis is in flight.
        assert!(!html.contains("btnReset.disabled"));
        assert!(html.contains("abnormal_count"));
    }

    #[tokio::test]
    async fn upload_stages_images_and_reports_rejections() {
        let (app, state) = test_app();
        let response = app
            .clone()
            .oneshot(upload_request(&[
                ("field_01.jpg", "image/jpeg", jpeg_bytes()),
                ("field_02.png", "image/png", PNG_MAGIC.to_vec()),
                ("notes.pdf", "application/pdf", b"%PDF-1.4".to_vec()),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["accepted"].as_array().unwrap().len(), 2);
        assert_eq!(body["rejected"][0]["file_name"], "notes.pdf");
        assert_eq!(body["rejected"][0]["code"], "INVALID_FORMAT");
        assert_eq!(body["staged_count"], 2);
        assert_eq!(state.previews.live_count(), 2);

        let listed = json(app.oneshot(request("GET", "/api/images")).await.unwrap()).await;
        assert_eq!(listed[0]["file_name"], "field_01.jpg");
        assert_eq!(listed[1]["mime_type"], "image/png");
    }

    #[tokio::test]
    async fn oversized_upload_rejected_alone_rest_of_batch_staged() {
        let (app, state) = app_with_policy(
            MockDetectionClient::new(Duration::ZERO),
            IntakePolicy {
                max_file_size: 1024,
                max_images: 2,
            },
        );
        let mut big = JPEG_MAGIC.to_vec();
        big.resize(2 * 1024 * 1024, 0);

        let response = app
            .oneshot(upload_request(&[
                ("ok.jpg", "image/jpeg", jpeg_bytes()),
                ("big.jpg", "image/jpeg", big),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["accepted"][0]["file_name"], "ok.jpg");
        assert_eq!(body["rejected"][0]["file_name"], "big.jpg");
        assert_eq!(body["rejected"][0]["code"], "FILE_TOO_LARGE");
        assert!(body["rejected"][0]["message"]
            .as_str()
            .unwrap()
            .contains(&(2 * 1024 * 1024).to_string()));
        assert_eq!(body["staged_count"], 1);
        assert_eq!(state.previews.live_count(), 1);
    }

    #[tokio::test]
    async fn upload_over_image_limit_rejects_batch() {
        let (app, state) = app_with_policy(
            MockDetectionClient::new(Duration::ZERO),
            IntakePolicy {
                max_file_size: 1024,
                max_images: 1,
            },
        );
        let response = app
            .oneshot(upload_request(&[
                ("a.jpg", "image/jpeg", jpeg_bytes()),
                ("b.jpg", "image/jpeg", jpeg_bytes()),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "TOO_MANY_IMAGES");
        assert_eq!(state.previews.live_count(), 0);
    }

    #[tokio::test]
    async fn upload_without_files_is_bad_request() {
        let (app, _) = test_app();
        let response = app.oneshot(upload_request(&[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn preview_is_served_until_unstaged() {
        let (app, state) = test_app();
        let staged = json(
            app.clone()
                .oneshot(upload_request(&[("a.jpg", "image/jpeg", jpeg_bytes())]))
                .await
                .unwrap(),
        )
        .await;
        let id = staged["accepted"][0]["id"].as_str().unwrap().to_string();
        let preview_uri = staged["accepted"][0]["preview_uri"].as_str().unwrap().to_string();
        assert_eq!(preview_uri, format!("/api/previews/{id}"));

        let preview = app.clone().oneshot(request("GET", &preview_uri)).await.unwrap();
        assert_eq!(preview.status(), StatusCode::OK);
        assert_eq!(preview.headers().get("Content-Type").unwrap(), "image/jpeg");
        let bytes = to_bytes(preview.into_body(), 1024 * 1024).await.unwrap();
        assert_eq!(bytes.len(), 256);

        let removed = json(
            app.clone()
                .oneshot(request("DELETE", &format!("/api/images/{id}")))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(removed["removed"], true);
        assert_eq!(state.previews.live_count(), 0);

        let gone = app.oneshot(request("GET", &preview_uri)).await.unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_image_id_is_bad_request() {
        let (app, _) = test_app();
        let response = app
            .oneshot(request("DELETE", "/api/images/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analysis_without_images_is_empty_input() {
        let (app, _) = test_app();
        let response = app.oneshot(request("POST", "/api/analysis")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "EMPTY_INPUT");
    }

    #[tokio::test]
    async fn results_and_report_are_404_before_analysis() {
        let (app, _) = test_app();
        let results = app.clone().oneshot(request("GET", "/api/results")).await.unwrap();
        assert_eq!(results.status(), StatusCode::NOT_FOUND);

        let report = app
            .oneshot(request("GET", "/api/report?format=docx"))
            .await
            .unwrap();
        assert_eq!(report.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_workflow_upload_analyze_export_reset() {
        let (app, state) = test_app();
        app.clone()
            .oneshot(upload_request(&[("field_01.jpg", "image/jpeg", jpeg_bytes())]))
            .await
            .unwrap();

        let analysis = app.clone().oneshot(request("POST", "/api/analysis")).await.unwrap();
        assert_eq!(analysis.status(), StatusCode::OK);
        let body = json(analysis).await;
        assert_eq!(body["state"], "complete");
        assert_eq!(body["view"]["title"], "Analysis Complete: field_01.jpg");
        assert_eq!(body["view"]["findings"][2]["color"], "destructive");

        let status = json(app.clone().oneshot(request("GET", "/api/analysis")).await.unwrap()).await;
        assert_eq!(status["state"], "complete");
        assert_eq!(status["result"]["overall_accuracy_percent"], 91.5);

        let results = app.clone().oneshot(request("GET", "/api/results")).await.unwrap();
        assert_eq!(results.status(), StatusCode::OK);

        let report = app
            .clone()
            .oneshot(request("GET", "/api/report?format=xml&patient_id=P-42"))
            .await
            .unwrap();
        assert_eq!(report.status(), StatusCode::OK);
        assert_eq!(report.headers().get("Content-Type").unwrap(), "application/xml");
        let disposition = report
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"urine_analysis_report_US-"));
        assert!(disposition.ends_with(".xml\""));
        let document = json(report).await;
        assert_eq!(document["patient_id"], "P-42");
        assert_eq!(document["results"].as_array().unwrap().len(), 3);
        assert_eq!(document["technician"], "AI System v1.0");

        let reset = json(app.clone().oneshot(request("DELETE", "/api/analysis")).await.unwrap()).await;
        assert_eq!(reset["state"], "idle");
        assert!(reset["staged"].as_array().unwrap().is_empty());
        assert_eq!(state.previews.live_count(), 0);

        let results = app.oneshot(request("GET", "/api/results")).await.unwrap();
        assert_eq!(results.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn report_defaults_to_docx_and_configured_patient() {
        let (app, _) = test_app();
        app.clone()
            .oneshot(upload_request(&[("a.jpg", "image/jpeg", jpeg_bytes())]))
            .await
            .unwrap();
        app.clone().oneshot(request("POST", "/api/analysis")).await.unwrap();

        let report = app.oneshot(request("GET", "/api/report")).await.unwrap();
        assert_eq!(report.status(), StatusCode::OK);
        let disposition = report.headers().get("Content-Disposition").unwrap().to_str().unwrap();
        assert!(disposition.ends_with(".docx\""));
        let document = json(report).await;
        assert_eq!(document["patient_id"], "P2025-001234");
    }

    #[tokio::test]
    async fn unsupported_report_format_is_rejected() {
        let (app, _) = test_app();
        let response = app
            .oneshot(request("GET", "/api/report?format=pdf"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn detector_failure_maps_to_bad_gateway_and_keeps_images() {
        let (app, _) = app_with(
            MockDetectionClient::new(Duration::ZERO)
                .failing(DetectionError::Transport("connection refused".into())),
        );
        app.clone()
            .oneshot(upload_request(&[("a.jpg", "image/jpeg", jpeg_bytes())]))
            .await
            .unwrap();

        let response = app.clone().oneshot(request("POST", "/api/analysis")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "ANALYSIS_FAILED");

        let status = json(app.oneshot(request("GET", "/api/analysis")).await.unwrap()).await;
        assert_eq!(status["state"], "idle");
        assert_eq!(status["staged"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (app, _) = test_app();
        let response = app.oneshot(request("GET", "/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
