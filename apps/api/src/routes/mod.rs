pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Uploads are resumes; 10 MB leaves room for multi-file batches.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route("/api/v1/analyze/stream", post(handlers::handle_analyze_stream))
        .route("/api/v1/analyze/batch", post(handlers::handle_analyze_batch))
        // Job descriptions
        .route(
            "/api/v1/jobs",
            get(handlers::handle_list_jobs).post(handlers::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(handlers::handle_get_job)
                .put(handlers::handle_update_job)
                .delete(handlers::handle_delete_job),
        )
        // Evaluation history
        .route("/api/v1/evaluations", get(handlers::handle_list_evaluations))
        .route(
            "/api/v1/evaluations/:id",
            get(handlers::handle_get_evaluation),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analysis::pipeline::Analyzer;
    use crate::analysis::testing::{FixedEmbedder, StubLlm, Utf8Extractor};
    use crate::config::Config;
    use crate::store::{EvaluationStore, MemoryStore};

    const BOUNDARY: &str = "X-RESUME-BOUNDARY";

    fn test_state() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(FixedEmbedder::new(vec![
            ("python", vec![1.0, 0.0]),
            ("sql", vec![0.0, 1.0]),
        ]));
        let analyzer = Analyzer::new(
            Arc::new(Utf8Extractor),
            Arc::new(StubLlm::new("Mention your SQL projects.")),
            embedder,
        );
        let config = Config {
            google_api_key: "test-key".to_string(),
            llm_model: "test-model".to_string(),
            embedding_model: "test-embedder".to_string(),
            database_url: None,
            port: 0,
            rust_log: "info".to_string(),
            max_concurrent_analyses: 2,
            embedding_penalty_exponent: 2,
            keyword_match_threshold: 85.0,
        };
        let state = AppState {
            config,
            analyzer: Arc::new(analyzer),
            evaluations: store.clone(),
            jobs: store.clone(),
        };
        (state, store)
    }

    /// Builds a multipart body from (field, filename, content type, data) parts.
    fn multipart(parts: &[(&str, Option<&str>, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (name, filename, content_type, data) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n"
                )),
            }
            if let Some(ct) = content_type {
                body.push_str(&format!("Content-Type: {ct}\r\n"));
            }
            body.push_str("\r\n");
            body.push_str(data);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn multipart_request(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_returns_response_and_records_evaluation() {
        let (state, store) = test_state();
        let body = multipart(&[
            ("resume", Some("cv.txt"), Some("text/plain"), "Python and SQL"),
            ("job_description", None, None, "python sql"),
        ]);

        let response = build_router(state)
            .oneshot(multipart_request("/api/v1/analyze", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["relevance_score"], 100);
        assert_eq!(json["verdict"], "High");
        assert_eq!(json["missing_keywords"], json!([]));
        assert_eq!(json["suggestions"], "Mention your SQL projects.");

        let mut stored = Vec::new();
        for _ in 0..50 {
            stored = store.list_all().await.unwrap();
            if !stored.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].filename, "cv.txt");
        assert_eq!(stored[0].relevance_score, Some(100));
    }

    #[tokio::test]
    async fn test_analyze_rejects_unsupported_format() {
        let (state, _) = test_state();
        let body = multipart(&[
            ("resume", Some("photo.png"), Some("image/png"), "not a resume"),
            ("job_description", None, None, "python"),
        ]);

        let response = build_router(state)
            .oneshot(multipart_request("/api/v1/analyze", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_analyze_requires_job_description() {
        let (state, _) = test_state();
        let body = multipart(&[("resume", Some("cv.txt"), Some("text/plain"), "Python")]);

        let response = build_router(state)
            .oneshot(multipart_request("/api/v1/analyze", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_with_saved_job() {
        let (state, _) = test_state();
        let app = build_router(state);

        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/jobs",
                json!({"company_name": "Acme", "job_role": "Data Engineer", "description": "python sql docker"}),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let job_id = body_json(created).await["id"].as_str().unwrap().to_string();

        let body = multipart(&[
            ("resume", Some("cv.txt"), Some("text/plain"), "Python and SQL"),
            ("job_id", None, None, job_id.as_str()),
        ]);
        let response = app
            .oneshot(multipart_request("/api/v1/analyze", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["missing_keywords"], json!(["docker"]));
    }

    #[tokio::test]
    async fn test_stream_emits_progress_then_result() {
        let (state, _) = test_state();
        let body = multipart(&[
            ("resume", Some("cv.txt"), Some("text/plain"), "Python and SQL"),
            ("job_description", None, None, "python sql"),
        ]);

        let response = build_router(state)
            .oneshot(multipart_request("/api/v1/analyze/stream", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.matches("event: progress").count(), 4);
        assert_eq!(text.matches("event: result").count(), 1);
        assert!(text.contains("Aggregation Complete"));
        assert!(!text.contains("event: error"));
    }

    #[tokio::test]
    async fn test_batch_reports_each_file() {
        let (state, _) = test_state();
        let body = multipart(&[
            ("resume", Some("good.txt"), Some("text/plain"), "Python"),
            ("resume", Some("bad.png"), Some("image/png"), "binary"),
            ("job_description", None, None, "python"),
        ]);

        let response = build_router(state)
            .oneshot(multipart_request("/api/v1/analyze/batch", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["filename"], "good.txt");
        assert_eq!(results[0]["status"], "Complete");
        assert_eq!(results[1]["status"], "Error");
    }

    #[tokio::test]
    async fn test_job_crud_round() {
        let (state, _) = test_state();
        let app = build_router(state);

        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/jobs",
                json!({"company_name": "Acme", "job_role": "SRE", "description": "linux"}),
            ))
            .await
            .unwrap();
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let updated = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/jobs/{id}"),
                json!({"company_name": "Acme", "job_role": "Senior SRE", "description": "linux"}),
            ))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::OK);
        assert_eq!(body_json(updated).await["job_role"], "Senior SRE");

        let deleted = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/jobs/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = app
            .oneshot(
                Request::get(format!("/api/v1/jobs/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_job_rejects_blank_fields() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(json_request(
                "POST",
                "/api/v1/jobs",
                json!({"company_name": " ", "job_role": "SRE", "description": "linux"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
