pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers::{self as candidates, MAX_UPLOAD_BYTES};
use crate::errors::AppError;
use crate::matching::handlers as matching;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching API
        .route(
            "/api/v1/requirements",
            post(matching::handle_extract_requirements),
        )
        .route("/api/v1/match", post(matching::handle_match))
        // Candidates API
        .route(
            "/api/v1/candidates",
            get(candidates::handle_list_candidates).post(candidates::handle_save_candidate),
        )
        .route(
            "/api/v1/candidates/upload",
            post(candidates::handle_upload_resumes).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::matching::{HeuristicScorer, MatchConfig, MatchEngine};
    use crate::store::InMemoryStore;

    const FRONTEND_JD: &str =
        "需要3年以上经验的React前端工程师，熟悉JavaScript和TypeScript，本科及以上学历";

    fn app() -> Router {
        let engine = MatchEngine::new(MatchConfig::default());
        let state = AppState {
            scorer: Arc::new(HeuristicScorer::new(engine.clone())),
            engine,
            store: Arc::new(InMemoryStore::with_sample_candidates()),
            llm: None,
            config: Config::from_vars(|_| None).unwrap(),
        };
        build_router(state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(parts: &[(&str, Option<(&str, &str)>, &str)]) -> Request<Body> {
        let boundary = "matcher-test-boundary";
        let mut body = String::new();
        for (name, file, content) in parts {
            body.push_str(&format!("--{boundary}\r\n"));
            match file {
                Some((filename, content_type)) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/candidates/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "matcher");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let request = Request::builder()
            .uri("/api/v1/nowhere")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_match_blank_job_description_is_400() {
        let (status, body) = send(
            app(),
            json_request(Method::POST, "/api/v1/match", json!({"jobDescription": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "job description required");
    }

    #[tokio::test]
    async fn test_match_empty_candidate_list_is_400() {
        let (status, body) = send(
            app(),
            json_request(
                Method::POST,
                "/api/v1/match",
                json!({"jobDescription": FRONTEND_JD, "candidates": []}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "no candidate resumes available to match");
    }

    #[tokio::test]
    async fn test_match_inline_candidates_ranked() {
        let (status, body) = send(
            app(),
            json_request(
                Method::POST,
                "/api/v1/match",
                json!({
                    "jobDescription": FRONTEND_JD,
                    "resumes": [
                        {"id": "b", "name": "李四", "skills": "Excel", "experience": "1年", "education": "大专"},
                        {"id": "a", "name": "张三", "skills": ["React", "JavaScript", "TypeScript"], "experience": "5年", "education": "本科", "phone": "123"}
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let matches = body["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["name"], "张三");
        assert_eq!(matches[0]["phone"], "123");
        assert!(matches[0]["matchScore"].as_u64() >= matches[1]["matchScore"].as_u64());
        assert_eq!(matches[0]["matchDetails"]["scorer"], "heuristic");
        assert_eq!(body["jobRequirements"]["jobTitle"], "前端开发工程师");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_match_large_inline_pool_keeps_tie_order() {
        let resumes: Vec<Value> = (0..200)
            .map(|i| json!({"id": format!("c{i}"), "name": format!("候选人{i}"), "skills": "React, Vue", "experience": "３年"}))
            .collect();
        let (status, body) = send(
            app(),
            json_request(
                Method::POST,
                "/api/v1/match",
                json!({"jobDescription": FRONTEND_JD, "resumes": resumes}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        let expected: Vec<String> = (0..200).map(|i| format!("c{i}")).collect();
        assert_eq!(ids, expected);
        assert_eq!(body["matches"][0]["matchDetails"]["experienceScore"], 100);
    }

    #[tokio::test]
    async fn test_match_without_candidates_uses_store() {
        let (status, body) = send(
            app(),
            json_request(
                Method::POST,
                "/api/v1/match",
                json!({"jobDescription": FRONTEND_JD, "strategy": "skills_only"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"].as_array().unwrap().len(), 2);
        assert_eq!(body["matches"][0]["id"], "sample-1");
    }

    #[tokio::test]
    async fn test_match_unknown_strategy_is_400() {
        let (status, _) = send(
            app(),
            json_request(
                Method::POST,
                "/api/v1/match",
                json!({"jobDescription": FRONTEND_JD, "strategy": "vibes"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_requirements_preview() {
        let (status, body) = send(
            app(),
            json_request(
                Method::POST,
                "/api/v1/requirements",
                json!({"jobDescription": FRONTEND_JD}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["experienceRequirement"], "3年以上");
        assert_eq!(body["educationRequirement"], "本科及以上");
    }

    #[tokio::test]
    async fn test_list_candidates_from_store() {
        let request = Request::builder()
            .uri("/api/v1/candidates")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "memory");
        assert_eq!(body["candidates"][1]["skills"][2], "MySQL");
    }

    #[tokio::test]
    async fn test_save_candidate() {
        let (status, body) = send(
            app(),
            json_request(
                Method::POST,
                "/api/v1/candidates",
                json!({"name": "王五", "skills": "Go, Docker"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_str().unwrap().starts_with("mem-"));

        let (status, _) = send(
            app(),
            json_request(Method::POST, "/api/v1/candidates", json!(["not", "an", "object"])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_text_resume() {
        let request = multipart_request(&[
            ("name", None, "张三"),
            (
                "file",
                Some(("resume.txt", "text/plain")),
                "求职意向：前端工程师\n5年工作经验，熟悉React和TypeScript\n本科",
            ),
        ]);
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        let imported = &body["imported"][0];
        assert_eq!(imported["filename"], "resume.txt");
        assert_eq!(imported["candidate"]["name"], "张三");
        assert_eq!(imported["candidate"]["experience"], "5年");
        assert_eq!(imported["candidate"]["source"], "resume.txt");
        assert_eq!(imported["candidate"]["id"], imported["id"]);
        assert_eq!(body["errors"], json!([]));
    }

    #[tokio::test]
    async fn test_upload_unsupported_type_is_415() {
        let request = multipart_request(&[("file", Some(("photo.png", "image/png")), "not really")]);
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_batch_upload_reports_per_file_errors() {
        let request = multipart_request(&[
            ("files", Some(("li.txt", "text/plain")), "Java developer, 硕士"),
            ("files", Some(("photo.png", "image/png")), "binary"),
        ]);
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["imported"][0]["candidate"]["name"], "li");
        assert_eq!(body["errors"][0]["filename"], "photo.png");
    }

    #[tokio::test]
    async fn test_upload_without_file_is_400() {
        let request = multipart_request(&[("name", None, "张三")]);
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
