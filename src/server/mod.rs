use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::errors::{GenerationError, ValidationError};
use crate::orchestrator::Orchestrator;
use crate::wire::{IdeaBatch, IdeaRequest, PromptCriteria, PromptResponse};

pub type SharedOrchestrator = Arc<Orchestrator>;

/// A failed generation plus the user-facing summary for its route.
#[derive(Debug)]
pub struct ApiError {
    failure: &'static str,
    source: GenerationError,
}

impl ApiError {
    fn ideas(source: GenerationError) -> Self {
        Self { failure: "Failed to generate project ideas", source }
    }

    fn prompt(source: GenerationError) -> Self {
        Self { failure: "Failed to generate prompt", source }
    }
}

/// Body rejections answer with the same JSON error shape as everything else.
fn rejected(r: JsonRejection) -> GenerationError {
    tracing::debug!(status = %r.status(), "request body rejected");
    ValidationError::MalformedRequest(r.body_text()).into()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.source {
            GenerationError::Validation(v) => (StatusCode::BAD_REQUEST, v.to_string()),
            GenerationError::ProviderUnavailable(msg) => {
                tracing::error!(error = %msg, "provider unavailable");
                (StatusCode::BAD_GATEWAY, self.failure.to_string())
            }
            GenerationError::MalformedResponse(msg) => {
                tracing::error!(error = %msg, "malformed provider response");
                (StatusCode::INTERNAL_SERVER_ERROR, self.failure.to_string())
            }
        };

        let body = json!({
            "error": message,
            "code": self.source.code(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn generate_ideas(
    State(orch): State<SharedOrchestrator>,
    body: Result<Json<IdeaRequest>, JsonRejection>,
) -> Result<Json<IdeaBatch>, ApiError> {
    let Json(body) = body.map_err(|r| ApiError::ideas(rejected(r)))?;
    let (criteria, history) = body.into_parts();
    let ideas = orch
        .run_idea_generation(&criteria, &history)
        .await
        .map_err(ApiError::ideas)?;
    Ok(Json(IdeaBatch { ideas }))
}

async fn generate_prompt(
    State(orch): State<SharedOrchestrator>,
    body: Result<Json<PromptCriteria>, JsonRejection>,
) -> Result<Json<PromptResponse>, ApiError> {
    let Json(criteria) = body.map_err(|r| ApiError::prompt(rejected(r)))?;
    let prompt = orch
        .run_prompt_generation(&criteria)
        .await
        .map_err(ApiError::prompt)?;
    Ok(Json(PromptResponse { prompt: prompt.into_string() }))
}

pub fn router(orch: SharedOrchestrator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate_ideas))
        .route("/api/generate-prompt", post(generate_prompt))
        .layer(TraceLayer::new_for_http())
        .with_state(orch)
}

pub async fn serve(orch: SharedOrchestrator, bind: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    tracing::info!(provider = orch.provider_name(), "Starting server on {addr}");

    axum::serve(listener, router(orch))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Budgets;
    use crate::provider::scripted::ScriptedProvider;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    const IDEA: &str = r#"{"title":"Ledger Lens","description":"Visualise spending.","techStack":["Next.js","Prisma","Postgres","Chart.js"],"learningOutcomes":["Charts","ORMs"],"difficulty":"Beginner","estimatedTime":"Weekend"}"#;

    fn app(provider: &Arc<ScriptedProvider>) -> Router {
        router(Arc::new(Orchestrator::new(provider.clone(), Budgets::default())))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn idea_body() -> Value {
        json!({
            "interests": "finance",
            "skillLevel": "Beginner",
            "projectType": "Web App",
            "timeCommitment": "Weekend",
            "previousTitles": ["Budget Tracker Pro", "Coin Counter"],
            "seed": 12345
        })
    }

    #[tokio::test]
    async fn generate_returns_ideas_and_forwards_history() {
        let provider = Arc::new(ScriptedProvider::replying(format!(
            "Here you go:\n```json\n{{\"ideas\":[{IDEA}]}}\n```"
        )));
        let (status, body) = post_json(app(&provider), "/api/generate", idea_body()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ideas"][0]["title"], "Ledger Lens");
        assert_eq!(body["ideas"][0]["techStack"][0], "Next.js");

        let sent = &provider.requests()[0].instruction.user;
        assert!(sent.contains("1. Budget Tracker Pro"));
        assert!(sent.contains("2. Coin Counter"));
        assert!(sent.contains("Generation ID: 12345"));
    }

    #[tokio::test]
    async fn generate_maps_provider_failure_to_bad_gateway() {
        let provider = Arc::new(ScriptedProvider::failing("timeout"));
        let (status, body) = post_json(app(&provider), "/api/generate", idea_body()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "PROVIDER_UNAVAILABLE");
        assert_eq!(body["error"], "Failed to generate project ideas");
    }

    #[tokio::test]
    async fn generate_maps_bad_payload_to_server_error() {
        let provider = Arc::new(ScriptedProvider::replying("{ \"ideas\": [ { \"title\": "));
        let (status, body) = post_json(app(&provider), "/api/generate", idea_body()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "MALFORMED_RESPONSE");
    }

    #[tokio::test]
    async fn generate_prompt_returns_sanitized_text() {
        let provider = Arc::new(ScriptedProvider::replying(
            "## PROJECT OVERVIEW:\nA **fast** invoice API.\n\n\n\nTESTING REQUIREMENTS:\nUse `pytest`.",
        ));
        let (status, body) = post_json(
            app(&provider),
            "/api/generate-prompt",
            json!({
                "projectDescription": "Invoice API",
                "language": "python",
                "framework": "flask",
                "complexity": "intermediate",
                "codeStyle": "mixed",
                "features": "",
                "constraints": "no ORM"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["prompt"],
            "PROJECT OVERVIEW:\nA fast invoice API.\n\nTESTING REQUIREMENTS:\nUse pytest."
        );
        let sent = &provider.requests()[0].instruction.user;
        assert!(sent.contains("- Constraints & Requirements: no ORM"));
        assert!(!sent.contains("Required Features"));
    }

    #[tokio::test]
    async fn generate_prompt_rejects_empty_description() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let (status, body) = post_json(
            app(&provider),
            "/api/generate-prompt",
            json!({
                "projectDescription": "",
                "language": "python",
                "framework": "none",
                "complexity": "beginner",
                "codeStyle": "functional"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn prompt_body_missing_description_is_json_validation_error() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let (status, body) = post_json(
            app(&provider),
            "/api/generate-prompt",
            json!({
                "language": "python",
                "framework": "none",
                "complexity": "beginner",
                "codeStyle": "functional"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("projectDescription"));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn idea_body_with_unknown_skill_level_is_json_validation_error() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let mut req = idea_body();
        req["skillLevel"] = json!("Novice");
        let (status, body) = post_json(app(&provider), "/api/generate", req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_json_validation_error() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/generate")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let resp = app(&provider).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let provider = Arc::new(ScriptedProvider::replying(""));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app(&provider).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
