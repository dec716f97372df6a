//! HTTP API over the orchestrator.

use crate::campaign::{CampaignRequest, Orchestrator};
use crate::compose::Composer;
use crate::Error;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use outreach_contacts::clean_domain;
use outreach_mail::OutgoingEmail;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const TEST_SUBJECT: &str = "Test Email from Cold Outreach System";
const TEST_BODY: &str = "This is a test email to verify email configuration is working.";
const DEFAULT_COMPANY: &str = "Example Company";
const DEFAULT_JOB: &str = "We are looking for talented software engineers to join our team.";

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    network_configured: bool,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, network_configured: bool) -> Self {
        Self {
            orchestrator,
            network_configured,
        }
    }
}

/// Error body `{"error": message}` with a status code.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => {
                error!("Request failed: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidRequest(m) => ApiError::BadRequest(m),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

/// An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body[..]
    };
    serde_json::from_slice(raw).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/launch", post(launch))
        .route("/api/campaigns", get(list_campaigns))
        .route("/api/campaigns/{id}", get(get_campaign))
        .route("/api/test-email-connection", post(test_email_connection))
        .route("/api/test-email", post(test_email))
        .route("/api/test-scraper", post(test_scraper))
        .route("/api/test-email-template", post(test_email_template))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let orch = &state.orchestrator;
    Json(json!({
        "status": "healthy",
        "message": "Cold Outreach API is running",
        "services": {
            "ai": orch.classifier().has_llm(),
            "email": orch.mailer().is_configured(),
            "social": state.network_configured,
        }
    }))
}

async fn launch(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let request: CampaignRequest = parse_body(&body)?;
    let id = state.orchestrator.launch(request)?;
    Ok(Json(json!({
        "success": true,
        "message": "Campaign launched successfully",
        "campaign_id": id,
    })))
}

async fn list_campaigns(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "campaigns": state.orchestrator.store().list(),
    }))
}

async fn get_campaign(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let campaign = state
        .orchestrator
        .store()
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;
    Ok(Json(json!({ "success": true, "campaign": campaign })))
}

async fn test_email_connection(State(state): State<AppState>) -> Json<Value> {
    let checks = state.orchestrator.mailer().test_connections().await;
    Json(json!({ "success": true, "connection_tests": checks }))
}

#[derive(Deserialize)]
struct TestEmailBody {
    #[serde(default)]
    email: Option<String>,
}

async fn test_email(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let body: TestEmailBody = parse_body(&body)?;
    let to = body
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email address required".into()))?;

    let sent = match state
        .orchestrator
        .mailer()
        .send(&OutgoingEmail::new(to.trim(), TEST_SUBJECT, TEST_BODY))
        .await
    {
        Ok(delivery) => {
            info!("Test email sent to {} via {}", to, delivery.provider);
            true
        }
        Err(e) => {
            error!("Test email to {} failed: {}", to, e);
            false
        }
    };

    Ok(Json(json!({
        "success": sent,
        "message": if sent { "Test email sent" } else { "Test email failed" },
    })))
}

#[derive(Deserialize)]
struct TestScraperBody {
    #[serde(default)]
    domain: Option<String>,
}

async fn test_scraper(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let body: TestScraperBody = parse_body(&body)?;
    let domain = body
        .domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Domain required".into()))?;
    let clean = clean_domain(&domain).ok_or_else(|| ApiError::BadRequest("Invalid domain".into()))?;

    let found = state.orchestrator.discover(&clean).await?;
    let emails: Vec<&str> = found.people.iter().take(5).map(|p| p.email.as_str()).collect();
    Ok(Json(json!({
        "success": true,
        "domain": domain,
        "emails_found": found.people.len(),
        "emails": emails,
    })))
}

#[derive(Deserialize)]
struct TemplateBody {
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    job_description: Option<String>,
}

async fn test_email_template(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let body: TemplateBody = parse_body(&body)?;
    let company = body.company_name.unwrap_or_else(|| DEFAULT_COMPANY.to_string());
    let job = body.job_description.unwrap_or_else(|| DEFAULT_JOB.to_string());

    let orch = &state.orchestrator;
    let resume = orch.load_resume();
    let paragraph = orch.composer().personalized_paragraph(&resume, &job).await;

    Ok(Json(json!({
        "success": true,
        "subject": Composer::subject(&company),
        "body": paragraph.body,
        "template_info": {
            "structure": "6-8 sentences with hook, intro, knowledge, value, portfolio, ask",
            "tone": "casual, confident, not salesy",
            "source": paragraph.source,
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{ContactSource, SocialOutreach};
    use crate::classify::Classifier;
    use crate::compose::Persona;
    use crate::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use outreach_browser::PersonOutcome;
    use outreach_contacts::Person;
    use outreach_mail::Mailer;
    use tower::ServiceExt;

    struct StaticSource;

    #[async_trait]
    impl ContactSource for StaticSource {
        async fn raw_emails(&self, _domain: &str) -> Result<Vec<String>> {
            Ok(vec![
                "jane.doe@acme.io".into(),
                "support@acme.io".into(),
                "bob.roe@acme.io".into(),
            ])
        }
    }

    struct NoSocial;

    #[async_trait]
    impl SocialOutreach for NoSocial {
        async fn reach(&self, _: &[Person], _: &str, _: usize) -> Result<Vec<PersonOutcome>> {
            Ok(Vec::new())
        }
    }

    fn app() -> Router {
        let orch = Orchestrator::new(
            Arc::new(StaticSource),
            Arc::new(NoSocial),
            Classifier::rules_only(),
            Composer::new(Persona::builtin().unwrap(), None),
            Mailer::new(Vec::new()),
        )
        .resume_path("/nonexistent/resume.txt");
        router(AppState::new(Arc::new(orch), false))
    }

    async fn call(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_services() {
        let (status, body) = call(app(), "GET", "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["ai"], false);
        assert_eq!(body["services"]["email"], false);
        assert_eq!(body["services"]["social"], false);
    }

    #[tokio::test]
    async fn launch_validation() {
        let (status, body) = call(app(), "POST", "/api/launch", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Domain is required");

        let (status, body) = call(app(), "POST", "/api/launch", r#"{"domain": null}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Domain is required");

        let (status, body) = call(
            app(),
            "POST",
            "/api/launch",
            r#"{"domain": "acme.io", "email_enabled": false, "linkedin_enabled": false}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "At least one outreach method must be enabled");

        let (status, body) = call(app(), "POST", "/api/launch", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn launch_then_read_back() {
        let app = app();
        let (status, body) = call(app.clone(), "POST", "/api/launch", r#"{"domain": "acme.io"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["campaign_id"], 1);

        let (status, body) = call(app.clone(), "GET", "/api/campaigns/1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["campaign"]["domain"], "acme.io");

        let (_, body) = call(app.clone(), "GET", "/api/campaigns", "").await;
        assert_eq!(body["campaigns"].as_array().unwrap().len(), 1);

        let (status, body) = call(app, "GET", "/api/campaigns/42", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Campaign not found");
    }

    #[tokio::test]
    async fn test_email_requires_address() {
        let (status, body) = call(app(), "POST", "/api/test-email", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email address required");

        // no providers configured
        let (status, body) =
            call(app(), "POST", "/api/test-email", r#"{"email": "me@example.com"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Test email failed");
    }

    #[tokio::test]
    async fn connection_tests_empty_without_providers() {
        let (_, body) = call(app(), "POST", "/api/test-email-connection", "").await;
        assert_eq!(body["success"], true);
        assert!(body["connection_tests"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scraper_returns_people() {
        let (status, body) = call(app(), "POST", "/api/test-scraper", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Domain required");

        let (status, body) =
            call(app(), "POST", "/api/test-scraper", r#"{"domain": "https://acme.io"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"], "https://acme.io");
        assert_eq!(body["emails_found"], 2);
        assert_eq!(body["emails"], json!(["jane.doe@acme.io", "bob.roe@acme.io"]));
    }

    #[tokio::test]
    async fn template_uses_defaults() {
        let (status, body) = call(app(), "POST", "/api/test-email-template", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject"], "Quick question about opportunities at Example Company");
        assert_eq!(body["template_info"]["source"], "canned");
        assert!(body["body"].as_str().unwrap().contains("Alex Rivera"));
    }
}
