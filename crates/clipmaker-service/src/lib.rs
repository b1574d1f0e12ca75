#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod forms;
pub mod server;
pub mod views;

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use clipmaker_adapters::{HttpPlatformClient, StaticPlatform};
use clipmaker_core::{
    run_submission, AccessChecker, ClipSubmitter, Directory, ExperienceGate, FormState,
    GateOutcome, IdentityOutcome, IdentityVerifier, RequestHeaders, SimulatedSubmitter, Viewer,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use config::{AppConfig, PlatformBackend};
pub use error::{ApiError, ServiceError};
use forms::{ClipMakerForm, FormAction};
use views::Notice;

#[derive(Clone)]
pub struct ServiceState {
    pub config: Arc<AppConfig>,
    pub gate: ExperienceGate,
    pub submitter: Arc<dyn ClipSubmitter>,
}

impl ServiceState {
    /// Build the state for the configured platform backend.
    pub fn bootstrap(config: AppConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let submitter = Arc::new(SimulatedSubmitter::new(config.form.submit_delay()));

        let state = match config.platform.backend {
            PlatformBackend::Http => {
                let client = HttpPlatformClient::new(config.platform.http_client_config())?;
                Self::with_platform(config, Arc::new(client), submitter)
            }
            PlatformBackend::Static => {
                let platform = StaticPlatform::new(config.fixtures.clone());
                info!(users = platform.user_count(), "using static platform fixtures");
                Self::with_platform(config, Arc::new(platform), submitter)
            }
        };
        Ok(state)
    }

    /// Build the state around an already constructed platform client.
    pub fn with_platform<P>(
        config: AppConfig,
        platform: Arc<P>,
        submitter: Arc<dyn ClipSubmitter>,
    ) -> Self
    where
        P: IdentityVerifier + AccessChecker + Directory + 'static,
    {
        let gate = ExperienceGate::from_platform(
            config.platform.token_header.clone(),
            platform,
            config.links.clone(),
        );
        Self {
            config: Arc::new(config),
            gate,
            submitter,
        }
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route(
            "/experiences/:experience_id",
            get(show_experience).post(submit_experience),
        )
        .route("/example", get(example))
        .route("/v1/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Copy the request headers the gate may look at. Non-UTF-8 values are skipped.
pub fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str(), value.to_string()))
        })
        .collect()
}

/// Split a gate outcome into the viewer, or the page that stops the request.
fn admitted(outcome: GateOutcome) -> Result<Box<Viewer>, Response> {
    match outcome {
        GateOutcome::Granted(viewer) => Ok(viewer),
        GateOutcome::AuthenticationRequired { .. } => Err((
            StatusCode::UNAUTHORIZED,
            Html(views::authentication_required()),
        )
            .into_response()),
        GateOutcome::AccessDenied { checkout_url, .. } => Err((
            StatusCode::FORBIDDEN,
            Html(views::access_denied(&checkout_url)),
        )
            .into_response()),
    }
}

async fn landing(State(state): State<ServiceState>) -> Html<String> {
    let platform = &state.config.platform;
    let links = &state.config.links;
    let install_url = links.install_url(&platform.app_id);
    let dashboard_url = (!platform.company_id.is_empty())
        .then(|| links.dashboard_url(&platform.company_id));
    Html(views::landing(&install_url, dashboard_url.as_deref()))
}

async fn show_experience(
    Path(experience_id): Path<String>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Response {
    let outcome = state
        .gate
        .admit(&request_headers(&headers), &experience_id)
        .await;
    match admitted(outcome) {
        Ok(viewer) => {
            let form = FormState::new(state.config.form.url_policy);
            Html(views::clip_maker(&viewer, &form, None)).into_response()
        }
        Err(page) => page,
    }
}

async fn submit_experience(
    Path(experience_id): Path<String>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
    form: Result<Form<ClipMakerForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let outcome = state
        .gate
        .admit(&request_headers(&headers), &experience_id)
        .await;
    let viewer = match admitted(outcome) {
        Ok(viewer) => viewer,
        Err(page) => return Ok(page),
    };

    let Form(posted) = form.map_err(|err| ApiError::bad_request(err.body_text()))?;
    let (form_state, action) = posted.replay(state.config.form.url_policy)?;
    debug!(experience_id = %experience_id, ?action, "replayed clip form");

    if action != FormAction::Submit {
        return Ok(Html(views::clip_maker(&viewer, &form_state, None)).into_response());
    }

    let form_state = Mutex::new(form_state);
    let result = run_submission(&form_state, state.submitter.as_ref()).await;
    let form_state = form_state.into_inner();

    let response = match result {
        Ok(receipt) => {
            info!(
                experience_id = %experience_id,
                user_id = %viewer.session.user_id,
                receipt_id = %receipt.id,
                submitter = state.submitter.name(),
                "clip request submitted"
            );
            let notice = Notice::Success(receipt.message);
            Html(views::clip_maker(&viewer, &form_state, Some(&notice))).into_response()
        }
        Err(err) => {
            debug!(experience_id = %experience_id, error = %err, "clip request rejected");
            let notice = Notice::Rejected(format!("Cannot create clips: {}", err));
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(views::clip_maker(&viewer, &form_state, Some(&notice))),
            )
                .into_response()
        }
    };
    Ok(response)
}

async fn example(State(state): State<ServiceState>, headers: HeaderMap) -> Response {
    match state.gate.authenticate(&request_headers(&headers)).await {
        IdentityOutcome::Authenticated { user, .. } => {
            Html(views::example_authenticated(&user)).into_response()
        }
        IdentityOutcome::AuthenticationRequired { .. } => (
            StatusCode::UNAUTHORIZED,
            Html(views::example_unauthenticated(state.gate.token_header())),
        )
            .into_response(),
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    platform_backend: &'static str,
    url_policy: &'static str,
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "clipmaker-service",
        platform_backend: state.gate.identity_backend(),
        url_policy: state.config.form.url_policy.as_str(),
    })
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for '{}'", uri.path()))
}
