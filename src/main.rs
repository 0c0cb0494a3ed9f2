use axum::{
    Form, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use rxform_core::{
    ConfigurationError, CoreConfig, DrugOrderElement, EnglishMessages, FormContext,
    FormDefinition, FormSession, InMemoryCatalog, MessageSource, Mode, Submission,
    widget::escape_html,
};
use rxform_types::NonEmptyText;

const ACTOR_HEADER: &str = "x-actor";

/// Application state shared across handlers.
///
/// Everything in here is loaded once at startup and read-only afterwards; each request builds
/// its own form context and element.
#[derive(Clone)]
struct AppState {
    catalog: Arc<InMemoryCatalog>,
    form: Arc<FormDefinition>,
    messages: Arc<dyn MessageSource>,
}

impl AppState {
    fn element(&self, mode: Mode) -> Result<(FormContext, DrugOrderElement), ConfigurationError> {
        let mut context = FormContext::new(mode, Arc::clone(&self.messages));
        let element =
            DrugOrderElement::new(&mut context, &self.form.parameters, self.catalog.as_ref())?;
        Ok((context, element))
    }

    fn page(&self, body: &str) -> String {
        format!(
            r#"<form method="post"><h2>{}</h2>{body}<input type="submit" value="Save"/></form>"#,
            escape_html(self.form.name.as_str())
        )
    }
}

#[derive(Serialize)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Deserialize)]
struct SubmitQuery {
    patient: Uuid,
}

/// Main entry point for the rxform HTTP host.
///
/// # Environment Variables
/// - `RXFORM_CATALOG`: catalog YAML with the selectable drugs and concepts (required)
/// - `RXFORM_FORM`: form definition YAML with the element's parameters (required)
/// - `RXFORM_ADDR`: listen address (default: "0.0.0.0:3000")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rxform=info".parse()?)
                .add_directive("rxform_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::from_env_values(
        std::env::var("RXFORM_CATALOG").ok(),
        std::env::var("RXFORM_FORM").ok(),
        std::env::var("RXFORM_ADDR").ok(),
    )?;

    let catalog = InMemoryCatalog::load(config.catalog_path())?;
    let form = FormDefinition::load(config.form_path())?;
    let state = AppState {
        catalog: Arc::new(catalog),
        form: Arc::new(form),
        messages: Arc::new(EnglishMessages),
    };

    // Fail at startup rather than on the first request if the parameters are wrong.
    state.element(Mode::Enter)?;

    tracing::info!("++ Starting rxform on {}", config.listen_addr());

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/drug-order", get(render_form).post(submit_form))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "rxform is alive".into(),
    })
}

/// Renders the drug order element for a new encounter.
async fn render_form(State(state): State<AppState>) -> Response {
    match state.element(Mode::Enter) {
        Ok((context, element)) => Html(state.page(&element.generate_html(&context))).into_response(),
        Err(e) => {
            tracing::error!("Configure element error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

/// Validates and applies a posted drug order form.
///
/// Returns `422` with the re-rendered form when validation fails and `201` with the submission
/// outcome otherwise.
async fn submit_form(
    State(state): State<AppState>,
    Query(query): Query<SubmitQuery>,
    headers: HeaderMap,
    Form(values): Form<HashMap<String, String>>,
) -> Response {
    let Some(actor) = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(NonEmptyText::optional)
    else {
        return (StatusCode::BAD_REQUEST, "missing x-actor header").into_response();
    };

    let (mut context, mut element) = match state.element(Mode::Enter) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!("Configure element error: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    let submission: Submission = values.into_iter().collect();
    let errors = element.validate_submission(&context, &submission);
    if !errors.is_empty() {
        context.record_errors(&errors);
        let html = state.page(&element.generate_html(&context));
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response();
    }

    let mut session = FormSession::new(context, query.patient, actor, state.form.name.clone());
    match element.handle_submission(&mut session, &submission) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!("Drug order submission error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
