//! Request handlers for the prediction service

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use tracing::{info, warn};

use super::form::{render_page, FormMessage, FormValues};
use super::AppState;
use crate::pipeline::{ChurnModel, CustomerRecord, ModelError, Prediction};

/// JSON error body for the API route
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// GET / - the empty form
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let values = FormValues::from(&CustomerRecord::default());
    Html(render_page(&values, None, state.pipeline.algorithm_name()))
}

/// POST /predict - validate the form, predict, re-render with one message
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    let values = FormValues::from_fields(fields);
    let algorithm = state.pipeline.algorithm_name();

    let record = match values.to_record() {
        Ok(record) => record,
        Err(errors) => {
            warn!(errors = ?errors, "Rejected form submission");
            let message = FormMessage::Invalid(errors);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_page(&values, Some(&message), algorithm)),
            );
        }
    };

    match state.pipeline.predict_record(&record) {
        Ok(prediction) => {
            info!(label = %prediction.label, score = prediction.score, "Form prediction");
            let message = FormMessage::Predicted(prediction);
            (StatusCode::OK, Html(render_page(&values, Some(&message), algorithm)))
        }
        Err(err) => {
            warn!(error = %err, "Form prediction failed");
            let message = FormMessage::Failed(err.to_string());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_page(&values, Some(&message), algorithm)),
            )
        }
    }
}

/// POST /api/predict - JSON record in, JSON prediction out
///
/// Malformed bodies are rejected by the `Json` extractor with 422.
pub async fn predict_json(
    State(state): State<Arc<AppState>>,
    Json(record): Json<CustomerRecord>,
) -> Result<Json<Prediction>, ApiError> {
    let prediction = state.pipeline.predict_record(&record).map_err(|err| {
        warn!(error = %err, "API prediction failed");
        ApiError::from(err)
    })?;
    info!(label = %prediction.label, score = prediction.score, "API prediction");
    Ok(Json(prediction))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let pipeline = &state.pipeline;
    Json(serde_json::json!({
        "status": "healthy",
        "algorithm": pipeline.algorithm_name(),
        "format_version": pipeline.format_version,
        "crate_version": pipeline.crate_version,
        "trained_at": pipeline.created_at,
    }))
}
