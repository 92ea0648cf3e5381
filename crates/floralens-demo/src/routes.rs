//! HTTP handlers: the presentation-side caller of the prediction
//! pipeline
//!
//! Exactly three outcomes reach the client: a confident labeled
//! prediction, an explicit "not confident" message, or an error object
//! naming the failure category. A label below the threshold is never
//! returned.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use floralens_core::{Error, Prediction};
use floralens_engine::InferenceEngine;
use std::sync::Arc;

pub type AppState = Arc<InferenceEngine>;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Minimal upload page; everything interesting happens in /api/predict.
pub async fn index() -> impl IntoResponse {
    Html(
        r#"<!doctype html>
<html>
<head><title>Floralens</title></head>
<body>
  <h1>Flower Identification</h1>
  <p>Upload an image of a flower to identify it.</p>
  <input type="file" id="file" accept="image/jpeg,image/png" />
  <pre id="result"></pre>
  <script>
    document.getElementById('file').addEventListener('change', async (e) => {
      const file = e.target.files[0];
      if (!file) return;
      const response = await fetch('/api/predict', { method: 'POST', body: file });
      document.getElementById('result').textContent =
        JSON.stringify(await response.json(), null, 2);
    });
  </script>
</body>
</html>
"#,
    )
}

/// Run one prediction on the raw image bytes in the request body.
pub async fn predict(State(engine): State<AppState>, body: Bytes) -> impl IntoResponse {
    // Caller-side validation: reject anything that is not a decodable
    // image before the pipeline sees it.
    let image = match image::load_from_memory(&body) {
        Ok(image) => image,
        Err(e) => {
            tracing::debug!(error = %e, "rejected undecodable upload");
            return error_response(&Error::invalid_image(e.to_string()));
        }
    };

    match engine.predict(&image).await {
        Ok(prediction) => prediction_response(prediction),
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "prediction failed");
            error_response(&e)
        }
    }
}

fn prediction_response(prediction: Prediction) -> (StatusCode, Json<serde_json::Value>) {
    let body = match &prediction {
        Prediction::Confident { label, confidence } => serde_json::json!({
            "outcome": "confident",
            "label": label,
            "confidence": confidence,
            "message": format!("Predicted flower: {label} with {confidence:.2}% confidence."),
        }),
        Prediction::NotConfident => serde_json::json!({
            "outcome": "not_confident",
            "message": "The flower cannot be confidently recognized. Please try another image.",
        }),
    };
    (StatusCode::OK, Json(body))
}

fn error_response(error: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let (status, message) = match error {
        Error::InvalidImage(_) => (
            StatusCode::BAD_REQUEST,
            "The uploaded file is not a valid image. Please upload a JPG, JPEG, or PNG file."
                .to_string(),
        ),
        // Opaque message for anything unexpected; the category is
        // enough for the client, details go to the log.
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("An unexpected error occurred ({}).", other.kind()),
        ),
    };
    (
        status,
        Json(serde_json::json!({
            "outcome": "error",
            "kind": error.kind(),
            "message": message,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_map_to_status() {
        let (status, _) = error_response(&Error::invalid_image("bad"));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(&Error::model_load("bad"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = error_response(&Error::download("model.safetensors", "timeout"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_corrupt_png_is_rejected_at_decode() {
        // Valid PNG magic, garbage after it.
        let bytes = b"\x89PNG\r\n\x1a\nnot really a png";
        assert!(image::load_from_memory(bytes).is_err());

        let (status, Json(body)) = error_response(&Error::invalid_image("corrupt stream"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_image");
    }

    #[test]
    fn test_confident_body_carries_label() {
        let (status, Json(body)) = prediction_response(Prediction::Confident {
            label: "sunflower".to_string(),
            confidence: 97.25,
        });
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "confident");
        assert_eq!(body["label"], "sunflower");
    }

    #[test]
    fn test_not_confident_body_has_no_label() {
        let (_, Json(body)) = prediction_response(Prediction::NotConfident);
        assert_eq!(body["outcome"], "not_confident");
        assert!(body.get("label").is_none());
    }
}
