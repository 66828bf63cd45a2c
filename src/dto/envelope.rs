use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Success envelope: `{"status":"success", ...payload}`.
///
/// Every route wraps its payload in this, mirroring the error body emitted
/// by [`crate::error::AppError`] so clients always find a `status` field.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    /// Always `"success"`.
    pub status: &'static str,
    /// Flattened action payload.
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> Success<T> {
    /// Wrap a payload in the success envelope.
    pub fn new(payload: T) -> Self {
        Self {
            status: "success",
            payload,
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
