//! Uniform response envelopes.
//!
//! Every response body is one of two shapes:
//! `{ "success": true, "message": ..., "data": ... }` or
//! `{ "success": false, "message": ..., "errorStack": ... }`.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorReport};

const FRAMEWORK_BODY_LIMIT: usize = 16 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub error_stack: Option<String>,
}

/// Success envelope builder. Defaults to `200` with `data: null`.
#[derive(Debug)]
pub struct Success<T> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl Success<()> {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

impl<T> Success<T> {
    pub fn with_data<U>(self, data: U) -> Success<U> {
        Success {
            status: self.status,
            message: self.message,
            data: Some(data),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let body = SuccessBody {
            success: true,
            message: self.message,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Writes error envelopes. `errorStack` is only ever populated when the
/// renderer was built with `expose_stack`.
#[derive(Debug, Clone, Copy)]
pub struct ErrorRenderer {
    expose_stack: bool,
}

impl ErrorRenderer {
    pub fn new(expose_stack: bool) -> Self {
        Self { expose_stack }
    }

    pub fn render(
        &self,
        status: StatusCode,
        message: impl Into<String>,
        stack: Option<String>,
    ) -> Response {
        let body = ErrorBody {
            success: false,
            message: message.into(),
            error_stack: stack.filter(|_| self.expose_stack),
        };
        (status, Json(body)).into_response()
    }
}

/// Terminal error boundary, installed with `map_response_with_state`.
///
/// Rewrites responses carrying an [`ErrorReport`] into the error envelope,
/// along with error responses the framework produced itself (timeouts,
/// extractor rejections, method mismatches), whose plain text body becomes
/// the message.
pub async fn render_error_envelopes(
    State(renderer): State<ErrorRenderer>,
    response: Response,
) -> Response {
    let status = response.status();
    let (mut parts, body) = response.into_parts();

    let report = match parts.extensions.remove::<ErrorReport>() {
        Some(report) => report,
        None if needs_envelope(status, &parts.headers) => framework_report(status, body).await,
        None => return Response::from_parts(parts, body),
    };
    // A known path with the wrong method is reported like any unmatched route.
    let remapped = status == StatusCode::METHOD_NOT_ALLOWED;
    let status = if remapped { StatusCode::NOT_FOUND } else { status };

    if status.is_server_error() {
        tracing::error!(
            status_code = %status.as_u16(),
            message = %report.message,
            "request failed"
        );
    } else {
        tracing::warn!(
            status_code = %status.as_u16(),
            message = %report.message,
            "request rejected"
        );
    }

    let mut rendered = renderer.render(status, report.message, report.stack);
    for (name, value) in parts.headers.iter() {
        let skipped = name == header::CONTENT_TYPE
            || name == header::CONTENT_LENGTH
            || (remapped && name == header::ALLOW);
        if !skipped {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

fn needs_envelope(status: StatusCode, headers: &HeaderMap) -> bool {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    (status.is_client_error() || status.is_server_error()) && !is_json
}

async fn framework_report(status: StatusCode, body: Body) -> ErrorReport {
    let message = if status == StatusCode::METHOD_NOT_ALLOWED {
        AppError::RouteNotFound.to_string()
    } else {
        to_bytes(body, FRAMEWORK_BODY_LIMIT)
            .await
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            })
    };

    ErrorReport {
        message,
        stack: None,
    }
}
