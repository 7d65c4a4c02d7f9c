//! The four response shapes every endpoint answers with.
//!
//! A handler produces exactly one [`Envelope`] (directly or through
//! [`crate::error_handling::AppError`]); returning it ends the request.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::error;

/// Payload of a success envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum SuccessData {
    None,
    /// Spread into the top level of the envelope.
    Fields(Map<String, Value>),
    /// Nested under `data`. Arrays land here too.
    Scalar(Value),
}

impl SuccessData {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => SuccessData::None,
            Value::Object(fields) => SuccessData::Fields(fields),
            other => SuccessData::Scalar(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success {
        status: StatusCode,
        message: String,
        data: SuccessData,
    },
    Error {
        status: StatusCode,
        message: String,
        errors: Option<Value>,
    },
    Json {
        status: StatusCode,
        payload: Value,
    },
    Text {
        status: StatusCode,
        content_type: String,
        content: String,
    },
}

impl Envelope {
    pub fn success(data: SuccessData, message: impl Into<String>) -> Self {
        Envelope::Success {
            status: StatusCode::OK,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>, status: StatusCode) -> Self {
        Envelope::Error {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(self, details: Value) -> Self {
        match self {
            Envelope::Error { status, message, .. } => Envelope::Error {
                status,
                message,
                errors: Some(details),
            },
            other => other,
        }
    }

    pub fn json(payload: Value) -> Self {
        Self::json_with_status(payload, StatusCode::OK)
    }

    pub fn json_with_status(payload: Value, status: StatusCode) -> Self {
        Envelope::Json { status, payload }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::text_as(content, "text/plain")
    }

    pub fn text_as(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Envelope::Text {
            status: StatusCode::OK,
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Same envelope answered with `status` instead.
    pub fn with_status(self, status: StatusCode) -> Self {
        match self {
            Envelope::Success { message, data, .. } => Envelope::Success {
                status,
                message,
                data,
            },
            Envelope::Error {
                message, errors, ..
            } => Envelope::Error {
                status,
                message,
                errors,
            },
            Envelope::Json { payload, .. } => Envelope::Json { status, payload },
            Envelope::Text {
                content_type,
                content,
                ..
            } => Envelope::Text {
                status,
                content_type,
                content,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Envelope::Success { status, .. }
            | Envelope::Error { status, .. }
            | Envelope::Json { status, .. }
            | Envelope::Text { status, .. } => *status,
        }
    }

    /// JSON body of the envelope; `None` for plain text.
    pub fn body(&self) -> Option<Value> {
        match self {
            Envelope::Success { message, data, .. } => {
                let mut body = Map::new();
                body.insert("success".to_string(), Value::Bool(true));
                body.insert("message".to_string(), Value::String(message.clone()));
                match data {
                    SuccessData::None => {}
                    // later keys win, like a field-by-field copy
                    SuccessData::Fields(fields) => {
                        for (key, value) in fields {
                            body.insert(key.clone(), value.clone());
                        }
                    }
                    SuccessData::Scalar(value) => {
                        body.insert("data".to_string(), value.clone());
                    }
                }
                Some(Value::Object(body))
            }
            Envelope::Error {
                status,
                message,
                errors,
            } => {
                let mut body = Map::new();
                body.insert("success".to_string(), Value::Bool(false));
                body.insert("error".to_string(), Value::String(message.clone()));
                body.insert("code".to_string(), Value::from(status.as_u16()));
                if let Some(errors) = errors {
                    body.insert("errors".to_string(), errors.clone());
                }
                Some(Value::Object(body))
            }
            Envelope::Json { payload, .. } => Some(payload.clone()),
            Envelope::Text { .. } => None,
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Envelope::Text {
                content_type,
                content,
                ..
            } => {
                let content_type = HeaderValue::from_str(&content_type).unwrap_or_else(|_| {
                    error!("Invalid content type {:?}, falling back to text/plain", content_type);
                    HeaderValue::from_static("text/plain")
                });
                (status, [(header::CONTENT_TYPE, content_type)], content).into_response()
            }
            json_envelope => {
                let body = json_envelope.body().unwrap_or(Value::Null);
                (
                    status,
                    [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                    body.to_string(),
                )
                    .into_response()
            }
        }
    }
}
