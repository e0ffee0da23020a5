// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;

use crate::error::ErrorReport;

/// An error returned to an API client as `{"error": "..."}`.
#[derive(Debug, PartialEq)]
pub enum ApiError {
    /// The request was malformed. Nothing was attempted.
    Validation(String),
    /// A referenced deck or card does not exist.
    NotFound(String),
    /// The store failed. The message is safe to show to clients.
    Persistence(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        ApiError::Persistence(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::Validation(m) | ApiError::NotFound(m) | ApiError::Persistence(m) => m,
        }
    }
}

/// Store errors carry internal detail, so they are logged here and replaced
/// with a generic message.
impl From<ErrorReport> for ApiError {
    fn from(value: ErrorReport) -> Self {
        log::error!("Store failure: {value}");
        ApiError::persistence("internal server error")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        log::debug!("Rejected request body: {}", value.body_text());
        ApiError::validation("invalid JSON body")
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        log::debug!("Rejected path: {}", value.body_text());
        ApiError::validation("invalid id")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        log::debug!("Rejected query string: {}", value.body_text());
        ApiError::validation("invalid query string")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
