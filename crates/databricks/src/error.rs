// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for workspace REST calls

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status with the platform's `{error_code, message}` payload
    #[error("{status} from {url}: {error_code}: {message}")]
    Api {
        url: String,
        status: u16,
        error_code: String,
        message: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Statement {statement_id} {state}: {message}")]
    StatementFailed {
        statement_id: String,
        state: String,
        message: String,
    },

    #[error("Statement {statement_id} still {state} after {polls} polls")]
    StatementPending {
        statement_id: String,
        state: String,
        polls: usize,
    },
}

impl PlatformError {
    pub fn api(url: &str, status: u16, error_code: &str, message: &str) -> Self {
        PlatformError::Api {
            url: url.to_string(),
            status,
            error_code: error_code.to_string(),
            message: message.to_string(),
        }
    }

    /// HTTP status of an API error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            PlatformError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PlatformError::StatementPending { .. })
    }
}

impl From<serde_yaml_ng::Error> for PlatformError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        PlatformError::Configuration(e.to_string())
    }
}
