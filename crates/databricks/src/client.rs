// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::Result;
use crate::auth::TokenSource;
use crate::config::WorkspaceConfig;
use crate::error::PlatformError;
use crate::models::{
    ApiErrorBody, CurrentUser, EffectivePermissionsList, SecurableType, StatementRequest,
    StatementResponse, VolumeInfo, WarehouseInfo,
};
use bytes::Bytes;
use diagnostics::*;
use reqwest::RequestBuilder;
use std::sync::Arc;
use url::Url;

/// Async workspace REST client.
///
/// Cheap to clone; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct WorkspaceClient {
    http_client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenSource>,
}

impl WorkspaceClient {
    pub fn new(config: &WorkspaceConfig) -> Result<Self> {
        let base_url = config.base_url();
        let tokens = Arc::new(TokenSource::new(config.credentials()?, &base_url));

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| PlatformError::Http {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            http_client,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up a volume by its three-part name
    pub async fn read_volume(&self, full_name: &str) -> Result<VolumeInfo> {
        let url = self.endpoint(&["api", "2.1", "unity-catalog", "volumes", full_name])?;
        self.fetch_json(self.http_client.get(url.clone()), &url).await
    }

    /// The principal these credentials act as
    pub async fn current_user(&self) -> Result<CurrentUser> {
        let url = self.endpoint(&["api", "2.0", "preview", "scim", "v2", "Me"])?;
        self.fetch_json(self.http_client.get(url.clone()), &url).await
    }

    /// Effective (direct and inherited) privileges of `principal` on a securable
    pub async fn effective_permissions(
        &self,
        securable: SecurableType,
        full_name: &str,
        principal: &str,
    ) -> Result<EffectivePermissionsList> {
        let mut url = self.endpoint(&[
            "api",
            "2.1",
            "unity-catalog",
            "effective-permissions",
            securable.as_str(),
            full_name,
        ])?;
        url.query_pairs_mut().append_pair("principal", principal);
        self.fetch_json(self.http_client.get(url.clone()), &url).await
    }

    /// Upload `contents` to an absolute Files API path such as
    /// `/Volumes/main/marketing/raw_files/data.csv`.
    pub async fn upload_file(&self, file_path: &str, contents: Bytes, overwrite: bool) -> Result<()> {
        let mut segments = vec!["api", "2.0", "fs", "files"];
        segments.extend(file_path.split('/').filter(|s| !s.is_empty()));

        let mut url = self.endpoint(&segments)?;
        url.query_pairs_mut()
            .append_pair("overwrite", if overwrite { "true" } else { "false" });

        debug!("PUT {file_path} ({size} bytes)", file_path: file_path, size: contents.len());
        let request = self
            .http_client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(contents);
        self.send(request, &url).await?;
        Ok(())
    }

    pub async fn get_warehouse(&self, warehouse_id: &str) -> Result<WarehouseInfo> {
        let url = self.endpoint(&["api", "2.0", "sql", "warehouses", warehouse_id])?;
        self.fetch_json(self.http_client.get(url.clone()), &url).await
    }

    pub(crate) async fn submit_statement(
        &self,
        request: &StatementRequest<'_>,
    ) -> Result<StatementResponse> {
        let url = self.endpoint(&["api", "2.0", "sql", "statements", ""])?;
        self.fetch_json(self.http_client.post(url.clone()).json(request), &url)
            .await
    }

    pub(crate) async fn get_statement(&self, statement_id: &str) -> Result<StatementResponse> {
        let url = self.endpoint(&["api", "2.0", "sql", "statements", statement_id])?;
        self.fetch_json(self.http_client.get(url.clone()), &url).await
    }

    pub(crate) async fn cancel_statement(&self, statement_id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "2.0", "sql", "statements", statement_id, "cancel"])?;
        self.send(self.http_client.post(url.clone()), &url).await?;
        Ok(())
    }

    /// Base URL with percent-encoded path segments appended
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                PlatformError::Configuration(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_json<T>(&self, request: RequestBuilder, url: &Url) -> Result<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let response = self.send(request, url).await?;
        let json_text = response.text().await.map_err(|source| PlatformError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&json_text).map_err(|source| PlatformError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Authorize and send, turning non-success statuses into `PlatformError::Api`
    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<reqwest::Response> {
        let token = self.tokens.bearer().await?;
        debug!("Request {url}", url: url.as_str());

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| PlatformError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let body: ApiErrorBody = serde_json::from_str(&error_text).unwrap_or_default();
        let error_code = body.error_code.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("HTTP_ERROR")
                .to_ascii_uppercase()
                .replace(' ', "_")
        });
        let message = body.message.unwrap_or(error_text);

        Err(PlatformError::api(
            url.as_str(),
            status.as_u16(),
            &error_code,
            &message,
        ))
    }
}
