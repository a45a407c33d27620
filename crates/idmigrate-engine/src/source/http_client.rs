//! Reqwest-backed source API client.
//!
//! Owns transport details only: endpoint construction, bearer
//! authentication, status mapping and decoding of list responses into
//! pages of opaque records.

use async_trait::async_trait;
use idmigrate_core::config::SourceConfig;
use idmigrate_core::errors::{ExError, MigrateError, Result};
use idmigrate_core::model::{
    MembershipRecord, OrganizationId, OrganizationRecord, Page, PageRequest, ResourceKind,
    UserRecord,
};
use idmigrate_core::{SecretKey, SourceApi};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const USER_AGENT: &str = concat!("idmigrate/", env!("CARGO_PKG_VERSION"));

/// Source API client performing authenticated GET requests
#[derive(Debug, Clone)]
pub struct HttpSourceClient {
    client: Client,
    base_url: Url,
}

impl HttpSourceClient {
    /// Build a client with the configured base URL and request timeout.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::InvalidConfig` if the base URL does not parse or
    /// cannot carry path segments, `ExErrorKind::Internal` if the HTTP
    /// client cannot be constructed.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| MigrateError::InvalidConfig {
            field: "source_base_url".to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MigrateError::InvalidConfig {
                field: "source_base_url".to_string(),
                reason: format!("'{}' cannot be used as a base URL", config.base_url),
            }
            .into());
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ExError::new(idmigrate_core::ExErrorKind::Internal)
                    .with_op("build_http_client")
                    .with_message(e.to_string())
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        key: &SecretKey,
        page: PageRequest,
        resource: ResourceKind,
        organization_id: Option<&OrganizationId>,
    ) -> Result<Page<T>> {
        let scope = FetchScope {
            resource,
            organization_id: organization_id.map(|id| id.to_string()),
        };

        tracing::debug!(
            resource = resource.as_str(),
            organization_id = organization_id.map(|id| id.as_str()),
            limit = page.limit,
            offset = page.offset,
            "Requesting page"
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(key.expose())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("limit", page.limit.to_string()),
                ("offset", page.offset.to_string()),
            ])
            .send()
            .await
            .map_err(|e| scope.transport_error(e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| scope.transport_error(e))?;
        if !status.is_success() {
            return Err(scope.status_error(status, body.as_ref()).into());
        }

        parse_page(body.as_ref()).map_err(|reason| scope.decode_error(reason).into())
    }
}

#[async_trait]
impl SourceApi for HttpSourceClient {
    async fn fetch_users_page(
        &self,
        key: &SecretKey,
        page: PageRequest,
    ) -> Result<Page<UserRecord>> {
        let url = self.endpoint(&["users"]);
        self.get_page(url, key, page, ResourceKind::Users, None)
            .await
    }

    async fn fetch_organizations_page(
        &self,
        key: &SecretKey,
        page: PageRequest,
    ) -> Result<Page<OrganizationRecord>> {
        let url = self.endpoint(&["organizations"]);
        self.get_page(url, key, page, ResourceKind::Organizations, None)
            .await
    }

    async fn fetch_memberships_page(
        &self,
        key: &SecretKey,
        organization_id: &OrganizationId,
        page: PageRequest,
    ) -> Result<Page<MembershipRecord>> {
        let url = self.endpoint(&["organizations", organization_id.as_str(), "memberships"]);
        self.get_page(
            url,
            key,
            page,
            ResourceKind::Memberships,
            Some(organization_id),
        )
        .await
    }
}

/// List endpoints answer with either a bare array or a `data` wrapper
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped {
        data: Vec<T>,
        #[serde(default)]
        total_count: Option<u64>,
    },
}

fn parse_page<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<Page<T>, String> {
    let decoded: ListResponse<T> = serde_json::from_slice(body).map_err(|e| {
        format!(
            "expected a JSON array or an object with a 'data' array ({}): {}",
            e,
            body_preview(body)
        )
    })?;
    Ok(match decoded {
        ListResponse::Bare(records) => Page::new(records, None),
        ListResponse::Wrapped { data, total_count } => Page::new(data, total_count),
    })
}

struct FetchScope {
    resource: ResourceKind,
    organization_id: Option<String>,
}

impl FetchScope {
    fn transport_error(&self, error: reqwest::Error) -> MigrateError {
        let reason = if error.is_timeout() {
            format!("request timed out: {}", error)
        } else {
            format!("request failed: {}", error)
        };
        MigrateError::Fetch {
            resource: self.resource,
            organization_id: self.organization_id.clone(),
            status: error.status().map(|s| s.as_u16()),
            reason,
        }
    }

    fn status_error(&self, status: StatusCode, body: &[u8]) -> MigrateError {
        let preview = body_preview(body);
        let reason = if preview.is_empty() {
            format!("status {}", status.as_u16())
        } else {
            format!("status {}: {}", status.as_u16(), preview)
        };
        MigrateError::Fetch {
            resource: self.resource,
            organization_id: self.organization_id.clone(),
            status: Some(status.as_u16()),
            reason,
        }
    }

    fn decode_error(&self, reason: String) -> MigrateError {
        MigrateError::Decode {
            resource: self.resource,
            organization_id: self.organization_id.clone(),
            reason,
        }
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{}...", preview)
    } else {
        preview
    }
}
