//! Source service interface
//!
//! Each method is one authenticated page request. The caller supplies the
//! key on every call; implementations must not retain it.

use async_trait::async_trait;

use crate::credentials::SecretKey;
use crate::errors::Result;
use crate::model::{
    MembershipRecord, OrganizationId, OrganizationRecord, Page, PageRequest, UserRecord,
};

#[async_trait]
pub trait SourceApi: Send + Sync {
    /// # Errors
    ///
    /// `ExErrorKind::Fetch` on transport or status failure,
    /// `ExErrorKind::Decode` on an unexpected body.
    async fn fetch_users_page(&self, key: &SecretKey, page: PageRequest)
        -> Result<Page<UserRecord>>;

    /// # Errors
    ///
    /// As for `fetch_users_page`.
    async fn fetch_organizations_page(
        &self,
        key: &SecretKey,
        page: PageRequest,
    ) -> Result<Page<OrganizationRecord>>;

    /// # Errors
    ///
    /// As for `fetch_users_page`; errors carry the organization id.
    async fn fetch_memberships_page(
        &self,
        key: &SecretKey,
        organization_id: &OrganizationId,
        page: PageRequest,
    ) -> Result<Page<MembershipRecord>>;
}
