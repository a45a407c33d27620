use serde::{Deserialize, Serialize};

/// The three collections read from the source service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Users,
    Organizations,
    Memberships,
}

impl ResourceKind {
    /// Stable lowercase name used in logs and error context
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Organizations => "organizations",
            ResourceKind::Memberships => "memberships",
        }
    }

    /// Operation name for the fetch of this collection
    pub fn fetch_op(&self) -> &'static str {
        match self {
            ResourceKind::Users => "fetch_users",
            ResourceKind::Organizations => "fetch_organizations",
            ResourceKind::Memberships => "fetch_memberships",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
