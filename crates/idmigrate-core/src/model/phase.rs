use super::OrganizationId;

/// States of one migration cycle
///
/// `Init -> Validated -> UsersFetched -> OrgsFetched -> UsersMigrated ->
/// OrgsMigrated -> Memberships(org)* -> Done`, with `Failed` absorbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CyclePhase {
    Init,
    Validated,
    UsersFetched,
    OrgsFetched,
    UsersMigrated,
    OrgsMigrated,
    Memberships(OrganizationId),
    Done,
    Failed,
}

impl CyclePhase {
    /// Stable snake_case state name for structured logs
    pub fn name(&self) -> &'static str {
        match self {
            CyclePhase::Init => "init",
            CyclePhase::Validated => "validated",
            CyclePhase::UsersFetched => "users_fetched",
            CyclePhase::OrgsFetched => "orgs_fetched",
            CyclePhase::UsersMigrated => "users_migrated",
            CyclePhase::OrgsMigrated => "orgs_migrated",
            CyclePhase::Memberships(_) => "memberships",
            CyclePhase::Done => "done",
            CyclePhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CyclePhase::Done | CyclePhase::Failed)
    }
}

/// Human description of the step that leads into the state; this is what
/// failure messages print as "during ...".
impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CyclePhase::Init => f.write_str("init"),
            CyclePhase::Validated => f.write_str("credential validation"),
            CyclePhase::UsersFetched => f.write_str("users fetch"),
            CyclePhase::OrgsFetched => f.write_str("organizations fetch"),
            CyclePhase::UsersMigrated => f.write_str("users migration"),
            CyclePhase::OrgsMigrated => f.write_str("organizations migration"),
            CyclePhase::Memberships(org) => write!(f, "memberships of organization {}", org),
            CyclePhase::Done => f.write_str("done"),
            CyclePhase::Failed => f.write_str("failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_phase_names_organization() {
        let org = OrganizationId::parse("org_1").unwrap();
        let phase = CyclePhase::Memberships(org);
        assert_eq!(phase.name(), "memberships");
        assert_eq!(phase.to_string(), "memberships of organization org_1");
    }

    #[test]
    fn test_terminal_states() {
        assert!(CyclePhase::Done.is_terminal());
        assert!(CyclePhase::Failed.is_terminal());
        assert!(!CyclePhase::OrgsMigrated.is_terminal());
    }
}
