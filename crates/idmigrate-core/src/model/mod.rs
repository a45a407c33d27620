pub mod page;
pub mod phase;
pub mod records;
pub mod resource;

pub use page::{Page, PageCursor, PageRequest, MAX_PAGE_LIMIT};
pub use phase::CyclePhase;
pub use records::{MembershipRecord, OrganizationId, OrganizationRecord, UserRecord};
pub use resource::ResourceKind;
