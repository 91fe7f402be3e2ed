//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod approved_item;
pub mod item;
pub mod item_group;
pub mod item_history;
pub mod requested_item;
pub mod user;

pub use approved_item::{
    ApprovalStatusCountEntity, ApprovalStatusDb, ApprovedItemEntity, ApprovedItemViewEntity,
    HeldShareEntity, ReminderDigestEntity,
};
pub use item::{ItemAttributeEntity, ItemEntity, ItemTypeDb};
pub use item_group::{ItemGroupEntity, ItemGroupSummaryEntity};
pub use item_history::{ItemHistoryEntity, ItemHistoryViewEntity};
pub use requested_item::{
    RequestStatusCountEntity, RequestStatusDb, RequestedItemEntity, RequestedItemViewEntity,
};
pub use user::{UserEntity, UserRoleDb};
