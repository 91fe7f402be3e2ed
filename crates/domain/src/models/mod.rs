//! Domain models for the lending tracker.

pub mod approved_item;
pub mod item;
pub mod item_group;
pub mod item_history;
pub mod requested_item;
pub mod stats;
pub mod user;

pub use approved_item::{ApprovalStatus, ApprovedItem, NewApprovedItem};
pub use item::{Item, ItemAttribute, ItemType, NewItem};
pub use item_group::{ItemGroup, NewItemGroup};
pub use item_history::{ItemHistory, StatusChange};
pub use requested_item::{NewRequestedItem, RequestStatus, RequestedItem};
pub use stats::{ApprovalStats, RequestStats, StatsScope};
pub use user::{Role, UserContext};
