//! Repository implementations for database access.

pub mod approved_item;
pub mod item;
pub mod item_group;
pub mod item_history;
pub mod lending;
pub mod requested_item;
pub mod user;

pub use approved_item::{ApprovalFilter, ApprovedItemRepository};
pub use item::{ItemFilter, ItemRepository};
pub use item_group::{ItemGroupFilter, ItemGroupRepository};
pub use item_history::ItemHistoryRepository;
pub use lending::{ApprovalReceipt, LendingRepository};
pub use requested_item::{RequestFilter, RequestedItemRepository};
pub use user::UserRepository;
