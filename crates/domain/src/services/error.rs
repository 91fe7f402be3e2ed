//! Domain error types for the lending engines.

use thiserror::Error;

/// Broad class of a domain failure, used to pick the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Forbidden,
    NotFound,
}

/// Every way a lending operation can be refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    #[error("Cannot request an item without phone number, please add your phone number and try again.")]
    NoPhoneNumber,

    #[error("Quantity cannot be less than or equal to zero.")]
    InvalidQuantity,

    #[error("Item group is not an accessory. Quantity should be equal to one.")]
    QuantityNotAllowed,

    #[error("Invalid item request.")]
    InvalidItemRequest,

    #[error("Invalid item. Accessories can't be shared or returned.")]
    InvalidItemAdd,

    #[error("Duration not provided for returnable or shareable item.")]
    NoDuration,

    #[error("Duration must be greater than 0.")]
    InvalidDuration,

    #[error("Cannot update duration for permanent items.")]
    PermanentDurationUpdate,

    #[error("Cannot update duration for returned items.")]
    ReturnedDurationUpdate,

    #[error("Item group didn't match with request.")]
    ItemGroupMismatch,

    #[error("Can't assign more quantity than available.")]
    InsufficientQuantity,

    #[error("Item is already assigned to some user.")]
    ItemAlreadyAssigned,

    #[error("Cannot update item, it's currently assigned.")]
    ItemUpdateNotAllowed,

    #[error("Either request is approved, rejected or cancelled.")]
    RequestNotPending,

    #[error("Either item is already acknowledged or returned.")]
    AcknowledgeNotAllowed,

    #[error("Either item is already returned or not acknowledged.")]
    ReturnNotAllowed,

    #[error("Cannot delete this item group as its non-permanent items are currently assigned.")]
    ItemGroupInUse,

    #[error("Cannot delete this item as it is currently assigned to a user.")]
    ItemInUse,

    #[error("An item group with this name already exists.")]
    ItemGroupNameTaken,

    #[error("Trying to access content from other organization.")]
    OrganizationMismatch,

    #[error("Only admins and managers can perform this action.")]
    InsufficientRole,

    #[error("Either item is issued permanently or is an accessory.")]
    ReturnPermanentItem,

    #[error("Cannot share a non-shareable item. If you're having this item, please return it and try again.")]
    ApproveNonShareableItem,

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        use LendingError::*;

        match self {
            NoPhoneNumber
            | InvalidQuantity
            | QuantityNotAllowed
            | InvalidItemRequest
            | InvalidItemAdd
            | NoDuration
            | InvalidDuration
            | PermanentDurationUpdate
            | ReturnedDurationUpdate
            | ItemGroupMismatch
            | InsufficientQuantity
            | ItemAlreadyAssigned
            | ItemUpdateNotAllowed => ErrorKind::Validation,

            RequestNotPending
            | AcknowledgeNotAllowed
            | ReturnNotAllowed
            | ItemGroupInUse
            | ItemInUse
            | ItemGroupNameTaken => ErrorKind::Conflict,

            OrganizationMismatch
            | InsufficientRole
            | ReturnPermanentItem
            | ApproveNonShareableItem => ErrorKind::Forbidden,

            NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        use LendingError::*;

        match self {
            NoPhoneNumber => "no_phone_number",
            InvalidQuantity => "invalid_quantity",
            QuantityNotAllowed => "quantity_not_allowed",
            InvalidItemRequest => "invalid_item_request",
            InvalidItemAdd => "invalid_item_add",
            NoDuration => "no_duration",
            InvalidDuration => "invalid_duration",
            PermanentDurationUpdate => "permanent_duration_update",
            ReturnedDurationUpdate => "returned_duration_update",
            ItemGroupMismatch => "item_group_mismatch",
            InsufficientQuantity => "insufficient_quantity",
            ItemAlreadyAssigned => "item_already_assigned",
            ItemUpdateNotAllowed => "item_update_not_allowed",
            RequestNotPending => "request_not_pending",
            AcknowledgeNotAllowed => "acknowledge_not_allowed",
            ReturnNotAllowed => "return_not_allowed",
            ItemGroupInUse => "item_group_in_use",
            ItemInUse => "item_in_use",
            ItemGroupNameTaken => "item_group_name_taken",
            OrganizationMismatch => "organization_mismatch",
            InsufficientRole => "insufficient_role",
            ReturnPermanentItem => "return_permanent_item",
            ApproveNonShareableItem => "approve_non_shareable_item",
            NotFound(_) => "not_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(LendingError::NoDuration.kind(), ErrorKind::Validation);
        assert_eq!(LendingError::InsufficientQuantity.kind(), ErrorKind::Validation);
        assert_eq!(LendingError::RequestNotPending.kind(), ErrorKind::Conflict);
        assert_eq!(LendingError::OrganizationMismatch.kind(), ErrorKind::Forbidden);
        assert_eq!(LendingError::ReturnPermanentItem.kind(), ErrorKind::Forbidden);
        assert_eq!(LendingError::NotFound("request").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LendingError::RequestNotPending.to_string(),
            "Either request is approved, rejected or cancelled."
        );
        assert_eq!(LendingError::NotFound("item").to_string(), "item not found");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(LendingError::InvalidDuration.code(), "invalid_duration");
        assert_eq!(LendingError::NotFound("item").code(), "not_found");
    }
}
