//! Edit permission policy

use crate::types::{GalleryItem, Principal};

/// Check if `principal` may edit or delete `item`
///
/// Signed-in users may modify ownerless items and their own items.
/// Anonymous principals may modify nothing.
#[inline]
#[must_use]
pub fn can_edit(principal: &Principal, item: &GalleryItem) -> bool {
    match principal {
        Principal::Anonymous => false,
        Principal::Authenticated(user) => item.owner_id.as_ref().map_or(true, |owner| owner == user),
    }
}
