use crate::config::{Role, Viewer, VisibilityPolicy};

use super::model::Invoice;

/// Restrict the collection to what `viewer` may see.
///
/// Only guardians are filtered. When no invoice carries ownership metadata the
/// outcome depends on `policy`.
pub fn visible_to<'a>(
    invoices: &'a [Invoice],
    viewer: &Viewer,
    policy: VisibilityPolicy,
) -> Vec<&'a Invoice> {
    let user_id = match (viewer.role, viewer.id) {
        (Some(Role::Pai), Some(id)) => id,
        _ => return invoices.iter().collect(),
    };

    if !invoices.iter().any(|inv| inv.ownership.is_known()) {
        return match policy {
            VisibilityPolicy::FailOpen => invoices.iter().collect(),
            VisibilityPolicy::FailClosed => Vec::new(),
        };
    }

    invoices
        .iter()
        .filter(|inv| inv.ownership.is_owned_by(user_id))
        .collect()
}
