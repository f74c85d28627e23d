//! ID generation utilities.

use uuid::Uuid;

/// Generates a new time-ordered identifier with the given model prefix.
///
/// Documents created on the fly (for example a cookie jar that did not
/// exist yet) use this so ids stay sortable by creation time.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let id = Uuid::now_v7().simple().to_string();
    if prefix.is_empty() {
        id
    } else {
        format!("{prefix}_{id}")
    }
}
