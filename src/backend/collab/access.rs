//! Notebook access policy.
//!
//! One pure function decides every join and update. It is re-evaluated on
//! each request against freshly loaded metadata and never cached.
//!
//! | identity      | owner / collaborator | `everyone`, no password | `everyone`, password |
//! |---------------|----------------------|-------------------------|----------------------|
//! | authenticated | read + write         | read + write            | read; write if unlocked |
//! | guest / anon  | n/a                  | read + write            | denied               |

use crate::shared::{AccessIntent, Identity, NotebookRecord, Permission};

/// Whether `identity` may perform `intent` on `notebook`.
///
/// `unlocked` reports whether this session already answered the notebook's
/// password challenge.
pub fn can_access(
    identity: &Identity,
    notebook: &NotebookRecord,
    intent: AccessIntent,
    unlocked: bool,
) -> bool {
    match identity {
        Identity::Authenticated { id, .. } => {
            if notebook.is_owner(id) || notebook.is_collaborator(id) {
                return true;
            }
            if notebook.permissions != Permission::Everyone {
                return false;
            }
            match intent {
                AccessIntent::Read => true,
                AccessIntent::Write => !notebook.has_password() || unlocked,
            }
        }
        Identity::Guest { .. } | Identity::Anonymous => {
            notebook.permissions == Permission::Everyone && !notebook.has_password()
        }
    }
}
