//! Seams between the editing core and the outside world.

use crate::error::RemoteError;
use crate::payload::{JournalPayload, PersistResponse};
use crate::record::User;

/// Persistence of journals.
///
/// Each method is a single request/response with no retry. A remote-side
/// refusal comes back as `Ok` with `success: false`; `Err` is reserved for
/// the request itself failing.
#[trait_variant::make(Send)]
pub trait JournalStore {
    /// Create a new journal from a payload without an id.
    async fn create_journal(&self, payload: &JournalPayload)
    -> Result<PersistResponse, RemoteError>;

    /// Update the journal named by `payload.id`.
    async fn update_journal(&self, payload: &JournalPayload)
    -> Result<PersistResponse, RemoteError>;
}

/// Who is currently logged in.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<&User>;
}

impl IdentityProvider for Option<User> {
    fn current_user(&self) -> Option<&User> {
        self.as_ref()
    }
}

impl IdentityProvider for User {
    fn current_user(&self) -> Option<&User> {
        Some(self)
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn current_user(&self) -> Option<&User> {
        (**self).current_user()
    }
}
