//! flavor-common: wire records, errors, configuration and remote access
//! shared by the flavor crates.

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod payload;
pub mod record;
pub mod store;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::client::FlavorClient;
pub use crate::config::{ApiConfig, Endpoints};
pub use crate::error::{AuthStoreError, ConfigError, FlavorError, RemoteError};
pub use crate::identity::AuthStore;
pub use crate::payload::{EncodedCover, EncodedFile, JournalPayload, MediaUpload, PersistResponse};
pub use crate::record::{Journal, MediaKind, MediaLists, MediaRef, Recipe, User};
pub use crate::store::{IdentityProvider, JournalStore};
