//! flavor-editor-core: journal editing without any presentation layer.
//!
//! - [`JournalForm`]: the two-step draft, cover slot and staged media
//! - [`MediaStaging`]: existing vs. pending media per category
//! - [`encoder`]: base64 transport encoding of selected files
//! - [`submit`]: one composite persist call per attempt
//! - [`EditorSession`]: open/close lifecycle around a form

pub mod draft;
pub mod encoder;
pub mod error;
pub mod media;
pub mod session;
pub mod submit;

pub use draft::{CoverFile, FormMode, FormStep, JournalDraft, JournalForm, MAX_COVER_BYTES};
pub use encoder::{ByteSource, ReadFuture, SelectedFile, encode_all, encode_file};
pub use error::{EncodingError, FormError, RangeError, StagedHalf, SubmitError, ValidationError};
pub use media::{MediaCounts, MediaStaging, PendingMedia, Preview, StagingPolicy};
pub use session::EditorSession;
pub use smol_str::SmolStr;
pub use submit::{SubmissionOutcome, build_payload};
