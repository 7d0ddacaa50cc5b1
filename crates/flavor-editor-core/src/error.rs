//! Errors raised while editing and submitting a journal.
//!
//! All of them are scoped to one editing session; none leaves the session in
//! a half-modified state.

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use flavor_common::{MediaKind, RemoteError};

/// A refused edit. The offending operation is blocked, nothing else is.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("{field} is required")]
    #[diagnostic(code(flavor::validation::missing_field))]
    MissingField { field: &'static str },

    #[error("{name} is {size} bytes, {kind} must be at most {limit} bytes")]
    #[diagnostic(code(flavor::validation::too_large))]
    TooLarge {
        kind: MediaKind,
        name: SmolStr,
        size: u64,
        limit: u64,
    },

    #[error("{name} ({content_type}) is not a valid {kind} file")]
    #[diagnostic(code(flavor::validation::wrong_kind))]
    WrongKind {
        kind: MediaKind,
        name: SmolStr,
        content_type: SmolStr,
    },

    #[error("cover image {name} is {size} bytes, at most {limit} bytes allowed")]
    #[diagnostic(code(flavor::validation::cover_too_large))]
    CoverTooLarge { name: SmolStr, size: u64, limit: u64 },

    #[error("cover image {name} must be an image")]
    #[diagnostic(code(flavor::validation::cover_kind))]
    CoverNotImage { name: SmolStr },

    #[error("uploads to {kind} are only allowed once it has media")]
    #[diagnostic(
        code(flavor::validation::upload_not_allowed),
        help("this journal's staging policy requires existing media before adding more")
    )]
    UploadNotAllowed { kind: MediaKind },

    #[error("a journal can only be submitted from the media step")]
    #[diagnostic(
        code(flavor::validation::not_on_media_step),
        help("fill in the title and description, then move on to media")
    )]
    NotOnMediaStep,

    #[error("the editing session is closed")]
    #[diagnostic(code(flavor::validation::closed))]
    SessionClosed,
}

/// Index past the end of a staged half.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("no {half} {kind} item at index {index} (have {len})")]
#[diagnostic(code(flavor::range))]
pub struct RangeError {
    pub kind: MediaKind,
    pub half: StagedHalf,
    pub index: usize,
    pub len: usize,
}

/// Which half of a media category an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedHalf {
    Existing,
    Pending,
}

impl std::fmt::Display for StagedHalf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagedHalf::Existing => f.write_str("existing"),
            StagedHalf::Pending => f.write_str("pending"),
        }
    }
}

/// Errors from form operations that can hit either a closed session or a bad
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum FormError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Range(#[from] RangeError),
}

/// A selected file could not be turned into its transport form.
#[derive(Debug, Error, Diagnostic)]
pub enum EncodingError {
    #[error("failed to read {name}")]
    #[diagnostic(
        code(flavor::encoding::read),
        help("check that the file still exists and is readable")
    )]
    Read {
        name: SmolStr,
        #[source]
        source: std::io::Error,
    },
}

/// Why a submission attempt failed. The session stays open in every case.
#[derive(Debug, Error, Diagnostic)]
pub enum SubmitError {
    #[error("please log in first")]
    #[diagnostic(code(flavor::submit::auth_required))]
    AuthRequired,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Remote(#[from] RemoteError),
}
