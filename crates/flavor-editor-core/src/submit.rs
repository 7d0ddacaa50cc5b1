//! Turning a finished form into one persist call.

use smol_str::SmolStr;

use flavor_common::payload::rejected;
use flavor_common::{
    EncodedCover, EncodedFile, IdentityProvider, JournalPayload, JournalStore, MediaKind,
    MediaLists, User,
};

use crate::draft::{FormMode, FormStep, JournalForm};
use crate::encoder::{SelectedFile, encode_all};
use crate::error::{EncodingError, SubmitError, ValidationError};

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A new journal. The id is present when the remote returned the record.
    Created { journal_id: Option<SmolStr> },
    Updated { journal_id: SmolStr },
}

impl SubmissionOutcome {
    pub fn journal_id(&self) -> Option<&SmolStr> {
        match self {
            SubmissionOutcome::Created { journal_id } => journal_id.as_ref(),
            SubmissionOutcome::Updated { journal_id } => Some(journal_id),
        }
    }
}

/// Encode everything pending in `form` and assemble the request body.
///
/// All files (media of every kind and the cover) are read concurrently and
/// joined; one unreadable file fails the whole build. The form is not
/// touched.
pub async fn build_payload(
    form: &JournalForm,
    user: &User,
) -> Result<JournalPayload, EncodingError> {
    let pending = form.media().pending();
    let mut files: Vec<&SelectedFile> = MediaKind::ALL
        .iter()
        .flat_map(|kind| pending.get(*kind).iter().map(|item| &item.file))
        .collect();
    if let Some(cover) = form.cover_file() {
        files.push(&cover.file);
    }

    let mut encoded = encode_all(&files).await?.into_iter();
    let mut new_media: MediaLists<EncodedFile> = MediaLists::default();
    for kind in MediaKind::ALL {
        let count = pending.get(kind).len();
        new_media.get_mut(kind).extend(encoded.by_ref().take(count));
    }
    let cover = encoded.next().map(EncodedCover::from);

    let draft = form.draft();
    let (id, user_id) = match form.mode() {
        FormMode::Create => (None, user.id.clone()),
        FormMode::Edit {
            journal_id,
            owner_id,
        } => (
            Some(journal_id.clone()),
            owner_id.clone().unwrap_or_else(|| user.id.clone()),
        ),
    };

    Ok(JournalPayload {
        id,
        user_id,
        title: draft.title.clone(),
        description: draft.description.clone(),
        cover_image: if cover.is_some() {
            String::new()
        } else {
            draft.cover_image_url.clone()
        },
        recipe: draft.recipe.clone(),
        new_media,
        existing_media: form.media().existing().clone(),
        cover,
    })
}

/// Submit `form` through `store`.
///
/// Only a form on the media step with a logged-in user (non-empty id) is
/// sent. Makes at most one store call. On success the form moves to `Submitted`;
/// on any failure the form is left exactly as it was so the caller can retry.
pub async fn submit<S, I>(
    form: &mut JournalForm,
    store: &S,
    identity: &I,
) -> Result<SubmissionOutcome, SubmitError>
where
    S: JournalStore,
    I: IdentityProvider + ?Sized,
{
    let user = identity
        .current_user()
        .filter(|user| !user.id.is_empty())
        .ok_or(SubmitError::AuthRequired)?;
    match form.step() {
        FormStep::Media => {}
        FormStep::BasicInfo => return Err(ValidationError::NotOnMediaStep.into()),
        FormStep::Submitted | FormStep::Cancelled => {
            return Err(ValidationError::SessionClosed.into());
        }
    }
    form.draft().validate()?;

    let payload = build_payload(form, user).await?;
    let new_files = payload.new_media.total();

    let response = if payload.is_update() {
        store.update_journal(&payload).await?
    } else {
        store.create_journal(&payload).await?
    };

    if !response.success {
        let fallback = if payload.is_update() {
            "failed to update journal"
        } else {
            "failed to create journal"
        };
        let err = rejected(response.error, fallback);
        tracing::warn!(title = %payload.title, error = %err, "journal submission rejected");
        return Err(err.into());
    }

    let outcome = match payload.id {
        Some(journal_id) => SubmissionOutcome::Updated { journal_id },
        None => SubmissionOutcome::Created {
            journal_id: response
                .journal
                .map(|journal| journal.id)
                .filter(|id| !id.is_empty()),
        },
    };
    tracing::info!(
        journal_id = ?outcome.journal_id(),
        new_files,
        cover_file = payload.cover.is_some(),
        "journal submitted"
    );
    form.mark_submitted();
    Ok(outcome)
}
