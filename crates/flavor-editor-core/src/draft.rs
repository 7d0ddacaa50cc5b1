//! The two-step journal form.
//!
//! Step one collects the text fields, step two the media. Title and
//! description gate the move to step two; nothing else does. Media can be
//! staged from either step.

use smol_str::SmolStr;

use flavor_common::{Journal, MediaKind, MediaRef, Recipe};

use crate::encoder::SelectedFile;
use crate::error::{FormError, ValidationError};
use crate::media::{MIB, MediaCounts, MediaStaging, PendingMedia, Preview, StagingPolicy};

/// Largest cover image accepted.
pub const MAX_COVER_BYTES: u64 = 5 * MIB;

/// Text fields of a journal being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalDraft {
    pub title: String,
    pub description: String,
    /// Cover given as a URL. Empty when there is none or a cover file is staged.
    pub cover_image_url: String,
    pub recipe: Recipe,
}

impl JournalDraft {
    pub fn from_journal(journal: &Journal) -> Self {
        Self {
            title: journal.title.clone(),
            description: journal.description.clone(),
            cover_image_url: journal.cover_image.clone(),
            recipe: journal.recipe.clone().unwrap_or_default(),
        }
    }

    /// Title and description must both have visible content.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "title" });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "description",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    BasicInfo,
    Media,
    Submitted,
    Cancelled,
}

impl FormStep {
    pub fn is_active(&self) -> bool {
        matches!(self, FormStep::BasicInfo | FormStep::Media)
    }
}

/// Whether the form creates a journal or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit {
        journal_id: SmolStr,
        /// Author of the journal, when the snapshot named one.
        owner_id: Option<SmolStr>,
    },
}

impl FormMode {
    pub fn journal_id(&self) -> Option<&SmolStr> {
        match self {
            FormMode::Create => None,
            FormMode::Edit { journal_id, .. } => Some(journal_id),
        }
    }
}

/// A cover image file waiting to be uploaded with the journal.
#[derive(Debug, Clone)]
pub struct CoverFile {
    pub file: SelectedFile,
    pub preview: Preview,
}

/// State of one journal editing session.
#[derive(Debug, Clone)]
pub struct JournalForm {
    mode: FormMode,
    step: FormStep,
    draft: JournalDraft,
    cover_file: Option<CoverFile>,
    media: MediaStaging,
}

impl JournalForm {
    /// Empty form for a new journal.
    pub fn create(policy: StagingPolicy) -> Self {
        Self {
            mode: FormMode::Create,
            step: FormStep::BasicInfo,
            draft: JournalDraft::default(),
            cover_file: None,
            media: MediaStaging::new(policy),
        }
    }

    /// Form seeded from an existing journal.
    pub fn edit(journal: &Journal, policy: StagingPolicy) -> Self {
        let owner_id = Some(journal.user_id.clone()).filter(|id| !id.is_empty());
        Self {
            mode: FormMode::Edit {
                journal_id: journal.id.clone(),
                owner_id,
            },
            step: FormStep::BasicInfo,
            draft: JournalDraft::from_journal(journal),
            cover_file: None,
            media: MediaStaging::seeded(journal.media.clone(), policy),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn draft(&self) -> &JournalDraft {
        &self.draft
    }

    pub fn cover_file(&self) -> Option<&CoverFile> {
        self.cover_file.as_ref()
    }

    pub fn media(&self) -> &MediaStaging {
        &self.media
    }

    pub fn media_counts(&self) -> MediaCounts {
        self.media.counts()
    }

    /// What the cover preview should show: the staged file, else the URL.
    pub fn cover_preview(&self) -> Option<&str> {
        match &self.cover_file {
            Some(cover) => cover.preview.as_data_url(),
            None if !self.draft.cover_image_url.is_empty() => Some(&self.draft.cover_image_url),
            None => None,
        }
    }

    fn ensure_active(&self) -> Result<(), ValidationError> {
        if self.step.is_active() {
            Ok(())
        } else {
            Err(ValidationError::SessionClosed)
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ValidationError> {
        self.ensure_active()?;
        self.draft.title = title.into();
        Ok(())
    }

    pub fn set_description(
        &mut self,
        description: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.ensure_active()?;
        self.draft.description = description.into();
        Ok(())
    }

    /// Edit recipe fields in place.
    pub fn update_recipe(&mut self, f: impl FnOnce(&mut Recipe)) -> Result<(), ValidationError> {
        self.ensure_active()?;
        f(&mut self.draft.recipe);
        Ok(())
    }

    /// Use a URL as the cover. A staged cover file is dropped unless the URL
    /// is empty.
    pub fn set_cover_url(&mut self, url: impl Into<String>) -> Result<(), ValidationError> {
        self.ensure_active()?;
        let url = url.into();
        if !url.is_empty() {
            self.cover_file = None;
        }
        self.draft.cover_image_url = url;
        Ok(())
    }

    /// Stage a cover image file, replacing any cover URL.
    pub async fn select_cover_file(&mut self, file: SelectedFile) -> Result<(), ValidationError> {
        self.ensure_active()?;
        if !file.content_type().starts_with("image/") {
            return Err(ValidationError::CoverNotImage {
                name: file.name().into(),
            });
        }
        if file.size() > MAX_COVER_BYTES {
            return Err(ValidationError::CoverTooLarge {
                name: file.name().into(),
                size: file.size(),
                limit: MAX_COVER_BYTES,
            });
        }

        let preview = Preview::for_file(&file).await;
        self.draft.cover_image_url.clear();
        self.cover_file = Some(CoverFile { file, preview });
        Ok(())
    }

    /// Clear the cover preview, dropping the staged file and any URL.
    pub fn clear_cover(&mut self) -> Result<(), ValidationError> {
        self.ensure_active()?;
        self.cover_file = None;
        self.draft.cover_image_url.clear();
        Ok(())
    }

    /// Move from basic info to media. Refused while title or description is
    /// empty.
    pub fn next(&mut self) -> Result<FormStep, ValidationError> {
        self.ensure_active()?;
        if self.step == FormStep::BasicInfo {
            self.draft.validate()?;
            self.step = FormStep::Media;
        }
        Ok(self.step)
    }

    /// Go back to basic info. Staged media is kept.
    pub fn back(&mut self) -> Result<FormStep, ValidationError> {
        self.ensure_active()?;
        self.step = FormStep::BasicInfo;
        Ok(self.step)
    }

    pub async fn add_media(
        &mut self,
        kind: MediaKind,
        file: SelectedFile,
    ) -> Result<(), ValidationError> {
        self.ensure_active()?;
        self.media.add_pending(kind, file).await
    }

    pub fn remove_pending_media(
        &mut self,
        kind: MediaKind,
        index: usize,
    ) -> Result<PendingMedia, FormError> {
        self.ensure_active()?;
        Ok(self.media.remove_pending(kind, index)?)
    }

    pub fn remove_existing_media(
        &mut self,
        kind: MediaKind,
        index: usize,
    ) -> Result<MediaRef, FormError> {
        self.ensure_active()?;
        Ok(self.media.remove_existing(kind, index)?)
    }

    /// Abandon the session. Draft and staged media are dropped; nothing was
    /// sent anywhere.
    pub fn cancel(&mut self) {
        if self.step.is_active() {
            tracing::debug!(mode = ?self.mode, "journal form cancelled");
        }
        self.step = FormStep::Cancelled;
        self.draft = JournalDraft::default();
        self.cover_file = None;
        self.media = MediaStaging::new(self.media.policy().clone());
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.step = FormStep::Submitted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flavor_common::MediaLists;

    fn filled() -> JournalForm {
        let mut form = JournalForm::create(StagingPolicy::default());
        form.set_title("Ramen Night").unwrap();
        form.set_description("first attempt").unwrap();
        form
    }

    #[test]
    fn advancing_requires_title_and_description() {
        let cases = [
            ("Ramen Night", "first attempt", true),
            ("", "first attempt", false),
            ("Ramen Night", "", false),
            ("   ", "first attempt", false),
            ("", "", false),
        ];
        for (title, description, ok) in cases {
            let mut form = JournalForm::create(StagingPolicy::default());
            form.set_title(title).unwrap();
            form.set_description(description).unwrap();
            let result = form.next();
            assert_eq!(result.is_ok(), ok, "{title:?} / {description:?}");
            let expected = if ok { FormStep::Media } else { FormStep::BasicInfo };
            assert_eq!(form.step(), expected);
        }
    }

    #[test]
    fn missing_field_is_named() {
        let mut form = JournalForm::create(StagingPolicy::default());
        form.set_title("Toast").unwrap();
        assert_eq!(
            form.next(),
            Err(ValidationError::MissingField {
                field: "description"
            })
        );
    }

    #[test]
    fn back_navigation_keeps_draft() {
        let mut form = filled();
        form.next().unwrap();
        assert_eq!(form.back().unwrap(), FormStep::BasicInfo);
        assert_eq!(form.draft().title, "Ramen Night");
        assert_eq!(form.next().unwrap(), FormStep::Media);
    }

    #[tokio::test]
    async fn cover_file_and_url_are_exclusive() {
        let mut form = filled();
        form.set_cover_url("https://cdn.test/cover.jpg").unwrap();
        assert_eq!(form.cover_preview(), Some("https://cdn.test/cover.jpg"));

        let cover = SelectedFile::from_bytes("cover.png", "image/png", vec![0u8, 1, 2]);
        form.select_cover_file(cover).await.unwrap();
        assert!(form.draft().cover_image_url.is_empty());
        assert_eq!(form.cover_preview(), Some("data:image/png;base64,AAEC"));

        form.set_cover_url("https://cdn.test/other.jpg").unwrap();
        assert!(form.cover_file().is_none());

        form.clear_cover().unwrap();
        assert!(form.cover_preview().is_none());
    }

    #[tokio::test]
    async fn cover_must_be_small_image() {
        let mut form = filled();
        let pdf = SelectedFile::from_bytes("menu.pdf", "application/pdf", vec![0u8]);
        assert!(matches!(
            form.select_cover_file(pdf).await,
            Err(ValidationError::CoverNotImage { .. })
        ));

        let huge = SelectedFile::from_bytes(
            "huge.jpg",
            "image/jpeg",
            vec![0u8; (MAX_COVER_BYTES + 1) as usize],
        );
        assert!(matches!(
            form.select_cover_file(huge).await,
            Err(ValidationError::CoverTooLarge { .. })
        ));
        assert!(form.cover_file().is_none());
    }

    #[tokio::test]
    async fn media_can_be_staged_from_either_step() {
        let mut form = JournalForm::create(StagingPolicy::default());
        let photo = SelectedFile::from_bytes("p.jpg", "image/jpeg", vec![1u8]);
        form.add_media(MediaKind::Photos, photo).await.unwrap();
        assert_eq!(form.step(), FormStep::BasicInfo);
        assert_eq!(form.media_counts().photos, 1);
    }

    #[tokio::test]
    async fn cancel_discards_everything_and_closes() {
        let journal = Journal {
            id: "j1".into(),
            user_id: "u1".into(),
            title: "Ramen Night".into(),
            description: "first attempt".into(),
            media: MediaLists {
                photos: vec![MediaRef {
                    id: "p1".into(),
                    url: "https://cdn.test/p1.jpg".into(),
                    title: "p1".into(),
                }],
                ..MediaLists::default()
            },
            ..Journal::default()
        };
        let mut form = JournalForm::edit(&journal, StagingPolicy::default());
        let audio = SelectedFile::from_bytes("a.m4a", "audio/mp4", vec![1u8]);
        form.add_media(MediaKind::Audio, audio).await.unwrap();

        form.cancel();
        assert_eq!(form.step(), FormStep::Cancelled);
        assert_eq!(form.media_counts().total(), 0);
        assert_eq!(form.draft(), &JournalDraft::default());
        assert_eq!(form.set_title("again"), Err(ValidationError::SessionClosed));
        assert_eq!(
            form.remove_existing_media(MediaKind::Photos, 0).unwrap_err(),
            FormError::Validation(ValidationError::SessionClosed)
        );
    }

    #[test]
    fn edit_mode_carries_ids() {
        let journal = Journal {
            id: "j9".into(),
            user_id: String::new().into(),
            title: "Dumplings".into(),
            ..Journal::default()
        };
        let form = JournalForm::edit(&journal, StagingPolicy::default());
        assert_eq!(
            form.mode(),
            &FormMode::Edit {
                journal_id: "j9".into(),
                owner_id: None
            }
        );
        assert_eq!(form.mode().journal_id().map(|id| id.as_str()), Some("j9"));
        assert_eq!(form.draft().title, "Dumplings");
    }
}
