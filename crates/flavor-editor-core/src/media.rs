//! Staging of journal media within one editing session.
//!
//! Each category keeps two halves: media the journal already has (only ever
//! removed) and files picked in this session (uploaded on submit). The halves
//! and the categories are independent of each other.

use flavor_common::{MediaKind, MediaLists, MediaRef};

use crate::encoder::{SelectedFile, data_url};
use crate::error::{RangeError, StagedHalf, ValidationError};

pub const MIB: u64 = 1024 * 1024;

/// Limits and rules applied when staging files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPolicy {
    pub max_photo_bytes: u64,
    pub max_video_bytes: u64,
    pub max_audio_bytes: u64,
    /// Only allow adding to a category that already holds media.
    pub require_existing: bool,
}

impl Default for StagingPolicy {
    fn default() -> Self {
        Self {
            max_photo_bytes: 10 * MIB,
            max_video_bytes: 50 * MIB,
            max_audio_bytes: 10 * MIB,
            require_existing: false,
        }
    }
}

impl StagingPolicy {
    pub fn max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Photos => self.max_photo_bytes,
            MediaKind::Videos => self.max_video_bytes,
            MediaKind::Audio => self.max_audio_bytes,
        }
    }

    pub fn with_require_existing(mut self, require_existing: bool) -> Self {
        self.require_existing = require_existing;
        self
    }
}

/// Local preview of a staged image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    DataUrl(String),
    /// The file couldn't be read for a preview. Shown as a placeholder; the
    /// file stays staged and is read again on submit.
    Placeholder,
}

impl Preview {
    /// Build a preview for `file`. Never fails.
    pub async fn for_file(file: &SelectedFile) -> Self {
        match file.read().await {
            Ok(bytes) => Preview::DataUrl(data_url(file.content_type(), &bytes)),
            Err(e) => {
                tracing::debug!(file = %file.name(), error = %e, "preview unavailable");
                Preview::Placeholder
            }
        }
    }

    pub fn as_data_url(&self) -> Option<&str> {
        match self {
            Preview::DataUrl(url) => Some(url),
            Preview::Placeholder => None,
        }
    }
}

/// A file staged for upload.
#[derive(Debug, Clone)]
pub struct PendingMedia {
    pub file: SelectedFile,
    /// Photos only.
    pub preview: Option<Preview>,
}

/// Existing + pending totals per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaCounts {
    pub photos: usize,
    pub videos: usize,
    pub audio: usize,
}

impl MediaCounts {
    pub fn get(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Photos => self.photos,
            MediaKind::Videos => self.videos,
            MediaKind::Audio => self.audio,
        }
    }

    pub fn total(&self) -> usize {
        self.photos + self.videos + self.audio
    }
}

/// Existing and pending media of one editing session.
#[derive(Debug, Clone, Default)]
pub struct MediaStaging {
    existing: MediaLists<MediaRef>,
    pending: MediaLists<PendingMedia>,
    policy: StagingPolicy,
}

impl MediaStaging {
    pub fn new(policy: StagingPolicy) -> Self {
        Self {
            existing: MediaLists::default(),
            pending: MediaLists::default(),
            policy,
        }
    }

    /// Start from the media a journal already has.
    pub fn seeded(existing: MediaLists<MediaRef>, policy: StagingPolicy) -> Self {
        Self {
            existing,
            pending: MediaLists::default(),
            policy,
        }
    }

    pub fn policy(&self) -> &StagingPolicy {
        &self.policy
    }

    pub fn existing(&self) -> &MediaLists<MediaRef> {
        &self.existing
    }

    pub fn pending(&self) -> &MediaLists<PendingMedia> {
        &self.pending
    }

    /// Whether the policy lets `kind` take another file.
    pub fn upload_allowed(&self, kind: MediaKind) -> bool {
        !self.policy.require_existing || self.count(kind) > 0
    }

    fn count(&self, kind: MediaKind) -> usize {
        self.existing.get(kind).len() + self.pending.get(kind).len()
    }

    /// Check `file` against the rules for `kind` without staging it.
    pub fn check(&self, kind: MediaKind, file: &SelectedFile) -> Result<(), ValidationError> {
        if !self.upload_allowed(kind) {
            return Err(ValidationError::UploadNotAllowed { kind });
        }
        if !kind.accepts(file.content_type()) {
            return Err(ValidationError::WrongKind {
                kind,
                name: file.name().into(),
                content_type: file.content_type().into(),
            });
        }
        let limit = self.policy.max_bytes(kind);
        if file.size() > limit {
            return Err(ValidationError::TooLarge {
                kind,
                name: file.name().into(),
                size: file.size(),
                limit,
            });
        }
        Ok(())
    }

    /// Stage `file` under `kind`.
    ///
    /// Photos get a preview first; the file is appended only once everything
    /// has succeeded, so a rejected file leaves the staging untouched.
    pub async fn add_pending(
        &mut self,
        kind: MediaKind,
        file: SelectedFile,
    ) -> Result<(), ValidationError> {
        self.check(kind, &file)?;

        let preview = match kind {
            MediaKind::Photos => Some(Preview::for_file(&file).await),
            MediaKind::Videos | MediaKind::Audio => None,
        };

        tracing::debug!(%kind, file = %file.name(), size = file.size(), "staged media");
        self.pending.get_mut(kind).push(PendingMedia { file, preview });
        Ok(())
    }

    /// Unstage the pending file at `index`.
    pub fn remove_pending(
        &mut self,
        kind: MediaKind,
        index: usize,
    ) -> Result<PendingMedia, RangeError> {
        let list = self.pending.get_mut(kind);
        if index >= list.len() {
            return Err(RangeError {
                kind,
                half: StagedHalf::Pending,
                index,
                len: list.len(),
            });
        }
        Ok(list.remove(index))
    }

    /// Drop the existing media at `index`. It is removed remotely on submit.
    pub fn remove_existing(&mut self, kind: MediaKind, index: usize) -> Result<MediaRef, RangeError> {
        let list = self.existing.get_mut(kind);
        if index >= list.len() {
            return Err(RangeError {
                kind,
                half: StagedHalf::Existing,
                index,
                len: list.len(),
            });
        }
        Ok(list.remove(index))
    }

    pub fn counts(&self) -> MediaCounts {
        MediaCounts {
            photos: self.count(MediaKind::Photos),
            videos: self.count(MediaKind::Videos),
            audio: self.count(MediaKind::Audio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(name: &str, size: usize) -> SelectedFile {
        SelectedFile::from_bytes(name.to_string(), "image/jpeg", vec![7u8; size])
    }

    fn existing(id: &str) -> MediaRef {
        MediaRef {
            id: id.into(),
            url: format!("https://cdn.test/{id}"),
            title: id.to_string(),
        }
    }

    fn small_policy() -> StagingPolicy {
        StagingPolicy {
            max_photo_bytes: 16,
            max_video_bytes: 64,
            max_audio_bytes: 16,
            require_existing: false,
        }
    }

    #[tokio::test]
    async fn add_within_limit_counts_one_in_that_kind_only() {
        let mut staging = MediaStaging::new(small_policy());
        for kind in MediaKind::ALL {
            let before = staging.counts();
            let file = match kind {
                MediaKind::Photos => photo("p.jpg", 16),
                MediaKind::Videos => SelectedFile::from_bytes("v.mp4", "video/mp4", vec![0u8; 64]),
                MediaKind::Audio => SelectedFile::from_bytes("a.m4a", "audio/mp4", vec![0u8; 1]),
            };
            staging.add_pending(kind, file).await.unwrap();
            let after = staging.counts();
            for other in MediaKind::ALL {
                let expected = before.get(other) + usize::from(other == kind);
                assert_eq!(after.get(other), expected, "{kind} add changed {other}");
            }
        }
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_without_change() {
        let mut staging = MediaStaging::new(small_policy());
        let err = staging
            .add_pending(MediaKind::Photos, photo("big.jpg", 17))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { limit: 16, size: 17, .. }));
        assert_eq!(staging.counts(), MediaCounts::default());

        // Videos get the larger ceiling.
        let video = SelectedFile::from_bytes("v.mp4", "video/mp4", vec![0u8; 17]);
        staging.add_pending(MediaKind::Videos, video).await.unwrap();
        assert_eq!(staging.counts().videos, 1);
    }

    #[tokio::test]
    async fn wrong_kind_is_rejected() {
        let mut staging = MediaStaging::new(small_policy());
        let err = staging
            .add_pending(MediaKind::Audio, photo("p.jpg", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::WrongKind { kind: MediaKind::Audio, .. }));
        assert_eq!(staging.counts().total(), 0);
    }

    #[tokio::test]
    async fn photos_get_previews_others_do_not() {
        let mut staging = MediaStaging::new(small_policy());
        staging.add_pending(MediaKind::Photos, photo("p.jpg", 2)).await.unwrap();
        let audio = SelectedFile::from_bytes("a.m4a", "audio/mp4", vec![1u8]);
        staging.add_pending(MediaKind::Audio, audio).await.unwrap();

        let preview = staging.pending().photos[0].preview.as_ref().unwrap();
        assert_eq!(preview.as_data_url(), Some("data:image/jpeg;base64,Bwc="));
        assert!(staging.pending().audio[0].preview.is_none());
    }

    #[tokio::test]
    async fn removal_by_index_is_stable() {
        let mut staging = MediaStaging::new(small_policy());
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            staging.add_pending(MediaKind::Photos, photo(name, 1)).await.unwrap();
        }

        let first = staging.remove_pending(MediaKind::Photos, 1).unwrap();
        assert_eq!(first.file.name(), "b.jpg");
        let second = staging.remove_pending(MediaKind::Photos, 1).unwrap();
        assert_eq!(second.file.name(), "c.jpg");

        let err = staging.remove_pending(MediaKind::Photos, 1).unwrap_err();
        assert_eq!(err.len, 1);
        assert_eq!(err.half, StagedHalf::Pending);

        let left: Vec<_> = staging.pending().photos.iter().map(|p| p.file.name()).collect();
        assert_eq!(left, ["a.jpg"]);
    }

    #[test]
    fn remove_existing_only_touches_existing_half() {
        let mut lists = MediaLists::default();
        lists.photos = vec![existing("p1"), existing("p2")];
        lists.audio = vec![existing("a1")];
        let mut staging = MediaStaging::seeded(lists, small_policy());

        let removed = staging.remove_existing(MediaKind::Photos, 0).unwrap();
        assert_eq!(removed.id, "p1");
        assert_eq!(staging.existing().photos, vec![existing("p2")]);
        assert_eq!(staging.existing().audio.len(), 1);

        let err = staging.remove_existing(MediaKind::Videos, 0).unwrap_err();
        assert_eq!(err.half, StagedHalf::Existing);
        assert_eq!(staging.counts().total(), 2);
    }

    #[tokio::test]
    async fn require_existing_policy_gates_empty_categories() {
        let mut lists = MediaLists::default();
        lists.photos = vec![existing("p1")];
        let mut staging =
            MediaStaging::seeded(lists, small_policy().with_require_existing(true));

        assert!(staging.upload_allowed(MediaKind::Photos));
        assert!(!staging.upload_allowed(MediaKind::Audio));

        staging.add_pending(MediaKind::Photos, photo("p.jpg", 1)).await.unwrap();
        let audio = SelectedFile::from_bytes("a.m4a", "audio/mp4", vec![1u8]);
        let err = staging.add_pending(MediaKind::Audio, audio).await.unwrap_err();
        assert_eq!(err, ValidationError::UploadNotAllowed { kind: MediaKind::Audio });
    }

    #[derive(Debug)]
    struct Locked;

    impl crate::encoder::ByteSource for Locked {
        fn size(&self) -> u64 {
            16
        }

        fn read(&self) -> crate::encoder::ReadFuture {
            Box::pin(async {
                Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "locked",
                ))
            })
        }
    }

    #[tokio::test]
    async fn unreadable_photo_stages_with_placeholder() {
        let mut staging = MediaStaging::default();
        let file = SelectedFile::new("locked.jpg", "image/jpeg", Locked);
        staging.add_pending(MediaKind::Photos, file).await.unwrap();

        assert_eq!(staging.counts().photos, 1);
        let staged = &staging.pending().photos[0];
        assert_eq!(staged.preview, Some(Preview::Placeholder));
        assert_eq!(staged.file.name(), "locked.jpg");
    }
}
