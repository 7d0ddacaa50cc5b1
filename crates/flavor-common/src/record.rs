//! Journal records as the hosted workflows return them.
//!
//! The workflows are loose about representation: a recipe or a media list may
//! arrive as a structured JSON value, as a JSON document encoded in a string,
//! or not at all, and ids may be numbers. Everything is normalized here, once,
//! during deserialization. Code past this module only ever sees the canonical
//! types.

use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

/// The three media categories a journal carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photos,
    Videos,
    Audio,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Photos, MediaKind::Videos, MediaKind::Audio];

    /// Wire name, also used as the `mediaType` of direct uploads.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photos => "photos",
            MediaKind::Videos => "videos",
            MediaKind::Audio => "audio",
        }
    }

    /// Top-level MIME type accepted for this category.
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            MediaKind::Photos => "image/",
            MediaKind::Videos => "video/",
            MediaKind::Audio => "audio/",
        }
    }

    /// Whether a declared content type fits this category.
    ///
    /// An empty content type means the browser (or the OS) didn't know, and is
    /// let through; the remote side sniffs it again anyway.
    pub fn accepts(&self, content_type: &str) -> bool {
        content_type.is_empty() || content_type.starts_with(self.mime_prefix())
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per media category.
///
/// Used for the staged halves, the wire lists, and the per-category counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct MediaLists<T> {
    #[serde(default)]
    pub photos: Vec<T>,
    #[serde(default)]
    pub videos: Vec<T>,
    #[serde(default)]
    pub audio: Vec<T>,
}

impl<T> Default for MediaLists<T> {
    fn default() -> Self {
        Self {
            photos: Vec::new(),
            videos: Vec::new(),
            audio: Vec::new(),
        }
    }
}

impl<T> MediaLists<T> {
    pub fn get(&self, kind: MediaKind) -> &Vec<T> {
        match kind {
            MediaKind::Photos => &self.photos,
            MediaKind::Videos => &self.videos,
            MediaKind::Audio => &self.audio,
        }
    }

    pub fn get_mut(&mut self, kind: MediaKind) -> &mut Vec<T> {
        match kind {
            MediaKind::Photos => &mut self.photos,
            MediaKind::Videos => &mut self.videos,
            MediaKind::Audio => &mut self.audio,
        }
    }

    /// Iterate categories in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (MediaKind, &Vec<T>)> {
        MediaKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Total number of items across all categories.
    pub fn total(&self) -> usize {
        self.photos.len() + self.videos.len() + self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Recipe attached to a journal. Every field is free text and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default, deserialize_with = "lenient_string")]
    pub ingredients: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub steps: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cooking_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub servings: String,
}

impl Recipe {
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
            && self.steps.is_empty()
            && self.cooking_time.is_empty()
            && self.servings.is_empty()
    }
}

/// Reference to media the remote side already stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(default, deserialize_with = "lenient_smolstr")]
    pub id: SmolStr,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
}

/// A journal as returned by the list/get/create workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    #[serde(default, deserialize_with = "lenient_smolstr")]
    pub id: SmolStr,
    #[serde(default, deserialize_with = "lenient_smolstr")]
    pub user_id: SmolStr,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cover_image: String,
    #[serde(default, deserialize_with = "lenient_recipe")]
    pub recipe: Option<Recipe>,
    #[serde(default, deserialize_with = "lenient_media")]
    pub media: MediaLists<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A registered user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "lenient_smolstr")]
    pub id: SmolStr,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
}

/// Strings, numbers and booleans become their text; null becomes empty.
fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(value))
}

pub(crate) fn lenient_smolstr<'de, D>(deserializer: D) -> Result<SmolStr, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(SmolStr::from)
}

/// Unwrap a JSON document that was shipped inside a string.
///
/// Unparsable strings become `Null`, matching how the workflows treat them.
fn unwrap_encoded(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "discarding unparsable encoded field");
            serde_json::Value::Null
        }),
        other => other,
    }
}

/// Normalize a recipe field. Absent, empty or malformed recipes become `None`.
pub fn normalize_recipe(value: serde_json::Value) -> Option<Recipe> {
    match unwrap_encoded(value) {
        value @ serde_json::Value::Object(_) => serde_json::from_value::<Recipe>(value).ok(),
        _ => None,
    }
}

/// Normalize one media list. Non-list values become an empty list and items
/// that aren't objects are skipped.
pub fn normalize_media_list(value: serde_json::Value) -> Vec<MediaRef> {
    match unwrap_encoded(value) {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalize the media object of a journal.
pub fn normalize_media(value: serde_json::Value) -> MediaLists<MediaRef> {
    match unwrap_encoded(value) {
        serde_json::Value::Object(mut map) => {
            let mut take = |key: &str| {
                normalize_media_list(map.remove(key).unwrap_or(serde_json::Value::Null))
            };
            MediaLists {
                photos: take("photos"),
                videos: take("videos"),
                audio: take("audio"),
            }
        }
        _ => MediaLists::default(),
    }
}

fn lenient_recipe<'de, D>(deserializer: D) -> Result<Option<Recipe>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(normalize_recipe(value))
}

fn lenient_media<'de, D>(deserializer: D) -> Result<MediaLists<MediaRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(normalize_media(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recipe_from_object_or_string() {
        let structured = normalize_recipe(json!({
            "ingredients": "noodles, broth",
            "cookingTime": "45 min",
            "servings": 2
        }))
        .unwrap();
        assert_eq!(structured.ingredients, "noodles, broth");
        assert_eq!(structured.cooking_time, "45 min");
        assert_eq!(structured.servings, "2");
        assert_eq!(structured.steps, "");

        let encoded = normalize_recipe(json!(
            "{\"ingredients\":\"noodles, broth\",\"cookingTime\":\"45 min\",\"servings\":2}"
        ))
        .unwrap();
        assert_eq!(encoded, structured);
    }

    #[test]
    fn malformed_recipe_is_none() {
        assert_eq!(normalize_recipe(json!("{not json")), None);
        assert_eq!(normalize_recipe(json!(null)), None);
        assert_eq!(normalize_recipe(json!([1, 2])), None);
    }

    #[test]
    fn media_lists_accept_strings_arrays_and_garbage() {
        let media = normalize_media(json!({
            "photos": [{"id": 7, "url": "https://cdn.test/a.jpg", "title": "a"}],
            "videos": "[{\"id\":\"v1\",\"url\":\"https://cdn.test/v.mp4\",\"title\":\"v\"}]",
            "audio": "nonsense"
        }));
        assert_eq!(media.photos.len(), 1);
        assert_eq!(media.photos[0].id, "7");
        assert_eq!(media.videos.len(), 1);
        assert_eq!(media.videos[0].url, "https://cdn.test/v.mp4");
        assert!(media.audio.is_empty());
    }

    #[test]
    fn journal_normalizes_at_the_boundary() {
        let journal: Journal = serde_json::from_value(json!({
            "id": "j1",
            "userId": "u1",
            "title": "Ramen Night",
            "description": "first attempt",
            "coverImage": null,
            "recipe": "{\"steps\":\"boil\"}",
            "media": "{\"photos\":[{\"id\":\"p1\",\"url\":\"u\",\"title\":\"t\"}]}"
        }))
        .unwrap();

        assert_eq!(journal.cover_image, "");
        assert_eq!(journal.recipe.unwrap().steps, "boil");
        assert_eq!(journal.media.photos.len(), 1);
        assert!(journal.media.videos.is_empty());
    }

    #[test]
    fn journal_without_media_has_empty_lists() {
        let journal: Journal = serde_json::from_value(json!({
            "id": 12,
            "title": "Toast"
        }))
        .unwrap();
        assert_eq!(journal.id, "12");
        assert!(journal.media.is_empty());
        assert!(journal.recipe.is_none());
    }

    #[test]
    fn kind_accepts_matching_prefix() {
        assert!(MediaKind::Photos.accepts("image/png"));
        assert!(!MediaKind::Photos.accepts("video/mp4"));
        assert!(MediaKind::Audio.accepts(""));
        assert!(MediaKind::Videos.accepts("video/webm"));
    }

    #[test]
    fn lists_index_by_kind() {
        let mut lists: MediaLists<u8> = MediaLists::default();
        lists.get_mut(MediaKind::Audio).push(1);
        assert_eq!(lists.get(MediaKind::Audio), &vec![1]);
        assert_eq!(lists.total(), 1);
        let kinds: Vec<_> = lists.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, MediaKind::ALL.to_vec());
    }
}
