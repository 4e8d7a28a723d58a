/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the REST client and the UI layer. The backend sends storage
/// items as flat JSON objects discriminated by a `type` string;
/// they are decoded leniently and then classified into the
/// `ItemKind` tagged union so every card renderer only sees the
/// fields that belong to its variant.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A unit of user content: note, task, link, document, event or photo.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageItem {
    /// Backend identifier
    pub id: String,
    /// Type-specific payload
    pub kind: ItemKind,
}

/// Tagged union over the storage item types.
///
/// Items with an unknown or missing `type` fall back to `Generic`,
/// which carries only a display label and a derived date.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Note {
        title: String,
        content: String,
        date: Option<String>,
    },
    Task {
        title: String,
        content: String,
        completed: bool,
        due_date: Option<String>,
        priority: Option<String>,
        date: Option<String>,
    },
    Link {
        title: String,
        url: String,
        description: Option<String>,
        date: Option<String>,
    },
    Document {
        title: String,
        file_name: Option<String>,
        file_type: Option<String>,
        size: Option<u64>,
        date: Option<String>,
    },
    Event {
        title: String,
        date: Option<String>,
        location: Option<String>,
    },
    Photo(PhotoItem),
    Generic {
        label: String,
        date: Option<String>,
    },
}

/// A photo with the metadata produced by the recognition pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoItem {
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: Option<String>,
    pub uri: String,
    pub thumbnail: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// `None` while the external pipeline is still working on the photo
    pub processed_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub faces: Vec<Face>,
    pub media_meta: Vec<MediaMeta>,
}

impl PhotoItem {
    /// A photo can only be opened in the detail view once processed.
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    /// Best URL for grid display: the thumbnail when present, else the full image.
    pub fn thumbnail_url(&self) -> &str {
        self.thumbnail.as_deref().unwrap_or(&self.uri)
    }
}

/// Wire shape of a storage item as the backend sends it.
///
/// Every field except `id` is optional so that a half-filled or
/// unknown item never fails the whole list decode.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStorageItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "face", default)]
    pub faces: Vec<Face>,
    #[serde(default)]
    pub media_meta: Vec<MediaMeta>,
}

impl RawStorageItem {
    fn derived_date(&self) -> Option<String> {
        self.date.clone().or_else(|| {
            self.created_at
                .map(|ts| ts.format("%Y-%m-%d").to_string())
        })
    }
}

impl From<RawStorageItem> for StorageItem {
    fn from(raw: RawStorageItem) -> Self {
        let date = raw.derived_date();
        let kind = match raw.item_type.as_deref() {
            Some("NOTE") => ItemKind::Note {
                title: raw.title.unwrap_or_default(),
                content: raw.content.unwrap_or_default(),
                date,
            },
            Some("TASK") => ItemKind::Task {
                title: raw.title.unwrap_or_default(),
                content: raw.content.unwrap_or_default(),
                completed: raw.completed.unwrap_or(false),
                due_date: raw.due_date,
                priority: raw.priority,
                date,
            },
            Some("LINK") => ItemKind::Link {
                title: raw.title.unwrap_or_default(),
                url: raw.url.unwrap_or_default(),
                description: raw.description,
                date,
            },
            Some("DOCUMENT") => ItemKind::Document {
                title: raw.title.or_else(|| raw.file_name.clone()).unwrap_or_default(),
                file_name: raw.file_name,
                file_type: raw.file_type,
                size: raw.size.or(raw.file_size),
                date,
            },
            Some("EVENT") => ItemKind::Event {
                title: raw.title.unwrap_or_default(),
                date,
                location: raw.location,
            },
            Some("PHOTO") => ItemKind::Photo(PhotoItem {
                file_name: raw.file_name.unwrap_or_default(),
                file_size: raw.file_size.or(raw.size).unwrap_or(0),
                mime_type: raw.mime_type,
                uri: raw.uri.unwrap_or_default(),
                thumbnail: raw.thumbnail,
                created_at: raw.created_at,
                processed_at: raw.processed_at,
                source: raw.source,
                faces: raw.faces,
                media_meta: raw.media_meta,
            }),
            _ => ItemKind::Generic {
                // fileName ?? title, matching the generic card
                label: raw
                    .file_name
                    .or(raw.title)
                    .unwrap_or_else(|| "Untitled".to_string()),
                date,
            },
        };

        StorageItem { id: raw.id, kind }
    }
}

/// Client-side filter over storage item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    All,
    Note,
    Task,
    Link,
    Document,
    Event,
    Photo,
}

impl ItemFilter {
    pub const ALL: [ItemFilter; 7] = [
        ItemFilter::All,
        ItemFilter::Note,
        ItemFilter::Task,
        ItemFilter::Link,
        ItemFilter::Document,
        ItemFilter::Event,
        ItemFilter::Photo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ItemFilter::All => "All",
            ItemFilter::Note => "Notes",
            ItemFilter::Task => "Tasks",
            ItemFilter::Link => "Links",
            ItemFilter::Document => "Documents",
            ItemFilter::Event => "Events",
            ItemFilter::Photo => "Photos",
        }
    }

    pub fn matches(self, kind: &ItemKind) -> bool {
        match (self, kind) {
            (ItemFilter::All, _) => true,
            (ItemFilter::Note, ItemKind::Note { .. }) => true,
            (ItemFilter::Task, ItemKind::Task { .. }) => true,
            (ItemFilter::Link, ItemKind::Link { .. }) => true,
            (ItemFilter::Document, ItemKind::Document { .. }) => true,
            (ItemFilter::Event, ItemKind::Event { .. }) => true,
            (ItemFilter::Photo, ItemKind::Photo(_)) => true,
            _ => false,
        }
    }
}

/// Filter a list of items down to the kinds matching `filter`.
/// `ItemFilter::All` returns the unfiltered set.
pub fn filter_items(items: &[StorageItem], filter: ItemFilter) -> Vec<&StorageItem> {
    items
        .iter()
        .filter(|item| filter.matches(&item.kind))
        .collect()
}

/// Item type offered in the Add Item modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Note,
    Task,
    Link,
    Document,
    Event,
    Photo,
}

impl ItemType {
    pub const ALL: [ItemType; 6] = [
        ItemType::Note,
        ItemType::Task,
        ItemType::Link,
        ItemType::Document,
        ItemType::Event,
        ItemType::Photo,
    ];

    /// Whether this type is created by uploading a file.
    pub fn needs_file(self) -> bool {
        matches!(self, ItemType::Document | ItemType::Photo)
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ItemType::Note => "Note",
            ItemType::Task => "Task",
            ItemType::Link => "Link",
            ItemType::Document => "Document",
            ItemType::Event => "Event",
            ItemType::Photo => "Photo",
        };
        write!(f, "{name}")
    }
}

impl From<ItemFilter> for ItemType {
    /// Preselects the modal's type from the active filter tab.
    fn from(filter: ItemFilter) -> Self {
        match filter {
            ItemFilter::Task => ItemType::Task,
            ItemFilter::Link => ItemType::Link,
            ItemFilter::Document => ItemType::Document,
            ItemFilter::Event => ItemType::Event,
            ItemFilter::Photo => ItemType::Photo,
            _ => ItemType::Note,
        }
    }
}

/// An identity record a detected face may be linked to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: PersonKind,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub profile_picture: Option<ProfilePicture>,
}

impl Person {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown Person")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonKind {
    #[default]
    Person,
    Celebrity,
    /// Unrecognized `type` string; decoded leniently so one odd record
    /// cannot fail a whole people page.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfilePicture {
    #[serde(rename = "s3Url", default)]
    pub s3_url: Option<String>,
}

/// A detected face region within a photo, optionally linked to a person.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    pub id: String,
    #[serde(default)]
    pub person: Option<Person>,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub emotions: Vec<String>,
}

impl Face {
    pub fn display_name(&self) -> &str {
        self.person
            .as_ref()
            .map(Person::display_name)
            .unwrap_or("Unknown")
    }
}

/// Face region as a fraction (0-1) of the image dimensions.
/// The recognition pipeline emits capitalized keys.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "Top")]
    pub top: f32,
    #[serde(rename = "Left")]
    pub left: f32,
    #[serde(rename = "Width")]
    pub width: f32,
    #[serde(rename = "Height")]
    pub height: f32,
}

/// Auxiliary analysis output attached to a photo.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MediaMeta {
    #[serde(rename = "LABEL")]
    Label(Vec<LabelEntry>),
    #[serde(rename = "OCR")]
    Ocr(OcrPayload),
    #[serde(rename = "CONTENT_MODERATION")]
    ContentModeration(Vec<LabelEntry>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Confidence", default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OcrPayload {
    #[serde(default)]
    pub text: String,
}

/// Pagination metadata returned by the people endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> StorageItem {
        let raw: RawStorageItem = serde_json::from_str(json).unwrap();
        raw.into()
    }

    #[test]
    fn test_note_classification() {
        let item = item(r#"{"id":"1","type":"NOTE","title":"Groceries","content":"milk"}"#);
        assert!(matches!(
            item.kind,
            ItemKind::Note { ref title, .. } if title == "Groceries"
        ));
    }

    #[test]
    fn test_unknown_type_falls_back_to_generic() {
        let item = item(r#"{"id":"2","type":"WIDGET","fileName":"a.bin","createdAt":"2024-05-01T10:00:00Z"}"#);
        match item.kind {
            ItemKind::Generic { label, date } => {
                assert_eq!(label, "a.bin");
                assert_eq!(date.as_deref(), Some("2024-05-01"));
            }
            other => panic!("expected generic, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_prefers_file_name_over_title() {
        let item = item(r#"{"id":"3","fileName":"report.bin","title":"Report"}"#);
        assert!(matches!(
            item.kind,
            ItemKind::Generic { ref label, .. } if label == "report.bin"
        ));
    }

    #[test]
    fn test_document_title_defaults_to_file_name() {
        let item = item(r#"{"id":"4","type":"DOCUMENT","fileName":"taxes.pdf","size":2048}"#);
        assert!(matches!(
            item.kind,
            ItemKind::Document { ref title, .. } if title == "taxes.pdf"
        ));
    }

    #[test]
    fn test_unprocessed_photo() {
        let item = item(
            r#"{"id":"5","type":"PHOTO","fileName":"beach.jpg","fileSize":1000,
                "uri":"https://cdn/p/5.jpg","createdAt":"2024-01-02T03:04:05Z"}"#,
        );
        match item.kind {
            ItemKind::Photo(photo) => {
                assert!(!photo.is_processed());
                assert_eq!(photo.thumbnail_url(), "https://cdn/p/5.jpg");
            }
            other => panic!("expected photo, got {other:?}"),
        }
    }

    #[test]
    fn test_photo_with_faces_and_meta() {
        let item = item(
            r#"{"id":"6","type":"PHOTO","fileName":"crowd.jpg","fileSize":9000,
                "uri":"u","processedAt":"2024-01-03T00:00:00Z",
                "face":[{"id":"f1","boundingBox":{"Top":0.1,"Left":0.2,"Width":0.3,"Height":0.4},
                         "gender":"FEMALE","age":30,"emotions":["HAPPY"],
                         "person":{"id":"p1","name":"Ada","type":"CELEBRITY"}}],
                "mediaMeta":[{"type":"LABEL","payload":[{"Name":"Beach","Confidence":99.1}]},
                             {"type":"OCR","payload":{"text":"EXIT"}},
                             {"type":"CONTENT_MODERATION","payload":[]}]}"#,
        );
        let ItemKind::Photo(photo) = item.kind else {
            panic!("expected photo");
        };
        assert!(photo.is_processed());
        let face = &photo.faces[0];
        assert_eq!(face.display_name(), "Ada");
        assert_eq!(face.person.as_ref().unwrap().kind, PersonKind::Celebrity);
        let bbox = face.bounding_box.unwrap();
        assert!((bbox.width - 0.3).abs() < f32::EPSILON);
        assert_eq!(photo.media_meta.len(), 3);
        assert!(matches!(
            photo.media_meta[1],
            MediaMeta::Ocr(ref p) if p.text == "EXIT"
        ));
    }

    #[test]
    fn test_unrecognized_person_kind_decodes() {
        let person: Person =
            serde_json::from_str(r#"{"id":"p1","name":"Ada","type":"PET"}"#).unwrap();
        assert_eq!(person.kind, PersonKind::Unknown);

        let person: Person = serde_json::from_str(r#"{"id":"p2","name":"Bob"}"#).unwrap();
        assert_eq!(person.kind, PersonKind::Person);
    }

    #[test]
    fn test_filter_returns_only_matching_kind() {
        let items = vec![
            item(r#"{"id":"1","type":"NOTE","title":"a"}"#),
            item(r#"{"id":"2","type":"TASK","title":"b"}"#),
            item(r#"{"id":"3","type":"NOTE","title":"c"}"#),
        ];

        let notes = filter_items(&items, ItemFilter::Note);
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|i| ItemFilter::Note.matches(&i.kind)));

        let photos = filter_items(&items, ItemFilter::Photo);
        assert!(photos.is_empty());
    }

    #[test]
    fn test_filter_all_is_identity() {
        let items = vec![
            item(r#"{"id":"1","type":"NOTE","title":"a"}"#),
            item(r#"{"id":"2","type":"EVENT","title":"b"}"#),
        ];
        assert_eq!(filter_items(&items, ItemFilter::All).len(), items.len());
    }

    #[test]
    fn test_filter_tab_preselects_modal_type() {
        assert_eq!(ItemType::from(ItemFilter::Photo), ItemType::Photo);
        assert_eq!(ItemType::from(ItemFilter::All), ItemType::Note);
    }
}
