/// Add Item modal
///
/// The one real state machine in the app:
///
/// ```text
/// Closed -> Open(Note) -> { FileSelected | Validating
///        | Uploading(0-100) | Success -> Closed | Error -> Open }
/// ```
///
/// Entry points: the search bar's Add button, the active filter tab,
/// or a file dropped anywhere on the window (image/* opens as Photo,
/// anything else as Document). Switching the item type resets the
/// selected file and any error. Photos are validated for MIME and the
/// configured size limit and must decode into a preview before submit
/// is enabled; documents get a title defaulting to the file name.
/// Upload progress is real transfer progress, streamed from the API
/// layer and cancelled if the modal closes mid-flight.

use iced::widget::{
    button, column, container, horizontal_space, image as image_widget, pick_list, progress_bar,
    row, text, text_input,
};
use iced::{Alignment, Element, Length, Task};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

use crate::api::upload::{self, UploadEvent};
use crate::api::Client;
use crate::state::data::ItemType;
use crate::ui;

const MB: u64 = 1024 * 1024;

/// Client-side validation limits, taken from the config.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub photo_bytes: u64,
    pub document_bytes: u64,
}

/// A file that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: String,
}

#[derive(Debug, Clone)]
pub struct Validated {
    pub file: SelectedFile,
    /// Decoded preview, present for photos
    pub preview: Option<image_widget::Handle>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Validating,
    Uploading(f32),
    Success,
}

#[derive(Debug, Clone)]
pub enum Message {
    TypeSelected(ItemType),
    TitleChanged(String),
    BrowseFile,
    FilePicked(Option<PathBuf>),
    FileValidated(Result<Validated, String>),
    ClearFile,
    Submit,
    Upload(UploadEvent),
    FinishClose,
    Cancel,
}

/// What the parent list view should do after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    /// Upload landed; re-fetch the list (the modal lingers 500 ms)
    ItemAdded,
    /// Re-fetch the list and remove the modal right away
    Finished,
    /// Remove the modal
    Close,
}

pub struct AddItemModal {
    client: Client,
    limits: UploadLimits,
    item_type: ItemType,
    title: String,
    file: Option<SelectedFile>,
    preview: Option<image_widget::Handle>,
    phase: Phase,
    error: Option<String>,
    upload: Option<iced::task::Handle>,
}

impl AddItemModal {
    pub fn new(
        client: Client,
        limits: UploadLimits,
        item_type: ItemType,
        initial_file: Option<PathBuf>,
    ) -> (Self, Task<Message>) {
        let mut modal = Self {
            client,
            limits,
            item_type,
            title: String::new(),
            file: None,
            preview: None,
            phase: Phase::Idle,
            error: None,
            upload: None,
        };

        let task = match initial_file {
            Some(path) => modal.begin_validation(path),
            None => Task::none(),
        };
        (modal, task)
    }

    pub fn update(&mut self, message: Message) -> (Task<Message>, Action) {
        match message {
            Message::TypeSelected(item_type) => {
                // Switching type discards the previous selection and error.
                self.item_type = item_type;
                self.file = None;
                self.preview = None;
                self.error = None;
                if !matches!(self.phase, Phase::Uploading(_)) {
                    self.phase = Phase::Idle;
                }
                (Task::none(), Action::None)
            }
            Message::TitleChanged(title) => {
                self.title = title;
                (Task::none(), Action::None)
            }
            Message::BrowseFile => {
                let item_type = self.item_type;
                (
                    Task::perform(pick_file(item_type), Message::FilePicked),
                    Action::None,
                )
            }
            Message::FilePicked(Some(path)) => (self.begin_validation(path), Action::None),
            Message::FilePicked(None) => (Task::none(), Action::None),
            Message::FileValidated(Ok(validated)) => {
                self.phase = Phase::Idle;
                self.error = None;
                if self.item_type == ItemType::Document && self.title.trim().is_empty() {
                    self.title = validated.file.name.clone();
                }
                self.preview = validated.preview;
                self.file = Some(validated.file);
                (Task::none(), Action::None)
            }
            Message::FileValidated(Err(message)) => {
                self.phase = Phase::Idle;
                self.file = None;
                self.preview = None;
                self.error = Some(message);
                (Task::none(), Action::None)
            }
            Message::ClearFile => {
                self.file = None;
                self.preview = None;
                (Task::none(), Action::None)
            }
            Message::Submit => {
                if !self.can_submit() {
                    return (Task::none(), Action::None);
                }
                if self.item_type.needs_file() {
                    let path = match &self.file {
                        Some(file) => file.path.clone(),
                        None => return (Task::none(), Action::None),
                    };
                    self.phase = Phase::Uploading(0.0);
                    self.error = None;

                    let stream = upload::upload_file(self.client.clone(), path);
                    let (task, handle) = Task::run(stream, Message::Upload).abortable();
                    self.upload = Some(handle);
                    (task, Action::None)
                } else {
                    // Title-only kinds have no upload endpoint; the list
                    // view just re-fetches.
                    (Task::none(), Action::Finished)
                }
            }
            Message::Upload(UploadEvent::Progress(percent)) => {
                self.phase = Phase::Uploading(percent);
                (Task::none(), Action::None)
            }
            Message::Upload(UploadEvent::Done(Ok(()))) => {
                self.phase = Phase::Success;
                self.upload = None;
                // Leave the completed bar on screen briefly before
                // closing. The sleep is built inside the future so no
                // runtime is needed until the task actually runs.
                let linger = Task::perform(
                    async { tokio::time::sleep(Duration::from_millis(500)).await },
                    |_| Message::FinishClose,
                );
                (linger, Action::ItemAdded)
            }
            Message::Upload(UploadEvent::Done(Err(err))) => {
                error!("upload failed: {err}");
                self.phase = Phase::Idle;
                self.upload = None;
                self.error = Some("Failed to upload file. Please try again.".to_string());
                (Task::none(), Action::None)
            }
            Message::FinishClose => (Task::none(), Action::Close),
            Message::Cancel => {
                if let Some(handle) = self.upload.take() {
                    handle.abort();
                }
                (Task::none(), Action::Close)
            }
        }
    }

    /// Route a file dropped on the window into validation.
    pub fn receive_drop(&mut self, path: PathBuf) -> Task<Message> {
        if matches!(self.phase, Phase::Uploading(_) | Phase::Success) {
            return Task::none();
        }
        self.begin_validation(path)
    }

    fn begin_validation(&mut self, path: PathBuf) -> Task<Message> {
        self.phase = Phase::Validating;
        self.error = None;
        Task::perform(
            inspect(path, self.item_type, self.limits),
            Message::FileValidated,
        )
    }

    fn can_submit(&self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        match self.item_type {
            ItemType::Photo => self.file.is_some(),
            ItemType::Document => self.file.is_some() && !self.title.trim().is_empty(),
            _ => !self.title.trim().is_empty(),
        }
    }

    #[cfg(test)]
    fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let header = row![
            text("Add New Item").size(20),
            horizontal_space(),
            button(text("X")).style(button::text).on_press(Message::Cancel),
        ]
        .align_y(Alignment::Center);

        let type_picker = column![
            text("Item Type").size(14),
            pick_list(
                &ItemType::ALL[..],
                Some(self.item_type),
                Message::TypeSelected
            )
            .width(Length::Fill),
        ]
        .spacing(6);

        let body: Element<'_, Message> = match self.item_type {
            ItemType::Photo => self.photo_body(),
            ItemType::Document => self.document_body(),
            _ => self.title_body(),
        };

        let mut content = column![header, type_picker, body].spacing(16);

        if let Some(message) = &self.error {
            content = content.push(ui::error_text(message));
        }

        if matches!(self.phase, Phase::Uploading(_) | Phase::Success) {
            let percent = match self.phase {
                Phase::Uploading(p) => p,
                _ => 100.0,
            };
            let label = if percent >= 100.0 {
                "Upload complete!".to_string()
            } else {
                format!("Uploading: {percent:.0}%")
            };
            content = content.push(
                column![
                    progress_bar(0.0..=100.0, percent).height(8),
                    text(label).size(12),
                ]
                .spacing(4),
            );
        }

        let uploading = matches!(self.phase, Phase::Uploading(_));
        let mut submit = button(text(if uploading { "Uploading..." } else { "Create" }));
        if self.can_submit() {
            submit = submit.on_press(Message::Submit);
        }

        content = content.push(
            row![
                horizontal_space(),
                button(text("Cancel"))
                    .style(button::secondary)
                    .on_press(Message::Cancel),
                submit,
            ]
            .spacing(8),
        );

        container(content)
            .width(440)
            .padding(24)
            .style(ui::card_style)
            .into()
    }

    fn photo_body(&self) -> Element<'_, Message> {
        match (&self.preview, &self.file) {
            (Some(handle), Some(_)) => column![
                image_widget(handle.clone())
                    .width(Length::Fill)
                    .height(200),
                row![
                    horizontal_space(),
                    button(text("Remove"))
                        .style(button::danger)
                        .on_press(Message::ClearFile),
                ],
            ]
            .spacing(8)
            .into(),
            _ => {
                let hint = format!(
                    "Supports: JPG, PNG, GIF (up to {}MB)",
                    self.limits.photo_bytes / MB
                );
                column![
                    button(
                        column![
                            text("Drop your photo here or click to browse"),
                            text(hint).size(12),
                        ]
                        .spacing(4)
                        .align_x(Alignment::Center)
                        .width(Length::Fill)
                    )
                    .style(button::secondary)
                    .padding(32)
                    .width(Length::Fill)
                    .on_press(Message::BrowseFile),
                ]
                .into()
            }
        }
    }

    fn document_body(&self) -> Element<'_, Message> {
        let title_input = column![
            text("Document Title").size(14),
            text_input("Enter document title", &self.title)
                .on_input(Message::TitleChanged)
                .padding(8),
        ]
        .spacing(6);

        let file_area: Element<'_, Message> = match &self.file {
            Some(file) => container(
                row![
                    column![
                        text(file.name.clone()),
                        text(ui::format_size(file.size)).size(12),
                    ]
                    .spacing(2),
                    horizontal_space(),
                    button(text("X"))
                        .style(button::text)
                        .on_press(Message::ClearFile),
                ]
                .align_y(Alignment::Center),
            )
            .padding(12)
            .width(Length::Fill)
            .style(ui::card_style)
            .into(),
            None => {
                let hint = format!(
                    "Drop a file here or click to browse (max {}MB)",
                    self.limits.document_bytes / MB
                );
                button(text(hint).width(Length::Fill))
                    .style(button::secondary)
                    .padding(24)
                    .width(Length::Fill)
                    .on_press(Message::BrowseFile)
                    .into()
            }
        };

        column![title_input, file_area].spacing(12).into()
    }

    fn title_body(&self) -> Element<'_, Message> {
        column![
            text("Title").size(14),
            text_input("Enter title", &self.title)
                .on_input(Message::TitleChanged)
                .on_submit(Message::Submit)
                .padding(8),
        ]
        .spacing(6)
        .into()
    }
}

async fn pick_file(item_type: ItemType) -> Option<PathBuf> {
    let mut dialog = rfd::AsyncFileDialog::new().set_title("Select File");
    if item_type == ItemType::Photo {
        dialog = dialog.add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"]);
    }
    dialog
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

/// Read and validate a file off the UI thread. Photos must decode,
/// which also produces the preview shown before submitting.
async fn inspect(
    path: PathBuf,
    item_type: ItemType,
    limits: UploadLimits,
) -> Result<Validated, String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|err| format!("Could not read file: {err}"))?;
    let size = metadata.len();
    let mime = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    validate(item_type, &mime, size, limits)?;

    let preview = if item_type == ItemType::Photo {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| format!("Could not read file: {err}"))?;
        image::load_from_memory(&bytes)
            .map_err(|_| "Please select an image file (JPG, PNG, etc.)".to_string())?;
        Some(image_widget::Handle::from_bytes(bytes))
    } else {
        None
    };

    Ok(Validated {
        file: SelectedFile {
            path,
            name,
            size,
            mime,
        },
        preview,
    })
}

/// Pure validation rules, shared by picker and drop paths.
fn validate(
    item_type: ItemType,
    mime: &str,
    size: u64,
    limits: UploadLimits,
) -> Result<(), String> {
    match item_type {
        ItemType::Photo => {
            if !mime.starts_with("image/") {
                return Err("Please select an image file (JPG, PNG, etc.)".to_string());
            }
            if size > limits.photo_bytes {
                return Err(format!(
                    "File size exceeds {}MB limit",
                    limits.photo_bytes / MB
                ));
            }
            Ok(())
        }
        ItemType::Document => {
            if size > limits.document_bytes {
                return Err(format!(
                    "File size exceeds {}MB limit",
                    limits.document_bytes / MB
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: UploadLimits = UploadLimits {
        photo_bytes: 300 * MB,
        document_bytes: 300 * MB,
    };

    fn modal(item_type: ItemType) -> AddItemModal {
        let client = Client::new("http://localhost:1", None);
        AddItemModal::new(client, LIMITS, item_type, None).0
    }

    fn validated(name: &str, size: u64, preview: bool) -> Validated {
        Validated {
            file: SelectedFile {
                path: PathBuf::from(name),
                name: name.to_string(),
                size,
                mime: "image/png".to_string(),
            },
            preview: preview.then(|| image_widget::Handle::from_bytes(vec![0u8; 4])),
        }
    }

    #[test]
    fn test_photo_mime_rejected() {
        let err = validate(ItemType::Photo, "application/pdf", 10, LIMITS).unwrap_err();
        assert!(err.contains("image file"));
    }

    #[test]
    fn test_photo_size_limit() {
        let err = validate(ItemType::Photo, "image/png", 300 * MB + 1, LIMITS).unwrap_err();
        assert!(err.contains("300MB"));
        assert!(validate(ItemType::Photo, "image/png", 300 * MB, LIMITS).is_ok());
    }

    #[test]
    fn test_configurable_photo_limit() {
        let small = UploadLimits {
            photo_bytes: 5 * MB,
            document_bytes: 300 * MB,
        };
        let err = validate(ItemType::Photo, "image/jpeg", 6 * MB, small).unwrap_err();
        assert!(err.contains("5MB"));
    }

    #[test]
    fn test_document_size_limit_and_other_kinds_pass() {
        assert!(validate(ItemType::Document, "text/plain", 301 * MB, LIMITS).is_err());
        assert!(validate(ItemType::Document, "text/plain", 10 * 1024, LIMITS).is_ok());
        assert!(validate(ItemType::Note, "", 0, LIMITS).is_ok());
    }

    #[test]
    fn test_oversized_photo_keeps_submit_disabled() {
        let mut modal = modal(ItemType::Photo);
        let (_, _) = modal.update(Message::FileValidated(Err(
            "File size exceeds 300MB limit".to_string(),
        )));
        assert!(!modal.can_submit());
        assert_eq!(
            modal.error.as_deref(),
            Some("File size exceeds 300MB limit")
        );
    }

    #[test]
    fn test_valid_photo_enables_submit_with_preview() {
        let mut modal = modal(ItemType::Photo);
        let _ = modal.update(Message::FileValidated(Ok(validated("a.png", 100, true))));
        assert!(modal.can_submit());
        assert!(modal.preview.is_some());
    }

    #[test]
    fn test_type_switch_clears_selected_file() {
        let mut modal = modal(ItemType::Photo);
        let _ = modal.update(Message::FileValidated(Ok(validated("a.png", 100, true))));
        assert!(modal.selected_file().is_some());

        let _ = modal.update(Message::TypeSelected(ItemType::Note));
        assert!(modal.selected_file().is_none());
        assert!(modal.preview.is_none());
        assert!(modal.error.is_none());
    }

    #[test]
    fn test_document_title_autofills_from_file_name() {
        let mut modal = modal(ItemType::Document);
        let _ = modal.update(Message::FileValidated(Ok(validated(
            "notes.txt",
            10 * 1024,
            false,
        ))));
        assert_eq!(modal.title, "notes.txt");
        assert!(modal.can_submit());
    }

    #[test]
    fn test_document_requires_title() {
        let mut modal = modal(ItemType::Document);
        let _ = modal.update(Message::FileValidated(Ok(validated("a.txt", 10, false))));
        let _ = modal.update(Message::TitleChanged("  ".to_string()));
        assert!(!modal.can_submit());
    }

    #[test]
    fn test_title_only_kinds_need_a_title() {
        let mut modal = modal(ItemType::Note);
        assert!(!modal.can_submit());

        let _ = modal.update(Message::TitleChanged("Groceries".to_string()));
        assert!(modal.can_submit());

        let (_, action) = modal.update(Message::Submit);
        assert_eq!(action, Action::Finished);
    }

    #[test]
    fn test_upload_progress_blocks_resubmit() {
        let mut modal = modal(ItemType::Photo);
        let _ = modal.update(Message::FileValidated(Ok(validated("a.png", 100, true))));
        let _ = modal.update(Message::Upload(UploadEvent::Progress(40.0)));
        assert!(!modal.can_submit());
        assert_eq!(modal.phase, Phase::Uploading(40.0));
    }

    #[test]
    fn test_upload_failure_reopens_with_error_and_file_kept() {
        let mut modal = modal(ItemType::Photo);
        let _ = modal.update(Message::FileValidated(Ok(validated("a.png", 100, true))));
        let (_, action) = modal.update(Message::Upload(UploadEvent::Done(Err(
            crate::api::ApiError::Http("boom".to_string()),
        ))));
        assert_eq!(action, Action::None);
        assert!(modal.error.is_some());
        assert!(modal.selected_file().is_some());
        assert!(modal.can_submit());
    }

    #[test]
    fn test_upload_success_then_delayed_close() {
        let mut modal = modal(ItemType::Photo);
        let _ = modal.update(Message::FileValidated(Ok(validated("a.png", 100, true))));
        let (_, action) = modal.update(Message::Upload(UploadEvent::Done(Ok(()))));
        assert_eq!(action, Action::ItemAdded);
        assert_eq!(modal.phase, Phase::Success);

        let (_, action) = modal.update(Message::FinishClose);
        assert_eq!(action, Action::Close);
    }
}
