/// Photo detail modal
///
/// Fetches one storage item by id and renders the photo with the
/// recognition metadata attached to it: face bounding boxes overlaid
/// on the image (positioned as fractions of the displayed size), a
/// grid of detected people whose hover highlights the matching box
/// and shows a tooltip following the pointer, plus labels, OCR text
/// and content-moderation flags. Escape and a backdrop click both
/// close it; the fullscreen toggle only changes the layout.

use iced::widget::{
    button, column, container, horizontal_space, image as image_widget, mouse_area, row,
    scrollable, stack, text, tooltip, Space,
};
use iced::{Alignment, Element, Length, Padding, Task};
use tracing::error;

use crate::api::{self, ApiError, Client};
use crate::state::data::{BoundingBox, Face, ItemKind, MediaMeta, PersonKind, PhotoItem, StorageItem};
use crate::ui;

#[derive(Debug, Clone)]
pub enum Message {
    Fetched(Result<StorageItem, ApiError>),
    ImageLoaded(Result<LoadedImage, String>),
    RetryImage,
    ToggleFullscreen,
    FaceEntered(String),
    FaceExited,
    Close,
}

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub handle: image_widget::Handle,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    Close,
}

enum State {
    Loading,
    NotFound,
    Failed(String),
    Loaded(Loaded),
}

struct Loaded {
    photo: PhotoItem,
    image: Option<LoadedImage>,
    image_error: Option<String>,
    hovered_face: Option<String>,
}

pub struct PhotoView {
    client: Client,
    state: State,
    fullscreen: bool,
}

impl PhotoView {
    pub fn open(client: Client, id: String) -> (Self, Task<Message>) {
        let view = Self {
            client: client.clone(),
            state: State::Loading,
            fullscreen: false,
        };
        let task = Task::perform(api::storage::get(client, id), Message::Fetched);
        (view, task)
    }

    pub fn update(&mut self, message: Message) -> (Task<Message>, Action) {
        match message {
            Message::Fetched(Ok(item)) => match item.kind {
                ItemKind::Photo(photo) => {
                    let uri = photo.uri.clone();
                    self.state = State::Loaded(Loaded {
                        photo,
                        image: None,
                        image_error: None,
                        hovered_face: None,
                    });
                    (fetch_image(self.client.clone(), uri), Action::None)
                }
                _ => {
                    self.state = State::NotFound;
                    (Task::none(), Action::None)
                }
            },
            Message::Fetched(Err(err)) => {
                if err.is_not_found() {
                    self.state = State::NotFound;
                } else {
                    error!("failed to fetch photo details: {err}");
                    self.state =
                        State::Failed("Failed to load photo details. Please try again.".to_string());
                }
                (Task::none(), Action::None)
            }
            Message::ImageLoaded(result) => {
                if let State::Loaded(loaded) = &mut self.state {
                    match result {
                        Ok(image) => {
                            loaded.image = Some(image);
                            loaded.image_error = None;
                        }
                        Err(err) => {
                            error!("failed to load photo image: {err}");
                            loaded.image_error =
                                Some("Failed to load the image. Please try again.".to_string());
                        }
                    }
                }
                (Task::none(), Action::None)
            }
            Message::RetryImage => {
                if let State::Loaded(loaded) = &mut self.state {
                    loaded.image_error = None;
                    let uri = loaded.photo.uri.clone();
                    return (fetch_image(self.client.clone(), uri), Action::None);
                }
                (Task::none(), Action::None)
            }
            Message::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                (Task::none(), Action::None)
            }
            Message::FaceEntered(id) => {
                if let State::Loaded(loaded) = &mut self.state {
                    loaded.hovered_face = Some(id);
                }
                (Task::none(), Action::None)
            }
            Message::FaceExited => {
                if let State::Loaded(loaded) = &mut self.state {
                    loaded.hovered_face = None;
                }
                (Task::none(), Action::None)
            }
            Message::Close => (Task::none(), Action::Close),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let title = match &self.state {
            State::Loading => "Loading...".to_string(),
            State::Loaded(loaded) => loaded.photo.file_name.clone(),
            _ => "Photo Details".to_string(),
        };

        let header = row![
            text(title).size(20),
            horizontal_space(),
            button(text(if self.fullscreen {
                "Exit Fullscreen"
            } else {
                "Fullscreen"
            }))
            .style(button::secondary)
            .on_press(Message::ToggleFullscreen),
            button(text("X")).style(button::text).on_press(Message::Close),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let body: Element<'_, Message> = match &self.state {
            State::Loading => text("Loading photo details...").into(),
            State::NotFound => column![
                text("Photo not found."),
                button(text("Back")).on_press(Message::Close),
            ]
            .spacing(12)
            .into(),
            State::Failed(message) => column![
                ui::error_text(message),
                button(text("Back")).on_press(Message::Close),
            ]
            .spacing(12)
            .into(),
            State::Loaded(loaded) => self.loaded_body(loaded),
        };

        let width = if self.fullscreen { 1100 } else { 860 };
        container(column![header, scrollable(body).height(Length::Fill)].spacing(16))
            .width(width)
            .max_height(if self.fullscreen { 780 } else { 640 })
            .padding(20)
            .style(ui::card_style)
            .into()
    }

    fn loaded_body<'a>(&'a self, loaded: &'a Loaded) -> Element<'a, Message> {
        let image_section = self.image_section(loaded);
        let meta_section = column![
            file_info_card(&loaded.photo),
            faces_section(&loaded.photo.faces, loaded.hovered_face.as_deref()),
            labels_section(&loaded.photo.media_meta),
            ocr_section(&loaded.photo.media_meta),
            moderation_section(&loaded.photo.media_meta),
        ]
        .spacing(16);

        if self.fullscreen {
            column![image_section, meta_section].spacing(16).into()
        } else {
            row![
                container(image_section).width(Length::FillPortion(2)),
                container(meta_section).width(Length::FillPortion(1)),
            ]
            .spacing(16)
            .into()
        }
    }

    fn image_section<'a>(&'a self, loaded: &'a Loaded) -> Element<'a, Message> {
        if let Some(message) = &loaded.image_error {
            return container(
                column![
                    ui::error_text(message),
                    button(text("Try Again")).on_press(Message::RetryImage),
                ]
                .spacing(12),
            )
            .padding(40)
            .width(Length::Fill)
            .into();
        }
        let Some(image) = &loaded.image else {
            return container(text("Loading image..."))
                .padding(40)
                .width(Length::Fill)
                .into();
        };

        let (max_w, max_h) = if self.fullscreen {
            (1000.0, 560.0)
        } else {
            (540.0, 440.0)
        };
        let (display_w, display_h) = fit_within(image.width, image.height, max_w, max_h);

        let mut layers = stack![image_widget(image.handle.clone())
            .width(display_w)
            .height(display_h)];

        for face in &loaded.photo.faces {
            let Some(bbox) = face.bounding_box else {
                continue;
            };
            let hovered = loaded.hovered_face.as_deref() == Some(face.id.as_str());
            let (x, y, w, h) = face_rect(bbox, display_w, display_h);

            let overlay: Element<'_, Message> = if hovered {
                container(
                    column![
                        Space::new(Length::Fill, Length::Fill),
                        container(text(face.display_name().to_string()).size(11))
                            .width(Length::Fill)
                            .style(|theme: &iced::Theme| container::Style {
                                background: Some(
                                    theme.extended_palette().primary.strong.color.into()
                                ),
                                ..container::Style::default()
                            }),
                    ]
                )
                .width(w)
                .height(h)
                .style(|theme: &iced::Theme| container::Style {
                    border: iced::Border {
                        color: theme.extended_palette().primary.strong.color,
                        width: 2.0,
                        radius: 2.0.into(),
                    },
                    ..container::Style::default()
                })
                .into()
            } else {
                // Invisible until its card is hovered
                Space::new(w, h).into()
            };

            layers = layers.push(
                container(overlay).padding(Padding {
                    top: y,
                    left: x,
                    right: 0.0,
                    bottom: 0.0,
                }),
            );
        }

        container(layers).into()
    }
}

fn fetch_image(client: Client, uri: String) -> Task<Message> {
    Task::perform(
        async move {
            let bytes = client
                .fetch_bytes(uri)
                .await
                .map_err(|err| err.to_string())?;
            let decoded = image::load_from_memory(&bytes).map_err(|err| err.to_string())?;
            Ok(LoadedImage {
                width: decoded.width(),
                height: decoded.height(),
                handle: image_widget::Handle::from_bytes(bytes),
            })
        },
        Message::ImageLoaded,
    )
}

/// Scale image dimensions to fit the viewport, preserving aspect.
fn fit_within(width: u32, height: u32, max_w: f32, max_h: f32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (max_w, max_h);
    }
    let scale = (max_w / width as f32).min(max_h / height as f32).min(1.0);
    (width as f32 * scale, height as f32 * scale)
}

/// Convert a fractional bounding box into pixel offsets and size.
fn face_rect(bbox: BoundingBox, display_w: f32, display_h: f32) -> (f32, f32, f32, f32) {
    (
        (bbox.left * display_w).max(0.0),
        (bbox.top * display_h).max(0.0),
        (bbox.width * display_w).max(1.0),
        (bbox.height * display_h).max(1.0),
    )
}

fn file_info_card(photo: &PhotoItem) -> Element<'_, Message> {
    let created = photo
        .created_at
        .map(|ts| ts.format("%b %e, %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let entry = |label: &str, value: String| {
        row![
            text(label.to_string()).size(13),
            horizontal_space(),
            text(value).size(13),
        ]
    };

    container(
        column![
            text("File Information").size(16),
            entry("Name:", photo.file_name.clone()),
            entry("Size:", ui::format_size(photo.file_size)),
            entry(
                "Type:",
                photo.mime_type.clone().unwrap_or_else(|| "Unknown".to_string())
            ),
            entry("Created:", created),
            entry(
                "Source:",
                photo.source.clone().unwrap_or_else(|| "Unknown".to_string())
            ),
        ]
        .spacing(8),
    )
    .padding(14)
    .width(Length::Fill)
    .style(ui::card_style)
    .into()
}

fn faces_section<'a>(faces: &'a [Face], hovered: Option<&str>) -> Element<'a, Message> {
    if faces.is_empty() {
        return Space::new(0, 0).into();
    }

    let mut cards = Vec::with_capacity(faces.len());
    for face in faces {
        let is_hovered = hovered == Some(face.id.as_str());

        let mut details = row![].spacing(6);
        if let Some(gender) = &face.gender {
            details = details.push(text(ui::title_case(gender)).size(11));
        }
        if let Some(age) = face.age {
            details = details.push(text(format!("Age: ~{age}")).size(11));
        }
        if let Some(emotion) = face.emotions.first() {
            details = details.push(
                container(text(emotion.to_lowercase()).size(11))
                    .padding([2.0, 6.0])
                    .style(ui::chip_style),
            );
        }

        let mut name_line = row![text(face.display_name().to_string()).size(13)].spacing(6);
        if face
            .person
            .as_ref()
            .is_some_and(|p| p.kind == PersonKind::Celebrity)
        {
            name_line = name_line.push(
                container(text("Celebrity").size(10).color(ui::CELEBRITY_VIOLET))
                    .padding([2.0, 6.0])
                    .style(ui::chip_style),
            );
        }

        let card = container(column![name_line, details].spacing(4))
            .padding(10)
            .width(Length::Fill)
            .style(move |theme: &iced::Theme| {
                let palette = theme.extended_palette();
                container::Style {
                    background: Some(palette.background.base.color.into()),
                    border: iced::Border {
                        color: if is_hovered {
                            palette.primary.strong.color
                        } else {
                            palette.background.strong.color
                        },
                        width: 1.0,
                        radius: 8.0.into(),
                    },
                    ..container::Style::default()
                }
            });

        let tip = container(
            column![
                text(face.display_name().to_string()).size(12),
                details_summary(face),
            ]
            .spacing(4),
        )
        .padding(8)
        .style(ui::card_style);

        cards.push(
            tooltip(
                mouse_area(card)
                    .on_enter(Message::FaceEntered(face.id.clone()))
                    .on_exit(Message::FaceExited),
                tip,
                tooltip::Position::FollowCursor,
            )
            .into(),
        );
    }

    container(
        column![
            text(format!("People Detected ({})", faces.len())).size(16),
            iced_aw::Wrap::with_elements(cards).spacing(8.0).line_spacing(8.0),
        ]
        .spacing(10),
    )
    .padding(14)
    .width(Length::Fill)
    .style(ui::card_style)
    .into()
}

fn details_summary(face: &Face) -> Element<'_, Message> {
    let mut parts = Vec::new();
    if let Some(person) = &face.person {
        if person.kind == PersonKind::Celebrity {
            parts.push("Celebrity".to_string());
        }
    }
    if let Some(gender) = &face.gender {
        parts.push(format!("Gender: {}", ui::title_case(gender)));
    }
    if let Some(age) = face.age {
        parts.push(format!("Age: ~{age}"));
    }
    if let Some(emotion) = face.emotions.first() {
        parts.push(format!("Emotion: {}", emotion.to_lowercase()));
    }
    text(parts.join("  ")).size(11).into()
}

fn labels_section(meta: &[MediaMeta]) -> Element<'_, Message> {
    let labels = meta.iter().find_map(|entry| match entry {
        MediaMeta::Label(labels) if !labels.is_empty() => Some(labels),
        _ => None,
    });
    let Some(labels) = labels else {
        return Space::new(0, 0).into();
    };

    let chips: Vec<Element<'_, Message>> = labels
        .iter()
        .take(15)
        .map(|label| {
            container(text(label.name.clone()).size(12))
                .padding([4.0, 10.0])
                .style(ui::chip_style)
                .into()
        })
        .collect();

    container(
        column![
            text("Labels").size(16),
            iced_aw::Wrap::with_elements(chips).spacing(6.0).line_spacing(6.0),
        ]
        .spacing(10),
    )
    .padding(14)
    .width(Length::Fill)
    .style(ui::card_style)
    .into()
}

fn ocr_section(meta: &[MediaMeta]) -> Element<'_, Message> {
    let ocr_text = meta.iter().find_map(|entry| match entry {
        MediaMeta::Ocr(payload) if !payload.text.trim().is_empty() => Some(payload.text.clone()),
        _ => None,
    });
    let Some(ocr_text) = ocr_text else {
        return Space::new(0, 0).into();
    };

    container(
        column![
            text("Text in Image").size(16),
            container(text(ocr_text).size(13))
                .padding(10)
                .width(Length::Fill)
                .style(ui::chip_style),
        ]
        .spacing(10),
    )
    .padding(14)
    .width(Length::Fill)
    .style(ui::card_style)
    .into()
}

fn moderation_section(meta: &[MediaMeta]) -> Element<'_, Message> {
    let flags = meta.iter().find_map(|entry| match entry {
        MediaMeta::ContentModeration(flags) if !flags.is_empty() => Some(flags),
        _ => None,
    });
    let Some(flags) = flags else {
        return Space::new(0, 0).into();
    };

    let chips: Vec<Element<'_, Message>> = flags
        .iter()
        .map(|flag| {
            container(text(flag.name.clone()).size(12).color(ui::ERROR_RED))
                .padding([4.0, 10.0])
                .style(ui::chip_style)
                .into()
        })
        .collect();

    container(
        column![
            text("Moderation Flags").size(16),
            iced_aw::Wrap::with_elements(chips).spacing(6.0).line_spacing(6.0),
        ]
        .spacing(10),
    )
    .padding(14)
    .width(Length::Fill)
    .style(ui::card_style)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within_preserves_aspect() {
        let (w, h) = fit_within(2000, 1000, 500.0, 500.0);
        assert!((w - 500.0).abs() < 0.01);
        assert!((h - 250.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_within_never_upscales() {
        let (w, h) = fit_within(100, 50, 500.0, 500.0);
        assert!((w - 100.0).abs() < 0.01);
        assert!((h - 50.0).abs() < 0.01);
    }

    fn loaded_view() -> PhotoView {
        let client = Client::new("http://localhost:1", None);
        let (mut view, _) = PhotoView::open(client, "5".to_string());
        let raw: crate::state::data::RawStorageItem = serde_json::from_str(
            r#"{"id":"5","type":"PHOTO","fileName":"beach.jpg","fileSize":1000,
                "uri":"https://cdn/p/5.jpg","processedAt":"2024-01-03T00:00:00Z"}"#,
        )
        .unwrap();
        let _ = view.update(Message::Fetched(Ok(raw.into())));
        view
    }

    #[test]
    fn test_image_failure_surfaces_with_retry() {
        let mut view = loaded_view();
        let _ = view.update(Message::ImageLoaded(Err("connection reset".to_string())));

        let State::Loaded(loaded) = &view.state else {
            panic!("expected loaded state");
        };
        assert!(loaded.image_error.is_some());
        assert!(loaded.image.is_none());

        // Retrying clears the message and refetches.
        let _ = view.update(Message::RetryImage);
        let State::Loaded(loaded) = &view.state else {
            panic!("expected loaded state");
        };
        assert!(loaded.image_error.is_none());
    }

    #[test]
    fn test_face_rect_is_fraction_of_display_size() {
        let bbox = BoundingBox {
            top: 0.25,
            left: 0.5,
            width: 0.1,
            height: 0.2,
        };
        let (x, y, w, h) = face_rect(bbox, 400.0, 200.0);
        assert!((x - 200.0).abs() < 0.01);
        assert!((y - 50.0).abs() < 0.01);
        assert!((w - 40.0).abs() < 0.01);
        assert!((h - 40.0).abs() < 0.01);
    }
}
