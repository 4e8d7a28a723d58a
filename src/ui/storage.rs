/// Storage list view
///
/// Fetches the user's items on entry (or one person's items when
/// scoped), filters them client-side by kind, and renders one card per
/// item through a single dispatch over the `ItemKind` union. Owns the
/// Add Item modal and the photo detail modal, and receives the global
/// file-drop and Escape events from the application shell.
///
/// Every fetch carries a sequence number; a response whose number no
/// longer matches the latest request is dropped, so a stale fetch can
/// never overwrite newer state.

use iced::widget::{
    button, column, container, horizontal_space, image as image_widget, mouse_area, row,
    scrollable, stack, text,
};
use iced::{Alignment, Element, Length, Task};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error};

use crate::api::{self, ApiError, Client};
use crate::state::data::{
    filter_items, ItemFilter, ItemKind, ItemType, Person, PhotoItem, StorageItem,
};
use crate::ui;
use crate::ui::add_item::{self, AddItemModal, UploadLimits};
use crate::ui::photo::{self, PhotoView};

#[derive(Debug, Clone)]
pub enum Message {
    Fetch,
    Fetched(u64, Result<Vec<StorageItem>, ApiError>),
    ThumbnailLoaded(String, Result<image_widget::Handle, String>),
    FilterChanged(ItemFilter),
    OpenModal,
    Modal(add_item::Message),
    OpenPhoto(String),
    Photo(photo::Message),
    Delete(String),
    Deleted(Result<(), ApiError>),
    DropHovering(bool),
    DropReceived(PathBuf),
    EscapePressed,
    Back,
}

/// Signals the application shell cares about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    /// Leave a person-scoped view (back to the people directory)
    ExitPersonScope,
}

pub struct StorageView {
    client: Client,
    limits: UploadLimits,
    items: Vec<StorageItem>,
    thumbnails: HashMap<String, image_widget::Handle>,
    loading: bool,
    error: Option<String>,
    filter: ItemFilter,
    seq: u64,
    person: Option<Person>,
    modal: Option<AddItemModal>,
    photo: Option<PhotoView>,
    drop_hint: bool,
}

impl StorageView {
    pub fn new(client: Client, limits: UploadLimits) -> (Self, Task<Message>) {
        Self::with_scope(client, limits, None)
    }

    /// A person's items, reached from the people directory.
    pub fn for_person(
        client: Client,
        limits: UploadLimits,
        person: Person,
    ) -> (Self, Task<Message>) {
        Self::with_scope(client, limits, Some(person))
    }

    fn with_scope(
        client: Client,
        limits: UploadLimits,
        person: Option<Person>,
    ) -> (Self, Task<Message>) {
        let mut view = Self {
            client,
            limits,
            items: Vec::new(),
            thumbnails: HashMap::new(),
            loading: false,
            error: None,
            filter: ItemFilter::All,
            seq: 0,
            person,
            modal: None,
            photo: None,
            drop_hint: false,
        };
        let task = view.fetch();
        (view, task)
    }

    fn fetch(&mut self) -> Task<Message> {
        self.loading = true;
        self.error = None;
        self.seq += 1;
        let seq = self.seq;
        let client = self.client.clone();

        match &self.person {
            Some(person) => {
                let id = person.id.clone();
                Task::perform(api::storage::list_for_person(client, id), move |result| {
                    Message::Fetched(seq, result)
                })
            }
            None => Task::perform(api::storage::list(client), move |result| {
                Message::Fetched(seq, result)
            }),
        }
    }

    /// Fetch thumbnails for any photos we do not have bytes for yet.
    fn fetch_thumbnails(&self) -> Task<Message> {
        let tasks: Vec<Task<Message>> = self
            .items
            .iter()
            .filter_map(|item| match &item.kind {
                ItemKind::Photo(photo) if !self.thumbnails.contains_key(&item.id) => {
                    let url = photo.thumbnail_url();
                    if url.is_empty() {
                        return None;
                    }
                    let id = item.id.clone();
                    let client = self.client.clone();
                    Some(Task::perform(
                        client.fetch_bytes(url.to_string()),
                        move |result| {
                            Message::ThumbnailLoaded(
                                id.clone(),
                                result
                                    .map(image_widget::Handle::from_bytes)
                                    .map_err(|err| err.to_string()),
                            )
                        },
                    ))
                }
                _ => None,
            })
            .collect();
        Task::batch(tasks)
    }

    pub fn update(&mut self, message: Message) -> (Task<Message>, Action) {
        match message {
            Message::Fetch => (self.fetch(), Action::None),
            Message::Fetched(seq, result) => {
                if seq != self.seq {
                    debug!("dropping stale storage fetch (seq {seq} != {})", self.seq);
                    return (Task::none(), Action::None);
                }
                self.loading = false;
                match result {
                    Ok(items) => {
                        self.items = items;
                        self.error = None;
                        (self.fetch_thumbnails(), Action::None)
                    }
                    Err(err) => {
                        error!("failed to fetch storage items: {err}");
                        self.error =
                            Some("Failed to load storage items. Please try again.".to_string());
                        (Task::none(), Action::None)
                    }
                }
            }
            Message::ThumbnailLoaded(id, Ok(handle)) => {
                self.thumbnails.insert(id, handle);
                (Task::none(), Action::None)
            }
            Message::ThumbnailLoaded(id, Err(err)) => {
                debug!("thumbnail fetch failed for {id}: {err}");
                (Task::none(), Action::None)
            }
            Message::FilterChanged(filter) => {
                // Client-side only; no request is made.
                self.filter = filter;
                (Task::none(), Action::None)
            }
            Message::OpenModal => {
                let (modal, task) = AddItemModal::new(
                    self.client.clone(),
                    self.limits,
                    ItemType::from(self.filter),
                    None,
                );
                self.modal = Some(modal);
                (task.map(Message::Modal), Action::None)
            }
            Message::Modal(msg) => {
                let Some(modal) = &mut self.modal else {
                    return (Task::none(), Action::None);
                };
                let (task, action) = modal.update(msg);
                let task = task.map(Message::Modal);
                match action {
                    add_item::Action::ItemAdded => {
                        (Task::batch([task, self.fetch()]), Action::None)
                    }
                    add_item::Action::Finished => {
                        self.modal = None;
                        (Task::batch([task, self.fetch()]), Action::None)
                    }
                    add_item::Action::Close => {
                        self.modal = None;
                        (task, Action::None)
                    }
                    add_item::Action::None => (task, Action::None),
                }
            }
            Message::OpenPhoto(id) => {
                let (photo, task) = PhotoView::open(self.client.clone(), id);
                self.photo = Some(photo);
                (task.map(Message::Photo), Action::None)
            }
            Message::Photo(msg) => {
                let Some(photo) = &mut self.photo else {
                    return (Task::none(), Action::None);
                };
                let (task, action) = photo.update(msg);
                if action == photo::Action::Close {
                    self.photo = None;
                }
                (task.map(Message::Photo), Action::None)
            }
            Message::Delete(id) => (
                Task::perform(
                    api::storage::delete(self.client.clone(), id),
                    Message::Deleted,
                ),
                Action::None,
            ),
            Message::Deleted(Ok(())) => (self.fetch(), Action::None),
            Message::Deleted(Err(err)) => {
                error!("failed to delete item: {err}");
                self.error = Some("Failed to delete item. Please try again.".to_string());
                (Task::none(), Action::None)
            }
            Message::DropHovering(hovering) => {
                self.drop_hint = hovering && self.photo.is_none();
                (Task::none(), Action::None)
            }
            Message::DropReceived(path) => {
                self.drop_hint = false;
                if self.photo.is_some() {
                    return (Task::none(), Action::None);
                }
                if let Some(modal) = &mut self.modal {
                    return (modal.receive_drop(path).map(Message::Modal), Action::None);
                }

                // Infer the item type from the dropped file's MIME.
                let mime = mime_guess::from_path(&path).first_or_octet_stream();
                let item_type = if mime.type_() == mime_guess::mime::IMAGE {
                    ItemType::Photo
                } else {
                    ItemType::Document
                };
                let (modal, task) =
                    AddItemModal::new(self.client.clone(), self.limits, item_type, Some(path));
                self.modal = Some(modal);
                (task.map(Message::Modal), Action::None)
            }
            Message::EscapePressed => {
                if self.photo.is_some() {
                    self.photo = None;
                    return (Task::none(), Action::None);
                }
                if self.modal.is_some() {
                    return self.update(Message::Modal(add_item::Message::Cancel));
                }
                (Task::none(), Action::None)
            }
            Message::Back => (Task::none(), Action::ExitPersonScope),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let heading: Element<'_, Message> = match &self.person {
            Some(person) => row![
                button(text("< Back")).style(button::text).on_press(Message::Back),
                text(format!("Items with {}", person.display_name())).size(24),
            ]
            .spacing(8)
            .align_y(Alignment::Center)
            .into(),
            None => text("My Storage").size(24).into(),
        };

        let toolbar = row![
            heading,
            horizontal_space(),
            button(text("+ Add")).on_press(Message::OpenModal),
        ]
        .align_y(Alignment::Center);

        let tabs = row(ItemFilter::ALL.map(|filter| {
            let style = if filter == self.filter {
                button::primary
            } else {
                button::text
            };
            button(text(filter.label()))
                .style(style)
                .on_press(Message::FilterChanged(filter))
                .into()
        }))
        .spacing(4);

        let body: Element<'_, Message> = if self.loading && self.items.is_empty() {
            container(text("Loading items...")).padding(40).into()
        } else if let Some(message) = &self.error {
            column![
                ui::error_text(message),
                button(text("Try Again")).on_press(Message::Fetch),
            ]
            .spacing(12)
            .into()
        } else {
            let visible = filter_items(&self.items, self.filter);
            if visible.is_empty() {
                container(text("No items yet. Drop a file or press Add to get started."))
                    .padding(40)
                    .into()
            } else {
                let cards: Vec<Element<'_, Message>> =
                    visible.into_iter().map(|item| self.card(item)).collect();
                scrollable(
                    iced_aw::Wrap::with_elements(cards)
                        .spacing(12.0)
                        .line_spacing(12.0),
                )
                .height(Length::Fill)
                .into()
            }
        };

        let mut base: Element<'_, Message> =
            column![toolbar, tabs, body].spacing(16).padding(20).into();

        if self.drop_hint {
            base = stack![
                base,
                container(
                    container(text("Drop your file to add it to your storage").size(18))
                        .padding(32)
                        .style(ui::card_style)
                )
                .center_x(Length::Fill)
                .center_y(Length::Fill)
            ]
            .into();
        }

        if let Some(photo) = &self.photo {
            return ui::modal(
                base,
                photo.view().map(Message::Photo),
                Some(Message::Photo(photo::Message::Close)),
            );
        }

        if let Some(modal) = &self.modal {
            // The add modal only closes via its own buttons (or Escape).
            return ui::modal(base, modal.view().map(Message::Modal), None);
        }

        base
    }

    fn card<'a>(&'a self, item: &'a StorageItem) -> Element<'a, Message> {
        let content: Element<'a, Message> = match &item.kind {
            ItemKind::Note {
                title,
                content,
                date,
            } => column![
                text(title.clone()).size(15),
                text(snippet(content, 120)).size(12),
                card_footer(date.as_deref(), &item.id),
            ]
            .spacing(8)
            .into(),
            ItemKind::Task {
                title,
                content,
                completed,
                due_date,
                priority,
                date,
            } => {
                let status: Element<'a, Message> = if *completed {
                    container(text("Completed").size(11))
                        .padding([2.0, 6.0])
                        .style(ui::chip_style)
                        .into()
                } else {
                    let mut badges = row![].spacing(6);
                    if let Some(due) = due_date {
                        badges = badges.push(
                            container(text(due.clone()).size(11))
                                .padding([2.0, 6.0])
                                .style(ui::chip_style),
                        );
                    }
                    if let Some(priority) = priority {
                        badges = badges.push(
                            container(text(priority.clone()).size(11).color(ui::ERROR_RED))
                                .padding([2.0, 6.0])
                                .style(ui::chip_style),
                        );
                    }
                    badges.into()
                };
                column![
                    text(title.clone()).size(15),
                    text(snippet(content, 80)).size(12),
                    status,
                    card_footer(date.as_deref(), &item.id),
                ]
                .spacing(8)
                .into()
            }
            ItemKind::Link {
                title,
                url,
                description,
                date,
            } => {
                let mut body = column![text(title.clone()).size(15), text(url.clone()).size(12)]
                    .spacing(8);
                if let Some(description) = description {
                    body = body.push(text(snippet(description, 80)).size(12));
                }
                body.push(card_footer(date.as_deref(), &item.id)).into()
            }
            ItemKind::Document {
                title,
                file_name,
                size,
                date,
                ..
            } => {
                let mut body = column![text(title.clone()).size(15)].spacing(8);
                if let Some(file_name) = file_name {
                    body = body.push(text(file_name.clone()).size(12));
                }
                if let Some(size) = size {
                    body = body.push(text(ui::format_size(*size)).size(12));
                }
                body.push(card_footer(date.as_deref(), &item.id)).into()
            }
            ItemKind::Event {
                title,
                date,
                location,
            } => {
                let mut body = column![text(title.clone()).size(15)].spacing(8);
                if let Some(location) = location {
                    body = body.push(text(location.clone()).size(12));
                }
                body.push(card_footer(date.as_deref(), &item.id)).into()
            }
            ItemKind::Photo(photo) => return self.photo_card(&item.id, photo),
            ItemKind::Generic { label, date } => column![
                text(label.clone()).size(15),
                card_footer(date.as_deref(), &item.id),
            ]
            .spacing(8)
            .into(),
        };

        container(content)
            .padding(14)
            .width(230)
            .style(ui::card_style)
            .into()
    }

    fn photo_card<'a>(&'a self, id: &'a str, photo: &'a PhotoItem) -> Element<'a, Message> {
        let picture: Element<'a, Message> = match self.thumbnails.get(id) {
            Some(handle) => image_widget(handle.clone())
                .width(Length::Fill)
                .height(150)
                .into(),
            None => container(text(photo.file_name.clone()).size(12))
                .width(Length::Fill)
                .height(150)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let mut layers = stack![picture];
        if !photo.is_processed() {
            layers = layers.push(
                container(
                    container(text("Processing").size(11))
                        .padding([2.0, 8.0])
                        .style(ui::chip_style),
                )
                .padding(6),
            );
        }

        let card = container(column![layers, card_footer(None, id)].spacing(6))
            .padding(8)
            .width(230)
            .style(ui::card_style);

        // Unprocessed photos do not open the detail view.
        if photo.is_processed() {
            mouse_area(card)
                .on_press(Message::OpenPhoto(id.to_string()))
                .into()
        } else {
            card.into()
        }
    }
}

fn card_footer<'a>(date: Option<&'a str>, id: &'a str) -> Element<'a, Message> {
    row![
        text(date.unwrap_or("").to_string()).size(11),
        horizontal_space(),
        button(text("Delete").size(11))
            .style(button::text)
            .on_press(Message::Delete(id.to_string())),
    ]
    .align_y(Alignment::Center)
    .into()
}

fn snippet(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::RawStorageItem;

    fn limits() -> UploadLimits {
        UploadLimits {
            photo_bytes: 300 * 1024 * 1024,
            document_bytes: 300 * 1024 * 1024,
        }
    }

    fn view() -> StorageView {
        StorageView::new(Client::new("http://localhost:1", None), limits()).0
    }

    fn items(count: usize) -> Vec<StorageItem> {
        (0..count)
            .map(|i| {
                let raw: RawStorageItem = serde_json::from_str(&format!(
                    r#"{{"id":"{i}","type":"NOTE","title":"note {i}","content":"c"}}"#
                ))
                .unwrap();
                raw.into()
            })
            .collect()
    }

    #[test]
    fn test_stale_fetch_is_dropped() {
        let mut view = view();
        assert_eq!(view.seq, 1);

        // A second fetch supersedes the first.
        let _ = view.update(Message::Fetch);
        assert_eq!(view.seq, 2);

        let _ = view.update(Message::Fetched(1, Ok(items(3))));
        assert!(view.items.is_empty(), "stale response must not apply");

        let _ = view.update(Message::Fetched(2, Ok(items(3))));
        assert_eq!(view.items.len(), 3);
        assert!(!view.loading);
    }

    #[test]
    fn test_fetch_error_surfaces_inline() {
        let mut view = view();
        let _ = view.update(Message::Fetched(
            1,
            Err(ApiError::Http("connection refused".to_string())),
        ));
        assert!(view.error.is_some());
        assert!(view.items.is_empty());
    }

    #[test]
    fn test_filter_change_is_local() {
        let mut view = view();
        let _ = view.update(Message::Fetched(1, Ok(items(2))));
        let seq_before = view.seq;
        let _ = view.update(Message::FilterChanged(ItemFilter::Photo));
        assert_eq!(view.seq, seq_before, "filtering must not refetch");
        assert_eq!(view.filter, ItemFilter::Photo);
        assert_eq!(view.items.len(), 2, "filtering keeps the full set");
    }

    #[test]
    fn test_escape_closes_modal() {
        let mut view = view();
        let _ = view.update(Message::OpenModal);
        assert!(view.modal.is_some());
        let _ = view.update(Message::EscapePressed);
        assert!(view.modal.is_none());
    }

    #[test]
    fn test_drop_opens_modal_with_inferred_type() {
        let mut view = view();
        let _ = view.update(Message::DropReceived(PathBuf::from("/tmp/missing.txt")));
        assert!(view.modal.is_some());
    }
}
