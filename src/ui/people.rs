/// People directory
///
/// Server-paginated listing of every known person, loaded page by page
/// as the user scrolls near the bottom. Search and filter changes reset
/// the listing to page one; responses carry a sequence number so a
/// slow page for an abandoned filter never lands on top of fresh
/// results. An inline editor covers create and rename.

use iced::widget::{
    button, column, container, horizontal_space, image as image_widget, pick_list, row,
    scrollable, text, text_input,
};
use iced::{Alignment, Element, Length, Task};
use std::collections::HashMap;
use tracing::{debug, error};

use crate::api::{self, ApiError, Client};
use crate::api::people::{PeopleQuery, PeoplePage, PersonDraft};
use crate::state::data::{PageMetadata, Person, PersonKind};
use crate::ui;

/// How far down the scrollable has to travel before the next page loads.
const LOAD_MORE_THRESHOLD: f32 = 0.9;

const GENDER_OPTIONS: [&str; 3] = ["Any gender", "Male", "Female"];
const TYPE_OPTIONS: [&str; 3] = ["Any type", "Person", "Celebrity"];

#[derive(Debug, Clone)]
pub enum Message {
    Fetch,
    PageFetched(u64, Result<PeoplePage, ApiError>),
    AvatarLoaded(String, Result<image_widget::Handle, String>),
    SearchChanged(String),
    GenderPicked(&'static str),
    TypePicked(&'static str),
    Scrolled(scrollable::Viewport),
    ShowStorage(Person),
    OpenCreate,
    OpenEdit(Person),
    EditorLoaded(Result<Person, ApiError>),
    EditorNameChanged(String),
    EditorKindPicked(&'static str),
    EditorGenderPicked(&'static str),
    EditorSave,
    EditorSaved(Result<Person, ApiError>),
    EditorCancel,
    Delete(String),
    Deleted(Result<(), ApiError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    /// Open the storage list scoped to this person
    ShowStorage(Person),
}

/// Inline create/edit form shown above the grid.
#[derive(Debug, Clone)]
struct Editor {
    /// `None` while creating a new person
    id: Option<String>,
    name: String,
    kind: &'static str,
    gender: &'static str,
    saving: bool,
    error: Option<String>,
}

impl Editor {
    fn create() -> Self {
        Self {
            id: None,
            name: String::new(),
            kind: "Person",
            gender: "Any gender",
            saving: false,
            error: None,
        }
    }

    fn edit(person: &Person) -> Self {
        Self {
            id: Some(person.id.clone()),
            name: person.display_name().to_string(),
            kind: match person.kind {
                PersonKind::Celebrity => "Celebrity",
                _ => "Person",
            },
            gender: match person.gender.as_deref() {
                Some("MALE") => "Male",
                Some("FEMALE") => "Female",
                _ => "Any gender",
            },
            saving: false,
            error: None,
        }
    }

    fn draft(&self) -> PersonDraft {
        PersonDraft {
            name: self.name.trim().to_string(),
            person_type: match self.kind {
                "Celebrity" => "CELEBRITY".to_string(),
                _ => "PERSON".to_string(),
            },
            gender: filter_value(self.gender).map(str::to_string),
        }
    }
}

pub struct PeopleView {
    client: Client,
    page_size: u32,
    people: Vec<Person>,
    avatars: HashMap<String, image_widget::Handle>,
    metadata: Option<PageMetadata>,
    loading: bool,
    loading_more: bool,
    error: Option<String>,
    search: String,
    gender: &'static str,
    person_type: &'static str,
    seq: u64,
    editor: Option<Editor>,
}

impl PeopleView {
    pub fn new(client: Client, page_size: u32) -> (Self, Task<Message>) {
        let mut view = Self {
            client,
            page_size,
            people: Vec::new(),
            avatars: HashMap::new(),
            metadata: None,
            loading: false,
            loading_more: false,
            error: None,
            search: String::new(),
            gender: GENDER_OPTIONS[0],
            person_type: TYPE_OPTIONS[0],
            seq: 0,
            editor: None,
        };
        let task = view.fetch_page(1);
        (view, task)
    }

    fn query(&self, page: u32) -> PeopleQuery {
        let mut query = PeopleQuery::first_page(self.page_size);
        query.page = page;
        query.search = self.search.trim().to_string();
        query.gender = filter_value(self.gender)
            .map(str::to_string)
            .unwrap_or_default();
        query.person_type = filter_value(self.person_type)
            .map(str::to_string)
            .unwrap_or_default();
        query
    }

    fn fetch_page(&mut self, page: u32) -> Task<Message> {
        if page == 1 {
            self.loading = true;
            self.error = None;
        } else {
            self.loading_more = true;
        }
        self.seq += 1;
        let seq = self.seq;
        let client = self.client.clone();
        let query = self.query(page);
        Task::perform(api::people::list(client, query), move |result| {
            Message::PageFetched(seq, result)
        })
    }

    /// Whether the server still has pages we have not shown.
    fn has_more(&self) -> bool {
        match self.metadata {
            Some(metadata) => !self.people.is_empty() && metadata.page < metadata.total_pages,
            None => false,
        }
    }

    fn apply_page(&mut self, page: PeoplePage) {
        if page.metadata.page <= 1 {
            self.people = page.people;
        } else {
            self.people.extend(page.people);
        }
        self.metadata = Some(page.metadata);
    }

    fn fetch_avatars(&self) -> Task<Message> {
        let tasks: Vec<Task<Message>> = self
            .people
            .iter()
            .filter(|person| !self.avatars.contains_key(&person.id))
            .filter_map(|person| {
                let url = person
                    .profile_picture
                    .as_ref()
                    .and_then(|picture| picture.s3_url.clone())?;
                let id = person.id.clone();
                let client = self.client.clone();
                Some(Task::perform(client.fetch_bytes(url), move |result| {
                    Message::AvatarLoaded(
                        id.clone(),
                        result
                            .map(image_widget::Handle::from_bytes)
                            .map_err(|err| err.to_string()),
                    )
                }))
            })
            .collect();
        Task::batch(tasks)
    }

    pub fn update(&mut self, message: Message) -> (Task<Message>, Action) {
        match message {
            Message::Fetch => (self.fetch_page(1), Action::None),
            Message::PageFetched(seq, result) => {
                if seq != self.seq {
                    debug!("dropping stale people page (seq {seq} != {})", self.seq);
                    return (Task::none(), Action::None);
                }
                self.loading = false;
                self.loading_more = false;
                match result {
                    Ok(page) => {
                        self.apply_page(page);
                        self.error = None;
                        (self.fetch_avatars(), Action::None)
                    }
                    Err(err) => {
                        error!("failed to fetch people: {err}");
                        self.error = Some("Failed to load people. Please try again.".to_string());
                        (Task::none(), Action::None)
                    }
                }
            }
            Message::AvatarLoaded(id, Ok(handle)) => {
                self.avatars.insert(id, handle);
                (Task::none(), Action::None)
            }
            Message::AvatarLoaded(id, Err(err)) => {
                debug!("avatar fetch failed for {id}: {err}");
                (Task::none(), Action::None)
            }
            Message::SearchChanged(search) => {
                self.search = search;
                (self.fetch_page(1), Action::None)
            }
            Message::GenderPicked(gender) => {
                self.gender = gender;
                (self.fetch_page(1), Action::None)
            }
            Message::TypePicked(person_type) => {
                self.person_type = person_type;
                (self.fetch_page(1), Action::None)
            }
            Message::Scrolled(viewport) => {
                let reached_bottom = viewport.relative_offset().y >= LOAD_MORE_THRESHOLD;
                if reached_bottom && self.has_more() && !self.loading_more && !self.loading {
                    let next = self.metadata.map(|m| m.page + 1).unwrap_or(1);
                    return (self.fetch_page(next), Action::None);
                }
                (Task::none(), Action::None)
            }
            Message::ShowStorage(person) => (Task::none(), Action::ShowStorage(person)),
            Message::OpenCreate => {
                self.editor = Some(Editor::create());
                (Task::none(), Action::None)
            }
            Message::OpenEdit(person) => {
                // Seed from the card, then refresh from the canonical
                // record; list entries can lag behind an earlier edit.
                self.editor = Some(Editor::edit(&person));
                let task = Task::perform(
                    api::people::get(self.client.clone(), person.id),
                    Message::EditorLoaded,
                );
                (task, Action::None)
            }
            Message::EditorLoaded(Ok(person)) => {
                match &self.editor {
                    Some(editor)
                        if !editor.saving && editor.id.as_deref() == Some(person.id.as_str()) =>
                    {
                        self.editor = Some(Editor::edit(&person));
                    }
                    _ => {}
                }
                (Task::none(), Action::None)
            }
            Message::EditorLoaded(Err(err)) => {
                // The locally seeded form is still usable.
                debug!("person refresh failed: {err}");
                (Task::none(), Action::None)
            }
            Message::EditorNameChanged(name) => {
                if let Some(editor) = &mut self.editor {
                    editor.name = name;
                }
                (Task::none(), Action::None)
            }
            Message::EditorKindPicked(kind) => {
                if let Some(editor) = &mut self.editor {
                    editor.kind = kind;
                }
                (Task::none(), Action::None)
            }
            Message::EditorGenderPicked(gender) => {
                if let Some(editor) = &mut self.editor {
                    editor.gender = gender;
                }
                (Task::none(), Action::None)
            }
            Message::EditorSave => {
                let Some(editor) = &mut self.editor else {
                    return (Task::none(), Action::None);
                };
                if editor.name.trim().is_empty() {
                    editor.error = Some("Name is required.".to_string());
                    return (Task::none(), Action::None);
                }
                editor.saving = true;
                editor.error = None;
                let client = self.client.clone();
                let draft = editor.draft();
                let task = match editor.id.clone() {
                    Some(id) => {
                        Task::perform(api::people::update(client, id, draft), Message::EditorSaved)
                    }
                    None => Task::perform(api::people::create(client, draft), Message::EditorSaved),
                };
                (task, Action::None)
            }
            Message::EditorSaved(Ok(_)) => {
                self.editor = None;
                (self.fetch_page(1), Action::None)
            }
            Message::EditorSaved(Err(err)) => {
                error!("failed to save person: {err}");
                if let Some(editor) = &mut self.editor {
                    editor.saving = false;
                    editor.error = Some("Failed to save. Please try again.".to_string());
                }
                (Task::none(), Action::None)
            }
            Message::EditorCancel => {
                self.editor = None;
                (Task::none(), Action::None)
            }
            Message::Delete(id) => (
                Task::perform(
                    api::people::delete(self.client.clone(), id),
                    Message::Deleted,
                ),
                Action::None,
            ),
            Message::Deleted(Ok(())) => (self.fetch_page(1), Action::None),
            Message::Deleted(Err(err)) => {
                error!("failed to delete person: {err}");
                self.error = Some("Failed to delete person. Please try again.".to_string());
                (Task::none(), Action::None)
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let toolbar = row![
            text("People").size(24),
            horizontal_space(),
            button(text("+ Add Person")).on_press(Message::OpenCreate),
        ]
        .align_y(Alignment::Center);

        let filters = row![
            text_input("Search people...", &self.search)
                .on_input(Message::SearchChanged)
                .width(260),
            pick_list(GENDER_OPTIONS, Some(self.gender), Message::GenderPicked),
            pick_list(TYPE_OPTIONS, Some(self.person_type), Message::TypePicked),
        ]
        .spacing(8);

        let mut content = column![toolbar, filters].spacing(16).padding(20);

        if let Some(editor) = &self.editor {
            content = content.push(self.editor_card(editor));
        }

        let body: Element<'_, Message> = if self.loading && self.people.is_empty() {
            container(text("Loading people...")).padding(40).into()
        } else if let Some(message) = &self.error {
            column![
                ui::error_text(message),
                button(text("Try Again")).on_press(Message::Fetch),
            ]
            .spacing(12)
            .into()
        } else if self.people.is_empty() {
            container(text("No people found.")).padding(40).into()
        } else {
            let mut cards: Vec<Element<'_, Message>> =
                self.people.iter().map(|person| self.card(person)).collect();
            if self.loading_more {
                cards.push(container(text("Loading more...")).padding(12).into());
            }
            scrollable(
                iced_aw::Wrap::with_elements(cards)
                    .spacing(12.0)
                    .line_spacing(12.0),
            )
            .on_scroll(Message::Scrolled)
            .height(Length::Fill)
            .into()
        };

        content.push(body).into()
    }

    fn card<'a>(&'a self, person: &'a Person) -> Element<'a, Message> {
        let avatar: Element<'a, Message> = match self.avatars.get(&person.id) {
            Some(handle) => image_widget(handle.clone())
                .width(Length::Fill)
                .height(140)
                .into(),
            None => container(text(initials(person.display_name())).size(32))
                .width(Length::Fill)
                .height(140)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .style(ui::chip_style)
                .into(),
        };

        let mut name_row = row![text(person.display_name().to_string()).size(15)].spacing(6);
        if person.kind == PersonKind::Celebrity {
            name_row = name_row.push(
                container(text("Celebrity").size(10).color(ui::CELEBRITY_VIOLET))
                    .padding([2.0, 6.0])
                    .style(ui::chip_style),
            );
        }

        let mut details = row![].spacing(8);
        if let Some(gender) = &person.gender {
            details = details.push(text(ui::title_case(gender)).size(11));
        }
        if let Some(age) = person.age {
            details = details.push(text(format!("~{age} yrs")).size(11));
        }

        let actions = row![
            button(text("Items").size(11))
                .style(button::text)
                .on_press(Message::ShowStorage(person.clone())),
            button(text("Edit").size(11))
                .style(button::text)
                .on_press(Message::OpenEdit(person.clone())),
            horizontal_space(),
            button(text("Delete").size(11))
                .style(button::text)
                .on_press(Message::Delete(person.id.clone())),
        ]
        .align_y(Alignment::Center);

        container(column![avatar, name_row, details, actions].spacing(6))
            .padding(10)
            .width(200)
            .style(ui::card_style)
            .into()
    }

    fn editor_card<'a>(&'a self, editor: &'a Editor) -> Element<'a, Message> {
        let heading = if editor.id.is_some() {
            "Edit Person"
        } else {
            "New Person"
        };

        let mut save = button(text(if editor.saving { "Saving..." } else { "Save" }));
        if !editor.saving {
            save = save.on_press(Message::EditorSave);
        }

        let mut form = column![
            text(heading).size(16),
            text_input("Name", &editor.name).on_input(Message::EditorNameChanged),
            row![
                pick_list(TYPE_OPTIONS, Some(editor.kind), Message::EditorKindPicked),
                pick_list(
                    GENDER_OPTIONS,
                    Some(editor.gender),
                    Message::EditorGenderPicked
                ),
            ]
            .spacing(8),
        ]
        .spacing(10);

        if let Some(error) = &editor.error {
            form = form.push(ui::error_text(error));
        }

        form = form.push(
            row![
                save,
                button(text("Cancel"))
                    .style(button::secondary)
                    .on_press(Message::EditorCancel),
            ]
            .spacing(8),
        );

        container(form).padding(14).style(ui::card_style).into()
    }
}

/// Maps the "Any ..." placeholder to an omitted filter.
fn filter_value(option: &'static str) -> Option<&'static str> {
    match option {
        "Male" => Some("MALE"),
        "Female" => Some("FEMALE"),
        "Person" => Some("PERSON"),
        "Celebrity" => Some("CELEBRITY"),
        _ => None,
    }
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> PeopleView {
        PeopleView::new(Client::new("http://localhost:1", None), 20).0
    }

    fn people(range: std::ops::Range<usize>) -> Vec<Person> {
        range
            .map(|i| {
                serde_json::from_str(&format!(r#"{{"id":"{i}","name":"Person {i}"}}"#)).unwrap()
            })
            .collect()
    }

    fn metadata(page: u32, total_pages: u32) -> PageMetadata {
        PageMetadata {
            page,
            limit: 20,
            total: 25,
            total_pages,
        }
    }

    #[test]
    fn test_two_fetches_cover_twenty_five_people() {
        let mut view = view();

        let _ = view.update(Message::PageFetched(
            1,
            Ok(PeoplePage {
                people: people(0..20),
                metadata: metadata(1, 2),
            }),
        ));
        assert_eq!(view.people.len(), 20);
        assert!(view.has_more(), "page 1 of 2 leaves more to fetch");

        // Scrolling to the bottom requests page 2.
        let _ = view.fetch_page(2);
        let _ = view.update(Message::PageFetched(
            2,
            Ok(PeoplePage {
                people: people(20..25),
                metadata: metadata(2, 2),
            }),
        ));
        assert_eq!(view.people.len(), 25, "page 2 appends");
        assert!(!view.has_more(), "last page exhausts the listing");
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut view = view();
        let _ = view.update(Message::SearchChanged("ada".to_string()));
        assert_eq!(view.seq, 2);

        // The pre-search page arrives late and must be ignored.
        let _ = view.update(Message::PageFetched(
            1,
            Ok(PeoplePage {
                people: people(0..20),
                metadata: metadata(1, 2),
            }),
        ));
        assert!(view.people.is_empty());
    }

    #[test]
    fn test_filter_change_resets_to_first_page() {
        let mut view = view();
        let _ = view.update(Message::PageFetched(
            1,
            Ok(PeoplePage {
                people: people(0..20),
                metadata: metadata(1, 2),
            }),
        ));

        let _ = view.update(Message::GenderPicked("Female"));
        assert!(view.loading);
        let query = view.query(1);
        assert_eq!(query.page, 1);
        assert_eq!(query.gender, "FEMALE");

        // A fresh first page replaces, never appends.
        let _ = view.update(Message::PageFetched(
            view.seq,
            Ok(PeoplePage {
                people: people(0..3),
                metadata: metadata(1, 1),
            }),
        ));
        assert_eq!(view.people.len(), 3);
    }

    #[test]
    fn test_fetch_error_surfaces_inline() {
        let mut view = view();
        let _ = view.update(Message::PageFetched(
            1,
            Err(ApiError::Http("connection refused".to_string())),
        ));
        assert!(view.error.is_some());
        assert!(!view.loading);
    }

    fn person(id: &str, name: &str) -> Person {
        serde_json::from_str(&format!(r#"{{"id":"{id}","name":"{name}"}}"#)).unwrap()
    }

    #[test]
    fn test_edit_form_refreshes_from_server_record() {
        let mut view = view();
        let _ = view.update(Message::OpenEdit(person("p1", "Ada")));
        assert_eq!(view.editor.as_ref().unwrap().name, "Ada");

        // The fetched record wins over the stale card data.
        let _ = view.update(Message::EditorLoaded(Ok(person("p1", "Ada Lovelace"))));
        assert_eq!(view.editor.as_ref().unwrap().name, "Ada Lovelace");

        // A response for a different person is ignored.
        let _ = view.update(Message::EditorLoaded(Ok(person("p2", "Bob"))));
        assert_eq!(view.editor.as_ref().unwrap().name, "Ada Lovelace");
    }

    #[test]
    fn test_edit_form_survives_refresh_failure() {
        let mut view = view();
        let _ = view.update(Message::OpenEdit(person("p1", "Ada")));
        let _ = view.update(Message::EditorLoaded(Err(ApiError::Http(
            "connection refused".to_string(),
        ))));
        assert_eq!(view.editor.as_ref().unwrap().name, "Ada");
    }

    #[test]
    fn test_editor_requires_name() {
        let mut view = view();
        let _ = view.update(Message::OpenCreate);
        let _ = view.update(Message::EditorSave);
        let editor = view.editor.as_ref().unwrap();
        assert!(editor.error.is_some());
        assert!(!editor.saving);
    }

    #[test]
    fn test_editor_draft_maps_wire_values() {
        let mut view = view();
        let _ = view.update(Message::OpenCreate);
        let _ = view.update(Message::EditorNameChanged("Ada Lovelace".to_string()));
        let _ = view.update(Message::EditorKindPicked("Celebrity"));
        let _ = view.update(Message::EditorGenderPicked("Female"));

        let draft = view.editor.as_ref().unwrap().draft();
        assert_eq!(draft.name, "Ada Lovelace");
        assert_eq!(draft.person_type, "CELEBRITY");
        assert_eq!(draft.gender.as_deref(), Some("FEMALE"));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Ada Lovelace"), "AL");
        assert_eq!(initials("Plato"), "P");
    }
}
