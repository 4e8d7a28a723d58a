use iced::widget::{button, column, horizontal_space, row, text};
use iced::{event, keyboard, window, Element, Event, Subscription, Task, Theme};
use tracing::{info, warn};

mod api;
mod config;
mod state;
mod ui;

use api::Client;
use config::Config;
use state::session::Session;
use ui::add_item::UploadLimits;
use ui::login::{self, LoginView};
use ui::people::{self, PeopleView};
use ui::storage::{self, StorageView};

/// Top-level application state.
struct ContentHub {
    config: Config,
    session: Session,
    screen: Screen,
}

enum Screen {
    Login(LoginView),
    Storage(StorageView),
    People(PeopleView),
}

#[derive(Debug, Clone)]
enum Message {
    Login(login::Message),
    Storage(storage::Message),
    People(people::Message),
    OpenStorage,
    OpenPeople,
    ToggleTheme,
    Logout,
    EscapePressed,
    FileHovering(bool),
    FileDropped(std::path::PathBuf),
}

impl ContentHub {
    fn new() -> (Self, Task<Message>) {
        let config = Config::load();
        let session = Session::load();
        let client = Client::new(&config.api_base_url, session.token().map(String::from));

        if session.is_authenticated() {
            info!("existing session found, opening storage");
            let limits = UploadLimits {
                photo_bytes: config.photo_limit_bytes(),
                document_bytes: config.document_limit_bytes(),
            };
            let (view, task) = StorageView::new(client, limits);
            let app = ContentHub {
                config,
                session,
                screen: Screen::Storage(view),
            };
            (app, task.map(Message::Storage))
        } else {
            let app = ContentHub {
                config,
                session,
                screen: Screen::Login(LoginView::new(client)),
            };
            (app, Task::none())
        }
    }

    fn client(&self) -> Client {
        Client::new(
            &self.config.api_base_url,
            self.session.token().map(String::from),
        )
    }

    fn limits(&self) -> UploadLimits {
        UploadLimits {
            photo_bytes: self.config.photo_limit_bytes(),
            document_bytes: self.config.document_limit_bytes(),
        }
    }

    fn open_storage(&mut self) -> Task<Message> {
        let (view, task) = StorageView::new(self.client(), self.limits());
        self.screen = Screen::Storage(view);
        task.map(Message::Storage)
    }

    fn open_people(&mut self) -> Task<Message> {
        let (view, task) = PeopleView::new(self.client(), self.config.people_page_size);
        self.screen = Screen::People(view);
        task.map(Message::People)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Login(msg) => {
                let Screen::Login(view) = &mut self.screen else {
                    return Task::none();
                };
                let (task, action) = view.update(msg);
                match action {
                    login::Action::Authenticated(token) => {
                        if let Err(err) = self.session.store(token) {
                            warn!("could not persist session token: {err}");
                        }
                        self.open_storage()
                    }
                    login::Action::None => task.map(Message::Login),
                }
            }
            Message::Storage(msg) => {
                let Screen::Storage(view) = &mut self.screen else {
                    return Task::none();
                };
                let (task, action) = view.update(msg);
                match action {
                    storage::Action::ExitPersonScope => self.open_people(),
                    storage::Action::None => task.map(Message::Storage),
                }
            }
            Message::People(msg) => {
                let Screen::People(view) = &mut self.screen else {
                    return Task::none();
                };
                let (task, action) = view.update(msg);
                match action {
                    people::Action::ShowStorage(person) => {
                        let (view, task) =
                            StorageView::for_person(self.client(), self.limits(), person);
                        self.screen = Screen::Storage(view);
                        task.map(Message::Storage)
                    }
                    people::Action::None => task.map(Message::People),
                }
            }
            Message::OpenStorage => self.open_storage(),
            Message::OpenPeople => self.open_people(),
            Message::ToggleTheme => {
                self.config.dark_theme = !self.config.dark_theme;
                if let Err(err) = self.config.save() {
                    warn!("could not save config: {err}");
                }
                Task::none()
            }
            Message::Logout => {
                if let Err(err) = self.session.clear() {
                    warn!("could not clear session token: {err}");
                }
                self.screen = Screen::Login(LoginView::new(self.client()));
                Task::none()
            }
            Message::EscapePressed => match &mut self.screen {
                Screen::Storage(view) => {
                    let (task, _) = view.update(storage::Message::EscapePressed);
                    task.map(Message::Storage)
                }
                _ => Task::none(),
            },
            Message::FileHovering(hovering) => match &mut self.screen {
                Screen::Storage(view) => {
                    let (task, _) = view.update(storage::Message::DropHovering(hovering));
                    task.map(Message::Storage)
                }
                _ => Task::none(),
            },
            Message::FileDropped(path) => match &mut self.screen {
                Screen::Storage(view) => {
                    let (task, _) = view.update(storage::Message::DropReceived(path));
                    task.map(Message::Storage)
                }
                _ => Task::none(),
            },
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.screen {
            Screen::Login(view) => return view.view().map(Message::Login),
            Screen::Storage(view) => view.view().map(Message::Storage),
            Screen::People(view) => view.view().map(Message::People),
        };

        let theme_label = if self.config.dark_theme {
            "Light Mode"
        } else {
            "Dark Mode"
        };

        let nav = row![
            button(text("Storage")).style(button::text).on_press(Message::OpenStorage),
            button(text("People")).style(button::text).on_press(Message::OpenPeople),
            horizontal_space(),
            button(text(theme_label)).style(button::text).on_press(Message::ToggleTheme),
            button(text("Log Out")).style(button::text).on_press(Message::Logout),
        ]
        .spacing(4)
        .padding([8.0, 16.0]);

        column![nav, body].into()
    }

    fn subscription(&self) -> Subscription<Message> {
        // Escape and file drops only matter on the storage screen.
        if !matches!(self.screen, Screen::Storage(_)) {
            return Subscription::none();
        }
        let keys = keyboard::on_key_press(|key, _modifiers| match key {
            keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::EscapePressed),
            _ => None,
        });
        Subscription::batch([keys, event::listen_with(handle_event)])
    }

    fn theme(&self) -> Theme {
        if self.config.dark_theme {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Routes native file drag and drop into messages.
fn handle_event(
    event: Event,
    _status: event::Status,
    _window: window::Id,
) -> Option<Message> {
    match event {
        Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovering(true)),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FileHovering(false)),
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        _ => None,
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "content_hub=info".into()),
        )
        .init();

    iced::application("Content Hub", ContentHub::update, ContentHub::view)
        .subscription(ContentHub::subscription)
        .theme(ContentHub::theme)
        .centered()
        .run_with(ContentHub::new)
}
