/// Login screen
///
/// Email/password form, with a second code-entry step when the backend
/// answers `requiresVerification` instead of a token. On success the
/// shell receives the token and swaps in the storage screen.

use iced::widget::{button, center, column, container, text, text_input};
use iced::{Alignment, Element, Task};
use tracing::error;

use crate::api::{self, auth::LoginOutcome, ApiError, Client};
use crate::ui;

#[derive(Debug, Clone)]
pub enum Message {
    EmailChanged(String),
    PasswordChanged(String),
    CodeChanged(String),
    Submit,
    Finished(Result<LoginOutcome, ApiError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    /// Login completed; the token goes into the session store.
    Authenticated(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Credentials,
    Verification,
}

pub struct LoginView {
    client: Client,
    step: Step,
    email: String,
    password: String,
    code: String,
    submitting: bool,
    error: Option<String>,
}

impl LoginView {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            step: Step::Credentials,
            email: String::new(),
            password: String::new(),
            code: String::new(),
            submitting: false,
            error: None,
        }
    }

    fn can_submit(&self) -> bool {
        if self.submitting {
            return false;
        }
        match self.step {
            Step::Credentials => {
                !self.email.trim().is_empty() && !self.password.is_empty()
            }
            Step::Verification => !self.code.trim().is_empty(),
        }
    }

    pub fn update(&mut self, message: Message) -> (Task<Message>, Action) {
        match message {
            Message::EmailChanged(email) => {
                self.email = email;
                (Task::none(), Action::None)
            }
            Message::PasswordChanged(password) => {
                self.password = password;
                (Task::none(), Action::None)
            }
            Message::CodeChanged(code) => {
                self.code = code;
                (Task::none(), Action::None)
            }
            Message::Submit => {
                if !self.can_submit() {
                    return (Task::none(), Action::None);
                }
                self.submitting = true;
                self.error = None;
                let client = self.client.clone();
                let email = self.email.trim().to_string();
                let task = match self.step {
                    Step::Credentials => Task::perform(
                        api::auth::login(client, email, self.password.clone()),
                        Message::Finished,
                    ),
                    Step::Verification => Task::perform(
                        api::auth::verify(client, email, self.code.trim().to_string()),
                        Message::Finished,
                    ),
                };
                (task, Action::None)
            }
            Message::Finished(result) => {
                self.submitting = false;
                match result {
                    Ok(outcome) => {
                        if let Some(token) = outcome.token {
                            return (Task::none(), Action::Authenticated(token));
                        }
                        if outcome.requires_verification {
                            self.step = Step::Verification;
                            if let Some(email) = outcome.email {
                                self.email = email;
                            }
                            return (Task::none(), Action::None);
                        }
                        self.error =
                            Some("Unexpected response from the server.".to_string());
                        (Task::none(), Action::None)
                    }
                    Err(ApiError::Status { code: 401, .. }) => {
                        self.error = Some("Invalid email or password.".to_string());
                        (Task::none(), Action::None)
                    }
                    Err(err) => {
                        error!("login failed: {err}");
                        self.error = Some("Login failed. Please try again.".to_string());
                        (Task::none(), Action::None)
                    }
                }
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut form = column![text("Content Hub").size(28)]
            .spacing(14)
            .align_x(Alignment::Center);

        match self.step {
            Step::Credentials => {
                form = form
                    .push(
                        text_input("Email", &self.email)
                            .on_input(Message::EmailChanged)
                            .on_submit(Message::Submit),
                    )
                    .push(
                        text_input("Password", &self.password)
                            .secure(true)
                            .on_input(Message::PasswordChanged)
                            .on_submit(Message::Submit),
                    );
            }
            Step::Verification => {
                form = form
                    .push(text(format!(
                        "Enter the verification code sent to {}",
                        self.email
                    )))
                    .push(
                        text_input("Verification code", &self.code)
                            .on_input(Message::CodeChanged)
                            .on_submit(Message::Submit),
                    );
            }
        }

        if let Some(message) = &self.error {
            form = form.push(ui::error_text(message));
        }

        let label = match (self.step, self.submitting) {
            (_, true) => "Signing in...",
            (Step::Credentials, false) => "Sign In",
            (Step::Verification, false) => "Verify",
        };
        let mut submit = button(text(label));
        if self.can_submit() {
            submit = submit.on_press(Message::Submit);
        }
        form = form.push(submit);

        center(container(form).padding(30).width(360).style(ui::card_style)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> LoginView {
        LoginView::new(Client::new("http://localhost:1", None))
    }

    fn filled() -> LoginView {
        let mut view = view();
        let _ = view.update(Message::EmailChanged("a@b.c".to_string()));
        let _ = view.update(Message::PasswordChanged("hunter2".to_string()));
        view
    }

    #[test]
    fn test_submit_requires_both_fields() {
        let mut view = view();
        assert!(!view.can_submit());
        let _ = view.update(Message::EmailChanged("a@b.c".to_string()));
        assert!(!view.can_submit());
        let _ = view.update(Message::PasswordChanged("hunter2".to_string()));
        assert!(view.can_submit());
    }

    #[test]
    fn test_token_response_authenticates() {
        let mut view = filled();
        let (_, action) = view.update(Message::Finished(Ok(LoginOutcome {
            token: Some("jwt-abc".to_string()),
            requires_verification: false,
            email: None,
        })));
        assert_eq!(action, Action::Authenticated("jwt-abc".to_string()));
    }

    #[test]
    fn test_verification_response_switches_step() {
        let mut view = filled();
        let (_, action) = view.update(Message::Finished(Ok(LoginOutcome {
            token: None,
            requires_verification: true,
            email: Some("a@b.c".to_string()),
        })));
        assert_eq!(action, Action::None);
        assert_eq!(view.step, Step::Verification);
        assert!(!view.can_submit(), "code is still empty");
        let _ = view.update(Message::CodeChanged("123456".to_string()));
        assert!(view.can_submit());
    }

    #[test]
    fn test_unauthorized_shows_friendly_error() {
        let mut view = filled();
        let (_, action) = view.update(Message::Finished(Err(ApiError::Status {
            code: 401,
            message: "unauthorized".to_string(),
        })));
        assert_eq!(action, Action::None);
        assert_eq!(view.error.as_deref(), Some("Invalid email or password."));
        assert!(!view.submitting);
    }
}
