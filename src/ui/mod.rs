/// UI modules
///
/// One module per screen or modal, each following the same shape:
/// a state struct, a `Message` enum, `update` returning a `Task` plus
/// an `Action` for the parent, and a `view`.

pub mod add_item;
pub mod login;
pub mod people;
pub mod photo;
pub mod storage;

use iced::widget::{center, container, mouse_area, opaque, stack, text};
use iced::{border, Color, Element, Theme};

/// Accent used for inline error messages.
pub const ERROR_RED: Color = Color::from_rgb(0.86, 0.25, 0.25);

/// Violet marker used for celebrity badges.
pub const CELEBRITY_VIOLET: Color = Color::from_rgb(0.55, 0.36, 0.96);

/// File sizes are shown in whole kilobytes, like the web client did.
pub fn format_size(bytes: u64) -> String {
    format!("{} KB", bytes.div_ceil(1024))
}

/// `FEMALE` -> `Female`
pub fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

pub fn error_text<'a, M: 'a>(message: &str) -> Element<'a, M> {
    text(message.to_string()).size(14).color(ERROR_RED).into()
}

/// Surface style for cards and panels.
pub fn card_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.background.weak.color.into()),
        border: border::rounded(10),
        ..container::Style::default()
    }
}

/// Small rounded chips for labels and emotions.
pub fn chip_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.secondary.weak.color.into()),
        border: border::rounded(12),
        ..container::Style::default()
    }
}

/// Stack `content` over `base` behind a dimmed, click-to-dismiss
/// backdrop. The opaque layer swallows events, so the list underneath
/// cannot scroll while a modal is open.
pub fn modal<'a, Message: Clone + 'a>(
    base: Element<'a, Message>,
    content: Element<'a, Message>,
    on_backdrop: Option<Message>,
) -> Element<'a, Message> {
    let backdrop = center(opaque(content)).style(|_theme| container::Style {
        background: Some(
            Color {
                a: 0.7,
                ..Color::BLACK
            }
            .into(),
        ),
        ..container::Style::default()
    });

    let mut area = mouse_area(backdrop);
    if let Some(message) = on_backdrop {
        area = area.on_press(message);
    }

    stack![base, opaque(area)].into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_rounds_up() {
        assert_eq!(format_size(0), "0 KB");
        assert_eq!(format_size(1), "1 KB");
        assert_eq!(format_size(10 * 1024), "10 KB");
        assert_eq!(format_size(10 * 1024 + 1), "11 KB");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("FEMALE"), "Female");
        assert_eq!(title_case("happy"), "Happy");
        assert_eq!(title_case(""), "");
    }
}
