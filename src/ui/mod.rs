/// UI module
///
/// One view function per screen. Views only read state; every
/// interaction is a `Message` handled in `main.rs`.

pub mod camera;
pub mod processing;
pub mod result;
pub mod setup;
pub mod strings;
pub mod viewfinder;

use iced::widget::{button, column, container, text};
use iced::{Alignment, Background, Color, Element, Length, Theme};

use crate::Message;
pub use strings::{strings, Strings};

/// Shown when a screen needs the secret image and there is none
pub fn invalid<'a>(strings: &'static Strings) -> Element<'a, Message> {
    let content = column![
        text(strings.invalid_title).size(28),
        text(strings.invalid_body).size(16),
        button(strings.start_over)
            .on_press(Message::Recover)
            .padding(10),
    ]
    .spacing(16)
    .align_x(Alignment::Center);

    fill(content)
}

/// Center `content` on a full-window container
pub fn fill<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Solid background for overlays (flash, badges)
pub fn solid(color: Color) -> impl Fn(&Theme) -> container::Style {
    move |_theme| container::Style {
        background: Some(Background::Color(color)),
        text_color: Some(Color::WHITE),
        ..container::Style::default()
    }
}
