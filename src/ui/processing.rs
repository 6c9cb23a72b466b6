use iced::widget::{column, container, text};
use iced::{Alignment, Color, Element, Length};

use super::{solid, Strings};
use crate::Message;

/// Fake "developing" screen; no input is accepted here
pub fn view<'a>(strings: &'static Strings) -> Element<'a, Message> {
    let content = column![
        text("⏳").size(48),
        text(strings.processing_title).size(24),
        text(strings.processing_subtitle).size(14),
    ]
    .spacing(12)
    .align_x(Alignment::Center);

    container(super::fill(content))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(solid(Color::BLACK))
        .into()
}
