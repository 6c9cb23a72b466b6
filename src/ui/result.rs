use iced::widget::{button, column, container, image, row, text, Space};
use iced::{Alignment, Color, ContentFit, Element, Length};

use super::{solid, Strings};
use crate::state::flow::AnalysisState;
use crate::Message;

/// The reveal: the secret image as if it were the photo just taken
pub fn view<'a>(
    strings: &'static Strings,
    secret: Option<&'a image::Handle>,
    analysis: &'a AnalysisState,
    notice: Option<&'a str>,
) -> Element<'a, Message> {
    let header = row![
        button(text("←").size(22))
            .on_press(Message::BackToCamera)
            .style(button::text),
        Space::with_width(Length::Fill),
        text(strings.gallery_title).size(16),
        Space::with_width(Length::Fill),
        Space::with_width(Length::Fixed(40.0)),
    ]
    .align_y(Alignment::Center)
    .padding(16);

    let photo: Element<'a, Message> = match secret {
        Some(handle) => image(handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => Space::new(Length::Fill, Length::Fill).into(),
    };

    let card: Element<'a, Message> = match analysis {
        AnalysisState::Ready(result) => {
            let share = button(text(strings.share).size(14))
                .on_press(Message::ShareResult)
                .style(button::secondary);
            column![
                text(result.title.as_str()).size(22),
                text(format!("\"{}\"", result.description)).size(14),
                share,
            ]
            .spacing(10)
            .into()
        }
        // Idle only shows for the instant before the request starts
        AnalysisState::Loading(_) | AnalysisState::Idle => {
            text(format!("✨ {}", strings.analyzing)).size(16).into()
        }
    };

    let mut footer = column![container(card)
        .padding(20)
        .width(Length::Fill)
        .style(solid(Color::from_rgb(0.11, 0.11, 0.12)))]
    .spacing(8)
    .padding(16);

    if let Some(notice) = notice {
        footer = footer.push(text(notice).size(12));
    }

    container(column![header, photo, footer].height(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(solid(Color::BLACK))
        .into()
}
