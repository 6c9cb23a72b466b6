use iced::widget::{button, canvas, column, container, image, row, stack, text, Space};
use iced::{Alignment, Color, ContentFit, Element, Length};

use super::viewfinder::Viewfinder;
use super::{solid, Strings};
use crate::camera::{FrameFormat, PreviewFrame};
use crate::state::flow::CameraStatus;
use crate::Message;

/// Turn a preview frame into something the image widget can draw
pub fn preview_handle(frame: &PreviewFrame) -> image::Handle {
    match frame.format {
        FrameFormat::Jpeg => image::Handle::from_bytes(frame.data.to_vec()),
        FrameFormat::Rgba => image::Handle::from_rgba(frame.width, frame.height, frame.data.to_vec()),
    }
}

pub fn view<'a>(
    strings: &'static Strings,
    status: &'a CameraStatus,
    flash: bool,
    preview: Option<&'a image::Handle>,
) -> Element<'a, Message> {
    let feed: Element<'a, Message> = match (status, preview) {
        (CameraStatus::NoAccess(_), _) => super::fill(
            column![
                text(strings.no_access_title).size(20),
                text(strings.no_access_body).size(14),
            ]
            .spacing(8)
            .align_x(Alignment::Center),
        ),
        (_, Some(handle)) => image(handle.clone())
            .content_fit(ContentFit::Cover)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        (_, None) => container(Space::new(Length::Fill, Length::Fill))
            .style(solid(Color::BLACK))
            .into(),
    };

    let top_bar = row![
        button(text("←").size(22))
            .on_press(Message::BackToSetup)
            .style(button::text),
        Space::with_width(Length::Fill),
        container(text(strings.hd_badge).size(12))
            .padding([4, 8])
            .style(solid(Color::from_rgba(0.0, 0.0, 0.0, 0.5))),
    ]
    .align_y(Alignment::Center)
    .padding(16);

    let mut shutter = button(Space::new(Length::Fixed(64.0), Length::Fixed(64.0)))
        .style(button::secondary);
    if !matches!(status, CameraStatus::NoAccess(_)) && !flash {
        shutter = shutter.on_press(Message::Shutter);
    }

    // The gallery button is the disguised reset control
    let controls = row![
        button(text("🖼").size(24))
            .on_press(Message::HiddenTap)
            .style(button::text),
        Space::with_width(Length::Fill),
        shutter,
        Space::with_width(Length::Fill),
        button(text("🔄").size(24))
            .on_press(Message::FlipCamera)
            .style(button::text),
    ]
    .align_y(Alignment::Center)
    .padding(24);

    let chrome = column![top_bar, Space::with_height(Length::Fill), controls]
        .width(Length::Fill)
        .height(Length::Fill);

    let mut layers = stack![feed];
    if matches!(status, CameraStatus::Live) {
        layers = layers.push(
            canvas(Viewfinder)
                .width(Length::Fill)
                .height(Length::Fill),
        );
    }
    layers = layers.push(chrome);
    if flash {
        layers = layers.push(
            container(Space::new(Length::Fill, Length::Fill)).style(solid(Color::WHITE)),
        );
    }

    container(layers.width(Length::Fill).height(Length::Fill))
        .style(solid(Color::BLACK))
        .into()
}
