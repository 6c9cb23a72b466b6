use iced::widget::{button, column, container, image, row, text};
use iced::{Alignment, ContentFit, Element, Length};

use super::Strings;
use crate::error::ImageError;
use crate::state::data::SecretImage;
use crate::Message;

/// An image picked in Setup but not confirmed yet
#[derive(Debug, Clone)]
pub struct Draft {
    pub image: SecretImage,
    pub handle: image::Handle,
}

impl Draft {
    pub fn new(image: SecretImage) -> Self {
        let handle = image::Handle::from_bytes(image.bytes().to_vec());
        Self { image, handle }
    }
}

/// Picker state of the Setup screen
///
/// A failed read drops the previous draft, so the user never confirms
/// an image other than the one they last picked.
#[derive(Debug, Default)]
pub struct SetupForm {
    draft: Option<Draft>,
    loading: bool,
    failed: bool,
}

impl SetupForm {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a file read. Returns false if one is already running.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.failed = false;
        true
    }

    pub fn loaded(&mut self, result: Result<SecretImage, ImageError>) {
        self.loading = false;
        match result {
            Ok(image) => {
                tracing::info!(name = ?image.name(), mime = image.mime(), "🖼️  Secret image loaded");
                self.draft = Some(Draft::new(image));
            }
            Err(err) => {
                tracing::warn!(error = %err, "⚠️  Could not use the selected file");
                self.draft = None;
                self.failed = true;
            }
        }
    }

    pub fn take_draft(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// Put back a draft whose confirmation was rejected
    pub fn restore(&mut self, draft: Draft) {
        self.draft = Some(draft);
    }

    pub fn picker(&self) -> Picker<'_> {
        if self.loading {
            Picker::Loading
        } else if self.failed {
            Picker::Failed
        } else {
            match &self.draft {
                Some(draft) => Picker::Chosen(&draft.handle),
                None => Picker::Empty,
            }
        }
    }
}

/// What the setup screen shows in the picker slot
#[derive(Debug, Clone, Copy)]
pub enum Picker<'a> {
    Empty,
    Loading,
    Failed,
    Chosen(&'a image::Handle),
}

pub fn view<'a>(
    strings: &'static Strings,
    picker: Picker<'a>,
    notice: Option<&'a str>,
) -> Element<'a, Message> {
    let slot: Element<'a, Message> = match picker {
        Picker::Chosen(handle) => image(handle.clone())
            .content_fit(ContentFit::Cover)
            .width(Length::Fill)
            .height(Length::Fixed(240.0))
            .into(),
        Picker::Loading => text(strings.loading_file).size(16).into(),
        Picker::Empty | Picker::Failed => column![
            text("📷").size(40),
            text(strings.upload_prompt).size(18),
            text(strings.upload_hint).size(12),
        ]
        .spacing(6)
        .align_x(Alignment::Center)
        .into(),
    };

    let picker_button = button(
        container(slot)
            .width(Length::Fill)
            .height(Length::Fixed(240.0))
            .center_x(Length::Fill)
            .center_y(Length::Fixed(240.0)),
    )
    .on_press(Message::PickImage)
    .style(button::secondary)
    .width(Length::Fill);

    let mut start = button(text(strings.start_camera).size(18))
        .padding(14)
        .width(Length::Fill);
    if matches!(picker, Picker::Chosen(_)) {
        start = start.on_press(Message::ConfirmSetup);
    }

    let mut content = column![
        text(strings.setup_heading).size(36),
        text(strings.setup_blurb).size(14),
        picker_button,
    ]
    .spacing(20)
    .padding(40)
    .max_width(480)
    .align_x(Alignment::Center);

    if matches!(picker, Picker::Failed) {
        content = content.push(text(strings.image_error).size(14));
    }

    content = content
        .push(start)
        .push(text(strings.setup_tip).size(12))
        .push(
            row![button(text(strings.share_with_friends).size(14))
                .on_press(Message::ShareApp)
                .style(button::text)]
            .align_y(Alignment::Center),
        );

    if let Some(notice) = notice {
        content = content.push(text(notice).size(12));
    }

    super::fill(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat() -> SecretImage {
        SecretImage::from_bytes(Some("cat.jpg".into()), vec![0xFF, 0xD8, 0xFF, 0xE0]).unwrap()
    }

    #[test]
    fn test_new_form_is_empty() {
        assert!(matches!(SetupForm::default().picker(), Picker::Empty));
    }

    #[test]
    fn test_loaded_image_is_chosen() {
        let mut form = SetupForm::default();
        assert!(form.begin_load());
        assert!(matches!(form.picker(), Picker::Loading));
        assert!(form.is_loading());
        assert!(!form.begin_load());

        form.loaded(Ok(cat()));
        assert!(matches!(form.picker(), Picker::Chosen(_)));
        assert_eq!(form.take_draft().map(|d| d.image), Some(cat()));
        assert!(matches!(form.picker(), Picker::Empty));
    }

    #[test]
    fn test_failed_read_replaces_previous_choice() {
        let mut form = SetupForm::default();
        form.begin_load();
        form.loaded(Ok(cat()));

        form.begin_load();
        form.loaded(Err(ImageError::Empty));
        assert!(matches!(form.picker(), Picker::Failed));
        assert!(form.take_draft().is_none());
    }

    #[test]
    fn test_new_pick_clears_the_error() {
        let mut form = SetupForm::default();
        form.begin_load();
        form.loaded(Err(ImageError::Empty));

        form.begin_load();
        assert!(matches!(form.picker(), Picker::Loading));
        form.loaded(Ok(cat()));
        assert!(matches!(form.picker(), Picker::Chosen(_)));
    }

    #[test]
    fn test_restored_draft_is_chosen_again() {
        let mut form = SetupForm::default();
        form.begin_load();
        form.loaded(Ok(cat()));

        let draft = form.take_draft().unwrap();
        form.restore(draft);
        assert!(matches!(form.picker(), Picker::Chosen(_)));
    }
}
