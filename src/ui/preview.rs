use iced::widget::{center, container, image, mouse_area, opaque, stack};
use iced::{Color, ContentFit, Element, Length};

use crate::fetch::LoadedImage;
use crate::Message;

/// Full-size preview overlay.
///
/// Stacks a dimmed backdrop over the gallery with the selected image scaled
/// to fit the window; clicking anywhere dismisses it. Holds no state of its
/// own — the selection lives in the gallery state.
pub fn overlay<'a>(base: Element<'a, Message>, selected: &LoadedImage) -> Element<'a, Message> {
    let picture = image(selected.handle.clone())
        .width(Length::Fill)
        .height(Length::Fill)
        .content_fit(ContentFit::Contain);

    let backdrop = center(picture).padding(40).style(|_theme| container::Style {
        background: Some(Color { a: 0.85, ..Color::BLACK }.into()),
        ..container::Style::default()
    });

    let dismiss = mouse_area(backdrop).on_press(Message::ClosePreview);

    stack![base, opaque(dismiss)].into()
}
