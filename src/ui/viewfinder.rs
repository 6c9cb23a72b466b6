use iced::mouse::Cursor;
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::Message;

/// Side of the focus box in logical pixels
const FOCUS_BOX_SIZE: f32 = 192.0;
/// Length of each corner bracket
const BRACKET_LENGTH: f32 = 16.0;

/// Decorative focus box drawn over the live preview
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewfinder;

impl Program<Message> for Viewfinder {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let focus = focus_box(bounds.size());

        frame.stroke(
            &Path::rectangle(focus.position(), focus.size()),
            Stroke::default()
                .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.3))
                .with_width(1.0),
        );

        let brackets = Path::new(|builder| {
            for (from, to) in corner_brackets(focus, BRACKET_LENGTH) {
                builder.move_to(from);
                builder.line_to(to);
            }
        });
        frame.stroke(
            &brackets,
            Stroke::default()
                .with_color(Color::from_rgba(0.98, 0.8, 0.08, 0.8))
                .with_width(2.0),
        );

        vec![frame.into_geometry()]
    }
}

/// Focus box centered in `bounds`, shrunk to fit small windows
pub fn focus_box(bounds: Size) -> Rectangle {
    let side = FOCUS_BOX_SIZE.min(bounds.width).min(bounds.height);
    Rectangle {
        x: (bounds.width - side) / 2.0,
        y: (bounds.height - side) / 2.0,
        width: side,
        height: side,
    }
}

/// Two segments per corner: one horizontal, one vertical
pub fn corner_brackets(rect: Rectangle, length: f32) -> Vec<(Point, Point)> {
    let length = length.min(rect.width / 2.0).min(rect.height / 2.0);
    let (left, top) = (rect.x, rect.y);
    let (right, bottom) = (rect.x + rect.width, rect.y + rect.height);

    let corners = [
        (Point::new(left, top), 1.0, 1.0),
        (Point::new(right, top), -1.0, 1.0),
        (Point::new(left, bottom), 1.0, -1.0),
        (Point::new(right, bottom), -1.0, -1.0),
    ];

    corners
        .iter()
        .flat_map(|&(corner, dx, dy)| {
            [
                (corner, Point::new(corner.x + dx * length, corner.y)),
                (corner, Point::new(corner.x, corner.y + dy * length)),
            ]
        })
        .collect()
}
