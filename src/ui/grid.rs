use iced::widget::{container, image, mouse_area, text, Column, Row};
use iced::{mouse, Element, Length, Rectangle};

use crate::state::{LoadPhase, Tile};
use crate::Message;

/// Edge length of one square grid cell. Cells never resize — a loaded image
/// is fitted inside its cell, so late loads cause no layout shift.
pub const CELL: f32 = 220.0;
/// Gap between cells and rows
pub const SPACING: f32 = 10.0;
/// Padding around the whole grid inside the scrollable
pub const PADDING: f32 = 10.0;
/// A tile counts as visible once this share of its area is in the viewport
pub const VISIBILITY_THRESHOLD: f32 = 0.1;

/// How many cells fit per row for a given viewport width (at least one)
pub fn columns_for_width(width: f32) -> usize {
    let usable = width - 2.0 * PADDING + SPACING;
    ((usable / (CELL + SPACING)).floor() as usize).max(1)
}

/// Rectangle of the cell at `index`, in grid content coordinates
pub fn cell_rect(index: usize, columns: usize) -> Rectangle {
    let col = (index % columns) as f32;
    let row = (index / columns) as f32;
    Rectangle {
        x: PADDING + col * (CELL + SPACING),
        y: PADDING + row * (CELL + SPACING),
        width: CELL,
        height: CELL,
    }
}

/// Share of `cell`'s area that overlaps `window` (0.0 when disjoint)
pub fn visible_ratio(cell: &Rectangle, window: &Rectangle) -> f32 {
    match cell.intersection(window) {
        Some(overlap) => (overlap.width * overlap.height) / (cell.width * cell.height),
        None => 0.0,
    }
}

/// Visibility sweep: indices of `Pending` tiles whose cell meets the
/// threshold against `window` (the scroll viewport in content coordinates).
/// The caller triggers the returned tiles; triggering is one-shot, so tiles
/// already past `Pending` are skipped here.
pub fn newly_visible(tiles: &[Tile], columns: usize, window: Rectangle) -> Vec<usize> {
    tiles
        .iter()
        .enumerate()
        .filter(|(_, tile)| matches!(tile.phase, LoadPhase::Pending))
        .filter(|(index, _)| visible_ratio(&cell_rect(*index, columns), &window) >= VISIBILITY_THRESHOLD)
        .map(|(index, _)| index)
        .collect()
}

/// Fit natural pixel dimensions inside a square of edge `max`, preserving
/// aspect ratio. This pre-sizes the image box before it is shown.
pub fn fit_within(width: u32, height: u32, max: f32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (max, max);
    }
    let scale = (max / width as f32).min(max / height as f32);
    (width as f32 * scale, height as f32 * scale)
}

/// Build the grid widget: fixed-size cells in rows of `columns`
pub fn view(tiles: &[Tile], columns: usize) -> Element<'_, Message> {
    let columns = columns.max(1);
    let mut grid = Column::new().spacing(SPACING);
    for (row_index, chunk) in tiles.chunks(columns).enumerate() {
        let mut cells = Row::new().spacing(SPACING);
        for (col_index, tile) in chunk.iter().enumerate() {
            cells = cells.push(cell(tile, row_index * columns + col_index));
        }
        grid = grid.push(cells);
    }
    container(grid).padding(PADDING).into()
}

fn cell(tile: &Tile, index: usize) -> Element<'_, Message> {
    let content: Element<'_, Message> = match &tile.phase {
        LoadPhase::Pending => text("").into(),
        LoadPhase::Triggered => text("Loading...").size(14).into(),
        LoadPhase::Loaded(img) => {
            let (width, height) = fit_within(img.width, img.height, CELL);
            mouse_area(image(img.handle.clone()).width(width).height(height))
                .interaction(mouse::Interaction::Pointer)
                .on_press(Message::OpenPreview(index))
                .into()
        }
    };

    container(content)
        .width(CELL)
        .height(CELL)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .style(container::rounded_box)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ImageRecord;
    use chrono::DateTime;

    fn tiles(n: usize) -> Vec<Tile> {
        (0..n)
            .map(|i| Tile {
                record: ImageRecord {
                    url: format!("https://x/{i}.png"),
                    last_modified: DateTime::UNIX_EPOCH,
                },
                phase: LoadPhase::Pending,
            })
            .collect()
    }

    fn window(y: f32, width: f32, height: f32) -> Rectangle {
        Rectangle {
            x: 0.0,
            y,
            width,
            height,
        }
    }

    #[test]
    fn columns_never_drop_to_zero() {
        assert_eq!(columns_for_width(0.0), 1);
        assert_eq!(columns_for_width(CELL), 1);
        // Four cells plus three gaps plus padding
        assert_eq!(columns_for_width(4.0 * CELL + 3.0 * SPACING + 2.0 * PADDING), 4);
    }

    #[test]
    fn cell_rects_tile_the_grid() {
        let a = cell_rect(0, 3);
        let b = cell_rect(1, 3);
        let d = cell_rect(3, 3);
        assert_eq!(a.y, b.y);
        assert_eq!(b.x - a.x, CELL + SPACING);
        assert_eq!(d.x, a.x);
        assert_eq!(d.y - a.y, CELL + SPACING);
    }

    #[test]
    fn ratio_is_zero_when_disjoint_and_one_when_contained() {
        let cell = cell_rect(0, 1);
        assert_eq!(visible_ratio(&cell, &window(10_000.0, 1000.0, 500.0)), 0.0);
        assert!((visible_ratio(&cell, &window(0.0, 1000.0, 1000.0)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn threshold_at_ten_percent_of_cell_area() {
        let cell = cell_rect(0, 1);
        // Full-width overlap, so area ratio equals height ratio: a window
        // cutting the cell at 11% of its height is in, at 9% it is out
        let just_visible = window(0.0, 1000.0, cell.y + cell.height * 0.11);
        let just_hidden = window(0.0, 1000.0, cell.y + cell.height * 0.09);
        assert!(visible_ratio(&cell, &just_visible) >= VISIBILITY_THRESHOLD);
        assert!(visible_ratio(&cell, &just_hidden) < VISIBILITY_THRESHOLD);
    }

    #[test]
    fn sweep_skips_non_pending_tiles() {
        let mut tiles = tiles(4);
        tiles[1].phase = LoadPhase::Triggered;
        // Two columns, everything on screen
        let seen = newly_visible(&tiles, 2, window(0.0, 1000.0, 1000.0));
        assert_eq!(seen, vec![0, 2, 3]);
    }

    #[test]
    fn sweep_respects_scroll_offset() {
        // Ten rows of one column; a window scrolled past the first five rows
        let tiles = tiles(10);
        let scrolled = window(5.0 * (CELL + SPACING) + PADDING, 1000.0, 2.0 * (CELL + SPACING));
        let seen = newly_visible(&tiles, 1, scrolled);
        assert!(!seen.contains(&0));
        assert!(seen.contains(&5));
        assert!(seen.contains(&6));
    }

    #[test]
    fn fit_preserves_aspect_and_never_exceeds_the_cell() {
        let (w, h) = fit_within(4000, 1000, CELL);
        assert!((w - CELL).abs() < 1e-3);
        assert!((h - CELL / 4.0).abs() < 1e-3);

        let (w, h) = fit_within(300, 600, CELL);
        assert!(w <= CELL && h <= CELL);
        assert!((w / h - 0.5).abs() < 1e-3);
    }
}
