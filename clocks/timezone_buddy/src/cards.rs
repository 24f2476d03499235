//! Card module - grid geometry, hit testing and drag-to-reorder
//!
//! Cards flow left to right, top to bottom in selection order. A drag that
//! ends on another card becomes a `Reorder` command.

use nannou::prelude::*;
use shared::Command;

/// Card dimensions
pub const CARD_WIDTH: f32 = 260.0;
pub const CARD_HEIGHT: f32 = 170.0;
/// Space between cards
pub const CARD_GAP: f32 = 20.0;
/// Side of the square remove button in the card's top-right corner
pub const REMOVE_BUTTON_SIZE: f32 = 22.0;

/// Pointer travel before a press turns into a drag
const DRAG_THRESHOLD: f32 = 6.0;

/// Area available to the card grid
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub columns: usize,
}

impl GridLayout {
    /// Lay out the grid to the right of the side panel
    pub fn calculate(window_rect: Rect, left_panel_width: f32, header_height: f32) -> Self {
        let margin = 24.0;
        let left = window_rect.left() + left_panel_width + margin;
        let right = window_rect.right() - margin;
        let top = window_rect.top() - header_height;
        let bottom = window_rect.bottom() + margin;

        let width = (right - left).max(CARD_WIDTH);
        let columns = (((width + CARD_GAP) / (CARD_WIDTH + CARD_GAP)).floor() as usize).max(1);

        Self {
            left,
            right,
            top,
            bottom,
            columns,
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Rectangle of the card at `index` in display order
    pub fn card_rect(&self, index: usize) -> Rect {
        let col = index % self.columns;
        let row = index / self.columns;

        // Center the used columns horizontally
        let used = self.columns as f32 * (CARD_WIDTH + CARD_GAP) - CARD_GAP;
        let start_x = self.center_x() - used / 2.0 + CARD_WIDTH / 2.0;

        let x = start_x + col as f32 * (CARD_WIDTH + CARD_GAP);
        let y = self.top - CARD_HEIGHT / 2.0 - row as f32 * (CARD_HEIGHT + CARD_GAP);
        Rect::from_x_y_w_h(x, y, CARD_WIDTH, CARD_HEIGHT)
    }

    /// Index of the card under `pos`
    pub fn hit_test(&self, pos: Point2, count: usize) -> Option<usize> {
        (0..count).find(|&i| self.card_rect(i).contains(pos))
    }
}

/// Remove button rectangle for a card
pub fn remove_button_rect(card: Rect) -> Rect {
    Rect::from_x_y_w_h(
        card.right() - REMOVE_BUTTON_SIZE / 2.0 - 8.0,
        card.top() - REMOVE_BUTTON_SIZE / 2.0 - 8.0,
        REMOVE_BUTTON_SIZE,
        REMOVE_BUTTON_SIZE,
    )
}

/// In-progress card drag
#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    pub zone_id: String,
    pub origin: Point2,
    pub pointer: Point2,
}

impl Drag {
    pub fn new(zone_id: String, origin: Point2) -> Self {
        Self {
            zone_id,
            origin,
            pointer: origin,
        }
    }

    /// Whether the pointer moved far enough to count as a drag
    pub fn is_active(&self) -> bool {
        self.origin.distance(self.pointer) >= DRAG_THRESHOLD
    }

    /// Offset to draw the dragged card at
    pub fn delta(&self) -> Vec2 {
        self.pointer - self.origin
    }

    /// Command for dropping on the card with `target_id`, if it moves anything
    pub fn drop_on(&self, target_id: Option<&str>) -> Option<Command> {
        let target = target_id?;
        if !self.is_active() || target == self.zone_id {
            return None;
        }
        Some(Command::Reorder {
            dragged: self.zone_id.clone(),
            target: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: f32) -> GridLayout {
        let window = Rect::from_x_y_w_h(0.0, 0.0, width, 800.0);
        GridLayout::calculate(window, 300.0, 100.0)
    }

    #[test]
    fn test_columns_fit_width() {
        // 1400 - 300 - 48 = 1052 wide: three 260px cards with 20px gaps
        assert_eq!(layout(1400.0).columns, 3);
        assert_eq!(layout(400.0).columns, 1);
    }

    #[test]
    fn test_cards_flow_in_rows() {
        let grid = layout(1400.0);
        let first = grid.card_rect(0);
        let second = grid.card_rect(1);
        let fourth = grid.card_rect(3);

        assert!(second.x() > first.x());
        assert_eq!(second.y(), first.y());
        assert_eq!(fourth.x(), first.x());
        assert!(fourth.y() < first.y());
        assert!(first.top() <= grid.top);
    }

    #[test]
    fn test_hit_test() {
        let grid = layout(1400.0);
        let center = grid.card_rect(2).xy();
        assert_eq!(grid.hit_test(center, 5), Some(2));
        assert_eq!(grid.hit_test(center, 2), None);

        let gap = pt2(
            grid.card_rect(0).right() + CARD_GAP / 2.0,
            grid.card_rect(0).y(),
        );
        assert_eq!(grid.hit_test(gap, 5), None);
    }

    #[test]
    fn test_remove_button_inside_card() {
        let card = layout(1400.0).card_rect(0);
        let button = remove_button_rect(card);
        assert!(card.contains(button.top_right()));
        assert!(card.contains(button.bottom_left()));
    }

    #[test]
    fn test_drag_drop() {
        let mut drag = Drag::new("paris".to_string(), pt2(0.0, 0.0));
        // A click without movement reorders nothing
        assert_eq!(drag.drop_on(Some("tokyo")), None);

        drag.pointer = pt2(40.0, -10.0);
        assert!(drag.is_active());
        assert_eq!(drag.delta(), vec2(40.0, -10.0));
        assert_eq!(drag.drop_on(Some("paris")), None);
        assert_eq!(drag.drop_on(None), None);
        assert_eq!(
            drag.drop_on(Some("tokyo")),
            Some(Command::Reorder {
                dragged: "paris".to_string(),
                target: "tokyo".to_string(),
            })
        );
    }
}
