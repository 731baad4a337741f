use crate::app::Vec2;

pub const MIN_ZOOM: i32 = 1;
pub const MAX_ZOOM: i32 = 20;
const ZOOM_DIVISIONS: f32 = 40.0;

/// The region of the composed world texture shown in the window. Zooming in
/// shrinks the region symmetrically around its centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub position: Vec2,
    pub size: Vec2,
    original_size: Vec2,
    zoom: i32,
}

impl ViewRect {
    pub fn new(original_size: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            size: original_size,
            original_size,
            zoom: MIN_ZOOM,
        }
    }

    pub fn original_size(&self) -> Vec2 {
        self.original_size
    }

    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    pub fn zoom_step(&self) -> Vec2 {
        self.original_size * (1.0 / ZOOM_DIVISIONS)
    }

    /// Applies `steps` scroll notches. Returns false, leaving the rect
    /// untouched, when the zoom would leave `MIN_ZOOM..=MAX_ZOOM`.
    pub fn apply_scroll(&mut self, steps: i32) -> bool {
        if steps == 0 {
            return false;
        }
        let Some(next) = self.zoom.checked_add(steps) else {
            return false;
        };
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&next) {
            return false;
        }
        let step = self.zoom_step();
        self.zoom = next;
        self.position += step * steps as f32;
        self.size = self.size - step * (2.0 * steps as f32);
        true
    }

    /// Maps a device-space mouse position into the composed texture's space.
    pub fn scaled_mouse(&self, mouse: Vec2, window: Vec2) -> Vec2 {
        if window.x <= 0.0 || window.y <= 0.0 {
            return self.position;
        }
        Vec2::new(self.size.x / window.x, self.size.y / window.y).scale(mouse) + self.position
    }
}

/// Top-left corner of a room in content space. Dev positions are stored at
/// twice the on-screen scale.
pub fn room_origin(drag_position: Vec2, dev_position: Vec2) -> Vec2 {
    drag_position + dev_position * 0.5
}
