use std::ops::{Add, AddAssign, Mul, Sub};

use super::input::{EditorKey, KeyEdges};
use super::rendering::Canvas;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise product.
    pub fn scale(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x * other.x, self.y * other.y)
    }

    /// True when `point` lies within `radius` of `self` on both axes.
    pub fn within_box(self, point: Vec2, radius: f32) -> bool {
        point.x >= self.x - radius
            && point.x <= self.x + radius
            && point.y >= self.y - radius
            && point.y <= self.y + radius
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Per-frame view of the window and input devices. Rebuilt every frame by the
/// loop runner; click and key fields are one-shot edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    right_click_pressed: bool,
    left_mouse_down: bool,
    scroll_steps: i32,
    keys: KeyEdges,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quit_requested: bool,
        cursor_position_px: Option<Vec2>,
        left_click_pressed: bool,
        right_click_pressed: bool,
        left_mouse_down: bool,
        scroll_steps: i32,
        keys: KeyEdges,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            cursor_position_px,
            left_click_pressed,
            right_click_pressed,
            left_mouse_down,
            scroll_steps,
            keys,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    /// A left click edge implies the button is held on the same frame.
    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self.left_mouse_down |= left_click_pressed;
        self
    }

    pub fn with_right_click_pressed(mut self, right_click_pressed: bool) -> Self {
        self.right_click_pressed = right_click_pressed;
        self
    }

    pub fn with_left_mouse_down(mut self, left_mouse_down: bool) -> Self {
        self.left_mouse_down = left_mouse_down;
        self
    }

    pub fn with_scroll_steps(mut self, scroll_steps: i32) -> Self {
        self.scroll_steps = scroll_steps;
        self
    }

    pub fn with_key_pressed(mut self, key: EditorKey) -> Self {
        self.keys.set(key, true);
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    /// Copy with clicks, scroll and key edges removed. Used for widgets that
    /// do not own the pointer this frame; held state and cursor are kept.
    pub fn without_edges(self) -> Self {
        self.without_pointer_edges().without_key_edges()
    }

    pub fn without_pointer_edges(mut self) -> Self {
        self.left_click_pressed = false;
        self.right_click_pressed = false;
        self.scroll_steps = 0;
        self
    }

    pub fn without_key_edges(mut self) -> Self {
        self.keys = KeyEdges::default();
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_click_pressed(&self) -> bool {
        self.right_click_pressed
    }

    pub fn left_mouse_down(&self) -> bool {
        self.left_mouse_down
    }

    pub fn scroll_steps(&self) -> i32 {
        self.scroll_steps
    }

    pub fn key_pressed(&self, key: EditorKey) -> bool {
        self.keys.is_pressed(key)
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCommand {
    Continue,
    Exit,
}

/// The application driven by [`run_app`](super::run_app): one `update` then
/// one `render` per frame, never interleaved.
pub trait AppHandler {
    fn load(&mut self);
    fn update(&mut self, input: &InputSnapshot) -> FrameCommand;
    fn render(&mut self, target: &mut Canvas<'_>);
    fn shutdown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_arithmetic_matches_components() {
        let a = Vec2::new(3.0, -2.0);
        let b = Vec2::new(1.5, 4.0);
        assert_eq!(a + b, Vec2::new(4.5, 2.0));
        assert_eq!(a - b, Vec2::new(1.5, -6.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, -4.0));
        assert_eq!(a.scale(b), Vec2::new(4.5, -8.0));
    }

    #[test]
    fn within_box_is_inclusive() {
        let center = Vec2::new(10.0, 10.0);
        assert!(center.within_box(Vec2::new(16.0, 4.0), 6.0));
        assert!(!center.within_box(Vec2::new(16.1, 10.0), 6.0));
    }

    #[test]
    fn without_edges_keeps_held_state_and_cursor() {
        let snapshot = InputSnapshot::empty()
            .with_cursor_position_px(Some(Vec2::new(5.0, 6.0)))
            .with_left_click_pressed(true)
            .with_right_click_pressed(true)
            .with_scroll_steps(2)
            .with_key_pressed(EditorKey::Save)
            .without_edges();

        assert!(!snapshot.left_click_pressed());
        assert!(!snapshot.right_click_pressed());
        assert!(snapshot.left_mouse_down());
        assert_eq!(snapshot.scroll_steps(), 0);
        assert!(!snapshot.key_pressed(EditorKey::Save));
        assert_eq!(snapshot.cursor_position_px(), Some(Vec2::new(5.0, 6.0)));
    }
}
