mod frame;
mod input;
mod loop_runner;
mod rendering;

pub use frame::{AppHandler, FrameCommand, InputSnapshot, Vec2};
pub use input::{EditorKey, KeyEdges};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{
    draw_text, glyph_advance, line_advance, room_origin, text_width, Canvas, Renderer, Rgba,
    Texture, TextureError, ViewRect, Viewport, GLYPH_HEIGHT, GLYPH_WIDTH, MAX_ZOOM, MIN_ZOOM,
    TRANSPARENT,
};
