mod canvas;
mod renderer;
mod text;
mod transform;

pub use canvas::{Canvas, Rgba, Texture, TextureError, TRANSPARENT};
pub use renderer::{Renderer, Viewport};
pub use text::{draw_text, glyph_advance, line_advance, text_width, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use transform::{room_origin, ViewRect, MAX_ZOOM, MIN_ZOOM};
