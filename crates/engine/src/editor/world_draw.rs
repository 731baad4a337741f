use tracing::info;

use crate::app::{draw_text, room_origin, Canvas, Rgba, Texture, Vec2, TRANSPARENT};
use crate::world::{Layer, LayerSet, WorldData};

use super::world_view::{node_point, DragState, WorldRenderer};
use super::{EditorContext, EditorError};

const BACKGROUND_COLOR: Rgba = [24, 26, 32, 255];
const OUTLINE_COLOR: Rgba = [110, 110, 110, 255];
const OUTLINE_HOVER_COLOR: Rgba = [238, 238, 238, 255];
const ROOM_NAME_COLOR: Rgba = [220, 224, 230, 255];
const LINK_COLOR: Rgba = [255, 255, 255, 255];
const EDIT_LINE_COLOR: Rgba = [255, 200, 60, 255];
const NODE_COLOR: Rgba = [255, 0, 255, 255];
const DANGLING_NODE_COLOR: Rgba = [255, 80, 80, 255];
const GATE_NODE_COLOR: Rgba = [90, 200, 255, 255];
const DEN_MARKER_COLOR: Rgba = [255, 255, 0, 255];
const SCISSORS_COLOR: Rgba = [255, 90, 90, 255];
const ROOM_NAME_OFFSET: f32 = 11.5;
const NODE_MARKER_RADIUS: i32 = 2;
const NODE_MARKER_HOVER_RADIUS: i32 = 4;
const DEN_MARKER_HALF: i32 = 1;
const DEN_MARKER_HOVER_HALF: i32 = 3;
const SCISSORS_ARM: i32 = 4;

/// The three layer targets plus the texture they are composed into. All four
/// share the content size.
#[derive(Debug)]
pub(crate) struct CompositionSurfaces {
    layers: [Texture; 3],
    composed: Texture,
}

impl CompositionSurfaces {
    fn new(size: Vec2) -> Result<Self, EditorError> {
        let (width, height) = (size.x.max(1.0) as u32, size.y.max(1.0) as u32);
        Ok(Self {
            layers: [
                Texture::new(width, height)?,
                Texture::new(width, height)?,
                Texture::new(width, height)?,
            ],
            composed: Texture::new(width, height)?,
        })
    }
}

fn point(value: Vec2) -> (i32, i32) {
    (value.x.floor() as i32, value.y.floor() as i32)
}

/// Back to front, so Layer1 covers the others where rooms overlap.
fn compose_layers(canvas: &mut Canvas<'_>, layers: &[Texture; 3], interactive: &LayerSet) {
    for layer in [Layer::Layer3, Layer::Layer2, Layer::Layer1] {
        canvas.composite(&layers[layer.index()], interactive.alpha(layer));
    }
}

fn outline_colors(context: &mut EditorContext, hovered: Option<usize>) -> Vec<Rgba> {
    let subregions: Vec<String> = context
        .world
        .rooms
        .iter()
        .map(|room| room.subregion.clone())
        .collect();
    subregions
        .iter()
        .enumerate()
        .map(|(index, subregion)| {
            if hovered == Some(index) {
                OUTLINE_HOVER_COLOR
            } else if context.show_subregions && !subregion.is_empty() {
                context.world.subregion_color(subregion)
            } else {
                OUTLINE_COLOR
            }
        })
        .collect()
}

fn draw_scissors(canvas: &mut Canvas<'_>, (x, y): (i32, i32)) {
    let arm = SCISSORS_ARM;
    canvas.line((x - arm, y - arm), (x + arm, y + arm), SCISSORS_COLOR);
    canvas.line((x - arm, y + arm), (x + arm, y - arm), SCISSORS_COLOR);
}

impl WorldRenderer {
    /// Draws rooms and their markers into their layer targets, composes the
    /// layers back to front and blits the visible region onto `target`.
    pub fn render(
        &mut self,
        target: &mut Canvas<'_>,
        context: &mut EditorContext,
    ) -> Result<(), EditorError> {
        if self.released {
            return Ok(());
        }
        if self.surfaces.is_none() {
            self.surfaces = Some(CompositionSurfaces::new(self.view.original_size())?);
        }
        let outlines = outline_colors(context, self.hovered);
        let Some(mut surfaces) = self.surfaces.take() else {
            return Ok(());
        };

        for layer in surfaces.layers.iter_mut() {
            layer.canvas().clear(TRANSPARENT);
        }
        for (room, outline) in context.world.rooms.iter_mut().zip(outlines) {
            let origin = room_origin(self.drag_position, room.dev_position);
            let (x, y) = point(origin);
            let (width, height) = room.size();
            let mut canvas = surfaces.layers[room.layer.index()].canvas();
            if let Some(texture) = room.raster.texture() {
                canvas.blit(texture, x, y);
            }
            canvas.rect_outline(x - 1, y - 1, width as i32 + 2, height as i32 + 2, outline);
            draw_text(
                &mut canvas,
                x,
                (origin.y - ROOM_NAME_OFFSET).floor() as i32,
                &room.name,
                ROOM_NAME_COLOR,
                1,
            );
        }
        self.draw_links(&mut surfaces.layers, context);
        self.draw_nodes(&mut surfaces.layers, context);
        self.draw_dens(&mut surfaces.layers, context);

        {
            let CompositionSurfaces { layers, composed } = &mut surfaces;
            let mut canvas = composed.canvas();
            canvas.clear(BACKGROUND_COLOR);
            compose_layers(&mut canvas, layers, &context.layers);
            self.draw_edit_line(&mut canvas, context);
            if let Some(scissors) = self.scissors {
                draw_scissors(&mut canvas, point(scissors));
            }
        }

        target.blit_region_scaled(&surfaces.composed, self.view.position, self.view.size);
        self.surfaces = Some(surfaces);
        Ok(())
    }

    fn node_radius(&self, room_index: usize, node_index: usize) -> i32 {
        if self.highlighted_node == Some((room_index, node_index)) {
            NODE_MARKER_HOVER_RADIUS
        } else {
            NODE_MARKER_RADIUS
        }
    }

    /// A link goes into the layer of each room it touches, so it dims with
    /// whichever end sits on a non-interactive layer.
    fn draw_links(&self, layers: &mut [Texture; 3], context: &EditorContext) {
        let world = &context.world;
        for connection in world.graph.connections() {
            let from = self.end_point(context, &connection.source);
            let to = self.end_point(context, &connection.destination);
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            let source_layer = world.room(&connection.source.room).map(|room| room.layer);
            let destination_layer = world
                .room(&connection.destination.room)
                .map(|room| room.layer)
                .filter(|layer| Some(*layer) != source_layer);
            for layer in source_layer.into_iter().chain(destination_layer) {
                layers[layer.index()]
                    .canvas()
                    .line(point(from), point(to), LINK_COLOR);
            }
        }
    }

    fn draw_nodes(&self, layers: &mut [Texture; 3], context: &EditorContext) {
        let world = &context.world;
        for (room_index, room) in world.rooms.iter().enumerate() {
            let origin = self.origin_of(room);
            let mut canvas = layers[room.layer.index()].canvas();
            for (node_index, position) in room.connection_positions().iter().enumerate() {
                let color = match world.graph.partner_of(&room.name, node_index) {
                    Some(partner) if partner.is_gate() => GATE_NODE_COLOR,
                    Some(partner) if !partner.is_disconnected() => NODE_COLOR,
                    _ => DANGLING_NODE_COLOR,
                };
                let (x, y) = point(node_point(origin, *position));
                canvas.diamond(x, y, self.node_radius(room_index, node_index), color);
            }
        }
    }

    /// The line from a grabbed node to the cursor stays on top of every layer.
    fn draw_edit_line(&self, canvas: &mut Canvas<'_>, context: &EditorContext) {
        let Some(edit) = &self.edit else {
            return;
        };
        let grabbed = context.world.room(&edit.room).and_then(|room| {
            let position = room.connection_positions().get(edit.node_index)?;
            Some(node_point(self.origin_of(room), *position))
        });
        if let Some(grabbed) = grabbed {
            canvas.line(point(grabbed), point(self.mouse), EDIT_LINE_COLOR);
        }
    }

    fn draw_dens(&self, layers: &mut [Texture; 3], context: &EditorContext) {
        for (room_index, room) in context.world.rooms.iter().enumerate() {
            let origin = self.origin_of(room);
            let mut canvas = layers[room.layer.index()].canvas();
            for (den_index, position) in room.den_positions().iter().enumerate() {
                let half = if self.highlighted_den == Some((room_index, den_index)) {
                    DEN_MARKER_HOVER_HALF
                } else {
                    DEN_MARKER_HALF
                };
                let (x, y) = point(node_point(origin, *position));
                canvas.square(x, y, half, DEN_MARKER_COLOR);
            }
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Frees the composition textures and every room raster of `world`.
    /// Only the first call does anything.
    pub fn teardown(&mut self, world: &mut WorldData) -> bool {
        if self.released {
            return false;
        }
        self.surfaces = None;
        self.released = true;
        self.edit = None;
        self.drag = DragState::Idle;
        let rooms = world.teardown();
        info!(rooms, "world_renderer_torn_down");
        true
    }
}
