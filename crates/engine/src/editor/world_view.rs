use tracing::info;

use crate::app::{room_origin, InputSnapshot, Vec2, ViewRect};
use crate::world::{ConnectionEnd, ConnectionId, RoomData, TilePos};

use super::world_draw::CompositionSurfaces;
use super::{EditorContext, EditorError, EditorMessage};

pub const NODE_RADIUS: f32 = 6.0;
pub const DEN_RADIUS: f32 = 4.0;
pub const CUT_RADIUS: f32 = 10.0;
const HOVER_PAD_X: f32 = 2.5;
const HOVER_PAD_TOP: f32 = 12.0;
const HOVER_PAD_BOTTOM: f32 = 4.5;

/// A node picked up by the user and not yet dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEdit {
    pub room: String,
    pub node_index: usize,
    pub connection: ConnectionId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum DragState {
    Idle,
    Room { index: usize, last_mouse: Vec2 },
    Pan { last_mouse: Vec2 },
}

/// The map view: zoom and pan state, hover and drag tracking and the
/// connection editing gestures. Drawing lives in `world_draw`.
#[derive(Debug)]
pub struct WorldRenderer {
    pub(super) view: ViewRect,
    pub(super) drag_position: Vec2,
    pub(super) mouse: Vec2,
    pub(super) hovered: Option<usize>,
    pub(super) drag: DragState,
    pub(super) edit: Option<ConnectionEdit>,
    pub(super) scissors: Option<Vec2>,
    pub(super) highlighted_node: Option<(usize, usize)>,
    pub(super) highlighted_den: Option<(usize, usize)>,
    pub(super) surfaces: Option<CompositionSurfaces>,
    pub(super) released: bool,
}

pub(super) fn node_point(origin: Vec2, position: TilePos) -> Vec2 {
    origin + Vec2::new(position.x as f32 + 0.5, position.y as f32 + 0.5)
}

fn distance_squared(a: Vec2, b: Vec2) -> f32 {
    let delta = a - b;
    delta.x * delta.x + delta.y * delta.y
}

fn hover_box_contains(origin: Vec2, size: Vec2, point: Vec2) -> bool {
    point.x >= origin.x - HOVER_PAD_X
        && point.x <= origin.x + size.x + HOVER_PAD_X
        && point.y >= origin.y - HOVER_PAD_TOP
        && point.y <= origin.y + size.y + HOVER_PAD_BOTTOM
}

impl WorldRenderer {
    pub fn new(content_size: Vec2) -> Self {
        Self {
            view: ViewRect::new(content_size),
            drag_position: Vec2::ZERO,
            mouse: Vec2::ZERO,
            hovered: None,
            drag: DragState::Idle,
            edit: None,
            scissors: None,
            highlighted_node: None,
            highlighted_den: None,
            surfaces: None,
            released: false,
        }
    }

    pub fn zoom(&self) -> i32 {
        self.view.zoom()
    }

    pub fn view(&self) -> &ViewRect {
        &self.view
    }

    pub fn drag_position(&self) -> Vec2 {
        self.drag_position
    }

    /// Mouse position in content space as of the last update.
    pub fn scaled_mouse(&self) -> Vec2 {
        self.mouse
    }

    pub fn edit(&self) -> Option<&ConnectionEdit> {
        self.edit.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::Idle
    }

    pub fn scissors(&self) -> Option<Vec2> {
        self.scissors
    }

    pub fn hovered_room<'a>(&self, context: &'a EditorContext) -> Option<&'a RoomData> {
        self.hovered.and_then(|index| context.world.rooms.get(index))
    }

    pub(super) fn origin_of(&self, room: &RoomData) -> Vec2 {
        room_origin(self.drag_position, room.dev_position)
    }

    /// Content-space point of a bound connection end.
    pub(super) fn end_point(&self, context: &EditorContext, end: &ConnectionEnd) -> Option<Vec2> {
        if end.is_disconnected() || end.is_gate() {
            return None;
        }
        let room = context.world.room(&end.room)?;
        let position = room.connection_positions().get(end.node_index)?;
        Some(node_point(self.origin_of(room), *position))
    }

    /// One frame of interaction. Steps run in a fixed order and an earlier
    /// step that consumes a click hides it from the later ones.
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        context: &mut EditorContext,
        outbox: &mut Vec<EditorMessage>,
    ) -> Result<(), EditorError> {
        self.scissors = None;
        self.highlighted_node = None;
        self.highlighted_den = None;

        if !self.is_dragging() && input.scroll_steps() != 0 {
            self.view.apply_scroll(input.scroll_steps());
        }

        if let Some(cursor) = input.cursor_position_px() {
            let (width, height) = input.window_size();
            self.mouse = self
                .view
                .scaled_mouse(cursor, Vec2::new(width as f32, height as f32));
        }

        self.hovered = if self.edit.is_some() || self.is_dragging() {
            None
        } else {
            self.resolve_hover(context)
        };

        let mut consumed = self.update_connections(input, context)?;
        if !consumed {
            consumed = self.update_dens(input, context, outbox);
        }
        self.update_drag(input, context, consumed);

        if !consumed && input.right_click_pressed() && self.edit.is_none() {
            if let Some(room) = self.hovered_room(context) {
                outbox.push(EditorMessage::OpenRoomEditor {
                    room: room.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// The hovered room is picked after scanning every room, so overlapping
    /// rooms resolve the same way regardless of scan order: the front-most
    /// layer wins and later rooms win within a layer.
    fn resolve_hover(&self, context: &EditorContext) -> Option<usize> {
        let mut candidate: Option<usize> = None;
        for (index, room) in context.world.rooms.iter().enumerate() {
            if !context.layers.is_interactive(room.layer) {
                continue;
            }
            if !hover_box_contains(self.origin_of(room), room.size_vec(), self.mouse) {
                continue;
            }
            let replaces = match candidate {
                None => true,
                Some(current) => room.layer.depth() <= context.world.rooms[current].layer.depth(),
            };
            if replaces {
                candidate = Some(index);
            }
        }
        candidate
    }

    /// Nearest editable node under the mouse.
    fn node_under_mouse(&self, context: &EditorContext) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), f32)> = None;
        for (room_index, room) in context.world.rooms.iter().enumerate() {
            let eligible = (self.edit.is_some() || self.hovered == Some(room_index))
                && context.layers.is_interactive(room.layer);
            if !eligible {
                continue;
            }
            let origin = self.origin_of(room);
            for (node_index, position) in room.connection_positions().iter().enumerate() {
                let point = node_point(origin, *position);
                if !point.within_box(self.mouse, NODE_RADIUS) {
                    continue;
                }
                let gate_linked = context
                    .world
                    .graph
                    .partner_of(&room.name, node_index)
                    .is_some_and(|partner| partner.is_gate());
                if gate_linked {
                    continue;
                }
                let distance = distance_squared(point, self.mouse);
                if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                    best = Some(((room_index, node_index), distance));
                }
            }
        }
        best.map(|(node, _)| node)
    }

    fn update_connections(
        &mut self,
        input: &InputSnapshot,
        context: &mut EditorContext,
    ) -> Result<bool, EditorError> {
        let Some((room_index, node_index)) = self.node_under_mouse(context) else {
            if self.edit.is_some() {
                if input.right_click_pressed() && self.den_under_mouse(context).is_none() {
                    if let Some(edit) = self.edit.take() {
                        info!(room = %edit.room, node = edit.node_index, "connection_edit_cancelled");
                    }
                    return Ok(true);
                }
                return Ok(false);
            }
            return self.update_cut(input, context);
        };
        self.highlighted_node = Some((room_index, node_index));
        if !input.left_click_pressed() {
            return Ok(false);
        }

        let room = &context.world.rooms[room_index];
        let Some(end) = ConnectionEnd::at_node(room, node_index) else {
            return Ok(false);
        };
        match self.edit.clone() {
            Some(edit) if edit.room.eq_ignore_ascii_case(&room.name) => Ok(true),
            Some(edit) => {
                let target = format!("{}#{}", end.room, end.node_index);
                let connection = context
                    .world
                    .graph
                    .reroute(&edit.room, edit.node_index, end)?;
                self.edit = None;
                info!(
                    room = %edit.room,
                    node = edit.node_index,
                    target = %target,
                    connection = connection.0,
                    "connection_spliced"
                );
                Ok(true)
            }
            None => {
                // The partner keeps the old record with this side set to
                // DISCONNECTED, and the grabbed node moves to a fresh
                // dangling record until the splice or cancel.
                let room_name = end.room.clone();
                let connection = context.world.graph.detach_node(end)?;
                info!(room = %room_name, node = node_index, "connection_edit_started");
                self.edit = Some(ConnectionEdit {
                    room: room_name,
                    node_index,
                    connection,
                });
                Ok(true)
            }
        }
    }

    /// Scissors cue over a link midpoint; a left click there cuts the link.
    fn update_cut(
        &mut self,
        input: &InputSnapshot,
        context: &mut EditorContext,
    ) -> Result<bool, EditorError> {
        let mut target: Option<(ConnectionId, Vec2)> = None;
        for connection in context.world.graph.connections() {
            if !connection.is_bound() || connection.is_gate_link() {
                continue;
            }
            let (Some(from), Some(to)) = (
                self.end_point(context, &connection.source),
                self.end_point(context, &connection.destination),
            ) else {
                continue;
            };
            let layers_interactive = [&connection.source, &connection.destination]
                .iter()
                .filter_map(|end| context.world.room(&end.room))
                .all(|room| context.layers.is_interactive(room.layer));
            if !layers_interactive {
                continue;
            }
            let midpoint = (from + to) * 0.5;
            if midpoint.within_box(self.mouse, CUT_RADIUS) {
                target = Some((connection.id, midpoint));
                break;
            }
        }

        let Some((id, midpoint)) = target else {
            return Ok(false);
        };
        self.scissors = Some(midpoint);
        if !input.left_click_pressed() {
            return Ok(false);
        }
        context.world.graph.cut_connection(id)?;
        self.scissors = None;
        info!(connection = id.0, "connection_cut");
        Ok(true)
    }

    /// Den marker under the mouse in the room under the mouse. Works during
    /// a connection edit, when hover is suppressed.
    fn den_under_mouse(&self, context: &EditorContext) -> Option<(usize, usize)> {
        if self.is_dragging() {
            return None;
        }
        let room_index = self.resolve_hover(context)?;
        let room = &context.world.rooms[room_index];
        let origin = self.origin_of(room);
        room.den_positions()
            .iter()
            .position(|position| node_point(origin, *position).within_box(self.mouse, DEN_RADIUS))
            .map(|den_index| (room_index, den_index))
    }

    fn update_dens(
        &mut self,
        input: &InputSnapshot,
        context: &EditorContext,
        outbox: &mut Vec<EditorMessage>,
    ) -> bool {
        let Some((room_index, den_index)) = self.den_under_mouse(context) else {
            return false;
        };
        self.highlighted_den = Some((room_index, den_index));
        if !input.right_click_pressed() {
            return false;
        }
        let room = &context.world.rooms[room_index];
        let Some(pipe_number) = room.den_pipe_numbers().get(den_index).copied() else {
            return false;
        };
        outbox.push(EditorMessage::OpenDenEditor {
            room: room.name.clone(),
            pipe_number,
        });
        true
    }

    fn update_drag(&mut self, input: &InputSnapshot, context: &mut EditorContext, consumed: bool) {
        self.drag = match self.drag {
            DragState::Idle => {
                if input.left_click_pressed() && !consumed {
                    match self.hovered {
                        Some(index) => DragState::Room {
                            index,
                            last_mouse: self.mouse,
                        },
                        None => DragState::Pan {
                            last_mouse: self.mouse,
                        },
                    }
                } else {
                    DragState::Idle
                }
            }
            _ if !input.left_mouse_down() => DragState::Idle,
            DragState::Room { index, last_mouse } => {
                if let Some(room) = context.world.rooms.get_mut(index) {
                    // stored positions are at twice the on-screen scale
                    room.dev_position += (self.mouse - last_mouse) * 2.0;
                }
                DragState::Room {
                    index,
                    last_mouse: self.mouse,
                }
            }
            DragState::Pan { last_mouse } => {
                self.drag_position += self.mouse - last_mouse;
                DragState::Pan {
                    last_mouse: self.mouse,
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::test_support::{seeded_options, write_world};
    use crate::world::{Layer, WorldData};

    const WINDOW: (u32, u32) = (640, 360);

    struct Fixture {
        _temp: tempfile::TempDir,
        context: EditorContext,
        view: WorldRenderer,
        outbox: Vec<EditorMessage>,
    }

    /// SU_A01 sits at content (50,20) with nodes at (50.5,21.5) and
    /// (53.5,22.5) and a den at (52.5,23.5). SU_A02 sits at the origin.
    fn fixture() -> Fixture {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let world = WorldData::load(&write_world(&temp), &seeded_options()).expect("load");
        Fixture {
            _temp: temp,
            context: EditorContext::new(world, "White"),
            view: WorldRenderer::new(Vec2::new(WINDOW.0 as f32, WINDOW.1 as f32)),
            outbox: Vec::new(),
        }
    }

    fn at(x: f32, y: f32) -> InputSnapshot {
        InputSnapshot::empty()
            .with_window_size(WINDOW)
            .with_cursor_position_px(Some(Vec2::new(x, y)))
    }

    impl Fixture {
        fn frame(&mut self, input: InputSnapshot) {
            self.view
                .update(&input, &mut self.context, &mut self.outbox)
                .expect("update");
        }

        fn partner(&self, room: &str, node: usize) -> ConnectionEnd {
            self.context
                .world
                .graph
                .partner_of(room, node)
                .cloned()
                .expect("record")
        }
    }

    #[test]
    fn clicking_a_bound_node_starts_an_edit_and_drops_its_end() {
        let mut fx = fixture();
        fx.frame(at(50.5, 21.5).with_left_click_pressed(true));

        let edit = fx.view.edit().expect("edit");
        assert_eq!((edit.room.as_str(), edit.node_index), ("SU_A01", 0));
        assert!(fx.partner("SU_A01", 0).is_disconnected());
        assert!(!fx.view.is_dragging());

        fx.frame(at(50.5, 21.5));
        assert!(fx.view.hovered.is_none());
    }

    #[test]
    fn splicing_onto_another_room_binds_both_nodes_once() {
        let mut fx = fixture();
        fx.frame(at(50.5, 21.5).with_left_click_pressed(true));
        fx.frame(at(0.5, 1.5).with_left_click_pressed(true));

        assert!(fx.view.edit().is_none());
        let partner = fx.partner("SU_A01", 0);
        assert_eq!((partner.room.as_str(), partner.node_index), ("SU_A02", 0));
        let claims = fx
            .context
            .world
            .graph
            .connections()
            .iter()
            .filter(|connection| connection.side_of("SU_A02", 0).is_some())
            .count();
        assert_eq!(claims, 1);
    }

    #[test]
    fn clicking_a_node_of_the_origin_room_keeps_the_edit() {
        let mut fx = fixture();
        fx.frame(at(50.5, 21.5).with_left_click_pressed(true));
        fx.frame(at(53.5, 22.5).with_left_click_pressed(true));
        assert!(fx.view.edit().is_some());
    }

    #[test]
    fn right_click_away_from_nodes_cancels_the_edit() {
        let mut fx = fixture();
        fx.frame(at(50.5, 21.5).with_left_click_pressed(true));
        fx.frame(at(300.0, 300.0).with_right_click_pressed(true));

        assert!(fx.view.edit().is_none());
        assert!(fx.partner("SU_A01", 0).is_disconnected());
        assert!(fx.outbox.is_empty());
    }

    #[test]
    fn midpoint_shows_scissors_and_click_cuts() {
        let mut fx = fixture();
        fx.frame(at(25.5, 11.5));
        assert_eq!(fx.view.scissors(), Some(Vec2::new(25.5, 11.5)));

        fx.frame(at(25.5, 11.5).with_left_click_pressed(true));
        assert!(fx.partner("SU_A01", 0).is_disconnected());
        assert!(fx.partner("SU_A02", 0).is_disconnected());
        assert!(!fx.view.is_dragging());
    }

    #[test]
    fn dragging_a_room_moves_its_dev_position_at_double_scale() {
        let mut fx = fixture();
        fx.frame(at(52.0, 10.0).with_left_click_pressed(true));
        fx.frame(at(62.0, 15.0).with_left_mouse_down(true));
        fx.frame(at(62.0, 15.0));

        let room = fx.context.world.room("SU_A01").expect("room");
        assert_eq!(room.dev_position, Vec2::new(120.0, 50.0));
        assert!(!fx.view.is_dragging());
    }

    #[test]
    fn dragging_empty_space_pans() {
        let mut fx = fixture();
        fx.frame(at(200.0, 200.0).with_left_click_pressed(true));
        fx.frame(at(210.0, 190.0).with_left_mouse_down(true));
        assert_eq!(fx.view.drag_position(), Vec2::new(10.0, -10.0));
    }

    #[test]
    fn scroll_zooms_unless_dragging() {
        let mut fx = fixture();
        fx.frame(at(200.0, 200.0).with_scroll_steps(1));
        assert_eq!(fx.view.zoom(), 2);

        fx.frame(at(200.0, 200.0).with_left_click_pressed(true));
        fx.frame(
            at(200.0, 200.0)
                .with_left_mouse_down(true)
                .with_scroll_steps(1),
        );
        assert_eq!(fx.view.zoom(), 2);
    }

    #[test]
    fn right_click_on_den_opens_den_editor() {
        let mut fx = fixture();
        fx.frame(at(52.5, 23.5).with_right_click_pressed(true));
        assert_eq!(
            fx.outbox,
            vec![EditorMessage::OpenDenEditor {
                room: "SU_A01".to_string(),
                pipe_number: 2
            }]
        );
    }

    #[test]
    fn dens_open_during_a_connection_edit() {
        let mut fx = fixture();
        fx.frame(at(50.5, 21.5).with_left_click_pressed(true));
        fx.frame(at(52.5, 23.5).with_right_click_pressed(true));

        assert_eq!(
            fx.outbox,
            vec![EditorMessage::OpenDenEditor {
                room: "SU_A01".to_string(),
                pipe_number: 2
            }]
        );
        assert!(fx.view.edit().is_some());
    }

    #[test]
    fn right_click_on_room_body_opens_room_editor() {
        let mut fx = fixture();
        fx.frame(at(52.0, 10.0).with_right_click_pressed(true));
        assert_eq!(
            fx.outbox,
            vec![EditorMessage::OpenRoomEditor {
                room: "SU_A01".to_string()
            }]
        );
    }

    #[test]
    fn non_interactive_layers_are_not_hovered() {
        let mut fx = fixture();
        fx.context.toggle_layer(Layer::Layer1);
        fx.frame(at(52.0, 10.0));
        assert!(fx.view.hovered.is_none());
    }

    #[test]
    fn gate_linked_nodes_cannot_be_grabbed() {
        let mut fx = fixture();
        // SU_A02 node 1 links to a gate
        fx.frame(at(3.5, 2.5).with_left_click_pressed(true));
        let edit = fx.view.edit().expect("edit");
        assert_eq!(edit.node_index, 0);
        assert!(fx.partner("SU_A02", 1).is_gate());
    }
}
