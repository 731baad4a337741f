use tracing::info;

use crate::app::{draw_text, line_advance, text_width, Canvas, EditorKey, InputSnapshot, Rgba, Vec2};
use crate::world::{next_creature_type, Layer, SpawnData, SpawnId};

use super::{EditorContext, EditorError, EditorMessage};

pub const TITLE_BAR_HEIGHT: f32 = 15.0;
const CLOSE_BUTTON_SIZE: f32 = 11.0;
const TEXT_SCALE: i32 = 2;
const PANEL_PADDING: i32 = 6;
const PANEL_BG_COLOR: Rgba = [12, 14, 18, 230];
const PANEL_BORDER_COLOR: Rgba = [92, 106, 126, 255];
const TITLE_BAR_COLOR: Rgba = [40, 48, 62, 255];
const TITLE_TEXT_COLOR: Rgba = [244, 248, 252, 255];
const TEXT_COLOR: Rgba = [200, 210, 224, 255];
const SELECTED_TEXT_COLOR: Rgba = [255, 220, 120, 255];
const CLOSE_BUTTON_COLOR: Rgba = [170, 60, 60, 255];
const CHANCE_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(pub u64);

/// Offset and size relative to the parent. The absolute position is
/// recomputed top-down once per frame by [`Layout::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub offset: Vec2,
    pub size: Vec2,
    absolute: Vec2,
}

impl Layout {
    pub fn new(offset: Vec2, size: Vec2) -> Self {
        Self {
            offset,
            size,
            absolute: offset,
        }
    }

    pub fn resolve(&mut self, parent_absolute: Vec2) {
        self.absolute = parent_absolute + self.offset;
    }

    pub fn absolute(&self) -> Vec2 {
        self.absolute
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.absolute.x
            && point.x < self.absolute.x + self.size.x
            && point.y >= self.absolute.y
            && point.y < self.absolute.y + self.size.y
    }
}

/// Title-bar drag behaviour a panel may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragHandle {
    grab: Option<Vec2>,
}

impl DragHandle {
    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Moves `layout` while the title bar is held. Returns true when the
    /// pointer input was used.
    pub fn update(&mut self, layout: &mut Layout, input: &InputSnapshot) -> bool {
        let Some(cursor) = input.cursor_position_px() else {
            return false;
        };
        if let Some(grab) = self.grab {
            if !input.left_mouse_down() {
                self.grab = None;
                return false;
            }
            layout.offset += cursor - grab;
            layout.absolute += cursor - grab;
            self.grab = Some(cursor);
            return true;
        }
        let origin = layout.absolute();
        let on_title = cursor.x >= origin.x
            && cursor.x < origin.x + layout.size.x - CLOSE_BUTTON_SIZE
            && cursor.y >= origin.y
            && cursor.y < origin.y + TITLE_BAR_HEIGHT;
        if on_title && input.left_click_pressed() {
            self.grab = Some(cursor);
            return true;
        }
        false
    }
}

fn close_button_contains(layout: &Layout, point: Vec2) -> bool {
    let origin = layout.absolute();
    let left = origin.x + layout.size.x - CLOSE_BUTTON_SIZE;
    point.x >= left
        && point.x < origin.x + layout.size.x
        && point.y >= origin.y
        && point.y < origin.y + CLOSE_BUTTON_SIZE
}

/// Spawn entries of one den, filtered to the preview slugcat at open time.
/// A den with no applicable entries gets a placeholder to edit.
#[derive(Debug, Clone, PartialEq)]
pub struct DenEditor {
    pub room: String,
    pub pipe_number: i32,
    spawn_ids: Vec<SpawnId>,
    selected: usize,
}

impl DenEditor {
    pub fn open(
        context: &mut EditorContext,
        room: &str,
        pipe_number: i32,
    ) -> Result<Self, EditorError> {
        let missing = || EditorError::RoomMissing {
            room: room.to_string(),
        };
        let data = context.world.room(room).ok_or_else(missing)?;
        let name = data.name.clone();
        let mut spawn_ids: Vec<SpawnId> = data
            .spawns_for_den(pipe_number, &context.preview_slugcat)
            .map(|spawn| spawn.id)
            .collect();
        if spawn_ids.is_empty() {
            let id = context.world.allocate_spawn_id();
            let data = context.world.room_mut(room).ok_or_else(missing)?;
            data.spawns.push(SpawnData::placeholder(id, pipe_number));
            spawn_ids.push(id);
            info!(room = %name, pipe = pipe_number, spawn = id.0, "spawn_added");
        }
        Ok(Self {
            room: name,
            pipe_number,
            spawn_ids,
            selected: 0,
        })
    }

    pub fn spawn_ids(&self) -> &[SpawnId] {
        &self.spawn_ids
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Same den and the same entry list.
    pub fn same_target(&self, room: &str, pipe_number: i32, spawn_ids: &[SpawnId]) -> bool {
        self.room.eq_ignore_ascii_case(room)
            && self.pipe_number == pipe_number
            && self.spawn_ids == spawn_ids
    }

    fn entries<'a>(&self, context: &'a EditorContext) -> Result<Vec<&'a SpawnData>, EditorError> {
        let room = context.world.room(&self.room).ok_or_else(|| EditorError::RoomMissing {
            room: self.room.clone(),
        })?;
        Ok(self
            .spawn_ids
            .iter()
            .filter_map(|id| room.spawns.iter().find(|spawn| spawn.id == *id))
            .collect())
    }

    fn selected_entry<'a>(
        &self,
        context: &'a mut EditorContext,
    ) -> Result<Option<&'a mut SpawnData>, EditorError> {
        let Some(id) = self.spawn_ids.get(self.selected).copied() else {
            return Ok(None);
        };
        let room = context
            .world
            .room_mut(&self.room)
            .ok_or_else(|| EditorError::RoomMissing {
                room: self.room.clone(),
            })?;
        Ok(room.spawns.iter_mut().find(|spawn| spawn.id == id))
    }

    pub fn update(
        &mut self,
        input: &InputSnapshot,
        context: &mut EditorContext,
    ) -> Result<(), EditorError> {
        if input.key_pressed(EditorKey::SelectPrevious) {
            self.selected = self.selected.saturating_sub(1);
        }
        if input.key_pressed(EditorKey::SelectNext) && self.selected + 1 < self.spawn_ids.len() {
            self.selected += 1;
        }
        if input.key_pressed(EditorKey::AddEntry) {
            let id = context.world.allocate_spawn_id();
            let room = context
                .world
                .room_mut(&self.room)
                .ok_or_else(|| EditorError::RoomMissing {
                    room: self.room.clone(),
                })?;
            room.spawns.push(SpawnData::placeholder(id, self.pipe_number));
            self.spawn_ids.push(id);
            self.selected = self.spawn_ids.len() - 1;
            info!(room = %self.room, pipe = self.pipe_number, spawn = id.0, "spawn_added");
        }
        if input.key_pressed(EditorKey::DeleteEntry) {
            if let Some(id) = self.spawn_ids.get(self.selected).copied() {
                let room = context
                    .world
                    .room_mut(&self.room)
                    .ok_or_else(|| EditorError::RoomMissing {
                        room: self.room.clone(),
                    })?;
                room.spawns.retain(|spawn| spawn.id != id);
                self.spawn_ids.remove(self.selected);
                self.selected = self.selected.min(self.spawn_ids.len().saturating_sub(1));
                info!(room = %self.room, pipe = self.pipe_number, spawn = id.0, "spawn_removed");
            }
        }

        let cycle = input.key_pressed(EditorKey::CycleCreature);
        let toggle_lineage = input.key_pressed(EditorKey::ToggleLineage);
        let delta = match (
            input.key_pressed(EditorKey::Increment),
            input.key_pressed(EditorKey::Decrement),
        ) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        };
        if !cycle && !toggle_lineage && delta == 0 {
            return Ok(());
        }
        let Some(entry) = self.selected_entry(context)? else {
            return Ok(());
        };
        if toggle_lineage {
            entry.toggle_lineage();
        }
        if entry.is_lineage {
            if let Some(step) = entry.lineage.first_mut() {
                if cycle {
                    step.creature_type = next_creature_type(&step.creature_type).to_string();
                }
                let chance = step.chance + CHANCE_STEP * delta as f32;
                step.chance = ((chance * 100.0).round() / 100.0).clamp(0.0, 1.0);
            }
        } else {
            if cycle {
                entry.creature.creature_type =
                    next_creature_type(&entry.creature.creature_type).to_string();
            }
            entry.creature.count = entry.creature.count.saturating_add_signed(delta).max(1);
        }
        Ok(())
    }

    fn lines(&self, context: &EditorContext) -> Result<Vec<String>, EditorError> {
        let mut lines: Vec<String> = self
            .entries(context)?
            .iter()
            .map(|entry| describe_spawn(entry))
            .collect();
        if lines.is_empty() {
            lines.push("NO SPAWNS  N TO ADD".to_string());
        }
        Ok(lines)
    }
}

fn describe_spawn(entry: &SpawnData) -> String {
    let clause = match &entry.slugcats {
        Some(names) => format!("({}) ", names.join(",")),
        None => String::new(),
    };
    if entry.is_lineage {
        let steps: Vec<String> = entry
            .lineage
            .iter()
            .map(|step| format!("{} {:.2}", step.creature_type, step.chance))
            .collect();
        format!("{clause}LINEAGE {}", steps.join(" > "))
    } else {
        let creature = &entry.creature;
        let tags = if creature.tags.is_empty() {
            String::new()
        } else {
            format!(" {{{}}}", creature.tags)
        };
        format!("{clause}{} X{}{tags}", creature.creature_type, creature.count)
    }
}

/// Layer and subregion of one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEditor {
    pub room: String,
}

impl RoomEditor {
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        context: &mut EditorContext,
    ) -> Result<(), EditorError> {
        let layer = [
            (EditorKey::AssignLayer1, Layer::Layer1),
            (EditorKey::AssignLayer2, Layer::Layer2),
            (EditorKey::AssignLayer3, Layer::Layer3),
        ]
        .into_iter()
        .find(|(key, _)| input.key_pressed(*key))
        .map(|(_, layer)| layer);
        let cycle_subregion = input.key_pressed(EditorKey::CycleSubregion);
        if layer.is_none() && !cycle_subregion {
            return Ok(());
        }

        let subregions = context.world.subregions();
        let room = context
            .world
            .room_mut(&self.room)
            .ok_or_else(|| EditorError::RoomMissing {
                room: self.room.clone(),
            })?;
        if let Some(layer) = layer {
            room.layer = layer;
            info!(room = %room.name, layer = layer.label(), "room_layer_changed");
        }
        if cycle_subregion && !subregions.is_empty() {
            let next = subregions
                .iter()
                .position(|name| *name == room.subregion)
                .map_or(0, |index| (index + 1) % subregions.len());
            room.subregion = subregions[next].clone();
            info!(room = %room.name, subregion = %room.subregion, "room_subregion_changed");
        }
        Ok(())
    }

    fn lines(&self, context: &EditorContext) -> Result<Vec<String>, EditorError> {
        let room = context.world.room(&self.room).ok_or_else(|| EditorError::RoomMissing {
            room: self.room.clone(),
        })?;
        let subregion = if room.subregion.is_empty() {
            "-"
        } else {
            room.subregion.as_str()
        };
        Ok(vec![
            format!("LAYER {}", room.layer.label()),
            format!("SUBREGION {subregion}"),
            "1/2/3 LAYER  S SUBREGION".to_string(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelKind {
    DenEditor(DenEditor),
    RoomEditor(RoomEditor),
}

/// A floating window: layout, an optional drag handle, a close button and
/// its content.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub id: PanelId,
    pub layout: Layout,
    pub drag: Option<DragHandle>,
    pub kind: PanelKind,
}

impl Panel {
    pub fn new(id: PanelId, offset: Vec2, kind: PanelKind) -> Self {
        let size = match &kind {
            PanelKind::DenEditor(_) => Vec2::new(360.0, 200.0),
            PanelKind::RoomEditor(_) => Vec2::new(260.0, 100.0),
        };
        Self {
            id,
            layout: Layout::new(offset, size),
            drag: Some(DragHandle::default()),
            kind,
        }
    }

    pub fn title(&self) -> String {
        match &self.kind {
            PanelKind::DenEditor(den) => format!("DEN {} {}", den.pipe_number, den.room),
            PanelKind::RoomEditor(editor) => format!("ROOM {}", editor.room),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.layout.contains(point)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|drag| drag.is_dragging())
    }

    pub fn update(
        &mut self,
        input: &InputSnapshot,
        context: &mut EditorContext,
        outbox: &mut Vec<EditorMessage>,
    ) -> Result<(), EditorError> {
        if input.left_click_pressed() {
            if let Some(cursor) = input.cursor_position_px() {
                if close_button_contains(&self.layout, cursor) {
                    outbox.push(EditorMessage::ClosePanel(self.id));
                    return Ok(());
                }
            }
        }
        if let Some(drag) = self.drag.as_mut() {
            drag.update(&mut self.layout, input);
        }
        match &mut self.kind {
            PanelKind::DenEditor(den) => den.update(input, context),
            PanelKind::RoomEditor(editor) => editor.update(input, context),
        }
    }

    pub fn render(&self, canvas: &mut Canvas<'_>, context: &EditorContext) -> Result<(), EditorError> {
        let lines = match &self.kind {
            PanelKind::DenEditor(den) => den.lines(context)?,
            PanelKind::RoomEditor(editor) => editor.lines(context)?,
        };
        let selected = match &self.kind {
            PanelKind::DenEditor(den) if !den.spawn_ids.is_empty() => Some(den.selected),
            _ => None,
        };

        let origin = self.layout.absolute();
        let (x, y) = (origin.x as i32, origin.y as i32);
        let (width, height) = (self.layout.size.x as i32, self.layout.size.y as i32);
        for py in y..y + height {
            for px in x..x + width {
                canvas.blend_pixel(px, py, PANEL_BG_COLOR, 255);
            }
        }
        canvas.fill_rect(x, y, width, TITLE_BAR_HEIGHT as i32, TITLE_BAR_COLOR);
        canvas.rect_outline(x, y, width, height, PANEL_BORDER_COLOR);
        let close = CLOSE_BUTTON_SIZE as i32;
        canvas.fill_rect(x + width - close, y, close, close, CLOSE_BUTTON_COLOR);

        let title = self.title();
        let max_chars = ((width - close - PANEL_PADDING * 2) / text_width("M", 1)).max(0) as usize;
        let title: String = title.chars().take(max_chars).collect();
        draw_text(canvas, x + PANEL_PADDING, y + 5, &title, TITLE_TEXT_COLOR, 1);

        let mut line_y = y + TITLE_BAR_HEIGHT as i32 + PANEL_PADDING;
        for (index, line) in lines.iter().enumerate() {
            if line_y + line_advance(TEXT_SCALE) > y + height {
                break;
            }
            let (prefix, color) = if selected == Some(index) {
                ("> ", SELECTED_TEXT_COLOR)
            } else {
                ("  ", TEXT_COLOR)
            };
            draw_text(
                canvas,
                x + PANEL_PADDING,
                line_y,
                &format!("{prefix}{line}"),
                color,
                TEXT_SCALE,
            );
            line_y += line_advance(TEXT_SCALE);
        }
        Ok(())
    }
}
