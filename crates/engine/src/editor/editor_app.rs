use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::app::{
    draw_text, line_advance, AppHandler, Canvas, EditorKey, FrameCommand, InputSnapshot, Rgba,
    Vec2,
};
use crate::world::{Layer, WorldData, WorldOptions};

use super::panels::{DenEditor, Panel, PanelId, PanelKind, RoomEditor};
use super::{EditorContext, EditorMessage, WorldRenderer};

const STATUS_TEXT_SCALE: i32 = 2;
const STATUS_PADDING: i32 = 4;
const STATUS_BG_COLOR: Rgba = [10, 12, 16, 210];
const STATUS_TEXT_COLOR: Rgba = [176, 198, 220, 255];
const EMPTY_BG_COLOR: Rgba = [24, 26, 32, 255];
const PANEL_CURSOR_OFFSET: Vec2 = Vec2::new(12.0, 12.0);
const PANEL_FALLBACK_OFFSET: Vec2 = Vec2::new(24.0, 24.0);
const DEFAULT_ROOM_PNG_DIR: &str = "room_pngs";

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub world_dir: PathBuf,
    pub world: WorldOptions,
    pub default_slugcat: String,
    pub export_room_pngs: bool,
    /// Where room PNGs go. Defaults to `room_pngs` inside the world folder.
    pub room_png_dir: Option<PathBuf>,
    pub content_size: Vec2,
}

impl EditorOptions {
    pub fn new(world_dir: PathBuf) -> Self {
        Self {
            world_dir,
            world: WorldOptions::default(),
            default_slugcat: "White".to_string(),
            export_room_pngs: true,
            room_png_dir: None,
            content_size: Vec2::new(1280.0, 720.0),
        }
    }

    fn png_dir(&self) -> PathBuf {
        self.room_png_dir
            .clone()
            .unwrap_or_else(|| self.world_dir.join(DEFAULT_ROOM_PNG_DIR))
    }
}

/// Owns the loaded world, the map view and the floating panels, and runs
/// them in a fixed order each frame. A failing widget is logged and the
/// rest still run.
pub struct EditorApp {
    options: EditorOptions,
    context: Option<EditorContext>,
    view: WorldRenderer,
    panels: Vec<Panel>,
    next_panel_id: u64,
    outbox: Vec<EditorMessage>,
    notice: Option<String>,
    shut_down: bool,
}

impl EditorApp {
    pub fn new(options: EditorOptions) -> Self {
        let view = WorldRenderer::new(options.content_size);
        Self {
            options,
            context: None,
            view,
            panels: Vec::new(),
            next_panel_id: 1,
            outbox: Vec::new(),
            notice: None,
            shut_down: false,
        }
    }

    pub fn context(&self) -> Option<&EditorContext> {
        self.context.as_ref()
    }

    pub fn view(&self) -> &WorldRenderer {
        &self.view
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    fn load_world(&mut self) {
        self.panels.clear();
        self.outbox.clear();
        self.view = WorldRenderer::new(self.options.content_size);
        match WorldData::load(&self.options.world_dir, &self.options.world) {
            Ok(world) => {
                if self.options.export_room_pngs {
                    self.export_pngs(&world);
                }
                self.context = Some(EditorContext::new(world, &self.options.default_slugcat));
                self.notice = None;
            }
            Err(error) => {
                error!(
                    world_dir = %self.options.world_dir.display(),
                    error = %error,
                    "world_load_failed"
                );
                self.context = None;
                self.notice = Some("LOAD FAILED".to_string());
            }
        }
    }

    fn export_pngs(&self, world: &WorldData) {
        let dir = self.options.png_dir();
        if let Err(error) = world.export_pngs(&dir) {
            warn!(dir = %dir.display(), error = %error, "room_png_export_failed");
        }
    }

    fn release_world(&mut self) {
        if let Some(context) = self.context.as_mut() {
            self.view.teardown(&mut context.world);
        }
    }

    fn reload(&mut self) {
        self.release_world();
        self.load_world();
        info!(loaded = self.context.is_some(), "world_reloaded");
    }

    fn save(&mut self) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        match context.world.save() {
            Ok(()) => {
                if self.options.export_room_pngs {
                    self.export_pngs(&context.world);
                }
                self.notice = Some("SAVED".to_string());
            }
            Err(error) => {
                warn!(world = context.world.acronym(), error = %error, "world_save_failed");
                self.notice = Some("SAVE FAILED".to_string());
            }
        }
    }

    fn handle_global_keys(&mut self, input: &InputSnapshot) {
        if input.key_pressed(EditorKey::Reload) {
            self.reload();
            return;
        }
        if input.key_pressed(EditorKey::Save) {
            self.save();
        }
        if input.key_pressed(EditorKey::ClosePanel) {
            if let Some(panel) = self.panels.pop() {
                info!(panel = panel.id.0, "panel_closed");
            }
        }
        let Some(context) = self.context.as_mut() else {
            return;
        };
        for (key, layer) in [
            (EditorKey::ToggleLayer1, Layer::Layer1),
            (EditorKey::ToggleLayer2, Layer::Layer2),
            (EditorKey::ToggleLayer3, Layer::Layer3),
        ] {
            if input.key_pressed(key) {
                let interactive = context.toggle_layer(layer);
                info!(layer = layer.label(), interactive, "layer_toggled");
            }
        }
        if input.key_pressed(EditorKey::ToggleSubregions) {
            context.show_subregions = !context.show_subregions;
        }
        if input.key_pressed(EditorKey::CycleSlugcat) {
            let slugcat = context.cycle_slugcat().to_string();
            info!(slugcat = %slugcat, "preview_slugcat_changed");
        }
    }

    /// Index of the panel that owns pointer edges this frame: one being
    /// dragged, else the topmost one under the cursor.
    fn pointer_owner(&self, input: &InputSnapshot) -> Option<usize> {
        if let Some(index) = self.panels.iter().rposition(Panel::is_dragging) {
            return Some(index);
        }
        let cursor = input.cursor_position_px()?;
        self.panels.iter().rposition(|panel| panel.contains(cursor))
    }

    fn update_widgets(&mut self, input: &InputSnapshot) {
        for panel in &mut self.panels {
            panel.layout.resolve(Vec2::ZERO);
        }
        let pointer_owner = self.pointer_owner(input);
        let Some(context) = self.context.as_mut() else {
            return;
        };
        let view_input = if pointer_owner.is_some() {
            input.without_edges()
        } else {
            input.without_key_edges()
        };
        if let Err(error) = self.view.update(&view_input, context, &mut self.outbox) {
            warn!(error = %error, "world_view_update_failed");
        }

        let topmost = self.panels.len().checked_sub(1);
        for (index, panel) in self.panels.iter_mut().enumerate() {
            let mut panel_input = *input;
            if pointer_owner != Some(index) {
                panel_input = panel_input.without_pointer_edges();
            }
            if topmost != Some(index) {
                panel_input = panel_input.without_key_edges();
            }
            if let Err(error) = panel.update(&panel_input, context, &mut self.outbox) {
                warn!(panel = panel.id.0, error = %error, "panel_update_failed");
            }
        }
    }

    fn drain_messages(&mut self, input: &InputSnapshot) {
        let offset = input
            .cursor_position_px()
            .map_or(PANEL_FALLBACK_OFFSET, |cursor| cursor + PANEL_CURSOR_OFFSET);
        for message in std::mem::take(&mut self.outbox) {
            match message {
                EditorMessage::ClosePanel(id) => {
                    self.panels.retain(|panel| panel.id != id);
                    info!(panel = id.0, "panel_closed");
                }
                EditorMessage::OpenRoomEditor { room } => {
                    let existing = self.panels.iter().position(|panel| {
                        matches!(&panel.kind, PanelKind::RoomEditor(editor) if editor.room.eq_ignore_ascii_case(&room))
                    });
                    match existing {
                        Some(index) => self.focus(index),
                        None => self.open_panel(offset, PanelKind::RoomEditor(RoomEditor { room })),
                    }
                }
                EditorMessage::OpenDenEditor { room, pipe_number } => {
                    let Some(context) = self.context.as_mut() else {
                        continue;
                    };
                    let den = match DenEditor::open(context, &room, pipe_number) {
                        Ok(den) => den,
                        Err(error) => {
                            warn!(room = %room, pipe = pipe_number, error = %error, "den_editor_open_failed");
                            continue;
                        }
                    };
                    let existing = self.panels.iter().position(|panel| {
                        matches!(&panel.kind, PanelKind::DenEditor(open)
                            if open.same_target(&den.room, den.pipe_number, den.spawn_ids()))
                    });
                    match existing {
                        Some(index) => self.focus(index),
                        None => self.open_panel(offset, PanelKind::DenEditor(den)),
                    }
                }
            }
        }
    }

    fn open_panel(&mut self, offset: Vec2, kind: PanelKind) {
        let id = PanelId(self.next_panel_id);
        self.next_panel_id += 1;
        let mut panel = Panel::new(id, offset, kind);
        panel.layout.resolve(Vec2::ZERO);
        info!(panel = id.0, title = %panel.title(), "panel_opened");
        self.panels.push(panel);
    }

    fn focus(&mut self, index: usize) {
        if index + 1 < self.panels.len() {
            let panel = self.panels.remove(index);
            self.panels.push(panel);
        }
    }

    fn status_line(&self) -> String {
        let Some(context) = self.context.as_ref() else {
            return format!("NO WORLD  {}", self.options.world_dir.display());
        };
        let mut status = format!(
            "{}  ZOOM {}  {}  LAYERS {}",
            context.world.acronym(),
            self.view.zoom(),
            context.preview_slugcat,
            context.interactive_layers_label()
        );
        if let Some(edit) = self.view.edit() {
            status.push_str(&format!("  EDIT {}#{}", edit.room, edit.node_index));
        }
        if let Some(notice) = &self.notice {
            status.push_str("  ");
            status.push_str(notice);
        }
        status
    }

    fn draw_status(&self, target: &mut Canvas<'_>) {
        let height = line_advance(STATUS_TEXT_SCALE) + STATUS_PADDING * 2;
        let top = target.height() as i32 - height;
        for y in top..top + height {
            for x in 0..target.width() as i32 {
                target.blend_pixel(x, y, STATUS_BG_COLOR, 255);
            }
        }
        draw_text(
            target,
            STATUS_PADDING,
            top + STATUS_PADDING,
            &self.status_line(),
            STATUS_TEXT_COLOR,
            STATUS_TEXT_SCALE,
        );
    }
}

impl AppHandler for EditorApp {
    fn load(&mut self) {
        self.load_world();
    }

    fn update(&mut self, input: &InputSnapshot) -> FrameCommand {
        if input.quit_requested() {
            return FrameCommand::Exit;
        }
        self.handle_global_keys(input);
        self.update_widgets(input);
        self.drain_messages(input);
        FrameCommand::Continue
    }

    fn render(&mut self, target: &mut Canvas<'_>) {
        match self.context.as_mut() {
            Some(context) => {
                if let Err(error) = self.view.render(target, context) {
                    warn!(error = %error, "world_view_render_failed");
                }
                for panel in &self.panels {
                    if let Err(error) = panel.render(target, context) {
                        warn!(panel = panel.id.0, error = %error, "panel_render_failed");
                    }
                }
            }
            None => target.clear(EMPTY_BG_COLOR),
        }
        self.draw_status(target);
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.release_world();
        self.panels.clear();
        self.shut_down = true;
        info!("editor_shutdown");
    }
}
