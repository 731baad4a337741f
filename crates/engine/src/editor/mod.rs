mod context;
mod editor_app;
mod panels;
mod world_draw;
mod world_view;

use thiserror::Error;

use crate::app::TextureError;
use crate::world::GraphError;

pub use context::EditorContext;
pub use editor_app::{EditorApp, EditorOptions};
pub use panels::{DenEditor, DragHandle, Layout, Panel, PanelId, PanelKind, RoomEditor};
pub use world_view::{ConnectionEdit, WorldRenderer, CUT_RADIUS, DEN_RADIUS, NODE_RADIUS};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("room {room} is not loaded")]
    RoomMissing { room: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Notifications sent from widgets to their owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMessage {
    OpenDenEditor { room: String, pipe_number: i32 },
    OpenRoomEditor { room: String },
    ClosePanel(PanelId),
}
