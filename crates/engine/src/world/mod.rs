mod atomic_io;
mod data;
mod dev_map;
mod graph;
mod raster;
mod room;
mod spawn;
mod tile_geometry;
mod world_file;

pub use data::{WorldData, WorldLoadError, WorldOptions, WorldPaths, WorldSaveError};
pub use dev_map::{DevMap, MapPlacement};
pub use graph::{
    is_gate_room, ConnectionEnd, ConnectionId, EndSide, GraphError, RepairReport, RoomConnection,
    RoomSlots, WorldGraph, DISCONNECTED,
};
pub use raster::{
    count_markers, tile_color, RasterError, RoomRaster, AIR_COLOR, CONNECTION_COLOR, DEN_COLOR,
    OPEN_COLOR, SOLID_COLOR,
};
pub use room::{Layer, LayerSet, RoomData, RoomError};
pub use spawn::{
    format_spawn_lines, next_creature_type, parse_spawn_line, resolve_creature_alias,
    CreatureSpawn, LineageStep, SpawnData, SpawnId, SpawnIdAllocator, SpawnLine, SpawnParseError,
    CREATURE_TYPES, DEFAULT_SLUGCATS, LINEAGE_KEYWORD, NONE_CREATURE,
};
pub use tile_geometry::{TileCell, TileClass, TileGeometry, TileGeometryError, TilePos};
pub use world_file::{RoomLine, SpawnRecord, WorldFile, WorldFileError};
