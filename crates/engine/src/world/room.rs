use thiserror::Error;

use crate::app::Vec2;

use super::raster::{RasterError, RoomRaster};
use super::spawn::SpawnData;
use super::tile_geometry::{TileGeometry, TileGeometryError, TilePos};

/// Map layer a room is drawn on. Layer1 is on top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Layer {
    #[default]
    Layer1,
    Layer2,
    Layer3,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Layer1, Layer::Layer2, Layer::Layer3];

    pub fn from_map_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Layer::Layer1),
            1 => Some(Layer::Layer2),
            2 => Some(Layer::Layer3),
            _ => None,
        }
    }

    pub fn map_byte(self) -> u8 {
        self.depth()
    }

    /// 0 for the front layer.
    pub fn depth(self) -> u8 {
        match self {
            Layer::Layer1 => 0,
            Layer::Layer2 => 1,
            Layer::Layer3 => 2,
        }
    }

    pub fn index(self) -> usize {
        self.depth() as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Layer::Layer1 => "L1",
            Layer::Layer2 => "L2",
            Layer::Layer3 => "L3",
        }
    }
}

/// Which layers currently accept pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSet {
    interactive: [bool; 3],
}

impl Default for LayerSet {
    fn default() -> Self {
        Self {
            interactive: [true; 3],
        }
    }
}

impl LayerSet {
    pub fn is_interactive(&self, layer: Layer) -> bool {
        self.interactive[layer.index()]
    }

    pub fn toggle(&mut self, layer: Layer) -> bool {
        let slot = &mut self.interactive[layer.index()];
        *slot = !*slot;
        *slot
    }

    pub fn alpha(&self, layer: Layer) -> u8 {
        if self.is_interactive(layer) {
            255
        } else {
            128
        }
    }
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error(transparent)]
    Geometry(#[from] TileGeometryError),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

#[derive(Debug)]
pub struct RoomData {
    pub name: String,
    pub dev_position: Vec2,
    pub layer: Layer,
    pub subregion: String,
    pub spawns: Vec<SpawnData>,
    pub raster: RoomRaster,
    width: u32,
    height: u32,
    water_level: i32,
    water_layer: i32,
    connection_positions: Vec<TilePos>,
    connection_directions: Vec<i32>,
    den_positions: Vec<TilePos>,
    den_pipe_numbers: Vec<i32>,
}

impl RoomData {
    pub fn from_geometry_text(name: &str, text: &str) -> Result<Self, RoomError> {
        let geometry = TileGeometry::parse(text)?;
        let raster = RoomRaster::from_geometry(&geometry)?;
        let connection_directions = geometry
            .connection_positions()
            .iter()
            .map(|position| geometry.direction_of(*position))
            .collect();
        Ok(Self {
            name: name.to_ascii_uppercase(),
            dev_position: Vec2::ZERO,
            layer: Layer::Layer1,
            subregion: String::new(),
            spawns: Vec::new(),
            raster,
            width: geometry.width(),
            height: geometry.height(),
            water_level: geometry.water_level(),
            water_layer: geometry.water_layer(),
            connection_positions: geometry.connection_positions().to_vec(),
            connection_directions,
            den_positions: geometry.den_positions().to_vec(),
            den_pipe_numbers: geometry.den_pipe_numbers().to_vec(),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn size_vec(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    pub fn water_layer(&self) -> i32 {
        self.water_layer
    }

    pub fn connection_count(&self) -> usize {
        self.connection_positions.len()
    }

    pub fn connection_positions(&self) -> &[TilePos] {
        &self.connection_positions
    }

    pub fn connection_direction(&self, node_index: usize) -> Option<i32> {
        self.connection_directions.get(node_index).copied()
    }

    pub fn den_positions(&self) -> &[TilePos] {
        &self.den_positions
    }

    pub fn den_pipe_numbers(&self) -> &[i32] {
        &self.den_pipe_numbers
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Spawn entries for one den that apply to `slugcat`.
    pub fn spawns_for_den<'a>(
        &'a self,
        pipe_number: i32,
        slugcat: &'a str,
    ) -> impl Iterator<Item = &'a SpawnData> + 'a {
        self.spawns
            .iter()
            .filter(move |spawn| spawn.pipe_number == pipe_number && spawn.applies_to(slugcat))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::world::tile_geometry::tests::room_text;

    /// A 4x4 room with a connection at (0,1), another at (3,2) and one den.
    pub(crate) fn sample_room(name: &str) -> RoomData {
        let mut tiles = vec!["1"; 16];
        tiles[1] = "0,4";
        tiles[3 * 4 + 2] = "0,4";
        tiles[2 * 4 + 3] = "1,5";
        RoomData::from_geometry_text(name, &room_text(4, 4, 0, &tiles)).expect("room")
    }

    #[test]
    fn room_name_is_upper_cased_and_markers_are_kept() {
        let room = sample_room("su_a01");
        assert_eq!(room.name, "SU_A01");
        assert!(room.name_matches("Su_A01"));
        assert_eq!(room.connection_count(), 2);
        assert_eq!(room.connection_direction(0), Some(0));
        assert_eq!(room.connection_direction(1), Some(2));
        assert_eq!(room.den_pipe_numbers(), &[2]);
    }

    #[test]
    fn layer_bytes_map_to_layers() {
        assert_eq!(Layer::from_map_byte(2), Some(Layer::Layer3));
        assert_eq!(Layer::from_map_byte(7), None);
        assert_eq!(Layer::Layer2.map_byte(), 1);
    }

    #[test]
    fn non_interactive_layers_are_dimmed() {
        let mut layers = LayerSet::default();
        assert_eq!(layers.alpha(Layer::Layer2), 255);
        assert!(!layers.toggle(Layer::Layer2));
        assert_eq!(layers.alpha(Layer::Layer2), 128);
        assert!(layers.is_interactive(Layer::Layer1));
    }
}
