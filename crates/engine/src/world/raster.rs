use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::app::{Rgba, Texture, TextureError};

use super::atomic_io::write_bytes_atomic;
use super::tile_geometry::{TileCell, TileClass, TileGeometry};

pub const SOLID_COLOR: Rgba = [153, 134, 102, 255];
pub const AIR_COLOR: Rgba = [0, 0, 0, 255];
pub const OPEN_COLOR: Rgba = [255, 0, 0, 255];
pub const CONNECTION_COLOR: Rgba = [255, 0, 255, 255];
pub const DEN_COLOR: Rgba = [255, 255, 0, 255];

#[derive(Debug, Error)]
pub enum RasterError {
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("room raster was already released")]
    Released,
    #[error("failed to encode room png: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to write room png {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn tile_color(cell: TileCell) -> Rgba {
    let base = match cell.class {
        TileClass::Connection => return CONNECTION_COLOR,
        TileClass::Den => return DEN_COLOR,
        TileClass::Solid | TileClass::Pole => SOLID_COLOR,
        TileClass::Air => AIR_COLOR,
        TileClass::Open => OPEN_COLOR,
    };
    if cell.water {
        [base[0] / 2, base[1], 255, 255]
    } else {
        base
    }
}

/// Connection and den marker counts found in a raster's pixels.
pub fn count_markers(texture: &Texture) -> (usize, usize) {
    texture
        .as_rgba()
        .chunks_exact(4)
        .fold((0, 0), |(connections, dens), pixel| {
            if pixel == CONNECTION_COLOR {
                (connections + 1, dens)
            } else if pixel == DEN_COLOR {
                (connections, dens + 1)
            } else {
                (connections, dens)
            }
        })
}

/// CPU pixel image of one room plus the texture copy used for drawing.
#[derive(Debug)]
pub struct RoomRaster {
    surface: Option<Texture>,
    texture: Option<Texture>,
    released: bool,
}

impl RoomRaster {
    pub fn from_geometry(geometry: &TileGeometry) -> Result<Self, RasterError> {
        let mut surface = Texture::new(geometry.width(), geometry.height())?;
        {
            let mut canvas = surface.canvas();
            for x in 0..geometry.width() {
                for y in 0..geometry.height() {
                    if let Some(cell) = geometry.cell(x, y) {
                        canvas.put_pixel(x as i32, y as i32, tile_color(cell));
                    }
                }
            }
        }
        Ok(Self {
            surface: Some(surface),
            texture: None,
            released: false,
        })
    }

    pub fn surface(&self) -> Option<&Texture> {
        self.surface.as_ref()
    }

    /// Builds the draw texture on first use.
    pub fn texture(&mut self) -> Option<&Texture> {
        if self.texture.is_none() {
            self.texture = self.surface.clone();
        }
        self.texture.as_ref()
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Frees both buffers. Returns false when they were already freed.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.surface = None;
        self.texture = None;
        self.released = true;
        true
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let surface = self.surface.as_ref().ok_or(RasterError::Released)?;
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                surface.as_rgba(),
                surface.width(),
                surface.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(RasterError::Encode)?;
        Ok(bytes)
    }

    pub fn write_png(&self, path: &Path) -> Result<(), RasterError> {
        let bytes = self.encode_png()?;
        write_bytes_atomic(path, &bytes).map_err(|source| RasterError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile_geometry::tests::room_text;

    fn sample_raster() -> (TileGeometry, RoomRaster) {
        let text = room_text(
            3,
            3,
            2,
            &["1", "0,4", "1,5", "2", "0,1", "0", "1,3,4", "0,5", "1"],
        );
        let geometry = TileGeometry::parse(&text).expect("parse");
        let raster = RoomRaster::from_geometry(&geometry).expect("raster");
        (geometry, raster)
    }

    #[test]
    fn raster_markers_match_parsed_markers() {
        let (geometry, raster) = sample_raster();
        let (connections, dens) = count_markers(raster.surface().expect("surface"));
        assert_eq!(connections, geometry.connection_positions().len());
        assert_eq!(dens, geometry.den_positions().len());
    }

    #[test]
    fn pixels_follow_tile_classes() {
        let (_, raster) = sample_raster();
        let surface = raster.surface().expect("surface");
        assert_eq!(surface.pixel(0, 1), Some(CONNECTION_COLOR));
        assert_eq!(surface.pixel(1, 0), Some(SOLID_COLOR));
        assert_eq!(surface.pixel(2, 1), Some(DEN_COLOR));
        // submerged open tile
        assert_eq!(surface.pixel(1, 2), Some([127, 0, 255, 255]));
    }

    #[test]
    fn water_tint_never_collides_with_marker_colors() {
        for class in [TileClass::Air, TileClass::Open, TileClass::Solid, TileClass::Pole] {
            let color = tile_color(TileCell { class, water: true });
            assert_ne!(color, CONNECTION_COLOR);
            assert_ne!(color, DEN_COLOR);
        }
    }

    #[test]
    fn texture_is_lazy_and_release_happens_once() {
        let (_, mut raster) = sample_raster();
        assert!(!raster.has_texture());
        assert!(raster.texture().is_some());
        assert!(raster.has_texture());

        assert!(raster.release());
        assert!(!raster.release());
        assert!(raster.is_released());
        assert!(raster.texture().is_none());
        assert!(matches!(raster.encode_png(), Err(RasterError::Released)));
    }

    #[test]
    fn png_export_writes_a_png_file() {
        let (_, raster) = sample_raster();
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("TEST_ROOM.png");
        raster.write_png(&path).expect("write png");
        let bytes = std::fs::read(&path).expect("read png");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
