use thiserror::Error;

/// Characters that may appear in the trailing tile block of a room file.
const GEOMETRY_CHARS: &[char] = &['|', ',', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileGeometryError {
    #[error("room file has no `W*H` size header")]
    MissingHeader,
    #[error("invalid room size `{text}`")]
    InvalidSize { text: String },
    #[error("room file has no tile block")]
    MissingTiles,
    #[error("tile block holds {actual} tiles, expected {expected}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile {index} has unparseable field `{text}`")]
    InvalidTile { index: usize, text: String },
}

/// Local tile coordinate inside a room, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileClass {
    Air,
    Solid,
    Pole,
    Open,
    Connection,
    Den,
}

impl TileClass {
    pub fn is_marker(self) -> bool {
        matches!(self, TileClass::Connection | TileClass::Den)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCell {
    pub class: TileClass,
    pub water: bool,
}

/// Parsed tile grid of one room plus the markers found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGeometry {
    width: u32,
    height: u32,
    water_level: i32,
    water_layer: i32,
    /// Column-major, `x * height + y`.
    cells: Vec<TileCell>,
    connection_positions: Vec<TilePos>,
    den_positions: Vec<TilePos>,
    den_pipe_numbers: Vec<i32>,
}

impl TileGeometry {
    pub fn parse(text: &str) -> Result<Self, TileGeometryError> {
        let header = find_header(text)?;
        let (width, height) = parse_size(header)?;
        let mut header_fields = header.split('|').skip(1);
        let water_level = header_fields
            .next()
            .and_then(|field| field.trim().parse().ok())
            .unwrap_or(0);
        let water_layer = header_fields
            .next()
            .and_then(|field| field.trim().parse().ok())
            .unwrap_or(1);

        let block = geometry_block(text);
        let tiles: Vec<&str> = block.split('|').filter(|tile| !tile.is_empty()).collect();
        if tiles.is_empty() {
            return Err(TileGeometryError::MissingTiles);
        }
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(TileGeometryError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }

        let mut geometry = Self {
            width,
            height,
            water_level,
            water_layer,
            cells: Vec::with_capacity(expected),
            connection_positions: Vec::new(),
            den_positions: Vec::new(),
            den_pipe_numbers: Vec::new(),
        };

        for x in 0..width as i32 {
            for y in 0..height as i32 {
                let index = x as usize * height as usize + y as usize;
                let fields = parse_tile(index, tiles[index])?;
                let cell = geometry.classify(&fields, y);
                match cell.class {
                    TileClass::Connection => geometry.connection_positions.push(TilePos::new(x, y)),
                    TileClass::Den => geometry.den_positions.push(TilePos::new(x, y)),
                    _ => {}
                }
                geometry.cells.push(cell);
            }
        }

        let connection_count = geometry.connection_positions.len() as i32;
        geometry.den_pipe_numbers = (0..geometry.den_positions.len() as i32)
            .map(|den_index| den_index + connection_count)
            .collect();
        Ok(geometry)
    }

    fn classify(&self, fields: &[i32], y: i32) -> TileCell {
        let subtype = fields.get(1).copied();
        let submerged = self.water_level > 0 && (self.height as i32 - y) < self.water_level + 2;
        match fields[0] {
            1 | 4 => {
                let class = match subtype {
                    Some(5) => TileClass::Den,
                    Some(4) => TileClass::Connection,
                    Some(3) if fields.get(2) == Some(&4) => TileClass::Connection,
                    _ => TileClass::Air,
                };
                TileCell {
                    class,
                    water: class == TileClass::Air && self.water_layer == 1 && submerged,
                }
            }
            2 | 3 => TileCell {
                class: TileClass::Solid,
                water: false,
            },
            0 => {
                let class = match subtype {
                    Some(1) | Some(2) => TileClass::Pole,
                    Some(4) => TileClass::Connection,
                    Some(5) => TileClass::Den,
                    _ => TileClass::Open,
                };
                TileCell {
                    class,
                    water: !class.is_marker() && submerged,
                }
            }
            _ => TileCell {
                class: TileClass::Open,
                water: false,
            },
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    pub fn water_layer(&self) -> i32 {
        self.water_layer
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<TileCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(x as usize * self.height as usize + y as usize)
            .copied()
    }

    pub fn connection_positions(&self) -> &[TilePos] {
        &self.connection_positions
    }

    pub fn den_positions(&self) -> &[TilePos] {
        &self.den_positions
    }

    pub fn den_pipe_numbers(&self) -> &[i32] {
        &self.den_pipe_numbers
    }

    /// Edge of the room nearest to `position`: 0 left, 1 up, 2 right, 3 down.
    pub fn direction_of(&self, position: TilePos) -> i32 {
        let distances = [
            position.x,
            position.y,
            self.width as i32 - 1 - position.x,
            self.height as i32 - 1 - position.y,
        ];
        let mut best = 0;
        for (direction, distance) in distances.iter().enumerate().skip(1) {
            if *distance < distances[best] {
                best = direction;
            }
        }
        best as i32
    }
}

fn find_header(text: &str) -> Result<&str, TileGeometryError> {
    if let Some(line) = text.lines().nth(1) {
        if parse_size(line).is_ok() {
            return Ok(line);
        }
    }
    text.lines()
        .find(|line| parse_size(line).is_ok())
        .ok_or(TileGeometryError::MissingHeader)
}

fn parse_size(header: &str) -> Result<(u32, u32), TileGeometryError> {
    let size_text = header.split('|').next().unwrap_or_default().trim();
    let invalid = || TileGeometryError::InvalidSize {
        text: size_text.to_string(),
    };
    let (width, height) = size_text.split_once('*').ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

/// The trailing run of tile characters, found by scanning back from the end
/// of the file so that any freeform text before it is ignored.
fn geometry_block(text: &str) -> &str {
    let trimmed = text.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .find(|(_, ch)| !GEOMETRY_CHARS.contains(ch))
        .map(|(index, ch)| index + ch.len_utf8())
        .unwrap_or(0);
    &trimmed[start..]
}

fn parse_tile(index: usize, tile: &str) -> Result<Vec<i32>, TileGeometryError> {
    tile.split(',')
        .map(|field| {
            field.parse::<i32>().map_err(|_| TileGeometryError::InvalidTile {
                index,
                text: tile.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a room file from column-major tile strings.
    pub(crate) fn room_text(width: u32, height: u32, water_level: i32, tiles: &[&str]) -> String {
        format!(
            "TEST_ROOM\n{width}*{height}|{water_level}|0\n-1\nsome freeform camera text 0,0\n{}|\n",
            tiles.join("|")
        )
    }

    #[test]
    fn parses_header_and_markers_in_column_order() {
        // x = 0 column: air, connection; x = 1 column: den, solid
        let text = room_text(2, 2, -1, &["1", "0,4", "1,5", "2"]);
        let geometry = TileGeometry::parse(&text).expect("parse");

        assert_eq!((geometry.width(), geometry.height()), (2, 2));
        assert_eq!(geometry.water_level(), -1);
        assert_eq!(geometry.connection_positions(), &[TilePos::new(0, 1)]);
        assert_eq!(geometry.den_positions(), &[TilePos::new(1, 0)]);
        assert_eq!(geometry.den_pipe_numbers(), &[1]);
        assert_eq!(
            geometry.cell(1, 1).map(|cell| cell.class),
            Some(TileClass::Solid)
        );
    }

    #[test]
    fn den_pipe_numbers_follow_connections_and_increase() {
        let text = room_text(
            3,
            2,
            0,
            &["0,5", "0,4", "1,5", "1,3,4", "4,4", "0,5"],
        );
        let geometry = TileGeometry::parse(&text).expect("parse");
        let connections = geometry.connection_positions().len() as i32;

        assert_eq!(connections, 3);
        assert_eq!(geometry.den_pipe_numbers(), &[3, 4, 5]);
        assert!(geometry
            .den_pipe_numbers()
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
        assert!(geometry.den_pipe_numbers().iter().all(|n| *n >= connections));
    }

    #[test]
    fn water_tints_bottom_rows_of_air_and_open_tiles() {
        let text = room_text(1, 4, 1, &["1", "1", "0", "2"]);
        let geometry = TileGeometry::parse(&text).expect("parse");
        let water: Vec<bool> = (0..4)
            .map(|y| geometry.cell(0, y).expect("cell").water)
            .collect();
        // rows with height - y < 3 are submerged; solid tiles never are
        assert_eq!(water, vec![false, false, true, false]);
    }

    #[test]
    fn missing_water_fields_use_defaults() {
        let text = "ROOM\n1*1\n1|";
        let geometry = TileGeometry::parse(text).expect("parse");
        assert_eq!(geometry.water_level(), 0);
        assert_eq!(geometry.water_layer(), 1);
    }

    #[test]
    fn header_falls_back_to_first_size_line() {
        let text = "1*1|5|1\n1|";
        let geometry = TileGeometry::parse(text).expect("parse");
        assert_eq!(geometry.water_level(), 5);
    }

    #[test]
    fn wrong_tile_count_is_an_error() {
        let text = room_text(2, 2, 0, &["1", "1", "1"]);
        assert_eq!(
            TileGeometry::parse(&text),
            Err(TileGeometryError::TileCountMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn missing_header_is_an_error() {
        assert_eq!(
            TileGeometry::parse("no header here\n1|1|"),
            Err(TileGeometryError::MissingHeader)
        );
    }

    #[test]
    fn direction_names_nearest_edge() {
        let text = room_text(5, 5, 0, &["1"; 25]);
        let geometry = TileGeometry::parse(&text).expect("parse");
        assert_eq!(geometry.direction_of(TilePos::new(0, 2)), 0);
        assert_eq!(geometry.direction_of(TilePos::new(2, 0)), 1);
        assert_eq!(geometry.direction_of(TilePos::new(4, 2)), 2);
        assert_eq!(geometry.direction_of(TilePos::new(2, 4)), 3);
        // corner ties resolve to the lower code
        assert_eq!(geometry.direction_of(TilePos::new(4, 4)), 2);
    }
}
