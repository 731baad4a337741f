use tracing::warn;

use crate::app::Vec2;

use super::room::{Layer, RoomData};

const FIELD_SEPARATOR: &str = "><";
const DEV_X_FIELD: usize = 2;
const DEV_Y_FIELD: usize = 3;
const LAYER_FIELD: usize = 4;
const SUBREGION_FIELD: usize = 5;

/// Placement read from one room line of the map file.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlacement {
    pub dev_position: Vec2,
    pub layer: Layer,
    pub subregion: String,
}

impl Default for MapPlacement {
    fn default() -> Self {
        Self {
            dev_position: Vec2::ZERO,
            layer: Layer::Layer1,
            subregion: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RoomMapLine {
    raw: String,
    name: String,
    fields: Vec<String>,
    placement: MapPlacement,
}

#[derive(Debug, Clone, PartialEq)]
enum MapLine {
    Room(RoomMapLine),
    Other(String),
}

/// The `map_<acronym>.txt` file. Only room lines are interpreted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevMap {
    lines: Vec<MapLine>,
    line_ending: &'static str,
    trailing_newline: bool,
}

fn parse_room_line(line: &str) -> Option<RoomMapLine> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) || !rest.contains(FIELD_SEPARATOR) {
        return None;
    }
    let fields: Vec<String> = rest
        .trim()
        .split(FIELD_SEPARATOR)
        .map(str::to_string)
        .collect();
    if fields.len() <= DEV_Y_FIELD {
        return None;
    }

    let number = |index: usize| -> f32 {
        let text = fields[index].trim();
        text.parse().unwrap_or_else(|_| {
            warn!(room = name, field = index, value = text, "map_field_invalid");
            0.0
        })
    };
    let dev_position = Vec2::new(number(DEV_X_FIELD), -number(DEV_Y_FIELD));
    let layer = fields
        .get(LAYER_FIELD)
        .map(|text| {
            text.trim()
                .parse::<u8>()
                .ok()
                .and_then(Layer::from_map_byte)
                .unwrap_or_else(|| {
                    warn!(room = name, value = text.trim(), "map_layer_invalid");
                    Layer::Layer1
                })
        })
        .unwrap_or_default();
    let subregion = fields
        .get(SUBREGION_FIELD)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    Some(RoomMapLine {
        raw: line.to_string(),
        name: name.to_ascii_uppercase(),
        fields,
        placement: MapPlacement {
            dev_position,
            layer,
            subregion,
        },
    })
}

fn format_room_line(name: &str, fields: &[String], room: &RoomData) -> String {
    let mut fields = fields.to_vec();
    if fields.len() <= SUBREGION_FIELD {
        fields.resize(SUBREGION_FIELD + 1, "0".to_string());
    }
    fields[DEV_X_FIELD] = format_coordinate(room.dev_position.x);
    fields[DEV_Y_FIELD] = format_coordinate(-room.dev_position.y);
    fields[LAYER_FIELD] = room.layer.map_byte().to_string();
    fields[SUBREGION_FIELD] = room.subregion.clone();
    format!("{name}: {}", fields.join(FIELD_SEPARATOR))
}

fn format_coordinate(value: f32) -> String {
    // avoid writing "-0"
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

fn placement_of(room: &RoomData) -> MapPlacement {
    MapPlacement {
        dev_position: room.dev_position,
        layer: room.layer,
        subregion: room.subregion.clone(),
    }
}

impl DevMap {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| match parse_room_line(line) {
                Some(room) => MapLine::Room(room),
                None => MapLine::Other(line.to_string()),
            })
            .collect();
        Self {
            lines,
            line_ending: if text.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: text.ends_with('\n'),
        }
    }

    pub fn placement(&self, room: &str) -> Option<&MapPlacement> {
        self.lines.iter().find_map(|line| match line {
            MapLine::Room(entry) if entry.name.eq_ignore_ascii_case(room) => {
                Some(&entry.placement)
            }
            _ => None,
        })
    }

    /// Copies placement onto `room`, or the defaults when it has no line.
    pub fn apply_to(&self, room: &mut RoomData) {
        let placement = self.placement(&room.name).cloned().unwrap_or_default();
        room.dev_position = placement.dev_position;
        room.layer = placement.layer;
        room.subregion = placement.subregion;
    }

    pub fn render(&self, rooms: &[RoomData]) -> String {
        let mut output = Vec::with_capacity(self.lines.len() + rooms.len());
        let mut written = Vec::new();
        for line in &self.lines {
            match line {
                MapLine::Other(text) => output.push(text.clone()),
                MapLine::Room(entry) => {
                    let room = rooms.iter().find(|room| room.name_matches(&entry.name));
                    match room {
                        Some(room) if !written.contains(&room.name) => {
                            written.push(room.name.clone());
                            if placement_of(room) == entry.placement {
                                output.push(entry.raw.clone());
                            } else {
                                output.push(format_room_line(&entry.name, &entry.fields, room));
                            }
                        }
                        _ => output.push(entry.raw.clone()),
                    }
                }
            }
        }
        for room in rooms.iter().filter(|room| !written.contains(&room.name)) {
            output.push(format_room_line(&room.name, &[], room));
        }

        let line_ending = if self.line_ending.is_empty() {
            "\n"
        } else {
            self.line_ending
        };
        let mut text = output.join(line_ending);
        if self.trailing_newline || self.lines.is_empty() {
            text.push_str(line_ending);
        }
        text
    }
}
