use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use super::graph::{RoomSlots, WorldGraph};
use super::room::RoomData;
use super::spawn::{format_spawn_lines, parse_spawn_line, SpawnData, SpawnIdAllocator};

const ROOMS_START: &str = "ROOMS";
const ROOMS_END: &str = "END ROOMS";
const CREATURES_START: &str = "CREATURES";
const CREATURES_END_MARKERS: [&str; 2] = ["END CREATURES", "ENDCREATURES"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldFileError {
    #[error("world file has no `{section}` section")]
    MissingSection { section: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomLine {
    pub raw: String,
    pub room: String,
    pub targets: Vec<String>,
    pub tags: Vec<String>,
}

impl RoomLine {
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split(':');
        let room = parts.next()?.trim().to_ascii_uppercase();
        let connections = parts.next()?;
        if room.is_empty() {
            return None;
        }
        let targets = connections
            .split(',')
            .map(|target| target.trim().to_ascii_uppercase())
            .filter(|target| !target.is_empty())
            .collect();
        let tags = parts.map(|tag| tag.trim().to_string()).collect();
        Some(Self {
            raw: line.to_string(),
            room,
            targets,
            tags,
        })
    }

    fn format(&self, targets: &[String]) -> String {
        let mut text = format!("{} : {}", self.room, targets.join(", "));
        for tag in &self.tags {
            text.push_str(" : ");
            text.push_str(tag);
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRecord {
    Parsed {
        room: String,
        raw: String,
        entries: Vec<SpawnData>,
    },
    /// A line that did not parse; written back untouched.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
enum WorldLine {
    Verbatim(String),
    Room(RoomLine),
    Spawn(SpawnRecord),
    RoomsEnd(String),
    CreaturesEnd(String),
}

/// A world file held line by line so unchanged content is written back
/// byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldFile {
    lines: Vec<WorldLine>,
    line_ending: &'static str,
    trailing_newline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Rooms,
    Creatures,
}

fn is_comment_or_blank(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with("//")
}

impl WorldFile {
    pub fn parse(
        text: &str,
        roster: &[String],
        ids: &mut SpawnIdAllocator,
    ) -> Result<Self, WorldFileError> {
        let mut lines = Vec::new();
        let mut section = Section::Outside;
        let mut saw_rooms = false;

        for line in text.lines() {
            let trimmed = line.trim();
            let entry = match section {
                Section::Outside if trimmed == ROOMS_START => {
                    section = Section::Rooms;
                    saw_rooms = true;
                    WorldLine::Verbatim(line.to_string())
                }
                Section::Outside if trimmed == CREATURES_START => {
                    section = Section::Creatures;
                    WorldLine::Verbatim(line.to_string())
                }
                Section::Rooms if trimmed == ROOMS_END => {
                    section = Section::Outside;
                    WorldLine::RoomsEnd(line.to_string())
                }
                Section::Creatures if CREATURES_END_MARKERS.contains(&trimmed) => {
                    section = Section::Outside;
                    WorldLine::CreaturesEnd(line.to_string())
                }
                Section::Rooms if !is_comment_or_blank(trimmed) => match RoomLine::parse(line) {
                    Some(room_line) => WorldLine::Room(room_line),
                    None => WorldLine::Verbatim(line.to_string()),
                },
                Section::Creatures if !is_comment_or_blank(trimmed) => {
                    match parse_spawn_line(trimmed, roster, ids) {
                        Ok(parsed) => WorldLine::Spawn(SpawnRecord::Parsed {
                            room: parsed.room,
                            raw: line.to_string(),
                            entries: parsed.entries,
                        }),
                        Err(error) => {
                            warn!(line = trimmed, error = %error, "spawn_line_skipped");
                            WorldLine::Spawn(SpawnRecord::Raw(line.to_string()))
                        }
                    }
                }
                _ => WorldLine::Verbatim(line.to_string()),
            };
            lines.push(entry);
        }

        if !saw_rooms {
            return Err(WorldFileError::MissingSection {
                section: ROOMS_START,
            });
        }
        Ok(Self {
            lines,
            line_ending: if text.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: text.ends_with('\n'),
        })
    }

    pub fn room_lines(&self) -> impl Iterator<Item = &RoomLine> {
        self.lines.iter().filter_map(|line| match line {
            WorldLine::Room(room_line) => Some(room_line),
            _ => None,
        })
    }

    pub fn room_slots(&self) -> Vec<RoomSlots> {
        self.room_lines()
            .map(|line| RoomSlots {
                room: line.room.clone(),
                targets: line.targets.clone(),
            })
            .collect()
    }

    pub fn spawn_records(&self) -> impl Iterator<Item = &SpawnRecord> {
        self.lines.iter().filter_map(|line| match line {
            WorldLine::Spawn(record) => Some(record),
            _ => None,
        })
    }

    /// Parsed spawn entries listed for `room`, in file order.
    pub fn spawns_for_room(&self, room: &str) -> Vec<SpawnData> {
        self.spawn_records()
            .filter_map(|record| match record {
                SpawnRecord::Parsed {
                    room: line_room,
                    entries,
                    ..
                } if line_room.eq_ignore_ascii_case(room) => Some(entries.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Writes the file back with the current connection slots and spawns.
    /// Lines whose content did not change keep their original text.
    pub fn render(&self, rooms: &[RoomData], graph: &WorldGraph) -> String {
        let find_room = |name: &str| rooms.iter().find(|room| room.name_matches(name));
        let changed_spawn_rooms: HashSet<String> = rooms
            .iter()
            .filter(|room| !spawns_unchanged(&self.spawns_for_room(&room.name), &room.spawns))
            .map(|room| room.name.clone())
            .collect();
        let listed_rooms: HashSet<String> =
            self.room_lines().map(|line| line.room.clone()).collect();
        let spawn_rooms: HashSet<String> = self
            .spawn_records()
            .filter_map(|record| match record {
                SpawnRecord::Parsed { room, .. } => Some(room.to_ascii_uppercase()),
                SpawnRecord::Raw(_) => None,
            })
            .collect();

        let mut output: Vec<String> = Vec::with_capacity(self.lines.len());
        let mut emitted_spawn_rooms: HashSet<String> = HashSet::new();
        let mut saw_creatures_end = false;

        for line in &self.lines {
            match line {
                WorldLine::Verbatim(text) => output.push(text.clone()),
                WorldLine::Room(room_line) => match find_room(&room_line.room) {
                    Some(room) => {
                        let targets = current_targets(room_line, room, graph);
                        if targets_equal(&targets, &room_line.targets) {
                            output.push(room_line.raw.clone());
                        } else {
                            output.push(room_line.format(&targets));
                        }
                    }
                    None => output.push(room_line.raw.clone()),
                },
                WorldLine::RoomsEnd(text) => {
                    for room in rooms.iter().filter(|room| {
                        !listed_rooms.contains(&room.name) && has_bound_connection(room, graph)
                    }) {
                        let targets = graph.slots_for_room(&room.name, room.connection_count());
                        output.push(format!("{} : {}", room.name, targets.join(", ")));
                    }
                    output.push(text.clone());
                }
                WorldLine::Spawn(SpawnRecord::Raw(text)) => output.push(text.clone()),
                WorldLine::Spawn(SpawnRecord::Parsed { room, raw, .. }) => {
                    let key = room.to_ascii_uppercase();
                    match find_room(room) {
                        Some(data) if changed_spawn_rooms.contains(&data.name) => {
                            if emitted_spawn_rooms.insert(key) {
                                output.extend(format_spawn_lines(&data.name, &data.spawns));
                            }
                        }
                        _ => output.push(raw.clone()),
                    }
                }
                WorldLine::CreaturesEnd(text) => {
                    saw_creatures_end = true;
                    output.extend(new_spawn_lines(rooms, &spawn_rooms));
                    output.push(text.clone());
                }
            }
        }

        if !saw_creatures_end {
            let appended = new_spawn_lines(rooms, &spawn_rooms);
            if !appended.is_empty() {
                output.push(CREATURES_START.to_string());
                output.extend(appended);
                output.push(CREATURES_END_MARKERS[0].to_string());
            }
        }

        let mut text = output.join(self.line_ending);
        if self.trailing_newline {
            text.push_str(self.line_ending);
        }
        text
    }
}

fn current_targets(line: &RoomLine, room: &RoomData, graph: &WorldGraph) -> Vec<String> {
    let node_count = room.connection_count();
    let mut targets = graph.slots_for_room(&room.name, node_count);
    targets.extend(line.targets.iter().skip(node_count).cloned());
    targets
}

fn targets_equal(left: &[String], right: &[String]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

fn has_bound_connection(room: &RoomData, graph: &WorldGraph) -> bool {
    (0..room.connection_count()).any(|node_index| {
        graph
            .partner_of(&room.name, node_index)
            .is_some_and(|partner| !partner.is_disconnected())
    })
}

fn spawns_unchanged(loaded: &[SpawnData], current: &[SpawnData]) -> bool {
    let current: Vec<&SpawnData> = current.iter().filter(|spawn| !spawn.is_placeholder()).collect();
    loaded.len() == current.len()
        && loaded
            .iter()
            .zip(current)
            .all(|(before, after)| before.content_eq(after))
}

fn new_spawn_lines(rooms: &[RoomData], spawn_rooms: &HashSet<String>) -> Vec<String> {
    rooms
        .iter()
        .filter(|room| !spawn_rooms.contains(&room.name))
        .flat_map(|room| format_spawn_lines(&room.name, &room.spawns))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::room::tests::sample_room;
    use crate::world::spawn::{SpawnData, DEFAULT_SLUGCATS};

    const WORLD: &str = "\
// region file
ROOMS
A : B, GATE_A_X : SHELTER
B : DISCONNECTED, a
OFFSCREEN : DISCONNECTED
END ROOMS

CREATURES
// dens
A : 2-Pink-{Night}-3
(X-Red)B : 2-green
OFFSCREEN : 0-Vulture-2
A : 9-Pink-bad
ENDCREATURES
";

    fn roster() -> Vec<String> {
        DEFAULT_SLUGCATS.iter().map(|name| name.to_string()).collect()
    }

    fn load() -> (WorldFile, Vec<RoomData>, WorldGraph) {
        let mut ids = SpawnIdAllocator::default();
        let file = WorldFile::parse(WORLD, &roster(), &mut ids).expect("parse");
        let mut rooms = vec![sample_room("A"), sample_room("B")];
        for room in &mut rooms {
            room.spawns = file.spawns_for_room(&room.name);
        }
        let graph = WorldGraph::from_room_slots(&file.room_slots(), &rooms);
        (file, rooms, graph)
    }

    #[test]
    fn parses_rooms_tags_and_spawns() {
        let (file, rooms, _) = load();
        let lines: Vec<&RoomLine> = file.room_lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].tags, vec!["SHELTER".to_string()]);
        assert_eq!(lines[1].targets, vec!["DISCONNECTED".to_string(), "A".to_string()]);
        assert_eq!(rooms[0].spawns.len(), 1);
        assert_eq!(rooms[1].spawns[0].creature.creature_type, "GreenLizard");
        assert!(matches!(
            file.spawn_records().last(),
            Some(SpawnRecord::Raw(_))
        ));
    }

    #[test]
    fn zero_edit_render_reproduces_input() {
        let (file, rooms, graph) = load();
        assert_eq!(file.render(&rooms, &graph), WORLD);
    }

    #[test]
    fn edited_connection_regenerates_only_that_line() {
        let (file, rooms, mut graph) = load();
        let (id, _) = graph.find_node("B", 1).expect("b1");
        graph.cut_connection(id).expect("cut");
        let text = file.render(&rooms, &graph);

        assert!(text.contains("\nA : DISCONNECTED, GATE_A_X : SHELTER\n"));
        assert!(text.contains("\nB : DISCONNECTED, DISCONNECTED\n"));
        assert!(text.contains("\nOFFSCREEN : DISCONNECTED\n"));
    }

    #[test]
    fn edited_spawns_regenerate_the_room_group() {
        let (file, mut rooms, graph) = load();
        rooms[0].spawns[0].creature.count = 1;
        let text = file.render(&rooms, &graph);

        assert!(text.contains("\nA : 2-PinkLizard-{Night}\n"));
        assert!(text.contains("\n(X-Red)B : 2-green\n"));
        assert!(text.contains("\nA : 9-Pink-bad\n"));
        assert!(text.ends_with("ENDCREATURES\n"));
    }

    #[test]
    fn edited_exclusive_line_keeps_the_x_clause() {
        let (file, mut rooms, graph) = load();
        rooms[1].spawns[0].creature.count = 2;
        let text = file.render(&rooms, &graph);
        assert!(text.contains("\n(X-Red)B : 2-GreenLizard-2\n"), "{text}");
    }

    #[test]
    fn lineage_toggled_back_is_not_an_edit() {
        let (file, mut rooms, graph) = load();
        rooms[0].spawns[0].toggle_lineage();
        rooms[0].spawns[0].toggle_lineage();
        assert_eq!(file.render(&rooms, &graph), WORLD);
    }

    #[test]
    fn placeholder_spawns_do_not_count_as_edits() {
        let (file, mut rooms, graph) = load();
        rooms[1]
            .spawns
            .push(SpawnData::placeholder(crate::world::SpawnId(99), 3));
        assert_eq!(file.render(&rooms, &graph), WORLD);
    }

    #[test]
    fn missing_rooms_section_is_an_error() {
        let mut ids = SpawnIdAllocator::default();
        assert_eq!(
            WorldFile::parse("CREATURES\nENDCREATURES\n", &roster(), &mut ids),
            Err(WorldFileError::MissingSection { section: "ROOMS" })
        );
    }
}
