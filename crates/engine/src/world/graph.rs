use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::warn;

use super::room::RoomData;
use super::tile_geometry::TilePos;

pub const DISCONNECTED: &str = "DISCONNECTED";

pub fn is_gate_room(name: &str) -> bool {
    name.to_ascii_uppercase().contains("GATE")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no connection with id {0:?}")]
    UnknownConnection(ConnectionId),
    #[error("no connection record for node {node_index} of room {room}")]
    UnknownNode { room: String, node_index: usize },
    #[error("connection to gate {room} is read-only")]
    GateReadOnly { room: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndSide {
    Source,
    Destination,
}

impl EndSide {
    pub fn other(self) -> Self {
        match self {
            EndSide::Source => EndSide::Destination,
            EndSide::Destination => EndSide::Source,
        }
    }
}

/// One end of a connection: a node of a named room, or the
/// [`DISCONNECTED`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEnd {
    pub room: String,
    pub position: TilePos,
    pub direction: i32,
    pub node_index: usize,
}

impl ConnectionEnd {
    pub fn disconnected() -> Self {
        Self {
            room: DISCONNECTED.to_string(),
            position: TilePos::default(),
            direction: -1,
            node_index: 0,
        }
    }

    pub fn gate(name: &str) -> Self {
        Self {
            room: name.to_ascii_uppercase(),
            position: TilePos::default(),
            direction: -1,
            node_index: 0,
        }
    }

    /// End bound to node `node_index` of `room`, if the room has that node.
    pub fn at_node(room: &RoomData, node_index: usize) -> Option<Self> {
        let position = *room.connection_positions().get(node_index)?;
        Some(Self {
            room: room.name.clone(),
            position,
            direction: room.connection_direction(node_index).unwrap_or(-1),
            node_index,
        })
    }

    pub fn is_disconnected(&self) -> bool {
        self.room.eq_ignore_ascii_case(DISCONNECTED)
    }

    pub fn is_gate(&self) -> bool {
        is_gate_room(&self.room)
    }

    pub fn is_node(&self, room: &str, node_index: usize) -> bool {
        !self.is_disconnected() && self.node_index == node_index && self.room.eq_ignore_ascii_case(room)
    }

    fn key(&self) -> (String, usize) {
        (self.room.to_ascii_uppercase(), self.node_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConnection {
    pub id: ConnectionId,
    pub source: ConnectionEnd,
    pub destination: ConnectionEnd,
}

impl RoomConnection {
    pub fn end(&self, side: EndSide) -> &ConnectionEnd {
        match side {
            EndSide::Source => &self.source,
            EndSide::Destination => &self.destination,
        }
    }

    pub fn end_mut(&mut self, side: EndSide) -> &mut ConnectionEnd {
        match side {
            EndSide::Source => &mut self.source,
            EndSide::Destination => &mut self.destination,
        }
    }

    pub fn is_gate_link(&self) -> bool {
        self.source.is_gate() || self.destination.is_gate()
    }

    pub fn is_bound(&self) -> bool {
        !self.source.is_disconnected() && !self.destination.is_disconnected()
    }

    fn is_empty(&self) -> bool {
        self.source.is_disconnected() && self.destination.is_disconnected()
    }

    pub fn side_of(&self, room: &str, node_index: usize) -> Option<EndSide> {
        if self.source.is_node(room, node_index) {
            Some(EndSide::Source)
        } else if self.destination.is_node(room, node_index) {
            Some(EndSide::Destination)
        } else {
            None
        }
    }

    fn check_editable(&self) -> Result<(), GraphError> {
        for end in [&self.source, &self.destination] {
            if end.is_gate() {
                return Err(GraphError::GateReadOnly {
                    room: end.room.clone(),
                });
            }
        }
        Ok(())
    }
}

/// What [`WorldGraph::repair`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub disconnected_ends: Vec<String>,
    pub duplicate_claims: Vec<String>,
    pub pruned_records: usize,
    pub added_dangling: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.disconnected_ends.is_empty()
            && self.duplicate_claims.is_empty()
            && self.pruned_records == 0
            && self.added_dangling == 0
    }
}

/// A ROOMS line reduced to its connection slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSlots {
    pub room: String,
    pub targets: Vec<String>,
}

/// All connection records of a world. Every edit keeps at most one record
/// per (room, node) pair; gate links are never edited.
#[derive(Debug, Clone, Default)]
pub struct WorldGraph {
    connections: Vec<RoomConnection>,
    next_id: u64,
}

impl WorldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connections(&self) -> &[RoomConnection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get(&self, id: ConnectionId) -> Option<&RoomConnection> {
        self.connections.iter().find(|connection| connection.id == id)
    }

    fn position(&self, id: ConnectionId) -> Result<usize, GraphError> {
        self.connections
            .iter()
            .position(|connection| connection.id == id)
            .ok_or(GraphError::UnknownConnection(id))
    }

    pub fn insert(&mut self, source: ConnectionEnd, destination: ConnectionEnd) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.connections.push(RoomConnection {
            id,
            source,
            destination,
        });
        id
    }

    /// New record with `source` bound and the destination dangling.
    pub fn add_connection(&mut self, source: ConnectionEnd) -> ConnectionId {
        self.insert(source, ConnectionEnd::disconnected())
    }

    /// Disconnects one end. Returns true when the record became empty and
    /// was pruned.
    pub fn clear_end(&mut self, id: ConnectionId, side: EndSide) -> Result<bool, GraphError> {
        let index = self.position(id)?;
        let connection = &mut self.connections[index];
        connection.check_editable()?;
        *connection.end_mut(side) = ConnectionEnd::disconnected();
        if connection.is_empty() {
            self.connections.remove(index);
            return Ok(true);
        }
        Ok(false)
    }

    /// Splits a bound record into two dangling halves. Returns the id of the
    /// new half holding the old destination, or None when nothing was bound.
    pub fn cut_connection(&mut self, id: ConnectionId) -> Result<Option<ConnectionId>, GraphError> {
        let index = self.position(id)?;
        let connection = &mut self.connections[index];
        connection.check_editable()?;
        if !connection.is_bound() {
            return Ok(None);
        }
        let destination =
            std::mem::replace(&mut connection.destination, ConnectionEnd::disconnected());
        Ok(Some(self.add_connection(destination)))
    }

    /// Record holding node `node_index` of `room`, searching sources first.
    pub fn find_node(&self, room: &str, node_index: usize) -> Option<(ConnectionId, EndSide)> {
        self.connections
            .iter()
            .find(|connection| connection.source.is_node(room, node_index))
            .map(|connection| (connection.id, EndSide::Source))
            .or_else(|| {
                self.connections
                    .iter()
                    .find(|connection| connection.destination.is_node(room, node_index))
                    .map(|connection| (connection.id, EndSide::Destination))
            })
    }

    /// Starts a redirect from `end`: if its record is bound, the far end
    /// keeps that record with this side disconnected, and `end` moves to a
    /// fresh dangling record. Returns the record now holding `end`.
    pub fn detach_node(&mut self, end: ConnectionEnd) -> Result<ConnectionId, GraphError> {
        let Some((id, side)) = self.find_node(&end.room, end.node_index) else {
            return Ok(self.add_connection(end));
        };
        let index = self.position(id)?;
        let connection = &mut self.connections[index];
        connection.check_editable()?;
        if connection.end(side.other()).is_disconnected() {
            return Ok(id);
        }
        let held = std::mem::replace(connection.end_mut(side), ConnectionEnd::disconnected());
        Ok(self.add_connection(held))
    }

    /// Binds the free side of the record holding (`room`, `node_index`) to
    /// `new_end`. A grabbed node whose record is still bound is detached
    /// first, so its old partner keeps a record. The record that held
    /// `new_end` before is removed when that leaves it empty, otherwise its
    /// side is disconnected.
    pub fn reroute(
        &mut self,
        room: &str,
        node_index: usize,
        new_end: ConnectionEnd,
    ) -> Result<ConnectionId, GraphError> {
        if new_end.is_gate() {
            return Err(GraphError::GateReadOnly { room: new_end.room });
        }
        let (grabbed_id, grabbed_side) =
            self.find_node(room, node_index)
                .ok_or_else(|| GraphError::UnknownNode {
                    room: room.to_string(),
                    node_index,
                })?;
        let grabbed = &self.connections[self.position(grabbed_id)?];
        grabbed.check_editable()?;
        let (grabbed_id, grabbed_side) = if grabbed.is_bound() {
            let end = grabbed.end(grabbed_side).clone();
            (self.detach_node(end)?, EndSide::Source)
        } else {
            (grabbed_id, grabbed_side)
        };

        if let Some((target_id, target_side)) = self.find_node(&new_end.room, new_end.node_index)
        {
            if target_id == grabbed_id {
                return Ok(grabbed_id);
            }
            self.clear_end(target_id, target_side)?;
        }

        let index = self.position(grabbed_id)?;
        *self.connections[index].end_mut(grabbed_side.other()) = new_end;
        Ok(grabbed_id)
    }

    /// Other end of the record holding (`room`, `node_index`).
    pub fn partner_of(&self, room: &str, node_index: usize) -> Option<&ConnectionEnd> {
        let (id, side) = self.find_node(room, node_index)?;
        self.get(id).map(|connection| connection.end(side.other()))
    }

    /// Slot targets for a ROOMS line: one entry per geometry node.
    pub fn slots_for_room(&self, room: &str, node_count: usize) -> Vec<String> {
        (0..node_count)
            .map(|node_index| match self.partner_of(room, node_index) {
                Some(partner) if !partner.is_disconnected() => partner.room.to_ascii_uppercase(),
                _ => DISCONNECTED.to_string(),
            })
            .collect()
    }

    /// Pairs reciprocal ROOMS slots into records.
    pub fn from_room_slots(slots: &[RoomSlots], rooms: &[RoomData]) -> Self {
        let mut graph = Self::new();
        let slot_index: HashMap<String, &RoomSlots> = slots
            .iter()
            .map(|slot| (slot.room.to_ascii_uppercase(), slot))
            .collect();
        let room_index: HashMap<String, &RoomData> = rooms
            .iter()
            .map(|room| (room.name.to_ascii_uppercase(), room))
            .collect();
        let mut used: HashSet<(String, usize)> = HashSet::new();

        for line in slots {
            let source_key = line.room.to_ascii_uppercase();
            let Some(source_room) = room_index.get(&source_key) else {
                continue;
            };
            for (slot, target) in line.targets.iter().enumerate() {
                if !used.insert((source_key.clone(), slot)) {
                    continue;
                }
                let Some(source) = ConnectionEnd::at_node(source_room, slot) else {
                    warn!(room = %source_key, slot, target = %target, "room_slot_beyond_geometry");
                    continue;
                };
                let target_key = target.trim().to_ascii_uppercase();
                if target_key.is_empty() || target_key == DISCONNECTED {
                    graph.add_connection(source);
                    continue;
                }
                if is_gate_room(&target_key) {
                    graph.insert(source, ConnectionEnd::gate(&target_key));
                    continue;
                }
                let destination = room_index.get(&target_key).and_then(|target_room| {
                    let target_slots = slot_index.get(&target_key)?;
                    let reciprocal = target_slots.targets.iter().enumerate().position(|(j, name)| {
                        name.trim().eq_ignore_ascii_case(&source_key)
                            && !used.contains(&(target_key.clone(), j))
                            && !(target_key == source_key && j == slot)
                    })?;
                    used.insert((target_key.clone(), reciprocal));
                    let end = ConnectionEnd::at_node(target_room, reciprocal);
                    if end.is_none() {
                        warn!(
                            room = %target_key,
                            slot = reciprocal,
                            "reciprocal_slot_beyond_geometry"
                        );
                    }
                    end
                });
                match destination {
                    Some(destination) => {
                        graph.insert(source, destination);
                    }
                    None => {
                        warn!(
                            room = %source_key,
                            slot,
                            target = %target_key,
                            "unresolved_connection_disconnected"
                        );
                        graph.add_connection(source);
                    }
                }
            }
        }
        graph
    }

    /// Restores the one-record-per-node invariant against `rooms`.
    pub fn repair(&mut self, rooms: &[RoomData]) -> RepairReport {
        let mut report = RepairReport::default();
        let node_counts: HashMap<String, usize> = rooms
            .iter()
            .map(|room| (room.name.to_ascii_uppercase(), room.connection_count()))
            .collect();

        let mut claimed: HashSet<(String, usize)> = HashSet::new();
        for connection in &mut self.connections {
            for side in [EndSide::Source, EndSide::Destination] {
                let end = connection.end_mut(side);
                if end.is_disconnected() || end.is_gate() {
                    continue;
                }
                let key = end.key();
                let known = node_counts
                    .get(&key.0)
                    .is_some_and(|count| key.1 < *count);
                if !known {
                    report
                        .disconnected_ends
                        .push(format!("{}#{}", key.0, key.1));
                    *end = ConnectionEnd::disconnected();
                    continue;
                }
                if !claimed.insert(key.clone()) {
                    report.duplicate_claims.push(format!("{}#{}", key.0, key.1));
                    *end = ConnectionEnd::disconnected();
                }
            }
        }

        let before = self.connections.len();
        self.connections.retain(|connection| !connection.is_empty());
        report.pruned_records = before - self.connections.len();

        for room in rooms {
            for node_index in 0..room.connection_count() {
                if claimed.contains(&(room.name.to_ascii_uppercase(), node_index)) {
                    continue;
                }
                if let Some(end) = ConnectionEnd::at_node(room, node_index) {
                    self.add_connection(end);
                    report.added_dangling += 1;
                }
            }
        }

        for end in report
            .disconnected_ends
            .iter()
            .chain(report.duplicate_claims.iter())
        {
            warn!(node = %end, "connection_end_repaired");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::room::tests::sample_room;

    fn end(room: &str, node_index: usize) -> ConnectionEnd {
        ConnectionEnd {
            room: room.to_string(),
            position: TilePos::new(node_index as i32, 0),
            direction: 0,
            node_index,
        }
    }

    fn claims(graph: &WorldGraph, room: &str, node_index: usize) -> usize {
        graph
            .connections()
            .iter()
            .map(|connection| {
                [&connection.source, &connection.destination]
                    .iter()
                    .filter(|end| end.is_node(room, node_index))
                    .count()
            })
            .sum()
    }

    #[test]
    fn clearing_both_ends_prunes_the_record() {
        let mut graph = WorldGraph::new();
        let id = graph.insert(end("A", 0), end("B", 0));
        assert_eq!(graph.clear_end(id, EndSide::Source), Ok(false));
        assert!(graph.get(id).expect("record").source.is_disconnected());
        assert_eq!(graph.clear_end(id, EndSide::Destination), Ok(true));
        assert!(graph.is_empty());
    }

    #[test]
    fn cut_then_reconnect_restores_the_original_endpoints() {
        let mut graph = WorldGraph::new();
        let id = graph.insert(end("A", 0), end("B", 1));
        let before = graph.get(id).cloned().expect("record");

        let half = graph.cut_connection(id).expect("cut").expect("bound");
        assert!(graph.get(id).expect("a half").destination.is_disconnected());
        assert_eq!(graph.get(half).expect("b half").source, end("B", 1));

        let held = graph.detach_node(end("A", 0)).expect("detach");
        assert_eq!(held, id);
        graph.reroute("A", 0, end("B", 1)).expect("reroute");

        assert_eq!(graph.len(), 1);
        let after = &graph.connections()[0];
        assert_eq!(after.source, before.source);
        assert_eq!(after.destination, before.destination);
    }

    #[test]
    fn detach_disconnects_the_clicked_end_and_keeps_the_partner() {
        let mut graph = WorldGraph::new();
        let id = graph.insert(end("A", 0), end("B", 0));

        let held = graph.detach_node(end("A", 0)).expect("detach");

        let original = graph.get(id).expect("original");
        assert!(original.source.is_disconnected());
        assert_eq!(original.destination, end("B", 0));
        let grabbed = graph.get(held).expect("grabbed");
        assert_eq!(grabbed.source, end("A", 0));
        assert!(grabbed.destination.is_disconnected());
    }

    #[test]
    fn splice_never_leaves_duplicate_claims() {
        let mut graph = WorldGraph::new();
        graph.insert(end("A", 0), end("B", 0));
        graph.insert(end("C", 0), end("D", 0));

        graph.detach_node(end("A", 0)).expect("detach");
        graph.reroute("A", 0, end("C", 0)).expect("reroute");

        for (room, node) in [("A", 0), ("B", 0), ("C", 0), ("D", 0)] {
            assert_eq!(claims(&graph, room, node), 1, "{room}#{node}");
        }
        assert_eq!(graph.partner_of("A", 0), Some(&end("C", 0)));
        assert!(graph.partner_of("D", 0).expect("d").is_disconnected());
        assert!(graph.partner_of("B", 0).expect("b").is_disconnected());
    }

    #[test]
    fn splice_removes_the_empty_shell_of_the_target() {
        let mut graph = WorldGraph::new();
        graph.add_connection(end("A", 0));
        graph.add_connection(end("B", 0));
        graph.reroute("A", 0, end("B", 0)).expect("reroute");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn reroute_finds_grabbed_node_stored_as_destination() {
        let mut graph = WorldGraph::new();
        let id = graph.insert(ConnectionEnd::disconnected(), end("A", 0));
        graph.add_connection(end("B", 0));
        assert_eq!(graph.reroute("A", 0, end("B", 0)), Ok(id));
        assert_eq!(graph.get(id).expect("record").source, end("B", 0));
    }

    #[test]
    fn reroute_of_a_still_bound_node_keeps_its_old_partner() {
        let mut graph = WorldGraph::new();
        graph.insert(end("A", 0), end("B", 0));
        graph.add_connection(end("C", 0));

        let id = graph.reroute("A", 0, end("C", 0)).expect("reroute");
        let record = graph.get(id).expect("record");
        assert_eq!((&record.source, &record.destination), (&end("A", 0), &end("C", 0)));
        assert!(graph.partner_of("B", 0).expect("b keeps a record").is_disconnected());
        for (room, node) in [("A", 0), ("B", 0), ("C", 0)] {
            let claims = graph
                .connections()
                .iter()
                .filter(|connection| connection.side_of(room, node).is_some())
                .count();
            assert_eq!(claims, 1, "{room}#{node}");
        }
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn reroute_of_unknown_node_is_an_error() {
        let mut graph = WorldGraph::new();
        assert_eq!(
            graph.reroute("A", 3, end("B", 0)),
            Err(GraphError::UnknownNode {
                room: "A".to_string(),
                node_index: 3
            })
        );
    }

    #[test]
    fn gate_links_are_read_only() {
        let mut graph = WorldGraph::new();
        let id = graph.insert(end("A", 0), ConnectionEnd::gate("GATE_SU_DS"));
        assert!(matches!(
            graph.cut_connection(id),
            Err(GraphError::GateReadOnly { .. })
        ));
        assert!(matches!(
            graph.clear_end(id, EndSide::Source),
            Err(GraphError::GateReadOnly { .. })
        ));
        assert!(matches!(
            graph.detach_node(end("A", 0)),
            Err(GraphError::GateReadOnly { .. })
        ));
    }

    #[test]
    fn slots_pair_reciprocal_rooms() {
        let rooms = vec![sample_room("A"), sample_room("B")];
        let slots = vec![
            RoomSlots {
                room: "A".to_string(),
                targets: vec!["B".to_string(), "GATE_A_B".to_string()],
            },
            RoomSlots {
                room: "B".to_string(),
                targets: vec!["DISCONNECTED".to_string(), "A".to_string()],
            },
        ];
        let graph = WorldGraph::from_room_slots(&slots, &rooms);

        assert_eq!(graph.partner_of("A", 0).map(|end| end.node_index), Some(1));
        assert_eq!(graph.partner_of("B", 1).map(|end| end.room.as_str()), Some("A"));
        assert!(graph.partner_of("A", 1).expect("gate").is_gate());
        assert!(graph.partner_of("B", 0).expect("dangling").is_disconnected());
        assert_eq!(
            graph.slots_for_room("A", 2),
            vec!["B".to_string(), "GATE_A_B".to_string()]
        );
    }

    #[test]
    fn slot_without_reciprocal_is_disconnected() {
        let rooms = vec![sample_room("A"), sample_room("B")];
        let slots = vec![
            RoomSlots {
                room: "A".to_string(),
                targets: vec!["B".to_string(), "MISSING".to_string()],
            },
            RoomSlots {
                room: "B".to_string(),
                targets: vec!["DISCONNECTED".to_string(), "DISCONNECTED".to_string()],
            },
        ];
        let graph = WorldGraph::from_room_slots(&slots, &rooms);
        assert!(graph.partner_of("A", 0).expect("a0").is_disconnected());
        assert!(graph.partner_of("A", 1).expect("a1").is_disconnected());
    }

    #[test]
    fn repair_fixes_unknown_nodes_duplicates_and_missing_records() {
        let rooms = vec![sample_room("A"), sample_room("B")];
        let mut graph = WorldGraph::new();
        graph.insert(end("A", 0), end("B", 0));
        graph.insert(end("A", 0), end("GHOST", 0));
        graph.insert(end("B", 9), ConnectionEnd::disconnected());

        let report = graph.repair(&rooms);

        assert_eq!(report.duplicate_claims, vec!["A#0".to_string()]);
        assert_eq!(
            report.disconnected_ends,
            vec!["GHOST#0".to_string(), "B#9".to_string()]
        );
        assert_eq!(report.pruned_records, 2);
        // A#1 and B#1 had no record
        assert_eq!(report.added_dangling, 2);
        for (room, node) in [("A", 0), ("A", 1), ("B", 0), ("B", 1)] {
            assert_eq!(claims(&graph, room, node), 1, "{room}#{node}");
        }
        assert!(graph.repair(&rooms).is_clean());
    }
}
