use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, warn};

use crate::app::Rgba;

use super::atomic_io::write_text_atomic;
use super::dev_map::DevMap;
use super::graph::{RepairReport, WorldGraph};
use super::raster::RasterError;
use super::room::RoomData;
use super::spawn::{SpawnId, SpawnIdAllocator, DEFAULT_SLUGCATS};
use super::world_file::{WorldFile, WorldFileError};

const ROOM_FILE_EXTENSION: &str = "txt";
const EXCLUDED_ROOM_FILE_MARKER: &str = "settings";

#[derive(Debug, Error)]
pub enum WorldLoadError {
    #[error("world folder does not exist: {0}")]
    MissingWorldDir(PathBuf),
    #[error("world folder has no name to use as acronym: {0}")]
    NoAcronym(PathBuf),
    #[error("no world file found in {dir} (tried {tried:?})")]
    MissingWorldFile { dir: PathBuf, tried: Vec<String> },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid world file {path}: {source}")]
    WorldFile {
        path: PathBuf,
        #[source]
        source: WorldFileError,
    },
}

#[derive(Debug, Error)]
pub enum WorldSaveError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to export raster for room {room}: {source}")]
    Raster {
        room: String,
        #[source]
        source: RasterError,
    },
}

/// Where a world's files live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldPaths {
    pub acronym: String,
    pub world_dir: PathBuf,
    pub rooms_dir: PathBuf,
    pub world_file: PathBuf,
    pub map_file: PathBuf,
}

impl WorldPaths {
    pub fn discover(world_dir: &Path) -> Result<Self, WorldLoadError> {
        if !world_dir.is_dir() {
            return Err(WorldLoadError::MissingWorldDir(world_dir.to_path_buf()));
        }
        let acronym = world_dir
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| WorldLoadError::NoAcronym(world_dir.to_path_buf()))?
            .to_string();

        let candidates: Vec<String> = [
            acronym.clone(),
            acronym.to_ascii_lowercase(),
            acronym.to_ascii_uppercase(),
        ]
        .iter()
        .map(|variant| format!("world_{variant}.txt"))
        .collect();
        let world_file = candidates
            .iter()
            .map(|name| world_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| WorldLoadError::MissingWorldFile {
                dir: world_dir.to_path_buf(),
                tried: candidates.clone(),
            })?;

        let map_file = [
            acronym.clone(),
            acronym.to_ascii_lowercase(),
            acronym.to_ascii_uppercase(),
        ]
        .iter()
        .map(|variant| world_dir.join(format!("map_{variant}.txt")))
        .find(|path| path.is_file())
        .unwrap_or_else(|| world_dir.join(format!("map_{acronym}.txt")));

        let parent = world_dir.parent().unwrap_or(world_dir);
        let rooms_dir = [acronym.to_ascii_uppercase(), acronym.clone()]
            .iter()
            .map(|variant| parent.join(format!("{variant}-rooms")))
            .find(|path| path.is_dir())
            .unwrap_or_else(|| parent.join(format!("{}-rooms", acronym.to_ascii_uppercase())));

        Ok(Self {
            acronym: acronym.to_ascii_uppercase(),
            world_dir: world_dir.to_path_buf(),
            rooms_dir,
            world_file,
            map_file,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WorldOptions {
    pub slugcat_roster: Vec<String>,
    /// Fixed seed for subregion colours; entropy when absent.
    pub color_seed: Option<u64>,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            slugcat_roster: DEFAULT_SLUGCATS.iter().map(|name| name.to_string()).collect(),
            color_seed: None,
        }
    }
}

/// One loaded world: rooms, the connection graph and the parsed files they
/// are written back into.
#[derive(Debug)]
pub struct WorldData {
    pub rooms: Vec<RoomData>,
    pub graph: WorldGraph,
    paths: WorldPaths,
    roster: Vec<String>,
    world_file: WorldFile,
    dev_map: DevMap,
    spawn_ids: SpawnIdAllocator,
    subregion_colors: HashMap<String, Rgba>,
    rng: StdRng,
    load_report: RepairReport,
    torn_down: bool,
}

fn read_text(path: &Path) -> Result<String, WorldLoadError> {
    fs::read_to_string(path).map_err(|source| WorldLoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_rooms(rooms_dir: &Path) -> Vec<RoomData> {
    let entries = match fs::read_dir(rooms_dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %rooms_dir.display(), error = %error, "rooms_dir_unreadable");
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|extension| extension.eq_ignore_ascii_case(ROOM_FILE_EXTENSION))
        })
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    !name
                        .to_ascii_lowercase()
                        .contains(EXCLUDED_ROOM_FILE_MARKER)
                })
        })
        .collect();
    paths.sort_by_key(|path| path.to_string_lossy().to_ascii_lowercase());

    let mut rooms = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) => {
                warn!(room = name, error = %error, "room_file_unreadable");
                continue;
            }
        };
        match RoomData::from_geometry_text(name, &text) {
            Ok(room) => rooms.push(room),
            Err(error) => warn!(room = name, error = %error, "room_geometry_skipped"),
        }
    }
    rooms
}

fn log_repair(report: &RepairReport) {
    if report.is_clean() {
        return;
    }
    warn!(
        disconnected_ends = report.disconnected_ends.len(),
        duplicate_claims = report.duplicate_claims.len(),
        pruned_records = report.pruned_records,
        added_dangling = report.added_dangling,
        "world_graph_repaired"
    );
}

/// Light random colour: every channel in the upper half of the range.
fn pastel(rng: &mut StdRng) -> Rgba {
    [
        rng.gen_range(128..=255),
        rng.gen_range(128..=255),
        rng.gen_range(128..=255),
        255,
    ]
}

impl WorldData {
    pub fn load(world_dir: &Path, options: &WorldOptions) -> Result<Self, WorldLoadError> {
        let paths = WorldPaths::discover(world_dir)?;
        let mut spawn_ids = SpawnIdAllocator::default();

        let world_text = read_text(&paths.world_file)?;
        let world_file = WorldFile::parse(&world_text, &options.slugcat_roster, &mut spawn_ids)
            .map_err(|source| WorldLoadError::WorldFile {
                path: paths.world_file.clone(),
                source,
            })?;

        let dev_map = if paths.map_file.is_file() {
            DevMap::parse(&read_text(&paths.map_file)?)
        } else {
            warn!(path = %paths.map_file.display(), "dev_map_missing");
            DevMap::default()
        };

        let mut rooms = load_rooms(&paths.rooms_dir);
        for room in &mut rooms {
            dev_map.apply_to(room);
            room.spawns = world_file.spawns_for_room(&room.name);
        }

        let mut graph = WorldGraph::from_room_slots(&world_file.room_slots(), &rooms);
        let report = graph.repair(&rooms);
        log_repair(&report);

        let rng = match options.color_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            world = %paths.acronym,
            room_count = rooms.len(),
            connection_count = graph.len(),
            "world_loaded"
        );
        Ok(Self {
            rooms,
            graph,
            paths,
            roster: options.slugcat_roster.clone(),
            world_file,
            dev_map,
            spawn_ids,
            subregion_colors: HashMap::new(),
            rng,
            load_report: report,
            torn_down: false,
        })
    }

    pub fn acronym(&self) -> &str {
        &self.paths.acronym
    }

    /// What integrity repair changed while loading.
    pub fn load_report(&self) -> &RepairReport {
        &self.load_report
    }

    pub fn paths(&self) -> &WorldPaths {
        &self.paths
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn room(&self, name: &str) -> Option<&RoomData> {
        self.rooms.iter().find(|room| room.name_matches(name))
    }

    pub fn room_mut(&mut self, name: &str) -> Option<&mut RoomData> {
        self.rooms.iter_mut().find(|room| room.name_matches(name))
    }

    pub fn allocate_spawn_id(&mut self) -> SpawnId {
        self.spawn_ids.allocate()
    }

    pub fn repair(&mut self) -> RepairReport {
        let report = self.graph.repair(&self.rooms);
        log_repair(&report);
        report
    }

    /// Known non-empty subregion names, sorted.
    pub fn subregions(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rooms
            .iter()
            .map(|room| room.subregion.clone())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn subregion_color(&mut self, subregion: &str) -> Rgba {
        if let Some(color) = self.subregion_colors.get(subregion) {
            return *color;
        }
        let color = pastel(&mut self.rng);
        self.subregion_colors.insert(subregion.to_string(), color);
        color
    }

    pub fn world_text(&self) -> String {
        self.world_file.render(&self.rooms, &self.graph)
    }

    pub fn map_text(&self) -> String {
        self.dev_map.render(&self.rooms)
    }

    /// Writes the world file and dev map back where they were read from.
    pub fn save(&self) -> Result<(), WorldSaveError> {
        self.write_files(&self.paths.world_file, &self.paths.map_file)
    }

    /// Writes the world file and dev map into `dir` under their own names.
    pub fn save_into(&self, dir: &Path) -> Result<(), WorldSaveError> {
        fs::create_dir_all(dir).map_err(|source| WorldSaveError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let world_name = self
            .paths
            .world_file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("world_{}.txt", self.paths.acronym)));
        let map_name = self
            .paths
            .map_file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("map_{}.txt", self.paths.acronym)));
        self.write_files(&dir.join(world_name), &dir.join(map_name))
    }

    fn write_files(&self, world_path: &Path, map_path: &Path) -> Result<(), WorldSaveError> {
        for (path, text) in [(world_path, self.world_text()), (map_path, self.map_text())] {
            write_text_atomic(path, &text).map_err(|source| WorldSaveError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        info!(
            world = %self.paths.acronym,
            world_file = %world_path.display(),
            map_file = %map_path.display(),
            "world_saved"
        );
        Ok(())
    }

    /// Writes `<dir>/<NAME>.png` for every room. Returns the number written.
    pub fn export_pngs(&self, dir: &Path) -> Result<usize, WorldSaveError> {
        fs::create_dir_all(dir).map_err(|source| WorldSaveError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        for room in &self.rooms {
            let path = dir.join(format!("{}.png", room.name));
            room.raster
                .write_png(&path)
                .map_err(|source| WorldSaveError::Raster {
                    room: room.name.clone(),
                    source,
                })?;
        }
        info!(dir = %dir.display(), room_count = self.rooms.len(), "room_pngs_exported");
        Ok(self.rooms.len())
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Releases every room raster. Safe to call more than once.
    pub fn teardown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        let released = self
            .rooms
            .iter_mut()
            .map(|room| room.raster.release())
            .filter(|released| *released)
            .count();
        self.torn_down = true;
        info!(world = %self.paths.acronym, released, "world_torn_down");
        released
    }
}
