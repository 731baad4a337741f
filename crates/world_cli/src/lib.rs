use std::io::Write;
use std::path::{Path, PathBuf};

use region_engine::{RepairReport, WorldData, WorldOptions};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Check {
        world_dir: PathBuf,
    },
    Resave {
        world_dir: PathBuf,
        out: Option<PathBuf>,
    },
    ExportRasters {
        world_dir: PathBuf,
        out: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub roster: Option<Vec<String>>,
    pub command: CommandKind,
}

impl Invocation {
    pub fn world_options(&self) -> WorldOptions {
        match &self.roster {
            Some(roster) => WorldOptions {
                slugcat_roster: roster.clone(),
                ..WorldOptions::default()
            },
            None => WorldOptions::default(),
        }
    }
}

/// Parses everything after the program name. `Ok(None)` asks for usage.
pub fn parse_args(args: &[String]) -> Result<Option<Invocation>, String> {
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        return Ok(None);
    }

    let mut roster = None;
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--roster" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --roster".to_string())?;
                let names: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(ToString::to_string)
                    .collect();
                if names.is_empty() {
                    return Err(format!("invalid --roster value '{value}' (expected names)"));
                }
                roster = Some(names);
                index += 2;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];
    let world_dir = || {
        command_args
            .first()
            .filter(|arg| !arg.starts_with("--"))
            .map(PathBuf::from)
            .ok_or_else(|| format!("{command} requires a world folder"))
    };

    let command = match command {
        "check" => {
            if command_args.len() > 1 {
                return Err("check takes only a world folder".to_string());
            }
            CommandKind::Check {
                world_dir: world_dir()?,
            }
        }
        "resave" => {
            let world_dir = world_dir()?;
            let out = parse_out(&command_args[1..], command)?;
            CommandKind::Resave { world_dir, out }
        }
        "export-rasters" => {
            let world_dir = world_dir()?;
            let out = parse_out(&command_args[1..], command)?
                .ok_or_else(|| "export-rasters requires --out <dir>".to_string())?;
            CommandKind::ExportRasters { world_dir, out }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };
    Ok(Some(Invocation { roster, command }))
}

fn parse_out(args: &[String], command: &str) -> Result<Option<PathBuf>, String> {
    match args {
        [] => Ok(None),
        [flag, value] if flag == "--out" => Ok(Some(PathBuf::from(value))),
        [flag] if flag == "--out" => Err("missing value for --out".to_string()),
        [arg, ..] => Err(format!("unknown {command} argument '{arg}' (expected --out)")),
    }
}

pub fn usage_text() -> String {
    [
        "world_cli - headless world file tool",
        "",
        "Usage:",
        "  world_cli [--roster <a,b,...>] check <world_dir>",
        "  world_cli [--roster <a,b,...>] resave <world_dir> [--out <dir>]",
        "  world_cli [--roster <a,b,...>] export-rasters <world_dir> --out <dir>",
        "",
        "Defaults:",
        "  --roster White,Yellow,Red,Gourmand,Artificer,Rivulet,Spear,Saint,Inv",
        "  resave writes back into <world_dir> unless --out is given",
    ]
    .join("\n")
}

pub fn run<W: Write>(invocation: &Invocation, stdout: &mut W) -> Result<(), String> {
    let options = invocation.world_options();
    match &invocation.command {
        CommandKind::Check { world_dir } => {
            let world = load(world_dir, &options)?;
            write_summary(&world, stdout)
        }
        CommandKind::Resave { world_dir, out } => {
            let world = load(world_dir, &options)?;
            let target = match out {
                Some(out) => {
                    world
                        .save_into(out)
                        .map_err(|error| format!("failed to save: {error}"))?;
                    out.clone()
                }
                None => {
                    world
                        .save()
                        .map_err(|error| format!("failed to save: {error}"))?;
                    world.paths().world_dir.clone()
                }
            };
            info!(world = world.acronym(), out = %target.display(), "world_resaved");
            writeln!(stdout, "saved {} to {}", world.acronym(), target.display())
                .map_err(write_error)
        }
        CommandKind::ExportRasters { world_dir, out } => {
            let world = load(world_dir, &options)?;
            let count = world
                .export_pngs(out)
                .map_err(|error| format!("failed to export rasters: {error}"))?;
            writeln!(stdout, "exported {count} room rasters to {}", out.display())
                .map_err(write_error)
        }
    }
}

fn load(world_dir: &Path, options: &WorldOptions) -> Result<WorldData, String> {
    WorldData::load(world_dir, options)
        .map_err(|error| format!("failed to load world '{}': {error}", world_dir.display()))
}

fn write_error(error: std::io::Error) -> String {
    format!("failed to write output: {error}")
}

fn write_summary<W: Write>(world: &WorldData, stdout: &mut W) -> Result<(), String> {
    let mut lines = vec![format!(
        "world {}: {} rooms, {} connections",
        world.acronym(),
        world.rooms.len(),
        world.graph.len()
    )];
    let subregions = world.subregions();
    if !subregions.is_empty() {
        lines.push(format!("subregions: {}", subregions.join(", ")));
    }
    for room in &world.rooms {
        let (width, height) = room.size();
        lines.push(format!(
            "  {} {width}x{height} layer {} nodes {} dens {} spawns {}",
            room.name,
            room.layer.label(),
            room.connection_count(),
            room.den_positions().len(),
            room.spawns.len()
        ));
    }
    lines.extend(repair_lines(world.load_report()));
    for line in lines {
        writeln!(stdout, "{line}").map_err(write_error)?;
    }
    Ok(())
}

fn repair_lines(report: &RepairReport) -> Vec<String> {
    if report.is_clean() {
        return vec!["repair: clean".to_string()];
    }
    let mut lines = vec![format!(
        "repair: {} disconnected, {} duplicate claims, {} pruned, {} dangling added",
        report.disconnected_ends.len(),
        report.duplicate_claims.len(),
        report.pruned_records,
        report.added_dangling
    )];
    lines.extend(
        report
            .disconnected_ends
            .iter()
            .map(|end| format!("  disconnected {end}")),
    );
    lines.extend(
        report
            .duplicate_claims
            .iter()
            .map(|claim| format!("  duplicate {claim}")),
    );
    lines
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::TempDir;

    const WORLD_TEXT: &str = "\
ROOMS
SU_A01 : SU_A02, DISCONNECTED
SU_A02 : SU_A01, DISCONNECTED
END ROOMS
CREATURES
SU_A01 : 2-Pink-2
END CREATURES
";

    /// 4x4 room with connections at (0,1) and (3,2) and a den at (2,3).
    fn room_text() -> String {
        let mut tiles = vec!["1"; 16];
        tiles[1] = "0,4";
        tiles[3 * 4 + 2] = "0,4";
        tiles[2 * 4 + 3] = "1,5";
        format!("ROOM\n4*4|0|0\n-1\ncamera 0,0\n{}|\n", tiles.join("|"))
    }

    fn write_world(temp: &TempDir) -> PathBuf {
        let world_dir = temp.path().join("SU");
        let rooms_dir = temp.path().join("SU-rooms");
        fs::create_dir_all(&world_dir).expect("world dir");
        fs::create_dir_all(&rooms_dir).expect("rooms dir");
        fs::write(world_dir.join("world_su.txt"), WORLD_TEXT).expect("world file");
        fs::write(
            world_dir.join("map_su.txt"),
            "SU_A01: 0><0><10><-20><1><Outskirts\n",
        )
        .expect("map file");
        fs::write(rooms_dir.join("SU_A01.txt"), room_text()).expect("room");
        fs::write(rooms_dir.join("SU_A02.txt"), room_text()).expect("room");
        world_dir
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn run_to_string(invocation: &Invocation) -> String {
        let mut out = Vec::new();
        run(invocation, &mut out).expect("run");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn parses_subcommands_and_roster() {
        let parsed = parse_args(&args(&["--roster", "White, Red", "resave", "w", "--out", "o"]))
            .expect("parse")
            .expect("invocation");
        assert_eq!(parsed.roster, Some(vec!["White".to_string(), "Red".to_string()]));
        assert_eq!(
            parsed.command,
            CommandKind::Resave {
                world_dir: PathBuf::from("w"),
                out: Some(PathBuf::from("o")),
            }
        );
        assert_eq!(parse_args(&args(&["--help"])).expect("help"), None);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args(&["export-rasters", "w"]))
            .expect_err("no out")
            .contains("--out"));
        assert!(parse_args(&args(&["check"])).is_err());
        assert!(parse_args(&args(&["resave", "w", "--bogus"])).is_err());
        assert!(parse_args(&args(&["frobnicate", "w"]))
            .expect_err("unknown")
            .contains("unknown subcommand"));
    }

    #[test]
    fn check_prints_rooms_and_repair_state() {
        let temp = TempDir::new().expect("temp dir");
        let invocation = Invocation {
            roster: None,
            command: CommandKind::Check {
                world_dir: write_world(&temp),
            },
        };
        let output = run_to_string(&invocation);
        assert!(output.starts_with("world SU: 2 rooms"), "{output}");
        assert!(output.contains("subregions: Outskirts"));
        assert!(output.contains("SU_A01 4x4 layer L2 nodes 2 dens 1 spawns 1"), "{output}");
        assert!(output.contains("repair: clean"));
    }

    #[test]
    fn resave_into_another_folder_keeps_the_world_text() {
        let temp = TempDir::new().expect("temp dir");
        let out = temp.path().join("out");
        let invocation = Invocation {
            roster: None,
            command: CommandKind::Resave {
                world_dir: write_world(&temp),
                out: Some(out.clone()),
            },
        };
        let output = run_to_string(&invocation);
        assert!(output.starts_with("saved SU to"));
        let text = fs::read_to_string(out.join("world_su.txt")).expect("world file");
        assert_eq!(text, WORLD_TEXT);
    }

    #[test]
    fn export_rasters_writes_one_png_per_room() {
        let temp = TempDir::new().expect("temp dir");
        let out = temp.path().join("pngs");
        let invocation = Invocation {
            roster: None,
            command: CommandKind::ExportRasters {
                world_dir: write_world(&temp),
                out: out.clone(),
            },
        };
        assert_eq!(
            run_to_string(&invocation).trim_end(),
            format!("exported 2 room rasters to {}", out.display())
        );
        assert!(out.join("SU_A01.png").is_file());
    }

    #[test]
    fn missing_world_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let invocation = Invocation {
            roster: None,
            command: CommandKind::Check {
                world_dir: temp.path().join("NOPE"),
            },
        };
        let mut out = Vec::new();
        let error = run(&invocation, &mut out).expect_err("missing");
        assert!(error.contains("failed to load world"));
    }
}
