use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod editor;
pub mod world;

pub use app::{
    run_app, AppError, AppHandler, Canvas, EditorKey, FrameCommand, InputSnapshot, LoopConfig,
    Renderer, Rgba, Texture, Vec2, Viewport,
};
pub use editor::{EditorApp, EditorContext, EditorError, EditorOptions, WorldRenderer};
pub use world::{
    RepairReport, RoomData, WorldData, WorldLoadError, WorldOptions, WorldSaveError,
    DEFAULT_SLUGCATS,
};

pub const WORLD_ENV_VAR: &str = "REGION_EDITOR_WORLD";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error(
        "No world folder given.\n\
Pass it as the first argument or set {env_var}, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/world/su\""
    )]
    WorldNotGiven { env_var: &'static str },
    #[error("world folder does not exist: {path}")]
    WorldMissing { path: PathBuf },
}

/// The world folder to open: `arg` when given, else [`WORLD_ENV_VAR`].
pub fn resolve_world_dir(arg: Option<PathBuf>) -> Result<PathBuf, StartupError> {
    let raw = match arg {
        Some(path) => path,
        None => match env::var(WORLD_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
            Ok(_) | Err(env::VarError::NotPresent) => {
                return Err(StartupError::WorldNotGiven {
                    env_var: WORLD_ENV_VAR,
                })
            }
            Err(source) => {
                return Err(StartupError::EnvVar {
                    var: WORLD_ENV_VAR,
                    source,
                })
            }
        },
    };
    let normalized = normalize_path(&raw);
    if normalized.is_dir() {
        Ok(normalized)
    } else {
        Err(StartupError::WorldMissing { path: normalized })
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
