use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use region_engine::{resolve_world_dir, EditorApp, EditorOptions, LoopConfig, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::settings::{load_settings, settings_path, SettingsError, DEFAULT_LOG_DIR};

pub(crate) const LOG_FILE_NAME: &str = "region_editor.log";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Startup(#[from] StartupError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) app: EditorApp,
}

/// Loads settings, starts logging and resolves the world folder. Logging is
/// up before any error is returned, so callers can log it.
pub(crate) fn build_app(world_arg: Option<PathBuf>) -> Result<AppWiring, BootstrapError> {
    let settings = load_settings(&settings_path());
    let log_dir = settings
        .as_ref()
        .map_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR), |settings| settings.log_dir.clone());
    init_tracing(&log_dir);
    info!("=== Region Editor Startup ===");

    let settings = settings?;
    let world_dir = resolve_world_dir(world_arg)?;
    info!(world_dir = %world_dir.display(), "world_dir_resolved");

    let config = LoopConfig {
        window_title: format!("Region Editor - {}", world_title(&world_dir)),
        window_width: settings.window_width,
        window_height: settings.window_height,
        max_render_fps: settings.max_render_fps,
    };
    let options = EditorOptions {
        world: settings.world_options(),
        default_slugcat: settings.default_slugcat.clone(),
        export_room_pngs: settings.export_room_pngs,
        room_png_dir: settings.room_png_dir.clone(),
        content_size: settings.content_size(),
        ..EditorOptions::new(world_dir)
    };

    Ok(AppWiring {
        config,
        app: EditorApp::new(options),
    })
}

fn world_title(world_dir: &Path) -> String {
    world_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

fn init_tracing(log_dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact();
    match open_log_file(log_dir) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(error) => {
            builder.with_writer(io::stderr).init();
            warn!(
                log_dir = %log_dir.display(),
                error = %error,
                "log_file_unavailable"
            );
        }
    }
}

/// Moves a previous log to `<name>.old`, replacing any older one, and opens
/// a fresh log file.
pub(crate) fn open_log_file(log_dir: &Path) -> io::Result<File> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE_NAME);
    if path.exists() {
        let old = log_dir.join(format!("{LOG_FILE_NAME}.old"));
        if old.exists() {
            fs::remove_file(&old)?;
        }
        fs::rename(&path, &old)?;
    }
    File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_rotation_keeps_one_previous_run() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let log_dir = temp.path().join("logs");

        drop(open_log_file(&log_dir).expect("first"));
        fs::write(log_dir.join(LOG_FILE_NAME), "run one").expect("write");
        drop(open_log_file(&log_dir).expect("second"));
        fs::write(log_dir.join(LOG_FILE_NAME), "run two").expect("write");
        drop(open_log_file(&log_dir).expect("third"));

        let old = fs::read_to_string(log_dir.join(format!("{LOG_FILE_NAME}.old"))).expect("old");
        assert_eq!(old, "run two");
        let current = fs::read_to_string(log_dir.join(LOG_FILE_NAME)).expect("current");
        assert!(current.is_empty());
    }

    #[test]
    fn world_title_is_the_upper_cased_folder_name() {
        assert_eq!(world_title(Path::new("/mods/world/su")), "SU");
    }
}
