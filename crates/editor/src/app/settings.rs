use std::env;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use region_engine::{Vec2, WorldOptions, DEFAULT_SLUGCATS};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub(crate) const SETTINGS_VERSION: u32 = 1;
pub(crate) const SETTINGS_ENV_VAR: &str = "REGION_EDITOR_SETTINGS";
pub(crate) const SETTINGS_FILE: &str = "region_editor.json";
pub(crate) const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings '{path}': {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid settings '{path}': validation failed at {field}: {message}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EditorSettings {
    pub settings_version: u32,
    pub slugcat_roster: Vec<String>,
    pub default_slugcat: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_render_fps: Option<u32>,
    pub export_room_pngs: bool,
    pub room_png_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            settings_version: SETTINGS_VERSION,
            slugcat_roster: DEFAULT_SLUGCATS.iter().map(|name| name.to_string()).collect(),
            default_slugcat: "White".to_string(),
            window_width: 1280,
            window_height: 720,
            max_render_fps: Some(60),
            export_room_pngs: true,
            room_png_dir: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl EditorSettings {
    pub(crate) fn world_options(&self) -> WorldOptions {
        WorldOptions {
            slugcat_roster: self.slugcat_roster.clone(),
            ..WorldOptions::default()
        }
    }

    pub(crate) fn content_size(&self) -> Vec2 {
        Vec2::new(self.window_width as f32, self.window_height as f32)
    }
}

/// `REGION_EDITOR_SETTINGS` when set, else `region_editor.json` in the
/// working directory.
pub(crate) fn settings_path() -> PathBuf {
    env::var_os(SETTINGS_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

pub(crate) fn load_settings(path: &Path) -> Result<EditorSettings, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "settings_defaulted");
            return Ok(EditorSettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let settings = parse_settings_json(&raw).map_err(|message| SettingsError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    validate_settings(&settings).map_err(|(field, message)| SettingsError::Invalid {
        path: path.to_path_buf(),
        field,
        message,
    })?;
    info!(path = %path.display(), "settings_loaded");
    Ok(settings)
}

fn parse_settings_json(raw: &str) -> Result<EditorSettings, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, EditorSettings>(&mut deserializer) {
        Ok(settings) => Ok(settings),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(source.to_string())
            } else {
                Err(format!("at {path}: {source}"))
            }
        }
    }
}

fn expected_actual(
    field: &'static str,
    expected: impl Display,
    actual: impl Display,
) -> (&'static str, String) {
    (field, format!("expected {expected}, got {actual}"))
}

fn validate_settings(settings: &EditorSettings) -> Result<(), (&'static str, String)> {
    if settings.settings_version != SETTINGS_VERSION {
        return Err(expected_actual(
            "settings_version",
            SETTINGS_VERSION,
            settings.settings_version,
        ));
    }
    if settings.window_width == 0 {
        return Err(expected_actual("window_width", "non-zero", 0));
    }
    if settings.window_height == 0 {
        return Err(expected_actual("window_height", "non-zero", 0));
    }
    if settings.slugcat_roster.is_empty() {
        return Err(expected_actual("slugcat_roster", "at least one name", "[]"));
    }
    let known = settings
        .slugcat_roster
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&settings.default_slugcat));
    if !known {
        return Err(expected_actual(
            "default_slugcat",
            "a roster name",
            &settings.default_slugcat,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(temp: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, body).expect("write settings");
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let settings = load_settings(&temp.path().join(SETTINGS_FILE)).expect("defaults");
        assert_eq!(settings, EditorSettings::default());
        assert_eq!(settings.slugcat_roster.len(), DEFAULT_SLUGCATS.len());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = write(
            &temp,
            r#"{ "window_width": 800, "export_room_pngs": false, "room_png_dir": "out" }"#,
        );
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.window_width, 800);
        assert_eq!(settings.window_height, 720);
        assert!(!settings.export_room_pngs);
        assert_eq!(settings.room_png_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.content_size(), Vec2::new(800.0, 720.0));
    }

    #[test]
    fn parse_errors_name_the_json_path() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = write(&temp, r#"{ "slugcat_roster": ["White", 3] }"#);
        let error = load_settings(&path).expect_err("bad roster");
        let text = error.to_string();
        assert!(text.contains("slugcat_roster[1]"), "{text}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = write(&temp, r#"{ "window_widht": 800 }"#);
        assert!(matches!(
            load_settings(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn validation_checks_version_and_default_slugcat() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = write(&temp, r#"{ "settings_version": 2 }"#);
        let error = load_settings(&path).expect_err("version");
        assert!(error.to_string().contains("expected 1, got 2"));

        let path = write(
            &temp,
            r#"{ "slugcat_roster": ["White", "Red"], "default_slugcat": "Saint" }"#,
        );
        assert!(matches!(
            load_settings(&path),
            Err(SettingsError::Invalid {
                field: "default_slugcat",
                ..
            })
        ));
    }

    #[test]
    fn world_options_carry_the_roster() {
        let settings = EditorSettings {
            slugcat_roster: vec!["White".to_string(), "Red".to_string()],
            ..EditorSettings::default()
        };
        assert_eq!(settings.world_options().slugcat_roster, vec!["White", "Red"]);
    }
}
