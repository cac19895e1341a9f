use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::game::Timing;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tick_ms: u64,
    pub(crate) spin_step_ms: u64,
    pub(crate) blink_ms: u64,
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) autosave_secs: u64,
    pub(crate) catchup_max_secs: i64,
    /// Fixed RNG seed; a fresh one is drawn per run when unset.
    pub(crate) seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: 300,
            spin_step_ms: 200,
            blink_ms: 200,
            fps_cap: 30,
            enable_color: true,
            autosave_secs: 10,
            catchup_max_secs: 86_400,
            seed: None,
        }
    }
}

impl Settings {
    pub(crate) fn timing(&self) -> Timing {
        Timing {
            tick_ms: self.tick_ms.max(1),
            spin_step_ms: self.spin_step_ms.max(1),
            blink_ms: self.blink_ms,
        }
    }
}

pub(crate) struct Paths {
    pub(crate) save_path: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

impl Paths {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            save_path: dir.join("save.json"),
            settings_path: dir.join("settings.json"),
            log_path: dir.join("pokegotchi.log"),
        }
    }
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "pokegotchi", "Pokegotchi")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths::in_dir(dir))
}

/// Missing or unreadable settings fall back to defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "ignoring bad settings file");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    write_json_atomic(path, s)
}

/// Writes pretty JSON next to `path`, then swaps it into place.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename replaces atomically on unix; windows refuses to rename over a file
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("renaming to {}", to.display()))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::ScratchDir;
    use super::*;

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = ScratchDir::new("settings");
        let paths = Paths::in_dir(dir.path());
        let s = Settings {
            seed: Some(7),
            tick_ms: 100,
            ..Settings::default()
        };
        save_settings_atomic(&paths.settings_path, &s).unwrap();
        assert_eq!(load_settings(&paths.settings_path), s);
        assert!(!paths.settings_path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = ScratchDir::new("partial");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "fps_cap": 60 }"#).unwrap();
        let s = load_settings(&path);
        assert_eq!(s.fps_cap, 60);
        assert_eq!(s.tick_ms, 300);
        assert_eq!(s.seed, None);
    }

    #[test]
    fn garbage_settings_fall_back() {
        let dir = ScratchDir::new("garbage");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
        assert_eq!(load_settings(&dir.path().join("absent.json")), Settings::default());
    }

    #[test]
    fn zero_intervals_are_bumped() {
        let s = Settings {
            tick_ms: 0,
            spin_step_ms: 0,
            ..Settings::default()
        };
        let t = s.timing();
        assert_eq!(t.tick_ms, 1);
        assert_eq!(t.spin_step_ms, 1);
    }
}
