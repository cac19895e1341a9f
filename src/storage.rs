use crate::codec;
use crate::config::write_json_atomic;
use crate::model::{Pet, SAVE_VERSION};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SaveFile {
    pub(crate) version: u32,
    pub(crate) last_seen_utc: DateTime<Utc>,
    /// The pet in its compact string encoding.
    pub(crate) pet: String,
}

/// Reads the saved pet. Anything unusable is logged and treated as no save.
pub(crate) fn load_save(path: &Path) -> Option<(Pet, DateTime<Utc>)> {
    let s = fs::read_to_string(path).ok()?;
    let save = match serde_json::from_str::<SaveFile>(&s) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "save file is not valid json");
            return None;
        }
    };
    if save.version != SAVE_VERSION {
        tracing::warn!(version = save.version, "unknown save version");
        return None;
    }
    match codec::decode(&save.pet) {
        Ok(pet) => Some((pet, save.last_seen_utc)),
        Err(e) => {
            tracing::warn!(error = %e, "saved pet is corrupt");
            None
        }
    }
}

pub(crate) fn save_atomic(path: &Path, pet: &Pet, now: DateTime<Utc>) -> Result<()> {
    let save = SaveFile {
        version: SAVE_VERSION,
        last_seen_utc: now,
        pet: codec::encode(pet),
    };
    write_json_atomic(path, &save)
}
