//! Sprite atlas in TexturePacker's JSON layout, plus an `animations` table
//! naming frame ranges.

use crate::animation::AnimationId;
use crate::interface::Rect;
use crate::model::Facing;
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};
use thiserror::Error;

pub(crate) const DEFAULT_SPEED_MS: u64 = 50;

const BUILTIN_PICHU: &str = include_str!("../assets/pichu.json");

#[derive(Debug, Error)]
pub(crate) enum AtlasError {
    #[error("could not read atlas: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed atlas: {0}")]
    Json(#[from] serde_json::Error),

    #[error("animation `{name}` has no frames")]
    EmptyAnimation { name: &'static str },

    #[error("animation `{name}` spans {start}..{end} but the atlas has {frames} frames")]
    OutOfRange {
        name: &'static str,
        start: usize,
        end: usize,
        frames: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SpriteFrame {
    /// Region in the sprite sheet.
    pub(crate) region: Rect,
    /// Where the trimmed region sits inside the untrimmed source.
    pub(crate) offset: (i32, i32),
    pub(crate) source_size: (i32, i32),
    /// Which way the pose looks, when the frame's file name says so.
    pub(crate) facing: Option<Facing>,
}

impl SpriteFrame {
    /// Top-left screen corner when the untrimmed source is centred on `(x, y)`.
    pub(crate) fn origin(&self, x: i32, y: i32) -> (i32, i32) {
        let dx = (self.offset.0 as f64 - self.source_size.0 as f64 * 0.5).floor() as i32;
        let dy = (self.offset.1 as f64 - self.source_size.1 as f64 * 0.5).floor() as i32;
        (dx + x, dy + y)
    }

    pub(crate) fn screen_rect(&self, x: i32, y: i32) -> Rect {
        let (sx, sy) = self.origin(x, y);
        Rect::new(sx, sy, self.region.w, self.region.h)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct AnimationRange {
    pub(crate) start: usize,
    pub(crate) length: usize,
    #[serde(default)]
    pub(crate) speed: Option<u64>,
}

#[derive(Clone, Debug)]
pub(crate) struct SpriteAtlas {
    pub(crate) frames: Vec<SpriteFrame>,
    pub(crate) default_speed: Option<u64>,
    ranges: HashMap<AnimationId, AnimationRange>,
}

impl SpriteAtlas {
    pub(crate) fn builtin() -> Result<Self, AtlasError> {
        Self::from_json(BUILTIN_PICHU)
    }

    pub(crate) fn load(path: &Path) -> Result<Self, AtlasError> {
        let s = fs::read_to_string(path)?;
        Self::from_json(&s)
    }

    pub(crate) fn from_json(s: &str) -> Result<Self, AtlasError> {
        let file: AtlasFile = serde_json::from_str(s)?;

        let frames: Vec<SpriteFrame> = file
            .frames
            .iter()
            .map(|f| SpriteFrame {
                region: Rect::new(f.frame.x, f.frame.y, f.frame.w, f.frame.h),
                offset: (f.sprite_source_size.x, f.sprite_source_size.y),
                source_size: (f.source_size.w, f.source_size.h),
                facing: f.filename.as_deref().and_then(facing_from_name),
            })
            .collect();

        let a = file.animations;
        let mut ranges = HashMap::new();
        ranges.insert(AnimationId::MovingRight, a.moving_right);
        ranges.insert(AnimationId::MovingLeft, a.moving_left);
        ranges.insert(AnimationId::StandingRight, a.standing_right);
        ranges.insert(AnimationId::StandingLeft, a.standing_left);
        ranges.insert(AnimationId::Sick, a.sick);
        ranges.insert(AnimationId::Dead, a.dead);
        if let Some(r) = a.back_moving {
            ranges.insert(AnimationId::BackMoving, r);
        }
        if let Some(r) = a.back_standing {
            ranges.insert(AnimationId::BackStanding, r);
        }

        for (id, r) in &ranges {
            if r.length == 0 {
                return Err(AtlasError::EmptyAnimation { name: id.name() });
            }
            if r.start + r.length > frames.len() {
                return Err(AtlasError::OutOfRange {
                    name: id.name(),
                    start: r.start,
                    end: r.start + r.length,
                    frames: frames.len(),
                });
            }
        }

        Ok(Self {
            frames,
            default_speed: a.speed,
            ranges,
        })
    }

    pub(crate) fn range(&self, id: AnimationId) -> Option<&AnimationRange> {
        self.ranges.get(&id)
    }

    pub(crate) fn has_back_animations(&self) -> bool {
        self.ranges.contains_key(&AnimationId::BackMoving)
            && self.ranges.contains_key(&AnimationId::BackStanding)
    }

    /// Milliseconds per frame for an animation.
    pub(crate) fn speed(&self, range: &AnimationRange) -> u64 {
        range
            .speed
            .or(self.default_speed)
            .unwrap_or(DEFAULT_SPEED_MS)
    }
}

/// TexturePacker names poses like `007-NeutralLeft.png`.
fn facing_from_name(name: &str) -> Option<Facing> {
    if name.contains("Left") {
        Some(Facing::Left)
    } else if name.contains("Right") {
        Some(Facing::Right)
    } else {
        None
    }
}

#[derive(Deserialize)]
struct AtlasFile {
    frames: Vec<FrameDef>,
    animations: AnimationsDef,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameDef {
    #[serde(default)]
    filename: Option<String>,
    frame: RegionDef,
    sprite_source_size: RegionDef,
    source_size: SizeDef,
}

#[derive(Deserialize)]
struct RegionDef {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Deserialize)]
struct SizeDef {
    w: i32,
    h: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnimationsDef {
    #[serde(default)]
    speed: Option<u64>,
    moving_right: AnimationRange,
    moving_left: AnimationRange,
    standing_right: AnimationRange,
    standing_left: AnimationRange,
    sick: AnimationRange,
    dead: AnimationRange,
    #[serde(default)]
    back_moving: Option<AnimationRange>,
    #[serde(default)]
    back_standing: Option<AnimationRange>,
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Ten identical 10×10 frames, every animation two frames long except
    /// `dead`, and no back animations.
    pub(crate) fn tiny_atlas() -> SpriteAtlas {
        let frame = r#"{"frame":{"x":0,"y":0,"w":10,"h":10},
            "spriteSourceSize":{"x":2,"y":3,"w":10,"h":10},
            "sourceSize":{"w":20,"h":20}}"#;
        let frames = vec![frame; 10].join(",");
        let json = format!(
            r#"{{"frames":[{frames}],"animations":{{
                "speed":100,
                "movingRight":{{"start":0,"length":2}},
                "movingLeft":{{"start":2,"length":2}},
                "standingRight":{{"start":4,"length":2,"speed":500}},
                "standingLeft":{{"start":6,"length":2,"speed":500}},
                "sick":{{"start":8,"length":2,"speed":750}},
                "dead":{{"start":0,"length":1}}
            }}}}"#
        );
        SpriteAtlas::from_json(&json).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_atlas_loads() {
        let atlas = SpriteAtlas::builtin().unwrap();
        assert_eq!(atlas.frames.len(), 12);
        assert!(atlas.has_back_animations());
        let standing = atlas.range(AnimationId::StandingLeft).unwrap();
        assert_eq!(standing.start, 6);
        assert_eq!(atlas.speed(standing), 500);
        let moving = atlas.range(AnimationId::MovingLeft).unwrap();
        assert_eq!(atlas.speed(moving), 100);
    }

    #[test]
    fn frame_origin_centres_the_source() {
        let atlas = SpriteAtlas::builtin().unwrap();
        // 001-NeutralRight: offset (9, 14) in a 100×100 source
        assert_eq!(atlas.frames[0].origin(160, 144), (119, 108));
        assert_eq!(atlas.frames[0].screen_rect(160, 144), Rect::new(119, 108, 77, 73));
    }

    #[test]
    fn frames_know_their_facing_from_the_file_name() {
        let atlas = SpriteAtlas::builtin().unwrap();
        assert_eq!(atlas.frames[0].facing, Some(Facing::Right));
        assert_eq!(atlas.frames[5].facing, Some(Facing::Right));
        assert_eq!(atlas.frames[6].facing, Some(Facing::Left));
        assert_eq!(atlas.frames[11].facing, Some(Facing::Left));
        // unnamed frames look straight ahead
        assert_eq!(testing::tiny_atlas().frames[0].facing, None);
        assert_eq!(facing_from_name("sick-01.png"), None);
    }

    #[test]
    fn speed_falls_back_to_default() {
        let mut atlas = testing::tiny_atlas();
        atlas.default_speed = None;
        let r = *atlas.range(AnimationId::MovingRight).unwrap();
        assert_eq!(atlas.speed(&r), DEFAULT_SPEED_MS);
    }

    #[test]
    fn rejects_ranges_past_the_frame_list() {
        let json = r#"{"frames":[],"animations":{
            "movingRight":{"start":0,"length":1},
            "movingLeft":{"start":0,"length":1},
            "standingRight":{"start":0,"length":1},
            "standingLeft":{"start":0,"length":1},
            "sick":{"start":0,"length":1},
            "dead":{"start":0,"length":1}}}"#;
        assert!(matches!(
            SpriteAtlas::from_json(json),
            Err(AtlasError::OutOfRange { frames: 0, .. })
        ));
    }

    #[test]
    fn rejects_missing_animations() {
        let json = r#"{"frames":[],"animations":{"speed":10}}"#;
        assert!(matches!(
            SpriteAtlas::from_json(json),
            Err(AtlasError::Json(_))
        ));
    }

    #[test]
    fn rejects_empty_animations() {
        let mut json = String::from(r#"{"frames":[{"frame":{"x":0,"y":0,"w":1,"h":1},"spriteSourceSize":{"x":0,"y":0,"w":1,"h":1},"sourceSize":{"w":1,"h":1}}],"animations":{"#);
        json.push_str(
            r#""movingRight":{"start":0,"length":1},
            "movingLeft":{"start":0,"length":1},
            "standingRight":{"start":0,"length":1},
            "standingLeft":{"start":0,"length":1},
            "sick":{"start":0,"length":0},
            "dead":{"start":0,"length":1}}}"#,
        );
        assert!(matches!(
            SpriteAtlas::from_json(&json),
            Err(AtlasError::EmptyAnimation { name: "sick" })
        ));
    }
}
