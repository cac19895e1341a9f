//! Fixed layout of the play field and the icon bar around it.
//!
//! Everything is in world pixels on a 320×240 field: icons along the top and
//! bottom bars, the pet walking in the strip between them.

use crate::model::Pet;

pub(crate) const WORLD_W: i32 = 320;
pub(crate) const WORLD_H: i32 = 240;

/// Rows 0..=50 hold the top icon bar, 190.. the bottom one.
pub(crate) const TOP_BAR_H: i32 = 51;
pub(crate) const PLAYFIELD: Rect = Rect {
    x: 0,
    y: TOP_BAR_H,
    w: WORLD_W,
    h: WORLD_H - TOP_BAR_H * 2,
};

pub(crate) const PET_HOME: (i32, i32) = (WORLD_W / 2, WORLD_H * 3 / 5);

/// Icons are hit-tested and drawn as 30×30 squares.
pub(crate) const ICON_SIZE: i32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Icon {
    Calling,
    Cure,
    Feed,
    Games,
    JunkFood,
    Lights,
    No,
    Stats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: i32,
    pub(crate) h: i32,
}

impl Rect {
    pub(crate) const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

pub(crate) struct IconSlot {
    pub(crate) icon: Icon,
    /// Source region in the interface sheet.
    pub(crate) region: Rect,
    /// Top-left corner on the field.
    pub(crate) at: (i32, i32),
    pub(crate) label: &'static str,
}

pub(crate) const ICONS: [IconSlot; 8] = [
    IconSlot {
        icon: Icon::Calling,
        region: Rect::new(2, 2, 60, 60),
        at: (280, 200),
        label: "!",
    },
    IconSlot {
        icon: Icon::Cure,
        region: Rect::new(64, 2, 54, 54),
        at: (280, 10),
        label: "Cure",
    },
    IconSlot {
        icon: Icon::Feed,
        region: Rect::new(120, 2, 58, 55),
        at: (10, 10),
        label: "Feed",
    },
    IconSlot {
        icon: Icon::Games,
        region: Rect::new(180, 2, 60, 60),
        at: (190, 10),
        label: "Play",
    },
    IconSlot {
        icon: Icon::JunkFood,
        region: Rect::new(242, 2, 54, 66),
        at: (10, 200),
        label: "Junk",
    },
    IconSlot {
        icon: Icon::Lights,
        region: Rect::new(298, 2, 68, 68),
        at: (100, 10),
        label: "Light",
    },
    IconSlot {
        icon: Icon::No,
        region: Rect::new(368, 2, 67, 60),
        at: (190, 200),
        label: "No!",
    },
    IconSlot {
        icon: Icon::Stats,
        region: Rect::new(437, 2, 54, 54),
        at: (100, 200),
        label: "Stats",
    },
];

impl Icon {
    pub(crate) fn slot(self) -> &'static IconSlot {
        // ICONS lists every variant.
        ICONS
            .iter()
            .find(|s| s.icon == self)
            .unwrap_or(&ICONS[0])
    }

    pub(crate) fn bounds(self) -> Rect {
        let (x, y) = self.slot().at;
        Rect::new(x, y, ICON_SIZE, ICON_SIZE)
    }
}

/// Which icon, if any, lies under a field position. Edges do not count.
pub(crate) fn icon_at(x: f32, y: f32) -> Option<Icon> {
    ICONS.iter().map(|s| s.icon).find(|icon| {
        let b = icon.bounds();
        x > b.x as f32 && x < (b.x + b.w) as f32 && y > b.y as f32 && y < (b.y + b.h) as f32
    })
}

/// Content of the stats overlay: six hearts each for fullness and mood.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StatsCard {
    pub(crate) hunger: String,
    pub(crate) happy: String,
    pub(crate) money: String,
}

impl StatsCard {
    pub(crate) fn of(pet: &Pet) -> Self {
        let hungry = (pet.hunger as f64 / 10_000.0).min(6.0).round().max(0.0) as usize;
        let happy = (pet.happiness as f64 / 50_000.0 * 5.0)
            .min(6.0)
            .round()
            .max(0.0) as usize;

        Self {
            hunger: format!("Hunger: {}{}", "♥".repeat(6 - hungry), "♡".repeat(hungry)),
            happy: format!("Happy: {}{}", "♥".repeat(happy), "♡".repeat(6 - happy)),
            money: format!("Money: {}", pet.money),
        }
    }
}
