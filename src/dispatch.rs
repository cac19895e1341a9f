use crate::interface::{Icon, StatsCard};
use crate::model::{Dice, Pet};
use crate::render::Renderer;
use crate::sim;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatsOverlay {
    Hidden,
    Shown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// No icon, or one that only displays state.
    Ignored,
    /// The click only closed the stats card.
    Dismissed,
    /// A care action aimed at a dead pet.
    Refused(Icon),
    /// The icon's action ran; `spin` is set when a new spin has to be driven.
    Handled { icon: Icon, spin: bool },
}

/// Turns icon clicks into actions on one pet.
pub(crate) struct Dispatcher {
    pub(crate) stats: StatsOverlay,
    /// Lights switched off.
    pub(crate) dark: bool,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self {
            stats: StatsOverlay::Hidden,
            dark: false,
        }
    }

    /// Whether the play field is currently covered.
    pub(crate) fn overlay_active(&self) -> bool {
        self.dark || self.stats == StatsOverlay::Shown
    }

    pub(crate) fn handle(
        &mut self,
        pet: &mut Pet,
        icon: Option<Icon>,
        dice: &mut dyn Dice,
        renderer: &mut dyn Renderer,
    ) -> Outcome {
        let Some(icon) = icon else {
            return Outcome::Ignored;
        };

        // An open stats card swallows the next icon click.
        if self.stats == StatsOverlay::Shown {
            self.stats = StatsOverlay::Hidden;
            renderer.draw_overlay(self.dark);
            tracing::debug!(?icon, "stats card closed");
            return Outcome::Dismissed;
        }

        let care = matches!(
            icon,
            Icon::Feed | Icon::JunkFood | Icon::Cure | Icon::Games | Icon::No
        );
        if care && pet.dead {
            tracing::debug!(?icon, "ignoring care action for a dead pet");
            return Outcome::Refused(icon);
        }

        let mut spin = false;
        match icon {
            Icon::Calling => return Outcome::Ignored,
            Icon::Feed => sim::feed(pet, false),
            Icon::JunkFood => sim::feed(pet, true),
            Icon::Cure => {
                let cured = sim::cure(pet, dice);
                tracing::debug!(cured, frailty = pet.frailty, "medicine given");
            }
            Icon::Games => {
                spin = sim::play(pet);
                if !spin {
                    tracing::debug!("already spinning");
                }
            }
            Icon::No => sim::scold(pet),
            Icon::Lights => {
                self.dark = !self.dark;
                renderer.draw_overlay(self.dark);
            }
            Icon::Stats => {
                self.stats = StatsOverlay::Shown;
                renderer.draw_overlay(true);
                renderer.draw_stats(&StatsCard::of(pet));
            }
        }

        tracing::debug!(?icon, happiness = pet.happiness, hunger = pet.hunger, "icon handled");
        renderer.draw_icon(icon, 1.0);
        Outcome::Handled { icon, spin }
    }
}
