use rand::{rngs::StdRng, Rng};

pub(crate) const SAVE_VERSION: u32 = 1;

/// Hunger a freshly hatched pet starts with; it wants feeding right away.
pub(crate) const HATCH_HUNGER: u64 = 60_000;

#[derive(Clone, Debug)]
pub(crate) enum Scene {
    Main,
    Help,
    Recap(CatchupSummary),
    Dead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Gender {
    Male,
    Female,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Facing {
    Left,
    Right,
}

impl Facing {
    pub(crate) fn flipped(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Pet {
    pub(crate) gender: Gender,
    pub(crate) facing: Facing,
    pub(crate) moving: bool,
    pub(crate) back_turned: bool,
    pub(crate) calling: bool,
    pub(crate) dead: bool,
    pub(crate) naughty: bool,
    pub(crate) sick: bool,
    pub(crate) discipline: u64,
    pub(crate) frailty: u64,
    pub(crate) happiness: i64,
    pub(crate) hunger: u64,
    pub(crate) age: u64,
    pub(crate) money: u64,
    pub(crate) x: i32,
    pub(crate) y: i32,
    /// Offset inside the active animation's frame range.
    pub(crate) frame: usize,
    /// Spin steps still to play; `Some` while a spin is in progress.
    pub(crate) spin: Option<u8>,
}

impl Pet {
    pub(crate) fn hatch(dice: &mut dyn Dice) -> Self {
        let gender = if dice.roll() > 0.5 {
            Gender::Male
        } else {
            Gender::Female
        };
        let facing = if dice.roll() > 0.5 {
            Facing::Left
        } else {
            Facing::Right
        };
        let (x, y) = crate::interface::PET_HOME;

        Self {
            gender,
            facing,
            moving: true,
            back_turned: false,
            calling: false,
            dead: false,
            naughty: false,
            sick: false,
            discipline: 0,
            frailty: 0,
            happiness: 0,
            hunger: HATCH_HUNGER,
            age: 0,
            money: 0,
            x,
            y,
            frame: 0,
            spin: None,
        }
    }

    pub(crate) fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }
}

/// Source of uniform randomness for every probabilistic rule.
pub(crate) trait Dice {
    /// A value in `[0, 1)`.
    fn roll(&mut self) -> f64;

    fn chance(&mut self, p: f64) -> bool {
        self.roll() < p
    }
}

impl Dice for StdRng {
    fn roll(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CatchupSummary {
    pub(crate) ticks_simulated: u64,
    pub(crate) became_sick: bool,
    pub(crate) died: bool,
    pub(crate) happiness_min: i64,
    pub(crate) hunger_max: u64,
}

impl CatchupSummary {
    pub(crate) fn new(pet: &Pet) -> Self {
        Self {
            ticks_simulated: 0,
            became_sick: false,
            died: false,
            happiness_min: pet.happiness,
            hunger_max: pet.hunger,
        }
    }

    pub(crate) fn has_anything(&self) -> bool {
        self.ticks_simulated > 0
            && (self.became_sick || self.died || self.happiness_min < 0 || self.hunger_max > 15_000)
    }

    pub(crate) fn record(&mut self, pet: &Pet) {
        self.ticks_simulated += 1;
        self.happiness_min = self.happiness_min.min(pet.happiness);
        self.hunger_max = self.hunger_max.max(pet.hunger);
        if pet.sick {
            self.became_sick = true;
        }
        if pet.dead {
            self.died = true;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedDice;
    use super::*;

    #[test]
    fn hatch_uses_the_starting_baseline() {
        let pet = Pet::hatch(&mut ScriptedDice::new(&[0.9, 0.1], 0.0));
        assert_eq!(pet.gender, Gender::Male);
        assert_eq!(pet.facing, Facing::Right);
        assert!(pet.moving);
        assert_eq!(pet.hunger, HATCH_HUNGER);
        assert_eq!(pet.happiness, 0);
        assert!(!pet.dead && !pet.sick && !pet.is_spinning());
    }

    #[test]
    fn chance_never_fires_for_zero_probability() {
        let mut dice = ScriptedDice::always();
        assert!(!dice.chance(0.0));
        assert!(dice.chance(1e-9));
    }

    #[test]
    fn summary_only_reports_noteworthy_catchups() {
        let mut pet = testing::calm_pet();
        let mut s = CatchupSummary::new(&pet);
        s.record(&pet);
        assert!(!s.has_anything());
        pet.happiness = -3;
        s.record(&pet);
        assert!(s.has_anything());
        assert_eq!(s.ticks_simulated, 2);
        assert_eq!(s.happiness_min, -3);
    }
}
