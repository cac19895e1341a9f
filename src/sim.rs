use crate::model::{CatchupSummary, Dice, Facing, Pet};
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Distance kept between the pet and either side of the viewport.
pub(crate) const EDGE_MARGIN: i32 = 20;
pub(crate) const STEP_PX: i32 = 2;

const UNHAPPY_HUNGER: u64 = 20_000;
const STARVING_HUNGER: u64 = 50_000;
const CALLING_HUNGER: u64 = 15_000;
const FEED_THRESHOLD: u64 = 5_000;

pub(crate) const SPIN_STEPS: u8 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Alive,
    Dead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SpinProgress {
    Turning,
    Finished,
}

/// One AI tick. Each probabilistic rule rolls exactly once, and only when
/// its guard holds.
pub(crate) fn tick(pet: &mut Pet, viewport_width: i32, dice: &mut dyn Dice) -> TickOutcome {
    if pet.dead {
        return TickOutcome::Dead;
    }

    if pet.moving && !pet.sick && dice.chance(0.5) {
        let step = match pet.facing {
            Facing::Left => -STEP_PX,
            Facing::Right => STEP_PX,
        };
        let hi = (viewport_width - EDGE_MARGIN).max(EDGE_MARGIN);
        pet.x = (pet.x + step).clamp(EDGE_MARGIN, hi);
    }

    if pet.hunger > UNHAPPY_HUNGER && dice.chance(0.001) {
        pet.happiness = pet.happiness.saturating_sub(1);
    }

    if pet.hunger > STARVING_HUNGER {
        pet.happiness = pet.happiness.saturating_sub(1);
        if dice.chance(pet.hunger as f64 * 1e-7 * pet.frailty as f64) {
            pet.dead = true;
        }
    }

    if pet.sick {
        if dice.chance(0.000_01) {
            pet.sick = false;
        }
    } else if dice.chance(0.000_01 * pet.frailty as f64) {
        pet.sick = true;
    }

    if pet.sick {
        if dice.chance(0.000_001 * pet.frailty as f64) {
            pet.dead = true;
        } else {
            pet.happiness = pet.happiness.saturating_sub(1);
        }
    }

    if dice.chance(0.0001 / pet.discipline.saturating_add(1) as f64) {
        pet.calling = true;
        pet.naughty = true;
    }

    pet.hunger = pet.hunger.saturating_add(1);

    pet.calling = pet.sick || pet.hunger > CALLING_HUNGER || pet.happiness < 0;

    if pet.dead {
        pet.calling = false;
        TickOutcome::Dead
    } else {
        pet.age = pet.age.saturating_add(1);
        TickOutcome::Alive
    }
}

pub(crate) fn feed(pet: &mut Pet, junk: bool) {
    if junk {
        pet.happiness = pet.happiness.saturating_add(1000);
        pet.hunger = pet.hunger.saturating_sub(1000);
        pet.frailty = pet.frailty.saturating_add(1);
    } else if pet.hunger > FEED_THRESHOLD {
        pet.hunger = pet.hunger.saturating_sub(10_000);
    }
}

/// Medicine only helps a sick pet; giving it to a healthy one upsets it.
pub(crate) fn cure(pet: &mut Pet, dice: &mut dyn Dice) -> bool {
    if !pet.sick {
        pet.happiness = pet.happiness.saturating_sub(1000);
        return false;
    }
    pet.frailty = pet.frailty.saturating_add(1);
    if dice.chance(0.5 + pet.frailty as f64 * 0.01) {
        pet.sick = false;
        pet.happiness = pet.happiness.saturating_add(500);
        true
    } else {
        false
    }
}

/// Starts the spin game. Returns `false` when a spin is already running.
pub(crate) fn play(pet: &mut Pet) -> bool {
    if pet.is_spinning() {
        return false;
    }
    pet.spin = Some(SPIN_STEPS);
    true
}

/// Advances a running spin by one step.
pub(crate) fn spin_step(pet: &mut Pet) -> SpinProgress {
    match pet.spin {
        Some(left) if left > 0 => {
            pet.back_turned = !pet.back_turned;
            pet.spin = Some(left - 1);
            SpinProgress::Turning
        }
        Some(_) => {
            pet.money = pet.money.saturating_add(10);
            pet.happiness = pet.happiness.saturating_add(10_000);
            pet.spin = None;
            SpinProgress::Finished
        }
        None => SpinProgress::Finished,
    }
}

pub(crate) fn scold(pet: &mut Pet) {
    pet.happiness = pet.happiness.saturating_sub(10_000);
    if pet.naughty {
        pet.discipline = pet.discipline.saturating_add(1);
        pet.calling = false;
        pet.naughty = false;
    } else {
        pet.happiness = pet.happiness.saturating_sub(30_000);
    }
}

/// Replays the AI ticks that would have run while the game was closed.
pub(crate) fn catch_up(
    pet: &mut Pet,
    last_seen: DateTime<Utc>,
    now: DateTime<Utc>,
    tick_ms: u64,
    max_secs: i64,
    viewport_width: i32,
    dice: &mut dyn Dice,
) -> CatchupSummary {
    let elapsed = now - last_seen;
    let max_elapsed = ChronoDuration::seconds(max_secs.max(0));
    let elapsed = elapsed.clamp(ChronoDuration::zero(), max_elapsed);

    let mut summary = CatchupSummary::new(pet);
    let ticks = elapsed.num_milliseconds().max(0) as u64 / tick_ms.max(1);

    for _ in 0..ticks {
        let outcome = tick(pet, viewport_width, dice);
        summary.record(pet);
        if outcome == TickOutcome::Dead {
            break;
        }
    }

    summary
}
