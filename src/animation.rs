//! Picks the pet's animation from its state and steps it one frame per
//! render tick.

use crate::atlas::SpriteAtlas;
use crate::interface::{Icon, Rect, PLAYFIELD};
use crate::model::{Dice, Pet};
use crate::render::Renderer;

/// Extra delay per frame while the pet is this hungry.
const SLUGGISH_HUNGER: u64 = 40_000;
const SLUGGISH_EXTRA_MS: u64 = 50;

const TOGGLE_MOVING_P: f64 = 0.3;
const FLIP_FACING_P: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum AnimationId {
    Dead,
    Sick,
    MovingLeft,
    MovingRight,
    StandingLeft,
    StandingRight,
    BackMoving,
    BackStanding,
}

impl AnimationId {
    pub(crate) fn name(self) -> &'static str {
        match self {
            AnimationId::Dead => "dead",
            AnimationId::Sick => "sick",
            AnimationId::MovingLeft => "movingLeft",
            AnimationId::MovingRight => "movingRight",
            AnimationId::StandingLeft => "standingLeft",
            AnimationId::StandingRight => "standingRight",
            AnimationId::BackMoving => "backMoving",
            AnimationId::BackStanding => "backStanding",
        }
    }
}

/// Dead beats sick beats moving beats standing. A turned back only shows
/// when the atlas has back animations.
pub(crate) fn select_animation(pet: &Pet, atlas: &SpriteAtlas) -> AnimationId {
    use crate::model::Facing::{Left, Right};

    if pet.dead {
        return AnimationId::Dead;
    }
    if pet.sick {
        return AnimationId::Sick;
    }
    if pet.back_turned && atlas.has_back_animations() {
        return if pet.moving {
            AnimationId::BackMoving
        } else {
            AnimationId::BackStanding
        };
    }
    match (pet.moving, pet.facing) {
        (true, Left) => AnimationId::MovingLeft,
        (true, Right) => AnimationId::MovingRight,
        (false, Left) => AnimationId::StandingLeft,
        (false, Right) => AnimationId::StandingRight,
    }
}

/// Remembers where the last frame went so it can be wiped before the next.
pub(crate) struct Animator {
    last: Rect,
}

impl Animator {
    pub(crate) fn new() -> Self {
        Self { last: PLAYFIELD }
    }

    /// Draws the next frame. Returns the delay before the following frame, or
    /// `None` once the pet is dead.
    pub(crate) fn animate(
        &mut self,
        pet: &mut Pet,
        atlas: &SpriteAtlas,
        overlay: bool,
        dice: &mut dyn Dice,
        renderer: &mut dyn Renderer,
    ) -> Option<u64> {
        let id = select_animation(pet, atlas);
        let Some(range) = atlas.range(id).copied() else {
            tracing::warn!(animation = id.name(), "atlas has no such animation");
            return None;
        };

        if pet.frame == range.length && !pet.dead {
            on_cycle_complete(pet, dice, renderer);
        }

        pet.frame %= range.length;
        let sprite = atlas.frames[range.start + pet.frame];
        let at = sprite.screen_rect(pet.x, pet.y);

        if !overlay {
            renderer.clear_region(self.last);
            renderer.draw_frame(&sprite, at.x, at.y);
        }
        self.last = at;
        pet.frame += 1;

        if pet.dead {
            return None;
        }
        let mut delay = atlas.speed(&range);
        if pet.hunger > SLUGGISH_HUNGER {
            delay += SLUGGISH_EXTRA_MS;
        }
        Some(delay)
    }
}

/// Runs between animation loops, where a change of pose looks seamless.
fn on_cycle_complete(pet: &mut Pet, dice: &mut dyn Dice, renderer: &mut dyn Renderer) {
    if dice.chance(TOGGLE_MOVING_P) {
        pet.moving = !pet.moving;
    }
    if dice.chance(FLIP_FACING_P) {
        pet.facing = pet.facing.flipped();
    }
    renderer.draw_icon(Icon::Calling, if pet.calling { 1.0 } else { 0.5 });
}
