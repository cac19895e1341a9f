use crate::animation::Animator;
use crate::atlas::SpriteAtlas;
use crate::dispatch::{Dispatcher, Outcome};
use crate::interface::{Icon, ICONS, WORLD_W};
use crate::model::{Dice, Pet};
use crate::render::Renderer;
use crate::scheduler::{Job, Scheduler};
use crate::sim::{self, SpinProgress, TickOutcome};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Timing {
    pub(crate) tick_ms: u64,
    pub(crate) spin_step_ms: u64,
    pub(crate) blink_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_ms: 300,
            spin_step_ms: 200,
            blink_ms: 200,
        }
    }
}

/// One pet and everything that drives it.
pub(crate) struct Game {
    pub(crate) pet: Pet,
    dispatcher: Dispatcher,
    pub(crate) sched: Scheduler,
    atlas: SpriteAtlas,
    animator: Animator,
    dice: Box<dyn Dice>,
    timing: Timing,
}

impl Game {
    pub(crate) fn new(pet: Pet, atlas: SpriteAtlas, dice: Box<dyn Dice>, timing: Timing) -> Self {
        Self {
            pet,
            dispatcher: Dispatcher::new(),
            sched: Scheduler::new(),
            atlas,
            animator: Animator::new(),
            dice,
            timing,
        }
    }

    /// Draws the icon bar and kicks off the AI and animation loops.
    pub(crate) fn start(&mut self, renderer: &mut dyn Renderer) {
        for slot in &ICONS {
            renderer.draw_icon(slot.icon, 0.5);
        }
        self.sched.after(0, Job::Animate);
        self.sched.after(0, Job::Think);
        if self.pet.is_spinning() {
            self.sched.after(0, Job::Spin);
        }
    }

    /// Replaces the pet with a new one and starts over.
    pub(crate) fn restart(&mut self, pet: Pet, renderer: &mut dyn Renderer) {
        self.sched.clear();
        self.pet = pet;
        self.dispatcher = Dispatcher::new();
        self.animator = Animator::new();
        renderer.draw_overlay(false);
        self.start(renderer);
    }

    pub(crate) fn hatch(&mut self) -> Pet {
        Pet::hatch(self.dice.as_mut())
    }

    pub(crate) fn click(&mut self, icon: Option<Icon>, renderer: &mut dyn Renderer) -> Outcome {
        let out = self
            .dispatcher
            .handle(&mut self.pet, icon, self.dice.as_mut(), renderer);
        if let Outcome::Handled { icon, spin } = out {
            self.sched.after(self.timing.blink_ms, Job::Unblink(icon));
            if spin {
                self.sched.after(0, Job::Spin);
            }
        }
        out
    }

    /// Runs every job due up to `until_ms` on the scheduler clock.
    pub(crate) fn advance(&mut self, until_ms: u64, renderer: &mut dyn Renderer) -> usize {
        let mut ran = 0;
        while let Some(job) = self.sched.next_due(until_ms) {
            self.run(job, renderer);
            ran += 1;
        }
        ran
    }

    fn run(&mut self, job: Job, renderer: &mut dyn Renderer) {
        match job {
            Job::Think => match sim::tick(&mut self.pet, WORLD_W, self.dice.as_mut()) {
                TickOutcome::Alive => self.sched.after(self.timing.tick_ms, Job::Think),
                TickOutcome::Dead => {
                    tracing::info!(age = self.pet.age, hunger = self.pet.hunger, "pet died");
                }
            },
            Job::Animate => {
                let overlay = self.dispatcher.overlay_active();
                if let Some(delay) = self.animator.animate(
                    &mut self.pet,
                    &self.atlas,
                    overlay,
                    self.dice.as_mut(),
                    renderer,
                ) {
                    self.sched.after(delay, Job::Animate);
                }
            }
            Job::Spin => {
                if self.pet.dead {
                    return;
                }
                match sim::spin_step(&mut self.pet) {
                    SpinProgress::Turning => self.sched.after(self.timing.spin_step_ms, Job::Spin),
                    SpinProgress::Finished => {
                        tracing::debug!(money = self.pet.money, "spin finished");
                    }
                }
            }
            Job::Unblink(icon) => renderer.draw_icon(icon, 0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::testing::tiny_atlas;
    use crate::model::testing::{calm_pet, ScriptedDice};
    use crate::render::testing::{Call, Recorder};

    fn quiet_game(pet: Pet) -> Game {
        Game::new(
            pet,
            tiny_atlas(),
            Box::new(ScriptedDice::never()),
            Timing::default(),
        )
    }

    #[test]
    fn start_draws_every_icon_dimmed() {
        let mut g = quiet_game(calm_pet());
        let mut r = Recorder::default();
        g.start(&mut r);
        let dimmed = r
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Icon { alpha, .. } if *alpha == 0.5))
            .count();
        assert_eq!(dimmed, ICONS.len());
    }

    #[test]
    fn ticks_follow_the_interval() {
        let mut g = quiet_game(calm_pet());
        let mut r = Recorder::default();
        g.start(&mut r);
        g.advance(3000, &mut r);
        // ticks at 0, 300, ..., 3000
        assert_eq!(g.pet.age, 11);
        assert_eq!(g.pet.hunger, 11);
    }

    #[test]
    fn spin_plays_out_over_time() {
        let mut g = quiet_game(calm_pet());
        let mut r = Recorder::default();
        g.start(&mut r);
        g.click(Some(Icon::Games), &mut r);
        g.advance(1400, &mut r);
        assert!(g.pet.is_spinning());
        assert_eq!(g.pet.money, 0);
        g.advance(1600, &mut r);
        assert!(!g.pet.is_spinning());
        assert_eq!(g.pet.money, 10);
        assert!(!g.pet.back_turned);
    }

    #[test]
    fn a_second_play_click_does_not_double_the_spin() {
        let mut g = quiet_game(calm_pet());
        let mut r = Recorder::default();
        g.click(Some(Icon::Games), &mut r);
        g.advance(100, &mut r);
        g.click(Some(Icon::Games), &mut r);
        g.advance(5000, &mut r);
        assert_eq!(g.pet.money, 10);
    }

    #[test]
    fn blink_fades_after_the_delay() {
        let mut g = quiet_game(calm_pet());
        let mut r = Recorder::default();
        g.click(Some(Icon::Feed), &mut r);
        g.advance(199, &mut r);
        assert!(!r.calls.contains(&Call::Icon {
            icon: Icon::Feed,
            alpha: 0.5
        }));
        g.advance(200, &mut r);
        assert_eq!(
            r.calls.last(),
            Some(&Call::Icon {
                icon: Icon::Feed,
                alpha: 0.5
            })
        );
    }

    #[test]
    fn death_stops_both_loops() {
        let mut pet = calm_pet();
        pet.hunger = 60_000;
        pet.frailty = 1;
        let mut g = Game::new(
            pet,
            tiny_atlas(),
            Box::new(ScriptedDice::always()),
            Timing::default(),
        );
        let mut r = Recorder::default();
        g.start(&mut r);
        g.advance(0, &mut r);
        assert!(g.pet.dead);
        assert!(!g.sched.is_pending(Job::Think));

        // the animation loop notices on its next frame
        g.advance(10_000, &mut r);
        assert!(!g.sched.is_pending(Job::Animate));
        assert_eq!(g.advance(u64::MAX, &mut r), 0);
    }

    #[test]
    fn restart_brings_back_a_living_pet() {
        let mut pet = calm_pet();
        pet.dead = true;
        let mut g = quiet_game(pet);
        let mut r = Recorder::default();
        g.start(&mut r);
        g.advance(1000, &mut r);
        let fresh = g.hatch();
        g.restart(fresh, &mut r);
        g.advance(1300, &mut r);
        assert!(!g.pet.dead);
        assert!(g.pet.age > 0);
    }
}
