use crate::atlas::SpriteAtlas;
use crate::config::{load_settings, save_settings_atomic, Paths, Settings};
use crate::dispatch::Outcome;
use crate::game::Game;
use crate::input::{collect_input_nonblocking, map_event, Command};
use crate::interface::{PLAYFIELD, WORLD_W};
use crate::model::{CatchupSummary, Pet, Scene};
use crate::render::{draw_text, labels_overlay, surface_to_cells, Cell, Surface, Terminal};
use crate::sim::catch_up;
use crate::storage::{load_save, save_atomic};
use crate::Cli;
use anyhow::Context;
use crossterm::style::Color;
use rand::{rngs::StdRng, SeedableRng};
use std::cmp::min;
use std::time::{Duration, Instant};

const KEY_LINE: &str = "f feed  j junk  c cure  p play  n no!  l light  s stats  h help  q quit";

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    game: Game,
    surface: Surface,
    scene: Scene,
    term: Terminal,
    should_quit: bool,
    autosave_at: Instant,
    started: Instant,
}

impl App {
    fn init(cli: Cli, paths: Paths) -> anyhow::Result<Self> {
        let mut settings = load_settings(&paths.settings_path);
        if !paths.settings_path.exists() {
            // leave an editable copy of the defaults behind
            save_settings_atomic(&paths.settings_path, &settings)?;
        }
        if cli.seed.is_some() {
            settings.seed = cli.seed;
        }
        if cli.no_color {
            settings.enable_color = false;
        }

        let atlas = match &cli.atlas {
            Some(path) => SpriteAtlas::load(path)
                .with_context(|| format!("loading atlas {}", path.display()))?,
            None => SpriteAtlas::builtin().context("loading the built-in atlas")?,
        };

        let seed = settings.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, "rng seeded");
        let mut rng = StdRng::seed_from_u64(seed);

        let saved = if cli.fresh { None } else { load_save(&paths.save_path) };
        let (pet, scene) = match saved {
            Some((mut pet, last_seen)) => {
                let summary = catch_up(
                    &mut pet,
                    last_seen,
                    chrono::Utc::now(),
                    settings.tick_ms,
                    settings.catchup_max_secs,
                    WORLD_W,
                    &mut rng,
                );
                tracing::info!(
                    ticks = summary.ticks_simulated,
                    age = pet.age,
                    dead = pet.dead,
                    "pet loaded"
                );
                let scene = if summary.has_anything() {
                    Scene::Recap(summary)
                } else if pet.dead {
                    Scene::Dead
                } else {
                    Scene::Main
                };
                (pet, scene)
            }
            None => {
                let pet = Pet::hatch(&mut rng);
                tracing::info!(gender = ?pet.gender, "pet hatched");
                (pet, Scene::Main)
            }
        };

        let mut game = Game::new(pet, atlas, Box::new(rng), settings.timing());
        let mut surface = Surface::new();
        game.start(&mut surface);

        let term = Terminal::begin()?;
        let autosave_at = Instant::now() + Duration::from_secs(settings.autosave_secs.max(1));

        Ok(Self {
            settings,
            paths,
            game,
            surface,
            scene,
            term,
            should_quit: false,
            autosave_at,
            started: Instant::now(),
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        while !self.should_quit {
            self.term.resize_if_needed()?;
            let view = self.term.viewport();

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(cmd) = map_event(&self.scene, view, ev) {
                    self.apply(cmd)?;
                }
                if self.should_quit {
                    break;
                }
            }

            // the scheduler runs on milliseconds since startup
            let now_ms = self.started.elapsed().as_millis() as u64;
            self.game.advance(now_ms, &mut self.surface);

            if self.game.pet.dead && matches!(self.scene, Scene::Main) {
                self.scene = Scene::Dead;
                self.save_now()?;
            }

            self.render_frame()?;

            if Instant::now() >= self.autosave_at {
                self.save_now()?;
                self.autosave_at =
                    Instant::now() + Duration::from_secs(self.settings.autosave_secs.max(1));
            }

            spin_sleep(frame_dt, Instant::now());
        }

        self.save_now()
    }

    fn apply(&mut self, cmd: Command) -> anyhow::Result<()> {
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::HelpToggle => {
                self.scene = match self.scene {
                    Scene::Help => self.resting_scene(),
                    _ => Scene::Help,
                }
            }
            Command::Back => self.scene = self.resting_scene(),
            Command::NewPet => {
                let pet = self.game.hatch();
                self.game.restart(pet, &mut self.surface);
                tracing::info!(gender = ?self.game.pet.gender, "new pet hatched");
                self.scene = Scene::Main;
                self.save_now()?;
            }
            Command::Click(icon) => {
                if let Outcome::Refused(icon) = self.game.click(icon, &mut self.surface) {
                    tracing::debug!(?icon, "click refused");
                }
            }
        }
        Ok(())
    }

    fn resting_scene(&self) -> Scene {
        if self.game.pet.dead {
            Scene::Dead
        } else {
            Scene::Main
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let bg = Color::Black;
        let view = self.term.viewport();
        self.term.cur.clear(bg);

        surface_to_cells(
            &self.surface,
            &mut self.term.cur,
            view,
            self.settings.enable_color,
            bg,
        );
        labels_overlay(&mut self.term.cur, &self.surface, view, bg);

        if self.surface.overlay && self.surface.stats.is_none() {
            let mid_y = (PLAYFIELD.y + PLAYFIELD.h / 2) as f32;
            let (col, row) = view.cell_at(WORLD_W as f32 / 2.0, mid_y);
            draw_text(&mut self.term.cur, col.saturating_sub(2), row, "z z z", Color::DarkGrey, bg);
        }

        let pet = &self.game.pet;
        let status = format!("{KEY_LINE}   age {}  ${}", pet.age, pet.money);
        draw_text(
            &mut self.term.cur,
            0,
            self.term.rows.saturating_sub(1),
            &status,
            Color::Grey,
            bg,
        );

        let boxed = match &self.scene {
            Scene::Main => None,
            Scene::Help => Some(("How to play", HELP_TEXT.to_string())),
            Scene::Recap(s) => Some(("While you were away...", recap_text(s))),
            Scene::Dead => Some((
                "Your Pokegotchi has passed on.",
                "Press R to hatch a new one, or Q to quit.".to_string(),
            )),
        };
        if let Some((title, body)) = boxed {
            self.draw_center_box(title, &body);
        }

        self.term.present(true)?;
        Ok(())
    }

    fn draw_center_box(&mut self, title: &str, body: &str) {
        let w = self.term.cols;
        let h = self.term.rows;

        let bw = min(60, w.saturating_sub(4));
        let bh = min(18, h.saturating_sub(4));
        if bw < 2 || bh < 2 {
            return;
        }

        let x0 = (w - bw) / 2;
        let y0 = (h - bh) / 2;
        let buf = &mut self.term.cur;
        let mut put = |x: u16, y: u16, ch: char| {
            buf.set(
                x,
                y,
                Cell {
                    ch,
                    fg: Color::White,
                    bg: Color::Black,
                },
            )
        };

        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                put(x, y, ' ');
            }
        }
        for x in x0..x0 + bw {
            put(x, y0, '─');
            put(x, y0 + bh - 1, '─');
        }
        for y in y0..y0 + bh {
            put(x0, y, '│');
            put(x0 + bw - 1, y, '│');
        }
        put(x0, y0, '┌');
        put(x0 + bw - 1, y0, '┐');
        put(x0, y0 + bh - 1, '└');
        put(x0 + bw - 1, y0 + bh - 1, '┘');

        draw_text(buf, x0 + 2, y0 + 1, title, Color::White, Color::Black);

        let mut yy = y0 + 3;
        for line in body.lines() {
            if yy >= y0 + bh - 1 {
                break;
            }
            draw_text(buf, x0 + 2, yy, line, Color::White, Color::Black);
            yy += 1;
        }
    }

    fn save_now(&self) -> anyhow::Result<()> {
        save_atomic(&self.paths.save_path, &self.game.pet, chrono::Utc::now())?;
        tracing::debug!(path = %self.paths.save_path.display(), "saved");
        Ok(())
    }
}

const HELP_TEXT: &str = "Keep your Pokegotchi fed, happy and healthy.\n\
Click an icon or press its key.\n\n\
F Feed: fills the belly when it is hungry.\n\
J Junk food: instant joy, but it makes your pet frail.\n\
C Cure: medicine for a sick pet. Healthy pets hate it.\n\
P Play: a spin game that earns money and joy.\n\
N No!: scold mischief. Scolding a good pet hurts.\n\
L Light: lights on or off.\n\
S Stats: hunger, happiness and money.\n\n\
The ! icon lights up when your pet wants you.\n\
Esc or H to close help.";

fn recap_text(s: &CatchupSummary) -> String {
    format!(
        "Simulated {} ticks\nHighest hunger: {}\nLowest happiness: {}\nFell sick: {}\nDied: {}\n\nPress any key",
        s.ticks_simulated, s.hunger_max, s.happiness_min, s.became_sick, s.died
    )
}

pub(crate) fn run(cli: Cli, paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(cli, paths)?;
    let res = app.run();
    // hand the terminal back even when the loop failed
    app.term.end()?;
    if let Err(e) = &res {
        tracing::error!(error = %e, "game loop failed");
    }
    res
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::calm_pet;

    #[test]
    fn recap_mentions_the_numbers() {
        let mut pet = calm_pet();
        let mut s = CatchupSummary::new(&pet);
        pet.hunger = 16_000;
        pet.sick = true;
        s.record(&pet);
        let text = recap_text(&s);
        assert!(text.contains("Simulated 1 ticks"));
        assert!(text.contains("Highest hunger: 16000"));
        assert!(text.contains("Fell sick: true"));
    }

    #[test]
    fn help_fits_the_box() {
        // 18 rows minus border, title and gap
        assert!(HELP_TEXT.lines().count() <= 14);
        assert!(HELP_TEXT.lines().all(|l| l.chars().count() <= 56));
    }
}
