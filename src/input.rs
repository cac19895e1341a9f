use crate::interface::{icon_at, Icon};
use crate::model::Scene;
use crate::render::Viewport;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    /// Left button pressed over a terminal cell.
    Click { col: u16, row: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// An icon press, or a press on empty space.
    Click(Option<Icon>),
    HelpToggle,
    Back,
    NewPet,
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        let ev = match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => InputEvent::Key {
                key: k.code,
                mods: k.modifiers,
            },
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                InputEvent::Click {
                    col: m.column,
                    row: m.row,
                }
            }
            _ => continue,
        };
        out.push(ev);
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

fn shortcut(ch: char) -> Option<Icon> {
    match ch.to_ascii_lowercase() {
        'f' => Some(Icon::Feed),
        'j' => Some(Icon::JunkFood),
        'c' => Some(Icon::Cure),
        'p' => Some(Icon::Games),
        'n' => Some(Icon::No),
        'l' => Some(Icon::Lights),
        's' => Some(Icon::Stats),
        _ => None,
    }
}

pub(crate) fn map_event(scene: &Scene, view: Viewport, ev: InputEvent) -> Option<Command> {
    // the recap box goes away on anything
    if matches!(scene, Scene::Recap(_)) {
        return Some(Command::Back);
    }

    let (key, mods) = match ev {
        InputEvent::Click { col, row } => {
            if !matches!(scene, Scene::Main) {
                return None;
            }
            let (x, y) = view.world_at(col, row)?;
            return Some(Command::Click(icon_at(x, y)));
        }
        InputEvent::Key { key, mods } => (key, mods),
    };

    if key == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Command::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') => return Some(Command::HelpToggle),
        KeyCode::Esc => return Some(Command::Back),
        _ => {}
    }

    match (scene, key) {
        (Scene::Main, KeyCode::Char(ch)) => shortcut(ch).map(|icon| Command::Click(Some(icon))),
        (Scene::Dead, KeyCode::Char('r') | KeyCode::Char('R')) => Some(Command::NewPet),
        _ => None,
    }
}
