use crate::model::{MethodKind, Scene};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

/// UI-level intents. Cursor movement stays in the app; everything else is
/// forwarded to the machine's entry points.
#[derive(Clone, Copy, Debug)]
pub(crate) enum UiAction {
    CursorMove(i32, i32),
    SelectItem,
    SelectMethod(MethodKind),
    StartPayment,
    Click,
    Cancel,
    HelpToggle,
    Back,
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) => {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    out.push(InputEvent {
                        key: k.code,
                        mods: k.modifiers,
                    });
                    if out.len() >= 32 {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(
    scene: &Scene,
    processing: bool,
    ev: InputEvent,
) -> Option<UiAction> {
    // raw mode eats SIGINT
    if ev.mods.contains(KeyModifiers::CONTROL)
        && matches!(ev.key, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return Some(UiAction::Quit);
    }

    if matches!(scene, Scene::Help) {
        return match ev.key {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => Some(UiAction::Back),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(UiAction::Quit),
            _ => None,
        };
    }

    // Global
    match ev.key {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(UiAction::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') => return Some(UiAction::HelpToggle),
        _ => {}
    }

    if processing {
        return match ev.key {
            KeyCode::Char(' ') => Some(UiAction::Click),
            KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('C') => Some(UiAction::Cancel),
            _ => None,
        };
    }

    match ev.key {
        KeyCode::Left => Some(UiAction::CursorMove(-1, 0)),
        KeyCode::Right => Some(UiAction::CursorMove(1, 0)),
        KeyCode::Up => Some(UiAction::CursorMove(0, -1)),
        KeyCode::Down => Some(UiAction::CursorMove(0, 1)),
        KeyCode::Enter => Some(UiAction::SelectItem),
        KeyCode::Char('1') => Some(UiAction::SelectMethod(MethodKind::Wait)),
        KeyCode::Char('2') => Some(UiAction::SelectMethod(MethodKind::Focus)),
        KeyCode::Char('3') => Some(UiAction::SelectMethod(MethodKind::Click)),
        KeyCode::Char('4') => Some(UiAction::SelectMethod(MethodKind::Breathe)),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(UiAction::StartPayment),
        KeyCode::Esc => Some(UiAction::Cancel),
        _ => None,
    }
}
