//! Translate text commands into stage events.
//!
//! Accepted commands (case-insensitive):
//! - `space` / `enter` – `Play`
//! - `escape` – `Pause` in a level, `Resume` in the pause screen, `Back` elsewhere
//! - the event names `play`, `back`, `menu`, `next`, `quit`, `pause`,
//!   `resume`, `leaderboard`
//! - `end:<score>` and `save:<name>`

use crate::events::stage::StageInput;
use crate::resources::input::InputState;
use crate::resources::stage::{StageController, StageEvent, StageState};
use bevy_ecs::prelude::*;
use log::{debug, warn};

/// Parse one command given the current stage.
pub fn parse_command(line: &str, state: Option<StageState>) -> Result<StageEvent, String> {
    let line = line.trim();
    if let Some((verb, argument)) = line.split_once(':') {
        let argument = argument.trim();
        return match verb.trim().to_ascii_lowercase().as_str() {
            "end" => argument
                .parse::<i64>()
                .map(|score| StageEvent::End { score })
                .map_err(|e| format!("invalid score '{}': {}", argument, e)),
            "save" if argument.is_empty() => Err("save needs a name".to_string()),
            "save" => Ok(StageEvent::Save {
                name: argument.to_string(),
            }),
            other => Err(format!("unknown command '{}'", other)),
        };
    }

    let event = match line.to_ascii_lowercase().as_str() {
        "space" | "enter" | "play" => StageEvent::Play,
        "escape" | "esc" => match state {
            Some(StageState::Level) => StageEvent::Pause,
            Some(StageState::Pause) => StageEvent::Resume,
            _ => StageEvent::Back,
        },
        "back" => StageEvent::Back,
        "menu" => StageEvent::Menu,
        "next" => StageEvent::Next,
        "quit" => StageEvent::Quit,
        "pause" => StageEvent::Pause,
        "resume" => StageEvent::Resume,
        "leaderboard" => StageEvent::Leaderboard,
        "" => return Err("empty command".to_string()),
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(event)
}

/// Consume at most one line of input per tick while input is active.
pub fn read_input_lines(
    mut input: ResMut<InputState>,
    stage: Res<StageController>,
    mut writer: MessageWriter<StageInput>,
) {
    if !input.active {
        return;
    }
    let Some(line) = input.next_line() else {
        return;
    };
    match parse_command(&line, stage.current_state()) {
        Ok(event) => {
            debug!("[input] '{}' -> {:?}", line, event);
            writer.write(StageInput { event });
        }
        Err(e) => warn!("[input] {}", e),
    }
}
