use crate::error::DispatchError;
use rdev::{simulate, EventType, Key};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Gap between synthesized press and release so the OS registers both
const KEY_HOLD: Duration = Duration::from_millis(20);

/// Sends a key press for a bound slot key
pub trait KeyDispatcher: Send + Sync {
    fn press(&self, key: &str) -> Result<(), DispatchError>;
}

/// Synthesizes real keyboard events through rdev
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyboardDispatcher;

impl KeyDispatcher for KeyboardDispatcher {
    fn press(&self, key: &str) -> Result<(), DispatchError> {
        let code = parse_key(key)?;

        send(&EventType::KeyPress(code), key)?;
        thread::sleep(KEY_HOLD);
        send(&EventType::KeyRelease(code), key)?;

        debug!("Pressed {}", key);
        Ok(())
    }
}

fn send(event: &EventType, key: &str) -> Result<(), DispatchError> {
    simulate(event).map_err(|e| DispatchError::Simulate {
        key: key.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Dry-run dispatcher: logs instead of pressing
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl KeyDispatcher for LogDispatcher {
    fn press(&self, key: &str) -> Result<(), DispatchError> {
        parse_key(key)?;
        info!("[dry-run] would press {}", key);
        Ok(())
    }
}

/// Map a configured key name to an rdev key
pub fn parse_key(name: &str) -> Result<Key, DispatchError> {
    let lower = name.trim().to_lowercase();

    let key = match lower.as_str() {
        "0" => Key::Num0,
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,
        "a" => Key::KeyA,
        "b" => Key::KeyB,
        "c" => Key::KeyC,
        "d" => Key::KeyD,
        "e" => Key::KeyE,
        "f" => Key::KeyF,
        "g" => Key::KeyG,
        "h" => Key::KeyH,
        "i" => Key::KeyI,
        "j" => Key::KeyJ,
        "k" => Key::KeyK,
        "l" => Key::KeyL,
        "m" => Key::KeyM,
        "n" => Key::KeyN,
        "o" => Key::KeyO,
        "p" => Key::KeyP,
        "q" => Key::KeyQ,
        "r" => Key::KeyR,
        "s" => Key::KeyS,
        "t" => Key::KeyT,
        "u" => Key::KeyU,
        "v" => Key::KeyV,
        "w" => Key::KeyW,
        "x" => Key::KeyX,
        "y" => Key::KeyY,
        "z" => Key::KeyZ,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "space" => Key::Space,
        "tab" => Key::Tab,
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "shift" => Key::ShiftLeft,
        "ctrl" | "control" => Key::ControlLeft,
        "alt" => Key::Alt,
        "backspace" => Key::Backspace,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        _ => return Err(DispatchError::UnknownKey(name.to_string())),
    };

    Ok(key)
}
