/// Keyboard state tracker.
///
/// Tracks which keys are currently held so that walking continues while a
/// key is down, and reports fresh presses for edge-triggered actions (jump,
/// fire, color switch). One `FrameInput` is produced per simulated frame.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals without it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::object::FrameInput;

/// After this long without a Press/Repeat event a key counts as released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const UP_KEYS: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN_KEYS: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const JUMP_KEYS: [KeyCode; 3] = [KeyCode::Char('z'), KeyCode::Char('Z'), KeyCode::Char(' ')];
const FIRE_KEYS: [KeyCode; 2] = [KeyCode::Char('x'), KeyCode::Char('X')];
const SWITCH_KEYS: [KeyCode; 2] = [KeyCode::Char('c'), KeyCode::Char('C')];

pub struct InputState {
    /// Last Press/Repeat time per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    /// Raw key events of the last drain, for meta keys.
    raw_events: Vec<KeyEvent>,
    /// Honor Release events. Only set when keyboard enhancement is on.
    pub honor_release: bool,
}

impl Default for InputState {
    fn default() -> Self {
        InputState::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain pending terminal events without blocking. Call once per frame
    /// before the stage step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                self.apply(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Snapshot for the next stage step.
    pub fn frame_input(&self) -> FrameInput {
        let now = Instant::now();
        let held = |codes: &[KeyCode]| codes.iter().any(|c| self.is_held_at(*c, now));
        let pressed = |codes: &[KeyCode]| codes.iter().any(|c| self.fresh_presses.contains(c));
        FrameInput {
            left: held(&LEFT_KEYS),
            right: held(&RIGHT_KEYS),
            up: held(&UP_KEYS),
            down: held(&DOWN_KEYS),
            jump_held: held(&JUMP_KEYS),
            jump_pressed: pressed(&JUMP_KEYS),
            fire_pressed: pressed(&FIRE_KEYS),
            switch_pressed: pressed(&SWITCH_KEYS),
        }
    }

    /// Esc or Ctrl+C this frame.
    pub fn quit_requested(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.code == KeyCode::Esc
                || (k.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C')))
        })
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT)
    }
}
