use glam::{IVec2, Vec2};

use crate::direction::four_way;

/// Input as seen by every entity during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    /// 4-way direction held right now.
    pub raw: IVec2,
    /// Last held direction, kept alive for a short while after release.
    pub direction: IVec2,
    pub pressed_this_frame: bool,
}

/// Turns raw direction samples into [`InputFrame`]s. A released direction
/// keeps steering for `decay` seconds so a turn pressed slightly early still
/// lands at the next node.
#[derive(Clone, Debug)]
pub struct InputBuffer {
    decay: f32,
    last_raw: IVec2,
    buffered: IVec2,
    released_at: Option<f32>,
}

impl InputBuffer {
    pub fn new(decay: f32) -> Self {
        Self {
            decay,
            last_raw: IVec2::ZERO,
            buffered: IVec2::ZERO,
            released_at: None,
        }
    }

    pub fn sample(&mut self, raw: Vec2, now: f32) -> InputFrame {
        let held = four_way(raw);
        let pressed_this_frame = held != IVec2::ZERO && held != self.last_raw;

        if held != IVec2::ZERO {
            self.buffered = held;
            self.released_at = None;
        } else if self.last_raw != IVec2::ZERO {
            self.released_at = Some(now);
        }

        if let Some(released) = self.released_at {
            if now - released >= self.decay {
                self.buffered = IVec2::ZERO;
                self.released_at = None;
            }
        }

        self.last_raw = held;
        InputFrame {
            raw: held,
            direction: self.buffered,
            pressed_this_frame,
        }
    }

    pub fn clear(&mut self) {
        self.last_raw = IVec2::ZERO;
        self.buffered = IVec2::ZERO;
        self.released_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_reported_once() {
        let mut input = InputBuffer::new(0.1);
        let first = input.sample(Vec2::new(1.0, 0.0), 0.0);
        let second = input.sample(Vec2::new(1.0, 0.0), 0.016);
        assert!(first.pressed_this_frame);
        assert!(!second.pressed_this_frame);
        assert_eq!(second.direction, IVec2::new(1, 0));
        let turn = input.sample(Vec2::new(0.0, 1.0), 0.032);
        assert!(turn.pressed_this_frame);
    }

    #[test]
    fn released_direction_decays() {
        let mut input = InputBuffer::new(0.1);
        input.sample(Vec2::new(0.0, -1.0), 0.0);
        let released = input.sample(Vec2::ZERO, 0.05);
        assert_eq!(released.raw, IVec2::ZERO);
        assert_eq!(released.direction, IVec2::new(0, -1));
        assert_eq!(input.sample(Vec2::ZERO, 0.1).direction, IVec2::new(0, -1));
        assert_eq!(input.sample(Vec2::ZERO, 0.16).direction, IVec2::ZERO);
    }
}
