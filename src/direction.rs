use glam::{IVec2, Vec2};

/// Cardinal headings in a y-up grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    /// Enumeration order used whenever candidate directions are ranked.
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    pub fn delta(self) -> IVec2 {
        match self {
            Dir::Up => IVec2::new(0, 1),
            Dir::Right => IVec2::new(1, 0),
            Dir::Down => IVec2::new(0, -1),
            Dir::Left => IVec2::new(-1, 0),
        }
    }

    pub fn from_delta(delta: IVec2) -> Option<Dir> {
        Dir::ALL.into_iter().find(|dir| dir.delta() == delta)
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
        }
    }
}

/// Quarter turn to the left.
pub fn rotate_ccw(v: IVec2) -> IVec2 {
    IVec2::new(-v.y, v.x)
}

/// Quarter turn to the right.
pub fn rotate_cw(v: IVec2) -> IVec2 {
    IVec2::new(v.y, -v.x)
}

/// Grid cell nearest to a continuous position.
pub fn cell_of(position: Vec2) -> IVec2 {
    position.round().as_ivec2()
}

/// Collapses an analogue direction to one axis. Diagonals keep the vertical
/// component.
pub fn four_way(raw: Vec2) -> IVec2 {
    let x = if raw.y != 0.0 { 0.0 } else { raw.x };
    IVec2::new(sign(x), sign(raw.y))
}

fn sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Steps `current` toward `target` by at most `max_delta`, landing exactly on
/// `target` once it is within reach.
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_delta || distance == 0.0 {
        return target;
    }
    current + offset / distance * max_delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_turn_of_right_is_up() {
        assert_eq!(rotate_ccw(Dir::Right.delta()), Dir::Up.delta());
        assert_eq!(rotate_cw(Dir::Right.delta()), Dir::Down.delta());
    }

    #[test]
    fn diagonal_input_keeps_vertical() {
        assert_eq!(four_way(Vec2::new(0.7, -0.7)), IVec2::new(0, -1));
        assert_eq!(four_way(Vec2::new(-1.0, 0.0)), IVec2::new(-1, 0));
        assert_eq!(four_way(Vec2::ZERO), IVec2::ZERO);
    }

    #[test]
    fn move_towards_snaps_when_in_reach() {
        let target = Vec2::new(1.0, 0.0);
        assert_eq!(move_towards(Vec2::new(0.95, 0.0), target, 0.1), target);
        let partial = move_towards(Vec2::ZERO, target, 0.25);
        assert!((partial.x - 0.25).abs() < 1e-6);
    }
}
