use std::collections::HashMap;

use glam::{IVec2, Vec2};

use crate::direction::Dir;
use crate::maze::MazeGraph;

/// Where an entity reappears after arriving on a teleporter cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleportExit {
    pub cell: IVec2,
    /// Heading applied on arrival; `None` keeps the current one.
    pub facing: Option<IVec2>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Teleporters {
    exits: HashMap<IVec2, TeleportExit>,
}

impl Teleporters {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-way link from `entry`.
    pub fn insert(&mut self, entry: IVec2, exit: TeleportExit) {
        self.exits.insert(entry, exit);
    }

    /// Two-way link. Each side exits facing away from the wall it is set
    /// against.
    pub fn link(&mut self, a: IVec2, b: IVec2, maze: &MazeGraph) {
        self.insert(
            a,
            TeleportExit {
                cell: b,
                facing: inward_facing(b, maze),
            },
        );
        self.insert(
            b,
            TeleportExit {
                cell: a,
                facing: inward_facing(a, maze),
            },
        );
    }

    pub fn from_pairs(pairs: &[(IVec2, IVec2)], maze: &MazeGraph) -> Self {
        let mut teleporters = Self::new();
        for (a, b) in pairs {
            teleporters.link(*a, *b, maze);
        }
        teleporters
    }

    pub fn exit_for(&self, cell: IVec2) -> Option<TeleportExit> {
        self.exits.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.exits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exits.is_empty()
    }

    /// Entry/exit positions for overlay drawing.
    pub fn endpoints(&self) -> Vec<(Vec2, Vec2)> {
        let mut entries: Vec<(IVec2, IVec2)> =
            self.exits.iter().map(|(entry, exit)| (*entry, exit.cell)).collect();
        entries.sort_by_key(|(entry, _)| (entry.x, entry.y));
        entries
            .into_iter()
            .map(|(entry, exit)| (entry.as_vec2(), exit.as_vec2()))
            .collect()
    }
}

/// The only open in-bounds neighbour of `cell`, if there is exactly one.
fn inward_facing(cell: IVec2, maze: &MazeGraph) -> Option<IVec2> {
    let bounds = maze.bounds();
    let mut open = Dir::ALL
        .into_iter()
        .map(Dir::delta)
        .filter(|d| bounds.contains(cell + *d) && !maze.has_wall(cell + *d, true, true));
    match (open.next(), open.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    #[test]
    fn tunnel_ends_face_inward() {
        let level = Level::parse(
            "\
#####
T P T
#####
",
        )
        .unwrap();
        let maze = level.build_maze();
        let teleporters = Teleporters::from_pairs(&level.teleporters, &maze);
        let left = IVec2::new(0, 1);
        let right = IVec2::new(4, 1);
        assert_eq!(
            teleporters.exit_for(right),
            Some(TeleportExit {
                cell: left,
                facing: Some(Dir::Right.delta())
            })
        );
        assert_eq!(teleporters.exit_for(left).map(|e| e.facing), Some(Some(Dir::Left.delta())));
        assert_eq!(teleporters.endpoints().len(), 2);
    }
}
