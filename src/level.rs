//! Text layouts.
//!
//! One glyph per cell, top row first:
//!
//! | glyph | meaning |
//! |---|---|
//! | `#` | wall |
//! | `=` | ghost-house door |
//! | `%` | secret wall |
//! | `.` / `o` | pellet / power pellet |
//! | `P` | player spawn |
//! | `H` / `E` | home cell / home entrance |
//! | `S` | scatter anchor |
//! | `T` | teleporter, paired in reading order |
//! | `R K C O G U Y W X` | ghost spawns (also home cells) |

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use glam::IVec2;
use log::info;

use crate::error::{GameError, LevelError};
use crate::ghost::Personality;
use crate::maze::{BuildOptions, MazeGraph};
use crate::tiles::{Bounds, TileKind, TileMap};

pub const DOOR_TILE: &str = "door";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Level {
    pub size: IVec2,
    pub tiles: TileMap,
    pub secret_walls: HashSet<IVec2>,
    pub player_spawns: Vec<IVec2>,
    pub ghost_spawns: Vec<(Personality, IVec2)>,
    pub home_cells: HashSet<IVec2>,
    pub home_entrances: Vec<IVec2>,
    pub scatter_anchors: Vec<IVec2>,
    pub teleporters: Vec<(IVec2, IVec2)>,
    pub pellets: HashSet<IVec2>,
    pub power_pellets: HashSet<IVec2>,
}

impl Level {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let text = fs::read_to_string(path.as_ref())?;
        let level = Self::parse(&text)?;
        info!("loaded level {}", path.as_ref().display());
        Ok(level)
    }

    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let rows: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        Self::from_rows(&rows)
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, LevelError> {
        let Some(first) = rows.first() else {
            return Err(LevelError::EmptyLayout);
        };
        let width = first.as_ref().chars().count();
        let height = rows.len();
        let mut level = Level {
            size: IVec2::new(width as i32, height as i32),
            ..Level::default()
        };
        let mut pending_teleporter: Option<IVec2> = None;

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                let cell = IVec2::new(column as i32, (height - 1 - row) as i32);
                match glyph {
                    ' ' => {}
                    '#' => level.tiles.set(cell, TileKind::Wall),
                    '=' => level.tiles.set(cell, TileKind::Door),
                    '%' => {
                        level.tiles.set(cell, TileKind::Wall);
                        level.secret_walls.insert(cell);
                    }
                    '.' => {
                        level.pellets.insert(cell);
                    }
                    'o' => {
                        level.power_pellets.insert(cell);
                    }
                    'P' => level.player_spawns.push(cell),
                    'H' => {
                        level.home_cells.insert(cell);
                    }
                    'E' => level.home_entrances.push(cell),
                    'S' => level.scatter_anchors.push(cell),
                    'T' => match pending_teleporter.take() {
                        Some(entry) => level.teleporters.push((entry, cell)),
                        None => pending_teleporter = Some(cell),
                    },
                    other => match Personality::from_glyph(other) {
                        Some(personality) => {
                            level.ghost_spawns.push((personality, cell));
                            level.home_cells.insert(cell);
                        }
                        None => {
                            return Err(LevelError::UnknownGlyph {
                                glyph: other,
                                row,
                                column,
                            })
                        }
                    },
                }
            }
        }

        if let Some(cell) = pending_teleporter {
            return Err(LevelError::UnpairedTeleporter { x: cell.x, y: cell.y });
        }
        if level.player_spawns.is_empty() {
            return Err(LevelError::MissingPlayer);
        }
        if !level.ghost_spawns.is_empty() && level.home_cells.is_empty() {
            return Err(LevelError::MissingHome);
        }
        Ok(level)
    }

    /// Rectangle covered by the layout, independent of where walls sit.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_size(self.size.x, self.size.y)
    }

    pub fn build_maze(&self) -> MazeGraph {
        MazeGraph::build(
            &self.tiles,
            &BuildOptions {
                ignorable_tile: Some(DOOR_TILE),
                secret_overlay: Some(&self.secret_walls),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
#########
#o..P..S#
#.##=##.#
T.#RKH#.T
#.#####.#
#...E...#
#########
";

    #[test]
    fn parses_markers_with_y_up() {
        let level = Level::parse(SMALL).unwrap();
        assert_eq!(level.size, IVec2::new(9, 7));
        assert_eq!(level.player_spawns, vec![IVec2::new(4, 5)]);
        assert_eq!(level.scatter_anchors, vec![IVec2::new(7, 5)]);
        assert_eq!(level.home_entrances, vec![IVec2::new(4, 1)]);
        assert_eq!(
            level.ghost_spawns,
            vec![
                (Personality::Red, IVec2::new(3, 3)),
                (Personality::Pink, IVec2::new(4, 3)),
            ]
        );
        assert_eq!(level.home_cells.len(), 3);
        assert_eq!(level.teleporters, vec![(IVec2::new(0, 3), IVec2::new(8, 3))]);
        assert!(level.power_pellets.contains(&IVec2::new(1, 5)));
        assert_eq!(level.tiles.get(IVec2::new(4, 4)), Some(TileKind::Door));
    }

    #[test]
    fn door_is_ignorable_in_built_maze() {
        let level = Level::parse(SMALL).unwrap();
        let maze = level.build_maze();
        let door = IVec2::new(4, 4);
        assert!(!maze.has_wall(door, false, false));
        assert!(maze.has_wall(door, true, false));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Level::parse("####\n#P#\n####").unwrap_err();
        assert_eq!(
            err,
            LevelError::RaggedRow {
                row: 1,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_unknown_glyphs_and_lonely_teleporters() {
        assert!(matches!(
            Level::parse("#P?#").unwrap_err(),
            LevelError::UnknownGlyph { glyph: '?', .. }
        ));
        assert_eq!(
            Level::parse("TP  ").unwrap_err(),
            LevelError::UnpairedTeleporter { x: 0, y: 0 }
        );
        assert_eq!(Level::parse("#  #").unwrap_err(), LevelError::MissingPlayer);
        assert_eq!(Level::parse("").unwrap_err(), LevelError::EmptyLayout);
    }
}
