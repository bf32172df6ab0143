//! Maze graph extraction.
//!
//! The wall layer is scanned once. Empty cells where an entity may change
//! heading (intersections, corners and dead ends) become nodes; straight
//! corridor interiors do not. Door tiles and the secret-wall overlay are kept
//! in their own sets so movement can decide per entity whether they block.

use std::collections::HashSet;

use glam::IVec2;
use log::info;

use crate::direction::Dir;
use crate::tiles::{Bounds, TileSource};

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildOptions<'a> {
    /// Tile name whose walls only block entities counting ignorable walls.
    pub ignorable_tile: Option<&'a str>,
    /// Cells that are open unless an entity counts secret walls.
    pub secret_overlay: Option<&'a HashSet<IVec2>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeGraph {
    bounds: Bounds,
    walls: HashSet<IVec2>,
    ignorable_walls: HashSet<IVec2>,
    secret_walls: HashSet<IVec2>,
    nodes: HashSet<IVec2>,
}

impl MazeGraph {
    pub fn build(tiles: &impl TileSource, options: &BuildOptions<'_>) -> Self {
        let bounds = tiles.bounds();
        let empty = HashSet::new();
        let overlay = options.secret_overlay.unwrap_or(&empty);

        let is_ignorable = |cell: IVec2| {
            tiles.has_tile(cell)
                && options
                    .ignorable_tile
                    .is_some_and(|name| tiles.tile_name(cell) == Some(name))
        };
        let is_open = |cell: IVec2| !tiles.has_tile(cell) || is_ignorable(cell) || overlay.contains(&cell);

        let mut walls = HashSet::new();
        let mut ignorable_walls = HashSet::new();
        let mut nodes = HashSet::new();

        for cell in bounds.cells() {
            let secret = overlay.contains(&cell);
            if tiles.has_tile(cell) && !secret {
                if is_ignorable(cell) {
                    ignorable_walls.insert(cell);
                } else {
                    walls.insert(cell);
                }
                continue;
            }

            let [up, right, down, left] = Dir::ALL.map(|dir| is_open(cell + dir.delta()));
            if qualifies_as_node(up, right, down, left) {
                nodes.insert(cell);
            }
        }

        let secret_walls: HashSet<IVec2> = overlay.iter().copied().collect();
        info!(
            "maze graph built: {}x{} cells, {} nodes, {} walls, {} doors, {} secret walls",
            bounds.width(),
            bounds.height(),
            nodes.len(),
            walls.len(),
            ignorable_walls.len(),
            secret_walls.len()
        );

        Self {
            bounds,
            walls,
            ignorable_walls,
            secret_walls,
            nodes,
        }
    }

    /// Whether `cell` blocks an entity. Door tiles block only when
    /// `count_ignorable` is set, secret walls only when `count_secret` is.
    pub fn has_wall(&self, cell: IVec2, count_ignorable: bool, count_secret: bool) -> bool {
        self.walls.contains(&cell)
            || (count_ignorable && self.ignorable_walls.contains(&cell))
            || (count_secret && self.secret_walls.contains(&cell))
    }

    pub fn is_node(&self, cell: IVec2) -> bool {
        self.nodes.contains(&cell)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn nodes(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.nodes.iter().copied()
    }

    pub fn walls(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.walls.iter().copied()
    }

    pub fn ignorable_walls(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.ignorable_walls.iter().copied()
    }

    pub fn secret_walls(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.secret_walls.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Intersections and corners need openness on both axes; a dead end has
/// exactly one opening.
pub fn qualifies_as_node(up: bool, right: bool, down: bool, left: bool) -> bool {
    let open = [up, right, down, left].into_iter().filter(|o| *o).count();
    ((up || down) && (left || right)) || open == 1
}
