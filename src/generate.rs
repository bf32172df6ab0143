//! Random level layouts.
//!
//! Rooms sit on odd coordinates and are joined with randomized Prim's
//! algorithm, then braided so most dead ends open into loops. A ghost house
//! is stamped into the middle with its door on the top rim. The result is
//! plain text in the format [`crate::Level::parse`] reads.

use std::collections::VecDeque;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_WIDTH: usize = 31;
pub const DEFAULT_HEIGHT: usize = 21;
const MIN_WIDTH: usize = 15;
const MIN_HEIGHT: usize = 11;

const PEN_W: usize = 9;
const PEN_H: usize = 5;
const PEN_GHOSTS: [char; 4] = ['R', 'K', 'C', 'O'];

const BRAID_CHANCE: f32 = 0.45;
const EXTRA_OPENINGS: f32 = 0.08;

// Screen order: row 0 is the top line of the layout.
const STEPS: [(isize, isize); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Wall,
    Open,
    Gate,
}

#[derive(Clone, Copy, Debug)]
struct Pen {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl Pen {
    fn centered(width: usize, height: usize) -> Self {
        let odd = |n: usize| if n % 2 == 0 { n - 1 } else { n };
        let pen_w = odd(PEN_W.min(width - 2)).max(3);
        let pen_h = odd(PEN_H.min(height - 2)).max(3);
        let x0 = (width - pen_w) / 2;
        let y0 = (height - pen_h) / 2;
        Self {
            x0,
            y0,
            x1: x0 + pen_w - 1,
            y1: y0 + pen_h - 1,
        }
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }

    fn interior(&self, x: usize, y: usize) -> bool {
        x > self.x0 && x < self.x1 && y > self.y0 && y < self.y1
    }

    fn door(&self) -> (usize, usize) {
        ((self.x0 + self.x1) / 2, self.y0)
    }
}

struct Grid {
    cells: Vec<Vec<Cell>>,
    width: usize,
    height: usize,
}

impl Grid {
    fn walled(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![Cell::Wall; width]; height],
            width,
            height,
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[y][x]
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[y][x] = cell;
    }

    fn rooms(&self) -> (usize, usize) {
        ((self.width - 1) / 2, (self.height - 1) / 2)
    }

    fn room_neighbors(&self, room: (usize, usize)) -> impl Iterator<Item = (usize, usize)> {
        let (cols, rows) = self.rooms();
        STEPS.into_iter().filter_map(move |(dx, dy)| {
            let x = room.0.checked_add_signed(dx)?;
            let y = room.1.checked_add_signed(dy)?;
            (x < cols && y < rows).then_some((x, y))
        })
    }

    fn open_room(&mut self, room: (usize, usize)) {
        self.set(room.0 * 2 + 1, room.1 * 2 + 1, Cell::Open);
    }

    // Rooms are two cells apart, so the wall between them is the midpoint.
    fn wall_between(a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
        (a.0 + b.0 + 1, a.1 + b.1 + 1)
    }

    fn join(&mut self, a: (usize, usize), b: (usize, usize)) {
        let (x, y) = Self::wall_between(a, b);
        self.set(x, y, Cell::Open);
        self.open_room(a);
        self.open_room(b);
    }

    fn joined(&self, a: (usize, usize), b: (usize, usize)) -> bool {
        let (x, y) = Self::wall_between(a, b);
        self.get(x, y) != Cell::Wall
    }

    fn carve_prim<R: Rng>(&mut self, rng: &mut R) {
        let (cols, rows) = self.rooms();
        let mut in_maze = vec![vec![false; cols]; rows];
        let start = (rng.gen_range(0..cols), rng.gen_range(0..rows));
        in_maze[start.1][start.0] = true;
        self.open_room(start);
        let mut frontier: Vec<(usize, usize)> = self.room_neighbors(start).collect();

        while !frontier.is_empty() {
            let room = frontier.swap_remove(rng.gen_range(0..frontier.len()));
            if in_maze[room.1][room.0] {
                continue;
            }
            let carved: Vec<_> = self
                .room_neighbors(room)
                .filter(|n| in_maze[n.1][n.0])
                .collect();
            let Some(&towards) = carved.choose(rng) else {
                continue;
            };
            in_maze[room.1][room.0] = true;
            self.join(room, towards);
            frontier.extend(self.room_neighbors(room).filter(|n| !in_maze[n.1][n.0]));
        }
    }

    fn braid<R: Rng>(&mut self, rng: &mut R) {
        let (cols, rows) = self.rooms();
        for cy in 0..rows {
            for cx in 0..cols {
                let room = (cx, cy);
                let (open, closed): (Vec<_>, Vec<_>) =
                    self.room_neighbors(room).partition(|n| self.joined(room, *n));
                let chance = if open.len() == 1 {
                    BRAID_CHANCE
                } else {
                    EXTRA_OPENINGS
                };
                if let Some(&other) = closed.choose(rng) {
                    if rng.gen::<f32>() < chance {
                        self.join(room, other);
                    }
                }
            }
        }
    }

    fn stamp_pen(&mut self, pen: &Pen) {
        for y in pen.y0..=pen.y1 {
            for x in pen.x0..=pen.x1 {
                let cell = if pen.interior(x, y) { Cell::Open } else { Cell::Wall };
                self.set(x, y, cell);
            }
        }
        let (door_x, door_y) = pen.door();
        self.set(door_x, door_y, Cell::Gate);

        // Tunnel up from the door until the corridor network is reached.
        let mut y = door_y - 1;
        while y > 0 && self.get(door_x, y) == Cell::Wall {
            self.set(door_x, y, Cell::Open);
            y -= 1;
        }
    }

    fn walkable(&self, pen: &Pen, x: usize, y: usize) -> bool {
        !pen.contains(x, y) && self.get(x, y) == Cell::Open
    }

    fn inner_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..self.height - 1).flat_map(move |y| (1..self.width - 1).map(move |x| (x, y)))
    }

    fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        STEPS.into_iter().filter_map(move |(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            (nx > 0 && ny > 0 && nx < self.width - 1 && ny < self.height - 1).then_some((nx, ny))
        })
    }

    fn flood(&self, pen: &Pen, start: (usize, usize)) -> Vec<Vec<bool>> {
        let mut seen = vec![vec![false; self.width]; self.height];
        let mut queue = VecDeque::from([start]);
        seen[start.1][start.0] = true;
        while let Some((x, y)) = queue.pop_front() {
            for (nx, ny) in self.neighbors(x, y) {
                if !seen[ny][nx] && self.walkable(pen, nx, ny) {
                    seen[ny][nx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }
        seen
    }

    /// Knocks out single walls until every corridor cell outside the house
    /// is reachable from every other.
    fn connect(&mut self, pen: &Pen) {
        let Some(start) = self.inner_cells().find(|&(x, y)| self.walkable(pen, x, y)) else {
            return;
        };
        for _ in 0..self.width * self.height {
            let reachable = self.flood(pen, start);
            let stranded = self
                .inner_cells()
                .any(|(x, y)| self.walkable(pen, x, y) && !reachable[y][x]);
            if !stranded {
                return;
            }
            let bridge = self.inner_cells().find(|&(x, y)| {
                if self.get(x, y) != Cell::Wall || pen.contains(x, y) {
                    return false;
                }
                let sides: Vec<bool> = self
                    .neighbors(x, y)
                    .filter(|&(nx, ny)| self.walkable(pen, nx, ny))
                    .map(|(nx, ny)| reachable[ny][nx])
                    .collect();
                sides.contains(&true) && sides.contains(&false)
            });
            match bridge {
                Some((x, y)) => self.set(x, y, Cell::Open),
                None => return,
            }
        }
    }
}

/// A fresh layout of roughly `width` x `height` cells. Sizes are bumped to
/// odd values no smaller than 15 x 11 so the house always fits.
pub fn generate_layout<R: Rng>(rng: &mut R, width: usize, height: usize) -> Vec<String> {
    let width = width.max(MIN_WIDTH) | 1;
    let height = height.max(MIN_HEIGHT) | 1;

    let mut grid = Grid::walled(width, height);
    grid.carve_prim(rng);
    grid.braid(rng);
    let pen = Pen::centered(width, height);
    grid.stamp_pen(&pen);
    grid.connect(&pen);

    let mut glyphs: Vec<Vec<char>> = grid
        .cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Wall => '#',
                    Cell::Open => '.',
                    Cell::Gate => '=',
                })
                .collect()
        })
        .collect();

    let mut ghosts = PEN_GHOSTS.iter();
    for y in pen.y0..=pen.y1 {
        for x in pen.x0..=pen.x1 {
            if pen.interior(x, y) {
                glyphs[y][x] = ghosts.next().copied().unwrap_or('H');
            }
        }
    }
    let (door_x, door_y) = pen.door();
    glyphs[door_y - 1][door_x] = 'E';

    let (right, bottom) = (width - 2, height - 2);
    for (x, y) in [(1, 1), (right, 1), (1, bottom), (right, bottom)] {
        glyphs[y][x] = 'S';
    }
    for (x, y) in [(1, 3), (right, 3), (1, bottom - 2), (right, bottom - 2)] {
        glyphs[y][x] = 'o';
    }

    let spots: Vec<(usize, usize)> = grid
        .inner_cells()
        .filter(|&(x, y)| grid.walkable(&pen, x, y) && glyphs[y][x] == '.')
        .collect();
    if let Some(&(x, y)) = spots.choose(rng) {
        glyphs[y][x] = 'P';
    }

    debug!("generated {width}x{height} layout");
    glyphs.into_iter().map(String::from_iter).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use glam::IVec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    use super::*;
    use crate::direction::Dir;
    use crate::level::Level;
    use crate::maze::qualifies_as_node;

    fn layout(seed: u64) -> Vec<String> {
        generate_layout(&mut StdRng::seed_from_u64(seed), DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    #[test]
    fn same_seed_same_layout() {
        assert_eq!(layout(7), layout(7));
    }

    #[test]
    fn small_requests_are_padded() {
        let rows = generate_layout(&mut StdRng::seed_from_u64(1), 4, 4);
        assert_eq!(rows.len(), MIN_HEIGHT);
        assert!(rows.iter().all(|row| row.chars().count() == MIN_WIDTH));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(42)]
    fn layouts_load_with_consistent_nodes(#[case] seed: u64) {
        let level = Level::from_rows(&layout(seed)).unwrap();
        assert_eq!(level.player_spawns.len(), 1);
        assert_eq!(level.ghost_spawns.len(), 4);
        assert_eq!(level.scatter_anchors.len(), 4);
        assert_eq!(level.home_entrances.len(), 1);

        let maze = level.build_maze();
        for cell in level.bounds().cells() {
            if maze.has_wall(cell, true, false) {
                continue;
            }
            // Doors count as open when classifying nodes.
            let open = |dir: Dir| !maze.has_wall(cell + dir.delta(), false, false);
            let expected = qualifies_as_node(
                open(Dir::Up),
                open(Dir::Right),
                open(Dir::Down),
                open(Dir::Left),
            );
            assert_eq!(maze.is_node(cell), expected, "cell {cell}");
        }
    }

    #[rstest]
    #[case(5)]
    #[case(11)]
    fn every_pellet_is_reachable_from_the_player(#[case] seed: u64) {
        let level = Level::from_rows(&layout(seed)).unwrap();
        let maze = level.build_maze();
        let start = level.player_spawns[0];
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(cell) = queue.pop_front() {
            for dir in Dir::ALL {
                let next: IVec2 = cell + dir.delta();
                if level.bounds().contains(next) && !maze.has_wall(next, true, true) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        for pellet in level.pellets.iter().chain(&level.power_pellets) {
            assert!(seen.contains(pellet), "pellet {pellet} unreachable");
        }
    }
}
