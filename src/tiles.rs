use std::collections::HashMap;

use glam::IVec2;

/// Half-open rectangle of grid cells, `min` inclusive and `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    pub fn from_size(width: i32, height: i32) -> Self {
        Self::new(IVec2::ZERO, IVec2::new(width, height))
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= self.min.x && cell.x < self.max.x && cell.y >= self.min.y && cell.y < self.max.y
    }

    pub fn expand(&self, margin: i32) -> Self {
        Self::new(self.min - IVec2::splat(margin), self.max + IVec2::splat(margin))
    }

    /// Every cell, column by column.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> {
        let Bounds { min, max } = *self;
        (min.x..max.x).flat_map(move |x| (min.y..max.y).map(move |y| IVec2::new(x, y)))
    }
}

/// Read access to a wall tile layer, consumed once when a maze graph is built.
pub trait TileSource {
    fn bounds(&self) -> Bounds;
    fn has_tile(&self, cell: IVec2) -> bool;
    fn tile_name(&self, cell: IVec2) -> Option<&str>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Wall,
    Door,
}

impl TileKind {
    pub fn name(self) -> &'static str {
        match self {
            TileKind::Wall => "wall",
            TileKind::Door => "door",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileMap {
    tiles: HashMap<IVec2, TileKind>,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, cell: IVec2, kind: TileKind) {
        self.tiles.insert(cell, kind);
    }

    pub fn clear(&mut self, cell: IVec2) {
        self.tiles.remove(&cell);
    }

    pub fn get(&self, cell: IVec2) -> Option<TileKind> {
        self.tiles.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl TileSource for TileMap {
    /// Tight rectangle around the placed tiles.
    fn bounds(&self) -> Bounds {
        let mut cells = self.tiles.keys();
        let Some(first) = cells.next() else {
            return Bounds::new(IVec2::ZERO, IVec2::ZERO);
        };
        let (min, max) = cells.fold((*first, *first), |(lo, hi), c| (lo.min(*c), hi.max(*c)));
        Bounds::new(min, max + IVec2::ONE)
    }

    fn has_tile(&self, cell: IVec2) -> bool {
        self.tiles.contains_key(&cell)
    }

    fn tile_name(&self, cell: IVec2) -> Option<&str> {
        self.get(cell).map(TileKind::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_compress_to_placed_tiles() {
        let mut map = TileMap::new();
        map.set(IVec2::new(-1, 2), TileKind::Wall);
        map.set(IVec2::new(3, 5), TileKind::Door);
        let bounds = map.bounds();
        assert_eq!(bounds.min, IVec2::new(-1, 2));
        assert_eq!(bounds.max, IVec2::new(4, 6));
        assert_eq!(bounds.cells().count(), 20);
        assert_eq!(map.tile_name(IVec2::new(3, 5)), Some("door"));
    }

    #[test]
    fn expanded_bounds_accept_margin_cells() {
        let bounds = Bounds::from_size(4, 4);
        assert!(!bounds.contains(IVec2::new(-2, 0)));
        assert!(bounds.expand(2).contains(IVec2::new(-2, 5)));
        assert!(!bounds.expand(2).contains(IVec2::new(-3, 0)));
    }
}
