//! Simulation core of a grid maze-chase game.
//!
//! A tile map is turned into a [`MazeGraph`] once per level; every tick the
//! [`Simulation`] samples input, advances each [`GridMover`], runs the ghost
//! state machines and finally resolves pickups and captures.

pub mod config;
pub mod direction;
pub mod error;
pub mod generate;
pub mod ghost;
pub mod input;
pub mod level;
pub mod logging;
pub mod maze;
pub mod movement;
pub mod teleport;
pub mod tiles;
pub mod world;

pub use config::{ModeSchedule, Settings, SimConfig};
pub use direction::Dir;
pub use error::{GameError, LevelError};
pub use generate::generate_layout;
pub use ghost::{GhostBrain, GhostState, Personality};
pub use input::{InputBuffer, InputFrame};
pub use level::Level;
pub use logging::init as init_logging;
pub use maze::{BuildOptions, MazeGraph};
pub use movement::{GridMover, HitWall, MovementParams, ReverseInput, SetDirection, TargetRef};
pub use teleport::{TeleportExit, Teleporters};
pub use tiles::{Bounds, TileKind, TileMap, TileSource};
pub use world::{EntityId, EntitySnapshot, GameEvent, Simulation};
