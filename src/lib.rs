//! Loads a recorded GPS track, answers the queries a map view needs, and replays it.
//!
//! [`loader::parse`] turns exported text into samples, [`store::Trajectory`] holds them and
//! [`player::Player`] replays them on a timer. Rendering is left to whoever consumes the data.

pub mod bounds;
pub mod config;
pub mod export;
pub mod filter;
pub mod loader;
pub mod playback;
pub mod player;
pub mod sample;
pub mod serve;
pub mod source;
pub mod store;
