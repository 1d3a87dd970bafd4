//! Deterministic terrain map generation.
//!
//! Two stages share this library: the heightmap engine (job file to
//! heightmap artifact) and the tiler (heightmap artifact to tile artifact).

pub mod adjacency;
pub mod artifact;
pub mod export;
pub mod heightmap;
pub mod job;
pub mod pipeline;
pub mod terrain;
pub mod tilemap;
pub mod tiles;
