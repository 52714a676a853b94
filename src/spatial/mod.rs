//! Spatial indexing for the room

pub mod grid;

pub use grid::MultiGrid;
