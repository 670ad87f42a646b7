//! Geometric utilities built on the vertex mesh: generators for standard test sheets.

pub mod mesh_generation;

pub use mesh_generation::*;
