//! Quad-tree backed spatial indices.
//!
//! - `RegionIndex`: rectangle-valued overlay (terrain, elevation)
//! - `PointIndex`: discrete id positions (entity placement)

pub mod point;
pub mod rect;
pub mod region;

pub use point::PointIndex;
pub use rect::Rect;
pub use region::RegionIndex;

use thiserror::Error;

/// Misuse of a spatial index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpatialError {
    #[error("({x}, {y}) lies outside the {width}x{height} index")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("rectangle {0:?} does not overlap the index bounds")]
    EmptyRegion(Rect),

    #[error("id {0} is already indexed")]
    AlreadyIndexed(String),

    #[error("id {0} is not indexed")]
    NotIndexed(String),
}
