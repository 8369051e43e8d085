//! Spatial discretizations.
//!
//! - [`ChannelMesh`]: equal segments along a 1D channel
//! - [`Raster2D`]: regular cells on a planar surface

mod channel;
mod raster;

pub use channel::ChannelMesh;
pub use raster::Raster2D;
