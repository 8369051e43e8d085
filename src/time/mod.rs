//! Time axis shared by velocity fields and transport grids.

mod axis;

pub use axis::{FractionalIndex, MILLIS_PER_SECOND, TimeAxis};
