//! Strongly-typed index newtypes.
//!
//! These types prevent mixing up different kinds of indices
//! (segment vs time step vs velocity node vs material).

use std::fmt;

/// Macro to generate index newtypes with common functionality.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Create a new index.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// First index (0).
            pub const ZERO: Self = Self(0);

            /// Increment index by one.
            #[inline]
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }

            /// Iterate over [0, n).
            pub fn iter(n: usize) -> impl Iterator<Item = $name> + ExactSizeIterator {
                (0..n).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }

        impl<T> std::ops::Index<$name> for [T] {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }

        impl<T> std::ops::Index<$name> for Vec<T> {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }
    };
}

define_index!(
    /// Segment index along a channel.
    ///
    /// # Example
    ///
    /// ```
    /// use adr_rs::types::SegmentIndex;
    ///
    /// let seg = SegmentIndex::new(500);
    /// assert_eq!(seg.get(), 500);
    /// ```
    SegmentIndex,
    "S"
);

define_index!(
    /// Index into a [`TimeAxis`](crate::time::TimeAxis).
    TimeIndex,
    "T"
);

define_index!(
    /// Index of a node in a [`VelocityField`](crate::field::VelocityField).
    ///
    /// # Example
    ///
    /// ```
    /// use adr_rs::types::NodeIndex;
    ///
    /// let node = NodeIndex::new(3);
    /// assert_eq!(node.get(), 3);
    /// ```
    NodeIndex,
    "N"
);

define_index!(
    /// Material (contaminant species) tag on the surface mass grid.
    MaterialIndex,
    "M"
);

/// Raster cell address (column, row).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellIndex {
    /// Column (x direction)
    pub ix: usize,
    /// Row (y direction)
    pub iy: usize,
}

impl CellIndex {
    /// Create a new cell address.
    #[inline]
    pub const fn new(ix: usize, iy: usize) -> Self {
        Self { ix, iy }
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C({}, {})", self.ix, self.iy)
    }
}
