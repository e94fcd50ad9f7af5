//! Data-parallel Smith-Waterman kernels in query-striped layout.
//!
//! Both kernels walk the reference one column at a time, holding the query in
//! lane-parallel stripes so a single vector update advances sixteen (8-bit)
//! or eight (16-bit) query positions at once. Within-column insertion scores
//! cannot fully propagate across stripes in one pass, so each column finishes
//! with a Lazy-F correction sweep.

pub(crate) mod byte;
pub(crate) mod word;

/// Reference traversal order for a kernel run.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Best-cell report from one kernel run. Ending coordinates are `-1` when
/// nothing scored above zero.
#[derive(Copy, Clone, Debug)]
pub(crate) struct KernelBest {
    pub(crate) score:    u16,
    pub(crate) ref_end:  i32,
    pub(crate) read_end: i32,
}

/// The 8-bit kernel's saturation sentinel: the biased best score reached the
/// top of the unsigned byte range and the run must be redone in 16-bit lanes.
pub(crate) const SATURATED: u16 = u8::MAX as u16;
