//! Saved kernel state used to chain alignments across graph nodes.

use super::{
    AlignError, Alignment, LaneWidth,
    profile::{ByteVec, WordVec},
};
use std::simd::cmp::SimdOrd;

/// The last reference column's H and E vectors from a completed kernel run,
/// in striped order. Seeding a kernel with this state makes the new run
/// behave as if its reference were appended to the run that produced it.
///
/// The variant doubles as the width flag: a seed can only feed a kernel of
/// the same lane width and stripe count.
#[derive(Clone, Debug)]
pub enum Seed {
    Byte { h: Vec<ByteVec>, e: Vec<ByteVec> },
    Word { h: Vec<WordVec>, e: Vec<WordVec> },
}

impl Seed {
    /// An all-zero seed, equivalent to running unseeded.
    pub fn zeroed(width: LaneWidth, seg_len: usize) -> Seed {
        match width {
            LaneWidth::Byte => Seed::Byte {
                h: vec![ByteVec::splat(0); seg_len],
                e: vec![ByteVec::splat(0); seg_len],
            },
            LaneWidth::Word => Seed::Word {
                h: vec![WordVec::splat(0); seg_len],
                e: vec![WordVec::splat(0); seg_len],
            },
        }
    }

    #[inline]
    pub fn width(&self) -> LaneWidth {
        match self {
            Seed::Byte { .. } => LaneWidth::Byte,
            Seed::Word { .. } => LaneWidth::Word,
        }
    }

    #[inline]
    pub fn seg_len(&self) -> usize {
        match self {
            Seed::Byte { h, .. } => h.len(),
            Seed::Word { h, .. } => h.len(),
        }
    }

    /// Composes a seed as the element-wise lane maximum of the predecessors'
    /// saved states. An empty predecessor list yields the zero seed.
    ///
    /// Every predecessor must carry a saved seed of the requested width and
    /// stripe count.
    pub fn from_predecessors(width: LaneWidth, seg_len: usize, preds: &[&Alignment]) -> Result<Seed, AlignError> {
        let mut composed = Seed::zeroed(width, seg_len);

        for pred in preds {
            let Some(saved) = pred.seed() else {
                return Err(AlignError::WidthMismatch);
            };
            if saved.width() != width || saved.seg_len() != seg_len {
                return Err(AlignError::WidthMismatch);
            }

            match (&mut composed, saved) {
                (Seed::Byte { h, e }, Seed::Byte { h: oh, e: oe }) => {
                    for (acc, v) in h.iter_mut().zip(oh) {
                        *acc = acc.simd_max(*v);
                    }
                    for (acc, v) in e.iter_mut().zip(oe) {
                        *acc = acc.simd_max(*v);
                    }
                }
                (Seed::Word { h, e }, Seed::Word { h: oh, e: oe }) => {
                    for (acc, v) in h.iter_mut().zip(oh) {
                        *acc = acc.simd_max(*v);
                    }
                    for (acc, v) in e.iter_mut().zip(oe) {
                        *acc = acc.simd_max(*v);
                    }
                }
                _ => return Err(AlignError::WidthMismatch),
            }
        }

        Ok(composed)
    }
}
