//! Alignment records, seeds, and the linear alignment driver.

use thiserror::Error;

mod kernel;
pub(crate) mod profile;
mod seed;
mod traceback;

pub use kernel::Direction;
pub use profile::{Profile, ScoreSize};
pub use seed::Seed;

pub(crate) use kernel::SATURATED;

use kernel::KernelBest;
use profile::{BYTE_LANES, WORD_LANES};

/// Below this mask length the second-best alignment output is suppressed.
pub(crate) const MASK_LEN_MIN: usize = 15;

/// Errors surfaced by the alignment engine.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum AlignError {
    /// The 8-bit kernel saturated and no 16-bit profile exists to escalate
    /// to.
    #[error("alignment score saturated the 8-bit range; build the profile with ScoreSize::Word or ScoreSize::Both")]
    ByteOverflow,
    /// The profile was not built for the requested lane width.
    #[error("no query profile was built for the requested lane width")]
    MissingProfile,
    /// The graph's edges cannot be scheduled in topological order.
    #[error("graph edges cannot be scheduled in topological order")]
    CyclicGraph,
    /// A seed's lane width or stripe count does not match the active kernel.
    #[error("seed lane width or stripe count does not match the active kernel")]
    WidthMismatch,
}

/// Lane width of a kernel run: 16 unsigned byte lanes or 8 signed word
/// lanes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LaneWidth {
    Byte,
    Word,
}

/// The dense score matrix dumped by a kernel run, row stride equal to the
/// read length. `mH[i * read_len + j]` holds the DP value for reference
/// position `i` and read position `j`.
#[derive(Clone, Debug)]
pub enum HMatrix {
    Byte(Vec<u8>),
    Word(Vec<u16>),
}

impl HMatrix {
    #[inline]
    pub fn width(&self) -> LaneWidth {
        match self {
            HMatrix::Byte(_) => LaneWidth::Byte,
            HMatrix::Word(_) => LaneWidth::Word,
        }
    }
}

/// The outcome of one kernel run: the best-score report plus the state
/// needed to seed successor runs and to trace the edit script.
///
/// A fresh record has `-1` positions and no owned buffers; a kernel run
/// installs the dense matrix and the saved last column. Scores of a node
/// that maps nowhere stay 0 with `-1` ends.
#[derive(Clone, Debug)]
pub struct Alignment {
    /// Best local score; 255 is the 8-bit kernel's saturation sentinel.
    pub score:      u16,
    /// Reference index of the first column attaining `score`, or -1.
    pub ref_end:    i32,
    /// Smallest read index attaining `score` in that column, or -1.
    pub read_end:   i32,
    /// Second-best score (never recovered by these kernels; kept for the
    /// record layout).
    pub score2:     u16,
    /// Reference end of the second-best alignment, or -1 when suppressed.
    pub ref_end2:   i32,
    /// Begin positions are not recovered by the kernels; they stay -1.
    pub ref_begin:  i32,
    pub read_begin: i32,
    matrix: Option<HMatrix>,
    seed:   Option<Seed>,
}

impl Alignment {
    /// A zeroed record with `-1` positions and no owned buffers.
    pub fn new() -> Alignment {
        Alignment {
            score:      0,
            ref_end:    -1,
            read_end:   -1,
            score2:     0,
            ref_end2:   -1,
            ref_begin:  -1,
            read_begin: -1,
            matrix:     None,
            seed:       None,
        }
    }

    /// The dense score matrix, if a kernel has run.
    #[inline]
    pub fn h_matrix(&self) -> Option<&HMatrix> {
        self.matrix.as_ref()
    }

    /// The saved last-column state, if a kernel has run.
    #[inline]
    pub fn seed(&self) -> Option<&Seed> {
        self.seed.as_ref()
    }

    /// The lane width of the kernel that produced this record.
    #[inline]
    pub fn width(&self) -> Option<LaneWidth> {
        self.matrix.as_ref().map(HMatrix::width)
    }

    /// Releases the score matrix and the saved seed. Idempotent; the score
    /// report is left in place.
    pub fn clear(&mut self) {
        self.matrix = None;
        self.seed = None;
    }

    #[inline]
    pub(crate) fn set_state(&mut self, matrix: HMatrix, seed: Seed) {
        self.matrix = Some(matrix);
        self.seed = Some(seed);
    }

    fn apply(&mut self, best: KernelBest, mask_len: usize) {
        self.score = best.score;
        self.ref_end = best.ref_end;
        self.read_end = best.read_end;
        self.score2 = 0;
        self.ref_end2 = if mask_len >= MASK_LEN_MIN { 0 } else { -1 };
    }
}

impl Default for Alignment {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Profile {
    /// Aligns the profiled query against a linear reference, preferring the
    /// 8-bit kernel and escalating to 16-bit lanes on saturation.
    ///
    /// When a seed is given, the kernel of the seed's width runs instead; a
    /// saturated seeded run cannot escalate (the seed itself is 8-bit state)
    /// and reports [`AlignError::ByteOverflow`] so the caller can redo the
    /// whole traversal at word width.
    pub fn align(
        &self, ref_codes: &[u8], gap_open: u8, gap_extend: u8, mask_len: usize, seed: Option<&Seed>,
    ) -> Result<Alignment, AlignError> {
        self.align_directed(ref_codes, Direction::Forward, gap_open, gap_extend, mask_len, seed)
    }

    /// [`Profile::align`] with an explicit reference traversal direction.
    pub fn align_directed(
        &self, ref_codes: &[u8], dir: Direction, gap_open: u8, gap_extend: u8, mask_len: usize, seed: Option<&Seed>,
    ) -> Result<Alignment, AlignError> {
        if mask_len < MASK_LEN_MIN {
            eprintln!("graphsw: mask_len < {MASK_LEN_MIN} suppresses second-best alignment reporting");
        }

        let width = match seed {
            Some(seed) => seed.width(),
            None if self.has_byte() => LaneWidth::Byte,
            None => LaneWidth::Word,
        };

        let alignment = self.fill_once(ref_codes, dir, gap_open, gap_extend, mask_len, seed, width)?;
        if width == LaneWidth::Byte && alignment.score == SATURATED {
            if !self.has_word() || seed.is_some() {
                return Err(AlignError::ByteOverflow);
            }
            return self.fill_once(ref_codes, dir, gap_open, gap_extend, mask_len, None, LaneWidth::Word);
        }
        Ok(alignment)
    }

    /// Runs exactly one kernel at the given width. Saturation of the 8-bit
    /// kernel is reported in-band through the sentinel score.
    pub(crate) fn fill_once(
        &self, ref_codes: &[u8], dir: Direction, gap_open: u8, gap_extend: u8, mask_len: usize, seed: Option<&Seed>,
        width: LaneWidth,
    ) -> Result<Alignment, AlignError> {
        let mut alignment = Alignment::new();

        let best = match width {
            LaneWidth::Byte => {
                let Some(profile) = self.byte_profile() else {
                    return Err(AlignError::MissingProfile);
                };
                if let Some(seed) = seed
                    && (seed.width() != LaneWidth::Byte || seed.seg_len() != profile.seg_len)
                {
                    return Err(AlignError::WidthMismatch);
                }
                kernel::byte::fill(ref_codes, dir, gap_open, gap_extend, profile, self.bias(), &mut alignment, seed)
            }
            LaneWidth::Word => {
                let Some(profile) = self.word_profile() else {
                    return Err(AlignError::MissingProfile);
                };
                if let Some(seed) = seed
                    && (seed.width() != LaneWidth::Word || seed.seg_len() != profile.seg_len)
                {
                    return Err(AlignError::WidthMismatch);
                }
                kernel::word::fill(ref_codes, dir, gap_open, gap_extend, profile, &mut alignment, seed)
            }
        };

        alignment.apply(best, mask_len);
        Ok(alignment)
    }

    /// Stripe count of the profile variant for `width`.
    pub(crate) fn seg_len(&self, width: LaneWidth) -> usize {
        match width {
            LaneWidth::Byte => self.read_len().div_ceil(BYTE_LANES),
            LaneWidth::Word => self.read_len().div_ceil(WORD_LANES),
        }
    }
}
