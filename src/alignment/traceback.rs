//! Edit-script reconstruction from the dense score matrix.

use super::{Alignment, HMatrix};
use crate::data::cigar::{Cigar, CigarOp};

impl Alignment {
    /// Walks the saved score matrix backward from `(ref_end, read_end)` and
    /// returns the run-length encoded edit script of the local alignment
    /// ending there.
    ///
    /// `ref_text` and `read_text` are the original (unencoded) sequences the
    /// matrix was computed over, and the scoring parameters must match the
    /// ones the kernel ran with. An inconsistent cell is reported to stderr
    /// and the walk continues on the diagonal.
    ///
    /// Panics if no kernel has populated the record.
    pub fn traceback(
        &self, ref_end: usize, read_end: usize, ref_text: &[u8], read_text: &[u8], match_score: i32, mismatch: i32,
        gap_open: i32, gap_extend: i32,
    ) -> Cigar {
        let matrix = self.h_matrix().expect("traceback requires a populated score matrix");
        match matrix {
            HMatrix::Byte(m) => walk(m, ref_end, read_end, ref_text, read_text, match_score, mismatch, gap_open, gap_extend),
            HMatrix::Word(m) => walk(m, ref_end, read_end, ref_text, read_text, match_score, mismatch, gap_open, gap_extend),
        }
    }
}

fn walk<T: Copy + Into<i32>>(
    m_h: &[T], ref_end: usize, read_end: usize, ref_text: &[u8], read_text: &[u8], match_score: i32, mismatch: i32,
    gap_open: i32, gap_extend: i32,
) -> Cigar {
    let read_len = read_text.len();
    let mut i = ref_end;
    let mut j = read_end;
    let mut h: i32 = m_h[read_len * i + j].into();
    let mut cigar = Cigar::new();

    while h != 0 && i > 0 && j > 0 {
        let d: i32 = m_h[read_len * (i - 1) + (j - 1)].into();
        let l: i32 = m_h[read_len * (i - 1) + j].into();
        let u: i32 = m_h[read_len * i + (j - 1)].into();
        let n = h.max(l).max(u);

        if h == n
            && ((d + match_score == h && ref_text[i] == read_text[j])
                || (d - mismatch == h && ref_text[i] != read_text[j]))
        {
            cigar.push(CigarOp::Match, 1);
            h = d;
            i -= 1;
            j -= 1;
        } else if l == n && (l - gap_open == h || l - gap_extend == h) {
            cigar.push(CigarOp::Del, 1);
            h = l;
            i -= 1;
        } else if u == n && (u - gap_open == h || u - gap_extend == h) {
            cigar.push(CigarOp::Ins, 1);
            h = u;
            j -= 1;
        } else {
            eprintln!("graphsw: traceback mismatch at h={h} i={i} j={j} (d={d}, u={u}, l={l}); taking the diagonal");
            h = d;
            i -= 1;
            j -= 1;
        }
    }

    // The walk hit the matrix edge mid-alignment.
    if h == match_score {
        cigar.push(CigarOp::Match, 1);
    }

    cigar.reverse();
    cigar
}
