//! The 16-bit kernel: eight signed lanes per vector.
//!
//! No bias is needed at this width. Gap deductions clamp at zero like the
//! original's unsigned saturating subtract, preserving the H >= 0 invariant;
//! within the representable range of any real query this kernel cannot
//! overflow.

use super::{Direction, KernelBest};
use crate::alignment::{Alignment, HMatrix, Seed, profile::{WORD_LANES, WordProfile, WordVec}};
use multiversion::multiversion;
use std::simd::{
    cmp::{SimdOrd, SimdPartialEq, SimdPartialOrd},
    num::SimdInt,
};

/// `max(v - penalty, 0)`: the unsigned saturating subtract of the original,
/// valid because lanes never go negative.
#[inline]
fn deduct(v: WordVec, penalty: WordVec) -> WordVec {
    (v - penalty).simd_max(WordVec::splat(0))
}

#[multiversion(targets(
    // x86-64-v4 without lahfsahf
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    // x86-64-v3 without lahfsahf
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    // x86-64-v2 without lahfsahf
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
pub(crate) fn fill(
    ref_codes: &[u8], dir: Direction, gap_open: u8, gap_extend: u8, profile: &WordProfile,
    alignment: &mut Alignment, seed: Option<&Seed>,
) -> KernelBest {
    let seg_len = profile.seg_len;
    let read_len = profile.read_len;
    let ref_len = ref_codes.len();

    let mut pv_h_store = vec![WordVec::splat(0); seg_len];
    let mut pv_h_load = vec![WordVec::splat(0); seg_len];
    let mut pv_h_max = vec![WordVec::splat(0); seg_len];
    let mut pv_e = vec![WordVec::splat(0); seg_len];
    let mut m_h = vec![0u16; ref_len * read_len];

    if let Some(Seed::Word { h, e }) = seed {
        pv_h_store.copy_from_slice(h);
        pv_e.copy_from_slice(e);
    }

    let v_gap_open = WordVec::splat(gap_open as i16);
    let v_gap_extend = WordVec::splat(gap_extend as i16);

    let mut max = 0i16;
    let mut end_ref = -1i32;
    let mut end_read = read_len as i32 - 1;
    let mut v_max_score = WordVec::splat(0);
    let mut v_max_mark = WordVec::splat(0);

    for step in 0..ref_len {
        let i = match dir {
            Direction::Forward => step,
            Direction::Reverse => ref_len - 1 - step,
        };

        let mut v_f = WordVec::splat(0);
        let mut v_max_column = WordVec::splat(0);

        let mut v_h = pv_h_store[seg_len - 1].shift_elements_right::<1>(0);
        let v_p = &profile.stripes[ref_codes[i] as usize * seg_len..][..seg_len];

        std::mem::swap(&mut pv_h_load, &mut pv_h_store);

        for j in 0..seg_len {
            v_h = v_h.saturating_add(v_p[j]);

            let mut e = pv_e[j];
            v_h = v_h.simd_max(e).simd_max(v_f);
            v_max_column = v_max_column.simd_max(v_h);
            pv_h_store[j] = v_h;

            let open = deduct(v_h, v_gap_open);
            e = deduct(e, v_gap_extend).simd_max(open);
            pv_e[j] = e;
            v_f = deduct(v_f, v_gap_extend).simd_max(open);

            v_h = pv_h_load[j];
        }

        // Lazy-F, bounded by the lane count. E is left untouched so an
        // insertion cannot feed a deletion.
        'correct: for _ in 0..WORD_LANES {
            v_f = v_f.shift_elements_right::<1>(0);
            for j in 0..seg_len {
                let mut v_h = pv_h_store[j];
                v_h = v_h.simd_max(v_f);
                v_max_column = v_max_column.simd_max(v_h);
                pv_h_store[j] = v_h;

                let open = deduct(v_h, v_gap_open);
                v_f = deduct(v_f, v_gap_extend);
                if !v_f.simd_gt(open).any() {
                    break 'correct;
                }
            }
        }

        v_max_score = v_max_score.simd_max(v_max_column);
        if v_max_score.simd_ne(v_max_mark).any() {
            v_max_mark = v_max_score;
            let column_best = v_max_score.reduce_max();
            if column_best > max {
                max = column_best;
                end_ref = i as i32;
                pv_h_max.copy_from_slice(&pv_h_store);
            }
        }

        destripe_column(&mut m_h[i * read_len..][..read_len], &pv_h_store, seg_len);
    }

    alignment.set_state(HMatrix::Word(m_h), Seed::Word { h: pv_h_store, e: pv_e });

    if max == 0 {
        return KernelBest {
            score:    0,
            ref_end:  -1,
            read_end: -1,
        };
    }

    for (s, v) in pv_h_max.iter().enumerate() {
        for (k, &value) in v.to_array().iter().enumerate() {
            if value == max {
                let col = (s + k * seg_len) as i32;
                if col < end_read {
                    end_read = col;
                }
            }
        }
    }

    KernelBest {
        score: max as u16,
        ref_end: end_ref,
        read_end: end_read,
    }
}

/// Writes one column of striped vectors into a dense row, dropping the
/// padding lanes that fall past the query end.
#[inline]
fn destripe_column(row: &mut [u16], column: &[WordVec], seg_len: usize) {
    let read_len = row.len();
    for (s, v) in column.iter().enumerate() {
        for (k, &value) in v.to_array().iter().enumerate() {
            let col = k * seg_len + s;
            if col < read_len {
                row[col] = value as u16;
            }
        }
    }
}
