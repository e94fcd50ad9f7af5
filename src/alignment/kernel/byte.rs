//! The 8-bit kernel: sixteen unsigned saturating lanes per vector.
//!
//! Scores carry the profile bias so every lane stays non-negative; the bias
//! is subtracted back out after each profile add. When the biased maximum
//! reaches the top of the byte range the run aborts with the saturation
//! sentinel and must be redone in 16-bit lanes.

use super::{Direction, KernelBest, SATURATED};
use crate::alignment::{Alignment, HMatrix, Seed, profile::{ByteProfile, ByteVec}};
use multiversion::multiversion;
use std::simd::{
    cmp::{SimdOrd, SimdPartialEq, SimdPartialOrd},
    num::SimdUint,
};

#[multiversion(targets(
    // x86-64-v4 without lahfsahf
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    // x86-64-v3 without lahfsahf
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    // x86-64-v2 without lahfsahf
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
pub(crate) fn fill(
    ref_codes: &[u8], dir: Direction, gap_open: u8, gap_extend: u8, profile: &ByteProfile, bias: u8,
    alignment: &mut Alignment, seed: Option<&Seed>,
) -> KernelBest {
    let seg_len = profile.seg_len;
    let read_len = profile.read_len;
    let ref_len = ref_codes.len();

    let mut pv_h_store = vec![ByteVec::splat(0); seg_len];
    let mut pv_h_load = vec![ByteVec::splat(0); seg_len];
    let mut pv_h_max = vec![ByteVec::splat(0); seg_len];
    let mut pv_e = vec![ByteVec::splat(0); seg_len];
    let mut m_h = vec![0u8; ref_len * read_len];

    if let Some(Seed::Byte { h, e }) = seed {
        pv_h_store.copy_from_slice(h);
        pv_e.copy_from_slice(e);
    }

    let v_gap_open = ByteVec::splat(gap_open);
    let v_gap_extend = ByteVec::splat(gap_extend);
    let v_bias = ByteVec::splat(bias);

    let mut max = 0u8;
    let mut end_ref = -1i32;
    let mut end_read = read_len as i32 - 1;
    let mut v_max_score = ByteVec::splat(0);
    let mut v_max_mark = ByteVec::splat(0);
    let mut saturated = false;

    for step in 0..ref_len {
        let i = match dir {
            Direction::Forward => step,
            Direction::Reverse => ref_len - 1 - step,
        };

        let mut v_f = ByteVec::splat(0);
        let mut v_max_column = ByteVec::splat(0);

        // H(i-1, j-1) for stripe 0 comes from the last stripe of the previous
        // column, shifted one lane to introduce a zero at the query start.
        let mut v_h = pv_h_store[seg_len - 1].shift_elements_right::<1>(0);
        let v_p = &profile.stripes[ref_codes[i] as usize * seg_len..][..seg_len];

        std::mem::swap(&mut pv_h_load, &mut pv_h_store);

        for j in 0..seg_len {
            v_h = v_h.saturating_add(v_p[j]).saturating_sub(v_bias);

            let mut e = pv_e[j];
            v_h = v_h.simd_max(e).simd_max(v_f);
            v_max_column = v_max_column.simd_max(v_h);
            pv_h_store[j] = v_h;

            let open = v_h.saturating_sub(v_gap_open);
            e = e.saturating_sub(v_gap_extend).simd_max(open);
            pv_e[j] = e;
            v_f = v_f.saturating_sub(v_gap_extend).simd_max(open);

            v_h = pv_h_load[j];
        }

        // Lazy-F: wrap-around sweep until no lane can still be improved.
        // E is left untouched so an insertion cannot feed a deletion.
        let mut j = 0;
        v_f = v_f.shift_elements_right::<1>(0);
        let mut v_h = pv_h_store[0];
        while v_f.simd_gt(v_h.saturating_sub(v_gap_open)).any() {
            v_h = v_h.simd_max(v_f);
            v_max_column = v_max_column.simd_max(v_h);
            pv_h_store[j] = v_h;
            v_f = v_f.saturating_sub(v_gap_extend);

            j += 1;
            if j >= seg_len {
                j = 0;
                v_f = v_f.shift_elements_right::<1>(0);
            }
            v_h = pv_h_store[j];
        }

        v_max_score = v_max_score.simd_max(v_max_column);
        if v_max_score.simd_ne(v_max_mark).any() {
            v_max_mark = v_max_score;
            let column_best = v_max_score.reduce_max();
            if column_best > max {
                max = column_best;
                if max as u16 + bias as u16 >= SATURATED {
                    saturated = true;
                    break;
                }
                end_ref = i as i32;
                // Snapshot the winning column for read-end recovery.
                pv_h_max.copy_from_slice(&pv_h_store);
            }
        }

        destripe_column(&mut m_h[i * read_len..][..read_len], &pv_h_store, seg_len);
    }

    alignment.set_state(HMatrix::Byte(m_h), Seed::Byte { h: pv_h_store, e: pv_e });

    if saturated {
        return KernelBest {
            score:    SATURATED,
            ref_end:  -1,
            read_end: -1,
        };
    }
    if max == 0 {
        return KernelBest {
            score:    0,
            ref_end:  -1,
            read_end: -1,
        };
    }

    // Smallest destriped read index attaining the maximum in the best column.
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
fn destripe_column(row: &mut [u8], column: &[ByteVec], seg_len: usize) {
    let read_len = row.len();
    for (s, v) in column.iter().enumerate() {
        for (k, &value) in v.to_array().iter().enumerate() {
            let col = k * seg_len + s;
            if col < read_len {
                row[col] = value;
            }
        }
    }
}
