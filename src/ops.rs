//! Bit-field packing for the short chunk kinds.
//!
//! Each helper works on plain integers so the tag/payload arithmetic can be
//! checked without any stream around it.

use crate::consts::{
    QOI_DIFF_BIAS, QOI_LUMA_G_BIAS, QOI_LUMA_RB_BIAS, QOI_MASK_2, QOI_MASK_6, QOI_OP_DIFF,
    QOI_OP_INDEX, QOI_OP_LUMA, QOI_OP_RUN, QOI_RUN_MAX,
};

#[inline]
const fn fits(v: i16, bias: u8) -> bool {
    // v + bias in 0..2*bias
    (v.wrapping_add(bias as i16) as u16) < 2 * bias as u16
}

#[inline]
const fn biased(v: i16, bias: u8) -> u8 {
    (v as u8).wrapping_add(bias)
}

#[inline]
const fn unbiased(v: u8, bias: u8) -> i8 {
    v.wrapping_sub(bias) as i8
}

/// Top two bits of a chunk's first byte.
#[inline]
pub const fn tag(b1: u8) -> u8 {
    b1 & QOI_MASK_2
}

/// Low six bits of a chunk's first byte.
#[inline]
pub const fn payload(b1: u8) -> u8 {
    b1 & QOI_MASK_6
}

#[inline]
pub const fn op_index(slot: u8) -> u8 {
    QOI_OP_INDEX | payload(slot)
}

/// Run chunk for `len` repeats, `len` in `1..=62`.
#[inline]
pub const fn op_run(len: u8) -> u8 {
    debug_assert!(len >= 1 && len <= QOI_RUN_MAX);
    QOI_OP_RUN | payload(len - 1)
}

#[inline]
pub const fn run_len(b1: u8) -> usize {
    payload(b1) as usize + 1
}

/// Packs `dr`, `dg`, `db` in `-2..=1` into a diff chunk.
///
/// Deltas are plain (non-wrapping) differences of the channel values.
#[inline]
pub const fn pack_diff(dr: i16, dg: i16, db: i16) -> Option<u8> {
    if fits(dr, QOI_DIFF_BIAS) && fits(dg, QOI_DIFF_BIAS) && fits(db, QOI_DIFF_BIAS) {
        let r = biased(dr, QOI_DIFF_BIAS);
        let g = biased(dg, QOI_DIFF_BIAS);
        let b = biased(db, QOI_DIFF_BIAS);
        Some(QOI_OP_DIFF | r << 4 | g << 2 | b)
    } else {
        None
    }
}

#[inline]
pub const fn unpack_diff(b1: u8) -> (i8, i8, i8) {
    (
        unbiased((b1 >> 4) & 0x03, QOI_DIFF_BIAS),
        unbiased((b1 >> 2) & 0x03, QOI_DIFF_BIAS),
        unbiased(b1 & 0x03, QOI_DIFF_BIAS),
    )
}

/// Packs a luma chunk: `dg` in `-32..=31`, `dr - dg` and `db - dg` in `-8..=7`.
#[inline]
pub const fn pack_luma(dr: i16, dg: i16, db: i16) -> Option<[u8; 2]> {
    let dr_dg = dr - dg;
    let db_dg = db - dg;
    if fits(dg, QOI_LUMA_G_BIAS) && fits(dr_dg, QOI_LUMA_RB_BIAS) && fits(db_dg, QOI_LUMA_RB_BIAS)
    {
        let g = biased(dg, QOI_LUMA_G_BIAS);
        let rg = biased(dr_dg, QOI_LUMA_RB_BIAS);
        let bg = biased(db_dg, QOI_LUMA_RB_BIAS);
        Some([QOI_OP_LUMA | g, rg << 4 | bg])
    } else {
        None
    }
}

/// Returns `(dr, dg, db)` from the two bytes of a luma chunk.
#[inline]
pub const fn unpack_luma(b1: u8, b2: u8) -> (i8, i8, i8) {
    let dg = unbiased(payload(b1), QOI_LUMA_G_BIAS);
    let dr_dg = unbiased(b2 >> 4, QOI_LUMA_RB_BIAS);
    let db_dg = unbiased(b2 & 0x0f, QOI_LUMA_RB_BIAS);
    (dr_dg.wrapping_add(dg), dg, db_dg.wrapping_add(dg))
}
