//! Bit tricks for the FAST segment test.
//!
//! The 16 circle pixels are packed into a `u16`, bit `i` set when circle
//! pixel `i` passes the brightness (or darkness) comparison.

/// True when `mask` holds a circular run of at least `len` set bits
#[inline]
pub fn has_arc(mask: u16, len: usize) -> bool {
    if len == 0 || len > 16 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    // AND together `len` rotations; a surviving bit marks the start of a run
    let mut run = mask;
    for i in 1..len as u32 {
        run &= mask.rotate_right(i);
        if run == 0 {
            return false;
        }
    }
    run != 0
}

/// Longest circular run of set bits, used by tests and diagnostics
pub fn longest_arc(mask: u16) -> usize {
    if mask == u16::MAX {
        return 16;
    }
    let mut best = 0;
    let mut current = 0;
    // Walk twice around the circle to see runs that wrap
    for i in 0..32 {
        if mask & (1 << (i % 16)) != 0 {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best.min(16)
}

/// Pack a flag array into a circle mask
pub fn mask_from_flags(flags: &[bool; 16]) -> u16 {
    flags
        .iter()
        .enumerate()
        .fold(0u16, |m, (i, &f)| if f { m | (1 << i) } else { m })
}
