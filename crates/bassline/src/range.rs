/// Reference pitch when nothing has been emitted yet: C2.
pub const DEFAULT_REFERENCE: u8 = 36;

/// Place a pitch class at a concrete octave inside `[low, high]`,
/// nearest the reference pitch.
///
/// Two phases: pick the octave transposition closest to the reference
/// across the full chromatic range, then clamp into the register by
/// octave shifts. When the closest candidate sits outside the range,
/// the clamp wins and the result is not the nearest in-range octave.
///
/// Requires `low + 12 <= high` so a full octave fits; the result's
/// pitch class always equals `pc % 12` and lies in `[low, high]`.
pub fn project_into_range(pc: u8, reference: Option<u8>, low: u8, high: u8) -> u8 {
    debug_assert!(low as u16 + 12 <= high as u16);

    let base = reference.unwrap_or(DEFAULT_REFERENCE) as i32;
    let pc = (pc % 12) as i32;

    let mut chosen = (0..10)
        .map(|octave| pc + 12 * octave)
        .min_by_key(|candidate| (candidate - base).abs())
        .unwrap_or(pc);

    while chosen < low as i32 {
        chosen += 12;
    }
    while chosen > high as i32 {
        chosen -= 12;
    }

    chosen as u8
}
