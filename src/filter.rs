//
// filter.rs
//

use crate::BusOptions;

use embedded_can::{ExtendedId, StandardId};
use thiserror::Error;

/// Acceptance filter ID width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterWidth {
    Standard,
    Extended,
}

impl FilterWidth {
    /// Number of ID bits covered by a filter of this width.
    pub fn bits(self) -> u32 {
        match self {
            FilterWidth::Standard => 11,
            FilterWidth::Extended => 29,
        }
    }

    fn id_mask(self) -> u32 {
        match self {
            FilterWidth::Standard => u32::from(StandardId::MAX.as_raw()),
            FilterWidth::Extended => ExtendedId::MAX.as_raw(),
        }
    }
}

/// Filter text rejected by [`compile`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("no filter given")]
    Empty,
    #[error("unexpected extra characters at end of filter")]
    TooLong,
    #[error("unexpected character in filter: {0}")]
    UnexpectedChar(char),
    #[error("extended ID support is disabled")]
    ExtendedUnsupported,
}

/// A compiled mask filter, ready for an add-filter request.
///
/// An incoming ID passes when it matches `id_bits` at every position set
/// in `mask_bits`; clear mask positions are don't-cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskFilter {
    pub width: FilterWidth,
    pub id_bits: u32,
    pub mask_bits: u32,
}

impl MaskFilter {
    /// Whether a received raw ID passes this filter.
    pub fn matches(&self, raw_id: u32) -> bool {
        raw_id & self.mask_bits == self.id_bits
    }
}

/// Compiles a textual mask filter into register form.
///
/// The text is a binary ID given MSB first, with `X` (either case) for
/// don't-care positions. It may be shorter than the full width; bits the
/// user never typed are treated as must-match leading zeros. Everything
/// at and after the first CR or LF is ignored, so raw line input can be
/// passed straight in.
pub fn compile(input: &str, width: FilterWidth, opts: BusOptions) -> Result<MaskFilter, FilterError> {
    let line = match input.find(['\r', '\n']) {
        Some(end) => &input[..end],
        None => input,
    };

    if line.is_empty() {
        return Err(FilterError::Empty);
    }

    let bits = width.bits();
    let typed = line.chars().count() as u32;
    if typed > bits {
        return Err(FilterError::TooLong);
    }

    if width == FilterWidth::Extended && !opts.extended_ids {
        return Err(FilterError::ExtendedUnsupported);
    }

    // Scan as if the string filled the whole width, first character at
    // the most significant position.
    let mut id_bits = 0u32;
    let mut mask_bits = 0u32;

    for (i, c) in line.chars().enumerate() {
        let position = bits - 1 - i as u32;
        match c {
            '1' => {
                id_bits |= 1 << position;
                mask_bits = mark_must_match(mask_bits, position);
            }
            '0' => mask_bits = mark_must_match(mask_bits, position),
            'X' | 'x' => {}
            other => return Err(FilterError::UnexpectedChar(other)),
        }
    }

    // Shorter strings were scanned too high; align them to the low end
    // and force every untyped high-order position to must-match-zero.
    id_bits >>= bits - typed;
    mask_bits >>= bits - typed;
    mask_bits |= (u32::MAX << typed) & width.id_mask();

    Ok(MaskFilter { width, id_bits, mask_bits })
}

/// A typed 0 or 1 makes its position must-match; don't-cares leave the
/// mask bit clear.
fn mark_must_match(mask_bits: u32, position: u32) -> u32 {
    mask_bits | (1 << position)
}
