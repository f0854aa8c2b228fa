//! Weighted random selection of the variant to display.

use rand::Rng;

use crate::catalog::Variant;
use crate::error::ShelfError;

/// Pick one active variant with probability proportional to its weight.
///
/// Inactive entries are ignored. A lone active variant is returned without
/// touching `rng`. Non-positive weights count as the default weight.
pub fn select_weighted<'a, R>(variants: &'a [Variant], rng: &mut R) -> Result<&'a Variant, ShelfError>
where
    R: Rng + ?Sized,
{
    let active: Vec<&Variant> = variants.iter().filter(|v| v.active).collect();

    let last = match active.as_slice() {
        [] => {
            let slot = variants
                .first()
                .map(|v| v.slot_id.to_string())
                .unwrap_or_default();
            return Err(ShelfError::NoActiveVariants(slot));
        }
        [only] => return Ok(*only),
        [.., last] => *last,
    };

    let total: u64 = active.iter().map(|v| v.effective_weight() as u64).sum();
    let mut remaining = rng.gen_range(0.0..total as f64);

    for variant in &active {
        remaining -= variant.effective_weight() as f64;
        if remaining <= 0.0 {
            return Ok(*variant);
        }
    }

    Ok(last)
}
