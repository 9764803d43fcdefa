//! Availability ordering for pharmaceutical suggestions.

/// Most to least readily available. Anything else sorts after all of these.
pub const AVAILABILITY_ORDER: &[&str] = &[
    "Very Common - Medical Store (OTC)",
    "Very Common - Medical Store",
    "Common - Medical Store",
    "Common - Medical Store (OTC)",
    "Medical Store (OTC)",
    "Medical Store",
    "Hospital/Medical Store (Prescription)",
    "Hospital Only (Prescription)",
    "Medical Store (Prescription)",
];

/// Ordinal of `availability` in `AVAILABILITY_ORDER`, compared
/// case-insensitively. Missing or unknown values rank last.
pub fn availability_rank(availability: Option<&str>) -> usize {
    availability
        .map(str::trim)
        .and_then(|a| {
            AVAILABILITY_ORDER
                .iter()
                .position(|known| known.eq_ignore_ascii_case(a))
        })
        .unwrap_or(AVAILABILITY_ORDER.len())
}

/// Availability as a score in `[0, 1]`, higher meaning easier to get.
/// The most common value scores 1.0; unknown values score 0.0.
pub fn availability_score(availability: Option<&str>) -> f64 {
    let known = AVAILABILITY_ORDER.len();
    (known - availability_rank(availability)) as f64 / known as f64
}
