//! Pagination offset computation for listing queries.
//!
//! All listings page in fixed-size chunks. A page index past the end
//! clamps to the start of the last page rather than returning an empty
//! page; callers rely on this for "next past the end wraps to last" UX.

/// Fixed number of entries per listing page.
pub const PAGE_SIZE: i64 = 5;

/// Compute the skip offset for a page index over `total` entries.
///
/// Callers must not invoke this with `total == 0`; a listing with no
/// entries reports "no results" instead of paginating.
pub fn clamp_skip(page: i64, total: i64) -> i64 {
    debug_assert!(total > 0);
    let skip = page.max(0) * PAGE_SIZE;
    if skip >= total {
        PAGE_SIZE * ((total - 1) / PAGE_SIZE)
    } else {
        skip
    }
}
