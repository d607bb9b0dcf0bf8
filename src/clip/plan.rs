use tracing::debug;

use super::{ClipPlan, TimeInterval};

/// Compute the keep-intervals as the complement of a drop list.
///
/// `drops` must be disjoint and sorted ascending by start (the selector
/// produces them that way). One walk tracks `last_end`: a gap before the
/// next drop becomes a keep-interval, and whatever remains after the final
/// drop becomes the last one. Drop intervals reaching past `duration` are
/// clamped, so the plan never extends beyond the original timeline.
///
/// An empty drop list keeps `[0, duration)` whole; a drop list covering the
/// entire timeline produces an empty plan.
pub fn plan_keep_intervals(drops: &[TimeInterval], duration: f64) -> ClipPlan {
    let mut keep = Vec::new();
    let mut last_end: f64 = 0.0;

    for drop in drops {
        let start = drop.start.min(duration);
        if start > last_end {
            keep.push(TimeInterval::new(last_end, start));
        }
        last_end = last_end.max(drop.end);
    }

    if last_end < duration {
        keep.push(TimeInterval::new(last_end, duration));
    }

    debug!(
        drops = drops.len(),
        kept = keep.len(),
        duration,
        "Planned keep intervals"
    );

    ClipPlan { keep }
}
