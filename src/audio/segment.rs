//! Boundary-driven audio splitting.
//!
//! Peak positions become split boundaries; each adjacent boundary pair
//! becomes one segment. Planning is pure so re-running it over the same
//! inputs always yields identical boundaries. Callers branch on an empty
//! peak list *before* planning (both modes report "no keystrokes
//! detected" instead of emitting a degenerate split).

/// One planned output clip. `index` is the 1-based boundary-pair index;
/// offline planning can drop short pairs, so emitted indices may have
/// gaps. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Boundary list `[0, p_1 .. p_k, len]`.
pub fn split_points(peaks: &[usize], len: usize) -> Vec<usize> {
    let mut points = Vec::with_capacity(peaks.len() + 2);
    points.push(0);
    points.extend_from_slice(peaks);
    points.push(len);
    points
}

/// Streaming plan: every boundary pair verbatim, no padding. Concatenating
/// the planned segments in order reconstructs the buffer exactly.
pub fn plan_streaming(peaks: &[usize], len: usize) -> Vec<Segment> {
    split_points(peaks, len)
        .windows(2)
        .enumerate()
        .map(|(i, pair)| Segment {
            index: i + 1,
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

/// Offline plan: each boundary pair is padded outward by half the minimum
/// segment length, clamped to the buffer, and dropped (not merged into a
/// neighbor) if it still comes up short. Survivors keep their boundary-pair
/// index.
pub fn plan_offline(peaks: &[usize], len: usize, min_samples: usize) -> Vec<Segment> {
    let pad = min_samples / 2;
    split_points(peaks, len)
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let start = pair[0].saturating_sub(pad);
            let end = (pair[1] + pad).min(len);
            (end.saturating_sub(start) >= min_samples).then_some(Segment {
                index: i + 1,
                start,
                end,
            })
        })
        .collect()
}
