//! Horizontal occlusion: the solid clip-range list and the per-column
//! ceiling/floor clip bands.

use smallvec::SmallVec;

/// Inclusive run of screen columns fully covered by solid walls.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct ClipRange {
    pub first: i32,
    pub last: i32,
}

/// Visible fragments of one seg, inclusive column pairs.
pub type Fragments = SmallVec<[(i32, i32); 8]>;

/// Sorted, non-overlapping list of covered column ranges.
///
/// Two sentinels sit just outside the screen so searches never run off
/// the ends.
#[derive(Clone, Debug, Default)]
pub struct SolidSegs {
    ranges: SmallVec<[ClipRange; 32]>,
}

impl SolidSegs {
    pub fn reset(&mut self, width: i32) {
        self.ranges.clear();
        self.ranges.push(ClipRange {
            first: -0x7fff_ffff,
            last: -1,
        });
        self.ranges.push(ClipRange {
            first: width,
            last: 0x7fff_ffff,
        });
    }

    #[inline]
    pub fn ranges(&self) -> &[ClipRange] {
        &self.ranges
    }

    /// Index of the first range whose end reaches `first - 1`.
    #[inline]
    fn start_of(&self, first: i32) -> usize {
        self.ranges
            .iter()
            .position(|r| r.last >= first - 1)
            .unwrap_or(self.ranges.len() - 1)
    }

    /// True when `first..=last` is hidden behind one existing range.
    pub fn is_covered(&self, first: i32, last: i32) -> bool {
        let Some(r) = self.ranges.iter().find(|r| r.last >= last) else {
            return false;
        };
        first >= r.first && last <= r.last
    }

    /// Visible pieces of a solid wall spanning `first..=last`; the wall is
    /// merged into the list afterwards.
    pub fn clip_solid(&mut self, first: i32, last: i32) -> Fragments {
        let frags = self.clip_pass(first, last);
        if !frags.is_empty() {
            self.insert(first, last);
        }
        frags
    }

    /// Visible pieces of a see-through wall; the list is unchanged.
    pub fn clip_pass(&self, first: i32, last: i32) -> Fragments {
        let mut frags = Fragments::new();
        let mut i = self.start_of(first);
        let mut x = first;

        while x <= last {
            let r = self.ranges[i];
            if r.first > x {
                let end = last.min(r.first - 1);
                frags.push((x, end));
            }
            if r.last >= last {
                break;
            }
            x = x.max(r.last + 1);
            i += 1;
        }
        frags
    }

    /// Merge `first..=last` in, coalescing with touching neighbours.
    pub fn insert(&mut self, first: i32, last: i32) {
        let mut i = 0;
        while i < self.ranges.len() && self.ranges[i].last < first - 1 {
            i += 1;
        }

        if i < self.ranges.len() && first >= self.ranges[i].first && last <= self.ranges[i].last {
            return;
        }

        let mut new_first = first;
        let mut new_last = last;
        while i < self.ranges.len() && self.ranges[i].first <= new_last.saturating_add(1) {
            new_first = new_first.min(self.ranges[i].first);
            new_last = new_last.max(self.ranges[i].last);
            self.ranges.remove(i);
        }

        self.ranges.insert(
            i,
            ClipRange {
                first: new_first,
                last: new_last,
            },
        );
    }

    /// Nothing left to draw once one range spans the whole screen.
    #[cfg(test)]
    pub fn is_full(&self, width: i32) -> bool {
        self.ranges
            .iter()
            .any(|r| r.first <= 0 && r.last >= width - 1)
    }
}

/// Per-column vertical clip state while walls are drawn front to back.
///
/// `ceil[x]` is the last row hidden from above, `floor[x]` the first row
/// hidden from below.
#[derive(Default)]
pub struct ClipBands {
    pub ceil: Vec<i16>,
    pub floor: Vec<i16>,
}

impl ClipBands {
    pub fn reset(&mut self, width: usize, height: usize) {
        self.ceil.clear();
        self.ceil.resize(width, -1);
        self.floor.clear();
        self.floor.resize(width, height as i16);
    }
}
