//! Per-frame arena for saved clip columns.
//!
//! Wall records keep the ceiling/floor clip state of their columns (and
//! the texture columns of masked mid-textures) here instead of owning
//! small vectors. Everything is dropped at once by `reset`.

/// Handle to a run of cells inside a [`FrameScratch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScratchSpan {
    start: u32,
    len: u32,
}

impl ScratchSpan {
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Default)]
pub struct FrameScratch {
    openings: Vec<i16>,
}

impl FrameScratch {
    /// Hand out `len` consecutive cells set to `fill`.
    pub fn alloc(&mut self, len: usize, fill: i16) -> ScratchSpan {
        let start = self.openings.len();
        self.openings.resize(start + len, fill);
        ScratchSpan {
            start: start as u32,
            len: len as u32,
        }
    }

    /// Hand out a copy of `src`.
    pub fn alloc_copy(&mut self, src: &[i16]) -> ScratchSpan {
        let start = self.openings.len();
        self.openings.extend_from_slice(src);
        ScratchSpan {
            start: start as u32,
            len: src.len() as u32,
        }
    }

    #[inline]
    pub fn get(&self, span: ScratchSpan) -> &[i16] {
        &self.openings[span.start as usize..(span.start + span.len) as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, span: ScratchSpan) -> &mut [i16] {
        &mut self.openings[span.start as usize..(span.start + span.len) as usize]
    }

    /// Cells handed out this frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.openings.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.openings.is_empty()
    }

    /// Forget every span; the allocation is kept for the next frame.
    pub fn reset(&mut self) {
        self.openings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_stay_valid_while_the_arena_grows() {
        let mut scratch = FrameScratch::default();
        let a = scratch.alloc_copy(&[1, 2, 3]);
        let b = scratch.alloc(1000, -1);
        scratch.get_mut(b)[999] = 7;

        assert_eq!(scratch.get(a), &[1, 2, 3]);
        assert_eq!(scratch.get(b).len(), 1000);
        assert_eq!(scratch.get(b)[999], 7);
        assert_eq!(scratch.len(), 1003);

        scratch.reset();
        assert!(scratch.is_empty());
    }
}
