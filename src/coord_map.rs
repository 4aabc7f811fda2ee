//! Coordinate maps between one sequence and the alignment.
//!
//! A [`CoordMap`] records, for every maximal run of non-gap characters in a
//! reference row, the alignment column and the ungapped sequence position
//! where the run begins. Anchors are stored 0-based; the public API takes
//! and returns 1-based positions (GFF convention).
//!
//! A map describes the alignment as it was when the map was built; rebuild
//! it after editing the alignment.

use crate::alphabet::GAP_CHAR;
use crate::model::{Alignment, AlignmentResult};

/// Translator between one row's ungapped coordinates and alignment columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordMap {
    /// Alignment column (0-based) where each non-gap run starts.
    msa_starts: Vec<usize>,
    /// Sequence position (0-based) of the first character of each run.
    seq_starts: Vec<usize>,
    seq_len: usize,
    msa_len: usize,
}

impl CoordMap {
    /// Builds the map for `row` in a single pass over the alignment.
    pub fn build(aln: &Alignment, row: usize) -> AlignmentResult<Self> {
        aln.check_row(row)?;
        let view = aln.char_view()?;
        let mut msa_starts = Vec::with_capacity(aln.length() / 10 + 1);
        let mut seq_starts = Vec::with_capacity(aln.length() / 10 + 1);
        let mut seq_pos = 0;
        let mut prev_gap = true;
        for col in 0..aln.length() {
            if view.get(row, col) == GAP_CHAR {
                prev_gap = true;
                continue;
            }
            if prev_gap {
                msa_starts.push(col);
                seq_starts.push(seq_pos);
            }
            seq_pos += 1;
            prev_gap = false;
        }
        Ok(Self {
            msa_starts,
            seq_starts,
            seq_len: seq_pos,
            msa_len: aln.length(),
        })
    }

    /// Ungapped length of the reference row.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Alignment length when the map was built.
    pub fn msa_len(&self) -> usize {
        self.msa_len
    }

    /// `(msa_start, seq_start)` pairs, 1-based, one per non-gap run.
    pub fn anchors(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.msa_starts
            .iter()
            .zip(&self.seq_starts)
            .map(|(&m, &s)| (m + 1, s + 1))
    }

    /// Index of the last anchor whose value is at most `v`.
    fn last_at_or_before(starts: &[usize], v: usize) -> Option<usize> {
        starts.partition_point(|&x| x <= v).checked_sub(1)
    }

    /// Alignment column (1-based) of a sequence position (1-based).
    pub fn seq_to_msa(&self, seq_pos: usize) -> Option<usize> {
        if seq_pos < 1 || seq_pos > self.seq_len {
            return None;
        }
        let p = seq_pos - 1;
        let idx = Self::last_at_or_before(&self.seq_starts, p)?;
        Some(self.msa_starts[idx] + (p - self.seq_starts[idx]) + 1)
    }

    /// Sequence position (1-based) of an alignment column (1-based).
    ///
    /// A column where the reference has a gap maps to the position just
    /// before the gap; columns before the first character map to `None`.
    pub fn msa_to_seq(&self, msa_pos: usize) -> Option<usize> {
        if msa_pos < 1 || msa_pos > self.msa_len {
            return None;
        }
        let p = msa_pos - 1;
        let idx = Self::last_at_or_before(&self.msa_starts, p)?;
        let next = self.seq_starts.get(idx + 1).copied().unwrap_or(self.seq_len);
        let seq = (self.seq_starts[idx] + (p - self.msa_starts[idx])).min(next - 1);
        Some(seq + 1)
    }

    /// Maps a position from one frame to another through the alignment.
    ///
    /// `None` for either map means the alignment frame itself.
    pub fn seq_to_seq(from: Option<&CoordMap>, to: Option<&CoordMap>, pos: usize) -> Option<usize> {
        let msa_pos = match from {
            Some(map) => map.seq_to_msa(pos)?,
            None => pos,
        };
        match to {
            Some(map) => map.msa_to_seq(msa_pos),
            None => Some(msa_pos),
        }
    }
}
