//! Reverse complementation.

use std::ops::Range;

use crate::features::FeatureSet;
use crate::model::{Alignment, AlignmentError, AlignmentResult, Representation};

/// Watson-Crick complement; other characters (gaps, missing data,
/// ambiguity codes) are returned unchanged. Case is preserved.
pub fn complement(c: u8) -> u8 {
    match c {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        other => other,
    }
}

fn reverse_complement_in_place(seq: &mut [u8]) {
    seq.reverse();
    for c in seq.iter_mut() {
        *c = complement(*c);
    }
}

impl Alignment {
    /// Reverse complements the whole alignment.
    ///
    /// Categories are reversed with the columns. A single-column compressed
    /// view is complemented directly; a wider one is rebuilt from the rows
    /// with the same tuple size and ordering.
    pub fn reverse_complement(&mut self) -> AlignmentResult<()> {
        let single_column = self.stats().map_or(true, |s| s.tuple_size() == 1);
        if single_column {
            match &mut self.repr {
                Representation::Explicit(rows) => {
                    for r in 0..rows.nrows() {
                        reverse_complement_in_place(rows.row_mut(r));
                    }
                }
                Representation::Compressed(stats) => stats.reverse_complement(complement),
                Representation::Both(rows, stats) => {
                    for r in 0..rows.nrows() {
                        reverse_complement_in_place(rows.row_mut(r));
                    }
                    stats.reverse_complement(complement);
                }
            }
        } else {
            let previous = self.stats_shape();
            let rows = self.rows_mut()?;
            for r in 0..rows.nrows() {
                reverse_complement_in_place(rows.row_mut(r));
            }
            self.rebuild_stats(previous)?;
        }

        if let Some(cats) = self.categories.as_mut() {
            cats.reverse();
        }
        self.refresh_category_counts();
        Ok(())
    }

    /// Reverse complements a half-open, 0-based column range in place.
    pub fn reverse_complement_segment(&mut self, cols: Range<usize>) -> AlignmentResult<()> {
        if cols.start >= cols.end || cols.end > self.length {
            return Err(AlignmentError::BadColumnRange {
                start: cols.start,
                end: cols.end,
                length: self.length,
            });
        }
        let previous = self.stats_shape();
        let rows = self.rows_mut()?;
        for r in 0..rows.nrows() {
            reverse_complement_in_place(&mut rows.row_mut(r)[cols.clone()]);
        }
        if let Some(cats) = self.categories.as_mut() {
            cats[cols].reverse();
        }
        self.rebuild_stats(previous)
    }
}

/// Reverse complements every feature group lying entirely on the reverse
/// strand.
///
/// Each such group is mirrored within its own extent: member coordinates
/// and strands in `features`, the covered columns of `aln`, and the
/// covered entries of `aux` (per-column values such as scores). Groups on
/// the forward or mixed strands are left alone. Features must be grouped.
pub fn reverse_complement_feature_groups(
    mut aln: Option<&mut Alignment>,
    features: &mut FeatureSet,
    mut aux: Option<&mut [i32]>,
) -> AlignmentResult<()> {
    let groups = features.groups().ok_or(AlignmentError::FeaturesNotGrouped)?.to_vec();
    for group in &groups {
        if !features.reverse_strand_only(group) {
            continue;
        }
        let limit = match (&aln, &aux) {
            (Some(a), _) => a.length(),
            (None, Some(v)) => v.len(),
            (None, None) => usize::MAX,
        };
        if group.start < 1 || group.end < group.start || group.end as u64 > limit as u64 {
            return Err(AlignmentError::GroupOutOfRange {
                start: group.start,
                end: group.end,
                length: limit,
            });
        }
        let cols = (group.start - 1) as usize..group.end as usize;
        if let Some(a) = aln.as_deref_mut() {
            a.reverse_complement_segment(cols.clone())?;
        }
        if let Some(values) = aux.as_deref_mut() {
            let slice = values.get_mut(cols).ok_or(AlignmentError::GroupOutOfRange {
                start: group.start,
                end: group.end,
                length: limit,
            })?;
            slice.reverse();
        }
        features.reverse_complement_group(group);
    }
    Ok(())
}
