//! Sub-alignments, concatenation and partitioning by category.

use std::ops::Range;

use crate::model::{Alignment, AlignmentError, AlignmentResult, Rows};

/// Rows to keep when extracting a sub-alignment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RowSelection {
    #[default]
    All,
    /// Exactly these rows (0-based), in this order.
    Include(Vec<usize>),
    /// Every row except these (0-based).
    Exclude(Vec<usize>),
}

impl RowSelection {
    fn resolve(&self, nseqs: usize) -> AlignmentResult<Vec<usize>> {
        let listed = match self {
            RowSelection::All => return Ok((0..nseqs).collect()),
            RowSelection::Include(rows) | RowSelection::Exclude(rows) => rows,
        };
        if let Some(&row) = listed.iter().find(|&&r| r >= nseqs) {
            return Err(AlignmentError::RowOutOfRange { row, nseqs });
        }
        Ok(match self {
            RowSelection::Exclude(rows) => (0..nseqs).filter(|r| !rows.contains(r)).collect(),
            _ => listed.clone(),
        })
    }
}

impl Alignment {
    /// Copies the selected rows over a half-open, 0-based column range.
    ///
    /// The new alignment's `idx_offset` is shifted by `cols.start`. A
    /// compressed-only source yields a compressed-only result with the
    /// same tuple size.
    pub fn sub_alignment(&self, selection: &RowSelection, cols: Range<usize>) -> AlignmentResult<Alignment> {
        if cols.start >= cols.end || cols.end > self.length {
            return Err(AlignmentError::BadColumnRange {
                start: cols.start,
                end: cols.end,
                length: self.length,
            });
        }
        let keep = selection.resolve(self.nseqs())?;
        let names = keep.iter().map(|&r| self.names[r].clone()).collect();

        let rows = match self.rows() {
            Some(rows) => rows.select(&keep, cols.clone()),
            None => {
                let view = self.char_view()?;
                let data = keep
                    .iter()
                    .map(|&r| cols.clone().map(|c| view.get(r, c)).collect())
                    .collect();
                Rows::new(data)?
            }
        };

        let mut sub = Alignment::from_rows(names, rows, self.alphabet.clone());
        sub.idx_offset = self.idx_offset + cols.start as i64;
        if let (Some(cats), Some(ncats)) = (&self.categories, self.ncats) {
            sub.categories = Some(cats[cols].to_vec());
            sub.ncats = Some(ncats);
        }
        if let Some(informative) = &self.is_informative {
            sub.is_informative = Some(keep.iter().map(|&r| informative[r]).collect());
        }
        if self.rows().is_none() {
            if let Some((tuple_size, ordered)) = self.stats_shape() {
                sub.build_stats(tuple_size, ordered)?;
                sub.drop_rows()?;
            }
        }
        Ok(sub)
    }

    /// Appends the columns of `other`; row order must correspond.
    ///
    /// Names of `other` are ignored. Categories survive only when both
    /// alignments carry them.
    pub fn concatenate(&mut self, other: &Alignment) -> AlignmentResult<()> {
        if self.nseqs() != other.nseqs() {
            return Err(AlignmentError::SeqCountMismatch {
                left: self.nseqs(),
                right: other.nseqs(),
            });
        }
        let materialized;
        let extra = match other.rows() {
            Some(rows) => rows,
            None => {
                materialized = other
                    .stats()
                    .and_then(|s| s.to_rows())
                    .ok_or(AlignmentError::Unordered)?;
                &materialized
            }
        };

        let rows = self.rows_mut()?;
        rows.append(extra)?;
        self.length = rows.len();

        match (self.categories.as_mut(), &other.categories) {
            (Some(cats), Some(more)) => {
                cats.extend_from_slice(more);
                self.ncats = self.ncats.max(other.ncats);
            }
            _ => {
                if self.categories.is_some() || other.categories.is_some() {
                    log::debug!("Dropping column categories: only one side of the concatenation has them");
                }
                self.categories = None;
                self.ncats = None;
            }
        }
        Ok(())
    }

    /// Splits the alignment into one alignment per category.
    ///
    /// `tuple_size - 1` columns of missing data separate columns that were
    /// not adjacent in the source. `cats` restricts the categories
    /// produced; by default every category up to the largest one present.
    pub fn partition_by_category(
        &self,
        cats: Option<&[usize]>,
        tuple_size: usize,
    ) -> AlignmentResult<Vec<(usize, Alignment)>> {
        let labels = self.categories.as_deref().ok_or(AlignmentError::NoCategories)?;
        let view = self.char_view()?;
        let ncats = labels.iter().max().map_or(1, |&m| m + 1);
        let wanted: Vec<usize> = match cats {
            Some(list) => list.iter().copied().filter(|&c| c < ncats).collect(),
            None => (0..ncats).collect(),
        };
        let mut selected = vec![false; ncats];
        for &c in &wanted {
            selected[c] = true;
        }

        let missing = self.alphabet.missing_char();
        let mut parts: Vec<Vec<Vec<u8>>> = vec![vec![Vec::new(); self.nseqs()]; ncats];
        for (col, &cat) in labels.iter().enumerate() {
            if !selected[cat] {
                continue;
            }
            let part = &mut parts[cat];
            let started = part.first().is_some_and(|r| !r.is_empty());
            if col > 0 && labels[col - 1] != cat && started {
                for row in part.iter_mut() {
                    row.extend(std::iter::repeat(missing).take(tuple_size.saturating_sub(1)));
                }
            }
            for (r, row) in part.iter_mut().enumerate() {
                row.push(view.get(r, col));
            }
        }

        let mut out = Vec::with_capacity(wanted.len());
        for cat in wanted {
            let rows = Rows::new(std::mem::take(&mut parts[cat]))?;
            out.push((cat, Alignment::from_rows(self.names.clone(), rows, self.alphabet.clone())));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(seqs: &[&str]) -> Alignment {
        let names = (0..seqs.len()).map(|i| format!("s{}", i)).collect();
        let rows = seqs.iter().map(|s| s.as_bytes().to_vec()).collect();
        Alignment::new(names, rows, None).unwrap()
    }

    fn row(a: &Alignment, r: usize) -> String {
        let view = a.char_view().unwrap();
        String::from_utf8(view.row_vec(r, a.length())).unwrap()
    }

    #[test]
    fn test_sub_alignment_include_exclude() {
        let mut a = aln(&["ACGTAC", "TTGGCC", "GGAATT"]);
        a.idx_offset = 100;
        a.set_categories(vec![0, 1, 2, 3, 1, 2], 4).unwrap();

        let sub = a.sub_alignment(&RowSelection::Include(vec![2, 0]), 1..4).unwrap();
        assert_eq!(sub.names(), &["s2".to_string(), "s0".to_string()]);
        assert_eq!(row(&sub, 0), "GAA");
        assert_eq!(row(&sub, 1), "CGT");
        assert_eq!(sub.idx_offset, 101);
        assert_eq!(sub.categories().unwrap(), &[1, 2, 3]);

        let sub = a.sub_alignment(&RowSelection::Exclude(vec![1]), 0..6).unwrap();
        assert_eq!(sub.nseqs(), 2);
        assert_eq!(row(&sub, 1), "GGAATT");
    }

    #[test]
    fn test_sub_alignment_errors() {
        let a = aln(&["ACGT"]);
        assert!(matches!(
            a.sub_alignment(&RowSelection::All, 2..2),
            Err(AlignmentError::BadColumnRange { .. })
        ));
        assert!(matches!(
            a.sub_alignment(&RowSelection::All, 0..5),
            Err(AlignmentError::BadColumnRange { .. })
        ));
        assert!(matches!(
            a.sub_alignment(&RowSelection::Include(vec![3]), 0..2),
            Err(AlignmentError::RowOutOfRange { row: 3, .. })
        ));
    }

    #[test]
    fn test_sub_alignment_of_compressed() {
        let mut a = aln(&["ACGTAC", "TTGGCC"]);
        a.build_stats(1, true).unwrap();
        a.drop_rows().unwrap();
        let sub = a.sub_alignment(&RowSelection::All, 2..5).unwrap();
        assert!(sub.rows().is_none());
        assert_eq!(row(&sub, 1), "GGC");
    }

    #[test]
    fn test_concatenate() {
        let mut a = aln(&["AC", "GT"]);
        let b = aln(&["TTT", "-A-"]);
        a.concatenate(&b).unwrap();
        assert_eq!(a.length(), 5);
        assert_eq!(row(&a, 0), "ACTTT");
        assert_eq!(row(&a, 1), "GT-A-");
        assert!(a.concatenate(&aln(&["A"])).is_err());
    }

    #[test]
    fn test_concatenate_categories() {
        let mut a = aln(&["AC"]);
        let mut b = aln(&["T"]);
        a.set_categories(vec![1, 0], 2).unwrap();
        b.set_categories(vec![2], 3).unwrap();
        a.concatenate(&b).unwrap();
        assert_eq!(a.categories().unwrap(), &[1, 0, 2]);
        assert_eq!(a.ncats(), Some(3));

        a.concatenate(&aln(&["G"])).unwrap();
        assert!(a.categories().is_none());
    }

    #[test]
    fn test_concatenate_compressed_source() {
        let mut a = aln(&["AC"]);
        let mut b = aln(&["GT"]);
        b.build_stats(1, true).unwrap();
        b.drop_rows().unwrap();
        a.concatenate(&b).unwrap();
        assert_eq!(row(&a, 0), "ACGT");
    }

    #[test]
    fn test_partition_by_category() {
        let mut a = aln(&["ACGTAC"]);
        a.set_categories(vec![1, 1, 0, 1, 2, 2], 3).unwrap();
        let parts = a.partition_by_category(None, 2).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(row(&parts[0].1, 0), "G");
        assert_eq!(row(&parts[1].1, 0), "AC*T");
        assert_eq!(row(&parts[2].1, 0), "AC");

        let parts = a.partition_by_category(Some(&[2]), 1).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].0, 2);
    }
}
