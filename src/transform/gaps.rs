//! Gap stripping, projection and gap/missing-data conversions.

use rand::Rng;

use crate::alphabet::GAP_CHAR;
use crate::model::{Alignment, AlignmentResult, Representation, Rows};

use super::retain_categories;

/// Which columns [`Alignment::strip_gaps`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapStrip {
    /// Columns containing only gaps.
    AllGaps,
    /// Columns containing at least one gap.
    AnyGaps,
    /// Columns where the given row (0-based) has a gap.
    Project(usize),
}

impl GapStrip {
    /// Whether a column is removed, given its characters by row.
    pub(crate) fn strips<F: Fn(usize) -> u8>(self, nseqs: usize, get: F) -> bool {
        match self {
            GapStrip::AllGaps => (0..nseqs).all(|r| get(r) == GAP_CHAR),
            GapStrip::AnyGaps => (0..nseqs).any(|r| get(r) == GAP_CHAR),
            GapStrip::Project(row) => get(row) == GAP_CHAR,
        }
    }
}

impl Alignment {
    /// Removes gapped columns, keeping categories in lockstep.
    ///
    /// An alignment holding only an unordered compressed view is stripped
    /// tuple by tuple (judged on each tuple's last column) and loses its
    /// column categories, which can no longer be placed.
    pub fn strip_gaps(&mut self, mode: GapStrip) -> AlignmentResult<()> {
        if let GapStrip::Project(row) = mode {
            self.check_row(row)?;
        }
        let nseqs = self.nseqs();

        if let Representation::Compressed(stats) = &mut self.repr {
            if !stats.is_ordered() {
                self.length = stats.retain_tuples(|s, t| !mode.strips(nseqs, |r| s.char_in_tuple(t, r, 0)));
                if self.categories.take().is_some() {
                    log::debug!("Column categories dropped after stripping an unordered view");
                }
                return Ok(());
            }
        }

        let rows = self.rows_mut()?;
        let keep: Vec<bool> = (0..rows.len())
            .map(|col| !mode.strips(nseqs, |r| rows.get(r, col)))
            .collect();
        rows.retain_columns(&keep);
        self.length = rows.len();
        retain_categories(&mut self.categories, &keep);
        Ok(())
    }

    /// Replaces every gap run longer than `k` with missing data.
    ///
    /// `refseq` (0-based) is left untouched. A compressed view present
    /// before the call is rebuilt, ordered, with the same tuple size.
    pub fn mask_macro_indels(&mut self, k: usize, refseq: Option<usize>) -> AlignmentResult<()> {
        let previous = self.stats_shape();
        let missing = self.alphabet.missing_char();
        let rows = self.rows_mut()?;
        for r in 0..rows.nrows() {
            if Some(r) == refseq {
                continue;
            }
            let row = rows.row_mut(r);
            let mut run_start = None;
            for i in 0..=row.len() {
                let is_gap = i < row.len() && row[i] == GAP_CHAR;
                match (is_gap, run_start) {
                    (true, None) => run_start = Some(i),
                    (false, Some(start)) => {
                        if i - start > k {
                            row[start..i].fill(missing);
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        self.rebuild_stats(previous.map(|(tuple_size, _)| (tuple_size, true)))
    }

    /// Converts missing-data characters to gaps.
    ///
    /// In `refseq` (0-based), `N`s are instead replaced by symbols drawn
    /// uniformly from the alphabet; use only when such `N`s are rare.
    pub fn missing_to_gaps<R: Rng>(&mut self, refseq: Option<usize>, rng: &mut R) {
        let previous = self.stats_shape();
        if matches!(self.repr, Representation::Both(..)) {
            self.drop_stats();
        }
        let alphabet = &self.alphabet;
        let mut convert = |row: usize, c: u8| -> u8 {
            if !alphabet.is_missing(c) {
                c
            } else if Some(row) == refseq && c == b'N' && !alphabet.is_empty() {
                alphabet.symbols()[rng.random_range(0..alphabet.len())]
            } else {
                GAP_CHAR
            }
        };
        match &mut self.repr {
            Representation::Compressed(stats) => stats.map_chars(&mut convert),
            Representation::Explicit(rows) | Representation::Both(rows, _) => map_rows(rows, &mut convert),
        }
        if matches!(self.repr, Representation::Explicit(_)) {
            // rebuild a view dropped above; never fails on explicit rows
            if let Err(e) = self.rebuild_stats(previous) {
                log::warn!("Could not rebuild compressed view: {}", e);
            }
        }
    }
}

fn map_rows<F: FnMut(usize, u8) -> u8>(rows: &mut Rows, f: &mut F) {
    for r in 0..rows.nrows() {
        for c in rows.row_mut(r).iter_mut() {
            *c = f(r, *c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn aln(seqs: &[&str]) -> Alignment {
        let names = (0..seqs.len()).map(|i| format!("s{}", i)).collect();
        let rows = seqs.iter().map(|s| s.as_bytes().to_vec()).collect();
        Alignment::new(names, rows, None).unwrap()
    }

    fn rows_of(a: &Alignment) -> Vec<String> {
        let view = a.char_view().unwrap();
        (0..a.nseqs())
            .map(|r| String::from_utf8(view.row_vec(r, a.length())).unwrap())
            .collect()
    }

    #[test]
    fn test_strip_all_gaps() {
        let mut a = aln(&["A--C", "A-GC"]);
        a.strip_gaps(GapStrip::AllGaps).unwrap();
        assert_eq!(rows_of(&a), vec!["A-C", "AGC"]);
        assert_eq!(a.length(), 3);
    }

    #[test]
    fn test_strip_any_gaps_is_idempotent() {
        let mut a = aln(&["A--CT", "A-GC-", "AAGCT"]);
        a.set_categories(vec![0, 1, 2, 3, 4], 5).unwrap();
        a.strip_gaps(GapStrip::AnyGaps).unwrap();
        assert_eq!(rows_of(&a), vec!["AC", "AC", "AC"]);
        assert_eq!(a.categories().unwrap(), &[0, 3]);
        let once = rows_of(&a);
        a.strip_gaps(GapStrip::AnyGaps).unwrap();
        assert_eq!(rows_of(&a), once);
        assert_eq!(a.categories().unwrap(), &[0, 3]);
    }

    #[test]
    fn test_project_onto_row() {
        let mut a = aln(&["A-GC", "AT-C"]);
        a.strip_gaps(GapStrip::Project(1)).unwrap();
        assert_eq!(rows_of(&a), vec!["A-C", "ATC"]);
        assert!(a.strip_gaps(GapStrip::Project(5)).is_err());
    }

    #[test]
    fn test_strip_drops_stale_stats() {
        let mut a = aln(&["A-C", "AGC"]);
        a.build_stats(1, true).unwrap();
        a.strip_gaps(GapStrip::AnyGaps).unwrap();
        assert!(a.stats().is_none());
        assert_eq!(rows_of(&a), vec!["AC", "AC"]);
    }

    #[test]
    fn test_strip_unordered_compressed() {
        let mut a = aln(&["A-CA", "AGCA"]);
        a.build_stats(1, false).unwrap();
        a.drop_rows().unwrap();
        a.strip_gaps(GapStrip::AnyGaps).unwrap();
        assert_eq!(a.length(), 3);
        assert_eq!(a.stats().unwrap().total_count(), 3);
    }

    #[test]
    fn test_mask_macro_indels() {
        let mut a = aln(&["A---CG-T", "A--ACG-T", "AAAACGGT"]);
        a.build_stats(2, false).unwrap();
        a.mask_macro_indels(2, Some(1)).unwrap();
        assert_eq!(rows_of(&a)[0], "A***CG-T");
        assert_eq!(rows_of(&a)[1], "A--ACG-T");
        let stats = a.stats().unwrap();
        assert_eq!(stats.tuple_size(), 2);
        assert!(stats.is_ordered());
    }

    #[test]
    fn test_mask_trailing_gap_run() {
        let mut a = aln(&["AC---"]);
        a.mask_macro_indels(2, None).unwrap();
        assert_eq!(rows_of(&a), vec!["AC***"]);
    }

    #[test]
    fn test_missing_to_gaps() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut a = aln(&["ANC*", "A*NC"]);
        a.missing_to_gaps(Some(0), &mut rng);
        let rows = rows_of(&a);
        assert_eq!(&rows[1], "A--C");
        let r0 = rows[0].as_bytes();
        assert!(b"ACGT".contains(&r0[1]));
        assert_eq!(r0[3], b'-');
    }

    #[test]
    fn test_missing_to_gaps_compressed_only() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = aln(&["A*", "*C"]);
        a.build_stats(1, true).unwrap();
        a.drop_rows().unwrap();
        a.missing_to_gaps(None, &mut rng);
        assert_eq!(rows_of(&a), vec!["A-", "-C"]);
    }
}
