//! Summary statistics over an alignment.
//!
//! Whole-alignment statistics use the compressed view when one is
//! present (judging each tuple by its last column) and the explicit
//! rows otherwise. Statistics over a column range need an ordered view
//! or explicit rows.

use std::fmt::Write as _;
use std::ops::Range;

use crate::alphabet::GAP_CHAR;
use crate::model::{Alignment, AlignmentError, AlignmentResult, CharView};
use crate::transform::GapStrip;

impl Alignment {
    fn check_range(&self, range: Option<Range<usize>>) -> AlignmentResult<Range<usize>> {
        let range = range.unwrap_or(0..self.length);
        if range.start > range.end || range.end > self.length {
            return Err(AlignmentError::BadColumnRange {
                start: range.start,
                end: range.end,
                length: self.length,
            });
        }
        Ok(range)
    }

    /// Frequency of each alphabet symbol, in alphabet order.
    ///
    /// Gaps and missing data are not counted; any other character outside
    /// the alphabet is an error. All zeros if nothing was counted.
    pub fn base_freqs(&self, range: Option<Range<usize>>) -> AlignmentResult<Vec<f64>> {
        let mut counts = vec![0.0; self.alphabet.len()];
        let mut tally = |c: u8, n: usize| -> AlignmentResult<()> {
            if c == GAP_CHAR || self.alphabet.is_missing(c) {
                return Ok(());
            }
            let idx = self
                .alphabet
                .index(c)
                .ok_or(AlignmentError::UnrecognizedChar(c as char))?;
            counts[idx] += n as f64;
            Ok(())
        };

        match self.stats().filter(|_| range.is_none()) {
            Some(stats) => {
                for (t, &n) in stats.counts().iter().enumerate() {
                    for row in 0..self.nseqs() {
                        tally(stats.char_in_tuple(t, row, 0), n)?;
                    }
                }
            }
            None => {
                let range = self.check_range(range)?;
                let view = self.char_view()?;
                for col in range {
                    for row in 0..self.nseqs() {
                        tally(view.get(row, col), 1)?;
                    }
                }
            }
        }
        Ok(normalize(counts))
    }

    /// Frequencies of `k`-tuples of consecutive symbols within each row.
    ///
    /// The tuple `c_0 .. c_{k-1}` has index `sum(idx(c_l) * size^(k-1-l))`.
    /// Tuples containing anything outside the alphabet are skipped. With
    /// `cat`, only tuples whose last column has that category count.
    pub fn tuple_freqs(&self, k: usize, cat: Option<usize>) -> AlignmentResult<Vec<f64>> {
        if k == 0 {
            return Err(AlignmentError::InvalidTupleSize);
        }
        let size = self.alphabet.len();
        let ntuples = u32::try_from(k)
            .ok()
            .and_then(|e| size.checked_pow(e))
            .ok_or(AlignmentError::InvalidTupleSize)?;
        let mut freqs = vec![0.0; ntuples];
        let tuple_index = |chars: &mut dyn Iterator<Item = u8>| -> Option<usize> {
            let mut idx = 0;
            for c in chars {
                idx = idx * size + self.alphabet.index(c)?;
            }
            Some(idx)
        };

        match self.stats() {
            Some(stats) if stats.tuple_size() == k => {
                let counts = match cat {
                    Some(cat) => stats
                        .cat_counts()
                        .and_then(|per_cat| per_cat.get(cat))
                        .map(Vec::as_slice)
                        .ok_or(AlignmentError::NoCategories)?,
                    None => stats.counts(),
                };
                for (t, &n) in counts.iter().enumerate() {
                    for row in 0..self.nseqs() {
                        let mut chars = (0..k).rev().map(|back| stats.char_in_tuple(t, row, back));
                        if let Some(idx) = tuple_index(&mut chars) {
                            freqs[idx] += n as f64;
                        }
                    }
                }
            }
            _ => {
                let labels = match cat {
                    Some(_) => Some(self.categories().ok_or(AlignmentError::NoCategories)?),
                    None => None,
                };
                let view = self.char_view()?;
                for start in 0..(self.length + 1).saturating_sub(k) {
                    if let (Some(cat), Some(labels)) = (cat, labels) {
                        if labels[start + k - 1] != cat {
                            continue;
                        }
                    }
                    for row in 0..self.nseqs() {
                        let mut chars = (start..start + k).map(|col| view.get(row, col));
                        if let Some(idx) = tuple_index(&mut chars) {
                            freqs[idx] += 1.0;
                        }
                    }
                }
            }
        }
        Ok(normalize(freqs))
    }

    /// Number of columns stripped by `mode`, optionally within a range.
    pub fn num_gapped_cols(&self, mode: GapStrip, range: Option<Range<usize>>) -> AlignmentResult<usize> {
        let nseqs = self.nseqs();
        if let GapStrip::Project(row) = mode {
            self.check_row(row)?;
        }
        match self.stats().filter(|_| range.is_none()) {
            Some(stats) => Ok(stats
                .counts()
                .iter()
                .enumerate()
                .filter(|&(t, _)| mode.strips(nseqs, |r| stats.char_in_tuple(t, r, 0)))
                .map(|(_, &n)| n)
                .sum()),
            None => {
                let range = self.check_range(range)?;
                let view = self.char_view()?;
                Ok(range.filter(|&col| mode.strips(nseqs, |r| view.get(r, col))).count())
            }
        }
    }

    /// Number of columns with at least two characters that are neither
    /// gaps nor missing data, optionally restricted to a category.
    pub fn ninformative_sites(&self, cat: Option<usize>) -> AlignmentResult<usize> {
        let nseqs = self.nseqs();
        let informative = |get: &dyn Fn(usize) -> u8| {
            (0..nseqs)
                .filter(|&r| {
                    let c = get(r);
                    c != GAP_CHAR && !self.alphabet.is_missing(c)
                })
                .nth(1)
                .is_some()
        };

        if let Some(stats) = self.stats() {
            let counts = match cat {
                Some(cat) => stats
                    .cat_counts()
                    .and_then(|per_cat| per_cat.get(cat))
                    .map(Vec::as_slice)
                    .ok_or(AlignmentError::NoCategories)?,
                None => stats.counts(),
            };
            return Ok(counts
                .iter()
                .enumerate()
                .filter(|&(t, _)| informative(&|r| stats.char_in_tuple(t, r, 0)))
                .map(|(_, &n)| n)
                .sum());
        }

        let labels = match cat {
            Some(_) => Some(self.categories().ok_or(AlignmentError::NoCategories)?),
            None => None,
        };
        let view = self.char_view()?;
        Ok((0..self.length)
            .filter(|&col| match (cat, labels) {
                (Some(cat), Some(labels)) => labels[col] == cat,
                _ => true,
            })
            .filter(|&col| informative(&|r| view.get(r, col)))
            .count())
    }

    /// Header line matching [`Alignment::stats_line`].
    pub fn stats_header(&self) -> String {
        let mut line = format!("{:<20} ", "descrip.");
        for &c in self.alphabet.symbols() {
            let _ = write!(line, "{:>10} ", c as char);
        }
        let _ = write!(line, "{:>10} {:>10} {:>10} {:>10}", "G+C", "length", "all_gaps", "some_gaps");
        line
    }

    /// One line of summary statistics: symbol frequencies, G+C content,
    /// length and the number of all-gap and some-gap columns.
    pub fn stats_line(&self, label: &str, range: Option<Range<usize>>) -> AlignmentResult<String> {
        let freqs = self.base_freqs(range.clone())?;
        let all_gaps = self.num_gapped_cols(GapStrip::AllGaps, range.clone())?;
        let any_gaps = self.num_gapped_cols(GapStrip::AnyGaps, range.clone())?;
        let length = range.map_or(self.length, |r| r.len());

        let mut line = format!("{:<20} ", label);
        let mut gc = 0.0;
        for (&c, f) in self.alphabet.symbols().iter().zip(&freqs) {
            let _ = write!(line, "{:>10.4} ", f);
            if c == b'G' || c == b'C' {
                gc += f;
            }
        }
        let _ = write!(line, "{:>10.4} {:>10} {:>10} {:>10}", gc, length, all_gaps, any_gaps);
        Ok(line)
    }

    /// True if every row but `refseq` (0-based) holds missing data at `pos`.
    /// Columns past the end are never missing.
    pub fn missing_col(&self, refseq: usize, pos: usize) -> bool {
        if pos >= self.length {
            return false;
        }
        self.char_view()
            .map(|view| self.missing_col_in(&view, refseq, pos))
            .unwrap_or(false)
    }

    fn missing_col_in(&self, view: &CharView<'_>, refseq: usize, pos: usize) -> bool {
        (0..self.nseqs())
            .filter(|&r| r != refseq)
            .all(|r| self.alphabet.is_missing(view.get(r, pos)))
    }

    /// Flags columns belonging to reference-only blocks: runs of at least
    /// `min_block` columns where only `refseq` has data. A run reaching
    /// the end of the alignment is flagged whatever its length.
    pub fn find_noaln(&self, refseq: usize, min_block: usize) -> AlignmentResult<Vec<bool>> {
        self.check_row(refseq)?;
        let view = self.char_view()?;
        let mut noaln = vec![false; self.length];
        let mut run_start = None;
        for col in 0..self.length {
            let ref_only = self.missing_col_in(&view, refseq, col);
            match (run_start, ref_only) {
                (None, true) => run_start = Some(col),
                (Some(start), false) => {
                    if col - start >= min_block {
                        noaln[start..col].fill(true);
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            noaln[start..].fill(true);
        }
        Ok(noaln)
    }
}

fn normalize(mut counts: Vec<f64>) -> Vec<f64> {
    let sum: f64 = counts.iter().sum();
    if sum > 0.0 {
        for c in counts.iter_mut() {
            *c /= sum;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(seqs: &[&str]) -> Alignment {
        let names = (0..seqs.len()).map(|i| format!("s{}", i)).collect();
        let rows = seqs.iter().map(|s| s.as_bytes().to_vec()).collect();
        Alignment::new(names, rows, None).unwrap()
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_base_freqs() {
        let mut a = aln(&["ACGT", "AC-N"]);
        let expected = [1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0];
        assert!(close(&a.base_freqs(None).unwrap(), &expected));
        assert!(close(&a.base_freqs(Some(2..4)).unwrap(), &[0.0, 0.0, 0.5, 0.5]));
        a.build_stats(1, false).unwrap();
        a.drop_rows().unwrap();
        assert!(close(&a.base_freqs(None).unwrap(), &expected));
        assert!(a.base_freqs(Some(0..2)).is_err());
    }

    #[test]
    fn test_base_freqs_unrecognized() {
        let a = aln(&["AXGT"]);
        assert!(matches!(a.base_freqs(None), Err(AlignmentError::UnrecognizedChar('X'))));
    }

    #[test]
    fn test_tuple_freqs() {
        let mut a = aln(&["ACGT"]);
        a.set_categories(vec![0, 1, 0, 1], 2).unwrap();
        let f = a.tuple_freqs(2, None).unwrap();
        assert_eq!(f.len(), 16);
        assert!((f[1] - 1.0 / 3.0).abs() < 1e-9);
        assert!((f[6] - 1.0 / 3.0).abs() < 1e-9);
        assert!((f[11] - 1.0 / 3.0).abs() < 1e-9);
        let by_cat = a.tuple_freqs(2, Some(1)).unwrap();
        assert!((by_cat[1] - 0.5).abs() < 1e-9);
        assert!((by_cat[11] - 0.5).abs() < 1e-9);

        a.build_stats(2, true).unwrap();
        a.drop_rows().unwrap();
        assert!(close(&a.tuple_freqs(2, None).unwrap(), &f));
        assert!(close(&a.tuple_freqs(2, Some(1)).unwrap(), &by_cat));
    }

    #[test]
    fn test_tuple_freqs_rejects_overflowing_k() {
        let a = aln(&["ACGT", "ACGA"]);
        assert_eq!(a.tuple_freqs(40, None), Err(AlignmentError::InvalidTupleSize));
        assert_eq!(a.tuple_freqs(0, None), Err(AlignmentError::InvalidTupleSize));
    }

    #[test]
    fn test_num_gapped_cols() {
        let mut a = aln(&["A-C-", "A-GT"]);
        assert_eq!(a.num_gapped_cols(GapStrip::AllGaps, None).unwrap(), 1);
        assert_eq!(a.num_gapped_cols(GapStrip::AnyGaps, None).unwrap(), 2);
        assert_eq!(a.num_gapped_cols(GapStrip::AnyGaps, Some(2..4)).unwrap(), 1);
        a.build_stats(1, false).unwrap();
        assert_eq!(a.num_gapped_cols(GapStrip::AnyGaps, None).unwrap(), 2);
    }

    #[test]
    fn test_ninformative_sites() {
        let mut a = aln(&["A-C*", "AGCT", "-GC-"]);
        assert_eq!(a.ninformative_sites(None).unwrap(), 3);
        a.set_categories(vec![1, 0, 1, 1], 2).unwrap();
        assert_eq!(a.ninformative_sites(Some(1)).unwrap(), 2);
        a.build_stats(1, true).unwrap();
        assert_eq!(a.ninformative_sites(None).unwrap(), 3);
        assert_eq!(a.ninformative_sites(Some(1)).unwrap(), 2);
    }

    #[test]
    fn test_stats_line() {
        let a = aln(&["ACGT"]);
        let header = a.stats_header();
        assert!(header.starts_with("descrip."));
        assert!(header.ends_with(" some_gaps"));
        let line = a.stats_line("x", None).unwrap();
        assert_eq!(line.len(), 108);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(
            fields,
            vec!["x", "0.2500", "0.2500", "0.2500", "0.2500", "0.5000", "4", "0", "0"]
        );
        assert_eq!(header.len(), line.len());
    }

    #[test]
    fn test_find_noaln() {
        let a = aln(&["ACGTACGT", "A***C***", "A***G***"]);
        assert!(a.missing_col(0, 1));
        assert!(!a.missing_col(0, 4));
        assert!(!a.missing_col(0, 8));
        assert!(!a.missing_col(0, 100));
        let flags = a.find_noaln(0, 3).unwrap();
        assert_eq!(flags, vec![false, true, true, true, false, true, true, true]);
        let flags = a.find_noaln(0, 4).unwrap();
        assert_eq!(flags, vec![false, false, false, false, false, true, true, true]);
    }
}
