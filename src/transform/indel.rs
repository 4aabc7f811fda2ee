//! Masking of indel artifacts.

use crate::alphabet::GAP_CHAR;
use crate::model::{Alignment, AlignmentResult};

use super::retain_categories;

/// Parameters of [`Alignment::indel_clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndelCleanOptions {
    /// Characters masked on each side of every indel.
    pub indel_border: usize,
    /// Minimum length of a gapless stretch between two indels.
    pub min_nbases: usize,
    /// Minimum number of real characters a column needs to be kept.
    pub min_nseqs: usize,
    /// Tuple size of the model the alignment is prepared for.
    pub tuple_size: usize,
    pub missing_char: u8,
}

impl Default for IndelCleanOptions {
    fn default() -> Self {
        Self {
            indel_border: 3,
            min_nbases: 15,
            min_nseqs: 2,
            tuple_size: 1,
            missing_char: b'*',
        }
    }
}

/// Masks the characters next to each indel in one row, and whole
/// gapless stretches shorter than `min_nbases` between two indels.
fn mask_row(row: &mut [u8], opts: &IndelCleanOptions) {
    let len = row.len();
    let border = opts.indel_border;
    let md = opts.missing_char;
    let mut i = 0;
    let mut first_base: Option<usize> = None;
    loop {
        while i < len && row[i] != GAP_CHAR {
            i += 1;
        }
        if i == len {
            break;
        }
        match first_base {
            Some(fb) if i - fb < opts.min_nbases => {
                for c in row.iter_mut().take(i).skip(fb + border) {
                    *c = md;
                }
            }
            _ => {
                for k in 1..=border.min(i) {
                    if row[i - k] == GAP_CHAR {
                        break;
                    }
                    row[i - k] = md;
                }
            }
        }

        while i < len && row[i] == GAP_CHAR {
            i += 1;
        }
        if i == len {
            break;
        }
        for c in row[i..].iter_mut().take(border) {
            if *c == GAP_CHAR {
                break;
            }
            *c = md;
        }
        first_base = Some(i);
    }
}

impl Alignment {
    /// Cleans indel artifacts, ignoring reading frame.
    ///
    /// Characters adjacent to indels and short gapless stretches become
    /// missing data. Columns left with fewer than `min_nseqs` real
    /// characters are emptied; runs of empty columns collapse to
    /// `tuple_size - 1` columns of missing data (removed entirely at
    /// either end of the alignment).
    pub fn indel_clean(&mut self, opts: &IndelCleanOptions) -> AlignmentResult<()> {
        let md = opts.missing_char;
        let rows = self.rows_mut()?;
        for r in 0..rows.nrows() {
            mask_row(rows.row_mut(r), opts);
        }

        let nseqs = rows.nrows();
        let empty: Vec<bool> = (0..rows.len())
            .map(|col| {
                let nbases = (0..nseqs)
                    .filter(|&r| {
                        let c = rows.get(r, col);
                        c != GAP_CHAR && c != md
                    })
                    .count();
                nbases < opts.min_nseqs
            })
            .collect();

        let max_run = opts.tuple_size.saturating_sub(1);
        let mut keep = vec![false; empty.len()];
        let mut nempty = 0;
        let mut nkept = 0;
        for (col, &is_empty) in empty.iter().enumerate() {
            nempty = if is_empty { nempty + 1 } else { 0 };
            if nempty <= max_run && !(is_empty && nkept == 0) {
                keep[col] = true;
                nkept += 1;
            }
        }
        for col in (0..keep.len()).rev() {
            if !empty[col] {
                break;
            }
            keep[col] = false;
        }

        for r in 0..nseqs {
            let row = rows.row_mut(r);
            for (c, _) in row.iter_mut().zip(&empty).filter(|(_, e)| **e) {
                *c = md;
            }
        }
        rows.retain_columns(&keep);
        self.length = rows.len();
        retain_categories(&mut self.categories, &keep);
        Ok(())
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

    fn rows_of(a: &Alignment) -> Vec<String> {
        let view = a.char_view().unwrap();
        (0..a.nseqs())
            .map(|r| String::from_utf8(view.row_vec(r, a.length())).unwrap())
            .collect()
    }

    fn opts(indel_border: usize, min_nbases: usize, min_nseqs: usize, tuple_size: usize) -> IndelCleanOptions {
        IndelCleanOptions {
            indel_border,
            min_nbases,
            min_nseqs,
            tuple_size,
            missing_char: b'*',
        }
    }

    #[test]
    fn test_indel_border() {
        let mut a = aln(&["ACGTACGT--ACGTACGT", "ACGTACGTTTACGTACGT"]);
        a.indel_clean(&opts(2, 1, 1, 1)).unwrap();
        assert_eq!(rows_of(&a)[0], "ACGTAC**--**GTACGT");
        assert_eq!(rows_of(&a)[1], "ACGTACGTTTACGTACGT");
    }

    #[test]
    fn test_short_stretch_masked() {
        let mut a = aln(&["AC-GT-ACGTAC", "ACGGTTACGTAC"]);
        a.indel_clean(&opts(1, 3, 1, 1)).unwrap();
        assert_eq!(rows_of(&a)[0], "A*-**-*CGTAC");
    }

    #[test]
    fn test_empty_columns_collapse() {
        let mut a = aln(&["AC--GT", "ACTTGT"]);
        a.set_categories(vec![0, 1, 2, 3, 4, 5], 6).unwrap();
        a.indel_clean(&opts(0, 0, 2, 2)).unwrap();
        assert_eq!(rows_of(&a), vec!["AC*GT", "AC*GT"]);
        assert_eq!(a.categories().unwrap(), &[0, 1, 2, 4, 5]);

        let mut a = aln(&["AC--GT", "ACTTGT"]);
        a.indel_clean(&opts(0, 0, 2, 1)).unwrap();
        assert_eq!(rows_of(&a), vec!["ACGT", "ACGT"]);
    }

    #[test]
    fn test_empty_columns_at_ends_removed() {
        let mut a = aln(&["--ACGT--", "AAACGTAA"]);
        a.indel_clean(&opts(0, 0, 2, 3)).unwrap();
        assert_eq!(rows_of(&a), vec!["ACGT", "ACGT"]);
    }
}
