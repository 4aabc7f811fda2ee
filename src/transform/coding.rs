//! Frame-aware cleaning of coding alignments.
//!
//! The reference row must start with a start codon and end with a stop
//! codon (gaps inside either codon are allowed). The alignment is then cut
//! into gapless, in-frame blocks of whole codons; blocks are kept when
//! they are long enough, when every row shares the reference's start and
//! stop codons at the ends, and when the gaps removed since the previous
//! kept block are a multiple of three in every row relative to the
//! reference. The first in-frame stop codon truncates the alignment.
//! A truncation (stop or frame shift) before the last 20% of the coding
//! span rejects the alignment.

use crate::alphabet::GAP_CHAR;
use crate::genetic_code::GeneticCode;
use crate::model::{Alignment, AlignmentError, AlignmentResult, CharView};

use super::retain_categories;

/// Parameters of [`Alignment::coding_clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingCleanOptions {
    /// Smallest gapless block, in codons, worth keeping.
    pub min_ncodons: usize,
    /// Keep the final stop codon in the cleaned alignment.
    pub keep_stop_codons: bool,
}

impl Default for CodingCleanOptions {
    fn default() -> Self {
        Self {
            min_ncodons: 1,
            keep_stop_codons: true,
        }
    }
}

struct CodonScan<'a> {
    view: CharView<'a>,
    nseqs: usize,
    length: usize,
    code: &'a GeneticCode,
}

impl CodonScan<'_> {
    fn codon(&self, row: usize, pos: usize) -> [u8; 3] {
        let mut codon = [GAP_CHAR; 3];
        for (k, slot) in codon.iter_mut().enumerate() {
            if pos + k < self.length {
                *slot = self.view.get(row, pos + k);
            }
        }
        codon
    }

    /// Positions past the end read as non-gaps.
    fn is_gap(&self, row: usize, pos: usize) -> bool {
        pos < self.length && self.view.get(row, pos) == GAP_CHAR
    }

    fn column_has_gap(&self, pos: usize) -> bool {
        (0..self.nseqs).any(|r| self.is_gap(r, pos))
    }

    fn all_start(&self, pos: usize) -> bool {
        (0..self.nseqs).all(|r| GeneticCode::is_start(&self.codon(r, pos)))
    }

    fn all_stop(&self, pos: usize) -> bool {
        (0..self.nseqs).all(|r| self.code.is_stop(&self.codon(r, pos)))
    }

    fn any_stop(&self, pos: usize) -> bool {
        (0..self.nseqs).any(|r| self.code.is_stop(&self.codon(r, pos)))
    }
}

impl Alignment {
    /// Cleans a coding alignment against the reference row `refseq` (0-based).
    ///
    /// Only the retained blocks of whole codons are kept, so the resulting
    /// length is a multiple of three. On rejection, the alignment is left
    /// untouched and the error carries every reason found.
    pub fn coding_clean(
        &mut self,
        refseq: usize,
        opts: &CodingCleanOptions,
        code: &GeneticCode,
    ) -> AlignmentResult<()> {
        self.check_row(refseq)?;
        let scan = CodonScan {
            view: self.char_view()?,
            nseqs: self.nseqs(),
            length: self.length,
            code,
        };
        let keep_stop = opts.keep_stop_codons;
        let mut errors = String::new();

        // start codon: first three non-gap characters of the reference
        let mut start = [GAP_CHAR; 3];
        let mut beg = None;
        let mut i = 0;
        let mut found = 0;
        while found < 3 {
            while i < scan.length && scan.is_gap(refseq, i) {
                i += 1;
            }
            if i == scan.length {
                break;
            }
            if found == 0 {
                beg = Some(i);
            }
            start[found] = scan.view.get(refseq, i);
            found += 1;
            i += 1;
        }
        if found < 3 || i == scan.length || !GeneticCode::is_start(&start) {
            errors.push_str("Reference sequence does not begin with start codon.  ");
        }
        let beg = beg.unwrap_or(0);

        // stop codon: last three non-gap characters; `end` is the last
        // column of the coding span
        let mut stop = [GAP_CHAR; 3];
        let mut end = beg;
        let mut i = scan.length.saturating_sub(1);
        let lowest: isize = if keep_stop { 0 } else { -1 };
        let mut pos: isize = 2;
        while pos >= lowest {
            while i > beg && scan.is_gap(refseq, i) {
                i -= 1;
            }
            if i <= beg {
                break;
            }
            if (pos == 2 && keep_stop) || pos == -1 {
                end = i;
            }
            if pos >= 0 {
                stop[pos as usize] = scan.view.get(refseq, i);
                i -= 1;
            }
            pos -= 1;
        }
        if i <= beg || !code.is_stop(&stop) {
            errors.push_str("Reference sequence does not end with stop codon.");
        }
        if !errors.is_empty() {
            return Err(AlignmentError::CodingRejected(errors));
        }

        let mut blocks: Vec<(usize, usize)> = Vec::new();
        let mut ngaps = vec![0usize; scan.nseqs];
        let mut trunc: Option<isize> = None;
        let mut frame = 0;
        let mut i = beg;
        while i <= end {
            // next gapless, in-frame column of codons; gaps are counted
            // per row along the way
            let mut gapless = true;
            while i <= end {
                for (r, n) in ngaps.iter_mut().enumerate() {
                    if scan.is_gap(r, i) {
                        *n += 1;
                        gapless = false;
                    }
                }
                if gapless && frame == 2 {
                    break;
                }
                i += 1;
                if !scan.is_gap(refseq, i) {
                    frame += 1;
                    if frame == 3 {
                        frame = 0;
                        gapless = true;
                    }
                }
            }
            if i > end {
                break;
            }
            let blk_beg = i - 2;

            i += 1;
            while i <= end && !scan.column_has_gap(i) {
                i += 1;
            }
            let blk_size = (i - blk_beg) / 3;
            let mut blk_end = blk_beg + blk_size * 3 - 1;
            i = blk_end + 1;
            frame = if scan.is_gap(refseq, i) { 2 } else { 0 };

            if blk_size < opts.min_ncodons {
                continue;
            }
            if blk_beg == beg && !scan.all_start(blk_beg) {
                continue;
            }
            if keep_stop && blk_end == end && !scan.all_stop(blk_end - 2) {
                continue;
            }

            if let Some(&(_, prev_end)) = blocks.last() {
                let ref_phase = ngaps[refseq] % 3;
                if ngaps.iter().any(|n| n % 3 != ref_phase) {
                    trunc = Some(prev_end as isize + 1);
                }
            }

            if trunc.is_none() {
                let mut j = blk_beg;
                while j + 2 <= blk_end {
                    if keep_stop && j + 2 == end {
                        break;
                    }
                    if scan.any_stop(j) {
                        let cut = if keep_stop { j as isize + 2 } else { j as isize - 1 };
                        trunc = Some(cut);
                        if cut >= 0 {
                            blk_end = cut as usize;
                        }
                        break;
                    }
                    j += 3;
                }
            }

            if trunc.map_or(true, |t| t > blk_beg as isize) {
                blocks.push((blk_beg, blk_end));
            }
            if trunc.is_some() {
                break;
            }
            ngaps.fill(0);
        }

        if blocks.is_empty() {
            errors.push_str("Nothing left after cleaning.");
        }
        if let Some(t) = trunc {
            let limit = beg as f64 + (end - beg + 1) as f64 * 0.8;
            if (t as f64) < limit {
                errors.push_str(&format!(
                    "In-frame stop codon or frame shift not in last 20% of alignment.  See approx. position {}.",
                    t + 1
                ));
            }
        }
        if !errors.is_empty() {
            return Err(AlignmentError::CodingRejected(errors));
        }

        let mut keep = vec![false; self.length];
        for &(b, e) in &blocks {
            keep[b..=e].fill(true);
        }
        log::debug!(
            "Coding clean kept {} block(s), {} of {} columns",
            blocks.len(),
            keep.iter().filter(|&&k| k).count(),
            self.length
        );
        let rows = self.rows_mut()?;
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

    fn clean(a: &mut Alignment) -> AlignmentResult<()> {
        a.coding_clean(0, &CodingCleanOptions::default(), &GeneticCode::default())
    }

    #[test]
    fn test_single_gene_kept_whole() {
        let mut a = aln(&["ATGAAATAA"]);
        clean(&mut a).unwrap();
        assert_eq!(a.length(), 9);
        assert_eq!(rows_of(&a), vec!["ATGAAATAA"]);
    }

    #[test]
    fn test_missing_start_rejected_untouched() {
        let mut a = aln(&["CTGAAATAA", "ATGAAATAA"]);
        let err = clean(&mut a).unwrap_err();
        match err {
            AlignmentError::CodingRejected(msg) => assert!(msg.contains("start codon")),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(rows_of(&a), vec!["CTGAAATAA", "ATGAAATAA"]);
    }

    #[test]
    fn test_missing_stop_rejected() {
        let mut a = aln(&["ATGAAACCC"]);
        let err = clean(&mut a).unwrap_err();
        assert!(matches!(err, AlignmentError::CodingRejected(msg) if msg.contains("stop codon")));
    }

    #[test]
    fn test_codon_gap_block_removed() {
        let mut a = aln(&["ATGAAA---CCCTAA", "ATGAAAGGGCCCTAA"]);
        a.set_categories((0..15).map(|c| c % 3).collect(), 3).unwrap();
        clean(&mut a).unwrap();
        assert_eq!(rows_of(&a), vec!["ATGAAACCCTAA", "ATGAAACCCTAA"]);
        assert_eq!(a.categories().unwrap().len(), 12);
    }

    #[test]
    fn test_early_frame_shift_rejected() {
        let mut a = aln(&["ATGAAA-CCCTAA", "ATGAAAGCCCTAA"]);
        let err = clean(&mut a).unwrap_err();
        assert!(matches!(err, AlignmentError::CodingRejected(msg) if msg.contains("position 7.")));
        assert_eq!(a.length(), 13);
    }

    #[test]
    fn test_late_frame_shift_truncates() {
        // row 1 loses one base inside the ninth codon, past 80% of the span
        let body = "AAA".repeat(8);
        let reference = format!("ATG{}CCCTAA", body);
        let shifted = format!("ATG{}C-CTAA", body);
        let mut a = aln(&[&reference, &shifted]);
        let cats: Vec<usize> = (0..33).map(|c| c % 3).collect();
        a.set_categories(cats.clone(), 3).unwrap();

        clean(&mut a).unwrap();

        let kept = format!("ATG{}", body);
        assert_eq!(a.length(), 27);
        assert_eq!(rows_of(&a), vec![kept.clone(), kept]);
        assert_eq!(a.categories().unwrap(), &cats[..27]);
    }

    #[test]
    fn test_early_in_frame_stop_rejected() {
        let mut a = aln(&["ATGAAAAAAAAAAAAAAAAAATAA", "ATGTAAAAAAAAAAAAAAAAATAA"]);
        let err = clean(&mut a).unwrap_err();
        assert!(matches!(err, AlignmentError::CodingRejected(msg) if msg.contains("position 6.")));
    }

    #[test]
    fn test_late_in_frame_stop_truncates() {
        let mut a = aln(&["ATGAAAAAAAAAAAAAAAAAATAA", "ATGAAAAAAAAAAAAAAATAATAA"]);
        clean(&mut a).unwrap();
        assert_eq!(a.length(), 21);
        assert_eq!(rows_of(&a)[1], "ATGAAAAAAAAAAAAAAATAA");
    }

    #[test]
    fn test_drop_stop_codon() {
        let mut a = aln(&["ATGAAACCCTAA"]);
        let opts = CodingCleanOptions {
            keep_stop_codons: false,
            ..Default::default()
        };
        a.coding_clean(0, &opts, &GeneticCode::default()).unwrap();
        assert_eq!(rows_of(&a), vec!["ATGAAACCC"]);
    }
}
