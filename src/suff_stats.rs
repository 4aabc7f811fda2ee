//! Sufficient statistics: the compressed view of an alignment.
//!
//! Each alignment column is summarized by a *column tuple*: the
//! characters of every row over `tuple_size` consecutive columns ending at
//! that column. Columns before the start of the alignment read as gaps.
//! Identical tuples are stored once with a multiplicity, and optionally
//! with per-category multiplicities.
//!
//! ## Ordered vs. unordered
//!
//! An *ordered* view also stores, for every column, the id of its tuple.
//! Only an ordered view can reproduce the explicit rows; an unordered view
//! supports aggregate statistics only.
//!
//! ## Tuple layout
//!
//! A tuple is stored row by row: the character of row `r` at `back`
//! columns before the described column lives at
//! `r * tuple_size + (tuple_size - 1 - back)`.

use std::collections::HashMap;

use crate::alphabet::GAP_CHAR;
use crate::model::Rows;

/// Unique column tuples with their multiplicities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SufficientStats {
    tuple_size: usize,
    nseqs: usize,
    tuples: Vec<Vec<u8>>,
    counts: Vec<usize>,
    /// Indexed `[category][tuple]`.
    cat_counts: Option<Vec<Vec<usize>>>,
    /// Tuple id of every column (ordered views only).
    tuple_idx: Option<Vec<usize>>,
}

impl SufficientStats {
    /// Compresses explicit rows.
    ///
    /// # Arguments
    /// * `rows` - The explicit alignment
    /// * `tuple_size` - Number of consecutive columns per tuple (at least 1)
    /// * `ordered` - Whether to keep the column-to-tuple index
    /// * `categories` - Column categories and the number of categories,
    ///   used to fill per-category counts
    pub fn from_rows(
        rows: &Rows,
        tuple_size: usize,
        ordered: bool,
        categories: Option<(&[usize], usize)>,
    ) -> Self {
        let tuple_size = tuple_size.max(1);
        let nseqs = rows.nrows();
        let mut index: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut tuples = Vec::new();
        let mut counts = Vec::new();
        let mut tuple_idx = Vec::with_capacity(if ordered { rows.len() } else { 0 });
        let mut col_tuple = Vec::with_capacity(rows.len());
        let mut key = vec![GAP_CHAR; nseqs * tuple_size];

        for col in 0..rows.len() {
            for row in 0..nseqs {
                for back in 0..tuple_size {
                    key[row * tuple_size + tuple_size - 1 - back] = if col >= back {
                        rows.get(row, col - back)
                    } else {
                        GAP_CHAR
                    };
                }
            }
            let t = match index.get(&key) {
                Some(&t) => t,
                None => {
                    let t = tuples.len();
                    tuples.push(key.clone());
                    counts.push(0);
                    index.insert(key.clone(), t);
                    t
                }
            };
            counts[t] += 1;
            col_tuple.push(t);
            if ordered {
                tuple_idx.push(t);
            }
        }

        let mut stats = Self {
            tuple_size,
            nseqs,
            tuples,
            counts,
            cat_counts: None,
            tuple_idx: None,
        };
        if let Some((cats, ncats)) = categories {
            stats.cat_counts = Some(Self::count_categories(&col_tuple, stats.tuples.len(), cats, ncats));
        }
        if ordered {
            stats.tuple_idx = Some(tuple_idx);
        }
        stats
    }

    /// Assembles a view from already-deduplicated parts (used by the SS reader).
    pub(crate) fn from_parts(
        nseqs: usize,
        tuple_size: usize,
        tuples: Vec<Vec<u8>>,
        counts: Vec<usize>,
        cat_counts: Option<Vec<Vec<usize>>>,
        tuple_idx: Option<Vec<usize>>,
    ) -> Self {
        Self {
            tuple_size,
            nseqs,
            tuples,
            counts,
            cat_counts,
            tuple_idx,
        }
    }

    fn count_categories(col_tuple: &[usize], ntuples: usize, cats: &[usize], ncats: usize) -> Vec<Vec<usize>> {
        let mut cat_counts = vec![vec![0; ntuples]; ncats];
        for (&t, &cat) in col_tuple.iter().zip(cats) {
            if let Some(per_tuple) = cat_counts.get_mut(cat) {
                per_tuple[t] += 1;
            }
        }
        cat_counts
    }

    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    pub fn nseqs(&self) -> usize {
        self.nseqs
    }

    pub fn ntuples(&self) -> usize {
        self.tuples.len()
    }

    /// Raw bytes of a tuple (see the module docs for the layout).
    pub fn tuple(&self, t: usize) -> &[u8] {
        &self.tuples[t]
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Per-category counts, indexed `[category][tuple]`.
    pub fn cat_counts(&self) -> Option<&[Vec<usize>]> {
        self.cat_counts.as_deref()
    }

    /// Column-to-tuple index, if ordered.
    pub fn tuple_idx(&self) -> Option<&[usize]> {
        self.tuple_idx.as_deref()
    }

    pub fn is_ordered(&self) -> bool {
        self.tuple_idx.is_some()
    }

    /// Number of columns summarized (sum of multiplicities).
    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Character of `row`, `back` columns before the column tuple `t` describes.
    #[inline]
    pub fn char_in_tuple(&self, t: usize, row: usize, back: usize) -> u8 {
        self.tuples[t][row * self.tuple_size + self.tuple_size - 1 - back]
    }

    /// Character at an alignment position (ordered views only).
    pub fn char_at(&self, row: usize, col: usize) -> Option<u8> {
        let t = *self.tuple_idx.as_ref()?.get(col)?;
        (row < self.nseqs).then(|| self.char_in_tuple(t, row, 0))
    }

    /// Reconstructs the explicit rows; `None` if the view is unordered.
    pub fn to_rows(&self) -> Option<Rows> {
        let idx = self.tuple_idx.as_ref()?;
        let rows = (0..self.nseqs)
            .map(|row| idx.iter().map(|&t| self.char_in_tuple(t, row, 0)).collect())
            .collect();
        Some(Rows::from_equal_rows(rows, idx.len()))
    }

    /// Recomputes per-category counts from column categories.
    ///
    /// Unordered views cannot attribute columns to categories and are
    /// left unchanged; returns whether counts were updated.
    pub fn update_categories(&mut self, categories: &[usize], ncats: usize) -> bool {
        match &self.tuple_idx {
            Some(idx) => {
                self.cat_counts = Some(Self::count_categories(idx, self.tuples.len(), categories, ncats));
                true
            }
            None => false,
        }
    }

    /// Drops per-category counts.
    pub fn clear_categories(&mut self) {
        self.cat_counts = None;
    }

    /// Rebuilds every tuple for a new row order.
    ///
    /// `new_to_old[i]` is the current row placed at position `i`, or `None`
    /// for a row filled with `missing`.
    pub fn reorder_rows(&mut self, new_to_old: &[Option<usize>], missing: u8) {
        let ts = self.tuple_size;
        for tuple in &mut self.tuples {
            let mut reordered = Vec::with_capacity(new_to_old.len() * ts);
            for source in new_to_old {
                match source {
                    Some(old) => reordered.extend_from_slice(&tuple[old * ts..(old + 1) * ts]),
                    None => reordered.extend(std::iter::repeat(missing).take(ts)),
                }
            }
            *tuple = reordered;
        }
        self.nseqs = new_to_old.len();
    }

    /// Keeps only the tuples for which `keep` returns true.
    ///
    /// The view becomes unordered. Returns the number of columns still
    /// summarized.
    pub fn retain_tuples<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Self, usize) -> bool,
    {
        let keep: Vec<bool> = (0..self.tuples.len()).map(|t| keep(self, t)).collect();
        let mut flags = keep.iter();
        self.tuples.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.counts.retain(|_| *flags.next().unwrap_or(&false));
        if let Some(cat_counts) = self.cat_counts.as_mut() {
            for per_tuple in cat_counts {
                let mut flags = keep.iter();
                per_tuple.retain(|_| *flags.next().unwrap_or(&false));
            }
        }
        if self.tuple_idx.take().is_some() {
            log::debug!("tuple filtering discards column order");
        }
        self.total_count()
    }

    /// Applies `f(row, char)` to every character, merging tuples that
    /// become identical.
    pub fn map_chars<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, u8) -> u8,
    {
        let ts = self.tuple_size;
        for tuple in &mut self.tuples {
            for (i, c) in tuple.iter_mut().enumerate() {
                *c = f(i / ts, *c);
            }
        }
        self.merge_duplicates();
    }

    /// Complements every character and reverses the column order.
    ///
    /// Only meaningful for single-column tuples; wider tuples would have
    /// their context on the wrong side.
    pub fn reverse_complement(&mut self, complement: impl Fn(u8) -> u8) {
        debug_assert_eq!(self.tuple_size, 1);
        for tuple in &mut self.tuples {
            for c in tuple.iter_mut() {
                *c = complement(*c);
            }
        }
        if let Some(idx) = self.tuple_idx.as_mut() {
            idx.reverse();
        }
        self.merge_duplicates();
    }

    fn merge_duplicates(&mut self) {
        let mut index: HashMap<Vec<u8>, usize> = HashMap::with_capacity(self.tuples.len());
        let mut remap = Vec::with_capacity(self.tuples.len());
        let mut tuples = Vec::with_capacity(self.tuples.len());
        let mut counts = Vec::with_capacity(self.tuples.len());
        for (tuple, &count) in self.tuples.drain(..).zip(&self.counts) {
            match index.get(&tuple) {
                Some(&t) => {
                    counts[t] += count;
                    remap.push(t);
                }
                None => {
                    let t = tuples.len();
                    index.insert(tuple.clone(), t);
                    tuples.push(tuple);
                    counts.push(count);
                    remap.push(t);
                }
            }
        }
        if tuples.len() == remap.len() {
            self.tuples = tuples;
            self.counts = counts;
            return;
        }
        if let Some(cat_counts) = self.cat_counts.as_mut() {
            for per_tuple in cat_counts.iter_mut() {
                let mut merged = vec![0; tuples.len()];
                for (old, &n) in per_tuple.iter().enumerate() {
                    merged[remap[old]] += n;
                }
                *per_tuple = merged;
            }
        }
        if let Some(idx) = self.tuple_idx.as_mut() {
            for t in idx.iter_mut() {
                *t = remap[*t];
            }
        }
        self.tuples = tuples;
        self.counts = counts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(seqs: &[&str]) -> Rows {
        Rows::new(seqs.iter().map(|s| s.as_bytes().to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_compress_single_columns() {
        let r = rows(&["ACAC", "AGAG"]);
        let ss = SufficientStats::from_rows(&r, 1, true, None);
        assert_eq!(ss.ntuples(), 2);
        assert_eq!(ss.counts(), &[2, 2]);
        assert_eq!(ss.tuple_idx(), Some(&[0, 1, 0, 1][..]));
        assert_eq!(ss.char_at(1, 1), Some(b'G'));
        assert_eq!(ss.to_rows().unwrap(), r);
    }

    #[test]
    fn test_tuple_context_reads_gaps_before_start() {
        let r = rows(&["AAA"]);
        let ss = SufficientStats::from_rows(&r, 2, true, None);
        // "-A" for column 0, "AA" for columns 1 and 2
        assert_eq!(ss.ntuples(), 2);
        assert_eq!(ss.char_in_tuple(0, 0, 1), GAP_CHAR);
        assert_eq!(ss.char_in_tuple(0, 0, 0), b'A');
        assert_eq!(ss.counts(), &[1, 2]);
        assert_eq!(ss.to_rows().unwrap(), r);
    }

    #[test]
    fn test_unordered_cannot_expand() {
        let r = rows(&["ACGT"]);
        let ss = SufficientStats::from_rows(&r, 1, false, None);
        assert!(!ss.is_ordered());
        assert!(ss.to_rows().is_none());
        assert_eq!(ss.char_at(0, 0), None);
        assert_eq!(ss.total_count(), 4);
    }

    #[test]
    fn test_category_counts() {
        let r = rows(&["AAC"]);
        let cats = [0, 1, 1];
        let ss = SufficientStats::from_rows(&r, 1, true, Some((&cats[..], 2)));
        let cc = ss.cat_counts().unwrap();
        assert_eq!(cc[0], vec![1, 0]);
        assert_eq!(cc[1], vec![1, 1]);
    }

    #[test]
    fn test_reorder_rows_with_missing() {
        let r = rows(&["AC", "GT"]);
        let mut ss = SufficientStats::from_rows(&r, 1, true, None);
        ss.reorder_rows(&[Some(1), None, Some(0)], b'*');
        assert_eq!(ss.nseqs(), 3);
        assert_eq!(ss.to_rows().unwrap(), rows(&["GT", "**", "AC"]));
    }

    #[test]
    fn test_map_chars_merges_tuples() {
        let r = rows(&["aA"]);
        let mut ss = SufficientStats::from_rows(&r, 1, true, Some((&[0, 1][..], 2)));
        assert_eq!(ss.ntuples(), 2);
        ss.map_chars(|_, c| c.to_ascii_uppercase());
        assert_eq!(ss.ntuples(), 1);
        assert_eq!(ss.counts(), &[2]);
        assert_eq!(ss.tuple_idx(), Some(&[0, 0][..]));
        assert_eq!(ss.cat_counts().unwrap()[1], vec![1]);
    }

    #[test]
    fn test_retain_tuples_drops_order() {
        let r = rows(&["A-C", "AGC"]);
        let mut ss = SufficientStats::from_rows(&r, 1, true, None);
        let remaining = ss.retain_tuples(|s, t| s.char_in_tuple(t, 0, 0) != GAP_CHAR);
        assert_eq!(remaining, 2);
        assert!(!ss.is_ordered());
    }
}
