//! Alignment data model.
//!
//! This module contains the core data structures:
//! - [`Rows`]: the explicit character matrix
//! - [`Representation`]: explicit rows, compressed sufficient statistics, or both
//! - [`Alignment`]: rows plus names, alphabet, and column categories
//! - [`CharView`]: uniform read access to either representation
//!
//! ## Dual representation
//!
//! When both views are present they encode the same data. Every
//! operation that edits characters goes through [`Alignment::rows_mut`],
//! which materializes rows from an ordered compressed view if needed and
//! then drops the compressed view.

use std::ops::Range;

use thiserror::Error;

use crate::alphabet::{Alphabet, AlphabetError, GAP_CHAR};
use crate::suff_stats::SufficientStats;

/// Errors raised by alignment construction and transforms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("Alphabet error: {0}")]
    Alphabet(#[from] AlphabetError),

    #[error("Row {row} has length {found}, expected {expected}")]
    RowLength { row: usize, expected: usize, found: usize },

    #[error("Got {names} names for {rows} rows")]
    NameCount { names: usize, rows: usize },

    #[error("Compressed view describes {found} sequences, expected {expected}")]
    StatsSeqCount { expected: usize, found: usize },

    #[error("Compressed view describes {found} columns, expected {expected}")]
    StatsLength { expected: usize, found: usize },

    #[error("Operation requires explicit rows or an ordered compressed view")]
    Unordered,

    #[error("No compressed view available")]
    NoCompressedView,

    #[error("Tuple size must be at least 1")]
    InvalidTupleSize,

    #[error("Sequence index {row} out of range (alignment has {nseqs} sequences)")]
    RowOutOfRange { row: usize, nseqs: usize },

    #[error("Column range {start}..{end} is empty or exceeds alignment length {length}")]
    BadColumnRange { start: usize, end: usize, length: usize },

    #[error("Category array has {found} entries, expected {expected}")]
    CategoryLength { expected: usize, found: usize },

    #[error("Category {cat} at column {col} is not below {ncats}")]
    InvalidCategory { col: usize, cat: usize, ncats: usize },

    #[error("Alignment has no column categories")]
    NoCategories,

    #[error("Cannot combine alignments with {left} and {right} sequences")]
    SeqCountMismatch { left: usize, right: usize },

    #[error("Name '{0}' missing from reorder list")]
    MissingFromOrder(String),

    #[error("Name '{0}' listed more than once in reorder list")]
    DuplicateInOrder(String),

    #[error("No sequence named '{0}'")]
    UnknownSequence(String),

    #[error("Unrecognized character in alignment ('{0}')")]
    UnrecognizedChar(char),

    #[error("Sequence index {index} is out of bounds (1..={nseqs})")]
    SeqIndexOutOfRange { index: i64, nseqs: usize },

    #[error("Feature set must be grouped before reverse complementing groups")]
    FeaturesNotGrouped,

    #[error("Group {start}..={end} exceeds alignment length {length}")]
    GroupOutOfRange { start: i64, end: i64, length: usize },

    #[error("Alignment rejected: {0}")]
    CodingRejected(String),
}

/// Result type for alignment operations.
pub type AlignmentResult<T> = Result<T, AlignmentError>;

/// Explicit character matrix: one owned buffer per row, all of the same length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rows {
    rows: Vec<Vec<u8>>,
    len: usize,
}

impl Rows {
    /// Wraps row buffers, checking they all have the same length.
    pub fn new(rows: Vec<Vec<u8>>) -> AlignmentResult<Self> {
        let len = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != len) {
            return Err(AlignmentError::RowLength {
                row,
                expected: len,
                found: r.len(),
            });
        }
        Ok(Self { rows, len })
    }

    /// Wraps rows already known to have length `len`.
    pub(crate) fn from_equal_rows(rows: Vec<Vec<u8>>, len: usize) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == len));
        Self { rows, len }
    }

    /// `nrows` rows of `len` copies of `c`.
    pub fn filled(nrows: usize, len: usize, c: u8) -> Self {
        Self {
            rows: vec![vec![c; len]; nrows],
            len,
        }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[u8] {
        &self.rows[i]
    }

    /// Mutable view of one row. The length cannot change through it.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [u8] {
        &mut self.rows[i]
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.rows[row][col]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Appends the columns of `other` to the right of these rows.
    pub fn append(&mut self, other: &Rows) -> AlignmentResult<()> {
        if other.nrows() != self.nrows() {
            return Err(AlignmentError::SeqCountMismatch {
                left: self.nrows(),
                right: other.nrows(),
            });
        }
        for (row, extra) in self.rows.iter_mut().zip(&other.rows) {
            row.reserve(extra.len());
            row.extend_from_slice(extra);
        }
        self.len += other.len;
        Ok(())
    }

    /// Keeps the columns whose flag is true, preserving order.
    pub fn retain_columns(&mut self, keep: &[bool]) {
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.len = keep.iter().take(self.len).filter(|&&k| k).count();
    }

    /// Copies a column range of the selected rows.
    pub fn select(&self, rows: &[usize], cols: Range<usize>) -> Rows {
        let len = cols.len();
        Rows {
            rows: rows.iter().map(|&r| self.rows[r][cols.clone()].to_vec()).collect(),
            len,
        }
    }

    /// Builds new rows whose column `j` is column `order[j]` of these rows.
    pub fn gather_columns(&self, order: &[usize]) -> Rows {
        Rows {
            rows: self
                .rows
                .iter()
                .map(|row| order.iter().map(|&c| row[c]).collect())
                .collect(),
            len: order.len(),
        }
    }

    /// Replaces the row order; `None` entries become rows of `fill`.
    pub fn reorder(&mut self, new_to_old: &[Option<usize>], fill: u8) {
        let mut old = std::mem::take(&mut self.rows);
        self.rows = new_to_old
            .iter()
            .map(|source| match source {
                Some(i) => std::mem::take(&mut old[*i]),
                None => vec![fill; self.len],
            })
            .collect();
    }

    pub fn into_inner(self) -> Vec<Vec<u8>> {
        self.rows
    }
}

/// How the characters of an alignment are currently held.
#[derive(Debug, Clone)]
pub enum Representation {
    Explicit(Rows),
    Compressed(SufficientStats),
    Both(Rows, SufficientStats),
}

impl Representation {
    pub fn rows(&self) -> Option<&Rows> {
        match self {
            Representation::Explicit(rows) | Representation::Both(rows, _) => Some(rows),
            Representation::Compressed(_) => None,
        }
    }

    pub fn stats(&self) -> Option<&SufficientStats> {
        match self {
            Representation::Compressed(stats) | Representation::Both(_, stats) => Some(stats),
            Representation::Explicit(_) => None,
        }
    }

    fn stats_mut(&mut self) -> Option<&mut SufficientStats> {
        match self {
            Representation::Compressed(stats) | Representation::Both(_, stats) => Some(stats),
            Representation::Explicit(_) => None,
        }
    }
}

/// Read-only character access that does not care which view is materialized.
///
/// Obtained once per operation through [`Alignment::char_view`]; lookups
/// are then infallible.
#[derive(Debug, Clone, Copy)]
pub enum CharView<'a> {
    Rows(&'a Rows),
    Stats(&'a SufficientStats),
}

impl CharView<'_> {
    /// Character at `row`, `col`. Panics if out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        match self {
            CharView::Rows(rows) => rows.get(row, col),
            CharView::Stats(stats) => {
                let t = stats.tuple_idx().map_or(0, |idx| idx[col]);
                stats.char_in_tuple(t, row, 0)
            }
        }
    }

    /// Collects one row as an owned buffer.
    pub fn row_vec(&self, row: usize, len: usize) -> Vec<u8> {
        match self {
            CharView::Rows(rows) => rows.row(row).to_vec(),
            CharView::Stats(_) => (0..len).map(|col| self.get(row, col)).collect(),
        }
    }
}

/// A multiple sequence alignment.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub(crate) names: Vec<String>,
    pub(crate) length: usize,
    pub(crate) alphabet: Alphabet,
    pub(crate) repr: Representation,
    pub(crate) categories: Option<Vec<usize>>,
    pub(crate) ncats: Option<usize>,
    /// Shift applied when reporting positions in an external numbering.
    pub idx_offset: i64,
    /// Per-row flag marking rows used for inference.
    pub is_informative: Option<Vec<bool>>,
}

impl Alignment {
    /// Creates an alignment from explicit rows.
    ///
    /// # Arguments
    /// * `names` - One name per row
    /// * `rows` - Row buffers, all of the same length
    /// * `alphabet` - Alphabet symbols; `None` for the default DNA alphabet
    ///
    /// # Examples
    /// ```
    /// use msakit::model::Alignment;
    ///
    /// let aln = Alignment::new(
    ///     vec!["human".into(), "mouse".into()],
    ///     vec![b"ACG-T".to_vec(), b"AC-GT".to_vec()],
    ///     None,
    /// ).unwrap();
    /// assert_eq!(aln.length(), 5);
    /// ```
    pub fn new(names: Vec<String>, rows: Vec<Vec<u8>>, alphabet: Option<&str>) -> AlignmentResult<Self> {
        let alphabet = match alphabet {
            Some(symbols) => Alphabet::new(symbols)?,
            None => Alphabet::default(),
        };
        Self::with_alphabet(names, rows, &alphabet)
    }

    /// Creates an alignment from explicit rows with an existing alphabet.
    pub fn with_alphabet(names: Vec<String>, rows: Vec<Vec<u8>>, alphabet: &Alphabet) -> AlignmentResult<Self> {
        if names.len() != rows.len() {
            return Err(AlignmentError::NameCount {
                names: names.len(),
                rows: rows.len(),
            });
        }
        let rows = Rows::new(rows)?;
        Ok(Self::from_rows(names, rows, alphabet.clone()))
    }

    pub(crate) fn from_rows(names: Vec<String>, rows: Rows, alphabet: Alphabet) -> Self {
        Self {
            names,
            length: rows.len(),
            alphabet,
            repr: Representation::Explicit(rows),
            categories: None,
            ncats: None,
            idx_offset: 0,
            is_informative: None,
        }
    }

    /// Creates a compressed-only alignment.
    pub fn from_stats(
        names: Vec<String>,
        stats: SufficientStats,
        length: usize,
        alphabet: &Alphabet,
    ) -> AlignmentResult<Self> {
        if stats.nseqs() != names.len() {
            return Err(AlignmentError::StatsSeqCount {
                expected: names.len(),
                found: stats.nseqs(),
            });
        }
        let described = stats.tuple_idx().map_or(stats.total_count(), <[usize]>::len);
        if described != length {
            return Err(AlignmentError::StatsLength {
                expected: length,
                found: described,
            });
        }
        Ok(Self {
            names,
            length,
            alphabet: alphabet.clone(),
            repr: Representation::Compressed(stats),
            categories: None,
            ncats: None,
            idx_offset: 0,
            is_informative: None,
        })
    }

    /// Deep copy; with `stats_only` the copy holds only the compressed view.
    pub fn create_copy(&self, stats_only: bool) -> AlignmentResult<Self> {
        let mut copy = self.clone();
        if stats_only {
            let stats = self.stats().ok_or(AlignmentError::NoCompressedView)?.clone();
            copy.repr = Representation::Compressed(stats);
        }
        Ok(copy)
    }

    pub fn nseqs(&self) -> usize {
        self.names.len()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, row: usize) -> &str {
        &self.names[row]
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn representation(&self) -> &Representation {
        &self.repr
    }

    pub fn rows(&self) -> Option<&Rows> {
        self.repr.rows()
    }

    pub fn stats(&self) -> Option<&SufficientStats> {
        self.repr.stats()
    }

    pub fn categories(&self) -> Option<&[usize]> {
        self.categories.as_deref()
    }

    /// Number of categories, including background.
    pub fn ncats(&self) -> Option<usize> {
        self.ncats
    }

    /// Index of the first row with the given name.
    pub fn seq_idx(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub(crate) fn check_row(&self, row: usize) -> AlignmentResult<()> {
        if row < self.nseqs() {
            Ok(())
        } else {
            Err(AlignmentError::RowOutOfRange {
                row,
                nseqs: self.nseqs(),
            })
        }
    }

    /// Read access to the characters, whichever view is materialized.
    ///
    /// Fails for compressed-only alignments whose view is unordered.
    pub fn char_view(&self) -> AlignmentResult<CharView<'_>> {
        match &self.repr {
            Representation::Explicit(rows) | Representation::Both(rows, _) => Ok(CharView::Rows(rows)),
            Representation::Compressed(stats) if stats.is_ordered() => Ok(CharView::Stats(stats)),
            Representation::Compressed(_) => Err(AlignmentError::Unordered),
        }
    }

    /// Character at `row`, `col`; `None` if out of range or not recoverable.
    pub fn get_char(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.nseqs() || col >= self.length {
            return None;
        }
        self.char_view().ok().map(|view| view.get(row, col))
    }

    /// Number of non-gap characters in a row.
    pub fn seqlen(&self, row: usize) -> AlignmentResult<usize> {
        self.check_row(row)?;
        let view = self.char_view()?;
        Ok((0..self.length).filter(|&col| view.get(row, col) != GAP_CHAR).count())
    }

    /// Mutable explicit rows.
    ///
    /// Materializes rows from an ordered compressed view if needed, then
    /// drops the compressed view: after this call the alignment is
    /// explicit-only.
    pub fn rows_mut(&mut self) -> AlignmentResult<&mut Rows> {
        let repr = std::mem::replace(&mut self.repr, Representation::Explicit(Rows::default()));
        let rows = match repr {
            Representation::Explicit(rows) => rows,
            Representation::Both(rows, _) => {
                log::debug!("Dropping compressed view before editing rows");
                rows
            }
            Representation::Compressed(stats) => match stats.to_rows() {
                Some(rows) => rows,
                None => {
                    self.repr = Representation::Compressed(stats);
                    return Err(AlignmentError::Unordered);
                }
            },
        };
        self.repr = Representation::Explicit(rows);
        let Representation::Explicit(rows) = &mut self.repr else {
            unreachable!("representation was just set to explicit");
        };
        Ok(rows)
    }

    /// Ensures explicit rows exist, keeping any compressed view.
    pub fn materialize(&mut self) -> AlignmentResult<()> {
        if let Representation::Compressed(stats) = &self.repr {
            let rows = stats.to_rows().ok_or(AlignmentError::Unordered)?;
            let repr = std::mem::replace(&mut self.repr, Representation::Explicit(Rows::default()));
            if let Representation::Compressed(stats) = repr {
                self.repr = Representation::Both(rows, stats);
            }
        }
        Ok(())
    }

    /// Builds (or rebuilds) the compressed view, keeping explicit rows.
    ///
    /// An existing view with the same tuple size and ordering is kept.
    pub fn build_stats(&mut self, tuple_size: usize, ordered: bool) -> AlignmentResult<()> {
        if tuple_size == 0 {
            return Err(AlignmentError::InvalidTupleSize);
        }
        if let Some(stats) = self.stats() {
            if stats.tuple_size() == tuple_size && stats.is_ordered() == ordered {
                return Ok(());
            }
        }
        self.materialize()?;
        let rows = match std::mem::replace(&mut self.repr, Representation::Explicit(Rows::default())) {
            Representation::Explicit(rows) | Representation::Both(rows, _) => rows,
            Representation::Compressed(stats) => {
                self.repr = Representation::Compressed(stats);
                return Err(AlignmentError::Unordered);
            }
        };
        let cats = match (&self.categories, self.ncats) {
            (Some(cats), Some(ncats)) => Some((cats.as_slice(), ncats)),
            _ => None,
        };
        let stats = SufficientStats::from_rows(&rows, tuple_size, ordered, cats);
        self.repr = Representation::Both(rows, stats);
        Ok(())
    }

    /// Drops the explicit rows, keeping only the compressed view.
    pub fn drop_rows(&mut self) -> AlignmentResult<()> {
        match std::mem::replace(&mut self.repr, Representation::Explicit(Rows::default())) {
            Representation::Both(_, stats) | Representation::Compressed(stats) => {
                self.repr = Representation::Compressed(stats);
                Ok(())
            }
            Representation::Explicit(rows) => {
                self.repr = Representation::Explicit(rows);
                Err(AlignmentError::NoCompressedView)
            }
        }
    }

    /// Drops the compressed view if explicit rows are present.
    pub fn drop_stats(&mut self) {
        if let Representation::Both(..) = self.repr {
            if let Representation::Both(rows, _) =
                std::mem::replace(&mut self.repr, Representation::Explicit(Rows::default()))
            {
                self.repr = Representation::Explicit(rows);
            }
        }
    }

    /// Rebuilds a compressed view that existed before an edit.
    pub(crate) fn rebuild_stats(&mut self, previous: Option<(usize, bool)>) -> AlignmentResult<()> {
        match previous {
            Some((tuple_size, ordered)) => self.build_stats(tuple_size, ordered),
            None => Ok(()),
        }
    }

    /// Tuple size and ordering of the current compressed view.
    pub(crate) fn stats_shape(&self) -> Option<(usize, bool)> {
        self.stats().map(|s| (s.tuple_size(), s.is_ordered()))
    }

    /// Attaches column categories.
    pub fn set_categories(&mut self, categories: Vec<usize>, ncats: usize) -> AlignmentResult<()> {
        if categories.len() != self.length {
            return Err(AlignmentError::CategoryLength {
                expected: self.length,
                found: categories.len(),
            });
        }
        if let Some((col, &cat)) = categories.iter().enumerate().find(|&(_, &c)| c >= ncats) {
            return Err(AlignmentError::InvalidCategory { col, cat, ncats });
        }
        self.categories = Some(categories);
        self.ncats = Some(ncats);
        self.refresh_category_counts();
        Ok(())
    }

    pub fn clear_categories(&mut self) {
        self.categories = None;
        self.ncats = None;
        if let Some(stats) = self.repr.stats_mut() {
            stats.clear_categories();
        }
    }

    /// Brings the compressed view's per-category counts up to date.
    pub(crate) fn refresh_category_counts(&mut self) {
        let (Some(cats), Some(ncats)) = (&self.categories, self.ncats) else {
            return;
        };
        if let Some(stats) = self.repr.stats_mut() {
            if !stats.update_categories(cats, ncats) {
                log::warn!("Compressed view is unordered; category counts not updated");
            }
        }
    }

    /// Converts all characters to uppercase, folding the alphabet accordingly.
    pub fn toupper(&mut self) {
        self.alphabet.to_uppercase();
        match &mut self.repr {
            Representation::Explicit(rows) => uppercase_rows(rows),
            Representation::Compressed(stats) => stats.map_chars(|_, c| c.to_ascii_uppercase()),
            Representation::Both(rows, stats) => {
                uppercase_rows(rows);
                stats.map_chars(|_, c| c.to_ascii_uppercase());
            }
        }
    }

    /// Removes a symbol from the alphabet; characters are left as they are.
    pub fn remove_symbol(&mut self, c: u8) -> bool {
        self.alphabet.remove_symbol(c)
    }

    /// Replaces the alphabet symbols, keeping missing-data characters.
    pub fn reset_alphabet(&mut self, symbols: &str) -> AlignmentResult<()> {
        self.alphabet.reset(symbols)?;
        Ok(())
    }
}

fn uppercase_rows(rows: &mut Rows) {
    for i in 0..rows.nrows() {
        rows.row_mut(i).make_ascii_uppercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(seqs: &[&str]) -> Alignment {
        let names = (0..seqs.len()).map(|i| format!("s{}", i + 1)).collect();
        let rows = seqs.iter().map(|s| s.as_bytes().to_vec()).collect();
        Alignment::new(names, rows, None).unwrap()
    }

    #[test]
    fn test_new_alignment() {
        let a = aln(&["ACGT", "A-GT"]);
        assert_eq!(a.nseqs(), 2);
        assert_eq!(a.length(), 4);
        assert_eq!(a.get_char(1, 1), Some(b'-'));
        assert_eq!(a.get_char(2, 0), None);
        assert_eq!(a.seq_idx("s2"), Some(1));
        assert_eq!(a.seqlen(1).unwrap(), 3);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let err = Alignment::new(vec!["a".into()], vec![b"AC".to_vec(), b"AC".to_vec()], None);
        assert!(matches!(err, Err(AlignmentError::NameCount { .. })));

        let err = Alignment::new(
            vec!["a".into(), "b".into()],
            vec![b"AC".to_vec(), b"A".to_vec()],
            None,
        );
        assert!(matches!(err, Err(AlignmentError::RowLength { row: 1, .. })));

        let err = Alignment::new(vec!["a".into()], vec![b"AC".to_vec()], Some("A-C"));
        assert!(matches!(err, Err(AlignmentError::Alphabet(_))));
    }

    #[test]
    fn test_rows_mut_drops_stats() {
        let mut a = aln(&["ACGT", "ACGA"]);
        a.build_stats(1, true).unwrap();
        assert!(matches!(a.representation(), Representation::Both(..)));
        a.rows_mut().unwrap().row_mut(0)[0] = b'T';
        assert!(a.stats().is_none());
        assert_eq!(a.get_char(0, 0), Some(b'T'));
    }

    #[test]
    fn test_rows_mut_materializes_ordered_stats() {
        let mut a = aln(&["ACGT", "ACGA"]);
        a.build_stats(2, true).unwrap();
        a.drop_rows().unwrap();
        assert!(a.rows().is_none());
        assert_eq!(a.get_char(1, 3), Some(b'A'));
        let rows = a.rows_mut().unwrap();
        assert_eq!(rows.row(1), b"ACGA");
    }

    #[test]
    fn test_unordered_compressed_view_is_opaque() {
        let mut a = aln(&["ACGT"]);
        a.build_stats(1, false).unwrap();
        a.drop_rows().unwrap();
        assert!(matches!(a.char_view(), Err(AlignmentError::Unordered)));
        assert_eq!(a.get_char(0, 0), None);
        assert!(matches!(a.rows_mut(), Err(AlignmentError::Unordered)));
        // the failed request leaves the compressed view in place
        assert!(a.stats().is_some());
    }

    #[test]
    fn test_create_copy() {
        let mut a = aln(&["ACGT"]);
        assert!(a.create_copy(true).is_err());
        a.build_stats(1, true).unwrap();
        let c = a.create_copy(true).unwrap();
        assert!(c.rows().is_none());
        assert_eq!(c.get_char(0, 2), Some(b'G'));
        let c = a.create_copy(false).unwrap();
        assert!(c.rows().is_some());
    }

    #[test]
    fn test_set_categories_validates() {
        let mut a = aln(&["ACGT"]);
        assert!(matches!(
            a.set_categories(vec![0, 1], 2),
            Err(AlignmentError::CategoryLength { .. })
        ));
        assert!(matches!(
            a.set_categories(vec![0, 1, 2, 0], 2),
            Err(AlignmentError::InvalidCategory { col: 2, cat: 2, ncats: 2 })
        ));
        a.build_stats(1, true).unwrap();
        a.set_categories(vec![0, 1, 1, 0], 2).unwrap();
        let cc = a.stats().unwrap().cat_counts().unwrap();
        assert_eq!(cc[1].iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_toupper_both_views() {
        let mut a = Alignment::new(vec!["x".into()], vec![b"acGt".to_vec()], Some("ACGTacgt")).unwrap();
        a.build_stats(1, true).unwrap();
        a.toupper();
        assert_eq!(a.alphabet().as_str(), "ACGT");
        assert_eq!(a.rows().unwrap().row(0), b"ACGT");
        assert_eq!(a.stats().unwrap().to_rows().unwrap().row(0), b"ACGT");
    }

    #[test]
    fn test_rows_append_and_retain() {
        let mut r = Rows::new(vec![b"AC".to_vec(), b"GT".to_vec()]).unwrap();
        r.append(&Rows::new(vec![b"A".to_vec(), b"-".to_vec()]).unwrap()).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.row(1), b"GT-");
        r.retain_columns(&[true, false, true]);
        assert_eq!(r.row(0), b"AA");
        assert_eq!(r.len(), 2);
        assert!(r.append(&Rows::filled(3, 1, b'A')).is_err());
    }
}
