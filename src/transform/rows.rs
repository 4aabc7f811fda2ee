//! Row reordering, row lookup and column permutation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Alignment, AlignmentError, AlignmentResult, Representation};

impl Alignment {
    /// Reorders rows to match `target`.
    ///
    /// Every current row must appear exactly once in `target`; names not
    /// in the alignment get a new row of missing data. The compressed view
    /// is dropped if rows are present, and reordered otherwise.
    pub fn reorder_rows(&mut self, target: &[String]) -> AlignmentResult<()> {
        let mut covered = vec![false; self.nseqs()];
        let mut new_to_old = Vec::with_capacity(target.len());
        for name in target {
            let old = self.seq_idx(name);
            if let Some(i) = old {
                if covered[i] {
                    return Err(AlignmentError::DuplicateInOrder(name.clone()));
                }
                covered[i] = true;
            }
            new_to_old.push(old);
        }
        if let Some(i) = covered.iter().position(|&c| !c) {
            return Err(AlignmentError::MissingFromOrder(self.names[i].clone()));
        }

        self.drop_stats();
        let missing = self.alphabet.missing_char();
        match &mut self.repr {
            Representation::Explicit(rows) | Representation::Both(rows, _) => rows.reorder(&new_to_old, missing),
            Representation::Compressed(stats) => stats.reorder_rows(&new_to_old, missing),
        }
        if let Some(flags) = self.is_informative.take() {
            self.is_informative = Some(new_to_old.iter().map(|old| old.map_or(true, |i| flags[i])).collect());
        }
        self.names = target.to_vec();
        Ok(())
    }

    /// Shuffles the columns uniformly at random.
    ///
    /// Categories move with their columns; the compressed view is dropped.
    pub fn permute_columns<R: Rng>(&mut self, rng: &mut R) -> AlignmentResult<()> {
        let mut order: Vec<usize> = (0..self.length).collect();
        order.shuffle(rng);
        let rows = self.rows_mut()?;
        *rows = rows.gather_columns(&order);
        if let Some(cats) = self.categories.as_mut() {
            *cats = order.iter().map(|&c| cats[c]).collect();
        }
        Ok(())
    }

    /// Resolves sequence names, or 1-based sequence numbers, to 0-based
    /// row indices.
    ///
    /// Numbers out of range are an error; unknown names are skipped with
    /// a warning.
    pub fn seq_indices(&self, names: &[String]) -> AlignmentResult<Vec<usize>> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            if let Ok(index) = name.trim().parse::<i64>() {
                if index <= 0 || index as u64 > self.nseqs() as u64 {
                    return Err(AlignmentError::SeqIndexOutOfRange {
                        index,
                        nseqs: self.nseqs(),
                    });
                }
                indices.push(index as usize - 1);
            } else {
                match self.seq_idx(name) {
                    Some(i) => indices.push(i),
                    None => log::warn!("No match for name \"{}\" in alignment", name),
                }
            }
        }
        Ok(indices)
    }

    /// Marks every row informative except those named (or numbered) in
    /// `not_informative`.
    pub fn set_informative(&mut self, not_informative: &[String]) -> AlignmentResult<()> {
        let mut flags = vec![true; self.nseqs()];
        for i in self.seq_indices(not_informative)? {
            flags[i] = false;
        }
        self.is_informative = Some(flags);
        Ok(())
    }
}
