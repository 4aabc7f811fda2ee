//! MAF (multiple alignment format) import.
//!
//! Blocks start with an `a` line; each `s` line carries one aligned
//! sequence:
//!
//! ```text
//! ##maf version=1
//! a score=23262.0
//! s hg18.chr7    27578828 38 + 158545518 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG
//! s panTro1.chr6 28741140 38 + 161576975 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG
//! ```
//!
//! Blocks are concatenated in file order. A species is the part of the
//! source name before the first `.`; species missing from a block get
//! missing data for that block's columns. Other line types are skipped.
//! The coordinate offset is the start of the first row of the first
//! block, taken as the reference.

use std::collections::HashMap;

use thiserror::Error;

use crate::alphabet::Alphabet;
use crate::model::{Alignment, AlignmentError, Rows};

use super::push_residues;

#[derive(Error, Debug)]
pub enum MafError {
    #[error("No alignment blocks found")]
    NoBlocks,

    #[error("Line {line}: malformed 's' line (expected 'src start size strand srcSize text')")]
    BadSequenceLine { line: usize },

    #[error("Line {line}: block rows have {found} columns, expected {expected}")]
    BlockWidth { line: usize, expected: usize, found: usize },

    #[error("Line {line}: unrecognized character '{ch}'")]
    BadCharacter { line: usize, ch: char },

    #[error("{0}")]
    Alignment(#[from] AlignmentError),
}

pub type MafResult<T> = Result<T, MafError>;

/// One `s` line of the current block.
struct BlockRow {
    species: String,
    start: i64,
    text: Vec<u8>,
}

/// Accumulates blocks into per-species rows.
struct Builder<'a> {
    alphabet: &'a Alphabet,
    names: Vec<String>,
    index: HashMap<String, usize>,
    seqs: Vec<Vec<u8>>,
    length: usize,
    idx_offset: Option<i64>,
    nblocks: usize,
}

impl<'a> Builder<'a> {
    fn new(alphabet: &'a Alphabet) -> Self {
        Self {
            alphabet,
            names: Vec::new(),
            index: HashMap::new(),
            seqs: Vec::new(),
            length: 0,
            idx_offset: None,
            nblocks: 0,
        }
    }

    fn flush(&mut self, block: &mut Vec<BlockRow>) {
        let Some(width) = block.first().map(|r| r.text.len()) else {
            return;
        };
        if self.nblocks == 0 {
            // the first row of the first block is the reference; later
            // blocks keep its coordinates
            self.idx_offset = block.first().map(|r| r.start);
        }
        let missing = self.alphabet.missing_char();
        let mut filled = vec![false; self.seqs.len()];
        for row in block.drain(..) {
            let idx = match self.index.get(&row.species) {
                Some(&idx) => idx,
                None => {
                    self.index.insert(row.species.clone(), self.seqs.len());
                    self.names.push(row.species);
                    // earlier blocks did not have this species
                    self.seqs.push(vec![missing; self.length]);
                    filled.push(false);
                    self.seqs.len() - 1
                }
            };
            if filled[idx] {
                log::warn!("Species {} appears twice in block {}; keeping the first row", self.names[idx], self.nblocks + 1);
                continue;
            }
            self.seqs[idx].extend_from_slice(&row.text);
            filled[idx] = true;
        }
        for (seq, _) in self.seqs.iter_mut().zip(&filled).filter(|(_, f)| !**f) {
            seq.resize(seq.len() + width, missing);
        }
        self.length += width;
        self.nblocks += 1;
    }
}

/// Parses MAF content into an alignment, one row per species.
pub fn parse_maf_str(content: &str, alphabet: &Alphabet) -> MafResult<Alignment> {
    let mut builder = Builder::new(alphabet);
    let mut block: Vec<BlockRow> = Vec::new();

    for (line, text) in content.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if text.is_empty() || text.starts_with('a') {
            builder.flush(&mut block);
            continue;
        }
        if !text.starts_with("s ") && !text.starts_with("s\t") {
            continue;
        }

        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 7 {
            return Err(MafError::BadSequenceLine { line });
        }
        let start = fields[2].parse::<i64>().map_err(|_| MafError::BadSequenceLine { line })?;

        let species = fields[1].split('.').next().unwrap_or(fields[1]).to_string();
        let mut row = Vec::with_capacity(fields[6].len());
        push_residues(fields[6], alphabet, &mut row).map_err(|ch| MafError::BadCharacter { line, ch })?;
        if let Some(first) = block.first() {
            if first.text.len() != row.len() {
                return Err(MafError::BlockWidth {
                    line,
                    expected: first.text.len(),
                    found: row.len(),
                });
            }
        }
        block.push(BlockRow { species, start, text: row });
    }
    builder.flush(&mut block);

    if builder.nblocks == 0 {
        return Err(MafError::NoBlocks);
    }
    log::debug!(
        "Read {} MAF blocks, {} species, {} columns",
        builder.nblocks,
        builder.names.len(),
        builder.length
    );

    let mut aln = Alignment::from_rows(builder.names, Rows::new(builder.seqs)?, alphabet.clone());
    aln.idx_offset = builder.idx_offset.unwrap_or(0);
    Ok(aln)
}
