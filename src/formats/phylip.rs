//! PHYLIP and MPM readers and writers.
//!
//! ## PHYLIP Format
//!
//! The first line contains the number of sequences and the sequence length.
//! Each sequence starts with its name, followed by its data on the same
//! line or on the lines below:
//! ```text
//!   2 12
//! Seq1 ACGTAC
//! GTACGT
//! Seq2
//! TGCATGCATGCA
//! ```
//!
//! ## MPM Format
//!
//! Same header, then one name per line, then each sequence in the same
//! order:
//! ```text
//!   2 4
//! Seq1
//! Seq2
//! ACGT
//! TGCA
//! ```
//!
//! Sequence data must add up to exactly the declared length.

use std::io::Write;

use thiserror::Error;

use crate::alphabet::Alphabet;
use crate::model::{Alignment, AlignmentError, Rows};

use super::{display_row, push_residues, OUTPUT_LINE_LEN};

/// Errors that can occur during PHYLIP or MPM parsing.
#[derive(Error, Debug)]
pub enum PhylipError {
    #[error("Write failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty PHYLIP file")]
    EmptyFile,

    #[error("Invalid header: expected 'ntax nchar' (two integers), got '{0}'")]
    InvalidHeader(String),

    #[error("Invalid sequence count in header: '{0}' is not a valid number")]
    InvalidSequenceCount(String),

    #[error("Invalid sequence length in header: '{0}' is not a valid number")]
    InvalidSequenceLength(String),

    #[error("Expected {expected} sequences but found {found}")]
    SequenceCountMismatch { expected: usize, found: usize },

    #[error("Sequence '{name}' has length {found}, expected {expected}")]
    SequenceLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: unrecognized character '{ch}'")]
    BadCharacter { line: usize, ch: char },

    #[error("{0}")]
    Alignment(#[from] AlignmentError),
}

/// Result type for PHYLIP operations.
pub type PhylipResult<T> = Result<T, PhylipError>;

/// Non-empty lines with their 1-based line numbers.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            inner: content.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .map(|(i, l)| (i + 1, l.trim()))
            .find(|(_, l)| !l.is_empty())
    }
}

/// Parses the `ntax nchar` header line.
fn parse_header(lines: &mut Lines<'_>) -> PhylipResult<(usize, usize)> {
    let (_, header) = lines.next().ok_or(PhylipError::EmptyFile)?;
    let parts: Vec<&str> = header.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(PhylipError::InvalidHeader(header.to_string()));
    }
    let ntax = parts[0]
        .parse::<usize>()
        .map_err(|_| PhylipError::InvalidSequenceCount(parts[0].to_string()))?;
    let nchar = parts[1]
        .parse::<usize>()
        .map_err(|_| PhylipError::InvalidSequenceLength(parts[1].to_string()))?;
    Ok((ntax, nchar))
}

/// Reads sequence data, starting with `first` (the rest of a name line,
/// possibly empty), until `nchar` characters have been collected.
fn read_sequence(
    lines: &mut Lines<'_>,
    first: Option<(usize, &str)>,
    name: &str,
    nchar: usize,
    alphabet: &Alphabet,
) -> PhylipResult<Vec<u8>> {
    let mut seq = Vec::with_capacity(nchar);
    let mut next = first;
    loop {
        if let Some((line, text)) = next {
            push_residues(text, alphabet, &mut seq).map_err(|ch| PhylipError::BadCharacter { line, ch })?;
        }
        if seq.len() >= nchar {
            break;
        }
        next = lines.next();
        if next.is_none() {
            break;
        }
    }
    if seq.len() != nchar {
        return Err(PhylipError::SequenceLengthMismatch {
            name: name.to_string(),
            expected: nchar,
            found: seq.len(),
        });
    }
    Ok(seq)
}

/// Parses PHYLIP content.
pub fn parse_phylip_str(content: &str, alphabet: &Alphabet) -> PhylipResult<Alignment> {
    let mut lines = Lines::new(content);
    let (ntax, nchar) = parse_header(&mut lines)?;

    let mut names = Vec::with_capacity(ntax);
    let mut seqs = Vec::with_capacity(ntax);
    for found in 0..ntax {
        let (line, text) = lines
            .next()
            .ok_or(PhylipError::SequenceCountMismatch { expected: ntax, found })?;
        let (name, rest) = match text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (text, ""),
        };
        seqs.push(read_sequence(&mut lines, Some((line, rest)), name, nchar, alphabet)?);
        names.push(name.to_string());
    }

    Ok(Alignment::from_rows(names, Rows::new(seqs)?, alphabet.clone()))
}

/// Parses MPM content.
pub fn parse_mpm_str(content: &str, alphabet: &Alphabet) -> PhylipResult<Alignment> {
    let mut lines = Lines::new(content);
    let (ntax, nchar) = parse_header(&mut lines)?;

    let mut names = Vec::with_capacity(ntax);
    for found in 0..ntax {
        let (_, name) = lines
            .next()
            .ok_or(PhylipError::SequenceCountMismatch { expected: ntax, found })?;
        names.push(name.to_string());
    }
    let seqs = names
        .iter()
        .map(|name| read_sequence(&mut lines, None, name, nchar, alphabet))
        .collect::<PhylipResult<Vec<_>>>()?;

    Ok(Alignment::from_rows(names, Rows::new(seqs)?, alphabet.clone()))
}

/// Writes an alignment as PHYLIP: each name on its own line, followed by
/// the sequence in lines of `OUTPUT_LINE_LEN` characters.
pub fn write_phylip<W: Write>(writer: &mut W, aln: &Alignment, pretty: bool) -> PhylipResult<()> {
    let view = aln.char_view()?;
    writeln!(writer, "  {} {}", aln.nseqs(), aln.length())?;
    for (row, name) in aln.names().iter().enumerate() {
        writeln!(writer, "{}", name)?;
        let chars = display_row(&view, row, aln.length(), pretty);
        for chunk in chars.chunks(OUTPUT_LINE_LEN) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Writes an alignment as MPM.
pub fn write_mpm<W: Write>(writer: &mut W, aln: &Alignment, pretty: bool) -> PhylipResult<()> {
    let view = aln.char_view()?;
    writeln!(writer, "  {} {}", aln.nseqs(), aln.length())?;
    for name in aln.names() {
        writeln!(writer, "{}", name)?;
    }
    for row in 0..aln.nseqs() {
        writer.write_all(&display_row(&view, row, aln.length(), pretty))?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
