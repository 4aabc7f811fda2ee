//! FASTA file reader and writer.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! Sequences may span several lines. Rows shorter than the longest one
//! are padded with gaps.

use std::io::Write;

use thiserror::Error;

use crate::alphabet::{Alphabet, GAP_CHAR};
use crate::model::{Alignment, AlignmentError, Rows};

use super::{display_row, push_residues, OUTPUT_LINE_LEN};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Write failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),

    #[error("Unrecognized character '{ch}' in sequence '{name}' at line {line}")]
    BadCharacter { ch: char, name: String, line: usize },

    #[error("{0}")]
    Alignment(#[from] AlignmentError),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Parses FASTA content into an alignment.
///
/// The name of each sequence is the first word of its header line.
///
/// # Examples
///
/// ```
/// use msakit::alphabet::Alphabet;
/// use msakit::formats::fasta::parse_fasta_str;
///
/// let aln = parse_fasta_str(">a\nacgt\n>b\nAC\n", &Alphabet::default()).unwrap();
/// assert_eq!(aln.length(), 4);
/// assert_eq!(aln.get_char(1, 3), Some(b'-'));
/// ```
pub fn parse_fasta_str(content: &str, alphabet: &Alphabet) -> FastaResult<Alignment> {
    let mut names: Vec<String> = Vec::new();
    let mut seqs: Vec<Vec<u8>> = Vec::new();
    let mut prev_seq_len: usize = 1000;

    for (line_number, line) in content.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            let id = header.split_whitespace().next().ok_or_else(|| {
                FastaError::InvalidFormat(format!("Empty sequence identifier at line {}", line_number))
            })?;
            if let Some(last) = seqs.last() {
                prev_seq_len = last.len();
            }
            names.push(id.to_string());
            // alignments have uniform length
            seqs.push(Vec::with_capacity(prev_seq_len));
        } else {
            let seq = seqs.last_mut().ok_or(FastaError::SequenceWithoutHeader(line_number))?;
            push_residues(line, alphabet, seq).map_err(|ch| FastaError::BadCharacter {
                ch,
                name: names.last().cloned().unwrap_or_default(),
                line: line_number,
            })?;
        }
    }

    if names.is_empty() {
        return Err(FastaError::EmptyFile);
    }

    let max_len = seqs.iter().map(Vec::len).max().unwrap_or(0);
    if seqs.iter().any(|s| s.len() != max_len) {
        log::debug!("Padding FASTA sequences with gaps to length {}", max_len);
        for seq in &mut seqs {
            seq.resize(max_len, GAP_CHAR);
        }
    }

    Ok(Alignment::from_rows(names, Rows::new(seqs)?, alphabet.clone()))
}

/// Writes an alignment as FASTA, `OUTPUT_LINE_LEN` characters per line.
pub fn write_fasta<W: Write>(writer: &mut W, aln: &Alignment, pretty: bool) -> FastaResult<()> {
    let view = aln.char_view()?;
    for (row, name) in aln.names().iter().enumerate() {
        writeln!(writer, "> {}", name)?;
        let chars = display_row(&view, row, aln.length(), pretty);
        for chunk in chars.chunks(OUTPUT_LINE_LEN) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
