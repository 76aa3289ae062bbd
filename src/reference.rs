// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use bio::alphabets::dna;
use bio::io::fasta;

/// A named sequence, either a target (reference subregion) or a query contig.
///
/// Target names follow the `CHROM_START-END` convention of
/// [`crate::variants::locus::subregion_id`].
#[derive(new, Getters, Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    sequence: Vec<u8>,
}

impl SeqRecord {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Replace the sequence with its reverse complement.
    pub fn reverse_complement(&mut self) {
        self.sequence = dna::revcomp(&self.sequence);
    }
}

impl From<fasta::Record> for SeqRecord {
    fn from(record: fasta::Record) -> Self {
        SeqRecord::new(record.id().to_owned(), record.seq().to_owned())
    }
}

/// Read all records of the given FASTA file into memory.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<SeqRecord>> {
    let reader = fasta::Reader::from_file(path.as_ref()).with_context(|| {
        format!("unable to open FASTA file {}", path.as_ref().display())
    })?;
    collect_records(reader)
        .with_context(|| format!("invalid FASTA record in {}", path.as_ref().display()))
}

pub(crate) fn collect_records<R: io::Read>(
    reader: fasta::Reader<io::BufReader<R>>,
) -> Result<Vec<SeqRecord>> {
    let mut records = Vec::new();
    for record in reader.records() {
        records.push(SeqRecord::from(record?));
    }
    Ok(records)
}
