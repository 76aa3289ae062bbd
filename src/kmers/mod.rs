// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp;
use std::convert::TryFrom;
use std::iter;
use std::path::Path;

use anyhow::{Context, Result};
use bio::alphabets::dna;
use counter::Counter;

use crate::errors::Error;
use crate::reference;

pub mod abundance;

pub use self::abundance::{filter_reference, get_abundances, AbundanceMatrix};

/// A k-mer counting table.
pub trait KmerTable: Sync {
    fn ksize(&self) -> usize;

    /// Abundance of the given k-mer. `None` means that the table cannot answer
    /// for this k-mer (wrong length or non-ACGT symbols), which is different
    /// from an observed abundance of zero.
    fn get(&self, kmer: &[u8]) -> Option<u32>;

    /// All overlapping k-mers of the given sequence, in order.
    fn kmers(&self, seq: &[u8]) -> Vec<Vec<u8>> {
        seq.windows(self.ksize()).map(|kmer| kmer.to_vec()).collect()
    }
}

/// Uppercase canonical form of a k-mer, i.e. the lexicographically smaller of
/// the k-mer and its reverse complement. `None` for non-ACGT k-mers.
pub fn canonical(kmer: &[u8]) -> Option<Vec<u8>> {
    let kmer = kmer.to_ascii_uppercase();
    if !kmer.iter().all(|base| b"ACGT".contains(base)) {
        return None;
    }
    let rc = dna::revcomp(&kmer);
    Some(cmp::min(kmer, rc))
}

/// In-memory canonical k-mer counts.
#[derive(Debug, Clone)]
pub struct KmerCounts {
    ksize: usize,
    counts: Counter<Vec<u8>>,
}

impl KmerCounts {
    pub fn new(ksize: usize) -> Self {
        KmerCounts {
            ksize,
            counts: Counter::new(),
        }
    }

    /// Count all k-mers of the given sequences. K-mers with non-ACGT symbols
    /// are skipped.
    pub fn from_sequences<'a, I>(ksize: usize, sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let counts = sequences
            .into_iter()
            .flat_map(|seq| seq.windows(ksize))
            .filter_map(canonical)
            .collect::<Counter<_>>();
        KmerCounts { ksize, counts }
    }

    /// Count all k-mers of the records in the given FASTA file.
    pub fn from_fasta<P: AsRef<Path>>(ksize: usize, path: P) -> Result<Self> {
        let records = reference::read_fasta(path)?;
        let counts =
            KmerCounts::from_sequences(ksize, records.iter().map(|rec| rec.sequence().as_slice()));
        info!(
            "Counted {} distinct {}-mers in {} sequences.",
            counts.len(),
            ksize,
            records.len()
        );
        Ok(counts)
    }

    /// Load counts from a headerless two-column TSV file (`kmer<TAB>count`).
    /// Counts of k-mers listed more than once, in either orientation, are added up.
    pub fn from_tsv<P: AsRef<Path>>(ksize: usize, path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_path(path.as_ref())
            .with_context(|| {
                format!("unable to open k-mer count table {}", path.as_ref().display())
            })?;

        let mut table = KmerCounts::new(ksize);
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let line = i as u64 + 1;
            let invalid = |msg: String| Error::InvalidCountTable { line, msg };
            if record.len() != 2 {
                return Err(invalid(format!("expected 2 columns, found {}", record.len())).into());
            }
            let kmer = record[0].as_bytes();
            if kmer.len() != ksize {
                return Err(invalid(format!(
                    "k-mer {} does not have length {}",
                    &record[0], ksize
                ))
                .into());
            }
            let kmer = canonical(kmer)
                .ok_or_else(|| invalid(format!("k-mer {} is not DNA", &record[0])))?;
            let count: usize = record[1]
                .trim()
                .parse()
                .map_err(|_| invalid(format!("invalid count {}", &record[1])))?;
            table.insert(kmer, count);
        }
        debug!(
            "Loaded {} distinct k-mers from {}.",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    fn insert(&mut self, canonical: Vec<u8>, count: usize) {
        *self.counts.entry(canonical).or_insert(0) += count;
    }

    /// Number of distinct canonical k-mers.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl KmerTable for KmerCounts {
    fn ksize(&self) -> usize {
        self.ksize
    }

    fn get(&self, kmer: &[u8]) -> Option<u32> {
        if kmer.len() != self.ksize {
            return None;
        }
        let count = self.counts.get(&canonical(kmer)?).copied().unwrap_or(0);
        Some(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

/// K-mer tables of a case (proband) and its controls, with an optional
/// reference table used to discard k-mers that occur elsewhere in the genome.
pub struct SampleEvidence {
    case: Box<dyn KmerTable>,
    controls: Vec<Box<dyn KmerTable>>,
    refr: Option<Box<dyn KmerTable>>,
    labels: Vec<String>,
}

impl SampleEvidence {
    /// Samples are labeled `Case`, `Control1`, ..., `ControlN`.
    pub fn new(
        case: Box<dyn KmerTable>,
        controls: Vec<Box<dyn KmerTable>>,
        refr: Option<Box<dyn KmerTable>>,
    ) -> Self {
        let labels = iter::once("Case".to_owned())
            .chain((1..=controls.len()).map(|i| format!("Control{}", i)))
            .collect();
        SampleEvidence {
            case,
            controls,
            refr,
            labels,
        }
    }

    /// Replace the default labels. The case label is kept if `case_label` is
    /// `None`, and so are the control labels if `control_labels` is `None`.
    pub fn with_labels(
        mut self,
        case_label: Option<String>,
        control_labels: Option<Vec<String>>,
    ) -> Result<Self, Error> {
        if let Some(labels) = control_labels {
            if labels.len() != self.controls.len() {
                return Err(Error::InvalidSampleLabels {
                    labels: labels.len(),
                    samples: self.controls.len(),
                });
            }
            self.labels.truncate(1);
            self.labels.extend(labels);
        }
        if let Some(label) = case_label {
            self.labels[0] = label;
        }
        Ok(self)
    }

    pub fn case(&self) -> &dyn KmerTable {
        self.case.as_ref()
    }

    pub fn controls(&self) -> &[Box<dyn KmerTable>] {
        &self.controls
    }

    pub fn refr(&self) -> Option<&dyn KmerTable> {
        self.refr.as_deref()
    }

    /// Sample labels, case first.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_samples(&self) -> usize {
        self.controls.len() + 1
    }

    /// Ensure that all tables use the given k-mer size.
    pub fn check_ksize(&self, ksize: usize) -> Result<(), Error> {
        iter::once(&self.case)
            .chain(self.controls.iter())
            .chain(self.refr.iter())
            .map(|table| table.ksize())
            .find(|&found| found != ksize)
            .map_or(Ok(()), |found| {
                Err(Error::KmerSizeMismatch {
                    expected: ksize,
                    found,
                })
            })
    }
}
