// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("unable to parse subregion identifier {id}; expected CHROM_START-END")]
    InvalidSubregionId { id: String },
    #[error("invalid error rate configuration: {msg}")]
    InvalidErrorRate { msg: String },
    #[error("invalid abundance model: {msg}")]
    InvalidAbundanceModel { msg: String },
    #[error("inherited likelihood is only defined for trios (proband and two controls), got {n_samples} samples")]
    NotATrio { n_samples: usize },
    #[error("at least one target sequence must be provided")]
    NoTargets,
    #[error("number of sample labels ({labels}) does not match number of samples ({samples})")]
    InvalidSampleLabels { labels: usize, samples: usize },
    #[error("case and control k-mer tables have to be given together")]
    IncompleteSampleEvidence,
    #[error("variant spans {span} bp (max {maxspan})")]
    VariantLocalization { span: u64, maxspan: u64 },
    #[error("no seed matches against the reference")]
    NoReferenceMatches,
    #[error("reference sequence(s) not found: {seqids}")]
    ReferenceSequenceNotFound { seqids: String },
    #[error("k-mer size has to be at least 1")]
    InvalidKmerSize,
    #[error("k-mer table has k={found}, but variants are called with k={expected}")]
    KmerSizeMismatch { expected: usize, found: usize },
    #[error("invalid k-mer count table record at line {line}: {msg}")]
    InvalidCountTable { line: u64, msg: String },
}

pub(crate) fn invalid_error_rate(msg: &str) -> Error {
    Error::InvalidErrorRate {
        msg: msg.to_owned(),
    }
}
