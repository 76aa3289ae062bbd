// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use bio_types::genome::{self, AbstractLocus};
use derive_builder::Builder;
use itertools::Itertools;
use serde::Serializer;

pub mod caller;
pub mod locus;

pub use caller::call_variants;

/// Reason for not calling a variant from an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoCall {
    /// Target and query windows are identical.
    PerfectMatch,
    /// The alignment does not have one of the callable shapes.
    InscrutableCigar,
}

/// Keys of the annotations a variant can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum AnnotationKey {
    #[strum(serialize = "VW")]
    VariantWindow,
    #[strum(serialize = "RW")]
    ReferenceWindow,
    #[strum(serialize = "NC")]
    NoCall,
    #[strum(serialize = "CS")]
    ContigSequence,
    #[strum(serialize = "CIGAR")]
    Cigar,
    #[strum(serialize = "FP")]
    LikelihoodFalse,
    #[strum(serialize = "DN")]
    LikelihoodDenovo,
    #[strum(serialize = "IH")]
    LikelihoodInherited,
    #[strum(serialize = "AA")]
    AlleleAbundance,
}

fn serialize_seq<S: Serializer>(seq: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(seq))
}

fn serialize_opt_seq<S: Serializer>(
    seq: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match seq {
        Some(seq) => serializer.serialize_some(&*String::from_utf8_lossy(seq)),
        None => serializer.serialize_none(),
    }
}

fn serialize_abundances<S: Serializer>(
    abundances: &[Option<u32>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_abundances(abundances))
}

/// Comma-join abundances. Abundances that could not be queried are shown as `.`.
pub fn format_abundances(abundances: &[Option<u32>]) -> String {
    abundances
        .iter()
        .map(|abundance| match abundance {
            Some(abundance) => abundance.to_string(),
            None => ".".to_owned(),
        })
        .join(",")
}

/// Annotations of a variant. The set of keys is fixed, see [`AnnotationKey`].
#[derive(Default, Clone, Debug, PartialEq, Getters, CopyGetters, Serialize)]
pub struct Annotations {
    #[getset(get = "pub")]
    #[serde(
        rename = "VW",
        serialize_with = "serialize_opt_seq",
        skip_serializing_if = "Option::is_none"
    )]
    variant_window: Option<Vec<u8>>,
    #[getset(get = "pub")]
    #[serde(
        rename = "RW",
        serialize_with = "serialize_opt_seq",
        skip_serializing_if = "Option::is_none"
    )]
    reference_window: Option<Vec<u8>>,
    #[getset(get_copy = "pub")]
    #[serde(rename = "NC", skip_serializing_if = "Option::is_none")]
    nocall: Option<NoCall>,
    #[getset(get = "pub")]
    #[serde(
        rename = "CS",
        serialize_with = "serialize_opt_seq",
        skip_serializing_if = "Option::is_none"
    )]
    contig_sequence: Option<Vec<u8>>,
    #[getset(get = "pub")]
    #[serde(rename = "CIGAR", skip_serializing_if = "Option::is_none")]
    cigar: Option<String>,
    #[getset(get_copy = "pub")]
    #[serde(rename = "FP", skip_serializing_if = "Option::is_none")]
    likelihood_false: Option<f64>,
    #[getset(get_copy = "pub")]
    #[serde(rename = "DN", skip_serializing_if = "Option::is_none")]
    likelihood_denovo: Option<f64>,
    #[getset(get_copy = "pub")]
    #[serde(rename = "IH", skip_serializing_if = "Option::is_none")]
    likelihood_inherited: Option<f64>,
}

impl Annotations {
    pub fn set_windows(&mut self, variant_window: Vec<u8>, reference_window: Vec<u8>) {
        self.variant_window = Some(variant_window);
        self.reference_window = Some(reference_window);
    }

    pub fn set_nocall(&mut self, nocall: NoCall) {
        self.nocall = Some(nocall);
    }

    pub fn set_contig_sequence(&mut self, seq: Vec<u8>) {
        self.contig_sequence = Some(seq);
    }

    pub fn set_cigar(&mut self, cigar: String) {
        self.cigar = Some(cigar);
    }

    pub fn set_likelihood_false(&mut self, value: f64) {
        self.likelihood_false = Some(value);
    }

    pub fn set_likelihood_denovo(&mut self, value: f64) {
        self.likelihood_denovo = Some(value);
    }

    pub fn set_likelihood_inherited(&mut self, value: f64) {
        self.likelihood_inherited = Some(value);
    }

    /// Present annotations as (key, formatted value) pairs, in the order of
    /// [`AnnotationKey`].
    pub fn fields(&self) -> Vec<(AnnotationKey, String)> {
        let seq = |seq: &[u8]| String::from_utf8_lossy(seq).into_owned();
        let mut fields = Vec::new();
        if let Some(ref window) = self.variant_window {
            fields.push((AnnotationKey::VariantWindow, seq(window)));
        }
        if let Some(ref window) = self.reference_window {
            fields.push((AnnotationKey::ReferenceWindow, seq(window)));
        }
        if let Some(nocall) = self.nocall {
            fields.push((AnnotationKey::NoCall, nocall.to_string()));
        }
        if let Some(ref contig) = self.contig_sequence {
            fields.push((AnnotationKey::ContigSequence, seq(contig)));
        }
        if let Some(ref cigar) = self.cigar {
            fields.push((AnnotationKey::Cigar, cigar.clone()));
        }
        if let Some(value) = self.likelihood_false {
            fields.push((AnnotationKey::LikelihoodFalse, format!("{:.3}", value)));
        }
        if let Some(value) = self.likelihood_denovo {
            fields.push((AnnotationKey::LikelihoodDenovo, format!("{:.3}", value)));
        }
        if let Some(value) = self.likelihood_inherited {
            fields.push((AnnotationKey::LikelihoodInherited, format!("{:.3}", value)));
        }
        fields
    }
}

/// Per-sample k-mer abundances (`AA`) along the variant window.
#[derive(new, Clone, Debug, PartialEq, Getters, Serialize)]
#[getset(get = "pub")]
pub struct SampleInfo {
    label: String,
    #[serde(rename = "AA", serialize_with = "serialize_abundances")]
    abundances: Vec<Option<u32>>,
}

/// A candidate variant (or no-call) derived from a single alignment.
#[derive(Clone, Debug, PartialEq, Builder, Getters, CopyGetters, Serialize)]
#[builder(pattern = "owned")]
pub struct Variant {
    #[getset(get = "pub")]
    seqid: String,
    /// 0-based position.
    #[getset(get_copy = "pub")]
    pos: u64,
    #[getset(get = "pub")]
    #[builder(default = "b\".\".to_vec()")]
    #[serde(rename = "ref", serialize_with = "serialize_seq")]
    ref_allele: Vec<u8>,
    #[getset(get = "pub")]
    #[builder(default = "b\".\".to_vec()")]
    #[serde(rename = "alt", serialize_with = "serialize_seq")]
    alt_allele: Vec<u8>,
    #[getset(get = "pub")]
    #[builder(default)]
    info: Annotations,
    #[getset(get = "pub")]
    #[builder(default)]
    samples: Vec<SampleInfo>,
}

impl VariantBuilder {
    /// Set seqid and position from the given locus.
    pub fn locus(self, locus: &genome::Locus) -> Self {
        self.seqid(locus.contig().to_owned()).pos(locus.pos())
    }
}

impl Variant {
    pub fn info_mut(&mut self) -> &mut Annotations {
        &mut self.info
    }

    pub fn push_sample(&mut self, sample: SampleInfo) {
        self.samples.push(sample);
    }

    pub fn is_nocall(&self) -> bool {
        self.info.nocall.is_some()
    }

    /// Score used for ranking. Variants without a de novo likelihood rank last.
    pub fn ranking_score(&self) -> f64 {
        self.info.likelihood_denovo.unwrap_or(f64::NEG_INFINITY)
    }
}

impl fmt::Display for Variant {
    /// Tab-separated record in VCF column order with a 1-based position.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.info.fields();
        let info = if fields.is_empty() {
            ".".to_owned()
        } else {
            fields
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .join(";")
        };
        write!(
            f,
            "{}\t{}\t.\t{}\t{}\t.\t.\t{}",
            self.seqid,
            self.pos + 1,
            String::from_utf8_lossy(&self.ref_allele),
            String::from_utf8_lossy(&self.alt_allele),
            info
        )?;
        if !self.samples.is_empty() {
            write!(f, "\t{}", AnnotationKey::AlleleAbundance)?;
            for sample in &self.samples {
                write!(f, "\t{}", format_abundances(&sample.abundances))?;
            }
        }
        Ok(())
    }
}
