// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use structopt::StructOpt;

use crate::alignment::AlignmentScoring;
use crate::calling::CallerBuilder;
use crate::constants;
use crate::errors::Error;
use crate::kmers::{KmerCounts, KmerTable, SampleEvidence};
use crate::model::{AbundanceModel, ErrorRate};
use crate::reference;
use crate::variants::Variant;

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "novocall",
    about = "A caller for de novo SNVs and indels from contig alignments and k-mer abundances of a trio."
)]
#[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
pub enum Novocall {
    #[structopt(
        name = "call",
        about = "Align query contigs to target subregions, call variants and, if k-mer tables are given, score them for being de novo."
    )]
    #[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
    Call {
        #[structopt(
            parse(from_os_str),
            help = "FASTA file with target sequences. Names have to follow the CHROM_START-END convention."
        )]
        targets: PathBuf,
        #[structopt(parse(from_os_str), help = "FASTA file with query contigs.")]
        queries: PathBuf,
        #[structopt(
            long = "match",
            default_value = "1",
            help = "Alignment score of a match."
        )]
        match_score: i32,
        #[structopt(long, default_value = "2", help = "Alignment penalty of a mismatch.")]
        mismatch: i32,
        #[structopt(long, default_value = "5", help = "Alignment penalty for opening a gap.")]
        open: i32,
        #[structopt(
            long,
            default_value = "0",
            help = "Alignment penalty for extending a gap."
        )]
        extend: i32,
        #[structopt(short, long = "ksize", default_value = "31", help = "K-mer size.")]
        ksize: usize,
        #[structopt(
            long,
            parse(from_os_str),
            help = "K-mer counts of the case (proband) as TSV file (kmer<TAB>count)."
        )]
        case: Option<PathBuf>,
        #[structopt(
            long,
            parse(from_os_str),
            number_of_values = 1,
            help = "K-mer counts of a control (e.g. parent) as TSV file. Can be given multiple times."
        )]
        control: Vec<PathBuf>,
        #[structopt(
            long,
            parse(from_os_str),
            help = "FASTA file with the reference genome. Evidence k-mers occurring in it are ignored."
        )]
        refr: Option<PathBuf>,
        #[structopt(
            long,
            default_value = "30.0",
            help = "Mean abundance of k-mers with copy number two."
        )]
        mu: f64,
        #[structopt(
            long,
            default_value = "8.0",
            help = "Standard deviation of the abundance of k-mers with copy number two."
        )]
        sigma: f64,
        #[structopt(
            long,
            default_value = "0.01",
            help = "Error rate, either one value or a comma-separated list with one value per sample (case first)."
        )]
        epsilon: ErrorRate,
        #[structopt(long = "case-label", help = "Label of the case sample (default: Case).")]
        case_label: Option<String>,
        #[structopt(
            long = "ctrl-labels",
            help = "Comma-separated labels of the control samples (default: Control1,Control2,...)."
        )]
        ctrl_labels: Option<String>,
        #[structopt(long, default_value = "1", help = "Number of threads to use.")]
        threads: usize,
        #[structopt(long, help = "Write JSON records instead of tab-separated lines.")]
        json: bool,
        #[structopt(
            long,
            parse(from_os_str),
            help = "File that shall contain the results (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
        #[structopt(long, help = "Print debugging information.")]
        verbose: bool,
    },
}

impl Novocall {
    pub fn verbose(&self) -> bool {
        match self {
            Novocall::Call { verbose, .. } => *verbose,
        }
    }
}

fn load_counts(ksize: usize, path: &Path) -> Result<Box<dyn KmerTable>> {
    Ok(Box::new(KmerCounts::from_tsv(ksize, path)?))
}

fn write_variants<W: Write>(mut out: W, variants: &[Variant], json: bool) -> Result<()> {
    for variant in variants {
        if json {
            serde_json::to_writer(&mut out, variant)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", variant)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn run(opt: Novocall) -> Result<()> {
    match opt {
        Novocall::Call {
            ref targets,
            ref queries,
            match_score,
            mismatch,
            open,
            extend,
            ksize,
            ref case,
            ref control,
            ref refr,
            mu,
            sigma,
            ref epsilon,
            ref case_label,
            ref ctrl_labels,
            threads,
            json,
            ref output,
            ..
        } => {
            let mut builder = CallerBuilder::default()
                .scoring(AlignmentScoring {
                    match_score,
                    mismatch,
                    gap_open: open,
                    gap_extend: extend,
                })
                .ksize(ksize);

            match (case, control.is_empty()) {
                (Some(case), false) => {
                    let refr = match refr {
                        Some(path) => Some(Box::new(KmerCounts::from_fasta(ksize, path)?)
                            as Box<dyn KmerTable>),
                        None => None,
                    };
                    let controls = control
                        .iter()
                        .map(|path| load_counts(ksize, path))
                        .collect::<Result<Vec<_>>>()?;
                    let ctrl_labels = ctrl_labels
                        .as_ref()
                        .map(|labels| labels.split(',').map(|label| label.to_owned()).collect());
                    let evidence = SampleEvidence::new(load_counts(ksize, case)?, controls, refr)
                        .with_labels(case_label.clone(), ctrl_labels)?;
                    info!(
                        "Scoring variants with k-mer abundances of {} samples.",
                        evidence.n_samples()
                    );
                    builder = builder
                        .evidence(evidence)
                        .model(AbundanceModel::new(mu, sigma, epsilon.clone())?);
                }
                (None, true) => {
                    if case_label.is_some() || ctrl_labels.is_some() || refr.is_some() {
                        warn!("No k-mer tables given, ignoring sample labels and reference.");
                    }
                }
                _ => return Err(Error::IncompleteSampleEvidence.into()),
            }
            let caller = builder.build()?;
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()?;

            let targets = reference::read_fasta(targets)?;
            let queries = reference::read_fasta(queries)?;
            info!(
                "Read {} targets and {} queries (k={}, max trailing match {}).",
                targets.len(),
                queries.len(),
                ksize,
                constants::MAX_TRAILING_MATCH
            );
            let variants = caller.call(&targets, &queries)?;

            match output {
                Some(path) => {
                    let file = File::create(path).with_context(|| {
                        format!("unable to create output file {}", path.display())
                    })?;
                    write_variants(BufWriter::new(file), &variants, json)?;
                }
                None => write_variants(BufWriter::new(io::stdout()), &variants, json)?,
            }
        }
    }
    Ok(())
}
