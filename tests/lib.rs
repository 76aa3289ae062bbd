use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bio::alphabets::dna;
use itertools::Itertools;

use novocall::alignment::PairwiseAligner;
use novocall::kmers::{KmerCounts, KmerTable, SampleEvidence};
use novocall::model::{AbundanceModel, ErrorRate};
use novocall::reference::{self, SeqRecord};
use novocall::variants::NoCall;
use novocall::{CallerBuilder, Variant};

fn record(name: &str, seq: &[u8]) -> SeqRecord {
    SeqRecord::new(name.to_owned(), seq.to_vec())
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

/// Count table with the given abundance for each listed k-mer.
fn count_table(kmers: &[(&str, u32)]) -> String {
    kmers
        .iter()
        .map(|(kmer, count)| format!("{}\t{}\n", kmer, count))
        .join("")
}

fn call(targets: &[SeqRecord], queries: &[SeqRecord], ksize: usize) -> Vec<Variant> {
    CallerBuilder::default()
        .aligner(Box::new(PairwiseAligner))
        .ksize(ksize)
        .build()
        .unwrap()
        .call(targets, queries)
        .unwrap()
}

#[test]
fn test_snv() {
    let variants = call(
        &[record("chr1_100-116", b"AAAACCCCGGGGTTTT")],
        &[record("contig1", b"AAAACCCCAGGGTTTT")],
        4,
    );
    assert_eq!(variants.len(), 1);
    let snv = &variants[0];
    assert_eq!(snv.seqid(), "chr1");
    assert_eq!(snv.pos(), 108);
    assert_eq!(snv.ref_allele(), b"G");
    assert_eq!(snv.alt_allele(), b"A");
    assert_eq!(snv.info().variant_window().as_deref(), Some(&b"CCCAGGG"[..]));
    assert_eq!(snv.info().reference_window().as_deref(), Some(&b"CCCGGGG"[..]));
    assert_eq!(
        snv.to_string(),
        "chr1\t109\t.\tG\tA\t.\t.\tVW=CCCAGGG;RW=CCCGGGG"
    );
}

#[test]
fn test_deletion() {
    let variants = call(
        &[record("chr3_1000-1029", b"ACGTTGCATGCCAGTAGGCTAACGGATCC")],
        &[record("contig1", b"ACGTTGCATGCCTAGGCTAACGGATCC")],
        5,
    );
    assert_eq!(variants.len(), 1);
    let del = &variants[0];
    assert_eq!(del.seqid(), "chr3");
    assert_eq!(del.pos(), 1011);
    assert_eq!(del.ref_allele(), b"CAG");
    assert_eq!(del.alt_allele(), b"C");
    assert!(!del.is_nocall());
}

#[test]
fn test_reverse_complement_query() {
    let target = b"TTGACCATGCAGTCAGGTACCGATTAGC";
    let query = dna::revcomp(&b"CATGCAGTCAGGTACC"[..]);
    let variants = call(
        &[record("chr2_0-28", target)],
        &[record("contig1", &query)],
        5,
    );
    assert_eq!(variants.len(), 1);
    let nocall = &variants[0];
    assert_eq!(nocall.info().nocall(), Some(NoCall::PerfectMatch));
    assert_eq!(nocall.pos(), 5);
    // the contig is reported in target orientation
    assert_eq!(
        nocall.info().contig_sequence().as_deref(),
        Some(&b"CATGCAGTCAGGTACC"[..])
    );
}

#[test]
fn test_reverse_complement_snv() {
    let target = b"TTGACCATGCAGTCAGGTACCGATTAGC";
    let query = dna::revcomp(&b"CATGCAGTAAGGTACC"[..]);
    let variants = call(
        &[record("chr2_0-28", target)],
        &[record("contig1", &query)],
        5,
    );
    assert_eq!(variants.len(), 1);
    let snv = &variants[0];
    assert_eq!(snv.seqid(), "chr2");
    assert_eq!(snv.pos(), 13);
    // alleles are reported on the target strand
    assert_eq!(snv.ref_allele(), b"C");
    assert_eq!(snv.alt_allele(), b"A");
    assert_eq!(snv.info().variant_window().as_deref(), Some(&b"CAGTAAGGT"[..]));
}

#[test]
fn test_read_fasta() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "targets.fa",
        ">chr1_100-116\nAAAACCCC\nGGGGTTTT\n>chr2_0-16 second target\nACGTTGCATGCCAGTA\n",
    );
    let records = reference::read_fasta(&path).unwrap();
    assert_eq!(
        records.iter().map(|rec| rec.name().as_str()).collect_vec(),
        vec!["chr1_100-116", "chr2_0-16"]
    );
    assert_eq!(records[0].sequence(), b"AAAACCCCGGGGTTTT");

    assert!(reference::read_fasta(dir.path().join("missing.fa")).is_err());
}

const CHR1: &[u8] = b"AAAACCCCGGGGTTTT";
const CHR2: &[u8] = b"ACGTTGCATGCCAGTA";
// SNV G>A at chr1:108
const CONTIG1: &[u8] = b"AAAACCCCAGGGTTTT";
// SNV A>T at chr2:7
const CONTIG2: &[u8] = b"ACGTTGCTTGCCAGTA";

const CHR1_ALT: [&str; 4] = ["CCCA", "CCAG", "CAGG", "AGGG"];
const CHR1_REF: [&str; 4] = ["CCCG", "CCGG", "CGGG", "GGGG"];
const CHR2_ALT: [&str; 4] = ["TGCT", "GCTT", "CTTG", "TTGC"];
const CHR2_REF: [&str; 4] = ["TGCA", "GCAT", "CATG", "ATGC"];

fn with_count(kmers: &[&'static str], count: u32) -> Vec<(&'static str, u32)> {
    kmers.iter().map(|&kmer| (kmer, count)).collect()
}

/// Trio tables in which only the chr2 variant is supported by the controls.
fn trio_tables(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let case = [
        with_count(&CHR1_ALT, 15),
        with_count(&CHR1_REF, 15),
        with_count(&CHR2_ALT, 15),
        with_count(&CHR2_REF, 15),
    ]
    .concat();
    let control = [
        with_count(&CHR1_REF, 30),
        with_count(&CHR2_ALT, 1),
        with_count(&CHR2_REF, 30),
    ]
    .concat();
    (
        write_file(dir, "case.tsv", &count_table(&case)),
        write_file(dir, "mom.tsv", &count_table(&control)),
        write_file(dir, "dad.tsv", &count_table(&control)),
    )
}

fn load(path: &Path) -> Box<dyn KmerTable> {
    Box::new(KmerCounts::from_tsv(4, path).unwrap())
}

#[test]
fn test_trio_ranking() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let (case, mom, dad) = trio_tables(dir.path());
    let evidence = SampleEvidence::new(load(&case), vec![load(&mom), load(&dad)], None)
        .with_labels(
            Some("Kid".to_owned()),
            Some(vec!["Mom".to_owned(), "Dad".to_owned()]),
        )
        .unwrap();
    let caller = CallerBuilder::default()
        .ksize(4)
        .evidence(evidence)
        .model(AbundanceModel::new(30.0, 8.0, ErrorRate::Uniform(0.01)).unwrap())
        .build()
        .unwrap();

    let variants = caller
        .call(
            &[record("chr1_100-116", CHR1), record("chr2_0-16", CHR2)],
            &[record("contig1", CONTIG1), record("contig2", CONTIG2)],
        )
        .unwrap();
    assert_eq!(variants.len(), 2);

    // abundant alt k-mers in both parents still allow a finite de novo score,
    // absent ones are impossible under the error model
    let first = &variants[0];
    assert_eq!((first.seqid().as_str(), first.pos()), ("chr2", 7));
    assert_eq!(first.ref_allele(), b"A");
    assert_eq!(first.alt_allele(), b"T");
    assert!(first.info().likelihood_denovo().unwrap().is_finite());
    assert!(first.info().likelihood_false().unwrap().is_finite());
    assert!(first.info().likelihood_inherited().is_some());
    assert_eq!(
        first
            .samples()
            .iter()
            .map(|sample| sample.label().as_str())
            .collect_vec(),
        vec!["Kid", "Mom", "Dad"]
    );
    assert_eq!(
        first.samples()[1].abundances(),
        &vec![Some(1), Some(1), Some(1), Some(1)]
    );

    let second = &variants[1];
    assert_eq!((second.seqid().as_str(), second.pos()), ("chr1", 108));
    assert_eq!(second.info().likelihood_denovo(), Some(f64::NEG_INFINITY));
    assert_eq!(
        second.samples()[0].abundances(),
        &vec![Some(15), Some(15), Some(15), Some(15)]
    );
    assert!(second.to_string().ends_with("\tAA\t15,15,15,15\t0,0,0,0\t0,0,0,0"));
}

#[test]
fn test_reference_kmers_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (case, mom, dad) = trio_tables(dir.path());
    // genome containing the complete chr1 alt window
    let genome = write_file(dir.path(), "genome.fa", ">decoy\nTTCCCAGGGTT\n");
    let refr: Box<dyn KmerTable> = Box::new(KmerCounts::from_fasta(4, &genome).unwrap());
    let evidence = SampleEvidence::new(load(&case), vec![load(&mom), load(&dad)], Some(refr));
    let caller = CallerBuilder::default()
        .ksize(4)
        .evidence(evidence)
        .build()
        .unwrap();

    let variants = caller
        .call(
            &[record("chr1_100-116", CHR1), record("chr2_0-16", CHR2)],
            &[record("contig1", CONTIG1), record("contig2", CONTIG2)],
        )
        .unwrap();

    // without evidence k-mers, all likelihoods are empty sums
    let chr1 = variants
        .iter()
        .find(|variant| variant.seqid() == "chr1")
        .unwrap();
    assert_eq!(chr1.info().likelihood_denovo(), Some(0.0));
    assert!(chr1.samples().iter().all(|sample| sample.abundances().is_empty()));
    assert_eq!(variants[0].seqid(), "chr1");
}

#[test]
fn test_kmer_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let (case, mom, dad) = trio_tables(dir.path());
    let evidence = SampleEvidence::new(load(&case), vec![load(&mom), load(&dad)], None);
    assert!(CallerBuilder::default()
        .ksize(5)
        .evidence(evidence)
        .build()
        .is_err());

    // k-mers of the wrong length are rejected on load
    assert!(KmerCounts::from_tsv(5, &case).is_err());
}
