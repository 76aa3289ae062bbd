// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Derive variants from the alignment of a query contig against a target
//! subregion.

use std::cmp;

use anyhow::Result;
use bio_types::genome::AbstractLocus;

use crate::alignment::{Cigar, IndelKind};
use crate::errors::Error;
use crate::reference::SeqRecord;
use crate::variants::locus::local_to_global;
use crate::variants::{NoCall, Variant, VariantBuilder};

/// Slice `seq[start..end]`, clamping both ends to the sequence.
fn window(seq: &[u8], start: usize, end: usize) -> &[u8] {
    let end = cmp::min(end, seq.len());
    let start = cmp::min(start, end);
    &seq[start..end]
}

/// Call all variants implied by the given alignment. The result always
/// contains at least one record: alignments without variants or with an
/// unsupported shape yield a no-call.
pub fn call_variants(
    target: &SeqRecord,
    query: &SeqRecord,
    cigar: &str,
    ksize: usize,
) -> Result<Vec<Variant>> {
    if ksize == 0 {
        return Err(Error::InvalidKmerSize.into());
    }
    let calls = match Cigar::interpret(cigar) {
        Some(Cigar::Snv { offset, length }) => {
            call_snv(target, query, offset as usize, length as usize, ksize)?
        }
        Some(Cigar::Indel {
            offset,
            left_match,
            kind: IndelKind::Deletion,
            length,
            ..
        }) => call_deletion(
            target,
            query,
            offset as usize,
            left_match as usize,
            length as usize,
            ksize,
        )?
        .map(|call| vec![call]),
        Some(Cigar::Indel {
            offset,
            left_match,
            kind: IndelKind::Insertion,
            length,
            ..
        }) => call_insertion(
            target,
            query,
            offset as usize,
            left_match as usize,
            length as usize,
            ksize,
        )?
        .map(|call| vec![call]),
        None => None,
    };

    match calls {
        Some(calls) => Ok(calls),
        None => {
            debug!(
                "Inscrutable alignment {} of {} against {}.",
                cigar,
                query.name(),
                target.name()
            );
            Ok(vec![inscrutable(target, query, cigar)?])
        }
    }
}

fn inscrutable(target: &SeqRecord, query: &SeqRecord, cigar: &str) -> Result<Variant> {
    let mut nocall = VariantBuilder::default()
        .locus(&local_to_global(0, target.name())?)
        .build()?;
    let info = nocall.info_mut();
    info.set_nocall(NoCall::InscrutableCigar);
    info.set_contig_sequence(query.sequence().clone());
    info.set_cigar(cigar.to_owned());
    Ok(nocall)
}

/// Call SNVs from a gapless window of `length` bases.
/// Returns `None` if the window starts past the end of the target.
pub fn call_snv(
    target: &SeqRecord,
    query: &SeqRecord,
    offset: usize,
    length: usize,
    ksize: usize,
) -> Result<Option<Vec<Variant>>> {
    if offset > target.len() {
        return Ok(None);
    }
    let t = window(target.sequence(), offset, offset.saturating_add(length));
    let q = window(query.sequence(), 0, length);
    let length = cmp::min(t.len(), q.len());

    let diffs = (0..length)
        .filter(|&i| !t[i].eq_ignore_ascii_case(&q[i]))
        .collect::<Vec<_>>();
    if diffs.is_empty() {
        let mut nocall = VariantBuilder::default()
            .locus(&local_to_global(offset as u64, target.name())?)
            .build()?;
        nocall.info_mut().set_nocall(NoCall::PerfectMatch);
        nocall.info_mut().set_contig_sequence(q.to_owned());
        return Ok(Some(vec![nocall]));
    }

    diffs
        .into_iter()
        .map(|i| {
            let minpos = i.saturating_sub(ksize - 1);
            let maxpos = cmp::min(i.saturating_add(ksize), length);
            let locus = local_to_global((offset + i) as u64, target.name())?;
            let mut snv = VariantBuilder::default()
                .locus(&locus)
                .ref_allele(vec![t[i].to_ascii_uppercase()])
                .alt_allele(vec![q[i].to_ascii_uppercase()])
                .build()?;
            snv.info_mut()
                .set_windows(q[minpos..maxpos].to_owned(), t[minpos..maxpos].to_owned());
            Ok(snv)
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Call a deletion of `length` target bases after `left_match` aligned bases.
/// Returns `None` if the alleles are not covered by the target.
pub fn call_deletion(
    target: &SeqRecord,
    query: &SeqRecord,
    offset: usize,
    left_match: usize,
    length: usize,
    ksize: usize,
) -> Result<Option<Variant>> {
    let end = match offset
        .checked_add(left_match)
        .and_then(|pos| pos.checked_add(length))
    {
        Some(end) if left_match > 0 && end <= target.len() => end,
        _ => return Ok(None),
    };
    // anchor base followed by the deleted bases
    let ref_allele = target.sequence()[offset + left_match - 1..end].to_ascii_uppercase();
    let alt_allele = ref_allele[..1].to_owned();

    let minpos = left_match.saturating_sub(ksize - 1);
    let maxpos = left_match.saturating_add(ksize - 1);
    let variant_window = window(query.sequence(), minpos, maxpos).to_owned();
    let reference_window = window(
        target.sequence(),
        offset + minpos,
        offset.saturating_add(maxpos).saturating_add(length),
    )
    .to_owned();

    let locus = local_to_global((offset + left_match) as u64, target.name())?;
    let mut deletion = VariantBuilder::default()
        .seqid(locus.contig().to_owned())
        .pos(locus.pos() - 1)
        .ref_allele(ref_allele)
        .alt_allele(alt_allele)
        .build()?;
    deletion
        .info_mut()
        .set_windows(variant_window, reference_window);
    Ok(Some(deletion))
}

/// Call an insertion of `length` query bases after `left_match` aligned bases.
/// Returns `None` if the alleles are not covered by the query or the anchor is
/// not covered by the target.
pub fn call_insertion(
    target: &SeqRecord,
    query: &SeqRecord,
    offset: usize,
    left_match: usize,
    length: usize,
    ksize: usize,
) -> Result<Option<Variant>> {
    let covered = |pos: Option<usize>, len: usize| pos.map_or(false, |pos| pos <= len);
    if left_match == 0
        || !covered(left_match.checked_add(length), query.len())
        || !covered(offset.checked_add(left_match), target.len())
    {
        return Ok(None);
    }
    // anchor base followed by the inserted bases
    let alt_allele = query.sequence()[left_match - 1..left_match + length].to_ascii_uppercase();
    let ref_allele = alt_allele[..1].to_owned();

    let minpos = left_match.saturating_sub(ksize - 1);
    let maxpos = left_match.saturating_add(ksize - 1);
    let variant_window =
        window(query.sequence(), minpos, maxpos.saturating_add(length)).to_owned();
    let reference_window = window(
        target.sequence(),
        offset + minpos,
        offset.saturating_add(maxpos),
    )
    .to_owned();

    let locus = local_to_global((offset + left_match) as u64, target.name())?;
    let mut insertion = VariantBuilder::default()
        .seqid(locus.contig().to_owned())
        .pos(locus.pos() - 1)
        .ref_allele(ref_allele)
        .alt_allele(alt_allele)
        .build()?;
    insertion
        .info_mut()
        .set_windows(variant_window, reference_window);
    Ok(Some(insertion))
}
