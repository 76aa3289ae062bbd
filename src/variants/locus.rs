// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use bio_types::genome;
use regex::Regex;

use crate::errors;

lazy_static! {
    static ref SUBREGION_ID: Regex = Regex::new(r"^(\S+)_(\d+)-(\d+)$").unwrap();
}

/// Format the identifier of the subregion `start..end` of the given sequence.
pub fn subregion_id(seqid: &str, start: u64, end: u64) -> String {
    format!("{}_{}-{}", seqid, start, end)
}

/// Convert an offset within a subregion into a global locus.
///
/// The subregion identifier has to follow the `CHROM_START-END` convention
/// (see [`subregion_id`]). Anything else is a broken contract with the
/// localization step and yields an error.
pub fn local_to_global(local: u64, subregion: &str) -> Result<genome::Locus> {
    let caps = SUBREGION_ID
        .captures(subregion)
        .ok_or_else(|| errors::Error::InvalidSubregionId {
            id: subregion.to_owned(),
        })?;
    let start: u64 = caps[2]
        .parse()
        .map_err(|_| errors::Error::InvalidSubregionId {
            id: subregion.to_owned(),
        })?;
    let pos = start
        .checked_add(local)
        .ok_or_else(|| errors::Error::InvalidSubregionId {
            id: subregion.to_owned(),
        })?;
    Ok(genome::Locus::new(caps[1].to_owned(), pos))
}
