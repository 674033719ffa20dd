use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::models::RawFormat;

/// Reduces a raw format list down to one representative entry per distinct
/// vertical resolution, highest resolution first.
///
/// Within one resolution the formats are reduced in input order: a candidate
/// with a known size replaces a kept entry without one, otherwise the higher
/// total bitrate (absent counts as 0) wins. Ties keep the earlier entry.
pub fn curate_formats(formats: &[RawFormat]) -> Vec<RawFormat> {
    let mut best_by_height: BTreeMap<u32, &RawFormat> = BTreeMap::new();

    for candidate in formats {
        // Audio-only entries carry vcodec "none"; storyboards have no height.
        if candidate.vcodec.as_deref() == Some("none") {
            continue;
        }
        let Some(height) = candidate.height else {
            continue;
        };

        match best_by_height.entry(height) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                let kept = *slot.get();
                if candidate.known_filesize().is_some() && kept.known_filesize().is_none() {
                    slot.insert(candidate);
                } else if candidate.tbr.unwrap_or(0.0) > kept.tbr.unwrap_or(0.0) {
                    slot.insert(candidate);
                }
            }
        }
    }

    best_by_height.into_values().rev().cloned().collect()
}
