//! Clipping a chronology to an accounting sub-window.

use crate::chronology::{ChronologyEntry, ChronologyStatus};
use tracing::debug;

/// Clip `chronology` to `[s_trim, e_trim]`.
///
/// The kept range runs from the first entry starting at or after `s_trim` to
/// the last entry ending at or before `e_trim`; its outer bounds are then
/// stretched or shrunk to exactly `s_trim` and `e_trim`. When either scan
/// finds nothing, or the two cross because the window holds no whole entry,
/// the range is the entries containing `s_trim` and `e_trim` instead.
/// Every kept entry ends at or after its start.
///
/// With `is_final_calc`, leading and trailing `Open` runs become
/// `PowerFailure`: a closed billing period has no "unknown" time left.
/// A reversed window (`e_trim < s_trim`) trims to empty.
pub fn trim_chronology(
    mut chronology: Vec<ChronologyEntry>,
    s_trim: i64,
    e_trim: i64,
    is_final_calc: bool,
) -> Vec<ChronologyEntry> {
    if chronology.is_empty() || e_trim < s_trim {
        return Vec::new();
    }

    let (i_start, i_end) = kept_range(&chronology, s_trim, e_trim);
    if i_start == i_end {
        chronology[i_start].retime(s_trim, e_trim);
    } else {
        let first = &mut chronology[i_start];
        first.retime(s_trim, first.end_timestamp);
        let last = &mut chronology[i_end];
        last.retime(last.start_timestamp, e_trim);
    }

    chronology.truncate(i_end + 1);
    chronology.drain(..i_start);

    if is_final_calc {
        relabel_open_edges(&mut chronology);
    }

    debug!(
        s_trim,
        e_trim,
        is_final_calc,
        i_start,
        i_end,
        kept = chronology.len(),
        "trimmed chronology"
    );
    chronology
}

/// Inclusive index range to keep. `chronology` must be non-empty.
fn kept_range(chronology: &[ChronologyEntry], s_trim: i64, e_trim: i64) -> (usize, usize) {
    let whole_start = chronology.iter().position(|e| e.start_timestamp >= s_trim);
    let whole_end = chronology.iter().rposition(|e| e.end_timestamp <= e_trim);
    match (whole_start, whole_end) {
        (Some(i_start), Some(i_end)) if i_start <= i_end => (i_start, i_end),
        _ => {
            let i_start = chronology
                .iter()
                .rposition(|e| e.start_timestamp <= s_trim)
                .unwrap_or(0);
            let i_end = chronology
                .iter()
                .position(|e| e.end_timestamp >= e_trim)
                .unwrap_or(chronology.len() - 1);
            // Only a zero-length window on an entry boundary puts i_end first.
            (i_start, i_end.max(i_start))
        }
    }
}

fn relabel_open_edges(chronology: &mut [ChronologyEntry]) {
    for entry in chronology.iter_mut() {
        if entry.status != ChronologyStatus::Open {
            break;
        }
        entry.relabel(ChronologyStatus::PowerFailure);
    }
    for entry in chronology.iter_mut().rev() {
        if entry.status != ChronologyStatus::Open {
            break;
        }
        entry.relabel(ChronologyStatus::PowerFailure);
    }
}
