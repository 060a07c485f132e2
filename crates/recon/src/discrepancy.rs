use crate::model::{ComparisonRow, Discrepancy, DiscrepancyStatus};

/// Find canonical fields where providers that reported data disagree.
///
/// Values are compared trimmed and case-insensitively. Rows with fewer than
/// two reporting providers, and rows where every reporting provider agrees,
/// are dropped. The result is sorted by status priority, then field name.
pub fn find_discrepancies(rows: &[ComparisonRow]) -> Vec<Discrepancy> {
    let mut out: Vec<Discrepancy> = rows.iter().filter_map(classify).collect();
    out.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| a.field_name.cmp(&b.field_name))
    });
    out
}

fn classify(row: &ComparisonRow) -> Option<Discrepancy> {
    let values: Vec<String> = row.values.iter().map(|v| v.trim().to_string()).collect();

    // (slot, normalized value) for every provider that reported
    let reported: Vec<(usize, String)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_empty())
        .map(|(slot, v)| (slot, v.to_lowercase()))
        .collect();

    if reported.len() < 2 {
        return None;
    }

    let status = status_for(&reported)?;
    Some(Discrepancy {
        field_name: row.field_name.clone(),
        status,
        values,
        providers_with_data: reported.len(),
    })
}

/// `None` when every reported value agrees.
fn status_for(reported: &[(usize, String)]) -> Option<DiscrepancyStatus> {
    let agree_count = |value: &str| reported.iter().filter(|(_, v)| v == value).count();

    if reported.iter().all(|(_, v)| *v == reported[0].1) {
        return None;
    }
    if reported.len() == 2 {
        return Some(DiscrepancyStatus::ValuesDiffer);
    }
    if reported.iter().all(|(_, v)| agree_count(v) == 1) {
        return Some(DiscrepancyStatus::AllDifferent);
    }

    // One odd value out while everyone else agrees
    let odd: Vec<usize> = reported
        .iter()
        .filter(|(_, v)| agree_count(v) == 1)
        .map(|(slot, _)| *slot)
        .collect();
    let majority_agrees = reported
        .iter()
        .filter(|(slot, _)| !odd.contains(slot))
        .all(|(_, v)| agree_count(v) == reported.len() - 1);

    match odd.as_slice() {
        [slot] if majority_agrees => Some(DiscrepancyStatus::ProviderDiffers { slot: *slot }),
        _ => Some(DiscrepancyStatus::ValuesDiffer),
    }
}
