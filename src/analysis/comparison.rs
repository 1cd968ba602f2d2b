//! Area-versus-national share comparisons.

use super::{sum_by, AnalysisOptions};
use crate::dataset::Dataset;
use crate::error::AnalysisError;
use crate::models::{EthnicDiff, EthnicShare, EthnicShareComparison, Ratio, Record, SharePair};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Wider group shares for one area and for all areas, White excluded.
///
/// Both series follow the baseline's group order (sorted by name). A group
/// the area lacks appears with a zero count.
pub fn ethnic_pct_shares(
    dataset: &Dataset,
    area: &str,
    options: &AnalysisOptions,
) -> Result<SharePair, AnalysisError> {
    dataset.require_area(area)?;

    let is_minority = |r: &&Record| r.wider_group != options.white_label;

    let national = sum_by(
        dataset.records().iter().filter(is_minority),
        |r| r.wider_group.as_str(),
    );
    let local = sum_by(
        dataset.area_records(area).filter(is_minority),
        |r| r.wider_group.as_str(),
    );

    let national_total: u64 = national.values().sum();
    let local_total: u64 = local.values().sum();

    let mut all_areas = Vec::with_capacity(national.len());
    let mut area_shares = Vec::with_capacity(national.len());

    for (group, &count) in &national {
        let local_count = local.get(group).copied().unwrap_or(0);

        all_areas.push(EthnicShare {
            group: group.clone(),
            count,
            pct_share: Ratio::percentage(count, national_total),
        });
        area_shares.push(EthnicShare {
            group: group.clone(),
            count: local_count,
            pct_share: Ratio::percentage(local_count, local_total),
        });
    }

    Ok(SharePair {
        area: area.to_string(),
        all_areas,
        area_shares,
    })
}

/// Fine group share differences between one area and all areas.
///
/// Only records whose Ethnic Group ID lies in `options.ethnic_ids` take
/// part. Groups are outer-joined, so a group missing on either side is kept
/// with a zero count. Rows are sorted by descending difference with
/// undefined differences last.
pub fn ethnic_diff(
    dataset: &Dataset,
    area: &str,
    options: &AnalysisOptions,
) -> Result<EthnicDiff, AnalysisError> {
    dataset.require_area(area)?;

    let in_window = |r: &&Record| options.ethnic_ids.contains(&r.ethnic_group_id);

    let national = sum_by(
        dataset.records().iter().filter(in_window),
        |r| r.ethnic_group.as_str(),
    );
    let local = sum_by(
        dataset.area_records(area).filter(in_window),
        |r| r.ethnic_group.as_str(),
    );

    let national_total: u64 = national.values().sum();
    let local_total: u64 = local.values().sum();

    let groups: BTreeSet<&String> = national.keys().chain(local.keys()).collect();

    // Keyed by the raw label: two raw labels may share a display label.
    let mut keyed: Vec<(&String, EthnicShareComparison)> = groups
        .into_iter()
        .map(|group| {
            let count_all = national.get(group).copied().unwrap_or(0);
            let count_area = local.get(group).copied().unwrap_or(0);
            let pct_share_all = Ratio::percentage(count_all, national_total);
            let pct_share_area = Ratio::percentage(count_area, local_total);

            let row = EthnicShareComparison {
                ethnic_group: display_label(group, &options.label_prefix),
                count_area,
                pct_share_area,
                count_all,
                pct_share_all,
                pct_share_diff: pct_share_area.diff(pct_share_all),
            };
            (group, row)
        })
        .collect();

    keyed.sort_by(|(a_key, a), (b_key, b)| {
        a.pct_share_diff
            .cmp_desc_undefined_last(&b.pct_share_diff)
            .then_with(|| a_key.cmp(b_key))
    });

    let mut labels = BTreeSet::new();
    for (key, row) in &keyed {
        if !labels.insert(row.ethnic_group.clone()) {
            warn!(
                "Ethnic group '{}' shares the display label '{}' with another group",
                key, row.ethnic_group
            );
        }
    }

    let rows: Vec<EthnicShareComparison> = keyed.into_iter().map(|(_, row)| row).collect();

    if local_total == 0 {
        debug!("Area '{}' has no population in the ID window", area);
    }

    let n = options.top_n.min(rows.len());
    let top = rows[..n].to_vec();
    let bottom = rows[rows.len() - n..].to_vec();

    Ok(EthnicDiff {
        area: area.to_string(),
        rows,
        top,
        bottom,
    })
}

fn display_label(label: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return label.to_string();
    }
    label.strip_prefix(prefix).unwrap_or(label).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "Mixed or Multiple ethnic groups: ";

    fn shares_dataset() -> Dataset {
        Dataset::from_records(vec![
            Record::new("Dacorum", "White", "White: English", 1, 900),
            Record::new("Dacorum", "Asian", "Asian: Indian", 2, 60),
            Record::new("Dacorum", "Mixed", "Mixed: Other", 3, 40),
            Record::new("Watford", "White", "White: English", 1, 500),
            Record::new("Watford", "Asian", "Asian: Indian", 2, 300),
            Record::new("Watford", "Black", "Black: African", 4, 100),
            Record::new("Watford", "Mixed", "Mixed: Other", 3, 100),
        ])
    }

    #[test]
    fn test_pct_shares_exclude_white() {
        let pair =
            ethnic_pct_shares(&shares_dataset(), "Dacorum", &AnalysisOptions::default()).unwrap();

        assert!(pair.all_areas.iter().all(|s| s.group != "White"));
        assert!(pair.area_shares.iter().all(|s| s.group != "White"));

        let groups: Vec<_> = pair.all_areas.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(groups, vec!["Asian", "Black", "Mixed"]);

        let aligned: Vec<_> = pair.area_shares.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(aligned, groups);
    }

    #[test]
    fn test_pct_shares_values() {
        let pair =
            ethnic_pct_shares(&shares_dataset(), "Dacorum", &AnalysisOptions::default()).unwrap();

        // national non-white: Asian 360, Black 100, Mixed 140 of 600
        assert_eq!(pair.all_areas[0].count, 360);
        assert_eq!(pair.all_areas[0].pct_share, Ratio::Defined(60.0));

        // Dacorum non-white: Asian 60, Mixed 40 of 100; Black absent
        assert_eq!(pair.area_shares[0].pct_share, Ratio::Defined(60.0));
        assert_eq!(pair.area_shares[1].count, 0);
        assert_eq!(pair.area_shares[1].pct_share, Ratio::Defined(0.0));
        assert_eq!(pair.area_shares[2].pct_share, Ratio::Defined(40.0));
    }

    #[test]
    fn test_pct_shares_all_white_area_is_undefined() {
        let mut records = shares_dataset().records().to_vec();
        records.push(Record::new("Tring", "White", "White: English", 1, 50));
        let dataset = Dataset::from_records(records);

        let pair = ethnic_pct_shares(&dataset, "Tring", &AnalysisOptions::default()).unwrap();
        assert!(pair.area_shares.iter().all(|s| s.pct_share.is_undefined()));
        assert!(pair.all_areas.iter().all(|s| !s.pct_share.is_undefined()));
    }

    #[test]
    fn test_unknown_area() {
        let dataset = shares_dataset();
        let options = AnalysisOptions::default();

        assert!(matches!(
            ethnic_pct_shares(&dataset, "Atlantis", &options),
            Err(AnalysisError::UnknownArea(_))
        ));
        assert!(matches!(
            ethnic_diff(&dataset, "Atlantis", &options),
            Err(AnalysisError::UnknownArea(_))
        ));
    }

    fn mixed_dataset() -> Dataset {
        let mut records = Vec::new();
        // twelve fine groups inside the window plus one outside it
        for i in 0..12u64 {
            let label = format!("{}Group {:02}", MIXED, i);
            let id = 88 + i as i64;
            records.push(Record::new("Dacorum", "Mixed", &label, id, 10 + i * 5));
            records.push(Record::new("Watford", "Mixed", &label, id, 100 - i * 5));
        }
        records.push(Record::new("Dacorum", "White", "White: English", 10, 5000));
        records.push(Record::new("Watford", "Other", "Other: Arab", 145, 70));
        Dataset::from_records(records)
    }

    #[test]
    fn test_ethnic_diff_ordering_and_slices() {
        let diff = ethnic_diff(&mixed_dataset(), "Dacorum", &AnalysisOptions::default()).unwrap();

        assert_eq!(diff.rows.len(), 12);
        assert_eq!(diff.top.len(), 5);
        assert_eq!(diff.bottom.len(), 5);

        for pair in diff.rows.windows(2) {
            let (a, b) = (pair[0].pct_share_diff, pair[1].pct_share_diff);
            assert!(a.value().unwrap() >= b.value().unwrap());
        }

        let top_min = diff
            .top
            .iter()
            .filter_map(|r| r.pct_share_diff.value())
            .fold(f64::INFINITY, f64::min);
        let bottom_max = diff
            .bottom
            .iter()
            .filter_map(|r| r.pct_share_diff.value())
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(top_min >= bottom_max);

        let labels: BTreeSet<_> = diff.rows.iter().map(|r| r.ethnic_group.clone()).collect();
        for row in diff.top.iter().chain(diff.bottom.iter()) {
            assert!(labels.contains(&row.ethnic_group));
        }

        // Dacorum grows with the index, so the last group leads.
        assert_eq!(diff.top[0].ethnic_group, "Group 11");
        assert_eq!(diff.bottom[4].ethnic_group, "Group 00");
    }

    #[test]
    fn test_ethnic_diff_respects_id_window() {
        let diff = ethnic_diff(&mixed_dataset(), "Dacorum", &AnalysisOptions::default()).unwrap();
        assert!(diff.rows.iter().all(|r| !r.ethnic_group.starts_with("White")));
        assert!(diff.rows.iter().all(|r| !r.ethnic_group.starts_with("Other")));

        let narrow = AnalysisOptions {
            ethnic_ids: 88..=89,
            ..AnalysisOptions::default()
        };
        let diff = ethnic_diff(&mixed_dataset(), "Dacorum", &narrow).unwrap();
        assert_eq!(diff.rows.len(), 2);
    }

    #[test]
    fn test_ethnic_diff_ties_break_on_raw_label() {
        let dataset = Dataset::from_records(vec![
            Record::new("Dacorum", "Mixed", "Z", 90, 10),
            Record::new("Dacorum", "Mixed", &format!("{}Z", MIXED), 91, 30),
            Record::new("Watford", "Mixed", "Z", 90, 10),
            Record::new("Watford", "Mixed", &format!("{}Z", MIXED), 91, 30),
        ]);

        let diff = ethnic_diff(&dataset, "Dacorum", &AnalysisOptions::default()).unwrap();

        assert_eq!(diff.rows.len(), 2);
        assert!(diff.rows.iter().all(|r| r.ethnic_group == "Z"));
        assert!(diff.rows.iter().all(|r| r.pct_share_diff == Ratio::Defined(0.0)));
        // The prefixed raw label sorts before the bare one.
        assert_eq!(diff.rows[0].count_area, 30);
        assert_eq!(diff.rows[1].count_area, 10);
    }

    #[test]
    fn test_ethnic_diff_strips_prefix() {
        let diff = ethnic_diff(&mixed_dataset(), "Watford", &AnalysisOptions::default()).unwrap();
        assert!(diff.rows.iter().all(|r| !r.ethnic_group.starts_with(MIXED)));

        let keep = AnalysisOptions {
            label_prefix: String::new(),
            ..AnalysisOptions::default()
        };
        let diff = ethnic_diff(&mixed_dataset(), "Watford", &keep).unwrap();
        assert!(diff.rows.iter().all(|r| r.ethnic_group.starts_with(MIXED)));
    }

    #[test]
    fn test_ethnic_diff_outer_join_keeps_one_sided_groups() {
        let dataset = Dataset::from_records(vec![
            Record::new("Dacorum", "Mixed", "Mixed: A", 90, 10),
            Record::new("Watford", "Mixed", "Mixed: A", 90, 30),
            Record::new("Watford", "Mixed", "Mixed: B", 91, 60),
        ]);

        let diff = ethnic_diff(&dataset, "Dacorum", &AnalysisOptions::default()).unwrap();
        assert_eq!(diff.rows.len(), 2);

        let b = diff.rows.iter().find(|r| r.ethnic_group == "Mixed: B").unwrap();
        assert_eq!(b.count_area, 0);
        assert_eq!(b.pct_share_area, Ratio::Defined(0.0));
        assert_eq!(b.count_all, 60);
        assert_eq!(b.pct_share_all, Ratio::Defined(60.0));
        assert_eq!(b.pct_share_diff, Ratio::Defined(-60.0));

        let a = diff.rows.iter().find(|r| r.ethnic_group == "Mixed: A").unwrap();
        assert_eq!(a.pct_share_diff, Ratio::Defined(60.0));
        assert_eq!(diff.top[0].ethnic_group, "Mixed: A");
    }

    #[test]
    fn test_ethnic_diff_area_without_window_population() {
        let dataset = Dataset::from_records(vec![
            Record::new("Dacorum", "White", "White: English", 10, 100),
            Record::new("Watford", "Mixed", "Mixed: A", 90, 30),
            Record::new("Watford", "Mixed", "Mixed: B", 91, 60),
        ]);

        let diff = ethnic_diff(&dataset, "Dacorum", &AnalysisOptions::default()).unwrap();
        assert_eq!(diff.rows.len(), 2);
        assert!(diff.rows.iter().all(|r| r.pct_share_area.is_undefined()));
        assert!(diff.rows.iter().all(|r| r.pct_share_diff.is_undefined()));
        assert_eq!(diff.top.len(), 2);
    }

    #[test]
    fn test_fewer_rows_than_top_n() {
        let dataset = Dataset::from_records(vec![
            Record::new("Dacorum", "Mixed", "Mixed: A", 90, 10),
            Record::new("Watford", "Mixed", "Mixed: B", 91, 60),
        ]);
        let diff = ethnic_diff(&dataset, "Dacorum", &AnalysisOptions::default()).unwrap();
        assert_eq!(diff.top.len(), 2);
        assert_eq!(diff.bottom.len(), 2);
    }
}
