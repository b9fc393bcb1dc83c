//! Turn parsed indices and filters into the list of byte ranges to download.

use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    errors::GfsFetchErr,
    filter::{self, Filter},
    index::FileIndex,
};

/// A contiguous run of bytes inside a remote file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SelectedRange {
    /// First byte.
    pub offset: u64,
    /// Number of bytes.
    pub length: u64,
}

impl SelectedRange {
    /// One past the last byte.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

impl From<(u64, u64)> for SelectedRange {
    fn from(pair: (u64, u64)) -> Self {
        Self {
            offset: pair.0,
            length: pair.1,
        }
    }
}

/// The ranges wanted from one remote file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// The remote file.
    pub url: String,
    /// Ranges in the order they were first selected.
    pub parts: Vec<SelectedRange>,
}

impl PlanEntry {
    /// Bytes this entry downloads.
    pub fn expected_size(&self) -> u64 {
        self.parts.iter().map(|part| part.length).sum()
    }
}

/// Everything to download for one retrieval, in the order of the requested URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DownloadPlan {
    entries: Vec<PlanEntry>,
}

impl DownloadPlan {
    /// Build the plan. Without filters every file is requested as a whole.
    ///
    /// With filters each file needs at least one matching record, a file without any match is an
    /// error and no plan is returned at all.
    pub fn build(
        indices: &[FileIndex],
        filters: &[Filter],
        default_validity: &[String],
    ) -> Result<Self, GfsFetchErr> {
        filter::validate_all(filters)?;

        let entries = indices
            .iter()
            .map(|idx| {
                let parts = select_ranges(idx, filters, default_validity)?;
                info!("{} range(s) selected from {}", parts.len(), idx.url());
                Ok(PlanEntry {
                    url: idx.url().to_owned(),
                    parts,
                })
            })
            .collect::<Result<Vec<PlanEntry>, GfsFetchErr>>()?;

        Ok(DownloadPlan { entries })
    }

    /// The entries, one per remote file.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// True if there is nothing to download.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes of the plan.
    pub fn expected_size(&self) -> u64 {
        self.entries.iter().map(PlanEntry::expected_size).sum()
    }
}

/// Byte ranges of one file matched by the filters, de-duplicated in first-seen order.
pub fn select_ranges(
    index: &FileIndex,
    filters: &[Filter],
    default_validity: &[String],
) -> Result<Vec<SelectedRange>, GfsFetchErr> {
    if filters.is_empty() {
        return Ok(vec![SelectedRange {
            offset: 0,
            length: index.total_length(),
        }]);
    }

    let parts: Vec<SelectedRange> = filter::matching(index.records(), filters, default_validity)
        .map(|rec| SelectedRange::from((rec.offset(), rec.length())))
        .unique()
        .collect();

    if parts.is_empty() {
        return Err(GfsFetchErr::NoFilterMatch(index.url().to_owned()));
    }

    Ok(parts)
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::index::unit::{SAMPLE, SAMPLE_LENGTH};

    fn sample(url: &str) -> FileIndex {
        FileIndex::parse(url, SAMPLE, SAMPLE_LENGTH).unwrap()
    }

    #[test]
    fn test_no_filter_is_whole_file() {
        let idx = sample("a");
        let parts = select_ranges(&idx, &[], &[]).unwrap();
        assert_eq!(parts, vec![SelectedRange::from((0, SAMPLE_LENGTH))]);
    }

    #[test]
    fn test_duplicates_removed_in_first_seen_order() {
        let idx = sample("a");
        let filters = vec![
            Filter::new("ugrd,tmp"),
            Filter::new(vec!["tmp"]).with_type_of_level("heightAboveGround"),
            Filter::new("prmsl"),
        ];

        let parts = select_ranges(&idx, &filters, &[]).unwrap();
        let offsets: Vec<u64> = parts.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 1184582, 1998301, 2502330]);
    }

    #[test]
    fn test_select_is_idempotent() {
        let idx = sample("a");
        let filters = vec![Filter::new("tmp"), Filter::new("ugrd")];

        let first = select_ranges(&idx, &filters, &[]).unwrap();
        let second = select_ranges(&idx, &filters, &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_match_is_an_error() {
        let idx = sample("a");
        match select_ranges(&idx, &[Filter::new("hgt")], &[]) {
            Err(GfsFetchErr::NoFilterMatch(url)) => assert_eq!(url, "a"),
            res => panic!("unexpected {:?}", res),
        }
    }

    #[test]
    fn test_plan_keeps_url_order() {
        let indices = vec![sample("b"), sample("a"), sample("c")];
        let plan = DownloadPlan::build(&indices, &[Filter::new("prmsl")], &[]).unwrap();

        let urls: Vec<&str> = plan.entries().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "a", "c"]);
        assert_eq!(plan.expected_size(), 3 * 990253);
    }

    #[test]
    fn test_malformed_filter_rejected() {
        let indices = vec![sample("a")];
        let flt = Filter::new("tmp").with_level("2");
        match DownloadPlan::build(&indices, &[flt], &[]) {
            Err(GfsFetchErr::MalformedFilter(_)) => {}
            res => panic!("unexpected {:?}", res),
        }
    }
}
