use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use itertools::izip;
use log::{info, warn};

use super::{Client, Planned, Request};

use crate::{
    cycle::Cycle,
    errors::GfsFetchErr,
    plan::{DownloadPlan, PlanEntry, SelectedRange},
    remote::Remote,
};

/// The result of downloading a plan.
#[derive(Clone, Debug, PartialEq)]
pub struct Retrieval {
    /// The cycle the files belong to.
    pub cycle: Cycle,
    /// The plan that was downloaded.
    pub plan: DownloadPlan,
    /// Local files, one per plan entry.
    pub targets: Vec<PathBuf>,
    /// Bytes expected per file.
    pub expected: Vec<u64>,
    /// Bytes written per file.
    pub written: Vec<u64>,
}

impl Retrieval {
    /// True if every file got exactly the planned number of bytes.
    pub fn sizes_match(&self) -> bool {
        self.expected == self.written
    }

    /// The first file with a wrong size, as an error.
    pub fn check_sizes(&self) -> Result<(), GfsFetchErr> {
        izip!(&self.targets, &self.expected, &self.written)
            .find(|(_, expected, written)| expected != written)
            .map_or(Ok(()), |(target, &expected, &written)| {
                Err(GfsFetchErr::SizeMismatch {
                    target: target.display().to_string(),
                    expected,
                    written,
                })
            })
    }
}

/// Merge parts that follow each other without a gap into one range. Order is kept.
pub(crate) fn coalesce(parts: &[SelectedRange]) -> Vec<SelectedRange> {
    parts.iter().fold(Vec::with_capacity(parts.len()), |mut acc, part| {
        match acc.last_mut() {
            Some(last) if last.end() == part.offset => last.length += part.length,
            _ => acc.push(*part),
        }
        acc
    })
}

/// Local file name for the `n`th plan entry, `download.grib2` becomes `download0.grib2`, ...
pub(crate) fn target_name(target: &str, n: usize) -> String {
    let stem = target.split(".grib2").next().unwrap_or(target);
    format!("{}{}.grib2", stem, n)
}

impl<R: Remote> Client<R> {
    /// Plan and download in one go.
    pub fn retrieve(&self, request: &Request, data_dir: &Path) -> Result<Retrieval, GfsFetchErr> {
        let planned = self.plan(request)?;
        self.download(planned, data_dir, &request.target)
    }

    /// Download every entry of a plan into `data_dir`.
    pub fn download(
        &self,
        planned: Planned,
        data_dir: &Path,
        target: &str,
    ) -> Result<Retrieval, GfsFetchErr> {
        let Planned { cycle, plan, .. } = planned;

        let mut targets = Vec::with_capacity(plan.entries().len());
        let mut expected = Vec::with_capacity(plan.entries().len());
        let mut written = Vec::with_capacity(plan.entries().len());

        for (n, entry) in plan.entries().iter().enumerate() {
            let path = data_dir.join(target_name(target, n));
            info!("{} -> {}", entry.url, path.display());

            let size = self.download_entry(entry, &path)?;
            if size != entry.expected_size() {
                warn!(
                    "{}: expected {} bytes, got {}",
                    path.display(),
                    entry.expected_size(),
                    size
                );
            }

            targets.push(path);
            expected.push(entry.expected_size());
            written.push(size);
        }

        Ok(Retrieval {
            cycle,
            plan,
            targets,
            expected,
            written,
        })
    }

    fn download_entry(&self, entry: &PlanEntry, path: &Path) -> Result<u64, GfsFetchErr> {
        let mut out = BufWriter::new(File::create(path)?);
        let mut size = 0;

        for range in coalesce(&entry.parts) {
            let bytes = self
                .remote
                .fetch_range(&entry.url, range.offset, range.length)?;
            out.write_all(&bytes)?;
            size += bytes.len() as u64;
        }

        out.flush()?;
        Ok(size)
    }
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::{
        client::{unit::*, RetryState},
        filter::Filter,
        remote::unit::FakeRemote,
    };
    use std::fs;
    use tempdir::TempDir;

    fn ranges(pairs: &[(u64, u64)]) -> Vec<SelectedRange> {
        pairs.iter().map(|&p| SelectedRange::from(p)).collect()
    }

    #[test]
    fn test_coalesce() {
        assert_eq!(coalesce(&[]), vec![]);
        assert_eq!(
            coalesce(&ranges(&[(0, 10), (10, 20), (50, 5), (55, 5), (20, 3)])),
            ranges(&[(0, 30), (50, 10), (20, 3)])
        );
        // Out of order neighbours stay apart.
        assert_eq!(
            coalesce(&ranges(&[(10, 20), (0, 10)])),
            ranges(&[(10, 20), (0, 10)])
        );
    }

    #[test]
    fn test_target_name() {
        assert_eq!(target_name("download.grib2", 0), "download0.grib2");
        assert_eq!(target_name("data.grib2", 12), "data12.grib2");
        assert_eq!(target_name("gfs", 1), "gfs1.grib2");
    }

    #[test]
    fn test_retrieve() {
        let tmp = TempDir::new("gfs-fetch-retrieve").unwrap();
        let cycle = Cycle::parse("2025012306").unwrap();
        let client = Client::new(remote_with_run(&cycle, &[0, 3]), formatter());

        // TMP and UGRD are adjacent, a single range request per file.
        let filters = vec![Filter::new("tmp,ugrd")];
        let req = request(&cycle, &[0, 3], filters);
        let retrieval = client.retrieve(&req, tmp.path()).unwrap();

        assert!(retrieval.sizes_match());
        assert!(retrieval.check_sizes().is_ok());
        assert_eq!(retrieval.expected, vec![50, 50]);
        assert_eq!(
            retrieval.targets,
            vec![
                tmp.path().join("download0.grib2"),
                tmp.path().join("download1.grib2")
            ]
        );

        let contents = fs::read(tmp.path().join("download1.grib2")).unwrap();
        assert_eq!(contents, data(60)[10..].to_vec());

        let ranges: Vec<String> = client
            .remote
            .requests
            .borrow()
            .iter()
            .filter(|req| req.starts_with("RANGE"))
            .cloned()
            .collect();
        assert_eq!(
            ranges,
            vec![
                format!("RANGE {} 10+50", formatter().url(&cycle, 0)),
                format!("RANGE {} 10+50", formatter().url(&cycle, 3)),
            ]
        );
    }

    #[test]
    fn test_whole_file_without_filters() {
        let tmp = TempDir::new("gfs-fetch-whole").unwrap();
        let cycle = Cycle::parse("2025012306").unwrap();
        let client = Client::new(remote_with_run(&cycle, &[0]), formatter());

        let req = Request {
            target: "whole.grib2".to_owned(),
            ..request(&cycle, &[0], vec![])
        };
        let retrieval = client.retrieve(&req, tmp.path()).unwrap();

        assert_eq!(retrieval.written, vec![60]);
        assert_eq!(fs::read(tmp.path().join("whole0.grib2")).unwrap(), data(60));
    }

    #[test]
    fn test_planning_error_writes_nothing() {
        let tmp = TempDir::new("gfs-fetch-nothing").unwrap();
        let cycle = Cycle::parse("2025012306").unwrap();
        let client = Client::new(remote_with_run(&cycle, &[0]), formatter());

        let req = request(&cycle, &[0], vec![Filter::new("hgt")]);
        assert!(client.retrieve(&req, tmp.path()).is_err());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
        assert!(client
            .remote
            .requests
            .borrow()
            .iter()
            .all(|req| !req.starts_with("RANGE")));
    }

    #[test]
    fn test_empty_plan() {
        let tmp = TempDir::new("gfs-fetch-empty").unwrap();
        let client = Client::new(FakeRemote::default(), formatter());

        let planned = Planned {
            cycle: Cycle::parse("2025012306").unwrap(),
            plan: DownloadPlan::default(),
            state: RetryState::Initial,
        };
        let retrieval = client.download(planned, tmp.path(), "x.grib2").unwrap();
        assert!(retrieval.sizes_match());
        assert!(retrieval.targets.is_empty());
    }

    #[test]
    fn test_size_mismatch_reported() {
        let tmp = TempDir::new("gfs-fetch-short").unwrap();
        let cycle = Cycle::parse("2025012306").unwrap();
        let client = Client::new(remote_with_run(&cycle, &[0]), formatter());

        let req = request(&cycle, &[0], vec![Filter::new("prmsl")]);
        let retrieval = client.retrieve(&req, tmp.path()).unwrap();
        assert_eq!(retrieval.written, vec![10]);

        let short = Retrieval {
            written: vec![5],
            ..retrieval
        };
        assert!(!short.sizes_match());
        match short.check_sizes() {
            Err(GfsFetchErr::SizeMismatch {
                expected, written, ..
            }) => assert_eq!((expected, written), (10, 5)),
            res => panic!("unexpected {:?}", res),
        }
    }
}
