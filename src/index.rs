//! The `.idx` companion of a GRIB2 file, listing where each record starts.
//!
//! A line of an index looks like
//!
//! ```text
//! 581:400478852:d=2025012306:TMP:2 m above ground:3 hour fcst:
//! ```
//!
//! with the fields sequence number, byte offset, issuance time, short name, level, and validity.
//! Anything after the validity is ignored.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::errors::GfsFetchErr;

/// One record, a single field at one level and validity, inside a remote file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub(crate) seq: u32,
    pub(crate) offset: u64,
    pub(crate) length: u64,
    pub(crate) short_name: String,
    pub(crate) level: String,
    pub(crate) validity: String,
    pub(crate) issued: NaiveDateTime,
}

impl Record {
    /// Sequence number, 1 based.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Byte offset of the record in the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length of the record in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Parameter short name as written in the index, e.g. `TMP`.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Level description, e.g. `2 m above ground`.
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Validity description, e.g. `anl` or `3 hour fcst`.
    pub fn validity(&self) -> &str {
        &self.validity
    }

    /// Initialization time of the run the record belongs to.
    pub fn issued(&self) -> NaiveDateTime {
        self.issued
    }
}

/// A parsed index of one remote file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileIndex {
    url: String,
    total_length: u64,
    records: Vec<Record>,
}

// A record whose length is not known until its successor is parsed.
struct Pending {
    seq: u32,
    offset: u64,
    short_name: String,
    level: String,
    validity: String,
    issued: NaiveDateTime,
}

impl Pending {
    fn complete(self, end: u64) -> Record {
        Record {
            seq: self.seq,
            offset: self.offset,
            length: end - self.offset,
            short_name: self.short_name,
            level: self.level,
            validity: self.validity,
            issued: self.issued,
        }
    }
}

impl FileIndex {
    /// Marker in front of the issuance time.
    const DATE_PREFIX: &'static str = "d=";

    /// Parse the index text of the file at `url`, which is `total_length` bytes long.
    pub fn parse(url: &str, text: &str, total_length: u64) -> Result<Self, GfsFetchErr> {
        let malformed = |reason: String| GfsFetchErr::IndexUnavailable {
            url: url.to_owned(),
            reason,
        };

        let (mut records, last) = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                Self::parse_line(line).map_err(|msg| malformed(format!("{}: {}", msg, line)))
            })
            .try_fold(
                (Vec::<Record>::new(), None::<Pending>),
                |(mut done, prev), next| {
                    let next = next?;

                    match prev {
                        None => {
                            if next.seq != 1 || next.offset != 0 {
                                return Err(malformed(
                                    "index does not start at record 1, byte 0".to_owned(),
                                ));
                            }
                        }
                        Some(prev) => {
                            if next.seq != prev.seq + 1 {
                                return Err(malformed(format!(
                                    "record {} follows record {}",
                                    next.seq, prev.seq
                                )));
                            }
                            if next.offset < prev.offset {
                                return Err(malformed(format!(
                                    "offset of record {} before its predecessor",
                                    next.seq
                                )));
                            }
                            done.push(prev.complete(next.offset));
                        }
                    }

                    Ok((done, Some(next)))
                },
            )?;

        let last = last.ok_or_else(|| malformed("empty index".to_owned()))?;
        if last.offset > total_length {
            return Err(malformed(format!(
                "record {} starts beyond the end of the file ({} bytes)",
                last.seq, total_length
            )));
        }
        records.push(last.complete(total_length));

        Ok(FileIndex {
            url: url.to_owned(),
            total_length,
            records,
        })
    }

    fn parse_line(line: &str) -> Result<Pending, &'static str> {
        let mut fields: Vec<&str> = line.split(':').collect();
        // The trailing description, empty for most NCEP files.
        fields.pop();

        if fields.len() < 6 {
            return Err("too few fields");
        }

        let seq: u32 = fields[0].parse().map_err(|_| "invalid record number")?;
        let offset: u64 = fields[1].parse().map_err(|_| "invalid offset")?;
        let issued = Self::parse_issued(fields[2]).ok_or("invalid issuance time")?;

        Ok(Pending {
            seq,
            offset,
            short_name: fields[3].to_owned(),
            level: fields[4].to_owned(),
            validity: fields[5].to_owned(),
            issued,
        })
    }

    fn parse_issued(field: &str) -> Option<NaiveDateTime> {
        let stamp = field.strip_prefix(Self::DATE_PREFIX)?;
        if stamp.len() != 10 || !stamp.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let date = NaiveDate::parse_from_str(&stamp[..8], "%Y%m%d").ok()?;
        let hour: u32 = stamp[8..].parse().ok()?;
        date.and_hms_opt(hour, 0, 0)
    }

    /// URL of the indexed file.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Size of the indexed file in bytes.
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Records ordered by sequence number.
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}
