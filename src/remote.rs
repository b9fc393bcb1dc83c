//! Access to the server holding the forecast files.

use std::convert::TryFrom;

use regex::Regex;
use reqwest::{
    blocking::{Client, Response},
    header, StatusCode,
};

use crate::errors::GfsFetchErr;

/// What the planner and downloader need from a server.
pub trait Remote {
    /// Size of the resource in bytes.
    fn content_length(&self, url: &str) -> Result<u64, GfsFetchErr>;

    /// A text resource, e.g. an index file.
    fn fetch_text(&self, url: &str) -> Result<String, GfsFetchErr>;

    /// `length` bytes starting at `offset`.
    fn fetch_range(&self, url: &str, offset: u64, length: u64) -> Result<Vec<u8>, GfsFetchErr>;

    /// Names of the entries of a directory.
    fn list_directory(&self, url: &str) -> Result<Vec<String>, GfsFetchErr>;
}

/// A `Remote` over HTTP(S).
#[derive(Clone, Debug, Default)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    /// Create a new connection pool.
    pub fn new() -> Self {
        HttpRemote {
            client: Client::new(),
        }
    }

    fn check(url: &str, response: Response) -> Result<Response, GfsFetchErr> {
        match response.status() {
            status if status.is_success() => Ok(response),
            status => Err(GfsFetchErr::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            }),
        }
    }
}

impl Remote for HttpRemote {
    fn content_length(&self, url: &str) -> Result<u64, GfsFetchErr> {
        let response = Self::check(url, self.client.head(url).send()?)?;

        response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok())
            .ok_or_else(|| GfsFetchErr::GeneralError(format!("no content length for {}", url)))
    }

    fn fetch_text(&self, url: &str) -> Result<String, GfsFetchErr> {
        let response = Self::check(url, self.client.get(url).send()?)?;
        Ok(response.text()?)
    }

    fn fetch_range(&self, url: &str, offset: u64, length: u64) -> Result<Vec<u8>, GfsFetchErr> {
        if length == 0 {
            return Ok(vec![]);
        }

        let range = format!("bytes={}-{}", offset, offset + length - 1);
        let response = Self::check(
            url,
            self.client.get(url).header(header::RANGE, range).send()?,
        )?;

        // A server ignoring the range sends the whole file with 200.
        let whole_file = response.status() == StatusCode::OK;
        let bytes = response.bytes()?;

        if whole_file {
            return slice_range(&bytes, offset, length)
                .map(|slice| slice.to_vec())
                .ok_or_else(|| {
                    GfsFetchErr::GeneralError(format!(
                        "range {}+{} beyond {}",
                        offset, length, url
                    ))
                });
        }

        Ok(bytes.to_vec())
    }

    fn list_directory(&self, url: &str) -> Result<Vec<String>, GfsFetchErr> {
        let page = self.fetch_text(url)?;
        hrefs(&page)
    }
}

/// The bytes at `offset..offset + length`, `None` when they are not all within `bytes`.
fn slice_range(bytes: &[u8], offset: u64, length: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let end = offset
        .checked_add(length)
        .and_then(|end| usize::try_from(end).ok())?;

    bytes.get(start..end)
}

/// Link targets of an HTML directory listing, parent and sort links dropped.
///
/// Attribute names are matched in any case and values may be double, single, or not quoted.
pub(crate) fn hrefs(page: &str) -> Result<Vec<String>, GfsFetchErr> {
    let re = Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)?;

    let targets = re
        .captures_iter(page)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)))
        .map(|m| m.as_str())
        .filter(|target| {
            !target.is_empty() && !target.starts_with('?') && !target.starts_with("..")
        })
        .map(|target| target.trim_end_matches('/'))
        .map(|target| target.rsplit('/').next().unwrap_or(target).to_owned())
        .collect();

    Ok(targets)
}
