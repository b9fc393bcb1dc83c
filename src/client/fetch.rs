use std::{fs::File, io::BufWriter, thread, time::Duration};

use log::info;

use super::Client;

use crate::{cycle::Cycle, errors::GfsFetchErr, index::FileIndex, remote::Remote};

impl<R: Remote> Client<R> {
    /// Pause between two index downloads.
    ///
    /// NOMADS allows fewer than 120 hits a minute and blocks the address for about ten minutes
    /// when that is exceeded. Every HEAD and GET counts.
    pub const INDEX_COOLDOWN: Duration = Duration::from_millis(500);

    /// Fetch and parse the index of every URL, in order.
    ///
    /// Stops at the first file whose length or index can't be had, that error is
    /// `IndexUnavailable` and means the run is not (completely) on the server yet.
    pub fn fetch_indices(&self, urls: &[String]) -> Result<Vec<FileIndex>, GfsFetchErr> {
        let mut indices = Vec::with_capacity(urls.len());

        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                thread::sleep(Self::INDEX_COOLDOWN);
            }

            indices.push(self.fetch_index(url)?);
        }

        if let Some(ref path) = self.index_dump {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &indices)?;
        }

        Ok(indices)
    }

    fn fetch_index(&self, url: &str) -> Result<FileIndex, GfsFetchErr> {
        let unavailable = |err: GfsFetchErr| GfsFetchErr::IndexUnavailable {
            url: url.to_owned(),
            reason: err.to_string(),
        };

        let length = self.remote.content_length(url).map_err(unavailable)?;

        let index_url = format!("{}.idx", url);
        let text = self.remote.fetch_text(&index_url).map_err(unavailable)?;
        info!("Index file {} downloaded", index_url);

        FileIndex::parse(url, &text, length)
    }

    /// Check the directory of a run lists exactly `expected` data files.
    pub fn verify_file_set(&self, cycle: &Cycle, expected: usize) -> Result<usize, GfsFetchErr> {
        let dir = self.formatter.cycle_dir(cycle);
        let data_file = self.formatter.data_file_regex(cycle)?;

        let found = self
            .remote
            .list_directory(&dir)?
            .iter()
            .filter(|name| data_file.is_match(name))
            .count();

        info!("Number of files in {}: {}", dir, found);

        if found != expected {
            return Err(GfsFetchErr::FileSetIncomplete { expected, found });
        }

        Ok(found)
    }
}
