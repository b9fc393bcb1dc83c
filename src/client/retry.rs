use chrono::{NaiveDateTime, Utc};
use log::{error, info, warn};

use super::{Client, Request};

use crate::{
    cycle::Cycle, errors::GfsFetchErr, filter, plan::DownloadPlan, remote::Remote,
};

/// Where a planning run stands.
///
/// A run starts `Initial`. When the indices of the requested cycle are not available it moves to
/// `Retrying` with the cycle 6 hours earlier, one more failure ends it in `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// Planning the requested cycle.
    Initial,
    /// Planning the cycle before the requested one.
    Retrying,
    /// Both attempts failed.
    Failed,
}

impl RetryState {
    /// The state after an attempt that found no index.
    pub fn on_unavailable(self) -> Self {
        match self {
            RetryState::Initial => RetryState::Retrying,
            RetryState::Retrying | RetryState::Failed => RetryState::Failed,
        }
    }
}

/// A successful plan with the cycle it was made for.
#[derive(Clone, Debug, PartialEq)]
pub struct Planned {
    /// The cycle the plan belongs to, possibly one earlier than requested.
    pub cycle: Cycle,
    /// What to download.
    pub plan: DownloadPlan,
    /// `Initial` or `Retrying`, the attempt that succeeded.
    pub state: RetryState,
}

impl<R: Remote> Client<R> {
    /// Plan the retrieval for the run selected in `request`, the latest run if it has no date.
    pub fn plan(&self, request: &Request) -> Result<Planned, GfsFetchErr> {
        self.plan_at(request, Utc::now().naive_utc())
    }

    /// Same as `plan`, with the current time given.
    pub fn plan_at(&self, request: &Request, now: NaiveDateTime) -> Result<Planned, GfsFetchErr> {
        filter::validate_all(&request.parameter)?;

        let mut cycle = Cycle::resolve(request.date, request.time, now)?;
        let mut state = RetryState::Initial;

        loop {
            info!("Planning the {} run", cycle);

            match self.plan_cycle(&cycle, request) {
                Ok(plan) => return Ok(Planned { cycle, plan, state }),
                Err(err) if err.is_index_unavailable() => {
                    state = state.on_unavailable();
                    if state == RetryState::Failed {
                        error!("{}", err);
                        return Err(err);
                    }

                    warn!(
                        "Forecast {} not (completely) available yet: {}. \
                         Trying a forecast 6 hrs earlier.",
                        cycle, err
                    );
                    cycle = cycle.previous();
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn plan_cycle(&self, cycle: &Cycle, request: &Request) -> Result<DownloadPlan, GfsFetchErr> {
        if let Some(expected) = request.expected_files {
            self.verify_file_set(cycle, expected)?;
        }

        let urls = self.formatter.urls(cycle, &request.steps);
        let indices = self.fetch_indices(&urls)?;

        DownloadPlan::build(&indices, &request.parameter, &request.validity)
    }
}
