use thiserror::Error;

use tn_core::SimTime;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("event at {at} is not in the future (current time is {now})")]
    NotInFuture { at: SimTime, now: SimTime },

    #[error("event time {0} is not finite")]
    NonFinite(SimTime),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
