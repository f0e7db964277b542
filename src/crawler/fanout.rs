//! Bounded fan-out over independent fetch units
//!
//! Units are started in submission order with at most `width` in flight, and
//! their results are yielded in submission order, so callers can commit them
//! by index and keep tree order independent of arrival order.

use crate::config::FailurePolicy;
use crate::FetchError;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Results of a fan-out, in submission order
#[derive(Debug)]
pub(crate) struct Outcome<U, T> {
    pub fetched: Vec<(U, T)>,
    pub failed: Vec<(U, FetchError)>,
}

/// Runs `fetch` for every unit
///
/// Under `FailurePolicy::Abort` the first failure in submission order is
/// returned and any fetches still in flight are dropped.
pub(crate) async fn fan_out<U, T, F, Fut>(
    units: Vec<U>,
    width: usize,
    policy: FailurePolicy,
    fetch: F,
) -> Result<Outcome<U, T>, (U, FetchError)>
where
    U: Copy,
    F: Fn(U) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut results = std::pin::pin!(stream::iter(units)
        .map(|unit| {
            let pending = fetch(unit);
            async move { (unit, pending.await) }
        })
        .buffered(width.max(1)));

    let mut outcome = Outcome {
        fetched: Vec::new(),
        failed: Vec::new(),
    };

    while let Some((unit, result)) = results.next().await {
        match result {
            Ok(value) => outcome.fetched.push((unit, value)),
            Err(error) => match policy {
                FailurePolicy::Abort => return Err((unit, error)),
                FailurePolicy::Isolate => outcome.failed.push((unit, error)),
            },
        }
    }

    Ok(outcome)
}
