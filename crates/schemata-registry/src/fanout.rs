//! Bounded concurrent fan-out for bulk loads.

use std::future::Future;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::RegistryError;

/// The result of loading one item.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    /// What was loaded.
    pub item: T,
    /// `Ok` when it loaded.
    pub result: Result<(), RegistryError>,
}

/// Per-item results of a bulk load, in input order.
#[derive(Debug)]
pub struct LoadReport<T> {
    /// One outcome per input item.
    pub outcomes: Vec<LoadOutcome<T>>,
}

impl<T> LoadReport<T> {
    /// Items that loaded.
    pub fn succeeded(&self) -> impl Iterator<Item = &T> + '_ {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| &o.item)
    }

    /// Items that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&T, &RegistryError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.item, e)))
    }

    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// Number of items attempted.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing was attempted.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether every item loaded.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    /// Counts suitable for logging or printing.
    pub fn summary(&self) -> LoadSummary {
        let failed = self.failed();
        LoadSummary {
            attempted: self.len(),
            loaded: self.len() - failed,
            failed,
        }
    }
}

/// Aggregate counts of a [`LoadReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Items attempted.
    pub attempted: usize,
    /// Items that loaded.
    pub loaded: usize,
    /// Items that failed.
    pub failed: usize,
}

/// Run `f` over `items` with at most `concurrency` in flight.
///
/// Results are yielded in input order regardless of completion order.
pub(crate) async fn fan_out<I, T, R, F, Fut>(items: I, concurrency: usize, f: F) -> Vec<(T, R)>
where
    I: IntoIterator<Item = T>,
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(|item| {
            let fut = f(item.clone());
            async move { (item, fut.await) }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
