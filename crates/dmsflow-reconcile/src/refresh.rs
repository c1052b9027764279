//! Refresh strategy
//!
//! A [`Refresh`] fetches the current remote view of one entity and reduces
//! it to a state string. Pollers are written once against this trait and
//! reused for instances, jobs, binding sets, and connector tasks.

use crate::error::FetchError;
use async_trait::async_trait;
use std::future::Future;

/// One observation of a remote entity
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// The fetched object; `None` when the remote side has nothing to show yet
    pub object: Option<T>,

    /// State string matched against pending/target sets
    pub state: String,
}

impl<T> Snapshot<T> {
    pub fn new(object: T, state: impl Into<String>) -> Self {
        Self {
            object: Some(object),
            state: state.into(),
        }
    }

    /// Observation without an object (gone, or not visible yet)
    pub fn missing(state: impl Into<String>) -> Self {
        Self {
            object: None,
            state: state.into(),
        }
    }

    pub fn into_object(self) -> Option<T> {
        self.object
    }
}

/// Fetches the current state of one remote entity
#[async_trait]
pub trait Refresh: Send + Sync {
    type Output: Send;

    async fn refresh(&self) -> Result<Snapshot<Self::Output>, FetchError>;
}

/// Closure-backed [`Refresh`]
pub struct RefreshFn<F>(F);

/// Wrap an async closure as a [`Refresh`]
///
/// ```
/// use dmsflow_reconcile::{FetchError, Snapshot, refresh_fn};
///
/// let refresh = refresh_fn(|| async { Ok::<_, FetchError>(Snapshot::new((), "RUNNING")) });
/// # let _ = refresh;
/// ```
pub fn refresh_fn<F>(f: F) -> RefreshFn<F> {
    RefreshFn(f)
}

#[async_trait]
impl<F, Fut, T> Refresh for RefreshFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Snapshot<T>, FetchError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    async fn refresh(&self) -> Result<Snapshot<T>, FetchError> {
        (self.0)().await
    }
}
