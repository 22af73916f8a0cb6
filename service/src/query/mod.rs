//! [`Query`] definition.

pub mod facets;
pub mod listings;

use std::time::Duration;

use common::operations::{By, Select};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    infra::{backend, Backend},
    Service,
};
#[cfg(doc)]
use crate::Config;

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Backend`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct BackendQuery<T>(T);

impl<W, B> BackendQuery<By<W, B>> {
    /// Creates a new [`BackendQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

/// Traced [`ExecutionError`] of any [`Query`].
pub type Error = Traced<ExecutionError>;

/// Error of executing a [`BackendQuery`].
#[derive(Debug, Display, StdError)]
pub enum ExecutionError {
    /// [`Backend`] failed to answer.
    #[display("`Backend` failed: {_0}")]
    Backend(backend::Error),

    /// [`Backend`] did not answer within the [`Config::timeout`].
    #[display("`Backend` did not answer within {_0:?}")]
    Timeout(#[error(not(source))] Duration),
}

impl From<backend::Error> for ExecutionError {
    fn from(e: backend::Error) -> Self {
        Self::Backend(e)
    }
}

impl<Bk, W, B> Query<BackendQuery<By<W, B>>> for Service<Bk>
where
    Bk: Backend<Select<By<W, B>>, Ok = W, Err = Traced<backend::Error>>,
{
    type Ok = W;
    type Err = Error;

    async fn execute(
        &self,
        BackendQuery(by): BackendQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        let timeout = self.config().timeout;
        tokio::time::timeout(timeout, self.backend().execute(Select(by)))
            .await
            .map_err(|_| tracerr::new!(ExecutionError::Timeout(timeout)))?
            .map_err(tracerr::map_from_and_wrap!())
    }
}
