//! [`Handler`] abstractions.

use std::future::Future;

/// Asynchronous operation executed against some backend or service.
///
/// Implemented once per argument type, so a single value may serve many
/// operations (e.g. [`Select`]ing listings and facet counts).
///
/// [`Select`]: crate::operations::Select
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
