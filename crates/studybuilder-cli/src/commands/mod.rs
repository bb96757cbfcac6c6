pub mod config;
pub mod duration;
pub mod schedule;
pub mod study;

use std::error::Error;
use std::future::Future;

/// Drive one async core call to completion on a fresh runtime.
pub fn block_on<T, E>(future: impl Future<Output = Result<T, E>>) -> Result<T, Box<dyn Error>>
where
    E: Into<Box<dyn Error>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future).map_err(Into::into)
}
