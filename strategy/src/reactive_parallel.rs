//! Streaming pipeline fanned out across the shared worker pool.
//!
//! Stages, in order:
//!
//! 1. A source stream emits dataset indices.
//! 2. Fan-out: each element becomes one worker-pool task that answers
//!    through a oneshot channel, so elements transform concurrently and may
//!    finish out of input order.
//! 3. Re-sequencing: `buffered` polls up to `parallelism` answers at once
//!    but yields them strictly in emission order. Without this stage the
//!    output would follow pool completion order.
//! 4. Completion: the stream is driven and collected on the context's
//!    single-threaded completion scheduler.
//! 5. A one-shot bridge blocks the caller until the collection resolves (or
//!    a deadline expires; expiry abandons, it does not cancel).

use crate::{completion, widen, Dataset, Error, ExecutionContext};
use futures::{channel::oneshot, stream, FutureExt, StreamExt, TryStreamExt};
use std::{sync::Arc, time::Duration};

/// Widens every element through the fan-out pipeline, blocking until the
/// collected result comes back from the completion scheduler.
pub fn transform(dataset: &Dataset, context: &ExecutionContext) -> Result<Vec<i64>, Error> {
    transform_with(dataset, context, None, |_, value| Ok(widen(value)))
}

/// Like [`transform`], but gives up with [`Error::Timeout`] once `deadline`
/// elapses. In-flight worker tasks are abandoned, not cancelled; they finish
/// in the background and their results are discarded.
pub fn transform_within(
    dataset: &Dataset,
    context: &ExecutionContext,
    deadline: Duration,
) -> Result<Vec<i64>, Error> {
    transform_with(dataset, context, Some(deadline), |_, value| Ok(widen(value)))
}

pub(crate) fn transform_with<F>(
    dataset: &Dataset,
    context: &ExecutionContext,
    deadline: Option<Duration>,
    f: F,
) -> Result<Vec<i64>, Error>
where
    F: Fn(usize, i32) -> Result<i64, Error> + Send + Sync + 'static,
{
    let len = dataset.len();
    let values = dataset.share();
    let pool = context.pool_handle();
    let width = context.parallelism();
    let transform = Arc::new(f);

    let pipeline = stream::iter(0..len)
        .map(move |index| {
            let value = values[index];
            let transform = Arc::clone(&transform);
            let (sender, receiver) = oneshot::channel();
            pool.spawn(move || {
                // The receiver may be gone if the waiter gave up.
                let _ = sender.send(transform(index, value));
            });
            receiver.map(|answer| match answer {
                Ok(result) => result,
                Err(oneshot::Canceled) => Err(Error::Abandoned),
            })
        })
        .buffered(width)
        .try_collect::<Vec<i64>>();

    let (completer, waiter) = completion::channel();
    context.completion().spawn_ok(async move {
        completer.complete(pipeline.await);
    });
    waiter.wait(deadline)
}
