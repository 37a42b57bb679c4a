//! Chunked transform across the shared worker pool.
//!
//! The dataset is split into contiguous chunks, one task per chunk is
//! spawned into the pool, and the caller blocks at the scope join until
//! every task finishes. Each task fills its own output slot, so
//! reassembling the slots in chunk order restores input order no matter
//! which chunks finished first.

use crate::{widen, Dataset, Error, ExecutionContext};

/// Widens every element by fanning contiguous chunks across the shared
/// worker pool and joining.
///
/// The join is structured: it borrows the caller's stack and cannot be
/// abandoned early, so this entry takes no deadline. If any chunk fails,
/// the whole call fails and no partial result is returned.
pub fn transform(dataset: &Dataset, context: &ExecutionContext) -> Result<Vec<i64>, Error> {
    transform_with(dataset, context, |_, value| Ok(widen(value)))
}

pub(crate) fn transform_with<F>(
    dataset: &Dataset,
    context: &ExecutionContext,
    f: F,
) -> Result<Vec<i64>, Error>
where
    F: Fn(usize, i32) -> Result<i64, Error> + Send + Sync,
{
    let values = dataset.values();
    if values.is_empty() {
        return Ok(Vec::new());
    }

    // One chunk per worker; the last chunk may run short.
    let chunk_size = values.len().div_ceil(context.parallelism());
    let chunk_count = values.len().div_ceil(chunk_size);

    let mut slots: Vec<Option<Result<Vec<i64>, Error>>> = Vec::new();
    slots.resize_with(chunk_count, || None);

    let f = &f;
    context.pool().scope(|scope| {
        for ((chunk_index, chunk), slot) in values
            .chunks(chunk_size)
            .enumerate()
            .zip(slots.iter_mut())
        {
            scope.spawn(move |_| {
                let base = chunk_index * chunk_size;
                *slot = Some(
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(offset, &value)| f(base + offset, value))
                        .collect(),
                );
            });
        }
    });

    // Every task ran to completion; drain the slots in chunk order.
    let mut result = Vec::with_capacity(values.len());
    for slot in slots {
        result.extend(slot.expect("chunk task did not run")?);
    }
    Ok(result)
}
