//! In-order transform on the calling thread: the baseline the other
//! strategies are judged against.

use crate::{widen, Dataset, Error};

/// Widens every element in order on the calling thread.
pub fn transform(dataset: &Dataset) -> Result<Vec<i64>, Error> {
    transform_with(dataset, |_, value| Ok(widen(value)))
}

pub(crate) fn transform_with<F>(dataset: &Dataset, f: F) -> Result<Vec<i64>, Error>
where
    F: Fn(usize, i32) -> Result<i64, Error>,
{
    let mut result = Vec::with_capacity(dataset.len());
    for (index, &value) in dataset.values().iter().enumerate() {
        result.push(f(index, value)?);
    }
    Ok(result)
}
