//! Single-threaded streaming pipeline.
//!
//! Elements are emitted as a stream, widened by a map stage, and collected
//! by a terminal stage; the whole pipeline runs on the calling thread and
//! the call returns when the stream completes. Emission order is
//! consumption order, so no re-sequencing is needed.

use crate::{widen, Dataset, Error};
use futures::{executor::block_on, stream, StreamExt, TryStreamExt};

/// Widens every element through a single-threaded stream pipeline.
pub fn transform(dataset: &Dataset) -> Result<Vec<i64>, Error> {
    transform_with(dataset, |_, value| Ok(widen(value)))
}

pub(crate) fn transform_with<F>(dataset: &Dataset, f: F) -> Result<Vec<i64>, Error>
where
    F: Fn(usize, i32) -> Result<i64, Error>,
{
    let source = stream::iter(dataset.values().iter().copied().enumerate());
    block_on(source.map(|(index, value)| f(index, value)).try_collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequential;

    #[test]
    fn matches_sequential() {
        let dataset = Dataset::ascending(1000).unwrap();
        let expected = sequential::transform(&dataset).unwrap();
        assert_eq!(transform(&dataset).unwrap(), expected);
    }

    #[test]
    fn empty_dataset_yields_empty_result() {
        let dataset = Dataset::from_values(Vec::new());
        assert!(transform(&dataset).unwrap().is_empty());
    }

    #[test]
    fn upstream_error_fails_the_pipeline() {
        let dataset = Dataset::ascending(100).unwrap();
        let result = transform_with(&dataset, |index, value| {
            if index == 42 {
                Err(Error::Transform {
                    index,
                    reason: "injected".into(),
                })
            } else {
                Ok(widen(value))
            }
        });
        assert!(matches!(result, Err(Error::Transform { index: 42, .. })));
    }
}
