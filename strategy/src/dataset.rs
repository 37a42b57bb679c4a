use crate::Error;
use std::sync::Arc;

/// An immutable, ordered sequence of narrow elements.
///
/// Built once before measurement begins and read (never mutated) by every
/// strategy in a trial. The storage is reference-counted so pipelines that
/// outlive the caller's borrow can share the elements without copying them.
#[derive(Clone, Debug)]
pub struct Dataset {
    values: Arc<[i32]>,
}

impl Dataset {
    /// Creates a dataset of `len` ascending values, `1..=len`.
    ///
    /// Fails with [`Error::Setup`] if `len` does not fit the element type.
    pub fn ascending(len: usize) -> Result<Self, Error> {
        if len > i32::MAX as usize {
            return Err(Error::Setup(format!(
                "dataset length {len} exceeds the element range"
            )));
        }
        let values: Vec<i32> = (1..=len as i32).collect();
        Ok(Self {
            values: values.into(),
        })
    }

    /// Creates a dataset from explicit values, preserving their order.
    pub fn from_values(values: Vec<i32>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the dataset holds no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The elements, in insertion order.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Cheap shared handle to the elements for `'static` pipelines.
    pub(crate) fn share(&self) -> Arc<[i32]> {
        Arc::clone(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_starts_at_one() {
        let dataset = Dataset::ascending(5).unwrap();
        assert_eq!(dataset.values(), [1, 2, 3, 4, 5]);
        assert_eq!(dataset.len(), 5);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn ascending_empty() {
        let dataset = Dataset::ascending(0).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn ascending_rejects_oversized_length() {
        let result = Dataset::ascending(i32::MAX as usize + 1);
        assert!(matches!(result, Err(Error::Setup(_))));
    }

    #[test]
    fn share_aliases_the_same_elements() {
        let dataset = Dataset::from_values(vec![3, 1, 2]);
        let shared = dataset.share();
        assert_eq!(&shared[..], dataset.values());
    }
}
