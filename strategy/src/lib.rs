//! Compare execution strategies for element-wise transforms over in-memory collections.
//!
//! This crate applies one operation, widening every element of a fixed
//! in-memory ordered collection from `i32` to `i64`, through four execution
//! shapes, so that a benchmark driver can measure what each shape costs for
//! CPU-light, high-fan-out work:
//!
//! - [`sequential`]: in-order iteration on the calling thread.
//! - [`data_parallel`]: contiguous chunks joined across a shared worker pool.
//! - [`reactive`]: a single-threaded streaming pipeline, driven to completion
//!   on the calling thread.
//! - [`reactive_parallel`]: a streaming pipeline that fans elements out onto
//!   the shared worker pool, restores input order, and collects on a
//!   single-threaded completion scheduler.
//!
//! All four produce identical, input-order-preserving results. The shared
//! resources (worker pool and completion scheduler) live in an
//! [`ExecutionContext`] constructed once per measurement trial and passed by
//! reference into every call; see [`Config`] for sizing.
//!
//! The driver does not discover strategies by inspection: [`STRATEGIES`] maps
//! each strategy name to a uniform entry point to iterate over.
//!
//! # Example
//!
//! ```
//! use fanout_strategy::{Config, Dataset, ExecutionContext, STRATEGIES};
//!
//! let dataset = Dataset::ascending(16).unwrap();
//! let context = ExecutionContext::new(Config::default()).unwrap();
//! for strategy in STRATEGIES {
//!     let result = strategy.run(&dataset, &context).unwrap();
//!     assert_eq!(result.len(), dataset.len());
//! }
//! context.shutdown();
//! ```

use std::{fmt, time::Duration};
use thiserror::Error;

mod completion;
mod context;
pub mod data_parallel;
mod dataset;
pub mod reactive;
pub mod reactive_parallel;
pub mod sequential;

pub use context::{Config, ExecutionContext, WorkerGauge};
pub use dataset::Dataset;

/// Number of elements in the default benchmark dataset.
pub const DATASET_LEN: usize = 9999;

/// Losslessly widen one element to the result representation.
///
/// # Example
///
/// ```
/// assert_eq!(fanout_strategy::widen(7), 7i64);
/// ```
#[inline]
pub fn widen(value: i32) -> i64 {
    i64::from(value)
}

/// Errors that can occur when constructing resources or running a strategy.
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset or context construction failed. Fatal to the trial.
    #[error("setup failed: {0}")]
    Setup(String),
    /// The transform failed for one element. The whole call fails; no partial
    /// result is returned.
    #[error("transform failed at index {index}: {reason}")]
    Transform {
        /// Position of the element that failed.
        index: usize,
        /// Why it failed.
        reason: String,
    },
    /// The caller's deadline expired while waiting on parallel completion.
    /// In-flight worker tasks are abandoned, not cancelled.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// A worker dropped its result channel without answering (e.g. it
    /// panicked mid-transform).
    #[error("worker abandoned its task")]
    Abandoned,
}

/// A named transform strategy the driver can invoke.
#[derive(Clone, Copy)]
pub struct Strategy {
    name: &'static str,
    run: fn(&Dataset, &ExecutionContext) -> Result<Vec<i64>, Error>,
}

impl Strategy {
    /// Name the driver reports results under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Transform `dataset`, borrowing `context` for the duration of the call.
    ///
    /// Strategies that run entirely on the calling thread ignore `context`.
    pub fn run(&self, dataset: &Dataset, context: &ExecutionContext) -> Result<Vec<i64>, Error> {
        (self.run)(dataset, context)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name).finish()
    }
}

fn run_sequential(dataset: &Dataset, _: &ExecutionContext) -> Result<Vec<i64>, Error> {
    sequential::transform(dataset)
}

fn run_data_parallel(dataset: &Dataset, context: &ExecutionContext) -> Result<Vec<i64>, Error> {
    data_parallel::transform(dataset, context)
}

fn run_reactive(dataset: &Dataset, _: &ExecutionContext) -> Result<Vec<i64>, Error> {
    reactive::transform(dataset)
}

fn run_reactive_parallel(
    dataset: &Dataset,
    context: &ExecutionContext,
) -> Result<Vec<i64>, Error> {
    reactive_parallel::transform(dataset, context)
}

/// Every strategy, in the order the driver reports them.
pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "sequential",
        run: run_sequential,
    },
    Strategy {
        name: "data_parallel",
        run: run_data_parallel,
    },
    Strategy {
        name: "reactive",
        run: run_reactive,
    },
    Strategy {
        name: "reactive_parallel",
        run: run_reactive_parallel,
    },
];
