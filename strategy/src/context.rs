use crate::Error;
use futures::executor::ThreadPool as CompletionPool;
use rayon::{ThreadPool as WorkerPool, ThreadPoolBuilder as WorkerPoolBuilder};
use std::{
    any::Any,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, error, warn};

/// Configuration for [`ExecutionContext`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of threads in the shared worker pool.
    ///
    /// Zero selects the host's available parallelism.
    pub worker_threads: usize,

    /// Prefix for worker and completion thread names.
    pub thread_name: String,

    /// How long [`ExecutionContext::shutdown`] waits for threads to exit
    /// before reporting leftovers.
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_threads: 0, // available parallelism
            thread_name: "fanout".into(),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Counts threads owned by an [`ExecutionContext`].
///
/// The gauge outlives the context it observes, so a caller can confirm that
/// tearing a context down actually released its threads.
#[derive(Clone, Debug, Default)]
pub struct WorkerGauge {
    live: Arc<AtomicUsize>,
}

impl WorkerGauge {
    fn started(&self) {
        self.live.fetch_add(1, Ordering::SeqCst);
    }

    fn stopped(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }

    /// Threads currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Polls until no threads remain or `within` elapses. Returns whether the
    /// count reached zero.
    pub fn drained(&self, within: Duration) -> bool {
        let deadline = Instant::now() + within;
        loop {
            if self.live() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("{:?}", err)
    }
}

/// Shared resources for one measurement trial.
///
/// Holds the work-stealing worker pool (unbounded task queue) that the
/// parallel strategies submit to, and the single-threaded completion
/// scheduler the reactive-parallel pipeline collects on. Constructed exactly
/// once per trial; strategies borrow it and must not outlive it. Dropping the
/// context releases both pools on every exit path; [`shutdown`] additionally
/// waits for the threads to exit.
///
/// [`shutdown`]: ExecutionContext::shutdown
pub struct ExecutionContext {
    pool: Arc<WorkerPool>,
    completion: CompletionPool,
    gauge: WorkerGauge,
    shutdown_grace: Duration,
}

impl ExecutionContext {
    /// Builds the worker pool and completion scheduler described by `cfg`.
    pub fn new(cfg: Config) -> Result<Self, Error> {
        let threads = if cfg.worker_threads == 0 {
            // Best-effort probe; a single worker is still a valid pool.
            thread::available_parallelism().map_or(1, usize::from)
        } else {
            cfg.worker_threads
        };
        let gauge = WorkerGauge::default();

        let pool = {
            let name = cfg.thread_name.clone();
            let started = gauge.clone();
            let stopped = gauge.clone();
            WorkerPoolBuilder::new()
                .num_threads(threads)
                .thread_name(move |index| format!("{name}-worker-{index}"))
                .start_handler(move |_| started.started())
                .exit_handler(move |_| stopped.stopped())
                .panic_handler(|payload| {
                    // A panicked task drops its result channel; the waiting
                    // pipeline observes that instead of the panic itself.
                    error!("worker panicked: {}", panic_message(payload.as_ref()));
                })
                .build()
                .map_err(|err| Error::Setup(err.to_string()))?
        };

        let completion = {
            let started = gauge.clone();
            let stopped = gauge.clone();
            CompletionPool::builder()
                .pool_size(1)
                .name_prefix(format!("{}-completion-", cfg.thread_name))
                .after_start(move |_| started.started())
                .before_stop(move |_| stopped.stopped())
                .create()
                .map_err(|err| Error::Setup(err.to_string()))?
        };

        debug!(workers = threads, "execution context ready");
        Ok(Self {
            pool: Arc::new(pool),
            completion,
            gauge,
            shutdown_grace: cfg.shutdown_grace,
        })
    }

    /// Number of threads in the worker pool.
    pub fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Gauge observing this context's threads.
    pub fn gauge(&self) -> WorkerGauge {
        self.gauge.clone()
    }

    pub(crate) fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub(crate) fn pool_handle(&self) -> Arc<WorkerPool> {
        Arc::clone(&self.pool)
    }

    pub(crate) fn completion(&self) -> &CompletionPool {
        &self.completion
    }

    /// Releases the pools and waits (up to the configured grace period) for
    /// their threads to exit.
    ///
    /// Teardown problems are logged, never returned: they must not displace
    /// an error the trial already produced. Abandoned tasks still holding a
    /// pool handle keep their threads alive past the grace period; that is
    /// reported here and caught by the leak checks in tests.
    pub fn shutdown(self) {
        let Self {
            pool,
            completion,
            gauge,
            shutdown_grace,
        } = self;
        drop(pool);
        drop(completion);
        if gauge.drained(shutdown_grace) {
            debug!("execution context released");
        } else {
            warn!(live = gauge.live(), "threads still alive after shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data_parallel, reactive_parallel, Dataset};

    const DRAIN_LIMIT: Duration = Duration::from_secs(10);

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn explicit_shutdown_releases_threads() {
        init_tracing();
        let context = ExecutionContext::new(Config {
            worker_threads: 2,
            ..Config::default()
        })
        .expect("context construction");
        let gauge = context.gauge();

        let dataset = Dataset::ascending(100).expect("dataset construction");
        let result = data_parallel::transform(&dataset, &context).expect("transform");
        assert_eq!(result.len(), 100);
        assert!(gauge.live() >= 2);

        context.shutdown();
        assert!(gauge.drained(DRAIN_LIMIT));
    }

    #[test]
    fn drop_releases_threads() {
        init_tracing();
        let context = ExecutionContext::new(Config {
            worker_threads: 2,
            ..Config::default()
        })
        .expect("context construction");
        let gauge = context.gauge();

        drop(context);
        assert!(gauge.drained(DRAIN_LIMIT));
    }

    #[test]
    fn reused_context_does_not_accumulate_threads() {
        let context = ExecutionContext::new(Config {
            worker_threads: 2,
            ..Config::default()
        })
        .expect("context construction");
        let gauge = context.gauge();
        let dataset = Dataset::ascending(200).expect("dataset construction");

        // Amortized reuse across invocations must not grow the pool.
        let _ = data_parallel::transform(&dataset, &context).expect("transform");
        let _ = reactive_parallel::transform(&dataset, &context).expect("transform");
        let baseline = gauge.live();
        for _ in 0..5 {
            let _ = data_parallel::transform(&dataset, &context).expect("transform");
            let _ = reactive_parallel::transform(&dataset, &context).expect("transform");
        }
        assert_eq!(gauge.live(), baseline);

        context.shutdown();
    }

    #[test]
    fn zero_workers_selects_available_parallelism() {
        let context = ExecutionContext::new(Config::default()).expect("context construction");
        assert!(context.parallelism() >= 1);
        context.shutdown();
    }
}
