use crate::error::GjkError;
use crossbeam_utils::thread;

/// Splits independent work over a fixed number of scoped worker threads.
///
/// Note that the dispatcher does no load balancing beyond handing every worker one contiguous, disjoint range.
/// Batch queries are embarrassingly parallel and the per-pair cost is bounded, so a static partition is enough.
/// Each worker owns its slice of the results, so no locking is needed; the only cross-thread interaction is the
/// reduction of the counters returned by the workers.
#[derive(Clone, Copy, Debug)]
pub struct ThreadDispatcher {
    thread_count: usize,
}

impl ThreadDispatcher {
    /// Creates a dispatcher for `thread_count` workers.
    pub fn new(thread_count: usize) -> Result<Self, GjkError> {
        if thread_count == 0 {
            return Err(GjkError::InvalidThreadCount);
        }
        Ok(Self { thread_count })
    }

    /// Gets the number of workers available in the dispatcher.
    #[inline]
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Start of the range assigned to `thread` when `n` jobs are split over `thread_count` workers.
    ///
    /// `job_pointer(n, t, thread)..job_pointer(n, t, thread + 1)` is the range of the worker. Ranges differ in
    /// length by at most one and `job_pointer(n, t, t) == n`.
    #[inline]
    pub fn job_pointer(n: usize, thread_count: usize, thread: usize) -> usize {
        let base = n / thread_count;
        let remainder = n % thread_count;
        base * thread + thread.min(remainder)
    }

    /// Dispatches the workers over `results`.
    ///
    /// # Arguments
    ///
    /// * `results` - Output slots, one per job. Every worker receives the disjoint chunk matching its range.
    /// * `worker_body` - Invoked as `worker_body(worker_index, begin, chunk)`, where `chunk[i]` is the output of job `begin + i`.
    ///   The returned counters of all workers are summed.
    pub fn dispatch_workers<T, F>(&self, results: &mut [T], worker_body: F) -> Result<usize, GjkError>
    where
        T: Send,
        F: Fn(usize, usize, &mut [T]) -> usize + Sync,
    {
        let n = results.len();
        let worker_count = self.thread_count.min(n.max(1));
        if worker_count == 1 {
            return Ok(worker_body(0, 0, results));
        }

        let body = &worker_body;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(worker_count);
            let mut remaining = results;
            for worker in 0..worker_count {
                let begin = Self::job_pointer(n, worker_count, worker);
                let end = Self::job_pointer(n, worker_count, worker + 1);
                let (chunk, rest) = std::mem::take(&mut remaining).split_at_mut(end - begin);
                remaining = rest;
                handles.push(scope.spawn(move |_| body(worker, begin, chunk)));
            }
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| GjkError::WorkerPanicked))
                .sum::<Result<usize, GjkError>>()
        })
        .map_err(|_| GjkError::WorkerPanicked)?
    }
}
