use std::sync::mpsc::{self, Receiver, RecvError, SendError, SyncSender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::debug;

use crate::core::prng::PRNG;
use crate::core::registry::GrammarRegistry;

/// Tuning knobs for [`GenerationPool`], mirroring the original's
/// `poolsize`/`waitqueuesize` constructor arguments.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            workers: 4,
            queue_capacity: 64,
        }
    }
}

/// One generation job, correlated back to its caller by `id`.
pub struct GenerationRequest {
    pub id: String,
    pub grammar: String,
    pub start: String,
    pub seed: u64,
    pub tokens: usize,
}

pub struct GenerationResult {
    pub id: String,
    pub code: String,
}

/// A fixed-size worker pool that drains a bounded request queue and reports
/// results on a shared output channel, grounded on the original
/// multithreaded API's `pendingjobs`/`CodeChannel` pair. The registry's
/// grammars are immutable once normalized, so workers share it behind an
/// `Arc` with no locking of their own.
pub struct GenerationPool {
    job_tx: Option<SyncSender<GenerationRequest>>,
    result_rx: Receiver<GenerationResult>,
    workers: Vec<JoinHandle<()>>,
}

impl GenerationPool {
    pub fn start(registry: Arc<GrammarRegistry>, config: PoolConfig) -> Self {
        let (job_tx, job_rx) = mpsc::sync_channel::<GenerationRequest>(config.queue_capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, result_rx) = mpsc::channel();

        let mut workers = Vec::with_capacity(config.workers);
        for worker_id in 0..config.workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let registry = Arc::clone(&registry);
            workers.push(thread::spawn(move || loop {
                let job = job_rx.lock().expect("job queue lock poisoned").recv();
                let Ok(req) = job else { break };
                debug!("worker {worker_id} generating job '{}'", req.id);
                let mut prng = PRNG::new(req.seed);
                let code = registry
                    .get(&req.grammar)
                    .map(|g| g.generate(&mut prng, &req.start, req.tokens))
                    .unwrap_or_default();
                if result_tx.send(GenerationResult { id: req.id, code }).is_err() {
                    break;
                }
            }));
        }

        GenerationPool {
            job_tx: Some(job_tx),
            result_rx,
            workers,
        }
    }

    /// Enqueues a job, blocking if the bounded queue is full. Fails only if
    /// every worker thread has already exited.
    pub fn submit(&self, req: GenerationRequest) -> Result<(), SendError<GenerationRequest>> {
        self.job_tx
            .as_ref()
            .expect("submit called after shutdown")
            .send(req)
    }

    pub fn try_recv_result(&self) -> Result<GenerationResult, TryRecvError> {
        self.result_rx.try_recv()
    }

    pub fn recv_result(&self) -> Result<GenerationResult, RecvError> {
        self.result_rx.recv()
    }

    /// Closes the job queue and joins every worker, draining in-flight work
    /// first. Consumes `self` since a shut-down pool cannot accept more jobs.
    pub fn shutdown(mut self) {
        self.job_tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_a_job_end_to_end() {
        let mut registry = GrammarRegistry::new();
        registry.register("a", "a : 'x' ;").unwrap();
        let pool = GenerationPool::start(Arc::new(registry), PoolConfig { workers: 2, queue_capacity: 4 });

        pool.submit(GenerationRequest {
            id: "job-1".into(),
            grammar: "a".into(),
            start: "a".into(),
            seed: 1,
            tokens: 5,
        })
        .unwrap();

        let result = pool.recv_result().unwrap();
        assert_eq!(result.id, "job-1");
        assert_eq!(result.code, "x");
        pool.shutdown();
    }

    #[test]
    fn unknown_grammar_yields_empty_code_not_a_crash() {
        let registry = GrammarRegistry::new();
        let pool = GenerationPool::start(Arc::new(registry), PoolConfig::default());
        pool.submit(GenerationRequest {
            id: "job-2".into(),
            grammar: "missing".into(),
            start: "a".into(),
            seed: 1,
            tokens: 5,
        })
        .unwrap();
        let result = pool.recv_result().unwrap();
        assert_eq!(result.code, "");
        pool.shutdown();
    }
}
