//! Job runtime behind every engine call.
//!
//! The worker bundle owns the engine on a dedicated thread and receives boxed
//! jobs over a channel; the inline bundle keeps it behind a mutex.

use crate::engine::instance::EngineCore;
use crate::engine::{EngineBundle, EngineError, EngineResult};
use crossbeam_channel::{bounded, unbounded, Sender};
use log::{debug, error};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce(&mut EngineCore) + Send>;

const WORKER_THREAD_NAME: &str = "parqtodo-engine";

pub(crate) enum Runtime {
    Inline(Mutex<EngineCore>),
    Worker {
        jobs: Option<Sender<Job>>,
        handle: Option<JoinHandle<()>>,
    },
}

impl Runtime {
    pub(crate) fn start(bundle: EngineBundle) -> EngineResult<Self> {
        match bundle {
            EngineBundle::Inline => Ok(Self::Inline(Mutex::new(EngineCore::open()?))),
            EngineBundle::Worker => Self::spawn_worker(),
        }
    }

    fn spawn_worker() -> EngineResult<Self> {
        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let (ready_tx, ready_rx) = bounded::<EngineResult<()>>(1);

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut core = match EngineCore::open() {
                    Ok(core) => {
                        let _ = ready_tx.send(Ok(()));
                        core
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                for job in jobs_rx.iter() {
                    job(&mut core);
                }
                debug!("event=engine_worker_stop module=engine status=ok");
            })
            .map_err(|err| EngineError::Instantiate(format!("cannot spawn worker: {err}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self::Worker {
                jobs: Some(jobs_tx),
                handle: Some(handle),
            }),
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(EngineError::Instantiate(
                    "worker exited before reporting readiness".to_string(),
                ))
            }
        }
    }

    /// Runs `job` against the engine and waits for its result.
    pub(crate) fn call<R, F>(&self, job: F) -> EngineResult<R>
    where
        F: FnOnce(&mut EngineCore) -> EngineResult<R> + Send + 'static,
        R: Send + 'static,
    {
        match self {
            Self::Inline(core) => {
                let mut core = core.lock().unwrap_or_else(PoisonError::into_inner);
                job(&mut *core)
            }
            Self::Worker { jobs, .. } => {
                let jobs = jobs.as_ref().ok_or(EngineError::WorkerGone)?;
                let (reply_tx, reply_rx) = bounded(1);
                jobs.send(Box::new(move |core: &mut EngineCore| {
                    let _ = reply_tx.send(job(core));
                }))
                .map_err(|_| EngineError::WorkerGone)?;
                reply_rx.recv().map_err(|_| {
                    error!("event=engine_call module=engine status=error error_code=worker_gone");
                    EngineError::WorkerGone
                })?
            }
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Self::Worker { jobs, handle } = self {
            // Closing the channel ends the worker loop.
            jobs.take();
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
    }
}
