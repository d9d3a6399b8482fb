//! Background work with cancellation.
//!
//! Every job runs as a tokio task wrapped in [`futures::future::abortable`].
//! Results come back over an mpsc channel and are handed out only for jobs
//! that are still registered, so a cancelled job never delivers even if it
//! finished before `cancel` was called. A job that panics delivers the
//! output its `on_panic` builds instead, so nothing waits on it forever.

use futures::FutureExt;
use futures::future::{AbortHandle, Aborted, abortable};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    ImageGenerated { url: String },
    GenerationFailed { reason: String },
    Suggestion { text: String },
    SuggestionFailed { reason: String },
    AssetLoaded { url: String, bytes: Vec<u8> },
    AssetFailed { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub id: JobId,
    pub output: JobOutput,
}

pub struct Jobs {
    runtime: Handle,
    next_id: u64,
    running: HashMap<JobId, AbortHandle>,
    tx: mpsc::UnboundedSender<JobResult>,
    rx: mpsc::UnboundedReceiver<JobResult>,
}

impl Jobs {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            next_id: 0,
            running: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Run `job` in the background. If it panics, `on_panic` turns the
    /// panic message into the job's output.
    pub fn spawn<F, P>(&mut self, label: &'static str, job: F, on_panic: P) -> JobId
    where
        F: Future<Output = JobOutput> + Send + 'static,
        P: FnOnce(String) -> JobOutput + Send + 'static,
    {
        self.next_id += 1;
        let id = JobId(self.next_id);
        let job = AssertUnwindSafe(job).catch_unwind().map(move |outcome| match outcome {
            Ok(output) => output,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                log::error!("{id} ({label}) panicked: {reason}");
                on_panic(reason)
            }
        });
        let (job, handle) = abortable(job);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            match job.await {
                Ok(output) => {
                    // The receiver only goes away with `Jobs` itself.
                    let _ = tx.send(JobResult { id, output });
                }
                Err(Aborted) => log::debug!("{id} ({label}) aborted"),
            }
        });
        self.running.insert(id, handle);
        log::debug!("{id} ({label}) started");
        id
    }

    /// Abort a job. Returns false if it already delivered or never existed.
    pub fn cancel(&mut self, id: JobId) -> bool {
        match self.running.remove(&id) {
            Some(handle) => {
                handle.abort();
                log::debug!("{id} cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.abort();
        }
    }

    pub fn is_running(&self, id: JobId) -> bool {
        self.running.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.running.len()
    }

    /// Results that are ready now, without waiting.
    pub fn drain(&mut self) -> Vec<JobResult> {
        let mut ready = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            if let Some(result) = self.accept(result) {
                ready.push(result);
            }
        }
        ready
    }

    /// Wait for the next live result. `None` once nothing is pending.
    pub async fn next(&mut self) -> Option<JobResult> {
        while !self.running.is_empty() {
            let result = self.rx.recv().await?;
            if let Some(result) = self.accept(result) {
                return Some(result);
            }
        }
        None
    }

    fn accept(&mut self, result: JobResult) -> Option<JobResult> {
        if self.running.remove(&result.id).is_some() {
            Some(result)
        } else {
            log::trace!("dropping result of cancelled {}", result.id);
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}

impl Drop for Jobs {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
