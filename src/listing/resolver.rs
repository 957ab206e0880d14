//! Background directory tests for symlink targets.
//!
//! Each pending symlink gets exactly one `IsDirectoryRunner` query. Queries
//! run on a small pool of worker threads fed through a channel; answers come
//! back tagged with the entry's position so the listing keeps input order.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::fs::FileEntry;
use crate::shell::{run, IsDirectoryRunner, ShellExecutor, ShellResult};

/// A directory test to perform: (entry index, absolute target path)
type Job = (usize, String);

/// Resolves whether symlink targets are directories
pub struct LinkResolver {
    shell: Arc<dyn ShellExecutor>,
    workers: usize,
    timeout: Duration,
}

impl LinkResolver {
    pub fn new(shell: Arc<dyn ShellExecutor>, workers: usize, timeout: Duration) -> Self {
        Self {
            shell,
            workers: workers.max(1),
            timeout,
        }
    }

    /// Fill in `is_dir` for every symlink entry that has a target.
    ///
    /// Failed queries, and queries still running when the timeout expires,
    /// leave `is_dir` false. Returns the number of links actually resolved.
    pub fn resolve(&self, entries: &mut [FileEntry]) -> usize {
        let jobs: Vec<Job> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_symlink)
            .filter_map(|(i, e)| e.symlink_target.clone().map(|t| (i, t)))
            .collect();
        if jobs.is_empty() {
            return 0;
        }

        let pending = jobs.len();
        let (job_tx, job_rx) = channel::<Job>();
        let (res_tx, res_rx) = channel::<(usize, ShellResult<bool>)>();
        for job in jobs {
            // Receiver is alive until the workers below exit
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        for _ in 0..self.workers.min(pending) {
            let shell = Arc::clone(&self.shell);
            let job_rx = Arc::clone(&job_rx);
            let res_tx = res_tx.clone();
            thread::spawn(move || worker(shell, job_rx, res_tx));
        }
        drop(res_tx);

        let deadline = Instant::now() + self.timeout;
        let mut resolved = 0;
        for _ in 0..pending {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match res_rx.recv_timeout(remaining) {
                Ok((index, Ok(is_dir))) => {
                    entries[index].is_dir = is_dir;
                    resolved += 1;
                }
                Ok((index, Err(e))) => {
                    tracing::debug!(
                        target_path = ?entries[index].symlink_target,
                        error = %e,
                        "link resolution failed, treating target as a file"
                    );
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        unresolved = pending - resolved,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "link resolution timed out"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        resolved
    }
}

fn worker(
    shell: Arc<dyn ShellExecutor>,
    jobs: Arc<Mutex<Receiver<Job>>>,
    results: Sender<(usize, ShellResult<bool>)>,
) {
    loop {
        let job = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        let Ok((index, target)) = job else {
            return;
        };
        let answer = run(&shell, &IsDirectoryRunner::new(target)).and_then(|r| r);
        // The listing may have stopped waiting
        if results.send((index, answer)).is_err() {
            return;
        }
    }
}
