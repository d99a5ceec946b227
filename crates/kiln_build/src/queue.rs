//! The cook job queue and worker protocol.
//!
//! One queue serves a whole `cook()` invocation. The driver enqueues the
//! parallel-safe commands of a closure level, then blocks on the barrier
//! until the pending count drains to zero; workers block on the
//! work-available gate whenever the deque is empty. Both gates are condvars
//! over the same mutex-guarded state, so a level N+1 command can never start
//! before every level N command has finished.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard};

use kiln_common::{CancelToken, CookError, CookResult, TargetMask};
use kiln_cooker::{CookStatus, Cooker};

/// One unit of pooled work: a cooker and the pass flags to cook it under.
///
/// The command owns the cooker while it is in flight; the driver gets both
/// back from the barrier drain.
pub struct CookCommand {
    /// The target flags of the pass.
    pub flags: TargetMask,
    /// The cooker, owned for the duration of execution.
    pub cooker: Cooker,
    /// The outcome, set once the command has executed.
    pub result: Option<CookResult<CookStatus>>,
}

impl CookCommand {
    /// Creates a command for one cooker and pass.
    pub fn new(cooker: Cooker, flags: TargetMask) -> CookCommand {
        CookCommand {
            flags,
            cooker,
            result: None,
        }
    }

    fn run(&mut self) {
        let flags = self.flags;
        let outcome = catch_unwind(AssertUnwindSafe(|| self.cooker.cook(flags)));
        self.result = Some(outcome.unwrap_or_else(|_| {
            Err(CookError::Io(format!(
                "panic while cooking '{}'",
                self.cooker.asset().path
            )))
        }));
    }
}

struct QueueState {
    pending: VecDeque<CookCommand>,
    completed: Vec<CookCommand>,
    /// Commands enqueued but not yet finished executing. Decremented only
    /// after a command completes, so the barrier cannot open while work is
    /// still running off-queue.
    pending_count: usize,
    first_error: Option<CookError>,
    done: bool,
}

/// The shared cook queue: one mutex, two condvar gates.
pub struct CookQueue {
    state: Mutex<QueueState>,
    work_available: Condvar,
    batch_complete: Condvar,
    cancel: CancelToken,
}

impl CookQueue {
    /// Creates an empty queue watching the given cancellation token.
    pub fn new(cancel: CancelToken) -> CookQueue {
        CookQueue {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                completed: Vec::new(),
                pending_count: 0,
                first_error: None,
                done: false,
            }),
            work_available: Condvar::new(),
            batch_complete: Condvar::new(),
            cancel,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds a command to the batch and wakes one worker.
    pub fn enqueue(&self, cmd: CookCommand) {
        let mut state = self.lock();
        state.pending_count += 1;
        state.pending.push_back(cmd);
        self.work_available.notify_one();
    }

    /// Blocks until every enqueued command has finished, then drains the
    /// completed commands back to the caller.
    ///
    /// Once an error has been recorded, still-queued commands are abandoned
    /// here as well; only in-flight work is awaited. This keeps the barrier
    /// live even when every worker has already stopped.
    pub fn barrier_wait(&self) -> Vec<CookCommand> {
        let mut state = self.lock();
        loop {
            if state.first_error.is_some() {
                abandon_pending(&mut state);
            }
            if state.pending_count == 0 {
                break;
            }
            state = self
                .batch_complete
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
        std::mem::take(&mut state.completed)
    }

    /// The first failure recorded by any command, inline cook, or
    /// cancellation. Sticky for the lifetime of the queue.
    pub fn first_error(&self) -> Option<CookError> {
        self.lock().first_error.clone()
    }

    /// Records a failure from outside the pool (an inline cook or a
    /// resolution error); only the first one sticks. Wakes idle workers so
    /// they notice the error and stop.
    pub fn record_error(&self, err: CookError) {
        let mut state = self.lock();
        if state.first_error.is_none() {
            state.first_error = Some(err);
        }
        self.work_available.notify_all();
    }

    /// Tells all workers to exit once the deque is empty.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.done = true;
        self.work_available.notify_all();
    }

    /// The worker loop: run on each pool thread until shutdown or until an
    /// error has been recorded. Once a failure sticks, the rest of the batch
    /// is abandoned unexecuted so the barrier can open.
    pub fn worker(&self) {
        loop {
            let cmd = {
                let mut state = self.lock();
                loop {
                    if state.first_error.is_some() {
                        self.abandon_batch(&mut state);
                        return;
                    }
                    if let Some(cmd) = state.pending.pop_front() {
                        break Some(cmd);
                    }
                    if state.done {
                        break None;
                    }
                    state = self
                        .work_available
                        .wait(state)
                        .unwrap_or_else(|e| e.into_inner());
                }
            };

            let Some(mut cmd) = cmd else { return };

            if self.cancel.is_cancelled() {
                cmd.result = Some(Err(CookError::Cancelled));
            } else {
                cmd.run();
            }

            let mut state = self.lock();
            if let Some(Err(err)) = &cmd.result {
                if state.first_error.is_none() {
                    state.first_error = Some(err.clone());
                }
                self.work_available.notify_all();
            }
            state.completed.push(cmd);
            state.pending_count -= 1;
            if state.pending_count == 0 {
                self.batch_complete.notify_all();
            }
        }
    }

    /// Abandons the rest of the batch and wakes both gates: peers exit, and
    /// the barrier re-checks the pending count.
    fn abandon_batch(&self, state: &mut QueueState) {
        abandon_pending(state);
        self.batch_complete.notify_all();
        self.work_available.notify_all();
    }
}

/// Moves every still-pending command to the completed list without executing
/// it. Abandoned commands keep `result: None`.
fn abandon_pending(state: &mut QueueState) {
    let abandoned = state.pending.len();
    let drained: Vec<CookCommand> = state.pending.drain(..).collect();
    state.completed.extend(drained);
    state.pending_count -= abandoned;
}
