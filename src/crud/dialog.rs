//! Per-dialog state machine and single in-flight submission guard.
//!
//! `Closed -> Open -> Submitting -> Closed` on success, back to `Open { error }`
//! on failure. Each `open` starts a new session; a response that settles for an
//! older session (the dialog was closed meanwhile) is discarded.

use crate::error::CrudError;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open { error: bool },
    Submitting,
}

#[derive(Debug)]
struct Session {
    state: DialogState,
    generation: u64,
}

/// What happened to a submission once the dialog lets it through.
pub(crate) enum Settled<R> {
    /// Refused before dispatch (already submitting, or not open).
    Refused(CrudError),
    /// Settled after the dialog was closed; nothing may be applied.
    Stale,
    Done(Result<R, CrudError>),
}

/// Shared handle; clones refer to the same dialog instance.
#[derive(Clone, Debug)]
pub(crate) struct DialogHandle {
    session: Arc<Mutex<Session>>,
}

impl DialogHandle {
    pub(crate) fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(Session {
                state: DialogState::Closed,
                generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> DialogState {
        self.lock().state
    }

    pub(crate) fn open(&self) {
        let mut s = self.lock();
        if s.state == DialogState::Closed {
            s.generation += 1;
            s.state = DialogState::Open { error: false };
        }
    }

    pub(crate) fn close(&self) {
        let mut s = self.lock();
        if s.state == DialogState::Submitting {
            tracing::debug!(generation = s.generation, "dialog closed with a request in flight");
        }
        s.state = DialogState::Closed;
    }

    fn begin(&self) -> Result<u64, CrudError> {
        let mut s = self.lock();
        match s.state {
            DialogState::Open { .. } => {
                s.state = DialogState::Submitting;
                Ok(s.generation)
            }
            DialogState::Submitting | DialogState::Closed => Err(CrudError::StateConflict),
        }
    }

    /// Leave `Submitting`. Returns false when the session is gone.
    fn settle(&self, generation: u64, ok: bool) -> bool {
        let mut s = self.lock();
        if s.generation != generation || s.state != DialogState::Submitting {
            return false;
        }
        s.state = if ok {
            DialogState::Closed
        } else {
            DialogState::Open { error: true }
        };
        true
    }

    /// Run `op` as this dialog's only in-flight submission.
    /// `op` is not polled unless the dialog accepts the submission.
    pub(crate) async fn run<R, F>(&self, op: F) -> Settled<R>
    where
        F: Future<Output = Result<R, CrudError>>,
    {
        let generation = match self.begin() {
            Ok(g) => g,
            Err(e) => return Settled::Refused(e),
        };
        let result = op.await;
        if self.settle(generation, result.is_ok()) {
            Settled::Done(result)
        } else {
            Settled::Stale
        }
    }
}
