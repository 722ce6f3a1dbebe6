use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use codepick_core::engine::GenerationEngine;
use codepick_core::entry::CandidateCode;
use codepick_core::selection::{MergeReport, SelectionStore};

pub const CANCELED_MESSAGE: &str = "canceled";
const DISCONNECTED_MESSAGE: &str = "generation worker stopped without a result";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Running {
        token: u64,
    },
    Succeeded {
        token: u64,
        merged: MergeReport,
    },
    Failed {
        token: u64,
        message: String,
    },
}

impl GenerationState {
    pub fn token(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Running { token }
            | Self::Succeeded { token, .. }
            | Self::Failed { token, .. } => Some(*token),
        }
    }
}

#[derive(Debug)]
pub enum GenerationEvent {
    Done {
        token: u64,
        result: Result<Vec<CandidateCode>, String>,
    },
}

/// What applying one worker event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationUpdate {
    Succeeded { token: u64, merged: MergeReport },
    Failed { token: u64, message: String },
    Stale { token: u64 },
}

pub trait GenerationRunner: Send + Sync {
    fn spawn_generate(
        &self,
        report: String,
        token: u64,
        cancel: Arc<AtomicBool>,
    ) -> Receiver<GenerationEvent>;
}

pub struct EngineGenerationRunner {
    engine: Arc<dyn GenerationEngine>,
}

impl EngineGenerationRunner {
    pub fn new(engine: Arc<dyn GenerationEngine>) -> Self {
        Self { engine }
    }
}

impl GenerationRunner for EngineGenerationRunner {
    fn spawn_generate(
        &self,
        report: String,
        token: u64,
        cancel: Arc<AtomicBool>,
    ) -> Receiver<GenerationEvent> {
        let (sender, receiver) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        std::thread::spawn(move || {
            let result = engine
                .generate(&report)
                .map_err(|error| format!("{error:#}"));

            if cancel.load(Ordering::SeqCst) {
                tracing::debug!(token, "generation finished after cancellation");
                return;
            }

            let _ = sender.send(GenerationEvent::Done { token, result });
        });
        receiver
    }
}

/// Cancellable reference to one in-flight generation.
#[derive(Debug)]
pub struct GenerationHandle {
    token: u64,
    cancel: Arc<AtomicBool>,
    receiver: Receiver<GenerationEvent>,
}

impl GenerationHandle {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Drives at most one generation at a time and merges its result into a
/// [`SelectionStore`].
///
/// Every start allocates a fresh token. Completions carrying any other token
/// are dropped without touching the store or the state, so a superseded or
/// canceled session can never merge late.
pub struct GenerationSession {
    runner: Arc<dyn GenerationRunner>,
    state: GenerationState,
    active: Option<GenerationHandle>,
    next_token: u64,
    report: Option<String>,
}

impl GenerationSession {
    pub fn new(runner: Arc<dyn GenerationRunner>) -> Self {
        Self {
            runner,
            state: GenerationState::Idle,
            active: None,
            next_token: 1,
            report: None,
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, GenerationState::Running { .. })
    }

    pub fn active_token(&self) -> Option<u64> {
        self.active.as_ref().map(GenerationHandle::token)
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn start(&mut self, report: &str) -> u64 {
        if let Some(previous) = self.active.take() {
            previous.cancel();
            tracing::info!(token = previous.token(), "generation superseded");
        }

        let token = self.next_token;
        self.next_token = self.next_token.saturating_add(1);

        let cancel = Arc::new(AtomicBool::new(false));
        let receiver = self
            .runner
            .spawn_generate(report.to_string(), token, Arc::clone(&cancel));

        self.active = Some(GenerationHandle {
            token,
            cancel,
            receiver,
        });
        self.report = Some(report.to_string());
        self.state = GenerationState::Running { token };
        tracing::info!(token, report_len = report.len(), "generation started");
        token
    }

    pub fn cancel(&mut self) -> bool {
        let Some(handle) = self.active.take() else {
            return false;
        };

        handle.cancel();
        let token = handle.token();
        self.state = GenerationState::Failed {
            token,
            message: CANCELED_MESSAGE.to_string(),
        };
        tracing::info!(token, "generation canceled");
        true
    }

    /// Drains the active worker channel without blocking.
    pub fn poll(&mut self, store: &mut SelectionStore) -> Option<GenerationUpdate> {
        let mut events = Vec::new();
        let mut disconnected = false;

        if let Some(handle) = &self.active {
            loop {
                match handle.receiver.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        let mut last = None;
        for event in events {
            last = Some(self.apply(event, store));
        }

        if disconnected && self.active.is_some() {
            last = self.fail_disconnected();
        }

        last
    }

    /// Blocks until the active session finishes or `timeout` elapses. Returns
    /// `None` on timeout or when nothing is running.
    pub fn wait(
        &mut self,
        store: &mut SelectionStore,
        timeout: Duration,
    ) -> Option<GenerationUpdate> {
        let deadline = Instant::now() + timeout;

        loop {
            let handle = self.active.as_ref()?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match handle.receiver.recv_timeout(remaining) {
                Ok(event) => match self.apply(event, store) {
                    GenerationUpdate::Stale { .. } => continue,
                    update => return Some(update),
                },
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => return self.fail_disconnected(),
            }
        }
    }

    pub fn apply(&mut self, event: GenerationEvent, store: &mut SelectionStore) -> GenerationUpdate {
        let GenerationEvent::Done { token, result } = event;

        if Some(token) != self.active_token() {
            tracing::debug!(token, active = ?self.active_token(), "dropped stale generation result");
            return GenerationUpdate::Stale { token };
        }
        self.active = None;

        match result {
            Ok(candidates) => {
                let merged = store.merge_generated(candidates);
                tracing::info!(
                    token,
                    appended = merged.appended,
                    skipped = merged.skipped_duplicates,
                    "generation merged"
                );
                self.state = GenerationState::Succeeded { token, merged };
                GenerationUpdate::Succeeded { token, merged }
            }
            Err(message) => {
                tracing::warn!(token, error = %message, "generation failed");
                self.state = GenerationState::Failed {
                    token,
                    message: message.clone(),
                };
                GenerationUpdate::Failed { token, message }
            }
        }
    }

    fn fail_disconnected(&mut self) -> Option<GenerationUpdate> {
        let handle = self.active.take()?;
        let token = handle.token();
        tracing::warn!(token, "generation worker disconnected");
        self.state = GenerationState::Failed {
            token,
            message: DISCONNECTED_MESSAGE.to_string(),
        };
        Some(GenerationUpdate::Failed {
            token,
            message: DISCONNECTED_MESSAGE.to_string(),
        })
    }
}
