use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use codepick_core::catalog::{CatalogLookup, LookupOutcome, lookup};

#[derive(Debug)]
pub enum LookupEvent {
    Done { token: u64, outcome: LookupOutcome },
}

pub trait LookupRunner: Send + Sync {
    fn spawn_lookup(&self, query: String, limit: usize, token: u64) -> Receiver<LookupEvent>;
}

pub struct CatalogLookupRunner {
    catalog: Arc<dyn CatalogLookup>,
}

impl CatalogLookupRunner {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { catalog }
    }
}

impl LookupRunner for CatalogLookupRunner {
    fn spawn_lookup(&self, query: String, limit: usize, token: u64) -> Receiver<LookupEvent> {
        let (sender, receiver) = mpsc::channel();
        let catalog = Arc::clone(&self.catalog);
        std::thread::spawn(move || {
            let outcome = lookup(catalog.as_ref(), &query, limit);
            let _ = sender.send(LookupEvent::Done { token, outcome });
        });
        receiver
    }
}

/// Background catalog search where the newest query wins.
pub struct LookupSession {
    runner: Arc<dyn LookupRunner>,
    limit: usize,
    query: String,
    outcome: LookupOutcome,
    receiver: Option<Receiver<LookupEvent>>,
    active_token: Option<u64>,
    next_token: u64,
}

impl LookupSession {
    pub fn new(runner: Arc<dyn LookupRunner>, limit: usize) -> Self {
        Self {
            runner,
            limit,
            query: String::new(),
            outcome: LookupOutcome::default(),
            receiver: None,
            active_token: None,
            next_token: 1,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn outcome(&self) -> &LookupOutcome {
        &self.outcome
    }

    pub fn is_loading(&self) -> bool {
        self.active_token.is_some()
    }

    pub fn submit(&mut self, query: &str) -> u64 {
        let token = self.next_token;
        self.next_token = self.next_token.saturating_add(1);
        self.active_token = Some(token);
        self.query = query.to_string();
        self.receiver = Some(
            self.runner
                .spawn_lookup(query.to_string(), self.limit, token),
        );
        token
    }

    /// Returns true when the visible outcome changed.
    pub fn poll(&mut self) -> bool {
        let mut events = Vec::new();
        let mut disconnected = false;

        if let Some(receiver) = &self.receiver {
            loop {
                match receiver.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        let mut changed = false;
        for event in events {
            changed |= self.apply(event);
        }

        if disconnected && self.active_token.is_some() {
            self.active_token = None;
            self.receiver = None;
            self.outcome = LookupOutcome::failed("catalog search stopped without a result");
            changed = true;
        }

        changed
    }

    pub fn apply(&mut self, event: LookupEvent) -> bool {
        let LookupEvent::Done { token, outcome } = event;
        if Some(token) != self.active_token {
            tracing::debug!(token, "dropped stale lookup result");
            return false;
        }

        self.active_token = None;
        self.receiver = None;
        self.outcome = outcome;
        true
    }
}
