use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use codepick_app::{GenerationEvent, GenerationRunner, LookupEvent, LookupRunner};
use codepick_core::catalog::LookupOutcome;
use codepick_core::entry::{CandidateCode, CatalogMatch};

pub(crate) fn catalog_match(code: &str) -> CatalogMatch {
    CatalogMatch {
        code: code.to_string(),
        name: format!("{code} name"),
        description: None,
    }
}

/// Lookup runner whose results are delivered by the test.
#[derive(Default)]
pub(crate) struct ScriptedLookup {
    requests: Mutex<Vec<(String, u64, Sender<LookupEvent>)>>,
}

impl ScriptedLookup {
    pub(crate) fn queries(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .map(|(query, _, _)| query.clone())
            .collect()
    }

    pub(crate) fn answer_last(&self, codes: &[&str]) {
        let requests = self.requests.lock().expect("requests lock");
        let (_, token, sender) = requests.last().expect("pending request");
        let _ = sender.send(LookupEvent::Done {
            token: *token,
            outcome: LookupOutcome {
                matches: codes.iter().map(|code| catalog_match(code)).collect(),
                error: None,
            },
        });
    }
}

impl LookupRunner for ScriptedLookup {
    fn spawn_lookup(&self, query: String, _limit: usize, token: u64) -> Receiver<LookupEvent> {
        let (sender, receiver) = mpsc::channel();
        self.requests
            .lock()
            .expect("requests lock")
            .push((query, token, sender));
        receiver
    }
}

/// Generation runner whose completions are delivered by the test.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    spawned: Mutex<Vec<(String, u64, Arc<AtomicBool>, Sender<GenerationEvent>)>>,
}

impl ScriptedRunner {
    pub(crate) fn reports(&self) -> Vec<String> {
        self.spawned
            .lock()
            .expect("spawned lock")
            .iter()
            .map(|(report, _, _, _)| report.clone())
            .collect()
    }

    pub(crate) fn tokens(&self) -> Vec<u64> {
        self.spawned
            .lock()
            .expect("spawned lock")
            .iter()
            .map(|(_, token, _, _)| *token)
            .collect()
    }

    pub(crate) fn is_canceled(&self, token: u64) -> bool {
        self.spawned
            .lock()
            .expect("spawned lock")
            .iter()
            .find(|(_, candidate, _, _)| *candidate == token)
            .is_some_and(|(_, _, cancel, _)| cancel.load(Ordering::SeqCst))
    }

    /// Sends a completion. Sessions that already let go of the token simply
    /// never see it.
    pub(crate) fn finish(&self, token: u64, result: Result<Vec<CandidateCode>, String>) {
        let spawned = self.spawned.lock().expect("spawned lock");
        let (_, _, _, sender) = spawned
            .iter()
            .find(|(_, candidate, _, _)| *candidate == token)
            .expect("spawned token");
        let _ = sender.send(GenerationEvent::Done { token, result });
    }
}

impl GenerationRunner for ScriptedRunner {
    fn spawn_generate(
        &self,
        report: String,
        token: u64,
        cancel: Arc<AtomicBool>,
    ) -> Receiver<GenerationEvent> {
        let (sender, receiver) = mpsc::channel();
        self.spawned
            .lock()
            .expect("spawned lock")
            .push((report, token, cancel, sender));
        receiver
    }
}
