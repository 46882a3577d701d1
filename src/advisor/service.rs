//! Score memoization
//!
//! `AdvisorService` remembers the last successfully scored package set and
//! only goes to the network when a document references a package it has not
//! scored yet.

use crate::advisor::ScoreApi;
use crate::models::{AdvisorScore, ModuleReference};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error};

pub struct AdvisorService<A: ScoreApi> {
    api: A,
    /// Last successful response; `None` until the first one
    scores: Option<Vec<AdvisorScore>>,
    /// Names present in `scores` ("" for entries without a name)
    scored_names: Vec<String>,
    subscribers: Vec<Sender<()>>,
}

impl<A: ScoreApi> AdvisorService<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            scores: None,
            scored_names: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Last successfully fetched scores
    pub fn scores_result(&self) -> Option<&[AdvisorScore]> {
        self.scores.as_deref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Receive a message each time a remote call replaces the cached scores
    pub fn subscribe(&mut self) -> Receiver<()> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Scores for `modules`, going remote only when some name is unknown.
    ///
    /// A remote call always sends the full name list. Failures are logged
    /// and yield an empty list; the cache keeps its previous contents.
    pub fn get_scores(&mut self, modules: &[ModuleReference]) -> Vec<AdvisorScore> {
        if modules.is_empty() {
            return Vec::new();
        }

        let packages: Vec<String> = modules.iter().map(|m| m.name.clone()).collect();
        if let Some(scores) = &self.scores {
            if packages.iter().all(|pkg| self.scored_names.contains(pkg)) {
                debug!("All {} packages already scored, reusing cached scores", packages.len());
                return scores.clone();
            }
        }

        match self.api.fetch_scores(&packages) {
            Ok(scores) => {
                self.scored_names = scores.iter().map(|s| s.name.clone()).collect();
                self.scores = Some(scores.clone());
                debug!("Scored {} packages", scores.len());
                self.notify();
                scores
            }
            Err(e) => {
                error!("Failed to get scores: {}", e);
                Vec::new()
            }
        }
    }

    fn notify(&mut self) {
        self.subscribers.retain(|tx| tx.send(()).is_ok());
    }
}
