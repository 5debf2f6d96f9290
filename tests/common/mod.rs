// Shared helpers for the integration tests.
#![allow(dead_code)]

use backlink_tracker::checker::{CheckResult, LinkChecker};
use backlink_tracker::storage::{BacklinkStatus, JsonFileStore, LinkType};
use backlink_tracker::{Error, Result};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

/// A checker that answers from a fixed table instead of the network.
///
/// URLs missing from the table come back as a plain Lost result.
#[derive(Default)]
pub struct ScriptedChecker {
    answers: HashMap<String, std::result::Result<CheckResult, String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, external_url: &str, result: CheckResult) -> Self {
        self.answers.insert(external_url.to_string(), Ok(result));
        self
    }

    pub fn fail(mut self, external_url: &str, message: &str) -> Self {
        self.answers
            .insert(external_url.to_string(), Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl LinkChecker for ScriptedChecker {
    fn check<'a>(
        &'a self,
        external_url: &'a str,
        _target_url: &'a str,
    ) -> BoxFuture<'a, Result<CheckResult>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(external_url.to_string());
            match self.answers.get(external_url) {
                Some(Ok(result)) => Ok(result.clone()),
                Some(Err(message)) => Err(Error::Other(message.clone())),
                None => Ok(lost()),
            }
        })
    }
}

pub fn active(anchor: &str) -> CheckResult {
    CheckResult {
        status: BacklinkStatus::Active,
        link_type: Some(LinkType::Dofollow),
        anchor_text: Some(anchor.to_string()),
        error: None,
        http_status: Some(200),
    }
}

pub fn nofollow(anchor: &str) -> CheckResult {
    CheckResult {
        status: BacklinkStatus::NoFollow,
        link_type: Some(LinkType::Nofollow),
        anchor_text: Some(anchor.to_string()),
        error: None,
        http_status: Some(200),
    }
}

pub fn lost() -> CheckResult {
    CheckResult {
        status: BacklinkStatus::Lost,
        link_type: None,
        anchor_text: None,
        error: None,
        http_status: Some(200),
    }
}

/// A store in a fresh temp directory. Keep the TempDir alive for the test.
pub fn temp_store() -> (TempDir, JsonFileStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("data").join("seo-tracker.json"));
    (dir, store)
}
