use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::{AdapterError, TextGenerator};
use crate::store::JobStore;
use crate::{JobId, JobRecord};

/// Answers every prompt with canned text, optionally failing or panicking on
/// one specific call (1-based).
#[derive(Default)]
pub struct ScriptedGenerator {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail_on: Option<usize>,
    panic_on: Option<usize>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn panicking_on(call: usize) -> Self {
        Self {
            panic_on: Some(call),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AdapterError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic_on == Some(call) {
            panic!("scripted panic on call {call}");
        }
        if self.fail_on == Some(call) {
            return Err(AdapterError::Status {
                status: 429,
                body: "quota exceeded".into(),
            });
        }
        Ok(format!(
            "Response {call}\n- You should add integration tests (call {call})\nnothing to see"
        ))
    }
}

pub async fn wait_for_terminal(store: &JobStore, id: &JobId) -> JobRecord {
    for _ in 0..200 {
        if let Some(record) = store.get(id) {
            if record.status.is_terminal() {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("analysis {id} did not finish in time");
}
