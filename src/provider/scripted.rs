use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use super::Provider;
use crate::wire::CompletionRequest;

/// In-process provider for tests: replays one fixed outcome and records
/// every request it receives.
pub struct ScriptedProvider {
    reply: std::result::Result<String, String>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn replying(text: impl Into<String>) -> Self {
        Self { reply: Ok(text.into()), seen: Mutex::new(Vec::new()) }
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self { reply: Err(msg.into()), seen: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        self.seen.lock().unwrap().push(req.clone());
        self.reply.clone().map_err(|e| anyhow!(e))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
