use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::wire::CompletionRequest;

/// Install the global subscriber. `RUST_LOG` wins over the `debug` flag.
/// Output goes to stderr so `--json` stdout stays machine-readable.
pub fn init_tracing(debug: bool) {
    let fallback = if debug {
        "vibe_ideagen=debug,tower_http=debug"
    } else {
        "vibe_ideagen=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: PathBuf,
    pub response: Option<PathBuf>,
}

#[derive(Serialize)]
struct RequestRecord<'a> {
    tx: Uuid,
    stage: &'a str,
    recorded_at: DateTime<Utc>,
    provider: &'a str,
    request: &'a CompletionRequest,
}

/// On-disk capture of provider exchanges, one directory per transaction.
#[derive(Debug, Clone)]
pub struct ArtifactLog {
    root: PathBuf,
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join(".vibe").join("tx").join(tx.to_string())
}

impl ArtifactLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `<stage>.request.json`, plus `<stage>.response.txt` when the
    /// provider produced text.
    pub fn save_stage(
        &self,
        stage: &str,
        provider: &str,
        req: &CompletionRequest,
        raw_response: Option<&str>,
    ) -> anyhow::Result<SavedPaths> {
        let tx = Uuid::new_v4();
        let dir = tx_dir(&self.root, tx);
        fs::create_dir_all(&dir)?;

        let record = RequestRecord { tx, stage, recorded_at: Utc::now(), provider, request: req };
        let request = dir.join(format!("{stage}.request.json"));
        fs::write(&request, to_string_pretty(&record)?)?;

        let mut response = None;
        if let Some(raw) = raw_response {
            let p = dir.join(format!("{stage}.response.txt"));
            fs::write(&p, raw)?;
            response = Some(p);
        }

        Ok(SavedPaths { dir, request, response })
    }
}
