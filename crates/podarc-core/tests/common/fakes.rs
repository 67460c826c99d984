//! In-process stand-ins for the transport, embedder and operator.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use podarc_core::embed::{EmbedError, EpisodeTags, MetadataEmbedder};
use podarc_core::planner::DownloadEstimate;
use podarc_core::policy::{DecisionContext, ErrorCategory, Prompter, Resolution};
use podarc_core::retry::TransportError;
use podarc_core::transport::Transport;

/// Looks like an MP3 to the verify probe.
pub const AUDIO: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00fake audio payload";

#[derive(Debug, Clone)]
pub enum Step {
    Body(Vec<u8>),
    Timeout,
    Http(u32),
}

/// Answers each URL from a queue of scripted steps; an empty queue serves
/// [`AUDIO`].
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: AtomicUsize,
    delay_ms: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    /// Every transfer holds its slot this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Highest number of transfers seen running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn script(&self, url: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Step::Body(AUDIO.to_vec()));
        match step {
            Step::Body(b) => {
                sink.write_all(&b).map_err(TransportError::Sink)?;
                Ok(b.len() as u64)
            }
            Step::Timeout => Err(TransportError::Timeout("scripted timeout".into())),
            Step::Http(code) => Err(TransportError::Http(code)),
        }
    }
}

impl Transport for ScriptedTransport {
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        let result = self.answer(url, sink);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Appends a marker so tests can see the file was tagged.
#[derive(Default)]
pub struct MarkerEmbedder {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MarkerEmbedder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl MetadataEmbedder for MarkerEmbedder {
    fn embed_full(&self, path: &Path, _tags: &EpisodeTags) -> Result<(), EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbedError::Unsupported("scripted".into()));
        }
        let mut f = std::fs::OpenOptions::new().append(true).open(path)?;
        f.write_all(b"TAGS")?;
        Ok(())
    }

    fn embed_simple(&self, _path: &Path, _tags: &EpisodeTags) -> Result<bool, EmbedError> {
        Err(EmbedError::Failed("not scripted".into()))
    }
}

/// Fixed answer; records every question asked.
pub struct CountingPrompter {
    pub answer: Resolution,
    pub asked: Mutex<Vec<ErrorCategory>>,
    pub confirm: bool,
}

impl CountingPrompter {
    pub fn new(answer: Resolution) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
            confirm: true,
        }
    }

    pub fn asked(&self) -> Vec<ErrorCategory> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for CountingPrompter {
    fn resolve(&self, ctx: &DecisionContext) -> Resolution {
        self.asked.lock().unwrap().push(ctx.category);
        self.answer
    }

    fn confirm_download(&self, _estimate: &DownloadEstimate) -> bool {
        self.confirm
    }
}
