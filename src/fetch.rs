//! Remote text fetching. Requests run on their own thread and hand their
//! result back to the editor through a channel.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;
use crate::level::LevelId;

pub trait Fetcher: Send + Sync {
    fn fetch_text(&self, url: &Url) -> Result<String, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Blocking HTTP(S) GET via ureq.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let response = ureq::get(url.as_str())
            .timeout(self.timeout)
            .call()
            .map_err(|err| FetchError::Request {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        response.into_string().map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[derive(Debug)]
pub struct FetchCompletion {
    pub target: LevelId,
    pub url: Url,
    pub result: Result<String, FetchError>,
}

/// In-flight fetches of one editor.
pub(crate) struct FetchQueue {
    sender: Sender<FetchCompletion>,
    receiver: Receiver<FetchCompletion>,
    pending: usize,
}

impl FetchQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            pending: 0,
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending
    }

    pub(crate) fn spawn(&mut self, fetcher: Arc<dyn Fetcher>, target: LevelId, url: Url) {
        let sender = self.sender.clone();
        self.pending += 1;
        thread::spawn(move || {
            let result = fetcher.fetch_text(&url);
            // The editor may be gone by now; nothing left to deliver to.
            let _ = sender.send(FetchCompletion {
                target,
                url,
                result,
            });
        });
    }

    /// Every completion that has arrived so far, without blocking.
    pub(crate) fn drain(&mut self) -> Vec<FetchCompletion> {
        let completions: Vec<_> = self.receiver.try_iter().collect();
        self.pending = self.pending.saturating_sub(completions.len());
        completions
    }

    pub(crate) fn wait(&mut self, timeout: Duration) -> Option<FetchCompletion> {
        if self.pending == 0 {
            return None;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.pending -= 1;
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
