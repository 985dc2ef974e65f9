//! In-memory source for unit tests: canned replies per URL.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use super::{FetchResponse, ResponseHeaders, Source, SourceFactory};
use crate::retry::FetchError;

#[derive(Debug, Clone)]
pub enum Reply {
    Body {
        body: Vec<u8>,
        headers: Vec<(String, String)>,
        final_url: Option<String>,
    },
    Status(u32),
}

impl Reply {
    pub fn body(body: impl Into<Vec<u8>>) -> Self {
        Reply::Body {
            body: body.into(),
            headers: Vec::new(),
            final_url: None,
        }
    }

    pub fn with_header(body: impl Into<Vec<u8>>, name: &str, value: &str) -> Self {
        Reply::Body {
            body: body.into(),
            headers: vec![(name.to_string(), value.to_string())],
            final_url: None,
        }
    }
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    calls: Vec<String>,
}

/// Replies are consumed in order; the last one for a URL repeats forever.
/// Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, url: &str, replies: impl IntoIterator<Item = Reply>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(url.to_string(), replies.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| *c == url).count()
    }
}

impl Source for ScriptedSource {
    fn fetch(&mut self, url: &str) -> Result<FetchResponse, FetchError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(url.to_string());
        let reply = match script.replies.get_mut(url) {
            Some(q) if q.len() > 1 => q.pop_front(),
            Some(q) => q.front().cloned(),
            None => None,
        };
        match reply {
            Some(Reply::Body {
                body,
                headers,
                final_url,
            }) => Ok(FetchResponse {
                body,
                headers: ResponseHeaders::from_pairs(headers),
                final_url,
            }),
            Some(Reply::Status(code)) => Err(FetchError::Http(code)),
            None => Err(FetchError::Http(404)),
        }
    }
}

impl SourceFactory for ScriptedSource {
    fn open(&self, _worker: usize) -> Result<Box<dyn Source>> {
        Ok(Box::new(self.clone()))
    }
}
