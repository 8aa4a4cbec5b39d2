// ABOUTME: In-memory registry that replays a script of tag-list replies.
// ABOUTME: Lets poller tests control found/missing/error/hang per call.

use async_trait::async_trait;
use imagewait::registry::{Connector, RegistryError, TagLister};
use imagewait::types::Credentials;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// One reply to a `list_tags` call.
#[derive(Debug, Clone)]
pub enum Reply {
    Tags(Vec<String>),
    Fail,
    Hang,
}

impl Reply {
    pub fn tags(tags: &[&str]) -> Self {
        Reply::Tags(tags.iter().map(|t| t.to_string()).collect())
    }
}

#[derive(Debug)]
pub struct Script {
    replies: Mutex<VecDeque<Reply>>,
    otherwise: Reply,
    list_calls: AtomicU32,
    connects: AtomicU32,
    refuse_connect: bool,
    last_url: Mutex<Option<String>>,
}

/// Connector half of the scripted registry.
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    script: Arc<Script>,
}

impl ScriptedConnector {
    /// Replays `replies` in order, then answers `otherwise` forever.
    pub fn new(replies: Vec<Reply>, otherwise: Reply) -> Self {
        Self::build(replies, otherwise, false)
    }

    /// Every call answers `reply`.
    pub fn always(reply: Reply) -> Self {
        Self::new(Vec::new(), reply)
    }

    /// Login is rejected.
    pub fn refusing() -> Self {
        Self::build(Vec::new(), Reply::Fail, true)
    }

    fn build(replies: Vec<Reply>, otherwise: Reply, refuse_connect: bool) -> Self {
        Self {
            script: Arc::new(Script {
                replies: Mutex::new(replies.into()),
                otherwise,
                list_calls: AtomicU32::new(0),
                connects: AtomicU32::new(0),
                refuse_connect,
                last_url: Mutex::new(None),
            }),
        }
    }

    pub fn list_calls(&self) -> u32 {
        self.script.list_calls.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> u32 {
        self.script.connects.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.script.last_url.lock().clone()
    }
}

#[derive(Debug)]
pub struct ScriptedClient {
    script: Arc<Script>,
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Client = ScriptedClient;

    async fn connect(
        &self,
        url: &str,
        _credentials: &Credentials,
    ) -> Result<ScriptedClient, RegistryError> {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        *self.script.last_url.lock() = Some(url.to_string());

        if self.script.refuse_connect {
            return Err(RegistryError::Unauthorized {
                url: url.to_string(),
            });
        }

        Ok(ScriptedClient {
            script: self.script.clone(),
        })
    }
}

#[async_trait]
impl TagLister for ScriptedClient {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        self.script.list_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .script
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.script.otherwise.clone());

        match reply {
            Reply::Tags(tags) => Ok(tags),
            Reply::Fail => Err(RegistryError::UnexpectedStatus {
                url: format!("stub://{}", repository),
                status: 503,
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}
