//! In-process transport double that replays canned replies in order.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

pub(crate) type Reply = Result<TransportResponse, TransportError>;

pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &TransportRequest) -> Reply {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".into())))
    }
}

pub(crate) fn reply(status: u16, payload: Value) -> Reply {
    Ok(TransportResponse {
        status,
        body: serde_json::to_vec(&payload).unwrap(),
    })
}

pub(crate) fn ok(payload: Value) -> Reply {
    reply(200, payload)
}

pub(crate) fn refused() -> Reply {
    Err(TransportError::Connect("connection refused".into()))
}
