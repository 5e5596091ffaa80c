//! Queue-backed transport
//!
//! Answers requests in the order they arrive, from responses queued ahead of
//! time, and remembers every request. A response can be held back behind a
//! gate so tests can decide which of two overlapping requests resolves first.

use super::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::RefCell;
use std::collections::VecDeque;

struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<HttpResponse, TransportError>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    script: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unanswered request
    pub fn push(&self, response: HttpResponse) {
        self.script.borrow_mut().push_back(Scripted {
            gate: None,
            result: Ok(response),
        });
    }

    /// Queue a network failure
    pub fn push_error(&self, error: TransportError) {
        self.script.borrow_mut().push_back(Scripted {
            gate: None,
            result: Err(error),
        });
    }

    /// Queue a response that is only delivered once the returned sender fires
    /// (or is dropped)
    pub fn push_gated(&self, response: HttpResponse) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script.borrow_mut().push_back(Scripted {
            gate: Some(rx),
            result: Ok(response),
        });
        tx
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }

    /// Responses queued but not yet taken
    pub fn pending(&self) -> usize {
        self.script.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::trace!(method = %request.method, path = %request.path, "scripted request");
        self.requests.borrow_mut().push(request);

        let next = self.script.borrow_mut().pop_front();
        let Some(scripted) = next else {
            return Err(TransportError::Network("no scripted response".to_string()));
        };

        if let Some(gate) = scripted.gate {
            // A dropped sender releases the response as well.
            let _ = gate.await;
        }
        scripted.result
    }
}
