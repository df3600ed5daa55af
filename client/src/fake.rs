//! Scripted transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use kerbalstuff_core::{ApiError, HttpRequest, HttpResponse, Result};

use crate::transport::Transport;

/// Replays queued responses and records every request it was asked to send.
#[derive(Default)]
pub(crate) struct FakeTransport {
    pub(crate) requests: RefCell<Vec<HttpRequest>>,
    responses: RefCell<VecDeque<HttpResponse>>,
}

impl FakeTransport {
    pub(crate) fn replying(bodies: &[&str]) -> Self {
        let fake = Self::default();
        for body in bodies {
            fake.push(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            });
        }
        fake
    }

    pub(crate) fn push(&self, response: HttpResponse) {
        self.responses.borrow_mut().push_back(response);
    }

    pub(crate) fn sent(&self) -> usize {
        self.requests.borrow().len()
    }

    pub(crate) fn last_path(&self) -> String {
        self.requests
            .borrow()
            .last()
            .map(|r| r.path.clone())
            .unwrap_or_default()
    }
}

impl Transport for FakeTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no scripted response".to_string()))
    }
}
