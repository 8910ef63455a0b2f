use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::trace;

use crate::engine::{Request, Response};

use super::NetworkApi;

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Runs requests on short-lived worker threads. Responses are collected on
/// the caller's thread with [`Dispatcher::try_collect`].
pub struct Dispatcher {
    api: Arc<dyn NetworkApi>,
    tx: Sender<Response>,
    rx: Receiver<Response>,
    in_flight: usize,
    waker: Option<Waker>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn NetworkApi>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            tx,
            rx,
            in_flight: 0,
            waker: None,
        }
    }

    /// Called from the worker after each response is queued, typically to
    /// request a repaint.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn submit(&mut self, request: Request) {
        trace!(?request, "dispatching");
        self.in_flight += 1;

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let waker = self.waker.clone();

        thread::spawn(move || {
            let response = request.execute(api.as_ref());
            let _ = tx.send(response);
            if let Some(waker) = waker {
                waker();
            }
        });
    }

    pub fn submit_all(&mut self, requests: impl IntoIterator<Item = Request>) {
        for request in requests {
            self.submit(request);
        }
    }

    pub fn try_collect(&mut self) -> Vec<Response> {
        let responses = self.rx.try_iter().collect::<Vec<_>>();
        self.in_flight = self.in_flight.saturating_sub(responses.len());
        responses
    }
}
