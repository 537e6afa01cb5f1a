//! Request/response transport to a page context
//!
//! The page context runs on its own thread: the parsed page is not `Send`, so
//! it is built there and never leaves. Requests cross a bounded channel and are
//! answered through a oneshot; completed picks come back on a separate push
//! channel.

use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use super::messages::{PointerInput, PointerReply, Push, Request, Response};
use super::page_context::PageContext;
use crate::dom::Page;
use crate::error::{PickerError, Result};
use crate::utils::config::Config;

const REQUEST_QUEUE: usize = 32;

/// Anything that can carry a [`Request`] to a page context and bring back its [`Response`]
#[async_trait]
pub trait ContextTransport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

enum Envelope {
    Message {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
    Pointer {
        input: PointerInput,
        reply: oneshot::Sender<PointerReply>,
    },
}

/// Handle used by the UI side to talk to one page context
#[derive(Clone)]
pub struct ContextClient {
    sender: mpsc::Sender<Envelope>,
    timeout: Duration,
    /// Deadline for `parseData` replies
    parse_timeout: Duration,
}

fn unreachable(reason: &str) -> PickerError {
    PickerError::ContextUnreachable(reason.to_string())
}

impl ContextClient {
    fn new(sender: mpsc::Sender<Envelope>, timeout: Duration, parse_timeout: Duration) -> Self {
        Self {
            sender,
            timeout,
            parse_timeout,
        }
    }

    /// Deliver pointer input to the page
    pub async fn pointer(&self, input: PointerInput) -> Result<PointerReply> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(Envelope::Pointer { input, reply })
            .await
            .map_err(|_| unreachable("page context is closed"))?;
        self.await_reply(answer, self.timeout).await
    }

    async fn await_reply<T>(&self, answer: oneshot::Receiver<T>, limit: Duration) -> Result<T> {
        match timeout(limit, answer).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(unreachable("page context dropped the request")),
            Err(_) => Err(unreachable(&format!(
                "no response within {} ms, the page may be busy or gone",
                limit.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl ContextTransport for ContextClient {
    async fn send(&self, request: Request) -> Result<Response> {
        let limit = match request {
            Request::ParseData { .. } => self.parse_timeout,
            _ => self.timeout,
        };
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(Envelope::Message { request, reply })
            .await
            .map_err(|_| unreachable("page context is closed"))?;
        self.await_reply(answer, limit).await
    }
}

/// Start a page context for `html` on a dedicated thread
///
/// The context lives until every [`ContextClient`] clone is dropped.
pub fn spawn_page_context(
    html: String,
    config: &Config,
) -> Result<(ContextClient, mpsc::UnboundedReceiver<Push>)> {
    let (sender, mut receiver) = mpsc::channel::<Envelope>(REQUEST_QUEUE);
    let (push_sender, push_receiver) = mpsc::unbounded_channel();
    let highlight = config.highlight_style();

    std::thread::Builder::new()
        .name("page-context".to_string())
        .spawn(move || {
            let mut context = PageContext::new(Page::parse(&html), push_sender, highlight);
            while let Some(envelope) = receiver.blocking_recv() {
                match envelope {
                    Envelope::Message { request, reply } => {
                        debug!("Page context received {:?}", request);
                        if reply.send(context.handle_request(request)).is_err() {
                            warn!("Reply finished after the client stopped waiting");
                        }
                    }
                    Envelope::Pointer { input, reply } => {
                        let _ = reply.send(context.pointer_reply(&input));
                    }
                }
            }
            debug!("Page context closed");
        })?;

    Ok((
        ContextClient::new(
            sender,
            Duration::from_millis(config.rpc_timeout_ms),
            Duration::from_millis(config.parse_timeout_ms),
        ),
        push_receiver,
    ))
}
