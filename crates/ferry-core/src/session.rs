use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Unique identifier for a streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One frame written to an SSE connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Event { name: &'static str, data: String },
    /// Comment-only frame that keeps intermediaries from timing out.
    KeepAlive,
}

impl Frame {
    pub fn event(name: &'static str, data: impl Into<String>) -> Self {
        Self::Event {
            name,
            data: data.into(),
        }
    }
}

/// A long-lived SSE connection.
///
/// Yields the initial frames, then a [`Frame::KeepAlive`] every interval until
/// dropped. Dropping the stream (the HTTP layer does this when the client goes
/// away) cancels the keepalive task, so nothing is written afterwards.
pub struct SessionStream {
    id: SessionId,
    opened_at: DateTime<Utc>,
    token: Option<String>,
    cancel: CancellationToken,
    frames: Pin<Box<dyn Stream<Item = Frame> + Send>>,
}

impl SessionStream {
    /// Open a stream and spawn its keepalive task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn open(initial: Vec<Frame>, keepalive: Duration, token: Option<String>) -> Self {
        let id = SessionId::new();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(4);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + keepalive;
            let mut ticker = tokio::time::interval_at(start, keepalive);
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(Frame::KeepAlive).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::trace!(session = %id, "keepalive task stopped");
        });

        tracing::debug!(session = %id, keepalive_secs = keepalive.as_secs(), "session opened");

        let frames = tokio_stream::iter(initial).chain(ReceiverStream::new(rx));
        Self {
            id,
            opened_at: Utc::now(),
            token,
            cancel,
            frames: Box::pin(frames),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Token presented when the stream was opened, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Token that fires when this session closes.
    #[must_use]
    pub fn closed(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for SessionStream {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        self.frames.as_mut().poll_next(cx)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        let open_secs = (Utc::now() - self.opened_at).num_seconds();
        tracing::debug!(session = %self.id, open_secs, "session closed");
    }
}

impl std::fmt::Debug for SessionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStream")
            .field("id", &self.id)
            .field("opened_at", &self.opened_at)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}
