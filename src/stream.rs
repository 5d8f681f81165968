// src/stream.rs
//! # Streaming aggregation
//! Turns a finite sequence of text fragments into a sequence of snapshots of
//! the accumulated text.
//!
//! Every snapshot carries the *whole* body so far, so a consumer replaces what
//! it shows instead of appending. The sequence ends with exactly one terminal
//! snapshot (`Completed` or `Failed`) and is then exhausted for good; a new
//! aggregation needs a new adapter.

use futures::stream::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Inline notice shown after whatever partial body a failed stream produced.
pub const DETAIL_FAILURE_NOTICE: &str = "\n\n[获取详情失败，请检查网络连接或稍后重试]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum StreamStatus {
    Streaming,
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub text: String,
    pub status: StreamStatus,
}

impl Snapshot {
    pub fn streaming(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: StreamStatus::Streaming,
        }
    }

    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: StreamStatus::Completed,
        }
    }

    pub fn failed(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: StreamStatus::Failed(reason.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, StreamStatus::Streaming)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StreamStatus::Failed(_))
    }

    /// Text as a reader should see it: failures keep the partial body and get the notice appended.
    pub fn display_text(&self) -> String {
        if self.is_failed() {
            format!("{}{}", self.text, DETAIL_FAILURE_NOTICE)
        } else {
            self.text.clone()
        }
    }
}

/// Running buffer shared by the sync and async adapters.
#[derive(Debug, Default)]
struct Accumulator {
    buf: String,
    done: bool,
}

impl Accumulator {
    /// Feed one upstream item; `None` means "nothing to emit" (empty fragment).
    fn feed<E: Display>(&mut self, item: Option<Result<String, E>>) -> Option<Snapshot> {
        match item {
            Some(Ok(fragment)) => {
                if fragment.is_empty() {
                    return None;
                }
                self.buf.push_str(&fragment);
                Some(Snapshot::streaming(self.buf.clone()))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Snapshot::failed(self.buf.clone(), e.to_string()))
            }
            None => {
                self.done = true;
                Some(Snapshot::completed(self.buf.clone()))
            }
        }
    }
}

/// Iterator adapter: fragments in, snapshots out.
pub struct Snapshots<I> {
    inner: I,
    acc: Accumulator,
}

impl<I> Snapshots<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            acc: Accumulator::default(),
        }
    }
}

impl<I, E> Iterator for Snapshots<I>
where
    I: Iterator<Item = Result<String, E>>,
    E: Display,
{
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        while !self.acc.done {
            let item = self.inner.next();
            if let Some(snap) = self.acc.feed(item) {
                return Some(snap);
            }
        }
        None
    }
}

impl<I, E> std::iter::FusedIterator for Snapshots<I>
where
    I: Iterator<Item = Result<String, E>>,
    E: Display,
{
}

/// Stream adapter with the same contract as [`Snapshots`].
pub struct SnapshotStream<S> {
    inner: S,
    acc: Accumulator,
}

impl<S> SnapshotStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            acc: Accumulator::default(),
        }
    }
}

impl<S, E> Stream for SnapshotStream<S>
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Display,
{
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        let this = &mut *self;
        while !this.acc.done {
            let item = match this.inner.poll_next_unpin(cx) {
                Poll::Ready(item) => item,
                Poll::Pending => return Poll::Pending,
            };
            if let Some(snap) = this.acc.feed(item) {
                return Poll::Ready(Some(snap));
            }
        }
        Poll::Ready(None)
    }
}

/// Result of a callback-driven aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregated {
    pub text: String,
    pub failure: Option<String>,
}

/// Callback form: `on_snapshot` sees the full text once per fragment.
pub fn aggregate<I, E, F>(fragments: I, mut on_snapshot: F) -> Aggregated
where
    I: IntoIterator<Item = Result<String, E>>,
    E: Display,
    F: FnMut(&str),
{
    for snap in Snapshots::new(fragments.into_iter()) {
        match snap.status {
            StreamStatus::Streaming => on_snapshot(&snap.text),
            StreamStatus::Completed => {
                return Aggregated {
                    text: snap.text,
                    failure: None,
                }
            }
            StreamStatus::Failed(reason) => {
                return Aggregated {
                    text: snap.text,
                    failure: Some(reason),
                }
            }
        }
    }
    // Snapshots always ends with a terminal snapshot; kept for exhaustiveness.
    Aggregated {
        text: String::new(),
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fragments_produce_no_snapshot() {
        let frags: Vec<Result<String, String>> = vec![Ok("".into()), Ok("x".into()), Ok("".into())];
        let out: Vec<Snapshot> = Snapshots::new(frags.into_iter()).collect();
        assert_eq!(out, vec![Snapshot::streaming("x"), Snapshot::completed("x")]);
    }

    #[test]
    fn exhausted_adapter_stays_exhausted() {
        let frags: Vec<Result<String, String>> = vec![Ok("a".into())];
        let mut it = Snapshots::new(frags.into_iter());
        assert!(it.next().is_some());
        assert!(it.next().unwrap().is_terminal());
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn display_text_appends_notice_only_on_failure() {
        assert_eq!(Snapshot::completed("正文").display_text(), "正文");
        let failed = Snapshot::failed("正文", "reset");
        assert_eq!(failed.display_text(), format!("正文{DETAIL_FAILURE_NOTICE}"));
    }
}
