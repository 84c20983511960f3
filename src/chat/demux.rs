// ABOUTME: Stream demultiplexer splitting raw token fragments into typed event channels
// ABOUTME: Two-state machine detects and extracts one embedded chart payload per fenced block
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Stream Demultiplexer
//!
//! Converts the ordered fragment sequence produced by a streaming completion
//! into a typed [`StreamEvent`] sequence: narrative `content`, out-of-band
//! `chart` payloads, informational `status`, and a single terminal
//! `complete`/`error`.
//!
//! The chart detection logic is a deliberate two-state machine
//! ([`ChartExtractor`]), independent of any transport, fed arbitrary fragment
//! boundaries. A chart payload is a fenced code block whose body carries a
//! `chartConfig` object; the raw markup is elided from the `content` channel
//! and the extracted payload is emitted once on the `chart` channel - or
//! dropped silently when the block is malformed or never terminated.

use std::mem;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::llm::ChatStream;

/// Code-fence delimiter for embedded blocks
const FENCE: &str = "```";

/// Distinguishing field that marks a fenced block as a chart payload
const CHART_KEY: &str = "chartConfig";

// ============================================================================
// Stream Events
// ============================================================================

/// A typed event demultiplexed from the raw token stream
///
/// Ordering within one stream is significant: `content` events appear in
/// production order, `chart` events are out-of-band, and exactly one of
/// `complete`/`error` terminates the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Informational progress marker ("connecting", "completed")
    Status(String),
    /// Narrative answer text
    Content(String),
    /// Extracted chart payload, serialized JSON text
    Chart(String),
    /// Terminal failure detail
    Error(String),
    /// Terminal success marker
    Complete(String),
}

impl StreamEvent {
    /// Informational status event
    #[must_use]
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status(message.into())
    }

    /// Narrative content event
    #[must_use]
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content(text.into())
    }

    /// Chart payload event
    #[must_use]
    pub fn chart(payload: impl Into<String>) -> Self {
        Self::Chart(payload.into())
    }

    /// Terminal error event
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Terminal completion event
    #[must_use]
    pub fn complete() -> Self {
        Self::Complete(String::new())
    }

    /// Whether this event terminates the stream
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Complete(_))
    }
}

// ============================================================================
// Chart Extraction State Machine
// ============================================================================

/// Output of feeding one fragment through the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutput {
    /// Narrative text to forward on the `content` channel
    Content(String),
    /// A complete, validated chart payload
    Chart(String),
}

impl From<ScanOutput> for StreamEvent {
    fn from(output: ScanOutput) -> Self {
        match output {
            ScanOutput::Content(text) => Self::Content(text),
            ScanOutput::Chart(payload) => Self::Chart(payload),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Narrative flows straight through while watching for an opening marker
    Passthrough,
    /// Inside a suspected chart block; fragments accumulate until the fence closes
    Buffering,
}

/// Two-state machine detecting one embedded chart payload per fenced block
///
/// Fed arbitrary fragment boundaries; at most one block's worth of text is
/// buffered at a time. In PASSTHROUGH, text ahead of an opening fence is
/// released immediately; text from an opening fence onward is held until the
/// block is classifiable (chart marker seen, plain block closed, or stream
/// ended). Held text is never reordered.
#[derive(Debug)]
pub struct ChartExtractor {
    state: ScanState,
    /// Passthrough text not yet released (possible fence prefix)
    pending: String,
    /// Suspected chart block under accumulation, opening fence included
    buffer: String,
}

impl Default for ChartExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartExtractor {
    /// Create a new extractor in the passthrough state
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ScanState::Passthrough,
            pending: String::new(),
            buffer: String::new(),
        }
    }

    /// Feed one fragment, producing zero or more outputs
    pub fn push(&mut self, fragment: &str) -> Vec<ScanOutput> {
        let mut outputs = Vec::new();
        match self.state {
            ScanState::Passthrough => {
                self.pending.push_str(fragment);
                self.drain_pending(&mut outputs);
            }
            ScanState::Buffering => {
                self.buffer.push_str(fragment);
                self.drain_buffer(&mut outputs);
            }
        }
        outputs
    }

    /// Signal end of stream: release held narrative, discard any open block
    ///
    /// An unterminated chart block is dropped without error - a best-effort
    /// elision, per the streaming contract.
    pub fn finish(mut self) -> Vec<ScanOutput> {
        match self.state {
            ScanState::Passthrough if !self.pending.is_empty() => {
                vec![ScanOutput::Content(mem::take(&mut self.pending))]
            }
            _ => Vec::new(),
        }
    }

    /// Scan held passthrough text, releasing what is decidable
    fn drain_pending(&mut self, outputs: &mut Vec<ScanOutput>) {
        loop {
            let Some(fence_at) = self.pending.find(FENCE) else {
                // No fence: release everything except a possible split-fence tail
                let keep = trailing_backticks(&self.pending).min(FENCE.len() - 1);
                let release = self.pending.len() - keep;
                if release > 0 {
                    let tail = self.pending.split_off(release);
                    outputs.push(ScanOutput::Content(mem::replace(&mut self.pending, tail)));
                }
                return;
            };

            let body = &self.pending[fence_at + FENCE.len()..];
            let chart_at = body.find(CHART_KEY);
            let close_at = body.find(FENCE);

            match (chart_at, close_at) {
                // Chart marker inside the open block: divert from the fence onward
                (Some(c), close) if close.map_or(true, |e| c < e) => {
                    let block = self.pending.split_off(fence_at);
                    if !self.pending.is_empty() {
                        outputs.push(ScanOutput::Content(mem::take(&mut self.pending)));
                    }
                    self.buffer = block;
                    self.state = ScanState::Buffering;
                    self.drain_buffer(outputs);
                    return;
                }
                // Block closed without the chart marker: plain narrative fence
                (_, Some(close_rel)) => {
                    let end = fence_at + FENCE.len() + close_rel + FENCE.len();
                    let tail = self.pending.split_off(end);
                    outputs.push(ScanOutput::Content(mem::replace(&mut self.pending, tail)));
                }
                // Fence open, nothing decidable yet: release the prefix, hold the rest
                (_, None) => {
                    if fence_at > 0 {
                        let tail = self.pending.split_off(fence_at);
                        outputs.push(ScanOutput::Content(mem::replace(&mut self.pending, tail)));
                    }
                    return;
                }
            }
        }
    }

    /// Check the accumulating block for its closing fence and extract
    fn drain_buffer(&mut self, outputs: &mut Vec<ScanOutput>) {
        let Some(close_rel) = self.buffer[FENCE.len()..].find(FENCE) else {
            return;
        };
        let close_at = FENCE.len() + close_rel;

        if let Some(payload) = extract_payload(&self.buffer[..close_at]) {
            outputs.push(ScanOutput::Chart(payload));
        }

        // Extraction outcome does not matter: clear the block, rescan the tail
        let remainder = self.buffer.split_off(close_at + FENCE.len());
        self.buffer.clear();
        self.state = ScanState::Passthrough;
        if !remainder.is_empty() {
            self.pending.push_str(&remainder);
            self.drain_pending(outputs);
        }
    }
}

/// Count trailing backtick characters (a fence possibly split mid-fragment)
fn trailing_backticks(text: &str) -> usize {
    text.bytes().rev().take_while(|&b| b == b'`').count()
}

/// Tolerant extraction of the chart object from a fenced block
///
/// Locates the object containing the distinguishing field, then validates:
/// the field is present, braces balance, and the text parses as JSON. The
/// parse makes the emitted-payload contract hold - anything that reaches the
/// `chart` channel is syntactically valid.
fn extract_payload(block: &str) -> Option<String> {
    let object_at = block.find('{')?;
    let payload = block[object_at..].trim_end();

    if !payload.contains(CHART_KEY) {
        return None;
    }
    if payload.matches('{').count() != payload.matches('}').count() {
        return None;
    }
    serde_json::from_str::<serde_json::Value>(payload).ok()?;

    Some(payload.to_owned())
}

// ============================================================================
// Stream Adapter
// ============================================================================

/// Demultiplex a raw completion stream into typed events
///
/// Emits `status("connecting")` before the first fragment is requested and
/// `status("completed")` once the source is exhausted, followed by the
/// terminal `complete`. An upstream error produces a single terminal `error`
/// and nothing after it. Fragments are pulled lazily: the next one is not
/// requested until the events for the current one have been consumed.
pub fn demux(source: ChatStream) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
    let events = async_stream::stream! {
        yield StreamEvent::status("connecting");

        let mut extractor = ChartExtractor::new();
        let mut source = source;

        while let Some(item) = source.next().await {
            match item {
                Ok(chunk) => {
                    for output in extractor.push(&chunk.delta) {
                        yield StreamEvent::from(output);
                    }
                }
                Err(e) => {
                    yield StreamEvent::error(e.to_string());
                    return;
                }
            }
        }

        for output in extractor.finish() {
            yield StreamEvent::from(output);
        }
        yield StreamEvent::status("completed");
        yield StreamEvent::complete();
    };

    Box::pin(events)
}
