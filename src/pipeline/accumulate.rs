use crate::pipeline::PipelineError;
use crate::types::events::StreamingEvent;
use crate::{BoxStream, Error, Result};
use futures::StreamExt;

/// Accumulator folds content deltas into one string, in arrival order.
///
/// There is no partial result: the first error drops everything accumulated so far.
#[derive(Debug, Default)]
pub struct Accumulator {
    text: String,
    chunks: usize,
    finish_reason: Option<String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event. A provider-reported stream error is returned as an error.
    pub fn push(&mut self, event: StreamingEvent) -> Result<()> {
        match event {
            StreamingEvent::PartialContentDelta { content, .. } => {
                self.text.push_str(&content);
                self.chunks += 1;
                Ok(())
            }
            StreamingEvent::StreamEnd { finish_reason } => {
                if finish_reason.is_some() {
                    self.finish_reason = finish_reason;
                }
                Ok(())
            }
            StreamingEvent::StreamError { error, .. } => {
                Err(PipelineError::from_stream_error(&error).into())
            }
        }
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Drain `events` to completion and return the full text.
    pub async fn collect(mut events: BoxStream<'static, StreamingEvent>) -> Result<String> {
        let mut acc = Accumulator::new();
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| acc.abort(e))?;
            acc.push(event).map_err(|e| acc.abort(e))?;
        }
        tracing::debug!(
            chunks = acc.chunks,
            finish_reason = acc.finish_reason.as_deref().unwrap_or("none"),
            "stream completed"
        );
        Ok(acc.into_text())
    }

    fn abort(&mut self, error: Error) -> Error {
        tracing::warn!(
            chunks = self.chunks,
            discarded_bytes = self.text.len(),
            error = %error,
            "stream aborted, discarding partial response"
        );
        self.text.clear();
        error
    }
}
