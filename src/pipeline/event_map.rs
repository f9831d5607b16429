//! Event mapping (JSON Value -> StreamingEvent)
//!
//! Chunk semantics belong to the provider driver; this stage only flattens the
//! events each frame produces and numbers the content deltas.

use crate::drivers::ProviderDriver;
use crate::pipeline::Mapper;
use crate::types::events::StreamingEvent;
use crate::{BoxStream, PipeResult};
use futures::{stream, StreamExt};
use std::sync::Arc;
use tracing::trace;

pub struct DriverEventMapper {
    driver: Arc<dyn ProviderDriver>,
}

impl DriverEventMapper {
    pub fn new(driver: Arc<dyn ProviderDriver>) -> Self {
        Self { driver }
    }
}

#[async_trait::async_trait]
impl Mapper for DriverEventMapper {
    async fn map(
        &self,
        input: BoxStream<'static, serde_json::Value>,
    ) -> PipeResult<BoxStream<'static, StreamingEvent>> {
        let driver = Arc::clone(&self.driver);
        let mut sequence = 0u64;

        let events = input.flat_map(move |frame| {
            let items: Vec<PipeResult<StreamingEvent>> = match frame {
                Ok(frame) => match driver.parse_stream_event(&frame) {
                    Ok(events) => events
                        .into_iter()
                        .map(|event| match event {
                            StreamingEvent::PartialContentDelta { content, .. } => {
                                sequence += 1;
                                trace!(sequence, bytes = content.len(), "content delta");
                                Ok(StreamingEvent::PartialContentDelta {
                                    content,
                                    sequence_id: Some(sequence),
                                })
                            }
                            other => Ok(other),
                        })
                        .collect(),
                    Err(e) => vec![Err(e)],
                },
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        });

        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::GeminiDriver;
    use serde_json::json;

    #[tokio::test]
    async fn test_deltas_are_sequenced() {
        let mapper = DriverEventMapper::new(Arc::new(GeminiDriver::new("gemini-1.5-flash")));
        let frames = vec![
            json!({"candidates": [{"content": {"parts": [{"text": "a"}]}}]}),
            json!({"candidates": [{"content": {"parts": [{"text": "b"}]}}]}),
        ];
        let input = futures::stream::iter(frames).map(Ok);
        let events: Vec<_> = mapper
            .map(Box::pin(input))
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                StreamingEvent::PartialContentDelta {
                    content: "a".into(),
                    sequence_id: Some(1)
                },
                StreamingEvent::PartialContentDelta {
                    content: "b".into(),
                    sequence_id: Some(2)
                },
            ]
        );
    }
}
