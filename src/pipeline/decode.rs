//! Streaming decoders (Bytes -> JSON Value)

use crate::pipeline::{Decoder, PipelineError};
use crate::{BoxStream, PipeResult};
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;

/// Server-sent events decoder:
/// - splits frames on a blank line (`\n\n`; carriage returns are dropped)
/// - joins the frame's `data:` lines into one payload
/// - ignores comments (`:`) and other SSE fields (`event:`, `id:`, `retry:`)
///
/// A payload that is not valid JSON yields an error item; the stream owner decides
/// whether to stop.
#[derive(Debug, Clone)]
pub struct SseDecoder {
    prefix: String,
}

impl SseDecoder {
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.unwrap_or_else(|| "data:".to_string()),
        }
    }

    /// Extract the payload of one frame, `None` when the frame carries no data.
    fn frame_payload(prefix: &str, frame: &str) -> Option<String> {
        let mut data_lines: Vec<&str> = Vec::new();
        for line in frame.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(rest) = line.strip_prefix(prefix) {
                data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
            } else if line.starts_with('{') || line.starts_with('[') {
                // Bare JSON without a field name.
                data_lines.push(line);
            }
        }
        if data_lines.is_empty() {
            None
        } else {
            Some(data_lines.join("\n"))
        }
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new(None)
    }
}

fn parse_frame(prefix: &str, frame: &[u8]) -> Option<PipeResult<Value>> {
    let text = String::from_utf8_lossy(frame);
    let payload = SseDecoder::frame_payload(prefix, &text)?;
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed).map_err(|e| {
        crate::Error::Pipeline(PipelineError::Decoder(format!(
            "invalid SSE payload: {}",
            e
        )))
    }))
}

fn find_frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

#[async_trait::async_trait]
impl Decoder for SseDecoder {
    async fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
    ) -> PipeResult<BoxStream<'static, Value>> {
        let prefix = self.prefix.clone();

        // Buffer raw bytes so multi-byte characters split across reads stay intact.
        let stream = stream::unfold(
            (input, Vec::<u8>::new(), false),
            move |(mut input, mut buf, finished)| {
                let prefix = prefix.clone();
                async move {
                    if finished {
                        return None;
                    }
                    loop {
                        if let Some(idx) = find_frame_end(&buf) {
                            let frame: Vec<u8> = buf.drain(..idx + 2).collect();
                            match parse_frame(&prefix, &frame[..idx]) {
                                Some(item) => return Some((item, (input, buf, false))),
                                None => continue,
                            }
                        }

                        match input.next().await {
                            Some(Ok(bytes)) => {
                                buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                                continue;
                            }
                            Some(Err(e)) => {
                                return Some((Err(e), (input, buf, true)));
                            }
                            None => {
                                // EOF: parse the trailing frame once
                                let rest = std::mem::take(&mut buf);
                                return parse_frame(&prefix, &rest)
                                    .map(|item| (item, (input, buf, true)));
                            }
                        }
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decode(chunks: &[&'static [u8]]) -> Vec<PipeResult<Value>> {
        let input = futures::stream::iter(chunks.to_vec())
            .map(|c| Ok::<Bytes, crate::Error>(Bytes::from_static(c)));
        SseDecoder::default()
            .decode_stream(Box::pin(input))
            .await
            .unwrap()
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_frames_split_across_reads() {
        let out = decode(&[b"data: {\"a\":", b"1}\n", b"\ndata: {\"a\":2}\n\n"]).await;
        let values: Vec<Value> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![serde_json::json!({"a": 1}), serde_json::json!({"a": 2})]);
    }

    #[tokio::test]
    async fn test_crlf_delimiters_and_comments() {
        let out = decode(&[b": keep-alive\r\n\r\nevent: message\r\ndata: {\"a\":1}\r\n\r\n"]).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), &serde_json::json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_trailing_frame_without_delimiter() {
        let out = decode(&[b"data: {\"a\":1}\n\ndata: {\"b\":2}"]).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].as_ref().unwrap(), &serde_json::json!({"b": 2}));
    }

    #[tokio::test]
    async fn test_utf8_split_across_reads() {
        // "é" is 0xC3 0xA9
        let out = decode(&[b"data: {\"t\":\"caf\xC3", b"\xA9\"}\n\n"]).await;
        assert_eq!(out[0].as_ref().unwrap()["t"], "café");
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error_item() {
        let out = decode(&[b"data: {not json}\n\n"]).await;
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Err(crate::Error::Pipeline(PipelineError::Decoder(_)))
        ));
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let input = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"a\":1}\n\n")),
            Err(crate::Error::Cancelled),
            Ok(Bytes::from_static(b"data: {\"a\":2}\n\n")),
        ]);
        let out: Vec<_> = SseDecoder::default()
            .decode_stream(Box::pin(input))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(crate::Error::Cancelled)));
    }
}
