//! Lazy line decoding for chunked byte streams.

use bytes::Bytes;
use futures_util::Stream;

/// Converts a stream of byte chunks into a stream of UTF-8 lines.
///
/// Lines are split on `\n` (the separator is not included) and are not
/// otherwise trimmed. Bytes are buffered until a full line is available, so a
/// multi-byte character split across chunks decodes correctly. A trailing
/// partial line is yielded when the input ends. The first chunk error is
/// forwarded and ends the stream.
pub fn lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    async_stream::stream! {
        use futures_util::StreamExt;

        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            buffer.extend_from_slice(&chunk);

            while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=line_end).collect();
                yield Ok(String::from_utf8_lossy(&line[..line_end]).into_owned());
            }
        }

        if !buffer.is_empty() {
            yield Ok(String::from_utf8_lossy(&buffer).into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, stream};
    use std::io;

    async fn collect(chunks: Vec<&'static [u8]>) -> Vec<String> {
        let input = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, io::Error>(Bytes::from_static(c))),
        );
        lines(input)
            .map(|r| r.unwrap_or_else(|e| panic!("unexpected error: {e}")))
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_lines_across_chunks() {
        let out = collect(vec![b"data: a", b"bc\ndata", b": d\n\n"]).await;
        assert_eq!(out, vec!["data: abc", "data: d", ""]);
    }

    #[tokio::test]
    async fn test_flushes_partial_tail() {
        let out = collect(vec![b"one\ntw", b"o"]).await;
        assert_eq!(out, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_no_trimming() {
        let out = collect(vec![b"  padded \r\n"]).await;
        assert_eq!(out, vec!["  padded \r"]);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_between_chunks() {
        let text = "こんにちは\n".as_bytes();
        let (a, b) = text.split_at(4);
        let a: &'static [u8] = Box::leak(a.to_vec().into_boxed_slice());
        let b: &'static [u8] = Box::leak(b.to_vec().into_boxed_slice());
        assert_eq!(collect(vec![a, b]).await, vec!["こんにちは"]);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        assert!(collect(vec![]).await.is_empty());
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let input = stream::iter(vec![
            Ok(Bytes::from_static(b"first\nsecond")),
            Err(io::Error::other("reset")),
            Ok(Bytes::from_static(b"never\n")),
        ]);
        let out: Vec<Result<String, io::Error>> = lines(input).collect().await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().ok().map(String::as_str), Some("first"));
        assert!(out[1].is_err());
    }
}
