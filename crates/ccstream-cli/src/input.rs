//! Byte input for the replay driver.
//!
//! Reads fixed-size chunks and decodes them as UTF-8 before they reach the
//! parser. A multi-byte character split between two reads is held back and
//! completed by the next read.

use ccstream_core::StreamParser;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

/// Incremental UTF-8 decoder.
///
/// Invalid sequences become U+FFFD; an incomplete sequence at the end of a
/// chunk is carried over.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `carry + bytes` as is complete.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(bytes);

        let mut out = String::with_capacity(buf.len());
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            rest = tail;
                            break;
                        }
                    }
                }
            }
        }
        self.carry = rest.to_vec();
        out
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending_bytes(&self) -> usize {
        self.carry.len()
    }

    /// Decode whatever is left at end of input, lossily.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.carry);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

/// Read `reader` to the end in chunks of `chunk_size` bytes, feeding each
/// decoded chunk to `parser`, then flush it.
///
/// Returns the number of bytes read.
pub async fn feed_reader<R>(
    mut reader: R,
    chunk_size: usize,
    parser: &mut StreamParser<'_>,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut decoder = Utf8Decoder::new();
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;
        let text = decoder.decode(&buf[..n]);
        trace!(bytes = n, held = decoder.pending_bytes(), "Read chunk");
        if !text.is_empty() {
            parser.feed(&text);
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        parser.feed(&tail);
    }
    parser.flush();
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"hello"), "hello");
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn split_multibyte_char_is_carried() {
        let bytes = "a✓b".as_bytes();
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&bytes[..2]), "a");
        assert_eq!(decoder.pending_bytes(), 1);
        assert_eq!(decoder.decode(&bytes[2..3]), "");
        assert_eq!(decoder.decode(&bytes[3..]), "✓b");
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn truncated_tail_is_replaced_on_finish() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }

    #[tokio::test]
    async fn feed_reader_matches_whole_input() {
        let stream = concat!(
            r#"{"type":"system","session_id":"sess-1"}"#,
            "\n",
            r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"über ✓"}}"#,
            "\n",
            r#"{"type":"result","result":"über ✓","usage":{"output_tokens":4}}"#,
        );

        let mut whole = StreamParser::new();
        whole.feed(stream);
        whole.flush();

        for chunk_size in [1, 2, 3, 7, 64, 4096] {
            let mut parser = StreamParser::new();
            let read = feed_reader(stream.as_bytes(), chunk_size, &mut parser)
                .await
                .unwrap();
            assert_eq!(read, stream.len() as u64);
            assert_eq!(parser.summary(), whole.summary(), "chunk size {chunk_size}");
        }
        assert_eq!(whole.text(), "über ✓");
    }

    #[tokio::test]
    async fn zero_chunk_size_still_reads() {
        let mut parser = StreamParser::new();
        feed_reader(&b"{\"type\":\"system\",\"session_id\":\"z\"}"[..], 0, &mut parser)
            .await
            .unwrap();
        assert_eq!(parser.session_id(), Some("z"));
    }
}
