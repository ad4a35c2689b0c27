//! Incremental UTF-8 decoding of response chunks.

/// Stateful UTF-8 decoder.
///
/// Trailing bytes of an incomplete multi-byte sequence are held back and
/// prepended to the next buffer. Invalid sequences decode to U+FFFD, so
/// `decode` is total over arbitrary input.
#[derive(Debug, Default)]
pub struct ByteDecoder {
    pending: Vec<u8>,
}

impl ByteDecoder {
    /// Creates a decoder with no buffered bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk` together with any bytes held back by the previous call.
    ///
    /// With `is_final` set, held-back bytes that never completed a sequence
    /// are flushed as replacement characters and the decoder is left empty.
    pub fn decode(&mut self, chunk: &[u8], is_final: bool) -> String {
        self.pending.extend_from_slice(chunk);
        if is_final {
            let text = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            return text;
        }

        let split = incomplete_tail_start(&self.pending);
        let text = String::from_utf8_lossy(&self.pending[..split]).into_owned();
        self.pending.drain(..split);
        text
    }

    /// Number of bytes currently held back waiting for continuation bytes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Returns the index where a trailing, still-completable sequence starts, or
/// `buf.len()` if the buffer ends on a boundary.
fn incomplete_tail_start(buf: &[u8]) -> usize {
    // A sequence is at most 4 bytes, so only the last 3 can be an unfinished lead.
    let floor = buf.len().saturating_sub(3);
    let mut idx = buf.len();
    while idx > floor {
        idx -= 1;
        let byte = buf[idx];
        if is_continuation(byte) {
            continue;
        }
        let Some(width) = sequence_width(byte) else {
            return buf.len();
        };
        let available = buf.len() - idx;
        if available < width && completable(&buf[idx..]) {
            return idx;
        }
        return buf.len();
    }
    buf.len()
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

fn sequence_width(lead: u8) -> Option<usize> {
    match lead {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Whether a truncated sequence could still become valid UTF-8 once more
/// bytes arrive. Overlong and surrogate prefixes never can.
fn completable(partial: &[u8]) -> bool {
    let lead = partial[0];
    let Some(second) = partial.get(1).copied() else {
        return true;
    };
    let second_ok = match lead {
        0xE0 => (0xA0..=0xBF).contains(&second),
        0xED => (0x80..=0x9F).contains(&second),
        0xF0 => (0x90..=0xBF).contains(&second),
        0xF4 => (0x80..=0x8F).contains(&second),
        _ => is_continuation(second),
    };
    second_ok && partial[2..].iter().all(|b| is_continuation(*b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_in_chunks(bytes: &[u8], sizes: &[usize]) -> String {
        let mut decoder = ByteDecoder::new();
        let mut out = String::new();
        let mut rest = bytes;
        for size in sizes {
            let (head, tail) = rest.split_at((*size).min(rest.len()));
            out.push_str(&decoder.decode(head, false));
            rest = tail;
        }
        out.push_str(&decoder.decode(rest, false));
        out.push_str(&decoder.decode(&[], true));
        out
    }

    #[test]
    fn chunking_on_char_boundaries_matches_whole_decode() {
        let text = "hello wörld, ça va? 你好";
        let whole = String::from_utf8_lossy(text.as_bytes()).into_owned();
        let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let mut sizes = Vec::new();
        let mut last = 0;
        for b in boundaries.iter().step_by(3).skip(1) {
            sizes.push(b - last);
            last = *b;
        }
        assert_eq!(decode_in_chunks(text.as_bytes(), &sizes), whole);
    }

    #[test]
    fn split_multibyte_sequences_match_whole_decode() {
        let text = "é€😀 summary ü";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            assert_eq!(decode_in_chunks(bytes, &[split]), text, "split at {split}");
        }
        let singles = vec![1; bytes.len()];
        assert_eq!(decode_in_chunks(bytes, &singles), text);
    }

    #[test]
    fn incomplete_sequence_yields_empty_unit_until_completed() {
        let mut decoder = ByteDecoder::new();
        let euro = "€".as_bytes();
        assert_eq!(decoder.decode(&euro[..1], false), "");
        assert_eq!(decoder.decode(&euro[1..2], false), "");
        assert_eq!(decoder.pending_len(), 2);
        assert_eq!(decoder.decode(&euro[2..], false), "€");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn final_flush_replaces_truncated_tail() {
        let mut decoder = ByteDecoder::new();
        let mut bytes = b"abc".to_vec();
        bytes.extend_from_slice(&"😀".as_bytes()[..2]);
        assert_eq!(decoder.decode(&bytes, false), "abc");
        assert_eq!(decoder.decode(&[], true), "\u{FFFD}");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn invalid_bytes_are_replaced_not_buffered() {
        let mut decoder = ByteDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b'], false), "a\u{FFFD}b");
        // lone continuation byte at the end is not a pending lead
        assert_eq!(decoder.decode(&[b'x', 0x80], false), "x\u{FFFD}");
        // surrogate prefix can never complete
        assert_eq!(decoder.decode(&[0xED, 0xA0], false), "\u{FFFD}\u{FFFD}");
        assert_eq!(decoder.pending_len(), 0);
    }
}
