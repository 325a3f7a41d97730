use cntblank_common::Encoding;
use encoding_rs::{CoderResult, Decoder};
use std::borrow::Cow;
use std::io::{self, Read};

const BUF_SIZE: usize = 8 * 1024;

/// Streams bytes in a legacy encoding out as UTF-8.
pub struct TranscodingReader<R> {
    inner: R,
    decoder: Decoder,
    in_buf: Box<[u8]>,
    in_pos: usize,
    in_len: usize,
    out_buf: Box<[u8]>,
    out_pos: usize,
    out_len: usize,
    eof: bool,
    finished: bool,
}

impl<R: Read> TranscodingReader<R> {
    pub fn new(inner: R, codec: &'static encoding_rs::Encoding) -> Self {
        Self {
            inner,
            decoder: codec.new_decoder_without_bom_handling(),
            in_buf: vec![0u8; BUF_SIZE].into_boxed_slice(),
            in_pos: 0,
            in_len: 0,
            out_buf: vec![0u8; BUF_SIZE].into_boxed_slice(),
            out_pos: 0,
            out_len: 0,
            eof: false,
            finished: false,
        }
    }
}

impl<R: Read> Read for TranscodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.out_pos < self.out_len {
                let n = (self.out_len - self.out_pos).min(buf.len());
                buf[..n].copy_from_slice(&self.out_buf[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            if self.in_pos == self.in_len && !self.eof {
                let n = self.inner.read(&mut self.in_buf)?;
                self.in_pos = 0;
                self.in_len = n;
                self.eof = n == 0;
            }
            let (result, read, written, _) = self.decoder.decode_to_utf8(
                &self.in_buf[self.in_pos..self.in_len],
                &mut self.out_buf,
                self.eof,
            );
            self.in_pos += read;
            self.out_pos = 0;
            self.out_len = written;
            if self.eof && matches!(result, CoderResult::InputEmpty) {
                self.finished = true;
            }
        }
    }
}

/// Wrap `reader` so it yields UTF-8. Resolved once per source, not per row.
pub fn decoding_reader<R: Read + 'static>(reader: R, encoding: Encoding) -> Box<dyn Read> {
    match encoding.codec() {
        Some(codec) => {
            tracing::info!(encoding = encoding.label(), "decoding input");
            Box::new(TranscodingReader::new(reader, codec))
        }
        None => Box::new(reader),
    }
}

/// Encode rendered UTF-8 output for the requested encoding.
pub fn encode_output(text: &str, encoding: Encoding) -> Cow<'_, [u8]> {
    match encoding.codec() {
        Some(codec) => {
            let (bytes, _, had_unmappable) = codec.encode(text);
            if had_unmappable {
                tracing::warn!(
                    encoding = encoding.label(),
                    "output has characters the encoding cannot represent"
                );
            }
            bytes
        }
        None => Cow::Borrowed(text.as_bytes()),
    }
}
