//! Line-splitting transform over an async byte source.

use async_stream::try_stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::effect::LineStream;

/// Split `reader` into lines as bytes arrive.
///
/// Every `\n` ends one item (a `\r` right before it is stripped, empty lines
/// are kept). Bytes after the last `\n` are discarded when the source closes:
/// a trailing fragment without a terminator is never yielded. Invalid UTF-8
/// is replaced rather than rejected.
pub fn split_lines<R>(reader: R) -> LineStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    LineStream::new(try_stream! {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf).await?;
            if n == 0 || buf.last() != Some(&b'\n') {
                break;
            }
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            yield String::from_utf8_lossy(&buf).into_owned();
        }
    })
}
