use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// Reader that yields a buffered head and then the rest of its source.
///
/// The head is read once up front so it can be inspected; reading from the
/// `ReplayReader` afterwards produces the original byte sequence in order.
#[derive(Debug)]
pub struct ReplayReader<R> {
    head: Vec<u8>,
    pos: usize,
    inner: R,
}

impl<R: AsyncRead + Unpin> ReplayReader<R> {
    /// Read up to `limit` bytes from `inner` into the head buffer.
    pub async fn fill(mut inner: R, limit: usize) -> io::Result<Self> {
        let mut head = Vec::with_capacity(limit);
        (&mut inner).take(limit as u64).read_to_end(&mut head).await?;
        Ok(Self { head, pos: 0, inner })
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ReplayReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        if this.pos < this.head.len() {
            let n = buf.remaining().min(this.head.len() - this.pos);
            buf.put_slice(&this.head[this.pos..this.pos + n]);
            this.pos += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

/// Marks an I/O error that came from reading the client's request body
/// rather than from local storage.
#[derive(Debug)]
pub struct BodyReadError(pub String);

impl fmt::Display for BodyReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request body read failed: {}", self.0)
    }
}

impl std::error::Error for BodyReadError {}

impl BodyReadError {
    pub fn into_io<E: fmt::Display>(err: E) -> io::Error {
        io::Error::other(BodyReadError(err.to_string()))
    }

    /// True if any error in the chain wraps a `BodyReadError`.
    pub fn is_cause_of(err: &anyhow::Error) -> bool {
        err.chain().any(|cause| {
            cause.is::<BodyReadError>()
                || cause
                    .downcast_ref::<io::Error>()
                    .and_then(|io_err| io_err.get_ref())
                    .map_or(false, |inner| inner.is::<BodyReadError>())
        })
    }
}
