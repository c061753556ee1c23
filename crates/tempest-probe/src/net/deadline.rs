//! Deadline-bounded reads.
//!
//! A target that neither answers nor closes would otherwise park a probe
//! forever on a blocking receive. Every read in the harness goes through
//! this module, so an unresponsive target becomes a classified
//! "no reply within deadline" outcome instead of a hang.
//!
//! Two layers:
//! 1. `read_with_deadline` - a single read bounded by an overall deadline.
//! 2. `DeadlineReader` - an `AsyncRead` wrapper that re-arms an idle
//!    deadline before each read, for draining replies that may trickle.

use pin_project_lite::pin_project;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio::time::{timeout, Instant, Sleep};

use bytes::Bytes;

pin_project! {
    /// A wrapper around an `AsyncRead` that enforces an idle deadline
    /// between reads.
    ///
    /// A fresh deadline is armed when a read starts and cleared when it
    /// completes; if the inner reader stays pending past the deadline the
    /// read fails with `ErrorKind::TimedOut`.
    pub struct DeadlineReader<R> {
        #[pin]
        inner: R,
        #[pin]
        sleep: Option<Sleep>,
        idle_deadline: Duration,
    }
}

impl<R> DeadlineReader<R> {
    pub fn new(inner: R, idle_deadline: Duration) -> Self {
        Self {
            inner,
            sleep: None,
            idle_deadline,
        }
    }

    /// Consumes the wrapper and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead> AsyncRead for DeadlineReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut this = self.project();

        if this.sleep.is_none() {
            this.sleep
                .set(Some(tokio::time::sleep(*this.idle_deadline)));
        }

        match this.inner.poll_read(cx, buf) {
            Poll::Ready(res) => {
                this.sleep.set(None);
                Poll::Ready(res)
            }
            Poll::Pending => match this.sleep.as_mut().as_pin_mut() {
                Some(sleep) => match sleep.poll(cx) {
                    Poll::Ready(()) => {
                        this.sleep.set(None);
                        Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "idle deadline expired between reads",
                        )))
                    }
                    Poll::Pending => Poll::Pending,
                },
                None => Poll::Pending,
            },
        }
    }
}

/// Performs one read bounded by `deadline`.
///
/// Returns `Err(io::Error)` with kind `TimedOut` if the read does not
/// complete within the given duration.
pub async fn read_with_deadline<R>(
    reader: &mut R,
    buf: &mut [u8],
    deadline: Duration,
) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match timeout(deadline, reader.read(buf)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "read deadline expired",
        )),
    }
}

/// What `drain_with_deadline` observed before stopping.
#[derive(Debug)]
pub struct Drained {
    pub bytes: Bytes,
    /// The peer closed its side of the stream.
    pub eof: bool,
    /// A deadline (idle or total) expired before data or close arrived.
    pub timed_out: bool,
}

/// Reads until end-of-stream, a deadline, or `max_bytes`, whichever
/// comes first.
///
/// `idle_deadline` bounds the silence between fragments; `total_deadline`
/// bounds the whole drain. Bytes received before a deadline expired are
/// preserved in the result.
pub async fn drain_with_deadline<R>(
    reader: R,
    max_bytes: usize,
    idle_deadline: Duration,
    total_deadline: Duration,
) -> io::Result<Drained>
where
    R: AsyncRead + Unpin,
{
    let start = Instant::now();
    let mut reader = Box::pin(DeadlineReader::new(reader, idle_deadline));
    let mut out: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];
    let mut eof = false;
    let mut timed_out = false;

    while out.len() < max_bytes {
        let remaining = total_deadline.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            timed_out = true;
            break;
        }

        match timeout(remaining, reader.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                eof = true;
                break;
            }
            Ok(Ok(n)) => {
                let take = n.min(max_bytes - out.len());
                out.extend_from_slice(&chunk[..take]);
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => {
                timed_out = true;
                break;
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                timed_out = true;
                break;
            }
        }
    }

    Ok(Drained {
        bytes: Bytes::from(out),
        eof,
        timed_out,
    })
}
