//! Streaming chunk contracts and in-memory stream utilities.
//!
//! ```rust
//! use pprovider::{BoxedChunkStream, StreamChunk, VecChunkStream};
//!
//! let stream = VecChunkStream::new(vec![Ok(StreamChunk::text("hello"))]);
//! let _boxed: BoxedChunkStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, StreamChunk};

/// Provider chunk stream contract.
///
/// Invariants for consumers:
/// - Chunks arrive in source order and reflect a single network call.
/// - The stream is finite and cannot be restarted.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait ChunkStream: Stream<Item = Result<StreamChunk, ProviderError>> + Send {}

impl<T> ChunkStream for T where T: Stream<Item = Result<StreamChunk, ProviderError>> + Send {}

pub type BoxedChunkStream<'a> = Pin<Box<dyn ChunkStream + 'a>>;

#[derive(Debug)]
pub struct VecChunkStream {
    chunks: VecDeque<Result<StreamChunk, ProviderError>>,
}

impl VecChunkStream {
    pub fn new(chunks: Vec<Result<StreamChunk, ProviderError>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl Stream for VecChunkStream {
    type Item = Result<StreamChunk, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamChunk, ProviderError>>> {
        Poll::Ready(self.chunks.pop_front())
    }
}
