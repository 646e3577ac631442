use std::sync::Arc;

use crate::{queue::Queue, types::QueueType, Backend};

/// The context is the entry point for pal. It is used to create all other pal
/// objects and hands out [`Queues`](Queue) for command submission.
pub struct Context<B: Backend>(pub(crate) Arc<B>);

impl<B: Backend> Context<B> {
    /// Wraps a backend object in a new context.
    #[inline(always)]
    pub fn new(backend: B) -> Self {
        Self(Arc::new(backend))
    }

    /// Gets a reference to the primary queue. Supports graphics, compute, and
    /// transfer commands.
    #[inline(always)]
    pub fn main(&self) -> Queue<B> {
        Queue::new(self.clone(), QueueType::Main)
    }

    /// Gets a reference to the async compute queue.
    #[inline(always)]
    pub fn compute(&self) -> Queue<B> {
        Queue::new(self.clone(), QueueType::Compute)
    }
}

impl<B: Backend> Clone for Context<B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
