//! Ordered best-effort payload decoding
//!
//! A decoder is a list of `fn(&[u8]) -> Option<E>` tried in order. The first
//! one that returns `Some` wins. A payload no decoder accepts yields `None`,
//! which callers treat as "skip", never as an error.

use std::fmt;

/// Attempts to decode one event shape.
pub type DecodeFn<E> = fn(&[u8]) -> Option<E>;

/// Ordered chain of shape decoders.
pub struct EventDecoder<E> {
    shapes: Vec<(&'static str, DecodeFn<E>)>,
}

impl<E> EventDecoder<E> {
    /// Creates a decoder that accepts nothing.
    pub fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Appends a shape, tried after every shape added before it.
    pub fn with(mut self, shape: &'static str, decode: DecodeFn<E>) -> Self {
        self.shapes.push((shape, decode));
        self
    }

    /// Decodes `payload` with the first shape that accepts it.
    pub fn decode(&self, payload: &[u8]) -> Option<E> {
        self.shapes.iter().find_map(|(_, decode)| decode(payload))
    }

    /// Names of the shapes, in priority order.
    pub fn shapes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.shapes.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl<E> Default for EventDecoder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventDecoder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.shapes()).finish()
    }
}
