//! Registered patterns and the registration outcome type.

use std::fmt;
use std::sync::Arc;

/// A registered literal pattern: its byte sequence plus the opaque
/// representation value handed back to the caller on every match.
///
/// The byte sequence is shared (`Arc`) between the terminal node that owns
/// the pattern and every merged match list it appears in after finalize, so
/// cloning is cheap.
#[derive(Clone)]
pub struct Pattern<R> {
    bytes: Arc<[u8]>,
    rep: R,
}

impl<R> Pattern<R> {
    pub(crate) fn new(bytes: &[u8], rep: R) -> Self {
        Self {
            bytes: bytes.into(),
            rep,
        }
    }

    /// The literal byte sequence.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The caller-supplied representation value (e.g. a protocol id).
    pub fn rep(&self) -> &R {
        &self.rep
    }

    /// Pattern length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_rep(self) -> R {
        self.rep
    }
}

impl<R: fmt::Debug> fmt::Debug for Pattern<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pattern({:?} => {:?})",
            String::from_utf8_lossy(&self.bytes),
            self.rep
        )
    }
}

/// Outcome of a successful [`Scanner::add_pattern`](crate::Scanner::add_pattern).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Added<R> {
    /// The pattern was not previously registered.
    New,
    /// An identical byte sequence was already registered. Nothing was
    /// mutated; the value is the representation from the first registration.
    Duplicate(R),
}

impl<R> Added<R> {
    /// True if the call registered a new pattern.
    pub fn is_new(&self) -> bool {
        matches!(self, Added::New)
    }
}
