// vim: tw=80
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering}
};

#[derive(Debug)]
pub(crate) struct SeqHandle {
    inner: Arc<SeqInner>,
    seq: usize
}

impl SeqHandle {
    /// Tell the Sequence that this expectation has been fully satisfied.
    /// Returns `false` if it was already satisfied.
    pub fn satisfy(&self) -> bool {
        self.inner.satisfy(self.seq)
    }

    /// Is it this expectation's turn?
    pub fn verify(&self) -> bool {
        self.inner.verify(self.seq)
    }
}

#[derive(Debug, Default)]
struct SeqInner {
    satisfaction_level: AtomicUsize,
}

impl SeqInner {
    /// Record the call identified by `seq` as fully satisfied.
    fn satisfy(&self, seq: usize) -> bool {
        self.satisfaction_level.compare_exchange(seq, seq + 1,
            Ordering::Relaxed, Ordering::Relaxed).is_ok()
    }

    fn verify(&self, seq: usize) -> bool {
        seq == self.satisfaction_level.load(Ordering::Relaxed)
    }
}

/// Used to enforce that mock calls must happen in the sequence specified.
///
/// Each expectation must expect to be called a fixed number of times.  Once
/// satisfied, the next expectation in the sequence will expect to be called.
///
/// # Examples
/// ```
/// # use standin::*;
/// let open = Member::method("File", "open", &[]);
/// let close = Member::method("File", "close", &[]);
/// let mut seq = Sequence::new();
/// let mut mock = Mock::strict("File");
/// mock.expect(open.clone(), vec![]).unwrap()
///     .once()
///     .in_sequence(&mut seq).unwrap();
/// mock.expect(close.clone(), vec![]).unwrap()
///     .once()
///     .in_sequence(&mut seq).unwrap();
///
/// let close_first = Invocation::new(close, args![]).unwrap();
/// assert!(mock.intercept(&close_first).is_err());
/// ```
#[derive(Debug, Default)]
pub struct Sequence {
    inner: Arc<SeqInner>,
    next_seq: usize,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_handle(&mut self) -> SeqHandle {
        let handle = SeqHandle{inner: self.inner.clone(), seq: self.next_seq};
        self.next_seq += 1;
        handle
    }
}
