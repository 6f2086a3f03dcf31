/// Errors raised by the transform stack
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    /// `pop` was called with only the base frame left.
    ///
    /// The counters cover the whole lifetime of the stack, which is usually
    /// enough to find the unmatched `pop`.
    #[error("transform stack underflow: pop with only the base frame left ({pushes} pushes, {pops} pops so far)")]
    Underflow { pushes: u64, pops: u64 },
}
