//! Retry protocol state for a single logical request.

/// Lifecycle of one outbound request under the single-retry protocol.
///
/// Transitions only move forward:
///
/// ```text
/// Fresh ──(401)──▶ Retrying ──(refresh ok)──▶ Replayed
///                     │
///                     └──(refresh failed)──▶ Failed
/// ```
///
/// A request that is past `Fresh` and sees another authorization failure
/// propagates it immediately. That bounds the protocol to exactly one
/// refresh and one replay per logical request, and keeps an invalid refresh
/// credential from looping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Not yet retried; an authorization failure may trigger a refresh.
    Fresh,
    /// Refresh in flight.
    Retrying,
    /// Original request reissued with the refreshed credential.
    Replayed,
    /// Refresh or replay failed; the session is torn down.
    Failed,
}

impl RetryState {
    /// Whether an authorization failure in this state may trigger a refresh.
    pub fn can_retry(self) -> bool {
        matches!(self, RetryState::Fresh)
    }
}
