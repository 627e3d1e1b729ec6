//! Restart cooldown policies.
//!
//! A supervisor never gives up on its source; these knobs only decide **how long**
//! it waits before the next attempt after a failure.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the cooldown evolves over consecutive failures (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy so sources sharing a broken dependency do not restart in lockstep
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → fixed 3s cooldown (factor=1.0, max=60s, jitter=None).

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
