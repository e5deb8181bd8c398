//! Diagnostic output emitted by the module system while it works.
//!
//! Unreadable files, unindexed archives and shadowed names are reported on a
//! shared [`NoiseChannel`]. Callers that produce their own report (such as
//! verification) mute the channel for the duration of their work with a
//! [`NoiseSuppression`] guard, which restores the previous state when dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const NOISE_TARGET: &str = "ronin_modules::noise";

/// Cloneable handle to the module system's diagnostic channel.
#[derive(Debug, Clone, Default)]
pub struct NoiseChannel {
    muted: Arc<AtomicUsize>,
}

impl NoiseChannel {
    /// Creates an unmuted channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while at least one suppression guard is alive.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire) > 0
    }

    /// Emits a warning unless the channel is muted.
    ///
    /// Returns `true` when the message was emitted.
    pub fn emit(&self, message: &str) -> bool {
        if self.is_muted() {
            return false;
        }
        tracing::warn!(target: NOISE_TARGET, event = "module_system_noise", "{message}");
        true
    }

    /// Mutes the channel until the returned guard is dropped.
    #[must_use = "the channel is unmuted as soon as the guard is dropped"]
    pub fn suppress(&self) -> NoiseSuppression {
        self.muted.fetch_add(1, Ordering::AcqRel);
        NoiseSuppression {
            muted: Arc::clone(&self.muted),
        }
    }
}

/// Guard that keeps a [`NoiseChannel`] muted while alive.
#[derive(Debug)]
pub struct NoiseSuppression {
    muted: Arc<AtomicUsize>,
}

impl Drop for NoiseSuppression {
    fn drop(&mut self) {
        self.muted.fetch_sub(1, Ordering::AcqRel);
    }
}
