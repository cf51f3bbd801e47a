//! Fire-and-forget follow-up work.
//!
//! A side effect runs on its own task after the primary operation has
//! already answered. It never fails that operation. Its failures go to a
//! channel drained by [`spawn_reporter`], which logs each one.

use std::fmt::Display;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// One side effect that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    pub effect: &'static str,
    pub target: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct SideEffects {
    failures: mpsc::UnboundedSender<SideEffectFailure>,
}

impl SideEffects {
    /// Creates a handle and the receiving end of its failure channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SideEffectFailure>) {
        let (failures, rx) = mpsc::unbounded_channel();
        (Self { failures }, rx)
    }

    /// Runs `work` in the background.
    ///
    /// The returned handle may be dropped; the task keeps running.
    pub fn spawn<F, E>(&self, effect: &'static str, target: String, work: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send,
    {
        let failures = self.failures.clone();
        tokio::spawn(async move {
            if let Err(e) = work.await {
                let failure = SideEffectFailure {
                    effect,
                    target,
                    error: e.to_string(),
                };
                if let Err(unreported) = failures.send(failure) {
                    // Reporter is gone; log here instead.
                    let failure = unreported.0;
                    warn!(
                        effect = failure.effect,
                        target = %failure.target,
                        error = %failure.error,
                        "Side effect failed"
                    );
                }
            }
        })
    }
}

/// Logs every failure until all [`SideEffects`] handles are dropped.
pub fn spawn_reporter(mut rx: mpsc::UnboundedReceiver<SideEffectFailure>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(failure) = rx.recv().await {
            warn!(
                effect = failure.effect,
                target = %failure.target,
                error = %failure.error,
                "Side effect failed"
            );
        }
    })
}
