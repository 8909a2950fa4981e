// THEORY:
// A `DetectionSession` is the one-user view of the detector: it holds the most
// recent result and decides what happens when a new image arrives while an
// earlier one is still being analysed. Two policies exist:
//
// - RejectWhileBusy: the second submission fails fast with `Busy`; the first
//   runs to completion and becomes the latest result.
// - LastSubmittedWins: every submission runs to completion (there is no
//   cancellation), but only the most recently submitted one may replace the
//   latest result. Older submissions resolve to `Superseded`.
//
// Submission order is a monotonically increasing ticket, so "most recent" means
// "submitted last", not "finished last".

use crate::core_modules::detection_decider::DetectionResult;
use crate::error::{DetectionError, Result};
use crate::pipeline::FireDetector;
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    #[default]
    RejectWhileBusy,
    LastSubmittedWins,
}

pub struct DetectionSession {
    detector: Arc<FireDetector>,
    policy: SessionPolicy,
    busy: AtomicBool,
    in_flight: AtomicUsize,
    last_ticket: AtomicU64,
    latest: RwLock<Option<DetectionResult>>,
}

/// Clears the busy flag and the in-flight count however the submission ends.
struct InFlight<'a> {
    session: &'a DetectionSession,
    owns_busy_flag: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.in_flight.fetch_sub(1, Ordering::AcqRel);
        if self.owns_busy_flag {
            self.session.busy.store(false, Ordering::Release);
        }
    }
}

impl DetectionSession {
    pub fn new(detector: Arc<FireDetector>, policy: SessionPolicy) -> Self {
        Self {
            detector,
            policy,
            busy: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            last_ticket: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub async fn latest(&self) -> Option<DetectionResult> {
        self.latest.read().await.clone()
    }

    /// Clears the latest result, e.g. when the user dismisses it.
    pub async fn clear(&self) {
        *self.latest.write().await = None;
    }

    /// Runs a detection according to the session policy.
    pub async fn submit(&self, bytes: Vec<u8>) -> Result<DetectionResult> {
        let _guard = self.enter()?;
        let ticket = self.last_ticket.fetch_add(1, Ordering::AcqRel) + 1;

        let result = self.detector.detect(bytes).await?;

        let mut latest = self.latest.write().await;
        if self.last_ticket.load(Ordering::Acquire) != ticket {
            debug!("Discarding result of submission {ticket}; a newer one exists");
            return Err(DetectionError::Superseded);
        }
        *latest = Some(result.clone());
        Ok(result)
    }

    fn enter(&self) -> Result<InFlight<'_>> {
        let owns_busy_flag = match self.policy {
            SessionPolicy::RejectWhileBusy => {
                if self
                    .busy
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    return Err(DetectionError::Busy);
                }
                true
            }
            SessionPolicy::LastSubmittedWins => false,
        };
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        Ok(InFlight {
            session: self,
            owns_busy_flag,
        })
    }
}
