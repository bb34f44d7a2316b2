use crate::enrollment::{AccessAction, FlexgeClient};
use crate::errors::AppError;
use crate::notify::{first_name, NotificationJob, NotifierHandle};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Inactivity thresholds in days. Invariant `warn_after_days <
/// disable_after_days` is checked at config load.
#[derive(Debug, Clone, Copy)]
pub struct InactivityThresholds {
    pub warn_after_days: i64,
    pub disable_after_days: i64,
}

/// Derived access state of a student relative to `now`. Never stored;
/// recomputed on every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Active,
    Warned,
    Disabled,
}

/// The threshold state machine, as a pure function over the two timestamps.
pub fn classify(
    thresholds: InactivityThresholds,
    now: DateTime<Utc>,
    last_access: DateTime<Utc>,
) -> ActivityState {
    let days = (now - last_access).num_days();
    if days >= thresholds.disable_after_days {
        ActivityState::Disabled
    } else if days >= thresholds.warn_after_days {
        ActivityState::Warned
    } else {
        ActivityState::Active
    }
}

/// Aggregate counts of actions taken by one scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub disabled: u32,
    pub warned: u32,
}

/// Walks the full student list and applies the threshold state machine:
/// warn-band students get a warning notification, disable-band students are
/// disabled on the enrollment platform.
pub struct InactivityEnforcer<'a> {
    enrollment: &'a FlexgeClient,
    notifier: &'a NotifierHandle,
    thresholds: InactivityThresholds,
}

impl<'a> InactivityEnforcer<'a> {
    pub fn new(
        enrollment: &'a FlexgeClient,
        notifier: &'a NotifierHandle,
        thresholds: InactivityThresholds,
    ) -> Self {
        Self {
            enrollment,
            notifier,
            thresholds,
        }
    }

    /// Runs one scan to list exhaustion.
    ///
    /// Students with no recorded last access are skipped. Warning
    /// notifications are handed to the dispatcher channel and never awaited,
    /// so the walk does not stall on delivery; a student still in the warn
    /// band on the next run will be warned again, since no warned-state is
    /// recorded anywhere.
    ///
    /// The first remote failure (page fetch or disable action) aborts the
    /// remaining walk and propagates; the counts accumulated so far are
    /// logged before returning.
    pub async fn run_scan(&self, now: DateTime<Utc>) -> Result<ScanOutcome, AppError> {
        let mut outcome = ScanOutcome::default();
        let mut page = 1;

        loop {
            let students = match self.enrollment.list_students(page).await {
                Ok(Some(students)) => students,
                Ok(None) => break,
                Err(err) => {
                    self.log_aborted(page, outcome);
                    return Err(err);
                }
            };

            for student in students {
                let Some(last_access) = student.last_access else {
                    continue;
                };

                match classify(self.thresholds, now, last_access) {
                    ActivityState::Active => {}
                    ActivityState::Warned => {
                        self.notifier.dispatch(NotificationJob::InactivityWarning {
                            email: student.email.clone(),
                            first_name: first_name(&student.name).to_string(),
                        });
                        outcome.warned += 1;
                    }
                    ActivityState::Disabled => {
                        if let Err(err) = self
                            .enrollment
                            .set_student_access(&student.id, AccessAction::Disable)
                            .await
                        {
                            self.log_aborted(page, outcome);
                            return Err(err);
                        }
                        outcome.disabled += 1;
                    }
                }
            }

            page += 1;
        }

        tracing::info!(
            "Inactivity scan finished: {} disabled, {} warned",
            outcome.disabled,
            outcome.warned
        );
        Ok(outcome)
    }

    fn log_aborted(&self, page: u32, outcome: ScanOutcome) {
        tracing::warn!(
            "Inactivity scan aborted at page {}: {} disabled, {} warned before failure",
            page,
            outcome.disabled,
            outcome.warned
        );
    }
}
