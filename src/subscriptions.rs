use crate::billing::{AsaasClient, BillingType};
use crate::enrollment::FlexgeClient;
use crate::errors::AppError;
use crate::resolver::CustomerResolver;
use chrono::NaiveDate;
use serde::Serialize;

/// Result of a billing-type switch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOutcome {
    pub subscription_id: String,
    pub next_due_date: Option<NaiveDate>,
    pub billing_type: BillingType,
}

/// Switches the payment method of a customer's active subscription,
/// propagating the change to pending charges on the billing platform side.
pub struct SubscriptionSwitcher<'a> {
    enrollment: &'a FlexgeClient,
    billing: &'a AsaasClient,
}

impl<'a> SubscriptionSwitcher<'a> {
    pub fn new(enrollment: &'a FlexgeClient, billing: &'a AsaasClient) -> Self {
        Self {
            enrollment,
            billing,
        }
    }

    /// Student → customer → active subscription → update. Fails with
    /// `NotFound` (and performs zero billing mutations) when the student or an
    /// active subscription is missing.
    pub async fn switch_billing_type(
        &self,
        email: &str,
        target: BillingType,
    ) -> Result<SwitchOutcome, AppError> {
        let student = self
            .enrollment
            .find_student_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student not found: {}", email)))?;

        let customer = CustomerResolver::new(self.billing).resolve(&student).await?;

        let subscription = self
            .billing
            .find_active_subscription(&customer.id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No active subscription for {}", email))
            })?;

        let updated = self
            .billing
            .update_subscription_billing_type(&subscription.id, target, true)
            .await?;

        tracing::info!(
            "Subscription {} switched to {:?}, next due {:?}",
            updated.id,
            updated.billing_type,
            updated.next_due_date
        );

        Ok(SwitchOutcome {
            subscription_id: updated.id,
            next_due_date: updated.next_due_date,
            billing_type: updated.billing_type,
        })
    }
}
