use crate::billing::{AsaasClient, PaymentObligation};
use crate::enrollment::FlexgeClient;
use crate::errors::AppError;
use crate::notify::{first_name, NotificationJob, NotifierHandle};
use crate::resolver::CustomerResolver;
use chrono::NaiveDate;
use serde::Serialize;

/// Outcome of issuing a new charge.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedPayment {
    pub status: String,
    pub link: String,
}

/// A pending charge surfaced by the resend flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCharge {
    pub name: String,
    pub due_date: NaiveDate,
    pub value: f64,
    pub link: Option<String>,
}

/// Resend flow result. The two absence cases are normal "nothing to resend"
/// outcomes, not errors.
#[derive(Debug, Clone)]
pub enum ResendOutcome {
    Charge(PendingCharge),
    NoActiveSubscription,
    NoPendingCharge,
}

/// Issues charges against the billing platform on behalf of enrollment
/// students, and surfaces pending ones.
pub struct PaymentOrchestrator<'a> {
    enrollment: &'a FlexgeClient,
    billing: &'a AsaasClient,
    notifier: &'a NotifierHandle,
}

impl<'a> PaymentOrchestrator<'a> {
    pub fn new(
        enrollment: &'a FlexgeClient,
        billing: &'a AsaasClient,
        notifier: &'a NotifierHandle,
    ) -> Self {
        Self {
            enrollment,
            billing,
            notifier,
        }
    }

    /// Resolves the student, creates a bank-slip charge and, when a phone is
    /// on record, dispatches the link over WhatsApp. Notification delivery is
    /// fire-and-forget: its failure never rolls back or fails the issuance.
    pub async fn issue_payment(
        &self,
        email: &str,
        value: f64,
        due_date: NaiveDate,
    ) -> Result<IssuedPayment, AppError> {
        let student = self
            .enrollment
            .find_student_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student not found: {}", email)))?;

        let customer = CustomerResolver::new(self.billing).resolve(&student).await?;

        let payment = self
            .billing
            .create_payment(&customer.id, value, due_date, "Mensalidade")
            .await?;

        let link = delivery_link(&payment).ok_or_else(|| AppError::RemoteApi {
            service: "asaas",
            status: 200,
            body: "payment response missing bankSlipUrl/invoiceUrl".to_string(),
        })?;

        if let Some(phone) = student.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            self.notifier.dispatch(NotificationJob::ChargeLink {
                phone: phone.to_string(),
                first_name: first_name(&student.name).to_string(),
                link: link.clone(),
            });
        }

        Ok(IssuedPayment {
            status: "sent".to_string(),
            link,
        })
    }

    /// Surfaces the pending charge of a customer's active subscription.
    ///
    /// When the email is unknown to the enrollment platform the customer is
    /// still derived through the degraded email-only path, so chat-triggered
    /// resends keep working for people the school billed directly.
    pub async fn resend_pending_charge(&self, email: &str) -> Result<ResendOutcome, AppError> {
        let resolver = CustomerResolver::new(self.billing);
        let student = self.enrollment.find_student_by_email(email).await?;
        let customer = match &student {
            Some(student) => resolver.resolve(student).await?,
            None => {
                tracing::debug!("No enrollment record for {}; deriving customer from email", email);
                resolver.resolve_email(email).await?
            }
        };

        let Some(subscription) = self.billing.find_active_subscription(&customer.id).await? else {
            return Ok(ResendOutcome::NoActiveSubscription);
        };

        let Some(payment) = self
            .billing
            .find_pending_subscription_payment(&subscription.id)
            .await?
        else {
            return Ok(ResendOutcome::NoPendingCharge);
        };

        let name = student
            .map(|s| s.name)
            .unwrap_or_else(|| email.trim().to_string());

        Ok(ResendOutcome::Charge(PendingCharge {
            name,
            due_date: payment.due_date,
            value: payment.value,
            link: delivery_link(&payment),
        }))
    }
}

/// Delivery link preference: the fixed-instrument (bank slip) URL when the
/// platform generated one, the generic invoice URL otherwise.
pub fn delivery_link(payment: &PaymentObligation) -> Option<String> {
    payment
        .bank_slip_url
        .clone()
        .or_else(|| payment.invoice_url.clone())
}
