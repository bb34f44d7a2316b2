use crate::billing::{AsaasClient, CustomerProfile, CustomerRecord};
use crate::enrollment::StudentRecord;
use crate::errors::AppError;

/// Maps an enrollment-platform student to a billing-platform customer,
/// creating one lazily on first billing interaction.
///
/// The normalized email is the sole matching key. Idempotency of repeated or
/// concurrent resolution for the same email rests entirely on the billing
/// platform's uniqueness constraint; this resolver holds no lock and no state.
pub struct CustomerResolver<'a> {
    billing: &'a AsaasClient,
}

impl<'a> CustomerResolver<'a> {
    pub fn new(billing: &'a AsaasClient) -> Self {
        Self { billing }
    }

    pub async fn resolve(&self, student: &StudentRecord) -> Result<CustomerRecord, AppError> {
        let email = normalize_email(&student.email);

        if let Some(customer) = self.billing.find_customer_by_email(&email).await? {
            tracing::debug!("Customer already exists for {}: {}", email, customer.id);
            return Ok(customer);
        }

        let profile = CustomerProfile {
            name: student.name.trim().to_string(),
            email,
            mobile_phone: digits_tail(student.phone.as_deref(), 11),
            cpf_cnpj: digits_tail(student.cpf.as_deref(), 14),
        };
        self.billing.create_customer(&profile).await
    }

    /// Degraded resolution for flows that only have an email in hand: the
    /// placeholder profile carries the email as its name. This only ever reads
    /// billing data afterwards; no fabricated student reaches the enrollment
    /// platform.
    pub async fn resolve_email(&self, email: &str) -> Result<CustomerRecord, AppError> {
        let email = normalize_email(email);

        if let Some(customer) = self.billing.find_customer_by_email(&email).await? {
            return Ok(customer);
        }

        let profile = CustomerProfile {
            name: email.clone(),
            email,
            mobile_phone: None,
            cpf_cnpj: None,
        };
        self.billing.create_customer(&profile).await
    }
}

/// Trim + lowercase: the cross-system matching key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strips a raw phone/tax-id down to its digits and keeps at most the last
/// `keep` of them. Malformed or empty input yields `None` rather than an
/// error; the profile field is simply omitted.
pub fn digits_tail(raw: Option<&str>, keep: usize) -> Option<String> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let start = digits.len().saturating_sub(keep);
    Some(digits[start..].to_string())
}
