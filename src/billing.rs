use crate::errors::AppError;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const SERVICE: &str = "asaas";
const USER_AGENT: &str = "school-billing-api";

/// Payment method on the billing platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    /// Bank slip (boleto), the fixed document-style instrument.
    Boleto,
    CreditCard,
    /// Flexible: the payer picks the method at checkout.
    Undefined,
}

/// A billing-platform customer, matched one-to-one with a student email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Profile sent when lazily creating a customer. Phone and tax id are already
/// normalized (digits only, tail-truncated); `None` means the source value was
/// absent or malformed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf_cnpj: Option<String>,
}

/// A charge (payment obligation) on the billing platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentObligation {
    pub id: String,
    pub customer: String,
    pub value: f64,
    pub due_date: NaiveDate,
    pub billing_type: BillingType,
    pub status: String,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub bank_slip_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub billing_type: BillingType,
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
}

/// List envelope used by every Asaas collection endpoint.
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Client for the Asaas API (billing platform).
#[derive(Clone)]
pub struct AsaasClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AsaasClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create Asaas client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn get(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .header("access-token", &self.api_key)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .header("access-token", &self.api_key)
    }

    fn put(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .put(url)
            .header("accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .header("access-token", &self.api_key)
    }

    // Build URL with proper parameter encoding (no hand-rolled query strings)
    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Url, AppError> {
        reqwest::Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .map_err(|e| AppError::Internal(format!("Failed to build URL: {}", e)))
    }

    /// Looks a customer up by email. Absence is a normal outcome.
    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerRecord>, AppError> {
        let url = self.url("/customers", &[("email", email)])?;
        tracing::debug!("Searching Asaas customer by email: {}", email);

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let envelope: ListEnvelope<CustomerRecord> = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        Ok(envelope.data.into_iter().next())
    }

    pub async fn create_customer(
        &self,
        profile: &CustomerProfile,
    ) -> Result<CustomerRecord, AppError> {
        let url = format!("{}/customers", self.base_url);
        tracing::info!("Creating Asaas customer for {}", profile.email);

        let response = self
            .post(&url)
            .json(profile)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let customer: CustomerRecord = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        tracing::info!("Asaas customer created: {}", customer.id);
        Ok(customer)
    }

    /// Creates a bank-slip charge. A non-success status is surfaced with the
    /// remote status and body, never swallowed.
    pub async fn create_payment(
        &self,
        customer_id: &str,
        value: f64,
        due_date: NaiveDate,
        description: &str,
    ) -> Result<PaymentObligation, AppError> {
        let url = format!("{}/payments", self.base_url);
        let payload = json!({
            "customer": customer_id,
            "billingType": BillingType::Boleto,
            "value": value,
            "dueDate": due_date.format("%Y-%m-%d").to_string(),
            "description": description,
        });
        tracing::info!(
            "Creating payment of {} due {} for customer {}",
            value,
            due_date,
            customer_id
        );

        let response = self
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let payment: PaymentObligation = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        Ok(payment)
    }

    /// Earliest-due pending bank-slip charge for a customer, if any.
    pub async fn find_latest_pending_payment(
        &self,
        customer_id: &str,
    ) -> Result<Option<PaymentObligation>, AppError> {
        let url = self.url(
            "/payments",
            &[
                ("customer", customer_id),
                ("status", "PENDING"),
                ("billingType", "BOLETO"),
                ("limit", "1"),
                ("offset", "0"),
                ("sort", "dueDate"),
                ("order", "ASC"),
            ],
        )?;

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let envelope: ListEnvelope<PaymentObligation> = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if envelope.data.is_empty() {
            tracing::debug!("No pending bank slip for customer {}", customer_id);
        }
        Ok(envelope.data.into_iter().next())
    }

    /// The customer's subscription, as far as this system cares: the most
    /// recent one the platform reports with status ACTIVE.
    pub async fn find_active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let url = self.url(
            "/subscriptions",
            &[
                ("customer", customer_id),
                ("status", "ACTIVE"),
                ("limit", "1"),
            ],
        )?;

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let envelope: ListEnvelope<Subscription> = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        Ok(envelope.data.into_iter().next())
    }

    /// Pending charge tied to a subscription, if any.
    pub async fn find_pending_subscription_payment(
        &self,
        subscription_id: &str,
    ) -> Result<Option<PaymentObligation>, AppError> {
        let url = self.url(
            "/payments",
            &[("subscription", subscription_id), ("status", "PENDING")],
        )?;

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let envelope: ListEnvelope<PaymentObligation> = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        Ok(envelope.data.into_iter().next())
    }

    /// Switches a subscription's payment method. With `propagate_to_pending`
    /// the platform rewrites every currently pending charge under the
    /// subscription to the new method atomically; this client never patches
    /// individual charges itself. Next due date is reset to today and the
    /// subscription is kept active.
    pub async fn update_subscription_billing_type(
        &self,
        subscription_id: &str,
        billing_type: BillingType,
        propagate_to_pending: bool,
    ) -> Result<Subscription, AppError> {
        let url = format!("{}/subscriptions/{}", self.base_url, subscription_id);
        let payload = json!({
            "billingType": billing_type,
            "updatePendingPayments": propagate_to_pending,
            "status": "ACTIVE",
            "nextDueDate": Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        });
        tracing::info!(
            "Updating subscription {} to {:?} (propagate_to_pending={})",
            subscription_id,
            billing_type,
            propagate_to_pending
        );

        let response = self
            .put(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let subscription: Subscription = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        Ok(subscription)
    }

    /// Creates a flexible (UNDEFINED billing type) charge due in 3 days and
    /// returns its checkout URL.
    pub async fn create_flexible_payment(
        &self,
        customer_id: &str,
        value: f64,
    ) -> Result<String, AppError> {
        let url = format!("{}/payments", self.base_url);
        let due_date = Utc::now().date_naive() + ChronoDuration::days(3);
        let payload = json!({
            "customer": customer_id,
            "billingType": BillingType::Undefined,
            "value": value,
            "dueDate": due_date.format("%Y-%m-%d").to_string(),
            "description": "Pagamento flexível",
        });

        let response = self
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let payment: PaymentObligation = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        payment.invoice_url.ok_or_else(|| AppError::RemoteApi {
            service: SERVICE,
            status: 200,
            body: "payment response missing invoiceUrl".to_string(),
        })
    }
}

async fn remote_failure(response: reqwest::Response) -> AppError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AppError::RemoteApi {
        service: SERVICE,
        status,
        body,
    }
}
