use crate::assistant::OpenAiClient;
use crate::billing::{AsaasClient, BillingType};
use crate::config::{Config, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};
use crate::enrollment::{AccessAction, FlexgeClient};
use crate::errors::AppError;
use crate::inactivity::{InactivityEnforcer, InactivityThresholds, ScanOutcome};
use crate::notify::NotifierHandle;
use crate::payments::{PaymentOrchestrator, ResendOutcome};
use crate::subscriptions::{SubscriptionSwitcher, SwitchOutcome};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Enrollment platform client.
    pub flexge: FlexgeClient,
    /// Billing platform client.
    pub asaas: AsaasClient,
    /// Generative-model collaborator.
    pub assistant: OpenAiClient,
    /// Enqueue side of the notification worker.
    pub notifier: NotifierHandle,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub email: String,
    pub value: f64,
    pub due_date: NaiveDate,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "school-billing-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /analyze-image
///
/// Validates the upload (extension allow-list, 5MB cap) and hands it to the
/// model for categorization. A Flexge screenshot routes the caller onward to
/// the grammar-explanation flow.
pub async fn analyze_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            upload = Some((filename, data));
            break;
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;

    if !has_allowed_extension(&filename) {
        return Err(AppError::BadRequest(format!(
            "Unsupported file type; allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("File exceeds the 5MB limit".to_string()));
    }

    let image_base64 = BASE64.encode(&data);
    let analysis = state.assistant.analyze_image(&image_base64).await?;

    if analysis.is_flexge_screenshot() {
        return Ok(Json(json!({
            "resposta": "📸 Print do Flexge detectado! Analisando desempenho...",
            "proximo_passo": "/grammar-explanation",
            "detalhes": analysis,
        })));
    }

    Ok(Json(json!({
        "resposta": "✅ Imagem processada com sucesso!",
        "detalhes": analysis,
    })))
}

/// POST /grammar-explanation
///
/// Builds the worst-topics grammar report for a student.
pub async fn grammar_explanation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("Grammar explanation requested for {}", request.email);

    let student = state
        .flexge
        .find_student_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student not found: {}", request.email)))?;

    let grammars = state.flexge.list_studied_grammars(&student.id).await?;
    if grammars.is_empty() {
        return Ok(Json(json!({
            "resposta": "🌟 Nenhum erro recente!",
            "status": "sucesso",
        })));
    }

    let report = state.assistant.grammar_report(&grammars).await;
    Ok(Json(json!({ "resposta": report, "status": "sucesso" })))
}

/// POST /enable-student
pub async fn enable_student(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let student = state
        .flexge
        .find_student_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student not found: {}", request.email)))?;

    state
        .flexge
        .set_student_access(&student.id, AccessAction::Enable)
        .await?;

    Ok(Json(json!({ "status": "Aluno habilitado com sucesso" })))
}

/// GET /check-inactivity
///
/// Runs the full inactivity scan. Warning notifications are dispatched to the
/// worker and not awaited; the response carries only the aggregate counts.
pub async fn check_inactivity(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScanOutcome>, AppError> {
    let thresholds = InactivityThresholds {
        warn_after_days: state.config.inactivity_warn_days,
        disable_after_days: state.config.inactivity_disable_days,
    };
    let enforcer = InactivityEnforcer::new(&state.flexge, &state.notifier, thresholds);
    let outcome = enforcer.run_scan(Utc::now()).await?;
    Ok(Json(outcome))
}

/// POST /send-charge
pub async fn send_charge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.value <= 0.0 {
        return Err(AppError::BadRequest("value must be positive".to_string()));
    }

    let orchestrator = PaymentOrchestrator::new(&state.flexge, &state.asaas, &state.notifier);
    let issued = orchestrator
        .issue_payment(&request.email, request.value, request.due_date)
        .await?;

    Ok(Json(json!({ "status": issued.status, "link": issued.link })))
}

/// POST /resend-charge
///
/// Surfaces the pending charge of the caller's active subscription. Having
/// nothing to resend is a normal outcome, not an error.
pub async fn resend_charge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let orchestrator = PaymentOrchestrator::new(&state.flexge, &state.asaas, &state.notifier);
    let outcome = orchestrator.resend_pending_charge(&request.email).await?;

    let body = match outcome {
        ResendOutcome::Charge(charge) => json!({
            "status": "pendente",
            "nome": charge.name,
            "vencimento": charge.due_date,
            "valor": charge.value,
            "boleto_url": charge.link,
        }),
        ResendOutcome::NoActiveSubscription => json!({
            "status": "nada-a-reenviar",
            "detalhe": "Nenhuma assinatura ativa encontrada",
        }),
        ResendOutcome::NoPendingCharge => json!({
            "status": "nada-a-reenviar",
            "detalhe": "Nenhuma cobrança pendente encontrada",
        }),
    };
    Ok(Json(body))
}

/// POST /switch-subscription-card
pub async fn switch_subscription_card(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<SwitchOutcome>, AppError> {
    switch_subscription(&state, &request.email, BillingType::CreditCard).await
}

/// POST /switch-subscription-boleto
pub async fn switch_subscription_boleto(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<SwitchOutcome>, AppError> {
    switch_subscription(&state, &request.email, BillingType::Boleto).await
}

async fn switch_subscription(
    state: &AppState,
    email: &str,
    target: BillingType,
) -> Result<Json<SwitchOutcome>, AppError> {
    let switcher = SubscriptionSwitcher::new(&state.flexge, &state.asaas);
    let outcome = switcher.switch_billing_type(email, target).await?;
    Ok(Json(outcome))
}

fn has_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.iter().any(|allowed| *allowed == ext)
        })
        .unwrap_or(false)
}
