use crate::config::Config;
use crate::errors::AppError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc::{channel, Sender};

/// A notification waiting to be delivered. Jobs are best-effort: pushed by the
/// workflows, consumed by the worker, never retried.
#[derive(Debug)]
pub enum NotificationJob {
    /// Warning email for a student in the warn band of the inactivity scan.
    InactivityWarning { email: String, first_name: String },
    /// WhatsApp message carrying a freshly issued charge link.
    ChargeLink {
        phone: String,
        first_name: String,
        link: String,
    },
}

/// Enqueue side of the notification channel. Dispatch never blocks and never
/// fails the calling workflow: a full queue drops the job with an error log.
#[derive(Clone)]
pub struct NotifierHandle {
    sender: Sender<NotificationJob>,
}

impl NotifierHandle {
    pub fn new(sender: Sender<NotificationJob>) -> Self {
        Self { sender }
    }

    pub fn dispatch(&self, job: NotificationJob) {
        if let Err(err) = self.sender.try_send(job) {
            tracing::error!("Dropping notification job, queue unavailable: {}", err);
        }
    }
}

/// Spawns the worker that drains notification jobs. Delivery failures are
/// logged and absorbed here; nothing propagates back to the workflows.
pub fn start_notification_worker(mailer: Mailer, chat: ZaiaClient) -> NotifierHandle {
    let (tx, mut rx) = channel(64);
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match job {
                NotificationJob::InactivityWarning { email, first_name } => {
                    if let Err(err) = mailer.send_inactivity_warning(&email, &first_name).await {
                        tracing::error!(
                            "Failed to deliver inactivity warning to {}: {}",
                            email,
                            err
                        );
                    } else {
                        tracing::info!("Inactivity warning sent to {}", email);
                    }
                }
                NotificationJob::ChargeLink {
                    phone,
                    first_name,
                    link,
                } => {
                    let Some(e164) = normalize_br_phone(&phone) else {
                        tracing::warn!("Skipping charge notification, invalid phone: {}", phone);
                        continue;
                    };
                    let text = format!(
                        "Olá {}! 👋\n\nAqui está o seu boleto: {}\n\nQualquer dúvida estou à disposição.",
                        first_name, link
                    );
                    if let Err(err) = chat.send_whatsapp(&e164, &text).await {
                        tracing::error!("Failed to deliver charge link to {}: {}", e164, err);
                    } else {
                        tracing::info!("Charge link sent to {}", e164);
                    }
                }
            }
        }
    });

    NotifierHandle::new(tx)
}

/// First given name, for greeting lines.
pub fn first_name(full_name: &str) -> &str {
    full_name.split_whitespace().next().unwrap_or(full_name)
}

/// Validate and normalize a Brazilian phone number to E.164
/// (+5511987654321). Invalid numbers yield `None`; the caller skips the send.
pub fn normalize_br_phone(raw: &str) -> Option<String> {
    if raw.trim().is_empty() || raw.len() < 8 {
        return None;
    }

    match phonenumber::parse(Some(CountryId::BR), raw) {
        Ok(number) if phonenumber::is_valid(&number) => {
            Some(number.format().mode(Mode::E164).to_string())
        }
        Ok(_) => {
            tracing::warn!("Invalid BR phone number: {}", raw);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to parse BR phone '{}': {:?}", raw, e);
            None
        }
    }
}

/// SMTP mailer for the inactivity warning.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let credentials =
            Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();
        let from: Mailbox = config.smtp_user.parse()?;

        Ok(Self { transport, from })
    }

    pub async fn send_inactivity_warning(
        &self,
        recipient: &str,
        first_name: &str,
    ) -> anyhow::Result<()> {
        let html = format!(
            "<html><body style='font-family:Montserrat;'>\n\
             <h2 style='color:#113842;'>Hello Hello {first_name}!</h2>\n\
             <p>Notamos que você não acessa o Flexge há alguns dias.</p>\n\
             <p>Seu acesso será <strong>bloqueado em dois dias</strong>. Por favor, entre no app e evite isso.</p>\n\
             <p style='margin-top:30px;'>Equipe Karol Elói Language Learning</p>\n\
             </body></html>"
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient.parse()?)
            .subject("Aviso: seu acesso ao Flexge será bloqueado")
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Client for the Zaia messaging API (WhatsApp delivery).
#[derive(Clone)]
pub struct ZaiaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    agent_id: Option<i64>,
}

impl ZaiaClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        agent_id: Option<i64>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create Zaia client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            agent_id,
        })
    }

    /// Sends free text to a WhatsApp number via the agent. A missing agent
    /// configuration turns the send into a logged no-op.
    pub async fn send_whatsapp(&self, phone_e164: &str, text: &str) -> Result<(), AppError> {
        let (Some(api_key), Some(agent_id)) = (self.api_key.as_ref(), self.agent_id) else {
            tracing::debug!("Zaia not configured; skipping WhatsApp send");
            return Ok(());
        };

        let url = format!("{}/external-generative-message/create", self.base_url);
        let payload = json!({
            "agentId": agent_id,
            "prompt": text,
            "streaming": false,
            "asMarkdown": true,
            "custom": { "whatsapp": phone_e164 },
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::remote("zaia", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::RemoteApi {
                service: "zaia",
                status,
                body,
            });
        }

        Ok(())
    }
}
