/// Maximum accepted upload size for image analysis (5MB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// File extensions accepted by the image analysis endpoint.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub flexge_base_url: String,
    pub flexge_api_key: String,
    pub asaas_base_url: String,
    pub asaas_api_key: String,
    pub zaia_base_url: String,
    pub zaia_api_key: Option<String>,
    pub zaia_agent_id: Option<i64>,
    pub openai_api_key: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    /// Days without access before a warning email goes out.
    pub inactivity_warn_days: i64,
    /// Days without access before the student is disabled.
    pub inactivity_disable_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            flexge_base_url: std::env::var("FLEXGE_API_BASE")
                .unwrap_or_else(|_| "https://partner-api.flexge.com/external".to_string()),
            flexge_api_key: std::env::var("FLEXGE_API_KEY")
                .map_err(|_| anyhow::anyhow!("FLEXGE_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("FLEXGE_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            asaas_base_url: std::env::var("ASAAS_BASE")
                .unwrap_or_else(|_| "https://api.asaas.com/v3".to_string()),
            asaas_api_key: std::env::var("ASAAS_API_KEY")
                .map_err(|_| anyhow::anyhow!("ASAAS_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("ASAAS_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            zaia_base_url: std::env::var("ZAIA_BASE")
                .unwrap_or_else(|_| "https://api.zaia.app/v1.1/api".to_string()),
            zaia_api_key: std::env::var("ZAIA_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            zaia_agent_id: match std::env::var("ZAIA_AGENT_ID") {
                Ok(raw) if !raw.trim().is_empty() => Some(
                    raw.trim()
                        .parse()
                        .map_err(|_| anyhow::anyhow!("ZAIA_AGENT_ID must be a number"))?,
                ),
                _ => None,
            },
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("OPENAI_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            smtp_host: std::env::var("SMTP_SERVER")
                .unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SMTP_PORT must be a valid port number"))?,
            smtp_user: std::env::var("SMTP_USER")
                .map_err(|_| anyhow::anyhow!("SMTP_USER environment variable required"))
                .and_then(|user| {
                    if user.trim().is_empty() {
                        anyhow::bail!("SMTP_USER cannot be empty");
                    }
                    Ok(user)
                })?,
            smtp_password: std::env::var("SMTP_PASSWORD")
                .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD environment variable required"))
                .and_then(|pass| {
                    if pass.trim().is_empty() {
                        anyhow::bail!("SMTP_PASSWORD cannot be empty");
                    }
                    Ok(pass)
                })?,
            inactivity_warn_days: std::env::var("INACTIVITY_WARN_DAYS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("INACTIVITY_WARN_DAYS must be a number"))?,
            inactivity_disable_days: std::env::var("INACTIVITY_DISABLE_DAYS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("INACTIVITY_DISABLE_DAYS must be a number"))?,
        };

        for (name, url) in [
            ("FLEXGE_API_BASE", &config.flexge_base_url),
            ("ASAAS_BASE", &config.asaas_base_url),
            ("ZAIA_BASE", &config.zaia_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if config.inactivity_warn_days <= 0 {
            anyhow::bail!("INACTIVITY_WARN_DAYS must be positive");
        }
        if config.inactivity_warn_days >= config.inactivity_disable_days {
            anyhow::bail!(
                "INACTIVITY_WARN_DAYS ({}) must be below INACTIVITY_DISABLE_DAYS ({})",
                config.inactivity_warn_days,
                config.inactivity_disable_days
            );
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Flexge Base URL: {}", config.flexge_base_url);
        tracing::debug!("Asaas Base URL: {}", config.asaas_base_url);
        tracing::debug!(
            "SMTP relay: {}:{} as {}",
            config.smtp_host,
            config.smtp_port,
            config.smtp_user
        );
        if config.zaia_api_key.is_some() && config.zaia_agent_id.is_some() {
            tracing::info!("Zaia WhatsApp agent configured");
        } else {
            tracing::warn!("Zaia not configured; WhatsApp notifications will be skipped");
        }
        tracing::debug!(
            "Inactivity thresholds: warn at {} days, disable at {} days",
            config.inactivity_warn_days,
            config.inactivity_disable_days
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
