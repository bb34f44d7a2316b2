use crate::enrollment::StudiedGrammar;
use crate::errors::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const SERVICE: &str = "openai";
const MODEL: &str = "gpt-4o";

/// Structured result of categorizing an uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub categoria: String,
    pub descricao: String,
    #[serde(default)]
    pub acoes: Vec<String>,
}

impl ImageAnalysis {
    /// Category "2" is a Flexge performance screenshot, which routes the
    /// caller to the grammar-explanation flow.
    pub fn is_flexge_screenshot(&self) -> bool {
        self.categoria == "2"
    }
}

/// Client for the generative-model API (topic explanations and image
/// categorization). Deliberately a thin collaborator: no state machine lives
/// here.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create OpenAI client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn chat_completion(
        &self,
        messages: Value,
        max_tokens: Option<u32>,
    ) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut payload = json!({
            "model": MODEL,
            "messages": messages,
        });
        if let Some(max_tokens) = max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::RemoteApi {
                service: SERVICE,
                status,
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| AppError::RemoteApi {
                service: SERVICE,
                status: 200,
                body: "completion response missing message content".to_string(),
            })
    }

    /// Short bilingual explanation of a grammar topic. Degrades to a canned
    /// apology on any failure; a broken model API never breaks the report.
    pub async fn explain_topic(&self, topic: &str) -> String {
        let prompt = format!(
            "Crie uma explicação completa sobre '{}' com:\n\
             - 1 definição simples\n\
             - 3 exemplos bilíngues (EN → PT)\n\
             - 2 dicas práticas\n\
             Formato: Texto simples com no máximo 5 linhas",
            topic
        );
        let messages = json!([
            {
                "role": "system",
                "content": "Você é um professor de inglês direto e prático, que ensina alunos com TDAH"
            },
            { "role": "user", "content": prompt },
        ]);

        match self.chat_completion(messages, None).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("Explanation request failed for '{}': {}", topic, err);
                format!(
                    "Explicação sobre {} não disponível no momento. Por favor tente mais tarde.",
                    topic
                )
            }
        }
    }

    /// Categorizes an uploaded image. The model is asked for pure JSON but
    /// often pads it with prose, so the first brace-delimited block is extracted
    /// before parsing.
    pub async fn analyze_image(&self, image_base64: &str) -> Result<ImageAnalysis, AppError> {
        let prompt = "Analise esta imagem e responda apenas em JSON puro com a seguinte estrutura:\n\
            {\n\
              \"categoria\": \"1\",\n\
              \"descricao\": \"texto explicando o que é\",\n\
              \"acoes\": [\"ação sugerida 1\", \"ação sugerida 2\"]\n\
            }\n\
            Categorias:\n\
            1. Comprovante de pagamento\n\
            2. Print Flexge\n\
            3. Print Notion/App\n\
            4. Outros";
        let messages = json!([{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:image/jpeg;base64,{}", image_base64),
                        "detail": "high"
                    }
                }
            ]
        }]);

        let raw = self.chat_completion(messages, Some(600)).await?;
        parse_analysis_reply(&raw)
    }

    /// Assembles the grammar report: the student's three worst topics by error
    /// rate, each with a generated explanation.
    pub async fn grammar_report(&self, grammars: &[StudiedGrammar]) -> String {
        let mut sorted = grammars.to_vec();
        sorted.sort_by(|a, b| b.error_percentage.total_cmp(&a.error_percentage));

        let mut report = String::from("📊 *Análise Flexge* 📊\n\n");
        for grammar in sorted.iter().take(3) {
            let explanation = self.explain_topic(&grammar.name).await;
            report.push_str(&format!(
                "📌 **{} ({}%)**\n{}\n-------------------------\n",
                grammar.name, grammar.error_percentage, explanation
            ));
        }
        report.trim_end().to_string()
    }
}

fn parse_analysis_reply(raw: &str) -> Result<ImageAnalysis, AppError> {
    let json_block = Regex::new(r"(?s)\{.*\}")
        .map_err(|e| AppError::Internal(format!("Invalid analysis regex: {}", e)))?
        .find(raw)
        .ok_or_else(|| AppError::RemoteApi {
            service: SERVICE,
            status: 200,
            body: "analysis reply contained no JSON object".to_string(),
        })?;

    serde_json::from_str(json_block.as_str()).map_err(|e| AppError::RemoteApi {
        service: SERVICE,
        status: 200,
        body: format!("analysis reply JSON did not parse: {}", e),
    })
}
