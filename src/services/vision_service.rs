use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o";
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.3;

const PROMPT: &str = r#"Analyze this travel-related screenshot and extract activity information. Return JSON with:
- name: A concise activity name (e.g., "Louvre Museum Visit")
- description: Brief description of what this activity involves
- activityType: Category like "museum", "restaurant", "attraction", "hotel", "transport", "activity", "shopping", "entertainment"

Keep responses travel-focused and practical for itinerary planning."#;

/// What the vision model extracted from a screenshot. The activity type is
/// still free text here; callers normalize it through ActivityType.
#[derive(Debug, Clone)]
pub struct ParsedActivity {
    pub name: String,
    pub description: String,
    pub activity_type: String,
}

impl ParsedActivity {
    /// The deterministic record used whenever classification fails. Uploads
    /// must never fail solely because the vision call did.
    pub fn fallback() -> Self {
        Self {
            name: "Travel Activity".to_string(),
            description: "Activity details could not be extracted".to_string(),
            activity_type: "activity".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum VisionError {
    EnvironmentError(String),
    RequestError(String),
    ApiError(String),
    ResponseError(String),
}

impl std::fmt::Display for VisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisionError::EnvironmentError(err) => write!(f, "Environment error: {}", err),
            VisionError::RequestError(err) => write!(f, "Request error: {}", err),
            VisionError::ApiError(err) => write!(f, "API error: {}", err),
            VisionError::ResponseError(err) => write!(f, "Response error: {}", err),
        }
    }
}

impl std::error::Error for VisionError {}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct VisionService {
    client: reqwest::Client,
    api_key: String,
}

impl VisionService {
    pub fn new() -> Result<Self, VisionError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| VisionError::EnvironmentError("OPENAI_API_KEY not set".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }

    /// Sends the screenshot to the vision model and parses the JSON blob
    /// out of its reply. One blocking round trip, no retry; the caller
    /// supplies the fallback on any error.
    pub async fn parse_screenshot(
        &self,
        image_bytes: &[u8],
        content_type: &str,
    ) -> Result<ParsedActivity, VisionError> {
        let data_url = format!(
            "data:{};base64,{}",
            content_type,
            general_purpose::STANDARD.encode(image_bytes)
        );

        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VisionError::ApiError(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| VisionError::ResponseError(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| VisionError::ResponseError("No response content".to_string()))?;

        parse_activity_json(content)
    }
}

/// The model wraps its JSON in prose more often than not; grab the first
/// top-level brace pair and fill in defaults for missing fields.
fn parse_activity_json(content: &str) -> Result<ParsedActivity, VisionError> {
    let json_pattern = Regex::new(r"\{[\s\S]*\}")
        .map_err(|e| VisionError::ResponseError(e.to_string()))?;

    let json_match = json_pattern
        .find(content)
        .ok_or_else(|| VisionError::ResponseError("No JSON found in response".to_string()))?;

    let parsed: serde_json::Value = serde_json::from_str(json_match.as_str())
        .map_err(|e| VisionError::ResponseError(e.to_string()))?;

    Ok(ParsedActivity {
        name: parsed["name"]
            .as_str()
            .unwrap_or("Untitled Activity")
            .to_string(),
        description: parsed["description"]
            .as_str()
            .unwrap_or("No description available")
            .to_string(),
        activity_type: parsed["activityType"]
            .as_str()
            .unwrap_or("activity")
            .to_string(),
    })
}
