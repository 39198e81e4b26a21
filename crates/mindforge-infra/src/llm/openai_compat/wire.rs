//! OpenAI-compatible chat-completions wire format, shared by every vendor.
//!
//! Request: `{model, messages:[{role, content}], stream:false}` plus optional
//! fixed sampling fields. Response: `{choices:[{message}], model, usage}`;
//! only the first choice is read.

use mindforge_types::llm::{ChatResponse, LlmError, Message, TokenUsage, truncate_error_body};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, timeout_at};

/// Fixed vendor-specific sampling fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplingExtras {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct WireRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl<'a> WireRequest<'a> {
    pub fn new(model: &'a str, messages: &'a [Message], extras: SamplingExtras) -> Self {
        Self {
            model,
            messages,
            stream: false,
            temperature: extras.temperature,
            max_tokens: extras.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Raw HTTP result of one chat-completions POST.
#[derive(Debug)]
pub struct RawReply {
    pub status: StatusCode,
    pub body: String,
}

fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(e.to_string())
    }
}

/// POST `body` to `url` with a bearer token, bounded by `deadline`.
///
/// Returns whatever status the vendor answered with; only transport failures
/// and the deadline are errors here.
pub async fn post_chat(
    client: &reqwest::Client,
    url: &str,
    bearer: &str,
    extra_headers: &[(String, String)],
    body: &WireRequest<'_>,
    deadline: Instant,
) -> Result<RawReply, LlmError> {
    let call = async {
        let mut builder = client
            .post(url)
            .bearer_auth(bearer)
            .header(ACCEPT, "application/json")
            .json(body);
        for (name, value) in extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        Ok(RawReply { status, body })
    };

    match timeout_at(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout),
    }
}

/// Map a raw reply to the provider-agnostic response or error.
///
/// - 401/403 → [`LlmError::Authentication`]
/// - other non-2xx → [`LlmError::RequestFailed`] with a truncated body
/// - undecodable body or zero choices → [`LlmError::MalformedResponse`]
pub fn decode_reply(reply: RawReply) -> Result<ChatResponse, LlmError> {
    let status = reply.status;
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(LlmError::Authentication(format!(
            "HTTP {}: {}",
            status.as_u16(),
            truncate_error_body(&reply.body)
        )));
    }
    if !status.is_success() {
        return Err(LlmError::request_failed(status.as_u16(), &reply.body));
    }
    parse_chat_response(&reply.body)
}

pub fn parse_chat_response(body: &str) -> Result<ChatResponse, LlmError> {
    let wire: WireResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON: {e}")))?;
    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse("response contains no choices".to_string()))?;

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        model: wire.model,
        usage: TokenUsage {
            prompt_tokens: wire.usage.prompt_tokens,
            completion_tokens: wire.usage.completion_tokens,
            total_tokens: wire.usage.total_tokens,
        },
    })
}

/// [`post_chat`] followed by [`decode_reply`].
pub async fn send_chat(
    client: &reqwest::Client,
    url: &str,
    bearer: &str,
    extra_headers: &[(String, String)],
    body: &WireRequest<'_>,
    deadline: Instant,
) -> Result<ChatResponse, LlmError> {
    decode_reply(post_chat(client, url, bearer, extra_headers, body, deadline).await?)
}

#[cfg(test)]
mod tests {
    use mindforge_types::llm::MessageRole;

    use super::*;

    fn reply(status: u16, body: &str) -> RawReply {
        RawReply {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![
            Message::new(MessageRole::System, "be brief"),
            Message::new(MessageRole::User, "hi"),
        ];
        let plain =
            serde_json::to_value(WireRequest::new("grok-beta", &messages, SamplingExtras::default()))
                .unwrap();
        assert_eq!(
            plain,
            serde_json::json!({
                "model": "grok-beta",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": false
            })
        );

        let extras = SamplingExtras {
            temperature: Some(0.7),
            max_tokens: Some(2000),
        };
        let tuned = serde_json::to_value(WireRequest::new("GigaChat", &messages, extras)).unwrap();
        assert_eq!(tuned["max_tokens"], 2000);
        assert!((tuned["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_decode_first_choice_only() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ],
            "model": "deepseek-chat",
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let resp = decode_reply(reply(200, body)).unwrap();
        assert_eq!(resp.content, "first");
        assert_eq!(resp.model, "deepseek-chat");
        assert_eq!(resp.usage.total_tokens, 15);
    }

    #[test]
    fn test_decode_missing_usage_defaults_to_zero() {
        let resp = decode_reply(reply(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#)).unwrap();
        assert_eq!(resp.usage, TokenUsage::default());
    }

    #[test]
    fn test_zero_choices_is_malformed() {
        let err = decode_reply(reply(200, r#"{"choices":[],"model":"m"}"#)).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = decode_reply(reply(200, "<html>gateway</html>")).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_auth_statuses() {
        for status in [401, 403] {
            let err = decode_reply(reply(status, "denied")).unwrap_err();
            assert!(matches!(err, LlmError::Authentication(ref m) if m.contains("denied")));
        }
    }

    #[test]
    fn test_other_status_is_request_failed() {
        let err = decode_reply(reply(429, &"r".repeat(1000))).unwrap_err();
        match err {
            LlmError::RequestFailed { status, body } => {
                assert_eq!(status, 429);
                assert!(body.len() < 1000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
