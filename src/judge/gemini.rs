use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AnswerJudge, JudgeError, JudgeRequest, Verdict, VerdictSource};
use crate::config::JudgeConfig;

/// Judges answers with a Gemini `generateContent` call.
#[derive(Debug, Clone)]
pub struct GeminiJudge {
    config: JudgeConfig,
    /// `None` when the HTTP client could not be built; every call is then disabled.
    client: Option<Client>,
}

impl GeminiJudge {
    pub fn new(config: &JudgeConfig) -> Self {
        let client = match Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build judge HTTP client, judge disabled");
                None
            }
        };
        Self {
            config: config.clone(),
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl AnswerJudge for GeminiJudge {
    fn judge(&self, request: &JudgeRequest) -> Result<Verdict, JudgeError> {
        let Some(client) = self.client.as_ref().filter(|_| self.config.is_enabled()) else {
            return Err(JudgeError::Disabled);
        };

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
        };

        tracing::debug!(model = %self.config.model, "Sending answer to judge");
        let response = client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(JudgeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateContentResponse = response
            .json()
            .map_err(|e| JudgeError::Malformed(e.to_string()))?;
        parse_verdict(&reply.text())
    }
}

fn build_prompt(request: &JudgeRequest) -> String {
    format!(
        r#"You are a helpful tutor grading a student's answer to a flashcard question.
Judge the meaning, not the exact wording: small typos, synonyms and a different
word order are fine as long as the core of the answer is right.

Question: "{question}"
Correct answer on the flashcard: "{reference}"
Student's answer: "{answer}"

If the answer is correct, give a short positive confirmation. If it is wrong,
give a short hint towards the missed concept without revealing the answer.
Write the feedback in the language of the question.

Reply with ONLY a JSON object, no markdown, in this form:
{{"isCorrect": boolean, "feedback": "your short feedback"}}"#,
        question = request.question,
        reference = request.reference_answer,
        answer = request.learner_answer,
    )
}

#[derive(Deserialize)]
struct JudgeReply {
    #[serde(rename = "isCorrect")]
    is_correct: bool,
    feedback: String,
}

/// Pulls the outermost `{...}` out of the model's reply and reads the verdict from it.
pub(crate) fn parse_verdict(raw: &str) -> Result<Verdict, JudgeError> {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Err(JudgeError::Malformed("no JSON object in reply".to_string()));
    };
    if end < start {
        return Err(JudgeError::Malformed("no JSON object in reply".to_string()));
    }

    let reply: JudgeReply = serde_json::from_str(&raw[start..=end])
        .map_err(|e| JudgeError::Malformed(e.to_string()))?;

    Ok(Verdict {
        is_correct: reply.is_correct,
        feedback: reply.feedback,
        source: VerdictSource::Judge,
    })
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> JudgeConfig {
        JudgeConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_parse_plain_reply() {
        let verdict = parse_verdict(r#"{"isCorrect": true, "feedback": "Precies, dat klopt!"}"#).unwrap();

        assert!(verdict.is_correct);
        assert_eq!(verdict.feedback, "Precies, dat klopt!");
        assert_eq!(verdict.source, VerdictSource::Judge);
    }

    #[test]
    fn test_parse_reply_wrapped_in_markdown() {
        let raw = "```json\n{\n  \"isCorrect\": false,\n  \"feedback\": \"Kun je specifieker zijn?\"\n}\n```";
        let verdict = parse_verdict(raw).unwrap();

        assert!(!verdict.is_correct);
        assert_eq!(verdict.feedback, "Kun je specifieker zijn?");
    }

    #[test]
    fn test_parse_rejects_missing_object() {
        assert!(matches!(parse_verdict("Sorry, ik weet het niet."), Err(JudgeError::Malformed(_))));
        assert!(matches!(parse_verdict("} backwards {"), Err(JudgeError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(matches!(parse_verdict(r#"{"correct": "yes"}"#), Err(JudgeError::Malformed(_))));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let reply: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"isCorrect\":"},{"text":"true,\"feedback\":\"ok\"}"}]}}]}"#,
        )
        .unwrap();

        assert!(parse_verdict(&reply.text()).unwrap().is_correct);
    }

    #[test]
    fn test_missing_key_is_disabled() {
        let judge = GeminiJudge::new(&disabled_config());
        let request = JudgeRequest {
            question: "q".to_string(),
            reference_answer: "a".to_string(),
            learner_answer: "a".to_string(),
        };

        assert!(matches!(judge.judge(&request), Err(JudgeError::Disabled)));
    }

    #[test]
    fn test_judge_without_client_is_disabled() {
        let judge = GeminiJudge {
            config: JudgeConfig {
                api_key: "secret".to_string(),
                ..disabled_config()
            },
            client: None,
        };
        let request = JudgeRequest {
            question: "q".to_string(),
            reference_answer: "a".to_string(),
            learner_answer: "a".to_string(),
        };

        assert!(matches!(judge.judge(&request), Err(JudgeError::Disabled)));
    }

    #[test]
    fn test_prompt_contains_all_fields() {
        let prompt = build_prompt(&JudgeRequest {
            question: "Wat is ATP?".to_string(),
            reference_answer: "Energiedrager".to_string(),
            learner_answer: "energie".to_string(),
        });

        assert!(prompt.contains("Wat is ATP?"));
        assert!(prompt.contains("Energiedrager"));
        assert!(prompt.contains("energie"));
        assert!(prompt.contains(r#"{"isCorrect": boolean"#));
    }
}
