//! Free-text response analysis
//!
//! Sends every non-blank answer to a `text` question of a project to the
//! model in one request and decodes the keyword/theme summary it returns.

use crate::error::{EvalError, Result};
use crate::services::llm::{parse_json_reply, ChatCompletion, ChatMessage, ChatRequest};
use crate::storage::SurveyStore;
use crate::types::{AnsweredQuestion, ProjectId, QuestionType};
use crate::utils::json::{number, string_list, text};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// Summary returned when a project has no text answers
pub const NO_TEXT_SUMMARY: &str = "분석할 텍스트 응답이 없습니다.";

const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.3;

const SYSTEM_PROMPT: &str = r#"당신은 학교 평가 설문 응답을 분석하는 전문가입니다.
주어진 텍스트 응답들을 분석하여 다음 형식의 JSON으로 응답하세요:
{
  "wordCloud": [{"text": "단어", "value": 빈도수}, ...], // 상위 30개 키워드
  "summary": "전체 응답 요약 (2-3문장)",
  "themes": ["주제1", "주제2", ...], // 주요 테마 5개
  "positives": ["긍정적 의견1", ...], // 긍정적 의견 3개
  "negatives": ["개선필요사항1", ...], // 개선 필요 사항 3개
  "recommendations": ["제안1", ...] // AI 추천 개선방안 3개
}
JSON만 출력하세요. 다른 텍스트는 출력하지 마세요."#;

/// A keyword and its weight in the word cloud
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordWeight {
    pub text: String,
    pub value: f64,
}

impl WordWeight {
    /// Read a word-cloud entry; a bare string counts once
    fn from_value(value: &Value) -> Option<Self> {
        let (word, weight) = match value {
            Value::String(s) => (s.clone(), 1.0),
            Value::Object(entry) => (
                entry.get("text").map(text).unwrap_or_default(),
                entry.get("value").and_then(number).unwrap_or(0.0),
            ),
            _ => return None,
        };
        let word = word.trim();
        (!word.is_empty()).then(|| Self {
            text: word.to_string(),
            value: weight,
        })
    }
}

/// Model-produced analysis of free-text answers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub word_cloud: Vec<WordWeight>,
    pub summary: String,
    pub themes: Vec<String>,
    pub positives: Vec<String>,
    pub negatives: Vec<String>,
    pub recommendations: Vec<String>,
}

impl TextAnalysis {
    /// Analysis of a project without text answers
    pub fn empty() -> Self {
        Self {
            summary: NO_TEXT_SUMMARY.to_string(),
            ..Self::default()
        }
    }

    /// Degraded analysis carrying the raw reply as its summary
    pub fn from_raw(reply: &str) -> Self {
        Self {
            summary: reply.to_string(),
            ..Self::default()
        }
    }

    /// Read the decoded reply, or `None` when it is not a JSON object
    ///
    /// Missing or `null` fields read as empty and weights may be numeric
    /// strings.
    pub fn from_value(reply: &Value) -> Option<Self> {
        let fields = reply.as_object()?;
        let field = |name: &str| fields.get(name).unwrap_or(&Value::Null);

        let word_cloud = match field("wordCloud") {
            Value::Array(items) => items.iter().filter_map(WordWeight::from_value).collect(),
            _ => Vec::new(),
        };
        Some(Self {
            word_cloud,
            summary: text(field("summary")),
            themes: string_list(field("themes")),
            positives: string_list(field("positives")),
            negatives: string_list(field("negatives")),
            recommendations: string_list(field("recommendations")),
        })
    }
}

/// Non-blank answers to `text` questions, in response order
pub fn text_answers(answered: &[AnsweredQuestion]) -> Vec<&str> {
    answered
        .iter()
        .filter(|a| a.question_type == QuestionType::Text)
        .filter_map(|a| a.response_value.as_deref())
        .filter(|v| !v.trim().is_empty())
        .collect()
}

/// Build the completion request for a set of answers
pub fn build_request(answers: &[&str]) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "다음 학교 평가 설문의 텍스트 응답들을 분석해주세요:\n\n{}",
                answers.join("\n")
            )),
        ],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// Analyze the text answers of a project
///
/// Makes no model call when there is nothing to analyze. A reply that is not
/// a JSON object degrades to [`TextAnalysis::from_raw`].
pub async fn analyze_responses(
    store: &dyn SurveyStore,
    llm: &dyn ChatCompletion,
    project_id: ProjectId,
) -> Result<TextAnalysis> {
    store.get_project(project_id).await?;

    let answered = store.list_answered(project_id).await?;
    let answers = text_answers(&answered);
    if answers.is_empty() {
        debug!("No text answers for project {}", project_id);
        return Ok(TextAnalysis::empty());
    }

    info!("Analyzing {} text responses", answers.len());
    let reply = llm
        .complete(build_request(&answers))
        .await
        .map_err(|e| EvalError::LlmApi(format!("analysis failed: {}", e)))?;

    Ok(parse_json_reply::<Value>(&reply)
        .as_ref()
        .and_then(TextAnalysis::from_value)
        .unwrap_or_else(|| TextAnalysis::from_raw(&reply)))
}
