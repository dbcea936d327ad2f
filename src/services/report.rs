//! Narrative report generation
//!
//! Aggregates a project's responses into [`ReportStats`], asks the model for
//! a sectioned report in one request and attaches metadata to whatever comes
//! back.

use crate::error::{EvalError, Result};
use crate::services::llm::{parse_json_reply, ChatCompletion, ChatMessage, ChatRequest};
use crate::stats::{ReportStats, SectionAverage};
use crate::storage::SurveyStore;
use crate::types::{Project, ProjectId, RespondentType};
use crate::utils::json::text;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// School name used when the school row cannot be read
pub const UNKNOWN_SCHOOL: &str = "미정";

/// Text answers quoted in the prompt
const QUOTED_ANSWERS: usize = 20;
const MAX_TOKENS: u32 = 3000;
const TEMPERATURE: f32 = 0.4;

const SYSTEM_PROMPT: &str = r#"당신은 학교 평가 보고서를 작성하는 전문가입니다.
주어진 데이터를 바탕으로 학교 평가 보고서의 각 섹션을 작성해주세요.
JSON 형식으로 응답하세요:
{
  "title": "보고서 제목",
  "sections": [
    {"id": "overview", "title": "1. 평가 개요", "content": "설문 개요 내용..."},
    {"id": "participation", "title": "2. 참여 현황", "content": "참여 현황 분석..."},
    {"id": "results", "title": "3. 평가 결과", "content": "영역별 평가 결과..."},
    {"id": "analysis", "title": "4. 종합 분석", "content": "강점, 약점, 특이사항 분석..."},
    {"id": "recommendations", "title": "5. 개선 제안", "content": "구체적인 개선 방안..."},
    {"id": "conclusion", "title": "6. 결론", "content": "결론 및 향후 방향..."}
  ]
}
각 섹션은 2-4문단으로 작성하고, 구체적인 수치와 데이터를 인용하세요.
JSON만 출력하세요."#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Aggregates echoed into the report metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStats {
    pub total_responses: usize,
    pub by_type: BTreeMap<RespondentType, usize>,
    pub rating_avg: BTreeMap<String, SectionAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub school_name: Option<String>,
    pub year: i32,
    pub project_title: String,
    pub generated_at: DateTime<Utc>,
    pub stats: MetadataStats,
}

/// Title and sections read from the model reply
#[derive(Debug)]
struct ReportBody {
    title: String,
    sections: Vec<ReportSection>,
}

impl ReportBody {
    /// Read a decoded reply; `None` unless it is an object with at least one
    /// usable section
    ///
    /// Sections without an id are numbered by position and a missing title
    /// falls back to `default_title`.
    fn from_value(reply: &Value, default_title: &str) -> Option<Self> {
        let fields = reply.as_object()?;
        let sections: Vec<ReportSection> = fields
            .get("sections")
            .and_then(Value::as_array)?
            .iter()
            .filter_map(Value::as_object)
            .enumerate()
            .map(|(i, section)| {
                let field = |name: &str| section.get(name).map(text).unwrap_or_default();
                let id = field("id");
                ReportSection {
                    id: if id.trim().is_empty() {
                        format!("section-{}", i + 1)
                    } else {
                        id
                    },
                    title: field("title"),
                    content: field("content"),
                }
            })
            .collect();
        if sections.is_empty() {
            return None;
        }

        let title = fields.get("title").map(text).unwrap_or_default();
        Some(Self {
            title: if title.trim().is_empty() {
                default_title.to_string()
            } else {
                title
            },
            sections,
        })
    }

    /// Whole reply as a single section
    fn from_raw(reply: &str, default_title: &str) -> Self {
        Self {
            title: default_title.to_string(),
            sections: vec![ReportSection {
                id: "content".to_string(),
                title: "보고서 내용".to_string(),
                content: reply.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub sections: Vec<ReportSection>,
    pub metadata: ReportMetadata,
}

/// Build the completion request from the project facts and aggregates
pub fn build_request(school_name: &str, project: &Project, stats: &ReportStats) -> ChatRequest {
    let by_type = stats
        .by_type
        .iter()
        .map(|(t, n)| format!("{}: {}건", t, n))
        .collect::<Vec<_>>()
        .join(", ");
    let averages = stats
        .rating_avg
        .iter()
        .map(|(section, avg)| format!("- {}: {}점 ({}건)", section, avg.avg, avg.count))
        .collect::<Vec<_>>()
        .join("\n");
    let quoted = stats
        .text_responses
        .iter()
        .take(QUOTED_ANSWERS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n---\n");

    let user = format!(
        "다음 데이터를 바탕으로 학교 평가 보고서를 작성해주세요:\n\n\
         학교명: {}\n평가년도: {}년\n프로젝트명: {}\n\n\
         응답 통계:\n- 총 응답 수: {}건\n- 대상별 응답: {}\n\n\
         영역별 평균 점수:\n{}\n\n\
         주요 텍스트 응답 ({}건):\n{}",
        school_name,
        project.year,
        project.title,
        stats.total,
        by_type,
        averages,
        stats.text_responses.len(),
        quoted
    );

    ChatRequest {
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// Generate the report of a project
pub async fn generate_report(
    store: &dyn SurveyStore,
    llm: &dyn ChatCompletion,
    project_id: ProjectId,
) -> Result<Report> {
    let project = store.get_project(project_id).await?;
    let school_name = match store.get_school(project.school_id).await {
        Ok(school) => Some(school.school_name),
        Err(e) => {
            warn!("School of project {} unavailable: {}", project.id, e);
            None
        }
    };

    let answered = store.list_answered(project_id).await?;
    let stats = ReportStats::compute(&answered);
    debug!(
        "Report stats: {} responses, {} sections, {} text answers",
        stats.total,
        stats.rating_avg.len(),
        stats.text_responses.len()
    );

    let request = build_request(
        school_name.as_deref().unwrap_or(UNKNOWN_SCHOOL),
        &project,
        &stats,
    );
    let reply = llm
        .complete(request)
        .await
        .map_err(|e| EvalError::LlmApi(format!("report generation failed: {}", e)))?;

    let default_title = format!(
        "{} {}년 학교 평가 보고서",
        school_name.as_deref().unwrap_or(""),
        project.year
    );
    let body = parse_json_reply::<Value>(&reply)
        .and_then(|value| ReportBody::from_value(&value, &default_title))
        .unwrap_or_else(|| ReportBody::from_raw(&reply, &default_title));

    info!("Generated report for project {}", project.id);
    Ok(Report {
        title: body.title,
        sections: body.sections,
        metadata: ReportMetadata {
            school_name,
            year: project.year,
            project_title: project.title,
            generated_at: Utc::now(),
            stats: MetadataStats {
                total_responses: stats.total,
                by_type: stats.by_type,
                rating_avg: stats.rating_avg,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::MockChatCompletion;
    use crate::storage::test_utils::{create_test_store, seed_project, seed_school};
    use crate::types::{NewQuestion, NewResponse, QuestionType};

    fn stats_with_texts(n: usize) -> ReportStats {
        ReportStats {
            total: n,
            by_type: BTreeMap::from([(RespondentType::Student, n)]),
            rating_avg: BTreeMap::new(),
            text_responses: (0..n).map(|i| format!("answer-{}", i)).collect(),
        }
    }

    fn project() -> Project {
        Project {
            id: ProjectId::new(),
            school_id: crate::types::SchoolId::new(),
            title: "2025 학교평가".to_string(),
            year: 2025,
            description: None,
            status: crate::types::ProjectStatus::Active,
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_quotes_first_twenty_answers() {
        let request = build_request("한빛초", &project(), &stats_with_texts(25));
        let user = &request.messages[1].content;

        assert!(user.contains("학교명: 한빛초"));
        assert!(user.contains("주요 텍스트 응답 (25건)"));
        assert!(user.contains("answer-19"));
        assert!(!user.contains("answer-20"));
        assert!(user.contains("answer-0\n---\nanswer-1"));
        assert!(user.contains("student: 25건"));
        assert_eq!(request.max_tokens, 3000);
    }

    #[tokio::test]
    async fn test_report_with_metadata() {
        let (_dir, store) = create_test_store().await.unwrap();
        let school = seed_school(store.as_ref(), "R001", "pw").await.unwrap();
        let project = seed_project(store.as_ref(), &school, 2025).await.unwrap();
        store
            .insert_questions(&[NewQuestion {
                project_id: project.id,
                indicator_id: None,
                respondent_type: RespondentType::Teacher,
                question_text: "만족하십니까?".to_string(),
                question_type: QuestionType::Rating,
                options: None,
                section_name: None,
                description: None,
                image_url: None,
                order_index: 1,
                is_required: true,
            }])
            .await
            .unwrap();
        let q = store.list_questions(project.id, None).await.unwrap()[0].id;
        store
            .insert_responses(&[NewResponse {
                project_id: project.id,
                question_id: q,
                respondent_type: RespondentType::Teacher,
                session_id: "s".to_string(),
                response_value: Some("4".to_string()),
                response_data: None,
            }])
            .await
            .unwrap();

        let mut llm = MockChatCompletion::new();
        llm.expect_complete().times(1).returning(|_| {
            Ok(r#"{"title":"보고서","sections":[{"id":"overview","title":"1. 평가 개요","content":"..."}]}"#.to_string())
        });

        let report = generate_report(store.as_ref(), &llm, project.id).await.unwrap();
        assert_eq!(report.title, "보고서");
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.metadata.school_name.as_deref(), Some("R001 초등학교"));
        assert_eq!(report.metadata.stats.total_responses, 1);
        assert_eq!(report.metadata.stats.rating_avg["전체"].avg, 4.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metadata"]["stats"]["byType"]["teacher"], 1);
        assert_eq!(json["metadata"]["projectTitle"], "2025 학교평가");
    }

    #[tokio::test]
    async fn test_fallback_report() {
        let (_dir, store) = create_test_store().await.unwrap();
        let school = seed_school(store.as_ref(), "R002", "pw").await.unwrap();
        let project = seed_project(store.as_ref(), &school, 2024).await.unwrap();

        let mut llm = MockChatCompletion::new();
        llm.expect_complete()
            .returning(|_| Ok("보고서를 작성할 수 없습니다".to_string()));

        let report = generate_report(store.as_ref(), &llm, project.id).await.unwrap();
        assert_eq!(report.title, "R002 초등학교 2024년 학교 평가 보고서");
        assert_eq!(report.sections[0].id, "content");
        assert_eq!(report.sections[0].title, "보고서 내용");
        assert_eq!(report.sections[0].content, "보고서를 작성할 수 없습니다");
        assert_eq!(report.metadata.stats.total_responses, 0);
    }

    #[tokio::test]
    async fn test_untitled_report_keeps_model_sections() {
        let (_dir, store) = create_test_store().await.unwrap();
        let school = seed_school(store.as_ref(), "R003", "pw").await.unwrap();
        let project = seed_project(store.as_ref(), &school, 2025).await.unwrap();

        let mut llm = MockChatCompletion::new();
        llm.expect_complete().returning(|_| {
            Ok(r#"```json
{"title": null, "sections": [
  {"id": "overview", "title": "1. 평가 개요", "content": "개요"},
  {"title": "2. 참여 현황", "content": null},
  "stray"
]}
```"#
                .to_string())
        });

        let report = generate_report(store.as_ref(), &llm, project.id).await.unwrap();
        assert_eq!(report.title, "R003 초등학교 2025년 학교 평가 보고서");
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].content, "개요");
        assert_eq!(report.sections[1].id, "section-2");
        assert_eq!(report.sections[1].title, "2. 참여 현황");
        assert_eq!(report.sections[1].content, "");
    }

    #[test]
    fn test_reply_without_sections_is_not_a_body() {
        let title = "기본 제목";
        assert!(ReportBody::from_value(&serde_json::json!({"title": "제목"}), title).is_none());
        assert!(ReportBody::from_value(&serde_json::json!({"sections": []}), title).is_none());
        assert!(ReportBody::from_value(&serde_json::json!([1, 2]), title).is_none());
    }
}
