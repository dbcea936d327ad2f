//! Response statistics
//!
//! Pure aggregation over a project's questions and answered responses. Two
//! views are produced: [`ProjectStats`] for the dashboard and [`ReportStats`]
//! as the input of report generation.

use crate::error::Result;
use crate::storage::SurveyStore;
use crate::types::{AnsweredQuestion, ProjectId, Question, QuestionType, RespondentType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Key used for rating questions without a section
pub const DEFAULT_SECTION: &str = "전체";

/// Indicator key used for questions not tied to an indicator
pub const UNCLASSIFIED: &str = "unclassified";

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A response value counted as a rating
///
/// Reads the leading integer, ignoring anything after it (`"4.5"` and
/// `"4점"` count as 4), and keeps it when it lies within 1..=5.
fn rating_value(value: Option<&str>) -> Option<u8> {
    let v = value?.trim_start();
    let unsigned = v.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(v);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let prefix = &v[..v.len() - unsigned.len() + digits];
    prefix
        .parse::<i64>()
        .ok()
        .filter(|n| (1..=5).contains(n))
        .and_then(|n| u8::try_from(n).ok())
}

/// One chart row per respondent type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub respondent_type: RespondentType,
    pub label: &'static str,
    pub response_count: usize,
    /// Mean of this type's valid ratings (0 when it has none)
    pub average_score: f64,
}

/// Dashboard statistics of a project
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_questions: usize,
    pub total_responses: usize,
    pub responses_by_type: BTreeMap<RespondentType, usize>,
    /// Mean of every valid rating across all respondent types
    pub average_rating: f64,
    /// Percent of responses per question for each type that has questions
    pub completion_rate: BTreeMap<RespondentType, i64>,
    pub chart_data: Vec<ChartRow>,
    pub by_indicator: BTreeMap<String, usize>,
}

#[derive(Default)]
struct RatingAccumulator {
    sum: u64,
    count: usize,
}

impl RatingAccumulator {
    fn push(&mut self, rating: u8) {
        self.sum += u64::from(rating);
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            round2(self.sum as f64 / self.count as f64)
        }
    }
}

impl ProjectStats {
    pub fn compute(questions: &[Question], answered: &[AnsweredQuestion]) -> Self {
        let mut questions_by_type: BTreeMap<RespondentType, usize> = BTreeMap::new();
        for q in questions {
            *questions_by_type.entry(q.respondent_type).or_default() += 1;
        }

        let mut responses_by_type: BTreeMap<RespondentType, usize> = BTreeMap::new();
        let mut by_indicator: BTreeMap<String, usize> = BTreeMap::new();
        let mut overall = RatingAccumulator::default();
        let mut per_type: BTreeMap<RespondentType, RatingAccumulator> = BTreeMap::new();

        for a in answered {
            *responses_by_type.entry(a.respondent_type).or_default() += 1;
            let indicator = a.indicator_code.as_deref().unwrap_or(UNCLASSIFIED);
            *by_indicator.entry(indicator.to_string()).or_default() += 1;

            if let Some(rating) = rating_value(a.response_value.as_deref()) {
                overall.push(rating);
                per_type.entry(a.respondent_type).or_default().push(rating);
            }
        }

        let completion_rate = questions_by_type
            .iter()
            .map(|(t, &question_count)| {
                let responses = responses_by_type.get(t).copied().unwrap_or(0);
                let rate = (responses as f64 / question_count as f64 * 100.0).round() as i64;
                (*t, rate)
            })
            .collect();

        let chart_data = responses_by_type
            .iter()
            .map(|(t, &count)| ChartRow {
                respondent_type: *t,
                label: t.label(),
                response_count: count,
                average_score: per_type.get(t).map(RatingAccumulator::mean).unwrap_or(0.0),
            })
            .collect();

        Self {
            total_questions: questions.len(),
            total_responses: answered.len(),
            responses_by_type,
            average_rating: overall.mean(),
            completion_rate,
            chart_data,
            by_indicator,
        }
    }
}

/// Load a project's questions and responses and aggregate them
pub async fn compute_project_stats(
    store: &dyn SurveyStore,
    project_id: ProjectId,
) -> Result<ProjectStats> {
    store.get_project(project_id).await?;
    let questions = store.list_questions(project_id, None).await?;
    let answered = store.list_answered(project_id).await?;
    Ok(ProjectStats::compute(&questions, &answered))
}

/// Per-section rating aggregate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionAverage {
    pub sum: f64,
    pub count: usize,
    pub avg: f64,
}

/// Aggregates fed into report generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total: usize,
    pub by_type: BTreeMap<RespondentType, usize>,
    pub rating_avg: BTreeMap<String, SectionAverage>,
    pub text_responses: Vec<String>,
}

impl ReportStats {
    pub fn compute(answered: &[AnsweredQuestion]) -> Self {
        let mut by_type: BTreeMap<RespondentType, usize> = BTreeMap::new();
        let mut rating_avg: BTreeMap<String, SectionAverage> = BTreeMap::new();
        let mut text_responses = Vec::new();

        for a in answered {
            *by_type.entry(a.respondent_type).or_default() += 1;

            match a.question_type {
                QuestionType::Rating => {
                    // values that do not parse as a number are left out
                    let Some(value) = a
                        .response_value
                        .as_deref()
                        .and_then(|v| v.trim().parse::<f64>().ok())
                        .filter(|v| v.is_finite())
                    else {
                        continue;
                    };
                    let key = a
                        .section_name
                        .clone()
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| DEFAULT_SECTION.to_string());
                    let entry = rating_avg.entry(key).or_insert(SectionAverage {
                        sum: 0.0,
                        count: 0,
                        avg: 0.0,
                    });
                    entry.sum += value;
                    entry.count += 1;
                }
                QuestionType::Text => {
                    if let Some(text) = a.response_value.as_deref().filter(|v| !v.trim().is_empty()) {
                        text_responses.push(text.to_string());
                    }
                }
                QuestionType::MultipleChoice | QuestionType::Priority => {}
            }
        }

        for section in rating_avg.values_mut() {
            section.avg = if section.count > 0 {
                round2(section.sum / section.count as f64)
            } else {
                0.0
            };
        }

        Self {
            total: answered.len(),
            by_type,
            rating_avg,
            text_responses,
        }
    }
}
