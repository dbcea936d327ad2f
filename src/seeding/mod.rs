//! Question seeding
//!
//! Expands the standard template table into question rows for a project, one
//! per template of every indicator present in the database. The standard
//! Domain > Area > Indicator hierarchy is installed by
//! [`ensure_standard_hierarchy`] so a fresh database can seed questions.

pub mod templates;

pub use templates::{templates_for, QuestionTemplate, TEMPLATES};

use crate::error::{EvalError, Result};
use crate::storage::SurveyStore;
use crate::types::{EvaluationArea, EvaluationDomain, Indicator, NewQuestion, ProjectId};
use serde::Serialize;
use tracing::{debug, info};

struct DomainSeed {
    code: &'static str,
    name: &'static str,
    areas: &'static [AreaSeed],
}

struct AreaSeed {
    code: &'static str,
    name: &'static str,
    indicators: &'static [(&'static str, &'static str)],
}

static STANDARD_HIERARCHY: &[DomainSeed] = &[
    DomainSeed {
        code: "I",
        name: "학교 운영",
        areas: &[
            AreaSeed {
                code: "I-1-1",
                name: "학교 비전과 민주적 운영",
                indicators: &[("I-1-1-1", "비전 공유"), ("I-1-1-2", "민주적 운영")],
            },
            AreaSeed {
                code: "I-1-2",
                name: "교육 중심 업무 체계",
                indicators: &[("I-1-2-1", "업무 경감")],
            },
        ],
    },
    DomainSeed {
        code: "II",
        name: "교육과정 및 교수·학습",
        areas: &[
            AreaSeed {
                code: "II-2-1",
                name: "교육과정 운영",
                indicators: &[("II-2-1-1", "학생 맞춤형 교육과정"), ("II-2-1-2", "진로 교육")],
            },
            AreaSeed {
                code: "II-2-2",
                name: "교원 전문성",
                indicators: &[("II-2-2-1", "교원 연수")],
            },
        ],
    },
    DomainSeed {
        code: "III",
        name: "교육성과 및 학생 지원",
        areas: &[
            AreaSeed {
                code: "III-3-1",
                name: "학력 향상",
                indicators: &[("III-3-1-1", "기초학력 보장")],
            },
            AreaSeed {
                code: "III-3-2",
                name: "안전한 학교",
                indicators: &[("III-3-2-1", "학교폭력 예방")],
            },
            AreaSeed {
                code: "III-3-4",
                name: "교육 환경",
                indicators: &[("III-3-4-1", "시설 및 급식")],
            },
        ],
    },
];

/// Install the standard indicator hierarchy; existing codes are kept
///
/// Returns the number of indicators in the standard set.
pub async fn ensure_standard_hierarchy(store: &dyn SurveyStore) -> Result<usize> {
    let mut count = 0;
    for (d_idx, domain) in STANDARD_HIERARCHY.iter().enumerate() {
        let domain_id = store
            .ensure_domain(domain.code, domain.name, None, d_idx as i64 + 1)
            .await?;
        for (a_idx, area) in domain.areas.iter().enumerate() {
            let area_id = store
                .ensure_area(domain_id, area.code, area.name, a_idx as i64 + 1)
                .await?;
            for (i_idx, (code, name)) in area.indicators.iter().enumerate() {
                store
                    .ensure_indicator(area_id, code, name, i_idx as i64 + 1)
                    .await?;
                count += 1;
            }
        }
    }
    info!("Standard indicator hierarchy ready ({} indicators)", count);
    Ok(count)
}

/// A domain with its areas, as listed by `GET /indicators`
#[derive(Debug, Clone, Serialize)]
pub struct DomainNode {
    #[serde(flatten)]
    pub domain: EvaluationDomain,
    pub areas: Vec<AreaNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaNode {
    #[serde(flatten)]
    pub area: EvaluationArea,
    pub indicators: Vec<Indicator>,
}

/// The Domain > Area > Indicator hierarchy in stored order
pub async fn indicator_tree(store: &dyn SurveyStore) -> Result<Vec<DomainNode>> {
    let domains = store.list_domains().await?;
    let areas = store.list_areas().await?;
    let indicators = store.list_indicators().await?;

    Ok(domains
        .into_iter()
        .map(|domain| {
            let areas = areas
                .iter()
                .filter(|a| a.domain_id == domain.id)
                .map(|area| AreaNode {
                    area: area.clone(),
                    indicators: indicators
                        .iter()
                        .filter(|i| i.area_id == area.id)
                        .cloned()
                        .collect(),
                })
                .collect();
            DomainNode { domain, areas }
        })
        .collect())
}

/// Expand templates into question rows for the indicators given
///
/// Indicators without templates contribute nothing.
pub fn expand_templates(project_id: ProjectId, indicators: &[Indicator]) -> Vec<NewQuestion> {
    indicators
        .iter()
        .flat_map(|indicator| {
            templates_for(&indicator.code).map(move |t| NewQuestion {
                project_id,
                indicator_id: Some(indicator.id),
                respondent_type: t.respondent_type,
                question_text: t.question_text.to_string(),
                question_type: t.question_type,
                options: None,
                section_name: None,
                description: None,
                image_url: None,
                order_index: t.order_index,
                is_required: true,
            })
        })
        .collect()
}

/// Create the standard questions of a project, returning how many were made
pub async fn generate_project_questions(
    store: &dyn SurveyStore,
    project_id: ProjectId,
) -> Result<usize> {
    // fail with 404 rather than a foreign-key error
    let project = store.get_project(project_id).await?;

    let indicators = store.list_indicators().await?;
    let questions = expand_templates(project.id, &indicators);
    debug!(
        "Expanded {} questions from {} indicators",
        questions.len(),
        indicators.len()
    );

    let created = store.insert_questions(&questions).await.map_err(|e| match e {
        EvalError::Database(msg) => {
            EvalError::Database(format!("failed to insert questions: {}", msg))
        }
        other => other,
    })?;

    info!("Created {} questions for project {}", created, project.id);
    Ok(created)
}
