//! Standard question templates keyed by indicator code

use crate::types::RespondentType::{Parent, Staff, Student, Teacher};
use crate::types::{QuestionType, RespondentType};

/// One question to create for an indicator and respondent role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTemplate {
    pub indicator_code: &'static str,
    pub respondent_type: RespondentType,
    pub question_text: &'static str,
    pub question_type: QuestionType,
    pub order_index: i64,
}

const fn rating(
    indicator_code: &'static str,
    respondent_type: RespondentType,
    question_text: &'static str,
    order_index: i64,
) -> QuestionTemplate {
    QuestionTemplate {
        indicator_code,
        respondent_type,
        question_text,
        question_type: QuestionType::Rating,
        order_index,
    }
}

/// Every standard template, grouped by indicator
pub static TEMPLATES: &[QuestionTemplate] = &[
    // 비전 공유
    rating("I-1-1-1", Teacher, "구성원 합의로 학교 비전을 도출하고 공유했는가?", 1),
    rating("I-1-1-1", Staff, "학교 비전이 행정지원 계획에 반영되었는가?", 1),
    rating("I-1-1-1", Parent, "학교 교육목표와 비전을 안내받았는가?", 1),
    rating("I-1-1-1", Student, "우리 학교의 목표(교훈)를 알고 있나요?", 1),
    // 민주적 운영
    rating("I-1-1-2", Teacher, "교직원 회의가 민주적 토론 중심으로 운영되는가?", 2),
    rating("I-1-1-2", Staff, "행정 업무 협의가 민주적으로 이루어지는가?", 2),
    rating("I-1-1-2", Parent, "학부모 의견이 학교 운영에 잘 반영되는가?", 2),
    rating("I-1-1-2", Student, "학급 회의 때 내 의견을 잘 들어주나요?", 2),
    // 업무 경감
    rating("I-1-2-1", Teacher, "행정업무 전담팀 운영 등으로 수업 전념 여건이 조성되었는가?", 3),
    rating("I-1-2-1", Staff, "업무 분장이 합리적이고 효율적인가?", 3),
    // 학생 맞춤형
    rating("II-2-1-1", Teacher, "학생 수준/흥미를 고려해 교육과정을 재구성했는가?", 4),
    rating("II-2-1-1", Staff, "교육활동에 필요한 예산/물품이 적기 지원되는가?", 4),
    rating("II-2-1-1", Parent, "자녀 특성에 맞는 교육이 이루어지는가?", 4),
    rating("II-2-1-1", Student, "수업 시간이 재미있고 이해가 잘 되나요?", 4),
    // 진로 교육
    rating("II-2-1-2", Teacher, "체험 중심의 진로교육이 내실 있게 운영되었는가?", 5),
    rating("II-2-1-2", Parent, "자녀 적성 계발을 위한 행사가 만족스러운가?", 5),
    rating("II-2-1-2", Student, "내 꿈을 찾는 활동(진로체험)이 재미있나요?", 5),
    // 교원 연수
    rating("II-2-2-1", Teacher, "전문성 신장을 위한 연수/공동체 활동이 활발한가?", 6),
    rating("II-2-2-1", Staff, "직무 능력 향상을 위한 연수 기회가 제공되는가?", 6),
    rating("II-2-2-1", Parent, "선생님들이 열정적으로 가르친다고 느끼는가?", 6),
    // 기초학력
    rating("III-3-1-1", Teacher, "학습부진 학생을 위한 맞춤형 지도를 했는가?", 7),
    rating("III-3-1-1", Staff, "기초학력 강사 채용/관리가 원활한가?", 7),
    rating("III-3-1-1", Parent, "자녀가 모르는 것을 학교에서 잘 지도해 주는가?", 7),
    rating("III-3-1-1", Student, "공부하다 모를 때 선생님이 친절히 알려주나요?", 7),
    // 학교폭력
    rating("III-3-2-1", Teacher, "학교폭력 예방 교육 및 사안 처리가 적절한가?", 8),
    rating("III-3-2-1", Staff, "학교폭력 예방을 위한 시설/환경 관리가 잘되는가?", 8),
    rating("III-3-2-1", Parent, "학교가 학교폭력으로부터 안전하다고 느끼는가?", 8),
    rating("III-3-2-1", Student, "친구들과 사이좋게 지내고 괴롭힘이 없나요?", 8),
    // 시설/급식
    rating("III-3-4-1", Teacher, "교육활동 공간이 청결하고 안전하게 관리되는가?", 9),
    rating("III-3-4-1", Staff, "시설물 유지보수 및 위생 관리가 철저한가?", 9),
    rating("III-3-4-1", Parent, "급식의 영양과 맛, 위생에 만족하는가?", 9),
    rating("III-3-4-1", Student, "급식이 맛있고 화장실/교실이 깨끗한가요?", 9),
];

/// Templates registered for an indicator code (empty for unknown codes)
pub fn templates_for(code: &str) -> impl Iterator<Item = &'static QuestionTemplate> + '_ {
    TEMPLATES.iter().filter(move |t| t.indicator_code == code)
}

/// Distinct indicator codes that carry templates, in table order
pub fn template_codes() -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = Vec::new();
    for t in TEMPLATES {
        if !codes.contains(&t.indicator_code) {
            codes.push(t.indicator_code);
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        assert_eq!(TEMPLATES.len(), 32);
        assert_eq!(template_codes().len(), 9);
        assert_eq!(templates_for("I-1-2-1").count(), 2);
        assert_eq!(templates_for("II-2-1-2").count(), 3);
        assert_eq!(templates_for("X-9-9-9").count(), 0);
    }

    #[test]
    fn test_one_template_per_role_and_indicator() {
        for code in template_codes() {
            let mut roles: Vec<_> = templates_for(code).map(|t| t.respondent_type).collect();
            let before = roles.len();
            roles.sort();
            roles.dedup();
            assert_eq!(roles.len(), before, "duplicate role under {}", code);
        }
    }
}
