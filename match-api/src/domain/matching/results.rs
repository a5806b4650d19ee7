//! Serializable payloads returned by each matching operation.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use time::OffsetDateTime;

use super::insights::{self, Confidence, SkillCluster, SkillRelationship};
use super::ranker::RankedMatch;
use super::similarity::MatchQuality;
use super::types::{
    BudgetType, ExperienceLevel, PortfolioCandidate, ProjectCandidate, SkillCandidate,
    TalentCandidate, WorkType,
};
use crate::domain::models::{EntityId, UserId};

/// Round a score for presentation. Ranking always uses the unrounded value.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

pub fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
}

fn rounded(breakdown: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    breakdown
        .into_iter()
        .map(|(label, score)| (label, round_score(score)))
        .collect()
}

fn whole(amount: Option<f64>) -> i64 {
    amount.map_or(0, |a| a.trunc() as i64)
}

/// `$50-$80/hr USD` for hourly budgets, `$5000-8000 USD` otherwise.
pub fn format_budget(project: &ProjectCandidate) -> String {
    let currency = project.budget_currency.as_deref().unwrap_or_default();
    let (min, max) = (whole(project.budget_min), whole(project.budget_max));
    let text = match project.budget_type {
        Some(BudgetType::Hourly) => format!("${min}-${max}/hr {currency}"),
        _ => format!("${min}-{max} {currency}"),
    };
    text.trim_end().to_string()
}

pub fn format_rate_range(talent: &TalentCandidate) -> String {
    let currency = talent.currency.as_deref().unwrap_or_default();
    format!(
        "${}-${} {currency}",
        whole(talent.hourly_rate_min),
        whole(talent.hourly_rate_max)
    )
    .trim_end()
    .to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct TalentMatch {
    pub id: EntityId,
    pub user_id: UserId,
    pub professional_title: String,
    pub summary: Option<String>,
    pub similarity_score: f64,
    pub match_quality: MatchQuality,
    pub hourly_rate_min: Option<f64>,
    pub hourly_rate_max: Option<f64>,
    pub currency: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_available: bool,
    pub match_reasons: Vec<String>,
    pub breakdown: BTreeMap<String, f64>,
}

impl From<RankedMatch<TalentCandidate>> for TalentMatch {
    fn from(ranked: RankedMatch<TalentCandidate>) -> Self {
        let RankedMatch {
            candidate: t,
            score,
            breakdown,
        } = ranked;
        Self {
            id: t.id,
            user_id: t.user_id,
            professional_title: t.professional_title,
            summary: t.summary,
            similarity_score: round_score(score),
            match_quality: MatchQuality::from_score(score),
            hourly_rate_min: t.hourly_rate_min,
            hourly_rate_max: t.hourly_rate_max,
            currency: t.currency,
            experience_level: t.experience_level,
            is_available: t.is_available,
            match_reasons: insights::talent_match_reasons(&breakdown),
            breakdown: rounded(breakdown),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TalentSearchResults {
    pub results: Vec<TalentMatch>,
    pub total: usize,
    pub query: String,
    pub execution_time_ms: f64,
    pub filters_applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: EntityId,
    pub title: String,
    pub budget: String,
    pub work_type: Option<WorkType>,
}

impl From<&ProjectCandidate> for ProjectSummary {
    fn from(p: &ProjectCandidate) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            budget: format_budget(p),
            work_type: p.work_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectTalentMatch {
    pub talent_id: EntityId,
    pub professional_title: String,
    pub overall_score: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub hourly_rate_range: String,
}

impl ProjectTalentMatch {
    pub fn new(ranked: RankedMatch<TalentCandidate>, project: &ProjectCandidate) -> Self {
        let t = &ranked.candidate;
        Self {
            talent_id: t.id,
            professional_title: t.professional_title.clone(),
            overall_score: round_score(ranked.score),
            strengths: insights::strengths(t, project),
            gaps: insights::gaps(t, project),
            hourly_rate_range: format_rate_range(t),
            breakdown: rounded(ranked.breakdown),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectTalentMatches {
    pub project: ProjectSummary,
    pub matches: Vec<ProjectTalentMatch>,
    pub total_analyzed: usize,
    pub total_matched: usize,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TalentSummary {
    pub id: EntityId,
    pub professional_title: String,
    pub experience_level: Option<ExperienceLevel>,
}

impl From<&TalentCandidate> for TalentSummary {
    fn from(t: &TalentCandidate) -> Self {
        Self {
            id: t.id,
            professional_title: t.professional_title.clone(),
            experience_level: t.experience_level,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecommendation {
    pub project_id: EntityId,
    pub title: String,
    pub match_score: f64,
    pub compatibility: BTreeMap<String, f64>,
    pub why_good_fit: Vec<String>,
    pub budget: String,
    pub work_type: Option<WorkType>,
    pub duration: Option<String>,
}

impl ProjectRecommendation {
    pub fn new(ranked: RankedMatch<ProjectCandidate>, talent: &TalentCandidate) -> Self {
        let RankedMatch {
            candidate: p,
            score,
            breakdown,
        } = ranked;
        Self {
            project_id: p.id,
            why_good_fit: insights::fit_reasons(&breakdown, &p, talent),
            budget: format_budget(&p),
            title: p.title,
            match_score: round_score(score),
            compatibility: rounded(breakdown),
            work_type: p.work_type,
            duration: p.duration,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TalentProjectMatches {
    pub talent: TalentSummary,
    pub recommended_projects: Vec<ProjectRecommendation>,
    pub total: usize,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub id: EntityId,
    pub title: String,
    pub user_id: UserId,
}

impl From<&PortfolioCandidate> for PortfolioSummary {
    fn from(p: &PortfolioCandidate) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            user_id: p.user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioOwner {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarPortfolio {
    pub id: EntityId,
    pub title: String,
    pub similarity_score: f64,
    pub user: PortfolioOwner,
    pub common_elements: Vec<String>,
    pub project_type: Option<String>,
}

impl SimilarPortfolio {
    pub fn new(ranked: RankedMatch<PortfolioCandidate>, source: &PortfolioCandidate) -> Self {
        let common_elements = insights::common_elements(source, &ranked.candidate);
        let p = ranked.candidate;
        Self {
            id: p.id,
            title: p.title,
            similarity_score: round_score(ranked.score),
            user: PortfolioOwner {
                id: p.user_id,
                name: p.user_name.unwrap_or_else(|| "Unknown".to_string()),
            },
            common_elements,
            project_type: p.project_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarPortfolios {
    pub source_portfolio: PortfolioSummary,
    pub similar_portfolios: Vec<SimilarPortfolio>,
    pub total: usize,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillSummary {
    pub id: EntityId,
    pub name: String,
    pub category: String,
}

impl From<&SkillCandidate> for SkillSummary {
    fn from(s: &SkillCandidate) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            category: insights::category_label(s).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedSkill {
    pub id: EntityId,
    pub name: String,
    pub similarity_score: f64,
    pub category: String,
    pub relationship: SkillRelationship,
}

impl RelatedSkill {
    pub fn new(ranked: &RankedMatch<SkillCandidate>, source: &SkillCandidate) -> Self {
        let s = &ranked.candidate;
        Self {
            id: s.id,
            name: s.name.clone(),
            similarity_score: round_score(ranked.score),
            category: insights::category_label(s).to_string(),
            relationship: SkillRelationship::between(source, s, ranked.score),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedSkills {
    pub skill: SkillSummary,
    pub related_skills: Vec<RelatedSkill>,
    pub clusters: Vec<SkillCluster>,
    pub total: usize,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub project_id: EntityId,
    pub title: String,
    pub recommendation_score: f64,
    pub reasons: Vec<String>,
    pub confidence: Confidence,
    pub budget: String,
    pub work_type: Option<WorkType>,
    pub posted_days_ago: i64,
}

impl Recommendation {
    pub fn new(
        ranked: RankedMatch<ProjectCandidate>,
        talent: &TalentCandidate,
        now: OffsetDateTime,
    ) -> Self {
        let RankedMatch {
            candidate: p,
            score,
            breakdown,
        } = ranked;
        Self {
            project_id: p.id,
            reasons: insights::recommendation_reasons(&breakdown, &p, talent),
            confidence: Confidence::from_score(score),
            budget: format_budget(&p),
            posted_days_ago: (now - p.created_at).whole_days().max(0),
            title: p.title,
            recommendation_score: round_score(score),
            work_type: p.work_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub recommendations: Vec<Recommendation>,
    /// Weight given to each scoring factor, keyed `based_on_<factor>`
    pub personalization_factors: BTreeMap<String, f64>,
    pub total: usize,
    pub execution_time_ms: f64,
}
