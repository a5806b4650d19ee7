//! Human-readable explanations attached to ranked matches.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;
use strum::Display;

use super::types::{
    BudgetType, PortfolioCandidate, ProjectCandidate, SkillCandidate, TalentCandidate, WorkType,
};

const UNCATEGORIZED: &str = "Uncategorized";

fn component(breakdown: &BTreeMap<String, f64>, label: &str) -> Option<f64> {
    breakdown.get(label).copied()
}

fn at_least(breakdown: &BTreeMap<String, f64>, label: &str, threshold: f64) -> Option<f64> {
    component(breakdown, label).filter(|s| *s >= threshold)
}

/// Why a talent came up for a free-text search.
pub fn talent_match_reasons(breakdown: &BTreeMap<String, f64>) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some(s) = at_least(breakdown, "skills", 0.85) {
        reasons.push(format!("Strong skills match ({s:.2})"));
    }
    if let Some(s) = at_least(breakdown, "experience", 0.80) {
        reasons.push(format!("Relevant experience ({s:.2})"));
    }
    if let Some(s) = at_least(breakdown, "profile", 0.85) {
        reasons.push(format!("Profile alignment ({s:.2})"));
    }
    if reasons.is_empty() {
        reasons.push("General match".to_string());
    }
    reasons
}

fn rate_within_budget(talent: &TalentCandidate, project: &ProjectCandidate) -> bool {
    project.budget_type == Some(BudgetType::Hourly)
        && talent.hourly_rate_min.unwrap_or(0.0) <= project.budget_max.unwrap_or(f64::MAX)
}

/// What makes a talent a good fit for a project.
pub fn strengths(talent: &TalentCandidate, project: &ProjectCandidate) -> Vec<String> {
    let mut strengths = Vec::new();

    let shared: Vec<&str> = talent
        .skill_names
        .iter()
        .filter(|name| project.required_skills.contains(*name))
        .map(String::as_str)
        .unique()
        .take(3)
        .collect();
    if !shared.is_empty() {
        strengths.push(format!("Exact skill match: {}", shared.join(", ")));
    }

    if talent.experience_level.is_some() && talent.experience_level == project.experience_level {
        strengths.push("Experience level matches requirement".to_string());
    }

    if rate_within_budget(talent, project) {
        strengths.push("Rate within budget".to_string());
    }

    if strengths.is_empty() {
        strengths.push("Compatible profile".to_string());
    }
    strengths
}

/// Required skills the talent does not list (at most two). May be empty.
pub fn gaps(talent: &TalentCandidate, project: &ProjectCandidate) -> Vec<String> {
    let missing: Vec<&str> = project
        .required_skills
        .iter()
        .filter(|name| !talent.skill_names.contains(*name))
        .map(String::as_str)
        .unique()
        .take(2)
        .collect();

    if missing.is_empty() {
        Vec::new()
    } else {
        vec![format!("Missing: {}", missing.join(", "))]
    }
}

fn midpoint(min: Option<f64>, max: Option<f64>) -> Option<f64> {
    Some((min? + max?) / 2.0)
}

/// Why a project suits a talent, phrased for the talent.
pub fn fit_reasons(
    breakdown: &BTreeMap<String, f64>,
    project: &ProjectCandidate,
    talent: &TalentCandidate,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if at_least(breakdown, "skills", 0.85).is_some() {
        reasons.push("Your skills align perfectly with requirements".to_string());
    }
    if at_least(breakdown, "experience", 0.80).is_some() {
        reasons.push("Your experience matches project needs".to_string());
    }
    if project.work_type == Some(WorkType::Remote)
        && talent.work_preferences.contains(&WorkType::Remote)
    {
        reasons.push("Remote work matches your preferences".to_string());
    }
    if project.budget_type == Some(BudgetType::Hourly) {
        let budget = midpoint(project.budget_min, project.budget_max);
        let rate = midpoint(talent.hourly_rate_min, talent.hourly_rate_max);
        if let (Some(budget), Some(rate)) = (budget, rate) {
            if (budget - rate).abs() <= 20.0 {
                reasons.push("Budget aligns with your rate expectations".to_string());
            }
        }
    }

    if reasons.is_empty() {
        reasons.push("Good overall match".to_string());
    }
    reasons
}

/// Reasons attached to a personalised recommendation.
pub fn recommendation_reasons(
    breakdown: &BTreeMap<String, f64>,
    project: &ProjectCandidate,
    talent: &TalentCandidate,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if at_least(breakdown, "skills", 0.85).is_some() {
        reasons.push("Perfect skill match based on your profile".to_string());
    }
    if at_least(breakdown, "experience", 0.80).is_some() {
        reasons.push("Your experience aligns with project needs".to_string());
    }
    if at_least(breakdown, "preferences", 0.7).is_some() {
        reasons.push("Matches your work preferences".to_string());
    }
    if rate_within_budget(talent, project) {
        reasons.push("Budget aligns with your rates".to_string());
    }

    if reasons.is_empty() {
        reasons.push("Good match based on your profile".to_string());
    }
    reasons
}

/// How well a project lines up with a talent's stated work preferences.
///
/// Work type is always checked; locations only when both sides list some.
/// Returns the fraction of checks that passed.
pub fn preferences_score(talent: &TalentCandidate, project: &ProjectCandidate) -> f64 {
    let mut checks = 1u32;
    let mut hits = 0u32;

    if project
        .work_type
        .is_some_and(|w| talent.work_preferences.contains(&w))
    {
        hits += 1;
    }

    if !talent.preferred_locations.is_empty() && !project.locations.is_empty() {
        checks += 1;
        if project
            .locations
            .iter()
            .any(|l| talent.preferred_locations.contains(l))
        {
            hits += 1;
        }
    }

    f64::from(hits) / f64::from(checks)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Moderate,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Confidence::High
        } else if score >= 0.7 {
            Confidence::Medium
        } else {
            Confidence::Moderate
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// What two portfolios visibly share.
pub fn common_elements(source: &PortfolioCandidate, target: &PortfolioCandidate) -> Vec<String> {
    let mut elements = Vec::new();

    if let (Some(a), Some(b)) = (&source.project_type, &target.project_type) {
        if a == b {
            elements.push(format!("{} project", capitalize(a)));
        }
    }

    let common: Vec<&str> = source
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && target.tags.iter().any(|o| o.trim() == *t))
        .unique()
        .take(3)
        .collect();
    if !common.is_empty() {
        elements.push(format!("Common tags: {}", common.join(", ")));
    }

    if let (Some(a), Some(b)) = (&source.role, &target.role) {
        if a == b {
            elements.push(format!("Similar role: {a}"));
        }
    }

    if elements.is_empty() {
        elements.push("Similar style".to_string());
    }
    elements
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillRelationship {
    Alternative,
    RelatedInCategory,
    CommonlyUsedTogether,
    Related,
}

impl SkillRelationship {
    pub fn between(source: &SkillCandidate, target: &SkillCandidate, score: f64) -> Self {
        if source.category_id == target.category_id {
            if score >= 0.9 {
                SkillRelationship::Alternative
            } else {
                SkillRelationship::RelatedInCategory
            }
        } else if score >= 0.85 {
            SkillRelationship::CommonlyUsedTogether
        } else {
            SkillRelationship::Related
        }
    }
}

pub fn category_label(skill: &SkillCandidate) -> &str {
    skill.category_name.as_deref().unwrap_or(UNCATEGORIZED)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillCluster {
    pub name: String,
    pub skills: Vec<String>,
    pub avg_similarity: f64,
}

/// Group scored skills by category; only groups of two or more form a cluster.
///
/// Clusters appear in the order their category first occurs in `scored`.
pub fn cluster_skills(scored: &[(&SkillCandidate, f64)]) -> Vec<SkillCluster> {
    scored
        .iter()
        .map(|(skill, _)| category_label(skill))
        .unique()
        .filter_map(|category| {
            let members: Vec<_> = scored
                .iter()
                .filter(|(skill, _)| category_label(skill) == category)
                .collect();
            if members.len() < 2 {
                return None;
            }
            let avg = members.iter().map(|(_, s)| s).sum::<f64>() / members.len() as f64;
            Some(SkillCluster {
                name: category.to_string(),
                skills: members.iter().map(|(s, _)| s.name.clone()).collect(),
                avg_similarity: avg,
            })
        })
        .collect()
}
