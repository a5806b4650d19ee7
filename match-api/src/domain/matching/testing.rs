//! Candidate factories shared by the matching tests.

use time::OffsetDateTime;
use uuid::Uuid;

use super::types::{
    EmbeddingField, Embeddings, PortfolioCandidate, ProjectCandidate, SkillCandidate,
    TalentCandidate,
};
use crate::domain::models::{EntityId, UserId};

pub fn id(n: u128) -> EntityId {
    EntityId::new(Uuid::from_u128(n))
}

pub fn user(n: u128) -> UserId {
    UserId::new(Uuid::from_u128(0x1000 + n))
}

/// Talent with only a `profile_embedding`.
pub fn talent(n: u128, profile: Vec<f64>) -> TalentCandidate {
    TalentCandidate {
        id: id(n),
        user_id: user(n),
        professional_title: format!("Talent {n}"),
        summary: None,
        experience_level: None,
        hourly_rate_min: None,
        hourly_rate_max: None,
        currency: Some("USD".to_string()),
        is_available: true,
        primary_category_id: None,
        work_preferences: vec![],
        preferred_locations: vec![],
        skill_names: vec![],
        embeddings: Embeddings::new().with(EmbeddingField::Profile, profile),
    }
}

/// Open project with only a `requirements_embedding`.
pub fn project(n: u128, requirements: Vec<f64>) -> ProjectCandidate {
    ProjectCandidate {
        id: id(n),
        recruiter_id: user(n),
        title: format!("Project {n}"),
        status: "open".to_string(),
        project_type: None,
        work_type: None,
        experience_level: None,
        budget_type: None,
        budget_min: None,
        budget_max: None,
        budget_currency: Some("USD".to_string()),
        duration: None,
        locations: vec![],
        required_skills: vec![],
        created_at: OffsetDateTime::now_utc(),
        embeddings: Embeddings::new().with(EmbeddingField::Requirements, requirements),
    }
}

pub fn portfolio(n: u128, description: Vec<f64>) -> PortfolioCandidate {
    PortfolioCandidate {
        id: id(n),
        user_id: user(n),
        user_name: Some(format!("User {n}")),
        title: format!("Portfolio {n}"),
        project_type: None,
        role: None,
        tags: vec![],
        embeddings: Embeddings::new().with(EmbeddingField::Description, description),
    }
}

pub fn skill(n: u128, embedding: Vec<f64>) -> SkillCandidate {
    SkillCandidate {
        id: id(n),
        name: format!("Skill {n}"),
        category_id: None,
        category_name: None,
        embeddings: Embeddings::new().with(EmbeddingField::Skill, embedding),
    }
}

/// Unit-length 2-d vector pointing at `(x, y)`.
pub fn unit(x: f64, y: f64) -> Vec<f64> {
    let norm = (x * x + y * y).sqrt();
    vec![x / norm, y / norm]
}
