//! Core types for the matching domain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::models::{EntityId, UserId};

/// Dimensionality of the vectors produced by the embedding service (all-MiniLM-L6-v2).
pub const DEFAULT_DIMENSIONS: usize = 384;

/// A fixed-length embedding vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vector(Vec<f64>);

impl Vector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn dims(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// The kinds of entity that carry embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Talent,
    Project,
    Portfolio,
    Skill,
}

/// Named embedding columns stored on entity rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum EmbeddingField {
    #[serde(rename = "profile_embedding")]
    #[strum(serialize = "profile_embedding")]
    Profile,
    #[serde(rename = "skills_embedding")]
    #[strum(serialize = "skills_embedding")]
    Skills,
    #[serde(rename = "experience_embedding")]
    #[strum(serialize = "experience_embedding")]
    Experience,
    #[serde(rename = "requirements_embedding")]
    #[strum(serialize = "requirements_embedding")]
    Requirements,
    #[serde(rename = "required_skills_embedding")]
    #[strum(serialize = "required_skills_embedding")]
    RequiredSkills,
    #[serde(rename = "description_embedding")]
    #[strum(serialize = "description_embedding")]
    Description,
    #[serde(rename = "skill_embedding")]
    #[strum(serialize = "skill_embedding")]
    Skill,
}

impl EmbeddingField {
    /// Column name without the `_embedding` suffix, used as a breakdown label.
    pub fn short_name(&self) -> &'static str {
        match self {
            EmbeddingField::Profile => "profile",
            EmbeddingField::Skills => "skills",
            EmbeddingField::Experience => "experience",
            EmbeddingField::Requirements => "requirements",
            EmbeddingField::RequiredSkills => "required_skills",
            EmbeddingField::Description => "description",
            EmbeddingField::Skill => "skill",
        }
    }

    /// The entity kind whose rows carry this column.
    pub fn owner(&self) -> EntityKind {
        match self {
            EmbeddingField::Profile | EmbeddingField::Skills | EmbeddingField::Experience => {
                EntityKind::Talent
            }
            EmbeddingField::Requirements | EmbeddingField::RequiredSkills => EntityKind::Project,
            EmbeddingField::Description => EntityKind::Portfolio,
            EmbeddingField::Skill => EntityKind::Skill,
        }
    }
}

/// The embedding vectors stored on one entity, plus pipeline metadata.
///
/// `model` and `generated_at` are informational only; staleness is never checked here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embeddings {
    vectors: BTreeMap<EmbeddingField, Vector>,
    pub model: Option<String>,
    pub generated_at: Option<OffsetDateTime>,
}

impl Embeddings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: EmbeddingField, vector: impl Into<Vector>) -> Self {
        self.insert(field, vector);
        self
    }

    pub fn insert(&mut self, field: EmbeddingField, vector: impl Into<Vector>) {
        self.vectors.insert(field, vector.into());
    }

    pub fn get(&self, field: EmbeddingField) -> Option<&Vector> {
        self.vectors.get(&field)
    }

    pub fn has(&self, field: EmbeddingField) -> bool {
        self.vectors.contains_key(&field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProjectType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkType {
    Remote,
    Onsite,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BudgetType {
    Hourly,
    Fixed,
}

/// Anything the ranker can score: an id plus a set of stored embeddings.
pub trait Candidate {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    fn embeddings(&self) -> &Embeddings;
}

/// A talent profile as seen by the matcher.
#[derive(Debug, Clone)]
pub struct TalentCandidate {
    pub id: EntityId,
    /// Owning user account
    pub user_id: UserId,
    pub professional_title: String,
    pub summary: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub hourly_rate_min: Option<f64>,
    pub hourly_rate_max: Option<f64>,
    pub currency: Option<String>,
    pub is_available: bool,
    pub primary_category_id: Option<Uuid>,
    pub work_preferences: Vec<WorkType>,
    pub preferred_locations: Vec<String>,
    /// Names of the skills attached to the profile
    pub skill_names: Vec<String>,
    pub embeddings: Embeddings,
}

impl Candidate for TalentCandidate {
    const KIND: EntityKind = EntityKind::Talent;

    fn id(&self) -> EntityId {
        self.id
    }

    fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }
}

/// A recruiter project (casting call / job) as seen by the matcher.
#[derive(Debug, Clone)]
pub struct ProjectCandidate {
    pub id: EntityId,
    /// Recruiter user who owns the project
    pub recruiter_id: UserId,
    pub title: String,
    /// 'open', 'closed', 'draft', ...
    pub status: String,
    pub project_type: Option<ProjectType>,
    pub work_type: Option<WorkType>,
    pub experience_level: Option<ExperienceLevel>,
    pub budget_type: Option<BudgetType>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub budget_currency: Option<String>,
    pub duration: Option<String>,
    pub locations: Vec<String>,
    /// Names of required skills
    pub required_skills: Vec<String>,
    pub created_at: OffsetDateTime,
    pub embeddings: Embeddings,
}

impl Candidate for ProjectCandidate {
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> EntityId {
        self.id
    }

    fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioCandidate {
    pub id: EntityId,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub title: String,
    pub project_type: Option<String>,
    pub role: Option<String>,
    pub tags: Vec<String>,
    pub embeddings: Embeddings,
}

impl Candidate for PortfolioCandidate {
    const KIND: EntityKind = EntityKind::Portfolio;

    fn id(&self) -> EntityId {
        self.id
    }

    fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }
}

#[derive(Debug, Clone)]
pub struct SkillCandidate {
    pub id: EntityId,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub embeddings: Embeddings,
}

impl Candidate for SkillCandidate {
    const KIND: EntityKind = EntityKind::Skill;

    fn id(&self) -> EntityId {
        self.id
    }

    fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }
}
