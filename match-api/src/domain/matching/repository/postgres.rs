//! PostgreSQL candidate repository.
//!
//! Embedding columns are `jsonb` arrays; they are decoded through
//! [`VectorCodec`] so a malformed or wrongly-sized vector fails the request
//! with the owning entity's id attached.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::domain::matching::codec::VectorCodec;
use crate::domain::matching::traits::{CandidateRepository, Result};
use crate::domain::matching::types::{
    EmbeddingField, Embeddings, PortfolioCandidate, ProjectCandidate, SkillCandidate,
    TalentCandidate,
};
use crate::domain::models::{EntityId, UserId};

const TALENT_SELECT: &str = r#"
    SELECT
        t.id,
        t.user_id,
        t.professional_title,
        t.summary,
        t.experience_level,
        t.hourly_rate_min,
        t.hourly_rate_max,
        t.currency,
        t.is_available,
        t.primary_category_id,
        t.work_preferences,
        t.preferred_locations,
        COALESCE(
            (SELECT array_agg(s.name ORDER BY s.name)
             FROM talent_skills ts
             JOIN skills s ON s.id = ts.skill_id
             WHERE ts.talent_id = t.id),
            '{}'::text[]
        ) AS skill_names,
        t.profile_embedding,
        t.skills_embedding,
        t.experience_embedding,
        t.embedding_model,
        t.embeddings_generated_at
    FROM talent_profiles t
"#;

const PROJECT_SELECT: &str = r#"
    SELECT
        id,
        recruiter_id,
        title,
        status,
        project_type,
        work_type,
        experience_level,
        budget_type,
        budget_min,
        budget_max,
        budget_currency,
        duration,
        locations,
        required_skills,
        created_at,
        requirements_embedding,
        required_skills_embedding,
        embedding_model,
        embeddings_generated_at
    FROM projects
"#;

const PORTFOLIO_SELECT: &str = r#"
    SELECT
        p.id,
        p.user_id,
        u.name AS user_name,
        p.title,
        p.project_type,
        p.role,
        p.tags,
        p.description_embedding,
        p.embedding_model,
        p.embeddings_generated_at
    FROM portfolios p
    LEFT JOIN users u ON u.id = p.user_id
"#;

const SKILL_SELECT: &str = r#"
    SELECT
        s.id,
        s.name,
        s.category_id,
        c.name AS category_name,
        s.skill_embedding,
        s.embedding_model,
        s.embeddings_generated_at
    FROM skills s
    LEFT JOIN skill_categories c ON c.id = s.category_id
"#;

/// PostgreSQL-backed candidate repository.
#[derive(Clone)]
pub struct PgCandidateRepository {
    pool: PgPool,
    codec: VectorCodec,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool, codec: VectorCodec) -> Self {
        Self { pool, codec }
    }

    async fn talents(&self, clause: &str, id: Option<Uuid>) -> Result<Vec<TalentCandidate>> {
        let sql = format!("{TALENT_SELECT} {clause}");
        let rows = sqlx::query_as::<_, TalentRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| r.into_candidate(&self.codec)).collect()
    }

    async fn projects(&self, clause: &str, id: Option<Uuid>) -> Result<Vec<ProjectCandidate>> {
        let sql = format!("{PROJECT_SELECT} {clause}");
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| r.into_candidate(&self.codec)).collect()
    }

    async fn portfolios(&self, clause: &str, id: Option<Uuid>) -> Result<Vec<PortfolioCandidate>> {
        let sql = format!("{PORTFOLIO_SELECT} {clause}");
        let rows = sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| r.into_candidate(&self.codec)).collect()
    }

    async fn skills(&self, clause: &str, id: Option<Uuid>) -> Result<Vec<SkillCandidate>> {
        let sql = format!("{SKILL_SELECT} {clause}");
        let rows = sqlx::query_as::<_, SkillRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| r.into_candidate(&self.codec)).collect()
    }
}

// Every clause references $1 so the same bind works for lookups and pools.
fn by_id(alias: &str) -> String {
    format!("WHERE {alias}id = $1")
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn talent(&self, id: EntityId) -> Result<Option<TalentCandidate>> {
        let rows = self.talents(&by_id("t."), Some(*id.as_uuid())).await?;
        Ok(rows.into_iter().next())
    }

    async fn project(&self, id: EntityId) -> Result<Option<ProjectCandidate>> {
        let rows = self.projects(&by_id(""), Some(*id.as_uuid())).await?;
        Ok(rows.into_iter().next())
    }

    async fn portfolio(&self, id: EntityId) -> Result<Option<PortfolioCandidate>> {
        let rows = self.portfolios(&by_id("p."), Some(*id.as_uuid())).await?;
        Ok(rows.into_iter().next())
    }

    async fn skill(&self, id: EntityId) -> Result<Option<SkillCandidate>> {
        let rows = self.skills(&by_id("s."), Some(*id.as_uuid())).await?;
        Ok(rows.into_iter().next())
    }

    async fn talent_pool(&self) -> Result<Vec<TalentCandidate>> {
        self.talents("WHERE $1::uuid IS NULL", None).await
    }

    async fn open_project_pool(&self) -> Result<Vec<ProjectCandidate>> {
        self.projects("WHERE $1::uuid IS NULL AND status = 'open'", None)
            .await
    }

    async fn portfolio_pool(&self) -> Result<Vec<PortfolioCandidate>> {
        self.portfolios("WHERE $1::uuid IS NULL", None).await
    }

    async fn skill_pool(&self) -> Result<Vec<SkillCandidate>> {
        self.skills("WHERE $1::uuid IS NULL", None).await
    }

    async fn applied_project_ids(&self, talent_user: UserId) -> Result<Vec<EntityId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT project_id FROM applications WHERE talent_id = $1",
        )
        .bind(talent_user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(EntityId::new).collect())
    }
}

/// Decode the present embedding columns of one row.
///
/// SQL NULL and JSON `null` both mean "not generated yet".
fn decode_embeddings(
    codec: &VectorCodec,
    id: EntityId,
    model: Option<String>,
    generated_at: Option<OffsetDateTime>,
    columns: Vec<(EmbeddingField, Option<Value>)>,
) -> Result<Embeddings> {
    let mut embeddings = Embeddings::new();
    embeddings.model = model;
    embeddings.generated_at = generated_at;

    for (field, raw) in columns {
        match raw {
            None | Some(Value::Null) => {}
            Some(raw) => {
                let vector = codec.decode(&raw).map_err(|e| e.for_entity(id))?;
                embeddings.insert(field, vector);
            }
        }
    }

    Ok(embeddings)
}

/// Parse a stored enum value; unknown spellings are logged and treated as unset.
fn parse_column<T: FromStr>(value: Option<String>, column: &str, id: EntityId) -> Option<T> {
    let raw = value?;
    match raw.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(entity_id = %id, column, value = %raw, "Ignoring unrecognised column value");
            None
        }
    }
}

fn parse_all<T: FromStr>(values: Vec<String>, column: &str, id: EntityId) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|v| parse_column(Some(v), column, id))
        .collect()
}

#[derive(sqlx::FromRow)]
struct TalentRow {
    id: Uuid,
    user_id: Uuid,
    professional_title: String,
    summary: Option<String>,
    experience_level: Option<String>,
    hourly_rate_min: Option<f64>,
    hourly_rate_max: Option<f64>,
    currency: Option<String>,
    is_available: bool,
    primary_category_id: Option<Uuid>,
    work_preferences: Vec<String>,
    preferred_locations: Vec<String>,
    skill_names: Vec<String>,
    profile_embedding: Option<Value>,
    skills_embedding: Option<Value>,
    experience_embedding: Option<Value>,
    embedding_model: Option<String>,
    embeddings_generated_at: Option<OffsetDateTime>,
}

impl TalentRow {
    fn into_candidate(self, codec: &VectorCodec) -> Result<TalentCandidate> {
        let id = EntityId::new(self.id);
        let embeddings = decode_embeddings(
            codec,
            id,
            self.embedding_model,
            self.embeddings_generated_at,
            vec![
                (EmbeddingField::Profile, self.profile_embedding),
                (EmbeddingField::Skills, self.skills_embedding),
                (EmbeddingField::Experience, self.experience_embedding),
            ],
        )?;

        Ok(TalentCandidate {
            id,
            user_id: UserId::new(self.user_id),
            professional_title: self.professional_title,
            summary: self.summary,
            experience_level: parse_column(self.experience_level, "experience_level", id),
            hourly_rate_min: self.hourly_rate_min,
            hourly_rate_max: self.hourly_rate_max,
            currency: self.currency,
            is_available: self.is_available,
            primary_category_id: self.primary_category_id,
            work_preferences: parse_all(self.work_preferences, "work_preferences", id),
            preferred_locations: self.preferred_locations,
            skill_names: self.skill_names,
            embeddings,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    recruiter_id: Uuid,
    title: String,
    status: String,
    project_type: Option<String>,
    work_type: Option<String>,
    experience_level: Option<String>,
    budget_type: Option<String>,
    budget_min: Option<f64>,
    budget_max: Option<f64>,
    budget_currency: Option<String>,
    duration: Option<String>,
    locations: Vec<String>,
    required_skills: Vec<String>,
    created_at: OffsetDateTime,
    requirements_embedding: Option<Value>,
    required_skills_embedding: Option<Value>,
    embedding_model: Option<String>,
    embeddings_generated_at: Option<OffsetDateTime>,
}

impl ProjectRow {
    fn into_candidate(self, codec: &VectorCodec) -> Result<ProjectCandidate> {
        let id = EntityId::new(self.id);
        let embeddings = decode_embeddings(
            codec,
            id,
            self.embedding_model,
            self.embeddings_generated_at,
            vec![
                (EmbeddingField::Requirements, self.requirements_embedding),
                (EmbeddingField::RequiredSkills, self.required_skills_embedding),
            ],
        )?;

        Ok(ProjectCandidate {
            id,
            recruiter_id: UserId::new(self.recruiter_id),
            title: self.title,
            status: self.status,
            project_type: parse_column(self.project_type, "project_type", id),
            work_type: parse_column(self.work_type, "work_type", id),
            experience_level: parse_column(self.experience_level, "experience_level", id),
            budget_type: parse_column(self.budget_type, "budget_type", id),
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            budget_currency: self.budget_currency,
            duration: self.duration,
            locations: self.locations,
            required_skills: self.required_skills,
            created_at: self.created_at,
            embeddings,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PortfolioRow {
    id: Uuid,
    user_id: Uuid,
    user_name: Option<String>,
    title: String,
    project_type: Option<String>,
    role: Option<String>,
    tags: Vec<String>,
    description_embedding: Option<Value>,
    embedding_model: Option<String>,
    embeddings_generated_at: Option<OffsetDateTime>,
}

impl PortfolioRow {
    fn into_candidate(self, codec: &VectorCodec) -> Result<PortfolioCandidate> {
        let id = EntityId::new(self.id);
        let embeddings = decode_embeddings(
            codec,
            id,
            self.embedding_model,
            self.embeddings_generated_at,
            vec![(EmbeddingField::Description, self.description_embedding)],
        )?;

        Ok(PortfolioCandidate {
            id,
            user_id: UserId::new(self.user_id),
            user_name: self.user_name,
            title: self.title,
            project_type: self.project_type,
            role: self.role,
            tags: self.tags,
            embeddings,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SkillRow {
    id: Uuid,
    name: String,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    skill_embedding: Option<Value>,
    embedding_model: Option<String>,
    embeddings_generated_at: Option<OffsetDateTime>,
}

impl SkillRow {
    fn into_candidate(self, codec: &VectorCodec) -> Result<SkillCandidate> {
        let id = EntityId::new(self.id);
        let embeddings = decode_embeddings(
            codec,
            id,
            self.embedding_model,
            self.embeddings_generated_at,
            vec![(EmbeddingField::Skill, self.skill_embedding)],
        )?;

        Ok(SkillCandidate {
            id,
            name: self.name,
            category_id: self.category_id,
            category_name: self.category_name,
            embeddings,
        })
    }
}
