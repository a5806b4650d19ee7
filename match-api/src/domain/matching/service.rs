//! Matching service: the public operations composed from embedder, repository and ranker.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;

use super::cancellation::CancellationToken;
use super::filter::{CandidateFilter, FilterSet};
use super::insights;
use super::ranker::{MatchRanker, RankOutcome, ScoringPlan};
use super::request::MatchRequest;
use super::results::{
    elapsed_ms, round_score, ProjectRecommendation, ProjectTalentMatch, ProjectTalentMatches,
    Recommendation, Recommendations, RelatedSkill, RelatedSkills, SimilarPortfolio,
    SimilarPortfolios, TalentMatch, TalentProjectMatches, TalentSearchResults,
};
use super::traits::{CandidateRepository, MatchError, QueryEmbedder, Result};
use super::types::{
    Candidate, EmbeddingField, EntityKind, PortfolioCandidate, ProjectCandidate, SkillCandidate,
    TalentCandidate, Vector,
};
use crate::domain::models::EntityId;

/// One weighted comparison between a source embedding and a candidate embedding.
///
/// `source` names a field of the source entity; it is absent for free-text
/// search, where the query embedding is used instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldPairing {
    #[serde(default)]
    pub source: Option<EmbeddingField>,
    pub target: EmbeddingField,
    pub weight: f64,
    /// Breakdown label; defaults to the talent-side field's short name
    #[serde(default)]
    pub label: Option<String>,
}

impl FieldPairing {
    pub fn new(source: Option<EmbeddingField>, target: EmbeddingField, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
            label: None,
        }
    }

    fn label_or(&self, default: EmbeddingField) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| default.short_name().to_string())
    }
}

/// Configuration for the matching service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Ceiling for talent/project result counts
    pub max_limit: usize,
    /// Ceiling for portfolio, skill and recommendation result counts
    pub max_similar_limit: usize,
    pub talent_search: Vec<FieldPairing>,
    pub project_to_talent: Vec<FieldPairing>,
    pub talent_to_project: Vec<FieldPairing>,
    pub recommendations: Vec<FieldPairing>,
    /// Weight of the work-preference alignment term in recommendations
    pub preference_weight: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        use EmbeddingField::*;
        Self {
            max_limit: 100,
            max_similar_limit: 50,
            talent_search: vec![FieldPairing::new(None, Profile, 1.0)],
            project_to_talent: vec![FieldPairing::new(Some(Requirements), Profile, 1.0)],
            talent_to_project: vec![FieldPairing::new(Some(Profile), Requirements, 1.0)],
            recommendations: vec![
                FieldPairing::new(Some(Profile), Requirements, 0.3),
                FieldPairing::new(Some(Skills), RequiredSkills, 0.3),
                FieldPairing::new(Some(Experience), Requirements, 0.2),
            ],
            preference_weight: 0.2,
        }
    }
}

impl MatchingConfig {
    /// Check that every plan compares fields of the right entity kinds.
    pub fn validate(&self) -> Result<()> {
        check_plan(
            "matching.talent_search",
            &self.talent_search,
            None,
            EntityKind::Talent,
        )?;
        check_plan(
            "matching.project_to_talent",
            &self.project_to_talent,
            Some(EntityKind::Project),
            EntityKind::Talent,
        )?;
        check_plan(
            "matching.talent_to_project",
            &self.talent_to_project,
            Some(EntityKind::Talent),
            EntityKind::Project,
        )?;
        check_plan(
            "matching.recommendations",
            &self.recommendations,
            Some(EntityKind::Talent),
            EntityKind::Project,
        )?;
        if !self.preference_weight.is_finite() || self.preference_weight < 0.0 {
            return Err(MatchError::invalid_argument(
                "matching.preference_weight",
                "must be a non-negative number",
            ));
        }
        if self.max_limit == 0 || self.max_similar_limit == 0 {
            return Err(MatchError::invalid_argument(
                "matching.max_limit",
                "limits must be at least 1",
            ));
        }
        Ok(())
    }
}

fn check_plan(
    name: &'static str,
    plan: &[FieldPairing],
    source: Option<EntityKind>,
    target: EntityKind,
) -> Result<()> {
    if plan.is_empty() {
        return Err(MatchError::invalid_argument(name, "needs at least one field"));
    }
    for pairing in plan {
        if !pairing.weight.is_finite() || pairing.weight <= 0.0 {
            return Err(MatchError::invalid_argument(name, "weights must be positive"));
        }
        if pairing.target.owner() != target {
            return Err(MatchError::invalid_argument(
                name,
                format!("{} is not a {target} field", pairing.target),
            ));
        }
        match (source, pairing.source) {
            (None, None) => {}
            (Some(kind), Some(field)) if field.owner() == kind => {}
            (None, Some(field)) => {
                return Err(MatchError::invalid_argument(
                    name,
                    format!("free-text plans take no source field, got {field}"),
                ))
            }
            (Some(kind), _) => {
                return Err(MatchError::invalid_argument(
                    name,
                    format!("every pairing needs a {kind} source field"),
                ))
            }
        }
    }
    Ok(())
}

/// Which side of a pairing names the breakdown label.
#[derive(Clone, Copy)]
enum LabelSide {
    Source,
    Target,
}

/// Build a scoring plan from `source`'s stored embeddings.
fn source_plan<S: Candidate, C>(
    source: &S,
    pairings: &[FieldPairing],
    labels: LabelSide,
) -> Result<ScoringPlan<C>> {
    let mut plan = ScoringPlan::new();
    for pairing in pairings {
        let field = pairing.source.ok_or_else(|| {
            MatchError::Internal(format!("{} plan is missing a source field", S::KIND))
        })?;
        let vector = source
            .embeddings()
            .get(field)
            .cloned()
            .ok_or(MatchError::SourceNotEmbedded {
                kind: S::KIND,
                id: source.id(),
            })?;
        let label = match labels {
            LabelSide::Source => pairing.label_or(field),
            LabelSide::Target => pairing.label_or(pairing.target),
        };
        plan = plan.vector(label, vector, pairing.target, pairing.weight);
    }
    Ok(plan)
}

fn query_plan<C>(query: &Vector, pairings: &[FieldPairing]) -> ScoringPlan<C> {
    pairings.iter().fold(ScoringPlan::new(), |plan, pairing| {
        plan.vector(
            pairing.label_or(pairing.target),
            query.clone(),
            pairing.target,
            pairing.weight,
        )
    })
}

/// Matching service exposing the six matching operations.
///
/// Holds its collaborators behind trait objects so handlers can share one
/// instance and tests can swap in mocks.
#[derive(Clone)]
pub struct MatchingService {
    embedder: Arc<dyn QueryEmbedder>,
    repository: Arc<dyn CandidateRepository>,
    config: MatchingConfig,
}

impl MatchingService {
    pub fn new(
        embedder: Arc<dyn QueryEmbedder>,
        repository: Arc<dyn CandidateRepository>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            embedder,
            repository,
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub async fn talent(&self, id: EntityId) -> Result<TalentCandidate> {
        self.repository
            .talent(id)
            .await?
            .ok_or(MatchError::NotFound {
                kind: EntityKind::Talent,
                id,
            })
    }

    pub async fn project(&self, id: EntityId) -> Result<ProjectCandidate> {
        self.repository
            .project(id)
            .await?
            .ok_or(MatchError::NotFound {
                kind: EntityKind::Project,
                id,
            })
    }

    pub async fn portfolio(&self, id: EntityId) -> Result<PortfolioCandidate> {
        self.repository
            .portfolio(id)
            .await?
            .ok_or(MatchError::NotFound {
                kind: EntityKind::Portfolio,
                id,
            })
    }

    pub async fn skill(&self, id: EntityId) -> Result<SkillCandidate> {
        self.repository
            .skill(id)
            .await?
            .ok_or(MatchError::NotFound {
                kind: EntityKind::Skill,
                id,
            })
    }

    fn ranker(&self, request: &MatchRequest, max: usize) -> MatchRanker {
        MatchRanker::new(
            self.embedder.dimensions(),
            request.min_similarity,
            request.clamped_limit(max),
        )
    }

    /// Run the CPU-bound ranking pass on the blocking pool.
    ///
    /// Dropping the returned future cancels the pass.
    async fn rank<C>(
        &self,
        ranker: MatchRanker,
        pool: Vec<C>,
        filters: FilterSet,
        plan: ScoringPlan<C>,
    ) -> Result<RankOutcome<C>>
    where
        C: CandidateFilter + Send + 'static,
    {
        let token = CancellationToken::new();
        let guard = token.drop_guard();
        let ranker = ranker.with_cancellation(token);

        let outcome = tokio::task::spawn_blocking(move || ranker.rank(pool, &filters, &plan))
            .await
            .map_err(|e| MatchError::Internal(format!("ranking task failed: {e}")))?;

        guard.disarm();
        outcome
    }

    /// Natural-language talent search.
    pub async fn search_talents(
        &self,
        query: &str,
        request: MatchRequest,
    ) -> Result<TalentSearchResults> {
        let started = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(MatchError::invalid_argument("query", "must not be empty"));
        }
        request.filters.validate_for(EntityKind::Talent)?;

        let vector = self.embedder.embed(query).await?;
        let plan = query_plan(&vector, &self.config.talent_search);
        let pool = self.repository.talent_pool().await?;

        let ranker = self.ranker(&request, self.config.max_limit);
        let filters_applied = !request.filters.is_empty();
        let outcome = self.rank(ranker, pool, request.filters, plan).await?;

        let total = outcome.stats.matched;
        let results: Vec<_> = outcome.matches.into_iter().map(TalentMatch::from).collect();
        let execution_time_ms = elapsed_ms(started);
        info!(
            op = "search_talents",
            total,
            returned = results.len(),
            execution_time_ms,
            "Talent search completed"
        );

        Ok(TalentSearchResults {
            results,
            total,
            query: query.to_string(),
            execution_time_ms,
            filters_applied,
        })
    }

    /// Rank talents against a project's stored requirements.
    pub async fn match_talents_to_project(
        &self,
        project: &ProjectCandidate,
        request: MatchRequest,
    ) -> Result<ProjectTalentMatches> {
        let started = Instant::now();
        request.filters.validate_for(EntityKind::Talent)?;
        let plan = source_plan(project, &self.config.project_to_talent, LabelSide::Target)?;

        let pool = self.repository.talent_pool().await?;
        let total_analyzed = pool.len();

        let ranker = self.ranker(&request, self.config.max_limit);
        let outcome = self.rank(ranker, pool, request.filters, plan).await?;

        let total_matched = outcome.stats.matched;
        let matches: Vec<_> = outcome
            .matches
            .into_iter()
            .map(|m| ProjectTalentMatch::new(m, project))
            .collect();
        let execution_time_ms = elapsed_ms(started);
        info!(
            op = "match_talents_to_project",
            project_id = %project.id,
            total_analyzed,
            total_matched,
            execution_time_ms,
            "Project matching completed"
        );

        Ok(ProjectTalentMatches {
            project: project.into(),
            matches,
            total_analyzed,
            total_matched,
            execution_time_ms,
        })
    }

    /// Rank open projects against a talent's stored profile.
    pub async fn match_projects_to_talent(
        &self,
        talent: &TalentCandidate,
        request: MatchRequest,
    ) -> Result<TalentProjectMatches> {
        let started = Instant::now();
        request.filters.validate_for(EntityKind::Project)?;
        let plan = source_plan(talent, &self.config.talent_to_project, LabelSide::Source)?;

        let pool = self.repository.open_project_pool().await?;
        let ranker = self.ranker(&request, self.config.max_limit);
        let outcome = self.rank(ranker, pool, request.filters, plan).await?;

        let total = outcome.stats.matched;
        let recommended_projects: Vec<_> = outcome
            .matches
            .into_iter()
            .map(|m| ProjectRecommendation::new(m, talent))
            .collect();
        let execution_time_ms = elapsed_ms(started);
        info!(
            op = "match_projects_to_talent",
            talent_id = %talent.id,
            total,
            execution_time_ms,
            "Talent matching completed"
        );

        Ok(TalentProjectMatches {
            talent: talent.into(),
            recommended_projects,
            total,
            execution_time_ms,
        })
    }

    /// Portfolios whose descriptions resemble `source`, never including `source`.
    pub async fn find_similar_portfolios(
        &self,
        source: &PortfolioCandidate,
        request: MatchRequest,
    ) -> Result<SimilarPortfolios> {
        let started = Instant::now();
        request.filters.validate_for(EntityKind::Portfolio)?;
        let plan = ScoringPlan::single(
            EmbeddingField::Description,
            embedding_of(source, EmbeddingField::Description)?,
        );

        let pool = self.repository.portfolio_pool().await?;
        let ranker = self
            .ranker(&request, self.config.max_similar_limit)
            .excluding(source.id);
        let outcome = self.rank(ranker, pool, request.filters, plan).await?;

        let total = outcome.stats.matched;
        let similar_portfolios: Vec<_> = outcome
            .matches
            .into_iter()
            .map(|m| SimilarPortfolio::new(m, source))
            .collect();
        let execution_time_ms = elapsed_ms(started);
        info!(
            op = "find_similar_portfolios",
            portfolio_id = %source.id,
            total,
            execution_time_ms,
            "Portfolio similarity completed"
        );

        Ok(SimilarPortfolios {
            source_portfolio: source.into(),
            similar_portfolios,
            total,
            execution_time_ms,
        })
    }

    /// Skills semantically close to `source`, grouped into category clusters.
    pub async fn find_related_skills(
        &self,
        source: &SkillCandidate,
        request: MatchRequest,
    ) -> Result<RelatedSkills> {
        let started = Instant::now();
        request.filters.validate_for(EntityKind::Skill)?;
        let plan = ScoringPlan::single(
            EmbeddingField::Skill,
            embedding_of(source, EmbeddingField::Skill)?,
        );

        let pool = self.repository.skill_pool().await?;
        let ranker = self
            .ranker(&request, self.config.max_similar_limit)
            .excluding(source.id);
        let outcome = self.rank(ranker, pool, request.filters, plan).await?;

        let scored: Vec<_> = outcome
            .matches
            .iter()
            .map(|m| (&m.candidate, m.score))
            .collect();
        let clusters = insights::cluster_skills(&scored)
            .into_iter()
            .map(|mut c| {
                c.avg_similarity = round_score(c.avg_similarity);
                c
            })
            .collect();
        let related_skills: Vec<_> = outcome
            .matches
            .iter()
            .map(|m| RelatedSkill::new(m, source))
            .collect();

        let total = outcome.stats.matched;
        let execution_time_ms = elapsed_ms(started);
        info!(
            op = "find_related_skills",
            skill_id = %source.id,
            total,
            execution_time_ms,
            "Skill similarity completed"
        );

        Ok(RelatedSkills {
            skill: source.into(),
            related_skills,
            clusters,
            total,
            execution_time_ms,
        })
    }

    /// Personalised open-project recommendations, skipping projects the
    /// talent already applied to.
    pub async fn recommendations(
        &self,
        talent: &TalentCandidate,
        limit: usize,
    ) -> Result<Recommendations> {
        let started = Instant::now();
        let request = MatchRequest::new(limit, 0.0)?;

        let preference_source = talent.clone();
        let plan = source_plan(talent, &self.config.recommendations, LabelSide::Source)?
            .attribute(
                "preferences",
                self.config.preference_weight,
                move |project: &ProjectCandidate| {
                    insights::preferences_score(&preference_source, project)
                },
            );

        let applied = self.repository.applied_project_ids(talent.user_id).await?;
        let pool: Vec<_> = self
            .repository
            .open_project_pool()
            .await?
            .into_iter()
            .filter(|p| !applied.contains(&p.id))
            .collect();

        let ranker = self.ranker(&request, self.config.max_similar_limit);
        let outcome = self.rank(ranker, pool, FilterSet::new(), plan).await?;

        let now = OffsetDateTime::now_utc();
        let total = outcome.stats.matched;
        let recommendations: Vec<_> = outcome
            .matches
            .into_iter()
            .map(|m| Recommendation::new(m, talent, now))
            .collect();
        let execution_time_ms = elapsed_ms(started);
        info!(
            op = "recommendations",
            talent_id = %talent.id,
            excluded_applied = applied.len(),
            total,
            execution_time_ms,
            "Recommendations generated"
        );

        Ok(Recommendations {
            recommendations,
            personalization_factors: self.personalization_factors(),
            total,
            execution_time_ms,
        })
    }

    fn personalization_factors(&self) -> BTreeMap<String, f64> {
        let mut factors = BTreeMap::new();
        for pairing in &self.config.recommendations {
            let label = pairing.label_or(pairing.source.unwrap_or(pairing.target));
            *factors.entry(format!("based_on_{label}")).or_insert(0.0) += pairing.weight;
        }
        factors.insert(
            "based_on_preferences".to_string(),
            self.config.preference_weight,
        );
        factors
    }
}

fn embedding_of<S: Candidate>(source: &S, field: EmbeddingField) -> Result<Vector> {
    source
        .embeddings()
        .get(field)
        .cloned()
        .ok_or(MatchError::SourceNotEmbedded {
            kind: S::KIND,
            id: source.id(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matching::embedder::MockEmbedder;
    use crate::domain::matching::filter::FilterPredicate;
    use crate::domain::matching::repository::MockCandidateRepository;
    use crate::domain::matching::testing::{id, portfolio, project, skill, talent, unit, user};
    use crate::domain::matching::types::{Embeddings, ExperienceLevel, WorkType};

    fn service(embedder: MockEmbedder, repo: MockCandidateRepository) -> MatchingService {
        MatchingService::new(Arc::new(embedder), Arc::new(repo), MatchingConfig::default())
    }

    fn abc_talents() -> Vec<TalentCandidate> {
        vec![
            talent(1, vec![1.0, 0.0]),
            talent(2, unit(0.9, 0.1)),
            talent(3, vec![0.0, 1.0]),
        ]
    }

    fn request(limit: usize, min_similarity: f64) -> MatchRequest {
        MatchRequest::new(limit, min_similarity).unwrap()
    }

    #[tokio::test]
    async fn search_ranks_and_thresholds() {
        let embedder = MockEmbedder::returning(vec![1.0, 0.0]);
        let svc = service(
            embedder.clone(),
            MockCandidateRepository::new().with_talents(abc_talents()),
        );

        let results = svc
            .search_talents("  rust engineer ", request(10, 0.5))
            .await
            .unwrap();

        let ids: Vec<_> = results.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![id(1), id(2)]);
        assert_eq!(results.results[0].similarity_score, 1.0);
        assert_eq!(results.results[1].similarity_score, 0.9939);
        assert_eq!(results.total, 2);
        assert_eq!(results.query, "rust engineer");
        assert!(!results.filters_applied);
        assert_eq!(embedder.call_count(), 1);
    }

    #[tokio::test]
    async fn weighted_search_plan_reports_skill_and_experience_reasons() {
        use EmbeddingField::*;
        let config = MatchingConfig {
            talent_search: vec![
                FieldPairing::new(None, Profile, 0.4),
                FieldPairing::new(None, Skills, 0.4),
                FieldPairing::new(None, Experience, 0.2),
            ],
            ..MatchingConfig::default()
        };
        assert!(config.validate().is_ok());

        let mut t = talent(1, vec![1.0, 0.0]);
        t.embeddings.insert(Skills, vec![1.0, 0.0]);
        t.embeddings.insert(Experience, vec![1.0, 0.0]);
        let svc = MatchingService::new(
            Arc::new(MockEmbedder::returning(vec![1.0, 0.0])),
            Arc::new(MockCandidateRepository::new().with_talents(vec![t])),
            config,
        );

        let results = svc
            .search_talents("rust engineer", request(10, 0.5))
            .await
            .unwrap();

        let reasons = &results.results[0].match_reasons;
        assert_eq!(reasons[0], "Strong skills match (1.00)");
        assert_eq!(reasons[1], "Relevant experience (1.00)");
        assert_eq!(reasons[2], "Profile alignment (1.00)");
    }

    #[tokio::test]
    async fn qualifying_talent_below_threshold_is_empty_not_error() {
        let mut talents = abc_talents();
        talents[2].experience_level = Some(ExperienceLevel::Expert);
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new().with_talents(talents),
        );
        let req = request(10, 0.5).with_filters(
            FilterSet::new().with(FilterPredicate::ExperienceLevel(ExperienceLevel::Expert)),
        );

        let results = svc.search_talents("expert", req).await.unwrap();
        assert!(results.results.is_empty());
        assert_eq!(results.total, 0);
        assert!(results.filters_applied);
    }

    #[tokio::test]
    async fn embedding_failure_is_not_an_empty_result() {
        let svc = service(
            MockEmbedder::failing("timeout"),
            MockCandidateRepository::new().with_talents(abc_talents()),
        );
        let err = svc
            .search_talents("designer", request(10, 0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn bad_filters_fail_before_embedding() {
        let embedder = MockEmbedder::returning(vec![1.0, 0.0]);
        let svc = service(embedder.clone(), MockCandidateRepository::new());
        let req = request(10, 0.5)
            .with_filters(FilterSet::new().with(FilterPredicate::WorkType(WorkType::Remote)));

        let err = svc.search_talents("designer", req).await.unwrap_err();
        assert!(matches!(err, MatchError::UnknownFilterKey { .. }));
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_query_is_invalid() {
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new(),
        );
        let err = svc.search_talents("   ", request(10, 0.5)).await.unwrap_err();
        assert!(matches!(err, MatchError::InvalidArgument { field: "query", .. }));
    }

    #[tokio::test]
    async fn limit_is_clamped_to_max() {
        let talents = (1..=120).map(|n| talent(n, vec![1.0, 0.0])).collect();
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new().with_talents(talents),
        );
        let results = svc
            .search_talents("anyone", request(500, 0.0))
            .await
            .unwrap();
        assert_eq!(results.results.len(), 100);
        assert_eq!(results.total, 120);
    }

    #[tokio::test]
    async fn repository_failure_propagates() {
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new().failing("connection refused"),
        );
        let err = svc
            .search_talents("anyone", request(10, 0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::Repository(_)));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn project_to_talent_uses_stored_requirements() {
        let embedder = MockEmbedder::returning(vec![0.0, 1.0]);
        let svc = service(
            embedder.clone(),
            MockCandidateRepository::new().with_talents(abc_talents()),
        );
        let source = project(10, vec![1.0, 0.0]);

        let result = svc
            .match_talents_to_project(&source, request(20, 0.6))
            .await
            .unwrap();

        assert_eq!(embedder.call_count(), 0);
        assert_eq!(result.total_analyzed, 3);
        assert_eq!(result.total_matched, 2);
        assert_eq!(result.matches[0].talent_id, id(1));
        assert!(result.matches[0].breakdown.contains_key("profile"));
        assert_eq!(result.project.id, id(10));
    }

    #[tokio::test]
    async fn source_without_embedding_is_reported() {
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new().with_talents(abc_talents()),
        );
        let mut source = project(10, vec![1.0, 0.0]);
        source.embeddings = Embeddings::new();

        let err = svc
            .match_talents_to_project(&source, request(20, 0.6))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MatchError::SourceNotEmbedded { kind: EntityKind::Project, id: e } if e == id(10)
        ));
    }

    #[tokio::test]
    async fn talent_to_project_only_sees_open_projects() {
        let mut closed = project(11, vec![1.0, 0.0]);
        closed.status = "closed".into();
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new()
                .with_projects(vec![project(10, vec![1.0, 0.0]), closed]),
        );

        let result = svc
            .match_projects_to_talent(&talent(1, vec![1.0, 0.0]), request(20, 0.6))
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.recommended_projects[0].project_id, id(10));
        assert_eq!(result.talent.id, id(1));
    }

    #[tokio::test]
    async fn similar_portfolios_exclude_source() {
        let source = portfolio(1, vec![1.0, 0.0]);
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new().with_portfolios(vec![
                source.clone(),
                portfolio(2, vec![1.0, 0.0]),
                portfolio(3, unit(0.8, 0.2)),
            ]),
        );

        let result = svc
            .find_similar_portfolios(&source, request(10, 0.6))
            .await
            .unwrap();
        let ids: Vec<_> = result.similar_portfolios.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![id(2), id(3)]);
        assert!(!ids.contains(&source.id));
    }

    #[tokio::test]
    async fn related_skills_exclude_source_and_cluster() {
        let source = skill(1, vec![1.0, 0.0]);
        let mut a = skill(2, vec![1.0, 0.0]);
        a.category_name = Some("Languages".into());
        let mut b = skill(3, unit(0.95, 0.05));
        b.category_name = Some("Languages".into());
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new().with_skills(vec![source.clone(), a, b]),
        );

        let result = svc
            .find_related_skills(&source, request(15, 0.7))
            .await
            .unwrap();
        assert_eq!(result.total, 2);
        assert!(result.related_skills.iter().all(|s| s.id != source.id));
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].name, "Languages");
    }

    #[tokio::test]
    async fn recommendations_skip_applied_projects() {
        let mut t = talent(1, vec![1.0, 0.0]);
        t.embeddings.insert(EmbeddingField::Skills, vec![1.0, 0.0]);
        t.embeddings.insert(EmbeddingField::Experience, vec![1.0, 0.0]);

        let full = |n| {
            let mut p = project(n, vec![1.0, 0.0]);
            p.embeddings
                .insert(EmbeddingField::RequiredSkills, vec![1.0, 0.0]);
            p
        };
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new()
                .with_projects(vec![full(10), full(11)])
                .with_application(user(1), id(10)),
        );

        let result = svc.recommendations(&t, 10).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.recommendations[0].project_id, id(11));
        assert_eq!(result.personalization_factors["based_on_profile"], 0.3);
        assert_eq!(result.personalization_factors["based_on_preferences"], 0.2);
    }

    #[tokio::test]
    async fn unknown_entities_are_not_found() {
        let svc = service(
            MockEmbedder::returning(vec![1.0, 0.0]),
            MockCandidateRepository::new(),
        );
        assert!(matches!(
            svc.portfolio(id(99)).await,
            Err(MatchError::NotFound {
                kind: EntityKind::Portfolio,
                ..
            })
        ));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(MatchingConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_misplaced_fields() {
        let mut config = MatchingConfig::default();
        config.talent_search = vec![FieldPairing::new(None, EmbeddingField::Requirements, 1.0)];
        assert!(config.validate().is_err());

        let mut config = MatchingConfig::default();
        config.project_to_talent = vec![FieldPairing::new(None, EmbeddingField::Profile, 1.0)];
        assert!(config.validate().is_err());

        let mut config = MatchingConfig::default();
        config.talent_to_project = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: MatchingConfig = serde_json::from_value(serde_json::json!({
            "max_limit": 50,
            "talent_search": [
                {"target": "profile_embedding", "weight": 0.4},
                {"target": "skills_embedding", "weight": 0.4},
                {"target": "experience_embedding", "weight": 0.2}
            ]
        }))
        .unwrap();
        assert_eq!(config.max_limit, 50);
        assert_eq!(config.talent_search.len(), 3);
        assert_eq!(config.max_similar_limit, 50);
        assert!(config.validate().is_ok());
    }
}
