//! Mock repository implementation for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::domain::matching::traits::{CandidateRepository, MatchError, Result};
use crate::domain::matching::types::{
    Candidate, PortfolioCandidate, ProjectCandidate, SkillCandidate, TalentCandidate,
};
use crate::domain::models::{EntityId, UserId};

/// In-memory candidate store.
///
/// Pools come back in id order. `failing` makes every call return a
/// repository error.
#[derive(Clone, Default)]
pub struct MockCandidateRepository {
    talents: Arc<RwLock<BTreeMap<EntityId, TalentCandidate>>>,
    projects: Arc<RwLock<BTreeMap<EntityId, ProjectCandidate>>>,
    portfolios: Arc<RwLock<BTreeMap<EntityId, PortfolioCandidate>>>,
    skills: Arc<RwLock<BTreeMap<EntityId, SkillCandidate>>>,
    applications: Arc<RwLock<Vec<(UserId, EntityId)>>>,
    failure: Option<String>,
}

fn insert_all<C: Candidate>(store: &RwLock<BTreeMap<EntityId, C>>, items: Vec<C>) {
    let mut map = store.write().unwrap();
    for item in items {
        map.insert(item.id(), item);
    }
}

#[allow(dead_code)]
impl MockCandidateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_talents(self, talents: Vec<TalentCandidate>) -> Self {
        insert_all(&self.talents, talents);
        self
    }

    pub fn with_projects(self, projects: Vec<ProjectCandidate>) -> Self {
        insert_all(&self.projects, projects);
        self
    }

    pub fn with_portfolios(self, portfolios: Vec<PortfolioCandidate>) -> Self {
        insert_all(&self.portfolios, portfolios);
        self
    }

    pub fn with_skills(self, skills: Vec<SkillCandidate>) -> Self {
        insert_all(&self.skills, skills);
        self
    }

    /// Record that `user` applied to `project`.
    pub fn with_application(self, user: UserId, project: EntityId) -> Self {
        self.applications.write().unwrap().push((user, project));
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(MatchError::Repository(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CandidateRepository for MockCandidateRepository {
    async fn talent(&self, id: EntityId) -> Result<Option<TalentCandidate>> {
        self.check()?;
        Ok(self.talents.read().unwrap().get(&id).cloned())
    }

    async fn project(&self, id: EntityId) -> Result<Option<ProjectCandidate>> {
        self.check()?;
        Ok(self.projects.read().unwrap().get(&id).cloned())
    }

    async fn portfolio(&self, id: EntityId) -> Result<Option<PortfolioCandidate>> {
        self.check()?;
        Ok(self.portfolios.read().unwrap().get(&id).cloned())
    }

    async fn skill(&self, id: EntityId) -> Result<Option<SkillCandidate>> {
        self.check()?;
        Ok(self.skills.read().unwrap().get(&id).cloned())
    }

    async fn talent_pool(&self) -> Result<Vec<TalentCandidate>> {
        self.check()?;
        Ok(self.talents.read().unwrap().values().cloned().collect())
    }

    async fn open_project_pool(&self) -> Result<Vec<ProjectCandidate>> {
        self.check()?;
        Ok(self
            .projects
            .read()
            .unwrap()
            .values()
            .filter(|p| p.status == "open")
            .cloned()
            .collect())
    }

    async fn portfolio_pool(&self) -> Result<Vec<PortfolioCandidate>> {
        self.check()?;
        Ok(self.portfolios.read().unwrap().values().cloned().collect())
    }

    async fn skill_pool(&self) -> Result<Vec<SkillCandidate>> {
        self.check()?;
        Ok(self.skills.read().unwrap().values().cloned().collect())
    }

    async fn applied_project_ids(&self, talent_user: UserId) -> Result<Vec<EntityId>> {
        self.check()?;
        Ok(self
            .applications
            .read()
            .unwrap()
            .iter()
            .filter(|(user, _)| *user == talent_user)
            .map(|(_, project)| *project)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matching::testing::{id, project, talent, user};

    #[tokio::test]
    async fn open_pool_skips_closed_projects() {
        let mut closed = project(2, vec![1.0, 0.0]);
        closed.status = "closed".into();
        let repo = MockCandidateRepository::new()
            .with_projects(vec![project(1, vec![1.0, 0.0]), closed]);

        let pool = repo.open_project_pool().await.unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, id(1));
        assert!(repo.project(id(2)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn applications_are_per_user() {
        let repo = MockCandidateRepository::new()
            .with_application(user(1), id(10))
            .with_application(user(2), id(11));
        assert_eq!(repo.applied_project_ids(user(1)).await.unwrap(), vec![id(10)]);
    }

    #[tokio::test]
    async fn failing_repository_errors() {
        let repo = MockCandidateRepository::new()
            .with_talents(vec![talent(1, vec![1.0, 0.0])])
            .failing("connection reset");
        assert!(matches!(
            repo.talent_pool().await,
            Err(MatchError::Repository(_))
        ));
    }
}
