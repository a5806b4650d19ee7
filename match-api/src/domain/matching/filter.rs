//! Structured (non-vector) candidate filters.
//!
//! A [`FilterSet`] is parsed once from the loosely-typed request payload and
//! then evaluated per candidate. All predicates are ANDed; range predicates
//! are inclusive and enum predicates are exact-match.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::traits::{MatchError, Result};
use super::types::{
    Candidate, EntityKind, ExperienceLevel, PortfolioCandidate, ProjectCandidate, ProjectType,
    SkillCandidate, TalentCandidate, WorkType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FilterKey {
    ExperienceLevel,
    #[strum(to_string = "hourly_rate_max", serialize = "max_hourly_rate")]
    HourlyRateMax,
    Availability,
    CategoryId,
    ProjectType,
    WorkType,
    BudgetMax,
}

impl FilterKey {
    /// Whether this key can be evaluated against entities of `kind`.
    pub fn applies_to(&self, kind: EntityKind) -> bool {
        match self {
            FilterKey::ExperienceLevel
            | FilterKey::HourlyRateMax
            | FilterKey::Availability
            | FilterKey::CategoryId => kind == EntityKind::Talent,
            FilterKey::ProjectType | FilterKey::WorkType | FilterKey::BudgetMax => {
                kind == EntityKind::Project
            }
        }
    }
}

/// One typed filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    ExperienceLevel(ExperienceLevel),
    /// Talent's minimum hourly rate must not exceed this value.
    HourlyRateMax(f64),
    /// `true` requires an available talent; `false` imposes nothing.
    Availability(bool),
    Category(Uuid),
    ProjectType(ProjectType),
    WorkType(WorkType),
    /// Project's minimum budget must not exceed this value.
    BudgetMax(f64),
}

impl FilterPredicate {
    pub fn key(&self) -> FilterKey {
        match self {
            FilterPredicate::ExperienceLevel(_) => FilterKey::ExperienceLevel,
            FilterPredicate::HourlyRateMax(_) => FilterKey::HourlyRateMax,
            FilterPredicate::Availability(_) => FilterKey::Availability,
            FilterPredicate::Category(_) => FilterKey::CategoryId,
            FilterPredicate::ProjectType(_) => FilterKey::ProjectType,
            FilterPredicate::WorkType(_) => FilterKey::WorkType,
            FilterPredicate::BudgetMax(_) => FilterKey::BudgetMax,
        }
    }

    fn parse(key: FilterKey, value: &Value) -> Result<Self> {
        let invalid = |message: &str| MatchError::InvalidFilterValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        let predicate = match key {
            FilterKey::ExperienceLevel => FilterPredicate::ExperienceLevel(
                parse_enum(value).ok_or_else(|| invalid("must be one of junior, mid, senior, expert"))?,
            ),
            FilterKey::ProjectType => FilterPredicate::ProjectType(parse_enum(value).ok_or_else(
                || invalid("must be one of full-time, part-time, contract, freelance"),
            )?),
            FilterKey::WorkType => FilterPredicate::WorkType(
                parse_enum(value).ok_or_else(|| invalid("must be one of remote, onsite, hybrid"))?,
            ),
            FilterKey::HourlyRateMax => FilterPredicate::HourlyRateMax(
                parse_non_negative(value).ok_or_else(|| invalid("must be a number >= 0"))?,
            ),
            FilterKey::BudgetMax => FilterPredicate::BudgetMax(
                parse_non_negative(value).ok_or_else(|| invalid("must be a number >= 0"))?,
            ),
            FilterKey::Availability => FilterPredicate::Availability(
                value.as_bool().ok_or_else(|| invalid("must be a boolean"))?,
            ),
            FilterKey::CategoryId => FilterPredicate::Category(
                value
                    .as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or_else(|| invalid("must be a UUID"))?,
            ),
        };

        Ok(predicate)
    }
}

fn parse_enum<T: std::str::FromStr>(value: &Value) -> Option<T> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn parse_non_negative(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite() && *v >= 0.0)
}

/// A validated, order-independent set of filter predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: BTreeMap<FilterKey, FilterPredicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a later predicate for the same key replaces the earlier one.
    pub fn with(mut self, predicate: FilterPredicate) -> Self {
        self.predicates.insert(predicate.key(), predicate);
        self
    }

    /// Parse a raw `filters` object for a pool of `kind` entities.
    ///
    /// `null` values count as "not supplied". Keys that are unknown, or that
    /// do not apply to `kind`, are rejected rather than ignored.
    pub fn parse(kind: EntityKind, raw: &Map<String, Value>) -> Result<Self> {
        let mut set = FilterSet::new();
        for (name, value) in raw {
            let key: FilterKey = name.parse().map_err(|_| MatchError::UnknownFilterKey {
                key: name.clone(),
            })?;
            if !key.applies_to(kind) {
                return Err(MatchError::UnknownFilterKey { key: name.clone() });
            }
            if value.is_null() {
                continue;
            }
            set = set.with(FilterPredicate::parse(key, value)?);
        }
        Ok(set)
    }

    /// Fail if any predicate cannot be evaluated against `kind`.
    pub fn validate_for(&self, kind: EntityKind) -> Result<()> {
        match self.predicates.keys().find(|k| !k.applies_to(kind)) {
            Some(key) => Err(MatchError::UnknownFilterKey {
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterPredicate> {
        self.predicates.values()
    }
}

/// Evaluates filter predicates against an entity's structured attributes.
pub trait CandidateFilter: Candidate {
    /// `None` when the predicate has no meaning for this entity type.
    fn satisfies(&self, predicate: &FilterPredicate) -> Option<bool>;

    /// True only if every predicate passes.
    fn matches(&self, filters: &FilterSet) -> Result<bool> {
        for predicate in filters.iter() {
            match self.satisfies(predicate) {
                Some(true) => {}
                Some(false) => return Ok(false),
                None => {
                    return Err(MatchError::UnknownFilterKey {
                        key: predicate.key().to_string(),
                    })
                }
            }
        }
        Ok(true)
    }
}

impl CandidateFilter for TalentCandidate {
    fn satisfies(&self, predicate: &FilterPredicate) -> Option<bool> {
        let pass = match predicate {
            FilterPredicate::ExperienceLevel(level) => self.experience_level == Some(*level),
            FilterPredicate::HourlyRateMax(max) => {
                self.hourly_rate_min.map_or(true, |min| min <= *max)
            }
            FilterPredicate::Availability(required) => !required || self.is_available,
            FilterPredicate::Category(id) => self.primary_category_id == Some(*id),
            _ => return None,
        };
        Some(pass)
    }
}

impl CandidateFilter for ProjectCandidate {
    fn satisfies(&self, predicate: &FilterPredicate) -> Option<bool> {
        let pass = match predicate {
            FilterPredicate::ProjectType(t) => self.project_type == Some(*t),
            FilterPredicate::WorkType(w) => self.work_type == Some(*w),
            FilterPredicate::BudgetMax(max) => self.budget_min.map_or(true, |min| min <= *max),
            _ => return None,
        };
        Some(pass)
    }
}

impl CandidateFilter for PortfolioCandidate {
    fn satisfies(&self, _predicate: &FilterPredicate) -> Option<bool> {
        None
    }
}

impl CandidateFilter for SkillCandidate {
    fn satisfies(&self, _predicate: &FilterPredicate) -> Option<bool> {
        None
    }
}
