//! Candidate repository implementations.

#[cfg(test)]
mod mock;
mod postgres;

#[cfg(test)]
pub use mock::MockCandidateRepository;
pub use postgres::PgCandidateRepository;
