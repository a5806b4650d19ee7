use std::str::FromStr;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use strum::{Display, EnumString};

use crate::{domain::models::UserId, routes::ApiError};

/// Header carrying the authenticated user's id, set by the gateway in front of the API.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Recruiter,
    Talent,
}

/// A custom Axum extractor that resolves the caller from the identity headers
/// forwarded by the gateway. Returns 401 Unauthorized when they are missing
/// or malformed.
///
/// A missing role header is treated as [`Role::Talent`], the least privileged role.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners may act on their own resources; admins may act on anyone's.
    pub fn can_act_for(&self, owner: UserId) -> bool {
        self.is_admin() || self.id == owner
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| UserId::from_str(value.trim()).ok())
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::Talent,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|value| Role::from_str(value.trim()).ok())
                .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?,
        };

        Ok(AuthUser { id, role })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use uuid::Uuid;

    use super::*;

    async fn extract(builder: axum::http::request::Builder) -> Result<AuthUser, ApiError> {
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_user_and_role() {
        let id = Uuid::from_u128(7);
        let user = extract(
            Request::builder()
                .header(USER_ID_HEADER, id.to_string())
                .header(USER_ROLE_HEADER, "Recruiter"),
        )
        .await
        .unwrap();

        assert_eq!(user.id, UserId::new(id));
        assert_eq!(user.role, Role::Recruiter);
        assert!(!user.is_admin());
    }

    #[tokio::test]
    async fn missing_role_defaults_to_talent() {
        let user = extract(Request::builder().header(USER_ID_HEADER, Uuid::nil().to_string()))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Talent);
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed_identity() {
        let err = extract(Request::builder()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = extract(Request::builder().header(USER_ID_HEADER, "not-a-uuid"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = extract(
            Request::builder()
                .header(USER_ID_HEADER, Uuid::nil().to_string())
                .header(USER_ROLE_HEADER, "superuser"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn ownership_and_admin_override() {
        let owner = UserId::new(Uuid::from_u128(1));
        let other = UserId::new(Uuid::from_u128(2));

        let talent = AuthUser {
            id: owner,
            role: Role::Talent,
        };
        assert!(talent.can_act_for(owner));
        assert!(!talent.can_act_for(other));

        let admin = AuthUser {
            id: other,
            role: Role::Admin,
        };
        assert!(admin.can_act_for(owner));
    }
}
