use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ADMIN_HEADER: &str = "x-user-admin";

/// Caller identity for the current request, as resolved by the upstream auth gateway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub is_admin: bool,
}

#[cfg(test)]
impl RequestContext {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin: true,
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        Ok(RequestContext {
            user_id: header(USER_ID_HEADER).map(String::from),
            is_admin: matches!(header(USER_ADMIN_HEADER), Some("true" | "1")),
        })
    }
}
