//! Borrower identity and JWT claims
//!
//! Authentication itself is an external collaborator: this server only
//! validates a bearer token and reads the caller's role from its claims.

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

use crate::error::AppError;

/// Borrower role carried on every ledger row and in JWT claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowerRole {
    Student,
    Teacher,
    Librarian,
}

impl BorrowerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowerRole::Student => "student",
            BorrowerRole::Teacher => "teacher",
            BorrowerRole::Librarian => "librarian",
        }
    }
}

impl std::fmt::Display for BorrowerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(BorrowerRole::Student),
            "teacher" => Ok(BorrowerRole::Teacher),
            "librarian" | "admin" => Ok(BorrowerRole::Librarian),
            _ => Err(format!("Invalid borrower role: {}", s)),
        }
    }
}

impl From<String> for BorrowerRole {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(BorrowerRole::Student)
    }
}

// SQLx conversion for BorrowerRole (stored as text)
impl sqlx::Type<Postgres> for BorrowerRole {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowerRole {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowerRole {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// JWT claims issued by the external authentication service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: String,
    pub role: BorrowerRole,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Validate and decode a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_librarian(&self) -> bool {
        self.role == BorrowerRole::Librarian
    }

    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian role required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [BorrowerRole::Student, BorrowerRole::Teacher, BorrowerRole::Librarian] {
            assert_eq!(role.as_str().parse::<BorrowerRole>().unwrap(), role);
        }
    }

    #[test]
    fn admin_maps_to_librarian() {
        assert_eq!("admin".parse::<BorrowerRole>().unwrap(), BorrowerRole::Librarian);
    }
}
