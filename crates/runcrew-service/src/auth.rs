use anyhow::{Context, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use runcrew_types::models::{Member, Role};

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub exp: usize,
}

/// Issues and checks HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_hours: i64,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    /// Fails when the configured TTL puts the expiry out of range or
    /// before the Unix epoch.
    pub fn issue(&self, member: &Member) -> Result<String> {
        let claims = Claims {
            sub: member.id,
            email: member.email.clone(),
            roles: member.roles.clone(),
            exp: self.expiry()?,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    fn expiry(&self) -> Result<usize> {
        let exp = chrono::Duration::try_hours(self.ttl_hours)
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .with_context(|| format!("Token TTL of {} hours is out of range", self.ttl_hours))?;
        usize::try_from(exp.timestamp()).context("Token expiry precedes the Unix epoch")
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runcrew_types::models::NewMember;

    fn member() -> Member {
        Member::new(NewMember {
            email: "token@run.kr".into(),
            password_hash: "h".into(),
            phone_cipher: "c".into(),
            name: "Park".into(),
            nick_name: "tempo".into(),
            gender: None,
            birth_year: None,
            activity_region: None,
            profile_image_url: None,
        })
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = TokenIssuer::new("secret-a", 1);
        let m = member();
        let claims = issuer.verify(&issuer.issue(&m).unwrap()).unwrap();
        assert_eq!(claims.sub, m.id);
        assert_eq!(claims.email, "token@run.kr");
        assert_eq!(claims.roles, vec![Role::User]);
    }

    #[test]
    fn other_secret_rejects() {
        let token = TokenIssuer::new("secret-a", 1).issue(&member()).unwrap();
        assert!(TokenIssuer::new("secret-b", 1).verify(&token).is_err());
    }

    #[test]
    fn expired_token_rejects() {
        // Past the default 60s leeway.
        let issuer = TokenIssuer::new("secret-a", -1);
        let token = issuer.issue(&member()).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn out_of_range_ttl_fails_to_issue() {
        // Roughly 57 years back, before 1970.
        assert!(TokenIssuer::new("secret-a", -500_000).issue(&member()).is_err());
        assert!(TokenIssuer::new("secret-a", i64::MIN).issue(&member()).is_err());
        assert!(TokenIssuer::new("secret-a", i64::MAX).issue(&member()).is_err());
    }
}
