//! Token issuance and verification.
//!
//! A token carries a fixed set of base claims plus whatever the registered
//! [`ClaimsEnricher`]s add before signing. Enrichers run in registration
//! order and can never overwrite a base claim.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use api_types::auth::{Login, LoginResponse};
use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{DateTime, Utc};
use engine::{Engine, EngineError, User};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

/// Claims every token carries. Enrichers cannot touch these keys.
pub const RESERVED_CLAIMS: [&str; 5] = ["sub", "username", "iat", "exp", "jti"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The authenticated user, as seen by request handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

pub type EnrichFuture<'a> = Pin<Box<dyn Future<Output = Result<(), EngineError>> + Send + 'a>>;

/// Hook run while a token is being issued, before it is signed.
pub trait ClaimsEnricher: Send + Sync {
    fn enrich<'a>(&'a self, user: &'a CurrentUser, claims: &'a mut Claims) -> EnrichFuture<'a>;
}

/// Adds the user's preferences as a `settings` object.
pub struct SettingsEnricher {
    engine: Arc<Engine>,
}

impl SettingsEnricher {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl ClaimsEnricher for SettingsEnricher {
    fn enrich<'a>(&'a self, user: &'a CurrentUser, claims: &'a mut Claims) -> EnrichFuture<'a> {
        Box::pin(async move {
            let settings = self.engine.user_settings(user.id).await?;
            let mut object = Map::new();
            object.insert("currency".to_string(), settings.currency.code().into());
            object.insert("locale".to_string(), settings.locale.into());
            object.insert("timezone".to_string(), settings.timezone.into());
            object.insert("date_format".to_string(), settings.date_format.into());
            claims
                .extra
                .insert("settings".to_string(), Value::Object(object));
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid subject")]
    InvalidSubject,
    #[error("token lifetime out of range")]
    InvalidTtl,
}

/// Signs and verifies HS256 tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    enrichers: Vec<Box<dyn ClaimsEnricher>>,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            enrichers: Vec::new(),
        }
    }

    pub fn with_enricher(mut self, enricher: impl ClaimsEnricher + 'static) -> Self {
        self.enrichers.push(Box::new(enricher));
        self
    }

    /// Build the claims of `user`, run the enrichers and sign the result.
    pub async fn issue(&self, user: &CurrentUser) -> Result<(String, DateTime<Utc>), TokenError> {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(TokenError::InvalidTtl)?;
        let mut claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            extra: Map::new(),
        };

        for enricher in &self.enrichers {
            enricher.enrich(user, &mut claims).await?;
        }
        for key in RESERVED_CLAIMS {
            if claims.extra.remove(key).is_some() {
                tracing::warn!(claim = key, "enricher tried to override a reserved claim");
            }
        }

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, expires_at))
    }

    /// Check signature and expiry, then resolve the subject.
    pub fn verify(&self, token: &str) -> Result<(Claims, CurrentUser), TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        let claims = data.claims;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::InvalidSubject)?;
        let user = CurrentUser {
            id,
            username: claims.username.clone(),
        };
        Ok((claims, user))
    }
}

/// `POST /login`
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.username, &payload.password)
        .await?;
    let (token, expires_at) = state.tokens.issue(&CurrentUser::from(&user)).await?;
    tracing::debug!(username = %user.username, "token issued");

    Ok(Json(LoginResponse { token, expires_at }))
}

/// Bearer authentication for every protected route.
pub async fn require_bearer(
    State(state): State<ServerState>,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = header else {
        return Err(ServerError::Unauthorized("missing bearer token".to_string()));
    };
    let (_, user) = state.tokens.verify(bearer.token()).map_err(|err| {
        tracing::debug!("rejected token: {err}");
        ServerError::Unauthorized("invalid token".to_string())
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Value);

    impl ClaimsEnricher for Fixed {
        fn enrich<'a>(&'a self, _: &'a CurrentUser, claims: &'a mut Claims) -> EnrichFuture<'a> {
            Box::pin(async move {
                claims.extra.insert(self.0.to_string(), self.1.clone());
                Ok(())
            })
        }
    }

    struct Failing;

    impl ClaimsEnricher for Failing {
        fn enrich<'a>(&'a self, _: &'a CurrentUser, _: &'a mut Claims) -> EnrichFuture<'a> {
            Box::pin(async { Err(EngineError::KeyNotFound("user not exists".to_string())) })
        }
    }

    fn alice() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn issued_token_verifies_with_enrichment() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(60))
            .with_enricher(Fixed("plan", Value::from("free")));
        let user = alice();

        let (token, expires_at) = issuer.issue(&user).await.unwrap();
        let (claims, current) = issuer.verify(&token).unwrap();

        assert_eq!(current, user);
        assert_eq!(claims.exp, expires_at.timestamp());
        assert_eq!(claims.extra.get("plan"), Some(&Value::from("free")));
    }

    #[tokio::test]
    async fn enrichers_cannot_override_reserved_claims() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(60))
            .with_enricher(Fixed("sub", Value::from("someone-else")));
        let user = alice();

        let (token, _) = issuer.issue(&user).await.unwrap();
        let (claims, current) = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(current.id, user.id);
        assert!(claims.extra.is_empty());
    }

    #[tokio::test]
    async fn failing_enricher_aborts_issuance() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(60)).with_enricher(Failing);
        assert!(matches!(
            issuer.issue(&alice()).await,
            Err(TokenError::Engine(EngineError::KeyNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn foreign_signature_is_rejected() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(60));
        let other = TokenIssuer::new("another-secret", Duration::from_secs(60));

        let (token, _) = other.issue(&alice()).await.unwrap();
        assert!(matches!(issuer.verify(&token), Err(TokenError::Jwt(_))));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(60));
        let claims = Claims {
            sub: "42".to_string(),
            username: "alice".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
            jti: Uuid::new_v4().to_string(),
            extra: Map::new(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(TokenError::InvalidSubject)
        ));
    }

    #[tokio::test]
    async fn lifetime_beyond_the_calendar_is_rejected() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(u64::MAX));
        assert!(matches!(
            issuer.issue(&alice()).await,
            Err(TokenError::InvalidTtl)
        ));

        // Fits `chrono::Duration` but not the date range.
        let issuer = TokenIssuer::new("secret", Duration::from_secs(9_000_000_000_000));
        assert!(matches!(
            issuer.issue(&alice()).await,
            Err(TokenError::InvalidTtl)
        ));
    }
}
