//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Authenticated user context extraction

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Scope granted to conference organizers
pub const ORGANIZER_SCOPE: &str = "organizer";

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user
    pub user_id: Uuid,
    
    /// Scopes/permissions
    pub scopes: Vec<String>,
    
    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    /// Check if the context has a specific scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope || s == "admin")
    }
    
    /// Require a specific scope, returning error if not present
    pub fn require_scope(&self, scope: &str) -> Result<()> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Missing required scope: {}", scope),
            })
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    
    /// Issued at (Unix timestamp)
    pub iat: i64,
    
    /// Scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }
    
    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: Uuid, scopes: Vec<String>) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);
        
        let claims = JwtClaims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            scopes,
        };
        
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal { 
                message: format!("Failed to generate token: {}", e) 
            })
    }
    
    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::ExpiredToken
                    }
                    _ => AppError::InvalidToken,
                }
            })
    }
}

/// Extract the bearer token from an Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// Axum extractor for AuthContext; the state must expose the shared `JwtManager`
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;
    
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;
        
        let token = extract_bearer_token(auth_header).ok_or(AppError::InvalidToken)?;
        
        let jwt = Arc::<JwtManager>::from_ref(state);
        let claims = jwt.validate_token(token)?;
        
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
        
        Ok(AuthContext {
            user_id,
            scopes: claims.scopes,
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    
    #[derive(Clone)]
    struct TestState {
        jwt: Arc<JwtManager>,
    }
    
    impl FromRef<TestState> for Arc<JwtManager> {
        fn from_ref(state: &TestState) -> Self {
            state.jwt.clone()
        }
    }
    
    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc.def"), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
    
    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);
        
        let user_id = Uuid::new_v4();
        let scopes = vec![ORGANIZER_SCOPE.to_string()];
        
        let token = manager.generate_token(user_id, scopes.clone()).unwrap();
        let claims = manager.validate_token(&token).unwrap();
        
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.scopes, scopes);
    }
    
    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);
        
        let token = issuer.generate_token(Uuid::new_v4(), vec![]).unwrap();
        assert!(matches!(verifier.validate_token(&token), Err(AppError::InvalidToken)));
    }
    
    #[test]
    fn test_require_scope() {
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            scopes: vec!["author".to_string()],
            request_id: "r".to_string(),
        };
        assert!(ctx.require_scope(ORGANIZER_SCOPE).is_err());
        
        let admin = AuthContext { scopes: vec!["admin".to_string()], ..ctx };
        assert!(admin.require_scope(ORGANIZER_SCOPE).is_ok());
    }
    
    #[tokio::test]
    async fn test_extractor_reads_bearer_token() {
        let state = TestState { jwt: Arc::new(JwtManager::new("secret", 60)) };
        let user_id = Uuid::new_v4();
        let token = state.jwt.generate_token(user_id, vec![]).unwrap();
        
        let (mut parts, _) = Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(())
            .unwrap()
            .into_parts();
        
        let ctx = AuthContext::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(ctx.user_id, user_id);
        
        let (mut bare, _) = Request::builder().body(()).unwrap().into_parts();
        let missing = AuthContext::from_request_parts(&mut bare, &state).await;
        assert!(matches!(missing, Err(AppError::Unauthorized { .. })));
    }
}
