use std::sync::Arc;

use axum::{Extension, Router, body::to_bytes, response::Response};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use crate::auth::{JwtVerifier, SupabaseClaims};
use crate::axum_http::cookies::CookiePolicy;

pub(crate) const JWT_SECRET: &str = "supersecretjwtsecretforunittesting123";

/// Installs the request extensions `http_serve` adds in production.
pub(crate) fn with_extensions(router: Router) -> Router {
    router
        .layer(Extension(Arc::new(JwtVerifier::new(JWT_SECRET.to_string()))))
        .layer(Extension(CookiePolicy { secure: false }))
}

pub(crate) fn bearer(user_id: Uuid) -> String {
    let claims = SupabaseClaims {
        sub: user_id.to_string(),
        aud: "authenticated".to_string(),
        role: Some("authenticated".to_string()),
        email: Some("creator@example.com".to_string()),
        exp: 9999999999,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
