use super::*;
use axum::http::{HeaderValue, Request, header::COOKIE};
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn claims(exp: usize, aud: &str) -> SupabaseClaims {
    SupabaseClaims {
        sub: USER_ID.to_string(),
        aud: aud.to_string(),
        role: Some("authenticated".to_string()),
        email: Some("test@example.com".to_string()),
        exp,
    }
}

fn token(claims: &SupabaseClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_validate_supabase_jwt_success() {
    let my_claims = claims(9999999999, "authenticated");
    let token = token(&my_claims, SECRET);

    let claims = validate_supabase_jwt(&token, SECRET).expect("Valid token should pass");
    assert_eq!(claims.sub, my_claims.sub);
    assert_eq!(claims.email, my_claims.email);
}

#[test]
fn test_validate_supabase_jwt_expired() {
    let token = token(&claims(1, "authenticated"), SECRET);

    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_invalid_signature() {
    let token = token(&claims(9999999999, "authenticated"), "wrongsecret");

    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_wrong_audience() {
    let token = token(&claims(9999999999, "service_role"), SECRET);

    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_verifier_rejects_non_uuid_subject() {
    let mut bad_claims = claims(9999999999, "authenticated");
    bad_claims.sub = "not-a-uuid".to_string();
    let token = token(&bad_claims, SECRET);

    assert!(JwtVerifier::new(SECRET.to_string()).verify(&token).is_err());
}

#[test]
fn test_extract_access_token_prefers_bearer() {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
    headers.insert(COOKIE, HeaderValue::from_static("sb-access-token=cookie-token"));

    assert_eq!(extract_access_token(&headers).as_deref(), Some("header-token"));
}

#[test]
fn test_extract_access_token_falls_back_to_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_static("site_unlocked=true; sb-access-token=cookie-token"),
    );

    assert_eq!(extract_access_token(&headers).as_deref(), Some("cookie-token"));
}

#[test]
fn test_extract_access_token_ignores_other_schemes() {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));

    assert!(extract_access_token(&headers).is_none());
}

#[tokio::test]
async fn test_extractor_resolves_user_from_cookie() {
    let token = token(&claims(9999999999, "authenticated"), SECRET);
    let request = Request::builder()
        .header(COOKIE, format!("{}={}", ACCESS_TOKEN_COOKIE, token))
        .extension(Arc::new(JwtVerifier::new(SECRET.to_string())))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();

    assert_eq!(user.user_id, Uuid::parse_str(USER_ID).unwrap());
    assert_eq!(user.email.as_deref(), Some("test@example.com"));
}

#[tokio::test]
async fn test_extractor_rejects_missing_token() {
    let request = Request::builder()
        .extension(Arc::new(JwtVerifier::new(SECRET.to_string())))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let rejection = AuthUser::from_request_parts(&mut parts, &())
        .await
        .unwrap_err();

    assert_eq!(rejection.status, axum::http::StatusCode::UNAUTHORIZED);
}
