//! `Authorization: Bearer <token>` extraction.
use axum::http::{HeaderMap, header};

use crate::services::auth::error::AuthError;

pub const BEARER_SCHEME: &str = "Bearer";

/// Pull the raw bearer token out of the request headers.
///
/// The header must consist of exactly two whitespace-separated parts and the
/// first one must be `Bearer` (case-sensitive).
pub fn extract(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorizationHeader)?;

    // Non visible-ASCII bytes cannot form a bearer credential.
    let value = value
        .to_str()
        .map_err(|_| AuthError::MalformedAuthorizationHeader)?;

    let mut parts = value.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::MalformedAuthorizationHeader);
    };

    if scheme != BEARER_SCHEME {
        return Err(AuthError::UnsupportedAuthScheme);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers("Bearer abc.def.ghi");
        assert_eq!(extract(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn tolerates_extra_whitespace_between_parts() {
        let headers = headers("Bearer    abc.def.ghi");
        assert_eq!(extract(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn missing_header() {
        assert_eq!(
            extract(&HeaderMap::new()),
            Err(AuthError::MissingAuthorizationHeader)
        );
    }

    #[test]
    fn scheme_without_token_is_malformed() {
        assert_eq!(
            extract(&headers("Bearer")),
            Err(AuthError::MalformedAuthorizationHeader)
        );
        assert_eq!(
            extract(&headers("")),
            Err(AuthError::MalformedAuthorizationHeader)
        );
    }

    #[test]
    fn three_parts_are_malformed() {
        assert_eq!(
            extract(&headers("Bearer abc def")),
            Err(AuthError::MalformedAuthorizationHeader)
        );
    }

    #[test]
    fn other_scheme_is_rejected() {
        assert_eq!(
            extract(&headers("Token xyz")),
            Err(AuthError::UnsupportedAuthScheme)
        );
    }

    #[test]
    fn scheme_match_is_case_sensitive() {
        assert_eq!(
            extract(&headers("bearer xyz")),
            Err(AuthError::UnsupportedAuthScheme)
        );
        assert_eq!(
            extract(&headers("BEARER xyz")),
            Err(AuthError::UnsupportedAuthScheme)
        );
    }

    #[test]
    fn non_ascii_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert_eq!(
            extract(&headers),
            Err(AuthError::MalformedAuthorizationHeader)
        );
    }
}
