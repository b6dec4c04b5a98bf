//! Request signing for the Chef server API (authentication protocol version 1.3).
//!
//! Every request carries a set of `X-Ops-*` headers. The `X-Ops-Authorization-N` headers hold the
//! base64 encoded RSA (PKCS#1 v1.5, SHA-256) signature of a canonical description of the request,
//! split over as many headers as needed.
use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{
    RsaPrivateKey,
    pkcs1::DecodeRsaPrivateKey,
    pkcs1v15::SigningKey,
    pkcs8::DecodePrivateKey,
    signature::{SignatureEncoding, Signer},
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

pub const SIGNING_PROTOCOL_VERSION: &str = "1.3";
pub const SERVER_API_VERSION: &str = "1";

/// Maximum length of a single `X-Ops-Authorization-N` header value.
const AUTHORIZATION_CHUNK_LENGTH: usize = 60;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid client key, expected a PEM encoded RSA private key")]
    InvalidKey,
    #[error("failed to format the request timestamp")]
    Timestamp(#[from] time::error::Format),
}

/// Signs requests on behalf of a Chef client (or user).
pub struct RequestSigner {
    user_id: String,
    signing_key: SigningKey<Sha256>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Create a signer from a PKCS#1 or PKCS#8 PEM encoded RSA private key.
    pub fn from_pem(user_id: impl Into<String>, pem: &str) -> Result<Self, SigningError> {
        let private_key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .map_err(|_| SigningError::InvalidKey)?;

        Ok(Self {
            user_id: user_id.into(),
            signing_key: SigningKey::<Sha256>::new(private_key),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Compute the authentication headers for a request.
    ///
    /// `path` is the path of the request URL, without query string.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
        timestamp: OffsetDateTime,
    ) -> Result<Vec<(String, String)>, SigningError> {
        let content_hash = STANDARD.encode(Sha256::digest(body));
        let timestamp = timestamp.format(TIMESTAMP_FORMAT)?;

        let canonical_request = canonical_request(
            method,
            &canonical_path(path),
            &content_hash,
            &timestamp,
            &self.user_id,
        );
        let signature = STANDARD.encode(
            self.signing_key
                .sign(canonical_request.as_bytes())
                .to_bytes(),
        );

        let mut headers = vec![
            (
                "X-Ops-Sign".to_string(),
                format!("algorithm=sha256;version={SIGNING_PROTOCOL_VERSION}"),
            ),
            ("X-Ops-Userid".to_string(), self.user_id.clone()),
            ("X-Ops-Timestamp".to_string(), timestamp),
            ("X-Ops-Content-Hash".to_string(), content_hash),
            (
                "X-Ops-Server-API-Version".to_string(),
                SERVER_API_VERSION.to_string(),
            ),
        ];

        // The signature is plain base64, splitting it on byte boundaries is safe.
        headers.extend(
            signature
                .as_bytes()
                .chunks(AUTHORIZATION_CHUNK_LENGTH)
                .enumerate()
                .map(|(index, chunk)| {
                    (
                        format!("X-Ops-Authorization-{}", index + 1),
                        String::from_utf8_lossy(chunk).into_owned(),
                    )
                }),
        );

        Ok(headers)
    }
}

fn canonical_request(
    method: &str,
    path: &str,
    content_hash: &str,
    timestamp: &str,
    user_id: &str,
) -> String {
    format!(
        "Method:{}\nPath:{path}\nX-Ops-Content-Hash:{content_hash}\nX-Ops-Sign:version={SIGNING_PROTOCOL_VERSION}\nX-Ops-Timestamp:{timestamp}\nX-Ops-UserId:{user_id}\nX-Ops-Server-API-Version:{SERVER_API_VERSION}",
        method.to_uppercase()
    )
}

/// Collapse repeated slashes and drop the trailing one, the server does the same before verifying.
fn canonical_path(path: &str) -> String {
    let mut canonical = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && canonical.ends_with('/') {
            continue;
        }
        canonical.push(c);
    }

    if canonical.len() > 1 && canonical.ends_with('/') {
        canonical.pop();
    }

    canonical
}
