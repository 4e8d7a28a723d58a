/// Auth endpoints
///
/// Login is two-step when the backend requires it: `POST /auth/login`
/// may answer with `requiresVerification` instead of a token, in which
/// case the user enters an emailed code and `POST /auth/verify`
/// finishes the exchange.

use serde::{Deserialize, Serialize};

use super::{ApiError, Client};

#[derive(Debug, Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct VerifyRequest {
    email: String,
    code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub requires_verification: bool,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /auth/login`
pub async fn login(client: Client, email: String, password: String) -> Result<LoginOutcome, ApiError> {
    let body = LoginRequest { email, password };
    client.send(client.post("/auth/login").json(&body)).await
}

/// `POST /auth/verify`
pub async fn verify(client: Client, email: String, code: String) -> Result<LoginOutcome, ApiError> {
    let body = VerifyRequest { email, code };
    client.send(client.post("/auth/verify").json(&body)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_with_token() {
        let outcome: LoginOutcome =
            serde_json::from_str(r#"{"token":"jwt-abc"}"#).unwrap();
        assert_eq!(outcome.token.as_deref(), Some("jwt-abc"));
        assert!(!outcome.requires_verification);
    }

    #[test]
    fn test_outcome_requiring_verification() {
        let outcome: LoginOutcome =
            serde_json::from_str(r#"{"requiresVerification":true,"email":"a@b.c"}"#).unwrap();
        assert!(outcome.requires_verification);
        assert_eq!(outcome.email.as_deref(), Some("a@b.c"));
        assert!(outcome.token.is_none());
    }
}
