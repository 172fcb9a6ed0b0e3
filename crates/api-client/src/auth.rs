use crate::error::ApiError;
use reqwest::RequestBuilder;
use std::fmt;

/// HTTP basic-auth credentials attached to every request a client sends.
///
/// Azure DevOps takes a PAT as the password with an empty user name; GitHub
/// takes an OAuth app's client id and secret.
#[derive(Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, ApiError> {
        let password = password.into();
        if password.trim().is_empty() {
            return Err(ApiError::InvalidCredentials(
                "the secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            username: username.into(),
            password,
        })
    }

    /// Credentials for an Azure DevOps personal access token.
    pub fn personal_access_token(pat: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(String::new(), pat)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(BasicCredentials::personal_access_token("").is_err());
        assert!(BasicCredentials::new("id", "   ").is_err());
    }

    #[test]
    fn pat_uses_an_empty_user_name() {
        let creds = BasicCredentials::personal_access_token("pat").unwrap();
        assert_eq!(creds.username(), "");
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let creds = BasicCredentials::new("client-id", "client-secret").unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("client-id"));
        assert!(!rendered.contains("client-secret"));
    }
}
