//! Redacted secret storage and provider credential shapes.

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // SAFETY: zero bytes are valid UTF-8 and the string is not read again.
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ApiKey,
    ClientCredentials,
}

/// How requests authenticate against the provider endpoint.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderCredential {
    ApiKey(SecretString),
    ClientCredentials {
        client_id: String,
        client_secret: SecretString,
    },
}

impl ProviderCredential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::ApiKey(_) => CredentialKind::ApiKey,
            Self::ClientCredentials { .. } => CredentialKind::ClientCredentials,
        }
    }
}

impl std::fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ProviderCredential::ApiKey([REDACTED])"),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ProviderCredential::ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_secret_material() {
        let key = ProviderCredential::ApiKey(SecretString::new("sk-live-123"));
        let pair = ProviderCredential::ClientCredentials {
            client_id: "client-a".to_string(),
            client_secret: SecretString::new("shh"),
        };

        assert!(!format!("{key:?}").contains("sk-live-123"));
        let rendered = format!("{pair:?}");
        assert!(rendered.contains("client-a"));
        assert!(!rendered.contains("shh"));
        assert_eq!(pair.kind(), CredentialKind::ClientCredentials);
    }

    #[test]
    fn blank_secret_counts_as_empty() {
        assert!(SecretString::new("   ").is_empty());
        assert_eq!(SecretString::new("abc").clone().expose(), "abc");
    }
}
