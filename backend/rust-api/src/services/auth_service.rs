use crate::config::Credentials;
use crate::metrics::LOGIN_ATTEMPTS_TOTAL;

/// Password gate in front of the quiz.
///
/// This is a plain comparison against one configured username/password
/// pair, not an account system.
pub struct AuthService {
    credentials: Option<Credentials>,
}

impl AuthService {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }

    pub fn is_gated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Always `true` when no credentials are configured.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let accepted = match &self.credentials {
            Some(expected) => username == expected.username && password == expected.password,
            None => true,
        };

        let label = if accepted { "success" } else { "failure" };
        LOGIN_ATTEMPTS_TOTAL.with_label_values(&[label]).inc();
        if !accepted {
            tracing::warn!("Rejected login attempt for user: {}", username);
        }

        accepted
    }
}
