use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT};
use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_base_url: String,
    pub login: Option<String>,
    pub password: SecretString,
    pub timeout_seconds: u64,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_base_url: String) -> Self {
        Self {
            api_base_url,
            login: None,
            password: SecretString::default(),
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    }

    pub fn set_credentials(&mut self, login: String, password: SecretString) {
        self.login = Some(login);
        self.password = password;
    }
}

impl Default for GlobalArgs {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL.to_string())
    }
}
