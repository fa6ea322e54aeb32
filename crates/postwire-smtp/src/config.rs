//! Session configuration types.

use std::fmt;

/// What to do when the server rejects a `RCPT TO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecipientPolicy {
    /// Stop registering the rest of the current list (To, Cc or Bcc) and
    /// carry on with the next list and the transaction.
    #[default]
    BestEffort,
    /// Abort the transaction on the first rejected recipient.
    Strict,
}

/// SMTP session configuration.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Use TLS from the start (implicit TLS, usually port 465).
    #[cfg_attr(feature = "serde", serde(default))]
    pub tls: bool,
    /// Username for AUTH LOGIN / AUTH PLAIN.
    #[cfg_attr(feature = "serde", serde(default))]
    pub username: String,
    /// Password for AUTH LOGIN / AUTH PLAIN.
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: String,
    /// Domain sent with EHLO; the server hostname when unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ehlo_domain: Option<String>,
    /// Handling of rejected recipients.
    #[cfg_attr(feature = "serde", serde(default))]
    pub recipient_policy: RecipientPolicy,
}

impl Config {
    /// Creates a plaintext configuration on the submission port.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self::builder(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }

    /// Returns the default port for the given TLS mode.
    #[must_use]
    pub const fn default_port(tls: bool) -> u16 {
        if tls { 465 } else { 587 }
    }

    /// Returns the domain announced with EHLO.
    #[must_use]
    pub fn ehlo_domain(&self) -> &str {
        self.ehlo_domain.as_deref().unwrap_or(&self.host)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ehlo_domain", &self.ehlo_domain)
            .field("recipient_policy", &self.recipient_policy)
            .finish()
    }
}

/// Builder for session configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    tls: bool,
    username: String,
    password: String,
    ehlo_domain: Option<String>,
    recipient_policy: RecipientPolicy,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            tls: false,
            username: String::new(),
            password: String::new(),
            ehlo_domain: None,
            recipient_policy: RecipientPolicy::default(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enables or disables implicit TLS.
    #[must_use]
    pub const fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the domain announced with EHLO.
    #[must_use]
    pub fn ehlo_domain(mut self, domain: impl Into<String>) -> Self {
        self.ehlo_domain = Some(domain.into());
        self
    }

    /// Sets the recipient policy.
    #[must_use]
    pub const fn recipient_policy(mut self, policy: RecipientPolicy) -> Self {
        self.recipient_policy = policy;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| Config::default_port(self.tls)),
            tls: self.tls,
            username: self.username,
            password: self.password,
            ehlo_domain: self.ehlo_domain,
            recipient_policy: self.recipient_policy,
        }
    }
}
