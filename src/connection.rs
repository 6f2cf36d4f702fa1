//! Single-slot SMTP connection state
//!
//! The worker owns exactly one [`Connection`], replaced wholesale by each
//! successful configuration update and read by every mail dispatch. There is
//! no lock around it: the loop is single-tasked, so the one writer path and
//! the one reader path can never overlap.

use crate::{error::ConfigError, schema::ModuleConfig};

/// Default SMTP port when the configured host carries no port suffix
const DEFAULT_PORT: u16 = 25;

/// Credentials for SMTP plain authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The live SMTP connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Bare server hostname, any `:port` suffix stripped
    pub server: String,
    /// Port to connect on
    pub port: u16,
    /// Present only when the configuration carried an auth pair
    pub credentials: Option<Credentials>,
}

impl Connection {
    /// Validate a decoded configuration and produce the connection state
    ///
    /// Credentials are only constructed when the auth pair is actually
    /// present; a config without auth yields an unauthenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHost`] for an empty host,
    /// [`ConfigError::BadAuth`] when auth is not exactly a username and
    /// password, and [`ConfigError::BadPort`] for an unparseable port suffix
    pub fn from_config(config: ModuleConfig) -> Result<Self, ConfigError> {
        if config.host.is_empty() {
            return Err(ConfigError::MissingHost);
        }

        let credentials = match config.auth.as_deref() {
            None => None,
            Some([username, password]) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            Some(_) => return Err(ConfigError::BadAuth),
        };

        let (server, port) = match config.host.split_once(':') {
            None => (config.host, DEFAULT_PORT),
            Some((server, port)) => (
                server.to_string(),
                port.parse()
                    .map_err(|_| ConfigError::BadPort(port.to_string()))?,
            ),
        };

        if server.is_empty() {
            return Err(ConfigError::MissingHost);
        }

        Ok(Self {
            server,
            port,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, auth: Option<&[&str]>) -> ModuleConfig {
        ModuleConfig {
            host: host.to_string(),
            auth: auth.map(|pair| pair.iter().map(ToString::to_string).collect()),
        }
    }

    #[test]
    fn host_with_port_is_split() {
        let connection = Connection::from_config(config("smtp.example.com:587", None)).unwrap();
        assert_eq!(connection.server, "smtp.example.com");
        assert_eq!(connection.port, 587);
        assert!(connection.credentials.is_none());
    }

    #[test]
    fn bare_host_uses_the_default_port() {
        let connection = Connection::from_config(config("smtp.example.com", None)).unwrap();
        assert_eq!(connection.server, "smtp.example.com");
        assert_eq!(connection.port, DEFAULT_PORT);
    }

    #[test]
    fn auth_pair_becomes_credentials() {
        let connection =
            Connection::from_config(config("smtp.example.com", Some(&["u", "p"]))).unwrap();
        let credentials = connection.credentials.unwrap();
        assert_eq!(credentials.username, "u");
        assert_eq!(credentials.password, "p");
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            Connection::from_config(config("", None)),
            Err(ConfigError::MissingHost)
        ));
        assert!(matches!(
            Connection::from_config(config(":587", None)),
            Err(ConfigError::MissingHost)
        ));
    }

    #[test]
    fn auth_must_be_a_pair() {
        assert!(matches!(
            Connection::from_config(config("smtp.example.com", Some(&["u"]))),
            Err(ConfigError::BadAuth)
        ));
        assert!(matches!(
            Connection::from_config(config("smtp.example.com", Some(&["u", "p", "x"]))),
            Err(ConfigError::BadAuth)
        ));
    }

    #[test]
    fn bad_port_suffix_is_rejected() {
        assert!(matches!(
            Connection::from_config(config("smtp.example.com:mail", None)),
            Err(ConfigError::BadPort(_))
        ));
    }
}
