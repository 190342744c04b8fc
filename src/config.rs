// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and never
//! changes afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWKS_URI` | JWKS endpoint for JWT verification | Required |
//! | `TRUSTED_ISSUER` | Expected JWT issuer claim (exact match) | Required |
//! | `TRUSTED_AUDIENCE` | Expected JWT audience claim | Required |
//! | `JWKS_TIMEOUT_MS` | Key fetch timeout in milliseconds | `30000` |
//! | `JWKS_CACHE_TTL_SECS` | Key cache lifetime in seconds | `300` |
//! | `CLOCK_SKEW_LEEWAY_SECS` | Leeway for `exp`/`nbf` in seconds | `0` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` | PEM certificate chain, enables HTTPS | Optional |
//! | `TLS_KEY_PATH` | PEM private key, enables HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `edge_authenticator=info,tower_http=info` |

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use url::Url;

use crate::auth::TrustedConfig;
use crate::logging::LogFormat;

pub const JWKS_URI_ENV: &str = "JWKS_URI";
pub const TRUSTED_ISSUER_ENV: &str = "TRUSTED_ISSUER";
pub const TRUSTED_AUDIENCE_ENV: &str = "TRUSTED_AUDIENCE";
pub const JWKS_TIMEOUT_MS_ENV: &str = "JWKS_TIMEOUT_MS";
pub const JWKS_CACHE_TTL_SECS_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const CLOCK_SKEW_LEEWAY_SECS_ENV: &str = "CLOCK_SKEW_LEEWAY_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub trusted: TrustedConfig,
    pub bind_addr: SocketAddr,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let jwks_uri = required(JWKS_URI_ENV)?;
        validate_jwks_uri(&jwks_uri)?;
        let trusted_issuer = required(TRUSTED_ISSUER_ENV)?;
        let trusted_audience = required(TRUSTED_AUDIENCE_ENV)?;

        let mut trusted = TrustedConfig::new(jwks_uri, trusted_issuer, trusted_audience);
        if let Some(ms) = parse_opt::<u64>(JWKS_TIMEOUT_MS_ENV, get(JWKS_TIMEOUT_MS_ENV))? {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    name: JWKS_TIMEOUT_MS_ENV,
                    reason: "must be greater than zero".to_string(),
                });
            }
            trusted = trusted.with_timeout(Duration::from_millis(ms));
        }
        if let Some(secs) =
            parse_opt::<u64>(JWKS_CACHE_TTL_SECS_ENV, get(JWKS_CACHE_TTL_SECS_ENV))?
        {
            trusted = trusted.with_cache_ttl(Duration::from_secs(secs));
        }
        if let Some(leeway) =
            parse_opt::<u64>(CLOCK_SKEW_LEEWAY_SECS_ENV, get(CLOCK_SKEW_LEEWAY_SECS_ENV))?
        {
            trusted = trusted.with_leeway(leeway);
        }

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_opt::<u16>(PORT_ENV, get(PORT_ENV))?.unwrap_or(DEFAULT_PORT);
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            trusted,
            bind_addr,
            tls,
            log_format,
        })
    }
}

fn validate_jwks_uri(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name: JWKS_URI_ENV,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            name: JWKS_URI_ENV,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn parse_opt<T>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|v| {
        v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        (JWKS_URI_ENV, "https://auth.example.com/.well-known/jwks.json"),
        (TRUSTED_ISSUER_ENV, "https://auth.example.com/"),
        (TRUSTED_AUDIENCE_ENV, "https://agent.example.com"),
    ];

    #[test]
    fn loads_required_with_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.trusted.trusted_issuer, "https://auth.example.com/");
        assert_eq!(config.trusted.timeout, Duration::from_millis(30_000));
        assert_eq!(config.trusted.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.trusted.leeway, 0);
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert!(config.tls.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn missing_required_variable() {
        let err = load(&REQUIRED[..2]).unwrap_err();
        assert_eq!(err, ConfigError::Missing(TRUSTED_AUDIENCE_ENV));

        let mut vars = REQUIRED.to_vec();
        vars[1] = (TRUSTED_ISSUER_ENV, "   ");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing(TRUSTED_ISSUER_ENV)
        );
    }

    #[test]
    fn overrides_are_applied() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            (JWKS_TIMEOUT_MS_ENV, "1500"),
            (JWKS_CACHE_TTL_SECS_ENV, "60"),
            (CLOCK_SKEW_LEEWAY_SECS_ENV, "5"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (LOG_FORMAT_ENV, "json"),
            (TLS_CERT_PATH_ENV, "/certs/tls.crt"),
            (TLS_KEY_PATH_ENV, "/certs/tls.key"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.trusted.timeout, Duration::from_millis(1500));
        assert_eq!(config.trusted.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.trusted.leeway, 5);
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: "/certs/tls.crt".into(),
                key: "/certs/tls.key".into(),
            })
        );
    }

    #[test]
    fn rejects_invalid_jwks_uri() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = (JWKS_URI_ENV, "not a url");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: JWKS_URI_ENV, .. })
        ));

        vars[0] = (JWKS_URI_ENV, "ftp://auth.example.com/jwks.json");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: JWKS_URI_ENV, .. })
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.push((JWKS_TIMEOUT_MS_ENV, "soon"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: JWKS_TIMEOUT_MS_ENV, .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push((JWKS_TIMEOUT_MS_ENV, "0"));
        assert!(load(&vars).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push((PORT_ENV, "70000"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
    }

    #[test]
    fn tls_paths_must_come_together() {
        let mut vars = REQUIRED.to_vec();
        vars.push((TLS_CERT_PATH_ENV, "/certs/tls.crt"));
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing(TLS_KEY_PATH_ENV)
        );
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut vars = REQUIRED.to_vec();
        vars.push((LOG_FORMAT_ENV, "xml"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: LOG_FORMAT_ENV, .. })
        ));
    }
}
