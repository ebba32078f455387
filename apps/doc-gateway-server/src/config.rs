//! Layered configuration (spec §9 "Configuration of identifier rules";
//! SPEC_FULL §4.I). Loaded once at process start from defaults, an optional
//! config file, and environment overrides via [`figment`] — the same
//! layering shape as the teacher's `AppConfig::load_or_default`, scaled down
//! to the one section this binary needs.

use std::net::SocketAddr;

use doc_identifiers::IdentifierRules;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default bind address")
}

fn default_request_body_limit_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    100
}

fn default_org_page_size() -> u32 {
    10
}

fn default_max_org_page_size() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// The one configuration section this binary reads (SPEC_FULL §4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub request_body_limit_bytes: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub default_org_page_size: u32,
    pub max_org_page_size: u32,
    pub identifier_rules: IdentifierRules,
    pub require_auth_by_default: bool,
    pub log_format: String,
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_body_limit_bytes: default_request_body_limit_bytes(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_org_page_size: default_org_page_size(),
            max_org_page_size: default_max_org_page_size(),
            identifier_rules: IdentifierRules::default(),
            require_auth_by_default: default_true(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

impl GatewayConfig {
    /// Layer defaults, an optional `gateway.yaml` next to the process, and
    /// `GATEWAY_*` environment overrides — first match wins, later layers
    /// override earlier ones, mirroring the teacher's config provider order.
    pub fn load(config_path: Option<&str>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(Self::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed("GATEWAY_").split("__"));
        figment.extract()
    }

    /// Clamp a requested document-family page size to the configured bounds
    /// (spec §4.F: non-positive or non-numeric falls back to the default).
    pub fn clamp_page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(n) if n > 0 => n.min(self.max_page_size),
            _ => self.default_page_size,
        }
    }

    /// Clamp a requested organization-list page size (spec §4.G: default 10,
    /// cap 100).
    pub fn clamp_org_page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(n) if n > 0 => n.min(self.max_org_page_size),
            _ => self.default_org_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.default_page_size, 50);
        assert_eq!(cfg.max_page_size, 100);
        assert_eq!(cfg.default_org_page_size, 10);
        assert_eq!(cfg.max_org_page_size, 100);
        assert!(cfg.require_auth_by_default);
    }

    #[test]
    fn page_size_falls_back_to_default_when_non_positive() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.clamp_page_size(Some(0)), 50);
        assert_eq!(cfg.clamp_page_size(None), 50);
        assert_eq!(cfg.clamp_page_size(Some(5)), 5);
        assert_eq!(cfg.clamp_page_size(Some(500)), 100);
    }

    #[test]
    fn org_page_size_falls_back_to_default_of_ten() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.clamp_org_page_size(None), 10);
        assert_eq!(cfg.clamp_org_page_size(Some(500)), 100);
    }
}
