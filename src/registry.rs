use anyhow::{Result, bail};
use std::collections::HashMap;
use std::fmt;

use crate::config::Config;
use crate::routes::RouteTable;

/// Backend microservices the gateway forwards to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    User,
    Subscription,
    Damage,
}

impl ServiceId {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceId::User => "user",
            ServiceId::Subscription => "subscription",
            ServiceId::Damage => "damage",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs of the backend services, fixed at startup
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    urls: HashMap<ServiceId, String>,
}

impl BackendRegistry {
    pub fn from_config(config: &Config) -> Self {
        Self::default()
            .with(ServiceId::Subscription, &config.subscription_service_url)
            .with(ServiceId::Damage, &config.damage_service_url)
            .with(ServiceId::User, &config.user_service_url)
    }

    /// Registers (or replaces) the base URL of a service.
    pub fn with(mut self, service: ServiceId, base_url: &str) -> Self {
        self.urls
            .insert(service, base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn resolve(&self, service: ServiceId) -> Option<&str> {
        self.urls.get(&service).map(String::as_str)
    }

    /// Fails if any route targets a service without a configured base URL.
    pub fn ensure_covers(&self, table: &RouteTable) -> Result<()> {
        for route in table.routes() {
            if self.resolve(route.service).is_none() {
                bail!(
                    "no base URL configured for service '{}' (needed by {} {})",
                    route.service,
                    route.method,
                    route.path
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            subscription_service_url: "http://subscriptions:5002".to_string(),
            damage_service_url: "http://damage:5003".to_string(),
            user_service_url: "http://user:5005".to_string(),
            service_port: 5001,
            service_host: "0.0.0.0".to_string(),
        }
    }

    #[test]
    fn test_resolve_from_config() {
        let registry = BackendRegistry::from_config(&test_config());

        assert_eq!(registry.resolve(ServiceId::Subscription), Some("http://subscriptions:5002"));
        assert_eq!(registry.resolve(ServiceId::Damage), Some("http://damage:5003"));
        assert_eq!(registry.resolve(ServiceId::User), Some("http://user:5005"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let registry = BackendRegistry::default().with(ServiceId::User, "http://user:5005/");
        assert_eq!(registry.resolve(ServiceId::User), Some("http://user:5005"));
    }

    #[test]
    fn test_canonical_table_covered_by_config() {
        let registry = BackendRegistry::from_config(&test_config());
        assert!(registry.ensure_covers(&RouteTable::canonical().unwrap()).is_ok());
    }

    #[test]
    fn test_missing_service_is_fatal() {
        let registry = BackendRegistry::default()
            .with(ServiceId::Subscription, "http://subscriptions:5002")
            .with(ServiceId::User, "http://user:5005");

        let error = registry
            .ensure_covers(&RouteTable::canonical().unwrap())
            .unwrap_err();
        assert!(error.to_string().contains("damage"));
    }
}
