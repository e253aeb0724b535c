use std::env;
use anyhow::{Context, Result, bail};
use reqwest::Url;

pub const DEFAULT_SUBSCRIPTION_URL: &str = "http://localhost:5002";
pub const DEFAULT_DAMAGE_URL: &str = "http://localhost:5003";
pub const DEFAULT_USER_URL: &str = "http://localhost:5005";

#[derive(Debug, Clone)]
pub struct Config {
    pub subscription_service_url: String,
    pub damage_service_url: String,
    pub user_service_url: String,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // The subscription service was originally called "abonnement"; both names are accepted.
        let subscription_service_url = service_url(
            &["SUBSCRIPTION_MICROSERVICE_URL", "ABONNEMENT_MICROSERVICE_URL"],
            DEFAULT_SUBSCRIPTION_URL,
        )?;

        let damage_service_url = service_url(&["DAMAGE_MICROSERVICE_URL"], DEFAULT_DAMAGE_URL)?;

        let user_service_url = service_url(&["LOGIN_MICROSERVICE_URL"], DEFAULT_USER_URL)?;

        let service_port = env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Config {
            subscription_service_url,
            damage_service_url,
            user_service_url,
            service_port,
            service_host,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Subscription service: {}", self.subscription_service_url);
        tracing::info!("  Damage service: {}", self.damage_service_url);
        tracing::info!("  User service: {}", self.user_service_url);
        tracing::info!("  Gateway listening on: {}:{}", self.service_host, self.service_port);
    }
}

/// Reads the first set variable out of `names`, falling back to `default`.
///
/// The value must be an absolute http(s) URL. A trailing slash is dropped so
/// that downstream paths can be appended directly.
fn service_url(names: &[&str], default: &str) -> Result<String> {
    let found = names
        .iter()
        .find_map(|name| env::var(name).ok().map(|value| (*name, value)));

    let (name, raw) = match found {
        Some((name, value)) => (name, value),
        None => return Ok(default.to_string()),
    };

    let url = Url::parse(raw.trim())
        .with_context(|| format!("{} must be an absolute URL, got '{}'", name, raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{} must use http or https, got '{}'", name, raw);
    }

    Ok(raw.trim().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env_vars() {
        unsafe {
            env::remove_var("SUBSCRIPTION_MICROSERVICE_URL");
            env::remove_var("ABONNEMENT_MICROSERVICE_URL");
            env::remove_var("DAMAGE_MICROSERVICE_URL");
            env::remove_var("LOGIN_MICROSERVICE_URL");
            env::remove_var("PORT");
            env::remove_var("HOST");
        }
    }

    #[test]
    fn test_config_with_all_vars() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("SUBSCRIPTION_MICROSERVICE_URL", "http://subscriptions:8000/");
            env::set_var("DAMAGE_MICROSERVICE_URL", "http://damage:8001");
            env::set_var("LOGIN_MICROSERVICE_URL", "https://auth.internal");
            env::set_var("PORT", "5002");
            env::set_var("HOST", "127.0.0.1");
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.subscription_service_url, "http://subscriptions:8000");
        assert_eq!(config.damage_service_url, "http://damage:8001");
        assert_eq!(config.user_service_url, "https://auth.internal");
        assert_eq!(config.service_port, 5002);
        assert_eq!(config.service_host, "127.0.0.1");
        clear_env_vars();
    }

    #[test]
    fn test_config_with_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        let config = Config::from_env().unwrap();

        assert_eq!(config.subscription_service_url, DEFAULT_SUBSCRIPTION_URL);
        assert_eq!(config.damage_service_url, DEFAULT_DAMAGE_URL);
        assert_eq!(config.user_service_url, DEFAULT_USER_URL);
        assert_eq!(config.service_port, 5001);
        assert_eq!(config.service_host, "0.0.0.0");
    }

    #[test]
    fn test_abonnement_alias() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("ABONNEMENT_MICROSERVICE_URL", "http://abonnement:5002");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.subscription_service_url, "http://abonnement:5002");

        unsafe {
            env::set_var("SUBSCRIPTION_MICROSERVICE_URL", "http://subscription:5002");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.subscription_service_url, "http://subscription:5002");
        clear_env_vars();
    }

    #[test]
    fn test_invalid_service_url() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("DAMAGE_MICROSERVICE_URL", "damage-service");
        }

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("DAMAGE_MICROSERVICE_URL"));

        unsafe {
            env::set_var("DAMAGE_MICROSERVICE_URL", "ftp://damage:21");
        }
        let result = Config::from_env();
        assert!(result.unwrap_err().to_string().contains("http or https"));
        clear_env_vars();
    }

    #[test]
    fn test_invalid_port() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-number");
        }

        let result = Config::from_env();
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert!(error.to_string().contains("PORT"));
        clear_env_vars();
    }

    #[test]
    fn test_port_out_of_range() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();
        unsafe {
            env::set_var("PORT", "99999");
        }

        let result = Config::from_env();
        assert!(result.is_err());
        clear_env_vars();
    }
}
