use campspot_core::OverlapPolicy;
use std::path::Path;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP server listens on (`BIND_ADDR`)
    pub bind_addr: String,
    /// How booking date ranges are compared (`BOOKING_OVERLAP_POLICY`)
    pub overlap_policy: OverlapPolicy,
    /// Directory with the built front-end (`FRONTEND_PATH`)
    pub frontend_path: String,
}

impl ServerConfig {
    /// Reads the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset or invalid values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let overlap_policy = match lookup("BOOKING_OVERLAP_POLICY") {
            Some(value) => value.parse().unwrap_or_else(|_| {
                log::warn!(
                    "Unknown BOOKING_OVERLAP_POLICY {:?}, using {:?}",
                    value,
                    OverlapPolicy::default()
                );
                OverlapPolicy::default()
            }),
            None => OverlapPolicy::default(),
        };

        let frontend_path =
            lookup("FRONTEND_PATH").unwrap_or_else(|| default_frontend_path().to_string());

        Self {
            bind_addr,
            overlap_policy,
            frontend_path,
        }
    }
}

fn default_frontend_path() -> &'static str {
    // Check the container layout first, then a local checkout
    if Path::new("./frontend-build").exists() {
        "./frontend-build"
    } else if Path::new("../frontend/build").exists() {
        "../frontend/build"
    } else {
        "./frontend-build"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.overlap_policy, OverlapPolicy::Turnover);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("BOOKING_OVERLAP_POLICY", "inclusive"),
            ("FRONTEND_PATH", "/srv/www"),
        ]);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.overlap_policy, OverlapPolicy::Inclusive);
        assert_eq!(config.frontend_path, "/srv/www");
    }

    #[test]
    fn unknown_policy_falls_back_to_default() {
        let config = config(&[("BOOKING_OVERLAP_POLICY", "sometimes")]);
        assert_eq!(config.overlap_policy, OverlapPolicy::Turnover);
    }
}
