use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub survey: SurveyConfig,
    pub ldap: LdapConfig,
    pub security: SecurityConfig,
    pub reporting: ReportingConfig,
    pub case_stats: CaseStatsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Front-end build directory served for every non-API path
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL; the in-memory store is used when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub check_in_survey_id: Option<String>,
    pub check_out_survey_id: Option<String>,
    pub poll_interval_minutes: u64,
    pub backfill_since: NaiveDate,
    pub export_poll_interval_ms: u64,
    pub export_max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    pub url: String,
    pub people_base: String,
    pub service_dn: String,
    pub service_password: String,
    pub group_dn: String,
    /// Bound on connecting and on the whole bind/search exchange
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_issuer: String,
    pub jwt_expiry_minutes: i64,
    pub jwt_private_key_path: Option<String>,
    pub jwt_public_key_path: Option<String>,
    pub jwt_secret: Option<String>,
    pub cors_origins: Vec<String>,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    pub timezone: String,
    pub week_start: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStatsConfig {
    /// Regional case counts shown next to the occupancy figures
    pub enabled: bool,
    pub api_base_url: String,
    pub province: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("STATIC_DIR") {
            self.server.static_dir = non_empty(v);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Survey overrides
        if let Ok(v) = env::var("QUALTRICS_BASE_URL") {
            self.survey.api_base_url = v;
        }
        if let Ok(v) = env::var("QUALTRICS_API_TOKEN") {
            self.survey.api_token = non_empty(v);
        }
        if let Ok(v) = env::var("CHECKIN_SURVEY_ID") {
            self.survey.check_in_survey_id = non_empty(v);
        }
        if let Ok(v) = env::var("CHECKOUT_SURVEY_ID") {
            self.survey.check_out_survey_id = non_empty(v);
        }
        if let Ok(v) = env::var("SURVEY_POLL_INTERVAL_MINUTES") {
            self.survey.poll_interval_minutes = v.parse().unwrap_or(self.survey.poll_interval_minutes);
        }
        if let Ok(v) = env::var("SURVEY_BACKFILL_SINCE") {
            self.survey.backfill_since = v.parse().unwrap_or(self.survey.backfill_since);
        }
        if let Ok(v) = env::var("SURVEY_EXPORT_POLL_INTERVAL_MS") {
            self.survey.export_poll_interval_ms = v.parse().unwrap_or(self.survey.export_poll_interval_ms);
        }
        if let Ok(v) = env::var("SURVEY_EXPORT_MAX_ATTEMPTS") {
            self.survey.export_max_attempts = v.parse().unwrap_or(self.survey.export_max_attempts);
        }

        // LDAP overrides
        if let Ok(v) = env::var("LDAP_URL") {
            self.ldap.url = v;
        }
        if let Ok(v) = env::var("LDAP_PEOPLE_BASE") {
            self.ldap.people_base = v;
        }
        if let Ok(v) = env::var("LDAP_SERVICE_DN") {
            self.ldap.service_dn = v;
        }
        if let Ok(v) = env::var("LDAP_SERVICE_PASSWORD") {
            self.ldap.service_password = v;
        }
        if let Ok(v) = env::var("LDAP_GROUP_DN") {
            self.ldap.group_dn = v;
        }
        if let Ok(v) = env::var("LDAP_TIMEOUT_SECONDS") {
            self.ldap.timeout_secs = v.parse().unwrap_or(self.ldap.timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_MINUTES") {
            self.security.jwt_expiry_minutes = v.parse().unwrap_or(self.security.jwt_expiry_minutes);
        }
        if let Ok(v) = env::var("JWT_PRIVATE_KEY_PATH") {
            self.security.jwt_private_key_path = non_empty(v);
        }
        if let Ok(v) = env::var("JWT_PUBLIC_KEY_PATH") {
            self.security.jwt_public_key_path = non_empty(v);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = non_empty(v);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIE") {
            self.security.secure_cookie = v.parse().unwrap_or(self.security.secure_cookie);
        }

        // Reporting overrides
        if let Ok(v) = env::var("REPORTING_TIMEZONE") {
            self.reporting.timezone = v;
        }
        if let Ok(v) = env::var("REPORTING_WEEK_START") {
            self.reporting.week_start = v;
        }

        // Case stats overrides
        if let Ok(v) = env::var("CASE_STATS_ENABLED") {
            self.case_stats.enabled = v.parse().unwrap_or(self.case_stats.enabled);
        }
        if let Ok(v) = env::var("CASE_STATS_BASE_URL") {
            self.case_stats.api_base_url = v;
        }
        if let Ok(v) = env::var("CASE_STATS_PROVINCE") {
            self.case_stats.province = v;
        }
        if let Ok(v) = env::var("CASE_STATS_TIMEOUT_SECONDS") {
            self.case_stats.timeout_secs = v.parse().unwrap_or(self.case_stats.timeout_secs);
        }

        self
    }

    pub(crate) fn base() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                static_dir: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            survey: SurveyConfig {
                api_base_url: "https://ca1.qualtrics.com".to_string(),
                api_token: None,
                check_in_survey_id: None,
                check_out_survey_id: None,
                poll_interval_minutes: 10,
                backfill_since: NaiveDate::from_ymd_opt(2021, 1, 10).unwrap_or_default(),
                export_poll_interval_ms: 1000,
                export_max_attempts: 120,
            },
            ldap: LdapConfig {
                url: "ldap://localhost:389".to_string(),
                people_base: "ou=People,dc=landfood,dc=ubc,dc=ca".to_string(),
                service_dn: "cn=covid-dashboard-svc-host,ou=Service Accounts,dc=landfood,dc=ubc,dc=ca".to_string(),
                service_password: String::new(),
                group_dn: "cn=covid-dashboard,ou=Roles,ou=Groups,dc=landfood,dc=ubc,dc=ca".to_string(),
                timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_issuer: "UBC LFS".to_string(),
                jwt_expiry_minutes: 60,
                jwt_private_key_path: None,
                jwt_public_key_path: None,
                jwt_secret: None,
                cors_origins: vec![],
                secure_cookie: false,
            },
            reporting: ReportingConfig {
                timezone: "America/Los_Angeles".to_string(),
                week_start: "sun".to_string(),
            },
            case_stats: CaseStatsConfig {
                enabled: true,
                api_base_url: "https://api.covid19tracker.ca".to_string(),
                province: "BC".to_string(),
                timeout_secs: 5,
            },
        }
    }

    fn development() -> Self {
        let mut config = Self::base();
        config.security.cors_origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
        ];
        config.security.jwt_secret = Some("development-only-secret".to_string());
        config
    }

    fn staging() -> Self {
        let mut config = Self::base();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.secure_cookie = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::base();
        config.environment = Environment::Production;
        config.database.max_connections = 20;
        config.database.connection_timeout = 5;
        config.security.jwt_private_key_path = Some("./private.key".to_string());
        config.security.jwt_public_key_path = Some("./public.key".to_string());
        config.security.secure_cookie = true;
        config
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
