use async_trait::async_trait;
use ldap3::{dn_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::time::Duration;
use tracing::{debug, warn};

use super::AuthError;
use crate::config::LdapConfig;

/// LDAP result code for a rejected bind
const INVALID_CREDENTIALS: u32 = 49;

/// Decides whether a user may open a dashboard session
#[async_trait]
pub trait Directory: Send + Sync {
    /// `Ok(false)` for bad credentials or missing group membership;
    /// `Err` only when the directory itself cannot be reached or queried
    async fn authenticate(&self, uid: &str, password: &str) -> Result<bool, AuthError>;
}

/// Directory backed by an LDAP server and a role group
#[derive(Debug, Clone)]
pub struct LdapDirectory {
    config: LdapConfig,
}

impl LdapDirectory {
    pub fn new(config: LdapConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &LdapConfig) -> Self {
        Self::new(config.clone())
    }

    fn user_dn(&self, uid: &str) -> String {
        format!("uid={},{}", dn_escape(uid), self.config.people_base)
    }

    async fn check(&self, ldap: &mut Ldap, uid: &str, password: &str) -> Result<bool, AuthError> {
        let user_bind = ldap.simple_bind(&self.user_dn(uid), password).await?;
        if user_bind.rc == INVALID_CREDENTIALS {
            warn!("LDAP bind rejected for {}", uid);
            return Ok(false);
        }
        user_bind.success()?;

        ldap.simple_bind(&self.config.service_dn, &self.config.service_password)
            .await?
            .success()?;

        let (entries, _) = ldap
            .search(&self.config.group_dn, Scope::Base, "(objectClass=*)", vec!["member"])
            .await?
            .success()?;

        let members: Vec<String> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .flat_map(|entry| entry.attrs.get("member").cloned().unwrap_or_default())
            .collect();

        debug!("Role group {} has {} members", self.config.group_dn, members.len());
        Ok(is_group_member(&members, uid))
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn authenticate(&self, uid: &str, password: &str) -> Result<bool, AuthError> {
        // An empty password would be an unauthenticated bind, which succeeds
        if uid.trim().is_empty() || password.is_empty() {
            return Ok(false);
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let settings = LdapConnSettings::new().set_conn_timeout(timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url).await?;
        ldap3::drive!(conn);

        let outcome = match tokio::time::timeout(timeout, self.check(&mut ldap, uid, password)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("LDAP server {} did not answer within {:?}", self.config.url, timeout);
                return Err(AuthError::Ldap(format!("timed out after {:?}", timeout)));
            }
        };
        if let Err(e) = ldap.unbind().await {
            debug!("LDAP unbind failed: {}", e);
        }
        outcome
    }
}

/// A member DN names the user when one of its RDNs is `uid=<uid>`
pub fn is_group_member(members: &[String], uid: &str) -> bool {
    let wanted = format!("uid={}", uid);
    members.iter().any(|member| {
        member
            .split(',')
            .any(|rdn| rdn.trim().eq_ignore_ascii_case(&wanted))
    })
}
