//! Typed views over the `mcvouchy` section

use std::fmt;
use std::time::Duration;

use super::{ConfigSnapshot, APP_NAME};
use crate::application::errors::ConfigError;

/// Bot token used to authenticate against the gateway
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Result<Self, ConfigError> {
        let token = snapshot.get(APP_NAME, "secret_token")?.trim();
        if token.is_empty() {
            return Err(ConfigError::invalid_value(APP_NAME, "secret_token", "empty token"));
        }
        Ok(Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(<redacted>)")
    }
}

/// Invitation and vouching settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McVouchySettings {
    pub airlock_channel: String,
    pub limits_window: Duration,
    pub limits_exempt_roles: Vec<String>,
    pub verified_role: String,
    pub invitations_limit: u32,
    pub vouch_limit: u32,
    pub vouch_threshold: u32,
    pub auto_vouch_by_inviter: bool,
    pub invitation_lifetime: Duration,
}

impl McVouchySettings {
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Result<Self, ConfigError> {
        Ok(Self {
            airlock_channel: snapshot.get(APP_NAME, "airlock_channel")?.to_string(),
            limits_window: snapshot.get_duration(APP_NAME, "limits_window")?,
            limits_exempt_roles: snapshot.get_list(APP_NAME, "limits_exempt_roles")?,
            verified_role: snapshot.get(APP_NAME, "verified_role")?.to_string(),
            invitations_limit: snapshot.get_int(APP_NAME, "invitations_limit")?,
            vouch_limit: snapshot.get_int(APP_NAME, "vouch_limit")?,
            vouch_threshold: snapshot.get_int(APP_NAME, "vouch_threshold")?,
            auto_vouch_by_inviter: snapshot.get_bool(APP_NAME, "auto_vouch_by_inviter")?,
            invitation_lifetime: snapshot.get_duration(APP_NAME, "invitation_lifetime")?,
        })
    }
}

/// Human readable form of a duration in its largest whole unit
pub fn describe_duration(duration: Duration) -> String {
    const UNITS: &[(u64, &str)] = &[
        (7 * 24 * 60 * 60, "week"),
        (24 * 60 * 60, "day"),
        (60 * 60, "hour"),
        (60, "minute"),
    ];

    let secs = duration.as_secs();
    for (size, name) in UNITS {
        if secs >= *size && secs % size == 0 {
            let n = secs / size;
            return if n == 1 {
                format!("1 {}", name)
            } else {
                format!("{} {}s", n, name)
            };
        }
    }
    if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{} seconds", secs)
    }
}
