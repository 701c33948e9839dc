// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Startup helpers: default admin reporting and id generation.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminConfig;
use crate::error::{RepositoryError, Result};

/// Fallback administrator email when `DEFAULT_ADMIN_EMAIL` is unset.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@gitagita.com";

/// Fallback administrator password when `DEFAULT_ADMIN_PASSWORD` is unset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin@123456";

/// Digits in the random part of [`generate_id`].
const RANDOM_SUFFIX_LEN: u32 = 9;

/// Report the configured default administrator.
///
/// Advisory only: no user record is created or checked. Problems are logged
/// at `warn` and never returned.
pub fn initialize_default_admin(admin: &AdminConfig) {
    match check_admin(admin) {
        Ok(()) => info!(
            email = %admin.email,
            password = %redact(&admin.password),
            "default admin credentials configured"
        ),
        Err(e) => warn!(error = %e, "default admin not ready"),
    }
}

fn check_admin(admin: &AdminConfig) -> Result<()> {
    if admin.email.trim().is_empty() {
        return Err(RepositoryError::AdminInit("admin email is empty".to_string()));
    }
    if !admin.email.contains('@') {
        return Err(RepositoryError::AdminInit(format!(
            "admin email '{}' is not an address",
            admin.email
        )));
    }
    if admin.password.is_empty() {
        return Err(RepositoryError::AdminInit("admin password is empty".to_string()));
    }
    Ok(())
}

/// Mask a secret for logging, keeping only its length.
fn redact(secret: &str) -> String {
    format!("<redacted, {} chars>", secret.chars().count())
}

/// Compact unique id: base-36 milliseconds since the epoch followed by a
/// random base-36 suffix.
///
/// Ids from different milliseconds sort by creation time when their
/// timestamp parts have equal width, which holds until the year 2059.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    let random = Uuid::new_v4().as_u128() % 36u128.pow(RANDOM_SUFFIX_LEN);

    let mut id = to_base36(millis);
    let suffix = to_base36(random);
    for _ in suffix.len()..RANDOM_SUFFIX_LEN as usize {
        id.push('0');
    }
    id.push_str(&suffix);
    id
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
