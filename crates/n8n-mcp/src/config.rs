//! Connection settings resolved from the environment.
//!
//! Nothing here is cached: every request resolves the base URL and headers again, so a changed
//! environment takes effect on the next tool call. A missing API key only fails the calls that
//! need authentication.

use crate::error::{N8nError, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::sync::Arc;

pub const BASE_URL_VAR: &str = "N8N_BASE_URL";
pub const API_KEY_VAR: &str = "N8N_API_KEY";
pub const CF_ACCESS_CLIENT_ID_VAR: &str = "CF_ACCESS_CLIENT_ID";
pub const CF_ACCESS_CLIENT_SECRET_VAR: &str = "CF_ACCESS_CLIENT_SECRET";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5678";

const API_KEY_HEADER: &str = "x-n8n-api-key";
const CF_ACCESS_CLIENT_ID_HEADER: &str = "cf-access-client-id";
const CF_ACCESS_CLIENT_SECRET_HEADER: &str = "cf-access-client-secret";

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The live process environment.
    #[default]
    Process,
    /// A fixed set of variables (tests, embedding).
    Fixed(Arc<HashMap<String, String>>),
}

impl EnvSource {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(Arc::new(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Look up a variable. Empty values count as unset.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<String> {
        let value = match self {
            Self::Process => std::env::var(key).ok(),
            Self::Fixed(vars) => vars.get(key).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Base URL of the n8n instance, without trailing slashes.
#[must_use]
pub fn base_url(env: &EnvSource) -> String {
    let raw = env
        .var(BASE_URL_VAR)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    raw.trim_end_matches('/').to_string()
}

/// Headers for authenticated API calls.
///
/// The Cloudflare Access pair is added only when both halves are set; a lone half is ignored.
///
/// # Errors
///
/// Returns [`N8nError::Configuration`] if `N8N_API_KEY` is unset or a credential is not a valid
/// header value.
pub fn auth_headers(env: &EnvSource) -> Result<HeaderMap> {
    let api_key = env.var(API_KEY_VAR).ok_or_else(|| {
        N8nError::Configuration(format!(
            "Missing {API_KEY_VAR}. Generate one in n8n (Settings -> API) and export it in the \
             environment of the MCP host."
        ))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    insert_secret(&mut headers, API_KEY_HEADER, API_KEY_VAR, &api_key)?;

    if let (Some(id), Some(secret)) = (
        env.var(CF_ACCESS_CLIENT_ID_VAR),
        env.var(CF_ACCESS_CLIENT_SECRET_VAR),
    ) {
        insert_secret(&mut headers, CF_ACCESS_CLIENT_ID_HEADER, CF_ACCESS_CLIENT_ID_VAR, &id)?;
        insert_secret(
            &mut headers,
            CF_ACCESS_CLIENT_SECRET_HEADER,
            CF_ACCESS_CLIENT_SECRET_VAR,
            &secret,
        )?;
    }

    Ok(headers)
}

fn insert_secret(headers: &mut HeaderMap, name: &'static str, var: &str, value: &str) -> Result<()> {
    let mut value = HeaderValue::from_str(value).map_err(|_| {
        N8nError::Configuration(format!("{var} contains characters not allowed in an HTTP header"))
    })?;
    value.set_sensitive(true);
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
