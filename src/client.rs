use std::fmt;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::{
    race::{race_via, RequestTemplate},
    ActionResponse, BandwagonError, ClientOptions, Result, ServiceInfo,
};

/// Default API root of the VPS control panel.
pub const DEFAULT_BASE_URL: &str = "https://api.64clouds.com/";

/// Account credentials sent as `veid` and `api_key` query parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub veid: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(veid: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            veid: veid.into(),
            api_key: api_key.into(),
        }
    }

    /// Query pairs in the order the API documents them.
    pub fn query_pairs(&self) -> [(&'static str, &str); 2] {
        [("veid", self.veid.as_str()), ("api_key", self.api_key.as_str())]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("veid", &self.veid)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
/// Client for the VPS control API.
///
/// Every call is sent as a race of duplicate GET requests, see
/// [`crate::race`](mod@crate::race).
pub struct BandwagonClient {
    base_url: Url,
    credentials: Credentials,
    options: ClientOptions,
}

impl fmt::Debug for BandwagonClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandwagonClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish()
    }
}

impl BandwagonClient {
    /// Creates a client against the default API root.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: default_base_url(),
            credentials,
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `BANDWAGON_VEID` — VPS identifier
    /// - `BANDWAGON_API_KEY` — API key of that VPS
    ///
    /// Returns an error if either variable is missing or empty.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bandwagon_http::BandwagonClient;
    ///
    /// let vps = BandwagonClient::from_env().expect("missing BANDWAGON_* env vars");
    /// ```
    pub fn from_env() -> Result<Self> {
        let veid = required_env("BANDWAGON_VEID")?;
        let api_key = required_env("BANDWAGON_API_KEY")?;
        Ok(Self::new(Credentials::new(veid, api_key)))
    }

    /// Points the client at another API root.
    ///
    /// A trailing slash is added when missing so endpoint paths resolve
    /// below the given root.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self> {
        self.base_url = parse_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Applies race and transport options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Fetches the VPS state.
    pub async fn info(&self) -> Result<ServiceInfo> {
        self.call("v1/getServiceInfo", &[]).await
    }

    /// Boots the VPS.
    pub async fn start(&self) -> Result<ActionResponse> {
        self.call("v1/start", &[]).await
    }

    /// Shuts the VPS down.
    pub async fn stop(&self) -> Result<ActionResponse> {
        self.call("v1/stop", &[]).await
    }

    /// Forcibly stops a VPS that does not respond to `stop`.
    pub async fn kill(&self) -> Result<ActionResponse> {
        self.call("v1/kill", &[]).await
    }

    /// Restarts the VPS.
    pub async fn reboot(&self) -> Result<ActionResponse> {
        self.call("v1/restart", &[]).await
    }

    /// Runs a shell command on the VPS through the basic shell endpoint.
    pub async fn command(&self, command: &str) -> Result<ActionResponse> {
        self.call("v1/basicShell/exec", &[("command", command)]).await
    }

    /// Races an arbitrary request with this client's options and returns the
    /// raw body.
    pub async fn send(&self, request: &RequestTemplate) -> Result<Vec<u8>> {
        race_via(request, &self.options.race, &self.options.transport).await
    }

    /// Builds the authenticated request for `path`.
    ///
    /// `extra` pairs come before the credentials in the query string.
    pub fn request(&self, path: &str, extra: &[(&str, &str)]) -> Result<RequestTemplate> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| BandwagonError::InvalidUrl(format!("{path}: {err}")))?;
        url.query_pairs_mut()
            .extend_pairs(extra.iter().copied())
            .extend_pairs(self.credentials.query_pairs());
        Ok(RequestTemplate::get(url))
    }

    async fn call<T: DeserializeOwned>(&self, path: &str, extra: &[(&str, &str)]) -> Result<T> {
        let request = self.request(path, extra)?;
        let body = self.send(&request).await?;
        decode_json(&body)
    }

    /// Fetches `path` and returns the payload as untyped JSON.
    #[cfg(feature = "raw-mode")]
    pub async fn get_raw(&self, path: &str) -> Result<crate::raw::RawResponse> {
        self.call(path, &[]).await.map(crate::raw::RawResponse)
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|err| {
        BandwagonError::Decode(format!(
            "invalid response JSON: {err}; body: {}",
            String::from_utf8_lossy(body)
        ))
    })
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is an absolute URL")
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&normalized).map_err(|err| BandwagonError::InvalidUrl(format!("{raw}: {err}")))
}

fn required_env(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .map_err(|_| BandwagonError::Config(format!("missing {name} environment variable")))?;
    if value.trim().is_empty() {
        return Err(BandwagonError::Config(format!("{name} is set but empty")));
    }
    Ok(value.trim().to_owned())
}
