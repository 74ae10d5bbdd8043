use serde::Deserialize;

/// Cross-origin resource sharing configuration.
#[derive(Debug, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Request headers browsers may send on cross-origin calls.
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_headers: default_allowed_headers(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:4200".to_owned()]
}

fn default_allowed_headers() -> Vec<String> {
    ["cache-control", "x-requested-with", "authorization", "content-type"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}
