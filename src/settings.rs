use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub listen: String,
    /// Base of the shareable partner links.
    pub public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Storage {
    pub session_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Mock,
    Http,
}

#[derive(Debug, Deserialize)]
pub struct Data {
    pub source: DataSource,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub api: Api,
    #[serde(default)]
    pub storage: Storage,
    pub data: Data,
}

impl Settings {
    /// Loads `path` if present, then applies `PIAC_` environment overrides
    /// such as `PIAC_SERVER__LISTEN`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.listen", "127.0.0.1:8080")?
            .set_default("server.public_url", "http://localhost:8080")?
            .set_default("api.base_url", "http://localhost:3001/api")?
            .set_default("api.timeout_secs", 10)?
            .set_default("data.source", "mock")?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("PIAC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}
