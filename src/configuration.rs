//! Layered settings: built-in defaults, then an optional `configuration.toml`
//! (or the file named by `TRIVIA_CONFIG`), then `TRIVIA_`-prefixed environment
//! variables with `__` between nested keys, e.g. `TRIVIA_DATABASE__URL`.

use std::net::{IpAddr, SocketAddr};

use config::{Config, ConfigError, Environment, File, Source};
use secrecy::SecretString;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
}

#[derive(Deserialize, Debug)]
pub struct ApplicationSettings {
    pub host: IpAddr,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Deserialize, Debug)]
pub struct DatabaseSettings {
    pub url: SecretString,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    dotenv::dotenv().ok();
    let file = dotenv::var("TRIVIA_CONFIG").unwrap_or_else(|_| "configuration".to_owned());
    settings_from(
        File::with_name(&file).required(false),
        Environment::with_prefix("TRIVIA")
            .prefix_separator("_")
            .separator("__"),
    )
}

fn settings_from<S>(file: S, environment: Environment) -> Result<Settings, ConfigError>
where
    S: Source + Send + Sync + 'static,
{
    Config::builder()
        .set_default("application.host", "0.0.0.0")?
        .set_default("application.port", 8080)?
        .set_default("database.url", "sqlite:trivia.db")?
        .add_source(file)
        .add_source(environment)
        .build()?
        .try_deserialize()
}
