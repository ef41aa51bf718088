use serde::de::Error as _;
use serde::Deserialize;
use serde_yaml::{Error as YamlError, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

///  ---------------- Connections Config ----------------
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseAdapterType {
    Postgres,
}

#[derive(Clone, PartialEq)]
pub struct AdapterConnectionDetails {
    pub host: String,
    pub user: String,
    pub database: String,
    pub password: String,
    pub port: String,
    pub adapter_type: DatabaseAdapterType,
}

impl AdapterConnectionDetails {
    pub fn new(
        host: &str,
        user: &str,
        database: &str,
        password: &str,
        port: &str,
        adapter_type: DatabaseAdapterType,
    ) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            database: database.to_string(),
            password: password.to_string(),
            port: port.to_string(),
            adapter_type,
        }
    }
}

// Keeps the password out of logs and error output.
impl fmt::Debug for AdapterConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConnectionDetails")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("password", &"***")
            .field("port", &self.port)
            .field("adapter_type", &self.adapter_type)
            .finish()
    }
}

/// Map of connection profiles (e.g. `dev`) to named connection definitions
/// (e.g. `warehouse`).
pub type ConnectionsConfig = HashMap<String, HashMap<String, AdapterConnectionDetails>>;

/// Name used for a profile that holds a single, unnamed connection.
pub const DEFAULT_CONNECTION: &str = "default";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Connections {
    pub profile: String,
    pub path: PathBuf,
}

/// A profile is either one connection or a map of named connections.
pub(crate) fn parse_connection_profile(
    value: Value,
) -> Result<HashMap<String, AdapterConnectionDetails>, YamlError> {
    if let Ok(single) = serde_yaml::from_value::<RawConnectionDetails>(value.clone()) {
        let mut map = HashMap::new();
        map.insert(DEFAULT_CONNECTION.to_string(), single.into_adapter_details()?);
        return Ok(map);
    }

    let nested: HashMap<String, RawConnectionDetails> = serde_yaml::from_value(value)?;
    nested
        .into_iter()
        .map(|(name, raw)| raw.into_adapter_details().map(|details| (name, details)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawConnectionDetails {
    #[serde(default)]
    adapter: Option<DatabaseAdapterType>,
    #[serde(default)]
    adapter_type: Option<DatabaseAdapterType>,
    host: String,
    user: String,
    database: String,
    password: String,
    #[serde(deserialize_with = "deserialize_port_to_string")]
    port: String,
}

impl RawConnectionDetails {
    fn into_adapter_details(self) -> Result<AdapterConnectionDetails, YamlError> {
        let adapter_type = self
            .adapter_type
            .or(self.adapter)
            .ok_or_else(|| YamlError::custom("missing `adapter` or `adapter_type`"))?;

        Ok(AdapterConnectionDetails::new(
            &self.host,
            &self.user,
            &self.database,
            &self.password,
            &self.port,
            adapter_type,
        ))
    }
}

fn deserialize_port_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct PortVisitor;

    impl serde::de::Visitor<'_> for PortVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer port value")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0 {
                return Err(E::custom("port cannot be negative"));
            }
            Ok(value.to_string())
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_owned())
        }
    }

    deserializer.deserialize_any(PortVisitor)
}
