//! Endpoint descriptors for both sides of a transfer

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{FerryError, Result};

/// Default ClickHouse HTTP interface port
pub const DEFAULT_CLICKHOUSE_PORT: &str = "8123";

/// Which kind of endpoint plays a role (source or target) in a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EndpointKind {
    #[default]
    #[serde(rename = "clickhouse", alias = "database")]
    Database,
    #[serde(rename = "flatfile", alias = "file")]
    FlatFile,
}

impl EndpointKind {
    pub fn id(&self) -> &'static str {
        match self {
            EndpointKind::Database => "clickhouse",
            EndpointKind::FlatFile => "flatfile",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EndpointKind::Database => "ClickHouse",
            EndpointKind::FlatFile => "Flat File",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for EndpointKind {
    type Err = FerryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clickhouse" | "database" | "db" => Ok(EndpointKind::Database),
            "flatfile" | "flat-file" | "file" | "csv" => Ok(EndpointKind::FlatFile),
            other => Err(FerryError::validation(format!(
                "Unknown endpoint kind '{}', expected 'clickhouse' or 'flatfile'",
                other
            ))),
        }
    }
}

/// ClickHouse connection settings
///
/// All fields are opaque strings except `secure` and `port`, which must be
/// numeric once a connection is attempted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseEndpoint {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    /// Credential token, sent as the HTTP password
    #[serde(alias = "jwt_token", alias = "password")]
    pub token: String,
    /// Use HTTPS instead of plain HTTP
    pub secure: bool,
}

impl DatabaseEndpoint {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            ..Default::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.token = token.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Parse the port, rejecting anything that is not a valid TCP port
    pub fn port_number(&self) -> Result<u16> {
        let port = self.port.trim();
        if port.is_empty() {
            return DEFAULT_CLICKHOUSE_PORT
                .parse()
                .map_err(|_| FerryError::validation("Invalid default port"));
        }
        port.parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| FerryError::validation(format!("Invalid port '{}'", self.port)))
    }

    /// Check the fields a connection attempt needs
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(FerryError::validation("Please enter a ClickHouse host"));
        }
        self.port_number()?;
        Ok(())
    }
}

impl Default for DatabaseEndpoint {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_CLICKHOUSE_PORT.to_string(),
            database: "default".to_string(),
            username: "default".to_string(),
            token: String::new(),
            secure: false,
        }
    }
}

impl std::fmt::Debug for DatabaseEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("secure", &self.secure)
            .finish()
    }
}

/// Delimited flat-file location and format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatFileEndpoint {
    #[serde(alias = "file_name")]
    pub path: String,
    pub delimiter: char,
    pub has_header: bool,
}

impl FlatFileEndpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn has_path(&self) -> bool {
        !self.path.trim().is_empty()
    }

    pub fn file_path(&self) -> &Path {
        Path::new(self.path.trim())
    }

    /// The delimiter as a single byte, as required by the CSV codec
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() && self.delimiter != '\n' && self.delimiter != '\r' {
            Ok(self.delimiter as u8)
        } else {
            Err(FerryError::validation(format!(
                "Delimiter {:?} must be a single ASCII character",
                self.delimiter
            )))
        }
    }
}

impl Default for FlatFileEndpoint {
    fn default() -> Self {
        Self {
            path: String::new(),
            delimiter: ',',
            has_header: true,
        }
    }
}

/// Either side of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndpointDescriptor {
    Database(DatabaseEndpoint),
    FlatFile(FlatFileEndpoint),
}

impl EndpointDescriptor {
    pub fn kind(&self) -> EndpointKind {
        match self {
            EndpointDescriptor::Database(_) => EndpointKind::Database,
            EndpointDescriptor::FlatFile(_) => EndpointKind::FlatFile,
        }
    }

    /// Short human-readable label for logs and messages
    pub fn label(&self) -> String {
        match self {
            EndpointDescriptor::Database(db) => {
                format!("clickhouse://{}:{}/{}", db.host, db.port, db.database)
            }
            EndpointDescriptor::FlatFile(file) => file.path.clone(),
        }
    }
}

impl From<DatabaseEndpoint> for EndpointDescriptor {
    fn from(endpoint: DatabaseEndpoint) -> Self {
        EndpointDescriptor::Database(endpoint)
    }
}

impl From<FlatFileEndpoint> for EndpointDescriptor {
    fn from(endpoint: FlatFileEndpoint) -> Self {
        EndpointDescriptor::FlatFile(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_defaults() {
        let db = DatabaseEndpoint::default();
        assert_eq!(db.host, "localhost");
        assert_eq!(db.port_number().unwrap(), 8123);
        assert_eq!(db.database, "default");
        assert!(!db.secure);
    }

    #[test]
    fn test_invalid_port_is_validation_error() {
        let db = DatabaseEndpoint::new("ch.local", "not-a-port");
        let err = db.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);

        let db = DatabaseEndpoint::new("ch.local", "0");
        assert!(db.port_number().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let db = DatabaseEndpoint::default().with_credentials("admin", "s3cret");
        let debug = format!("{:?}", db);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_field_update_keeps_other_fields() {
        let mut file = FlatFileEndpoint::new("data.csv").with_delimiter('|');
        file.has_header = false;
        assert_eq!(file.path, "data.csv");
        assert_eq!(file.delimiter, '|');
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(FlatFileEndpoint::default().delimiter_byte().unwrap(), b',');
        assert_eq!(
            FlatFileEndpoint::default()
                .with_delimiter('\t')
                .delimiter_byte()
                .unwrap(),
            b'\t'
        );
        assert!(FlatFileEndpoint::default()
            .with_delimiter('§')
            .delimiter_byte()
            .is_err());
    }

    #[test]
    fn test_endpoint_kind_parse() {
        assert_eq!("clickhouse".parse::<EndpointKind>().unwrap(), EndpointKind::Database);
        assert_eq!("FlatFile".parse::<EndpointKind>().unwrap(), EndpointKind::FlatFile);
        assert!("postgres".parse::<EndpointKind>().is_err());
    }

    #[test]
    fn test_descriptor_kind() {
        let d: EndpointDescriptor = FlatFileEndpoint::new("a.csv").into();
        assert_eq!(d.kind(), EndpointKind::FlatFile);
        assert_eq!(d.label(), "a.csv");
    }
}
