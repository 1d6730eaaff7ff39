//! ClickHouse client wrapper

use ferry_core::{DatabaseEndpoint, FerryError, Record, Result, TableReference, Value};

use crate::sql::build_select;

/// ClickHouse connection bound to one database endpoint
///
/// Wraps the HTTP client from the `clickhouse` crate. The client is cheap to
/// clone and holds no open socket between requests.
#[derive(Clone)]
pub struct ClickHouseClient {
    client: clickhouse::Client,
    url: String,
    database: String,
}

impl ClickHouseClient {
    /// Build a client without contacting the server
    pub fn new(endpoint: &DatabaseEndpoint) -> Result<Self> {
        endpoint.validate()?;
        let url = build_url(endpoint)?;
        let database = if endpoint.database.trim().is_empty() {
            "default".to_string()
        } else {
            endpoint.database.trim().to_string()
        };

        let client = clickhouse::Client::default()
            .with_url(&url)
            .with_user(endpoint.username.trim())
            .with_password(&endpoint.token)
            .with_database(&database)
            .with_option("output_format_json_quote_64bit_integers", "0");

        Ok(Self {
            client,
            url,
            database,
        })
    }

    /// Build a client and verify the server accepts the credentials
    #[tracing::instrument(skip(endpoint), fields(host = %endpoint.host, database = %endpoint.database))]
    pub async fn connect(endpoint: &DatabaseEndpoint) -> Result<Self> {
        tracing::debug!("connecting to ClickHouse");
        let client = Self::new(endpoint)?;
        client.ping().await?;
        tracing::debug!("ClickHouse connection established");
        Ok(client)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub(crate) fn client(&self) -> &clickhouse::Client {
        &self.client
    }

    pub async fn ping(&self) -> Result<()> {
        let _: u8 = self
            .client
            .query("SELECT 1")
            .fetch_one()
            .await
            .map_err(map_error)?;
        Ok(())
    }

    /// Run a statement that returns no rows
    pub async fn execute(&self, sql: &str) -> Result<()> {
        let start = std::time::Instant::now();
        self.client.query(sql).execute().await.map_err(map_error)?;
        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "execute completed"
        );
        Ok(())
    }

    /// Run a query and decode its `JSONEachRow` output
    ///
    /// Records follow `columns` order; an empty slice keeps the order in which
    /// the server's JSON object lists its keys after decoding.
    pub async fn fetch_records(&self, sql: &str, columns: &[String]) -> Result<Vec<Record>> {
        let start = std::time::Instant::now();
        let mut cursor = self
            .client
            .query(sql)
            .fetch_bytes("JSONEachRow")
            .map_err(map_error)?;

        let mut buffer: Vec<u8> = Vec::new();
        let mut rows = Vec::new();
        while let Some(chunk) = cursor.next().await.map_err(map_error)? {
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(record) = parse_json_row(&line, columns)? {
                    rows.push(record);
                }
            }
        }
        if let Some(record) = parse_json_row(&buffer, columns)? {
            rows.push(record);
        }

        tracing::debug!(
            row_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "query completed"
        );
        Ok(rows)
    }

    /// Select the projected columns of a table or join
    #[tracing::instrument(skip(self, columns), fields(table = %reference, columns = columns.len()))]
    pub async fn fetch(
        &self,
        reference: &TableReference,
        columns: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Record>> {
        if reference.is_empty() {
            return Err(FerryError::validation("Please select a table first"));
        }
        if !reference.is_multi_table() {
            if let Some(table) = reference.primary_table() {
                self.ensure_columns_exist(table, columns).await?;
            }
        }
        let sql = build_select(reference, columns, limit);
        self.fetch_records(&sql, columns).await
    }

    async fn ensure_columns_exist(&self, table: &str, columns: &[String]) -> Result<()> {
        let available = self.describe_table(table).await?;
        let missing: Vec<&str> = columns
            .iter()
            .filter(|c| !available.iter().any(|a| &a.name == *c))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FerryError::NotFound(format!(
                "columns not found in table {}: {}",
                table,
                missing.join(", ")
            )))
        }
    }
}

impl std::fmt::Debug for ClickHouseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseClient")
            .field("url", &self.url)
            .field("database", &self.database)
            .finish()
    }
}

/// Build the HTTP(S) base URL for an endpoint
pub fn build_url(endpoint: &DatabaseEndpoint) -> Result<String> {
    let scheme = if endpoint.secure { "https" } else { "http" };
    let host = endpoint.host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
        .trim_end_matches('/');
    let port = endpoint.port_number()?;
    Ok(format!("{}://{}:{}", scheme, host, port))
}

/// Decode one `JSONEachRow` line; blank lines yield `None`
pub(crate) fn parse_json_row(line: &[u8], columns: &[String]) -> Result<Option<Record>> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(trimmed)
        .map_err(|e| FerryError::Protocol(format!("malformed JSONEachRow row: {}", e)))?;

    let record = if columns.is_empty() {
        object
            .into_iter()
            .map(|(k, v)| (k, Value::from_json(v)))
            .collect()
    } else {
        columns
            .iter()
            .map(|c| {
                let value = object.remove(c).map(Value::from_json).unwrap_or(Value::Null);
                (c.clone(), value)
            })
            .collect()
    };
    Ok(Some(record))
}

/// Map a `clickhouse` client error onto the Ferry taxonomy
pub(crate) fn map_error(err: clickhouse::error::Error) -> FerryError {
    use clickhouse::error::Error;

    match err {
        Error::Network(e) => FerryError::Connection(e.to_string()),
        Error::TimedOut => FerryError::Connection("request to ClickHouse timed out".to_string()),
        Error::BadResponse(message) => classify_server_error(message),
        other => FerryError::Protocol(other.to_string()),
    }
}

/// Classify a server-side exception by its ClickHouse error code
pub(crate) fn classify_server_error(message: String) -> FerryError {
    let message = message.trim().to_string();
    let has = |needle: &str| message.contains(needle);

    if has("Code: 516.") || has("AUTHENTICATION_FAILED") {
        FerryError::Connection(message)
    } else if has("Code: 60.")
        || has("UNKNOWN_TABLE")
        || has("Code: 81.")
        || has("UNKNOWN_DATABASE")
    {
        FerryError::NotFound(message)
    } else {
        FerryError::Query(message)
    }
}
