//! Parsing of store connection strings.
//!
//! ```text
//! scheme://[user:password@]host[:port][,host[:port]...][/database][?options]
//! ```
//!
//! Supported schemes are `memory`, `mongodb` and `mongodb+srv`. Recognized
//! options are `w` and `appName`; any other option is kept as given.

use std::fmt::Display;
use std::str::FromStr;

use crate::common::{DEFAULT_PORT, MEMORY_SCHEME, MONGODB_SCHEME, MONGODB_SRV_SCHEME};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::session::WriteConcern;
use crate::store::validate_database_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Memory,
    MongoDb,
    MongoDbSrv,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Memory => MEMORY_SCHEME,
            Scheme::MongoDb => MONGODB_SCHEME,
            Scheme::MongoDbSrv => MONGODB_SRV_SCHEME,
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `host:port` of a connection string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAddress {
    host: String,
    port: u16,
}

impl HostAddress {
    pub fn new(host: &str, port: u16) -> Self {
        HostAddress {
            host: host.to_lowercase(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Display for HostAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A parsed connection string.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionString {
    raw: String,
    scheme: Scheme,
    hosts: Vec<HostAddress>,
    has_credentials: bool,
    database: Option<String>,
    write_concern: Option<WriteConcern>,
    app_name: Option<String>,
    other_options: Vec<(String, String)>,
}

fn invalid_uri(message: String) -> DocStoreError {
    log::error!("{}", message);
    DocStoreError::new(&message, ErrorKind::InvalidUri)
}

impl ConnectionString {
    pub fn parse(uri: &str) -> DocStoreResult<ConnectionString> {
        let (scheme, rest) = match uri.split_once("://") {
            Some(split) => split,
            None => return Err(invalid_uri(format!("Connection string '{}' has no scheme", uri))),
        };
        let scheme = match scheme.to_lowercase().as_str() {
            MEMORY_SCHEME => Scheme::Memory,
            MONGODB_SCHEME => Scheme::MongoDb,
            MONGODB_SRV_SCHEME => Scheme::MongoDbSrv,
            other => return Err(invalid_uri(format!("Unsupported connection string scheme '{}'", other))),
        };

        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };
        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, Some(path)),
            None => (rest, None),
        };
        let (has_credentials, host_list) = match authority.rsplit_once('@') {
            Some((_, hosts)) => (true, hosts),
            None => (false, authority),
        };

        let hosts = host_list
            .split(',')
            .map(parse_host)
            .collect::<DocStoreResult<Vec<_>>>()?;
        if scheme == Scheme::MongoDbSrv && (hosts.len() != 1 || host_list.contains(':')) {
            return Err(invalid_uri(format!(
                "A {} connection string needs exactly one host name without a port",
                MONGODB_SRV_SCHEME
            )));
        }

        let database = match path {
            Some(name) if !name.is_empty() => {
                validate_database_name(name).map_err(|e| {
                    DocStoreError::new_with_cause(
                        &format!("Invalid database '{}' in connection string", name),
                        ErrorKind::InvalidUri,
                        e,
                    )
                })?;
                Some(name.to_string())
            }
            _ => None,
        };

        let mut parsed = ConnectionString {
            raw: uri.to_string(),
            scheme,
            hosts,
            has_credentials,
            database,
            write_concern: None,
            app_name: None,
            other_options: Vec::new(),
        };
        if let Some(query) = query {
            parsed.parse_options(query)?;
        }
        Ok(parsed)
    }

    fn parse_options(&mut self, query: &str) -> DocStoreResult<()> {
        for option in query.split('&').filter(|o| !o.is_empty()) {
            let (key, value) = match option.split_once('=') {
                Some(pair) => pair,
                None => return Err(invalid_uri(format!("Connection string option '{}' has no value", option))),
            };
            match key.to_lowercase().as_str() {
                "w" => self.write_concern = Some(parse_write_concern(value)?),
                "appname" => self.app_name = Some(value.to_string()),
                _ => {
                    log::debug!("Keeping connection string option {}={}", key, value);
                    self.other_options.push((key.to_string(), value.to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn hosts(&self) -> &[HostAddress] {
        &self.hosts
    }

    /// Gets the first host, which addresses the deployment of a memory store.
    pub fn primary_host(&self) -> &HostAddress {
        // parsing never yields an empty host list
        &self.hosts[0]
    }

    pub fn has_credentials(&self) -> bool {
        self.has_credentials
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn write_concern(&self) -> Option<WriteConcern> {
        self.write_concern
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn other_options(&self) -> &[(String, String)] {
        &self.other_options
    }

    /// The connection string exactly as given, for handing to a driver.
    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ConnectionString {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectionString::parse(s)
    }
}

impl Display for ConnectionString {
    /// Writes the connection string without credentials or options.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.scheme)?;
        for (i, host) in self.hosts.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", host)?;
        }
        if let Some(database) = &self.database {
            write!(f, "/{}", database)?;
        }
        Ok(())
    }
}

fn parse_host(host: &str) -> DocStoreResult<HostAddress> {
    let (name, port) = if let Some(bracketed) = host.strip_prefix('[') {
        match bracketed.split_once(']') {
            Some((name, "")) => (name, None),
            Some((name, port)) => match port.strip_prefix(':') {
                Some(port) => (name, Some(port)),
                None => return Err(invalid_uri(format!("Invalid host '{}' in connection string", host))),
            },
            None => return Err(invalid_uri(format!("Unclosed IPv6 address '{}' in connection string", host))),
        }
    } else {
        match host.split_once(':') {
            Some((name, port)) => (name, Some(port)),
            None => (host, None),
        }
    };

    if name.is_empty() {
        return Err(invalid_uri("Connection string contains an empty host".to_string()));
    }
    let port = match port {
        None => DEFAULT_PORT,
        Some(port) => match port.parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => return Err(invalid_uri(format!("Invalid port '{}' for host '{}'", port, name))),
        },
    };
    Ok(HostAddress::new(name, port))
}

fn parse_write_concern(value: &str) -> DocStoreResult<WriteConcern> {
    if value.eq_ignore_ascii_case("majority") {
        return Ok(WriteConcern::Majority);
    }
    match value.parse::<u32>() {
        Ok(0) => Ok(WriteConcern::Unacknowledged),
        Ok(nodes) => Ok(WriteConcern::Nodes(nodes)),
        Err(_) => Err(invalid_uri(format!("Invalid write concern w={}", value))),
    }
}
