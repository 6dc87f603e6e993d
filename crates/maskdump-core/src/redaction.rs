use serde::{Deserialize, Serialize};

use crate::connection::ConnectionDescriptor;

/// Connection metadata with secrets redacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactedConnection {
    pub name: String,
    pub driver: String,
    pub backend: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub redacted: String,
}

/// Describe a connection without its password, suitable for logs and run
/// artifacts.
pub fn redact_connection(descriptor: &ConnectionDescriptor) -> RedactedConnection {
    let backend = descriptor.backend().ok().map(|backend| backend.to_string());
    let scheme = backend.as_deref().unwrap_or(descriptor.driver.as_str());

    let mut redacted = format!("{scheme}://");
    if let Some(user) = &descriptor.username {
        redacted.push_str(user);
        if descriptor.password.is_some() {
            redacted.push_str(":***");
        }
        redacted.push('@');
    }
    if let Some(host) = &descriptor.host {
        redacted.push_str(host);
        if let Some(port) = descriptor.port {
            redacted.push_str(&format!(":{port}"));
        }
    }
    redacted.push('/');
    redacted.push_str(&descriptor.database);
    if let Some(charset) = &descriptor.charset {
        redacted.push_str(&format!("?charset={charset}"));
    }

    RedactedConnection {
        name: descriptor.name.clone(),
        driver: descriptor.driver.clone(),
        backend,
        user: descriptor.username.clone(),
        host: descriptor.host.clone(),
        port: descriptor.port,
        database: if descriptor.database.is_empty() {
            None
        } else {
            Some(descriptor.database.clone())
        },
        redacted,
    }
}
