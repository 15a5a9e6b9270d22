use crate::utils::error::{ConsoleError, Result};
use std::collections::HashSet;
use std::net::SocketAddr;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Accepts absolute `http`/`https` URLs that carry a host.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<Url> {
    let invalid = |reason: String| ConsoleError::InvalidUrlError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason,
    };

    if url_str.trim().is_empty() {
        return Err(invalid("URL cannot be empty".to_string()));
    }

    if url_str.trim() != url_str {
        return Err(invalid("URL has surrounding whitespace".to_string()));
    }

    let url = Url::parse(url_str).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("Unsupported URL scheme: {}", scheme))),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(invalid("URL has no host".to_string())),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ConsoleError::ConfigError {
            field: field_name.to_string(),
            message: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ConsoleError::ConfigError {
            field: field_name.to_string(),
            message: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_listen_addr(field_name: &str, addr: &str) -> Result<SocketAddr> {
    addr.parse::<SocketAddr>()
        .map_err(|e| ConsoleError::ConfigError {
            field: field_name.to_string(),
            message: format!("'{}' is not a socket address: {}", addr, e),
        })
}

/// A proxy prefix is an absolute path such as `/api/proxy`, without a trailing slash.
pub fn validate_proxy_prefix(field_name: &str, prefix: &str) -> Result<()> {
    let reason = if !prefix.starts_with('/') {
        Some("must start with '/'")
    } else if prefix.len() < 2 {
        Some("cannot be the root path")
    } else if prefix.ends_with('/') {
        Some("must not end with '/'")
    } else if prefix.contains(['?', '#', '*', ':', '{', '}']) {
        Some("must be a plain path")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConsoleError::ConfigError {
            field: field_name.to_string(),
            message: format!("'{}' {}", prefix, reason),
        }),
        None => Ok(()),
    }
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<String> = allowed_extensions
        .iter()
        .map(|ext| ext.to_ascii_lowercase())
        .collect();

    for file in files {
        if let Some(extension) = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            if !allowed_set.contains(&extension.to_ascii_lowercase()) {
                return Err(ConsoleError::ValidationError {
                    field: field_name.to_string(),
                    message: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        } else {
            return Err(ConsoleError::ValidationError {
                field: field_name.to_string(),
                message: format!("'{}' has no extension or an invalid filename", file),
            });
        }
    }

    Ok(())
}
