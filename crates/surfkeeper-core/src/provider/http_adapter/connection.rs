use reqwest::Url;

use crate::error::ProviderError;

pub(super) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
) -> Result<Option<(String, String)>, ProviderError> {
    match (user, pass) {
        (Some(u), Some(p)) => Ok(Some((u.to_owned(), p.to_owned()))),
        (Some(_), None) | (None, Some(_)) => Err(ProviderError::Config(
            "both bridge user and bridge pass must be set together".to_owned(),
        )),
        (None, None) => Ok(None),
    }
}

/// Validate the bridge URL and strip trailing slashes so sub-paths can be
/// appended.
pub(super) fn parse_connection(connection: &str) -> Result<String, ProviderError> {
    let parsed = Url::parse(connection).map_err(|e| {
        ProviderError::Config(format!(
            "invalid bridge url `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(connection.trim_end_matches('/').to_owned()),
        other => Err(ProviderError::Config(format!(
            "unsupported bridge url scheme `{other}`; expected http or https"
        ))),
    }
}
