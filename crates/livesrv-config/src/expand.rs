//! `${VAR}` expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// Bare `$VAR` is left untouched, even next to a braced reference. An unset
/// variable without a default is reported against `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let end = start + len + 1;
        expanded.push_str(&rest[..start]);
        expanded.push_str(&expand_reference(&rest[start..end], field)?);
        rest = &rest[end..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

/// Expand a single `${...}` reference.
fn expand_reference(reference: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env_with_context(reference, |name| match std::env::var(name) {
        Ok(val) => Ok(Some(val)),
        Err(_) => Err(UnsetVar(name.to_owned())),
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a variable that could not be resolved.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_passes_through() {
        assert_eq!(expand_env("localhost", "server.host").unwrap(), "localhost");
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(
            expand_env("$HOME/site", "server.root").unwrap(),
            "$HOME/site"
        );
    }

    #[test]
    fn test_set_var_is_substituted() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("LIVESRV_TEST_EXPAND_HOST", "0.0.0.0");
        }
        let result = expand_env("${LIVESRV_TEST_EXPAND_HOST}", "server.host").unwrap();
        assert_eq!(result, "0.0.0.0");
        unsafe {
            std::env::remove_var("LIVESRV_TEST_EXPAND_HOST");
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("LIVESRV_TEST_EXPAND_UNSET");
        }
        let result =
            expand_env("${LIVESRV_TEST_EXPAND_UNSET:-public}/site", "server.root").unwrap();
        assert_eq!(result, "public/site");
    }

    #[test]
    fn test_bare_dollar_kept_beside_braced_reference() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("LIVESRV_TEST_EXPAND_MIXED");
        }
        let result =
            expand_env("${LIVESRV_TEST_EXPAND_MIXED:-site}/$HOME/$", "server.root").unwrap();
        assert_eq!(result, "site/$HOME/$");
    }

    #[test]
    fn test_unclosed_reference_is_literal() {
        assert_eq!(
            expand_env("${OPEN/site", "server.root").unwrap(),
            "${OPEN/site"
        );
    }

    #[test]
    fn test_missing_var_reports_field() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("LIVESRV_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${LIVESRV_TEST_EXPAND_MISSING}", "server.host").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("LIVESRV_TEST_EXPAND_MISSING"));
        assert!(msg.contains("server.host"));
    }
}
