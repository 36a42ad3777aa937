//! `${VAR}` and `${VAR:-default}` expansion for credential fields.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// Bare `$VAR` is left alone so tokens containing `$` survive unchanged.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| {
        std::env::var(name).map(Some).map_err(|_| UnsetVar(name.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional field in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(inner) = value.as_mut() {
        *inner = expand_env(inner, field)?;
    }
    Ok(())
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDATLAS_EXPAND_SET", "alice");
        }
        let result = expand_env("${MDATLAS_EXPAND_SET}", "jira.username").unwrap();
        assert_eq!(result, "alice");
        unsafe {
            std::env::remove_var("MDATLAS_EXPAND_SET");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDATLAS_EXPAND_UNSET");
        }
        let result = expand_env("${MDATLAS_EXPAND_UNSET:-Task}", "jira.issue_type").unwrap();
        assert_eq!(result, "Task");
    }

    #[test]
    fn test_expand_embedded_in_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDATLAS_EXPAND_HOST", "wiki.example.com");
        }
        let result = expand_env("https://${MDATLAS_EXPAND_HOST}/", "confluence.base_url").unwrap();
        assert_eq!(result, "https://wiki.example.com/");
        unsafe {
            std::env::remove_var("MDATLAS_EXPAND_HOST");
        }
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDATLAS_EXPAND_MISSING");
        }
        let err = expand_env("${MDATLAS_EXPAND_MISSING}", "confluence.api_token").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MDATLAS_EXPAND_MISSING"));
        assert!(err.to_string().contains("confluence.api_token"));
    }

    #[test]
    fn test_bare_dollar_untouched() {
        let result = expand_env("pa$$word", "jira.api_token").unwrap();
        assert_eq!(result, "pa$$word");
    }

    #[test]
    fn test_expand_opt_none() {
        let mut value = None;
        expand_opt(&mut value, "jira.assignee").unwrap();
        assert_eq!(value, None);
    }
}
