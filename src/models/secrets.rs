//! Secret usage

use super::validate::{self, Validate, INTEGER_STRING, MAX_FIELD_LENGTH, OCTAL_STRING};
use crate::compose::{SecretRef, SecretRefLong};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Longest value the `mode` field may hold
pub const MAX_MODE_LENGTH: usize = 4;

/// The usage of a secret by a service or an image build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedSecret {
    /// Name of the secret to use
    pub source: String,
    /// File name mounted under `/run/secrets/`, defaults to the source
    #[serde(default)]
    pub target: Option<String>,
    /// Numeric UID that owns the mounted file
    #[serde(default)]
    pub uid: Option<String>,
    /// Numeric GID that owns the mounted file
    #[serde(default)]
    pub gid: Option<String>,
    /// Octal permissions for the mounted file
    #[serde(default)]
    pub mode: Option<String>,
}

impl UsedSecret {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn uid(mut self, uid: &str) -> Self {
        self.uid = Some(uid.to_string());
        self
    }

    pub fn gid(mut self, gid: &str) -> Self {
        self.gid = Some(gid.to_string());
        self
    }

    pub fn mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }

    /// Whether only the source is set
    pub fn is_short_form(&self) -> bool {
        self.target.is_none() && self.uid.is_none() && self.gid.is_none() && self.mode.is_none()
    }

    /// Compose value for this secret reference
    pub fn value(&self) -> SecretRef {
        if self.is_short_form() {
            return SecretRef::Short(self.source.clone());
        }

        SecretRef::Long(SecretRefLong {
            source: self.source.clone(),
            target: self.target.clone(),
            uid: self.uid.clone(),
            gid: self.gid.clone(),
            mode: self.mode.clone(),
        })
    }
}

impl Validate for UsedSecret {
    fn validate(&self) -> Result<()> {
        validate::required("source", &self.source)?;
        validate::max_length("source", &self.source, MAX_FIELD_LENGTH)?;
        validate::optional_length("target", self.target.as_deref())?;

        for (field, value) in [("uid", &self.uid), ("gid", &self.gid)] {
            if let Some(value) = value {
                validate::max_length(field, value, MAX_FIELD_LENGTH)?;
                validate::matches(
                    field,
                    value,
                    &INTEGER_STRING,
                    "The value must be at least one integer and only integers",
                )?;
            }
        }

        if let Some(mode) = &self.mode {
            validate::max_length("mode", mode, MAX_MODE_LENGTH)?;
            validate::matches(
                "mode",
                mode,
                &OCTAL_STRING,
                "The value must be a 3 digit octal",
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_only_is_short_form() {
        let secret = UsedSecret::new("db_password");
        assert!(secret.is_short_form());
        assert_eq!(secret.value(), SecretRef::Short("db_password".to_string()));
    }

    #[test]
    fn test_long_form_has_only_set_keys() {
        let secret = UsedSecret::new("server-certificate").target("server.cert").mode("440");

        let value = serde_json::to_value(secret.value()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "source": "server-certificate",
                "target": "server.cert",
                "mode": "440"
            })
        );
    }

    #[test]
    fn test_validate_uid_and_mode() {
        assert!(UsedSecret::new("s").uid("1000").gid("1000").mode("444").validate().is_ok());
        assert!(UsedSecret::new("s").uid("root").validate().is_err());
        assert!(UsedSecret::new("s").mode("0444").validate().is_err());
        assert!(UsedSecret::new("s").mode("999").validate().is_err());
        assert!(UsedSecret::new("").validate().is_err());
    }

    #[test]
    fn test_validate_gid() {
        assert!(UsedSecret::new("s").gid("0").validate().is_ok());

        let err = UsedSecret::new("s").gid("wheel").validate().unwrap_err();
        assert!(matches!(
            err,
            crate::error::ComposeError::Validation { ref field, .. } if field == "gid"
        ));
    }
}
