//! Builtin value coercions and the named coercion registry.
//!
//! Coercions are pure functions over a single raw value: no I/O, no access to
//! sibling fields. Malformed input is an error (surfaced as a field-level
//! validation failure by the transformer), never a silent pass-through.

use crate::error::{FieldError, MappingError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A named coercion: `raw value -> canonical value | reason`.
pub type CoercionFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Registry of named coercions, immutable once handed to a transformer.
#[derive(Clone, Default)]
pub struct CoercionRegistry {
    fns: HashMap<String, CoercionFn>,
}

impl CoercionRegistry {
    /// An empty registry (no coercions, not even `identity`).
    #[must_use]
    pub fn empty() -> Self {
        CoercionRegistry::default()
    }

    /// The builtin registry: `identity`, `validate_email`, `normalize_phone`,
    /// `normalize_phone_array`, `normalize_address`, `timezone_to_iana`,
    /// `country_to_iso`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut reg = CoercionRegistry::default();
        reg.register("identity", identity);
        reg.register("validate_email", validate_email);
        reg.register("normalize_phone", normalize_phone);
        reg.register("normalize_phone_array", normalize_phone_array);
        reg.register("normalize_address", normalize_address);
        reg.register("timezone_to_iana", timezone_to_iana);
        reg.register("country_to_iso", country_to_iso);
        reg
    }

    /// Register a coercion under `name`, replacing any existing one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    ) {
        self.fns.insert(name.into(), Arc::new(f));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CoercionFn> {
        self.fns.get(name)
    }

    /// Apply the named coercion to a raw value.
    ///
    /// The two error classes are kept apart: the outer error is a
    /// configuration defect (unregistered name, never skipped), the inner
    /// result is the coercion's verdict on the data itself.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnknownTransform`] if `name` is not registered.
    pub fn apply(
        &self,
        name: &str,
        field: &str,
        value: &Value,
    ) -> Result<std::result::Result<Value, FieldError>, MappingError> {
        let Some(coercion) = self.fns.get(name) else {
            return Err(MappingError::UnknownTransform {
                name: name.to_string(),
                field: field.to_string(),
            });
        };
        Ok(coercion(value).map_err(|reason| FieldError::invalid(field, reason)))
    }

    /// Registered names, sorted for stable diagnostics.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for CoercionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoercionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Pass-through, for simple renames.
pub fn identity(value: &Value) -> Result<Value, String> {
    Ok(value.clone())
}

fn email_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Syntactic RFC-shape check only; no deliverability checks.
        regex::Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("builtin email regex is valid")
    })
}

/// Validate that a value is a plausible email address.
pub fn validate_email(value: &Value) -> Result<Value, String> {
    let Some(s) = value.as_str() else {
        return Err("expected a string email address".to_string());
    };
    if email_regex().is_match(s) {
        Ok(value.clone())
    } else {
        Err(format!("'{s}' is not a valid email address"))
    }
}

/// Normalize a phone number to an E.164-like representation.
///
/// Ten digits are taken as a US number (`+1NNNNNNNNNN`); longer numbers are
/// assumed to already carry a country code.
pub fn normalize_phone(value: &Value) -> Result<Value, String> {
    let Some(s) = value.as_str() else {
        return Err("expected a string phone number".to_string());
    };
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Ok(Value::String(format!("+1{digits}"))),
        len if len > 10 => Ok(Value::String(format!("+{digits}"))),
        _ => Err(format!("'{s}' is not a recognizable phone number")),
    }
}

/// Normalize an array of `{"number": ...}` objects via [`normalize_phone`].
///
/// Elements without a `number` key pass through unchanged.
pub fn normalize_phone_array(value: &Value) -> Result<Value, String> {
    let Some(items) = value.as_array() else {
        return Err("expected an array of phone numbers".to_string());
    };
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            out.push(item.clone());
            continue;
        };
        let Some(number) = obj.get("number") else {
            out.push(item.clone());
            continue;
        };
        let normalized =
            normalize_phone(number).map_err(|reason| format!("entry {idx}: {reason}"))?;
        let mut obj = obj.clone();
        obj.insert("number".to_string(), normalized);
        out.push(Value::Object(obj));
    }
    Ok(Value::Array(out))
}

const ADDRESS_ALIASES: &[(&str, &[&str])] = &[
    ("street", &["street", "street_address", "address_line_1", "line1"]),
    ("street2", &["street2", "address_line_2", "line2"]),
    ("city", &["city", "locality"]),
    ("state", &["state", "region", "province"]),
    ("postal_code", &["postal_code", "zip", "zip_code", "postcode"]),
    ("country", &["country", "country_code"]),
];

/// Canonicalize address field names (`zip` -> `postal_code`, `line1` ->
/// `street`, ...). Fields outside the alias table are preserved verbatim.
pub fn normalize_address(value: &Value) -> Result<Value, String> {
    let Some(obj) = value.as_object() else {
        return Err("expected an address object".to_string());
    };
    let mut out = Map::new();
    for (canonical, aliases) in ADDRESS_ALIASES {
        for alias in *aliases {
            if let Some(v) = obj.get(*alias) {
                out.insert((*canonical).to_string(), v.clone());
                break;
            }
        }
    }
    for (key, v) in obj {
        let is_alias = ADDRESS_ALIASES
            .iter()
            .any(|(_, aliases)| aliases.contains(&key.as_str()));
        if !is_alias {
            out.insert(key.clone(), v.clone());
        }
    }
    Ok(Value::Object(out))
}

const TIMEZONE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("EST", "America/New_York"),
    ("EDT", "America/New_York"),
    ("CST", "America/Chicago"),
    ("CDT", "America/Chicago"),
    ("MST", "America/Denver"),
    ("MDT", "America/Denver"),
    ("PST", "America/Los_Angeles"),
    ("PDT", "America/Los_Angeles"),
    ("GMT", "Europe/London"),
    ("UTC", "UTC"),
];

/// Convert common timezone abbreviations to IANA names.
///
/// Unknown values pass through unchanged (they may already be IANA names).
pub fn timezone_to_iana(value: &Value) -> Result<Value, String> {
    let Some(s) = value.as_str() else {
        return Err("expected a string timezone".to_string());
    };
    let upper = s.to_uppercase();
    let mapped = TIMEZONE_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == upper)
        .map(|(_, iana)| *iana);
    Ok(Value::String(mapped.unwrap_or(s).to_string()))
}

const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("United States", "US"),
    ("United States of America", "US"),
    ("USA", "US"),
    ("US", "US"),
    ("us", "US"),
    ("Canada", "CA"),
    ("United Kingdom", "GB"),
    ("Great Britain", "GB"),
    ("UK", "GB"),
    ("Australia", "AU"),
    ("Germany", "DE"),
    ("France", "FR"),
    ("Japan", "JP"),
    ("China", "CN"),
    ("India", "IN"),
    ("Brazil", "BR"),
    ("Mexico", "MX"),
];

/// Convert a country name to its ISO 3166-1 alpha-2 code.
///
/// Names outside the table pass through upper-cased.
pub fn country_to_iso(value: &Value) -> Result<Value, String> {
    let Some(s) = value.as_str() else {
        return Err("expected a string country name".to_string());
    };
    let mapped = COUNTRY_NAMES
        .iter()
        .find(|(name, _)| *name == s)
        .map(|(_, iso)| (*iso).to_string());
    Ok(Value::String(mapped.unwrap_or_else(|| s.to_uppercase())))
}
