//! iCalendar property parameters (RFC 5545 §3.2).

/// A single property parameter such as `CN="Alice Balder"` or `TZID=Europe/Berlin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Unescaped values; most parameters carry exactly one.
    pub values: Vec<String>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// Returns the first value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    #[must_use]
    pub fn tzid(tzid: impl Into<String>) -> Self {
        Self::new("TZID", tzid)
    }

    #[must_use]
    pub fn value_type(value_type: impl Into<String>) -> Self {
        Self::new("VALUE", value_type)
    }

    #[must_use]
    pub fn cn(name: impl Into<String>) -> Self {
        Self::new("CN", name)
    }

    #[must_use]
    pub fn partstat(status: impl Into<String>) -> Self {
        Self::new("PARTSTAT", status)
    }

    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self::new("ROLE", role)
    }

    #[must_use]
    pub fn fmttype(media_type: impl Into<String>) -> Self {
        Self::new("FMTTYPE", media_type)
    }
}
