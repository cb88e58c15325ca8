//! iCalendar properties (RFC 5545 §3.5, §3.8).

use super::{Date, DateTime, Parameter, RRule, Value};
use crate::ical::build::format_parameters;
use crate::ical::parse::{ParseResult, parse_parameter_list};

/// A property with its parameters and typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    pub params: Vec<Parameter>,
    /// Parameter text as read, written back verbatim until a parameter
    /// is changed.
    pub raw_params: Option<String>,
    pub value: Value,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            raw_params: None,
            value,
        }
    }

    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Value::Text(value.into()))
    }

    #[must_use]
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self::new(name, Value::Integer(value))
    }

    /// DATE-TIME property; a zoned value also gets its `TZID` parameter.
    #[must_use]
    pub fn datetime(name: impl Into<String>, value: DateTime) -> Self {
        let tzid = value.tzid().map(String::from);
        let mut prop = Self::new(name, Value::DateTime(value));
        if let Some(tzid) = tzid {
            prop.params.push(Parameter::tzid(tzid));
        }
        prop
    }

    /// DATE property carrying `VALUE=DATE`.
    #[must_use]
    pub fn date(name: impl Into<String>, value: Date) -> Self {
        Self::new(name, Value::Date(value)).with_param(Parameter::value_type("DATE"))
    }

    #[must_use]
    pub fn cal_address(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(name, Value::CalAddress(address.into()))
    }

    #[must_use]
    pub fn recur(rule: RRule) -> Self {
        Self::new("RRULE", Value::Recur(Box::new(rule)))
    }

    /// Keeps `raw` exactly as given when written.
    #[must_use]
    pub fn raw(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(name, Value::Unknown(raw.into()))
    }

    #[must_use]
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.set_param(param);
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: impl IntoIterator<Item = Parameter>) -> Self {
        for param in params {
            self.set_param(param);
        }
        self
    }

    /// Parameters parsed from `raw`, which is kept for writing.
    ///
    /// ## Errors
    /// Returns an error if `raw` is not a parameter list.
    pub fn with_raw_params(self, raw: &str) -> ParseResult<Self> {
        let raw = raw.trim();
        let mut prop = self.with_params(parse_parameter_list(raw)?);
        if !prop.params.is_empty() {
            prop.raw_params = Some(raw.to_string());
        }
        Ok(prop)
    }

    /// Parameter text as it is written.
    #[must_use]
    pub fn params_text(&self) -> String {
        self.raw_params
            .clone()
            .unwrap_or_else(|| format_parameters(&self.params))
    }

    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name).and_then(Parameter::value)
    }

    /// Replaces a parameter of the same name, or appends it.
    pub fn set_param(&mut self, param: Parameter) {
        self.raw_params = None;
        if let Some(existing) = self
            .params
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&param.name))
        {
            *existing = param;
        } else {
            self.params.push(param);
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime> {
        self.value.as_datetime()
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<&Date> {
        self.value.as_date()
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i32> {
        self.value.as_integer()
    }

    /// Whether the value is a DATE (or DATE list) rather than a DATE-TIME.
    #[must_use]
    pub const fn is_date_valued(&self) -> bool {
        matches!(self.value, Value::Date(_) | Value::DateList(_))
    }
}
