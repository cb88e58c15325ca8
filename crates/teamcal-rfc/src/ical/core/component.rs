//! iCalendar components (RFC 5545 §3.4, §3.6).

use super::Property;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Calendar,
    Event,
    Todo,
    Journal,
    FreeBusy,
    Timezone,
    Alarm,
    Standard,
    Daylight,
    /// X- or IANA component this crate does not model.
    Other,
}

impl ComponentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Other => "X-COMPONENT",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VFREEBUSY" => Self::FreeBusy,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component with its properties (in order of appearance) and nested components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Name as written, kept for X-components.
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Component>,
}

impl Component {
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a component from the name found on a `BEGIN:` line.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        Self {
            kind: ComponentKind::parse(&name),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn calendar() -> Self {
        Self::new(ComponentKind::Calendar)
    }

    #[must_use]
    pub fn event() -> Self {
        Self::new(ComponentKind::Event)
    }

    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    /// Replaces every property named like `prop` with `prop`.
    pub fn set_property(&mut self, prop: Property) {
        self.remove_properties(&prop.name);
        self.properties.push(prop);
    }

    pub fn remove_properties(&mut self, name: &str) {
        self.properties
            .retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn get_properties(&self, name: &str) -> Vec<&Property> {
        self.properties
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .collect()
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.get_property("UID").and_then(Property::as_text)
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.get_property("SUMMARY").and_then(Property::as_text)
    }

    #[must_use]
    pub fn events(&self) -> Vec<&Self> {
        self.children
            .iter()
            .filter(|c| c.kind == ComponentKind::Event)
            .collect()
    }
}

/// A VCALENDAR document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ICalendar {
    pub root: Component,
}

impl ICalendar {
    /// Creates a calendar with `VERSION:2.0` and the given `PRODID`.
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        let mut root = Component::calendar();
        root.add_property(Property::text("VERSION", "2.0"));
        root.add_property(Property::text("PRODID", prodid));
        Self { root }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.root.set_property(Property::text("METHOD", method));
        self
    }

    #[must_use]
    pub fn prodid(&self) -> Option<&str> {
        self.root.get_property("PRODID").and_then(Property::as_text)
    }

    /// The iTIP `METHOD`, if any.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.root.get_property("METHOD").and_then(Property::as_text)
    }

    pub fn add_event(&mut self, event: Component) {
        self.root.add_child(event);
    }

    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.root.events()
    }
}
