//! Component / property tree produced by the decoder and consumed by the encoder.

/// A single content line: `NAME;PARAM=VALUE:value`.
///
/// Names and parameter names are stored upper-cased. `value` is kept raw (still
/// TEXT-escaped); use [`Property::text`] for the unescaped form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl Property {
    /// Build a property whose value is already in wire form.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            params: Vec::new(),
            value: value.into(),
        }
    }

    /// Build a TEXT property, escaping the value.
    pub fn text_value(name: &str, value: &str) -> Self {
        Self::new(name, crate::encoder::escape_text(value))
    }

    /// Add a parameter (builder style).
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_ascii_uppercase(), value.into()));
        self
    }

    /// Look up a parameter by (case-insensitive) name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The value with TEXT escapes (`\n`, `\,`, `\;`, `\\`) resolved.
    pub fn text(&self) -> String {
        crate::decoder::unescape_text(&self.value)
    }
}

/// A `BEGIN:X` ... `END:X` block with its properties and nested components.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    pub name: String,
    pub properties: Vec<Property>,
    pub components: Vec<Component>,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            ..Self::default()
        }
    }

    /// First property with the given name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// All properties with the given name (e.g. repeated `CATEGORIES`).
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    /// Unescaped TEXT value of the first property with the given name.
    pub fn text(&self, name: &str) -> Option<String> {
        self.property(name).map(Property::text)
    }

    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn push_component(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Direct children with the given component name (e.g. `VEVENT`).
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Component> {
        self.components
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }
}
