use crate::{Flag, Variant};

/// A namespace of flags and variants registered together with [`Client::register`].
///
/// Each entry is stored as `namespace.name`, or just `name` when the namespace is empty.
///
/// ```
/// # use rox::{Container, Flag, Variant};
/// let show_banner = Flag::new(false);
/// let title_color = Variant::new("red", ["green", "blue"]);
///
/// let container = Container::new("billing")
///     .flag("show_banner", &show_banner)
///     .variant("title_color", &title_color);
///
/// let names: Vec<_> = container.entries().map(|(name, _)| name).collect();
/// assert_eq!(names, ["billing.show_banner", "billing.title_color"]);
/// ```
///
/// [`Client::register`]: crate::Client::register
#[derive(Debug, Clone)]
pub struct Container {
    namespace: String,
    entries: Vec<(String, Variant)>,
}

impl Container {
    /// Create an empty container. An empty `namespace` leaves entry names unprefixed.
    pub fn new(namespace: impl Into<String>) -> Container {
        Container {
            namespace: namespace.into(),
            entries: Vec::new(),
        }
    }

    /// Add a flag.
    pub fn flag(self, name: &str, flag: &Flag) -> Container {
        self.variant(name, flag.variant())
    }

    /// Add a variant. The container keeps a handle to the same variant, so evaluating `variant`
    /// after registration observes the experiment bound to it.
    pub fn variant(mut self, name: &str, variant: &Variant) -> Container {
        let name = if self.namespace.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{}", self.namespace, name)
        };
        self.entries.push((name, variant.clone()));
        self
    }

    /// Namespace entries are registered under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Entries with their full names, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.entries
            .iter()
            .map(|(name, variant)| (name.as_str(), variant))
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Variant)> {
        self.entries
    }
}
