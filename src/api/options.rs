use crate::diff::Equivalences;
use crate::filter::ObjectType;
use crate::mysql::introspect::DEFAULT_RESERVED_PREFIX;

/// Options for comparing a target database against a base database.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Reference database, `mysql://[user[:password]@]host[:port]/database`
    pub base_url: String,
    /// Database checked against the reference
    pub target_url: String,
    /// Tables and columns starting with this prefix are never compared
    pub reserved_prefix: String,
    /// Glob patterns of table names to compare (all when empty)
    pub include: Vec<String>,
    /// Glob patterns of table names to skip
    pub exclude: Vec<String>,
    /// Restrict the comparison to tables or views (both when empty)
    pub only: Vec<ObjectType>,
    /// Values treated as equal when comparing column properties
    pub equivalences: Equivalences,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            target_url: String::new(),
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            only: Vec::new(),
            equivalences: Equivalences::default(),
        }
    }
}

impl CompareOptions {
    /// Create new compare options with required fields.
    pub fn new(base_url: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            target_url: target_url.into(),
            ..Default::default()
        }
    }

    /// Set the reserved prefix. An empty prefix disables the exclusion.
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    /// Only compare tables matching one of `patterns`.
    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    /// Skip tables matching one of `patterns`.
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Restrict the comparison to the given object types.
    pub fn with_only(mut self, only: Vec<ObjectType>) -> Self {
        self.only = only;
        self
    }

    /// Replace the equivalence registry.
    pub fn with_equivalences(mut self, equivalences: Equivalences) -> Self {
        self.equivalences = equivalences;
        self
    }
}
