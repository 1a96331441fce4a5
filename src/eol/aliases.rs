//! Package name to endoflife.date product mapping

use std::collections::HashMap;

/// Built-in mapping from package-manager names to dataset product slugs
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    // Node.js
    ("react", "react"),
    ("angular", "angular"),
    ("@angular/core", "angular"),
    ("vue", "vue"),
    ("node", "nodejs"),
    ("nodejs", "nodejs"),
    // Python
    ("django", "django"),
    ("python", "python"),
    // Java
    ("spring", "spring-framework"),
    ("spring-core", "spring-framework"),
    ("spring-boot", "spring-boot"),
    ("spring-boot-starter-parent", "spring-boot"),
    ("java", "java"),
];

/// Maps package names to dataset products
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// Table holding only the built-in mappings
    pub fn builtin() -> Self {
        let entries = BUILTIN_ALIASES
            .iter()
            .map(|(name, product)| (name.to_string(), product.to_string()))
            .collect();
        Self { entries }
    }

    /// Adds or overrides mappings (builder pattern)
    pub fn with_extra<I, K, V>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, product) in extra {
            self.entries.insert(normalize(name.as_ref()), product.into());
        }
        self
    }

    /// Product slug for `package_name`, or `None` when it is not mapped
    pub fn product_for(&self, package_name: &str) -> Option<&str> {
        let lower = package_name.trim().to_lowercase();
        self.entries
            .get(&lower)
            .or_else(|| self.entries.get(&normalize(&lower)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}
