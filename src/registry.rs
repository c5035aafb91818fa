//! Aggregated definition registry.
//!
//! Subsystems declare their definitions in tables, one namespace each. A
//! [`Registry`] merges tables in order and rejects collisions: a code may be
//! owned by exactly one `(namespace, name)` pair, and a name may appear once
//! per namespace.
//!
//! Tables come from `define_errors!` declarations or from JSON:
//!
//! ```rust
//! use provenance_errors::{Registry, SubsystemTable};
//!
//! let table: SubsystemTable = serde_json::from_str(r#"{
//!     "namespace": "CACHE",
//!     "errors": {
//!         "MISS": { "code": "CACHE_MISS", "message": "No entry for {key}", "context_keys": ["key"] }
//!     }
//! }"#).unwrap();
//!
//! let registry = Registry::with_builtin().register(table).unwrap();
//! let miss = registry.get("CACHE", "MISS").unwrap();
//! assert_eq!(miss.subsystem, "CACHE");
//! assert!(registry.by_code("UNEXPECTED").is_some());
//! ```

use crate::validation::{Problems, validate};
use crate::{ConstructionError, ErrorDefinition};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Registry failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two entries claim the same code.
    #[error("duplicate error code '{code}' in {second} (already defined by {first})")]
    DuplicateCode {
        /// The contested code.
        code: String,
        /// `NAMESPACE.NAME` of the entry registered first.
        first: String,
        /// `NAMESPACE.NAME` of the rejected entry.
        second: String,
    },

    /// A name appears twice within one namespace.
    #[error("duplicate error name '{name}' in namespace '{namespace}'")]
    DuplicateName {
        /// Namespace holding both entries.
        namespace: String,
        /// The repeated name.
        name: String,
    },

    /// A table entry could not be converted into a definition.
    #[error("invalid definition {namespace}.{name}")]
    InvalidDefinition {
        /// Namespace of the entry.
        namespace: String,
        /// Name of the entry.
        name: String,
        /// Why the conversion failed.
        #[source]
        source: ConstructionError,
    },

    /// The table document is not valid JSON or has the wrong shape.
    #[error("invalid subsystem table: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// Subsystem Table
// ============================================================================

/// Definitions of one namespace, keyed by symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct SubsystemTable {
    namespace: Cow<'static, str>,
    entries: Vec<(Cow<'static, str>, ErrorDefinition)>,
}

#[derive(Deserialize)]
struct RawTable {
    namespace: String,
    #[serde(default)]
    errors: Map<String, Value>,
}

impl TryFrom<RawTable> for SubsystemTable {
    type Error = RegistryError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let mut table = Self::new(raw.namespace);
        for (name, mut value) in raw.errors {
            if let Value::Object(map) = &mut value {
                map.entry("subsystem")
                    .or_insert_with(|| Value::String(table.namespace.to_string()));
            }
            let definition =
                ErrorDefinition::from_value(&value).map_err(|source| RegistryError::InvalidDefinition {
                    namespace: table.namespace.to_string(),
                    name: name.clone(),
                    source,
                })?;
            table.entries.push((Cow::Owned(name), definition));
        }
        Ok(table)
    }
}

impl SubsystemTable {
    /// Empty table for a namespace.
    pub fn new(namespace: impl Into<Cow<'static, str>>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: Vec::new(),
        }
    }

    /// Table over static definitions, named by their codes.
    pub fn from_definitions(
        namespace: impl Into<Cow<'static, str>>,
        definitions: &'static [ErrorDefinition],
    ) -> Self {
        let mut table = Self::new(namespace);
        for definition in definitions {
            table.entries.push((definition.code.clone(), definition.clone()));
        }
        table
    }

    /// Parse a JSON table document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or on an entry with non-string fields.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add an entry.
    pub fn with(mut self, name: impl Into<Cow<'static, str>>, definition: ErrorDefinition) -> Self {
        self.entries.push((name.into(), definition));
        self
    }

    /// Namespace the table was declared under.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of entries in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorDefinition)> {
        self.entries.iter().map(|(name, def)| (name.as_ref(), def))
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    namespace: Cow<'static, str>,
    name: Cow<'static, str>,
    definition: ErrorDefinition,
}

impl Entry {
    fn owner(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// An entry whose definition has validation problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryProblem<'a> {
    /// Namespace of the entry.
    pub namespace: &'a str,
    /// Name of the entry.
    pub name: &'a str,
    /// Everything wrong with its definition.
    pub problems: Problems,
}

/// Merged definitions of every registered namespace.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    by_code: HashMap<String, usize>,
    by_name: HashMap<(String, String), usize>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `SYS` definitions.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.insert_table(crate::definitions::sys_table());
        registry
    }

    /// Merge tables in order into an empty registry.
    ///
    /// # Errors
    ///
    /// Fails on the first collision; see [`register`](Self::register).
    pub fn from_tables<I>(tables: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = SubsystemTable>,
    {
        tables.into_iter().try_fold(Self::new(), Self::register)
    }

    /// Merge one table. Either the whole table is added or nothing is.
    ///
    /// Empty codes are not checked for uniqueness; they surface through
    /// [`validate_all`](Self::validate_all) instead.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateCode`] when a code is already owned by
    /// another entry, [`RegistryError::DuplicateName`] when a name repeats
    /// within the namespace.
    pub fn register(mut self, table: SubsystemTable) -> Result<Self, RegistryError> {
        let mut codes: HashMap<&str, String> = HashMap::new();
        let mut names: HashSet<&str> = HashSet::new();

        for (name, definition) in table.iter() {
            let key = (table.namespace().to_owned(), name.to_owned());
            if self.by_name.contains_key(&key) || !names.insert(name) {
                return Err(RegistryError::DuplicateName {
                    namespace: table.namespace().to_owned(),
                    name: name.to_owned(),
                });
            }

            let code = definition.code.as_ref();
            if code.is_empty() {
                continue;
            }
            let second = format!("{}.{}", table.namespace(), name);
            let first = match self.by_code.get(code) {
                Some(&index) => Some(self.entries[index].owner()),
                None => codes.get(code).cloned(),
            };
            if let Some(first) = first {
                return Err(RegistryError::DuplicateCode {
                    code: code.to_owned(),
                    first,
                    second,
                });
            }
            codes.insert(code, second);
        }

        self.insert_table(table);
        Ok(self)
    }

    fn insert_table(&mut self, table: SubsystemTable) {
        let SubsystemTable { namespace, entries } = table;
        for (name, definition) in entries {
            let index = self.entries.len();
            if !definition.code.is_empty() {
                self.by_code.insert(definition.code.to_string(), index);
            }
            self.by_name
                .insert((namespace.to_string(), name.to_string()), index);
            self.entries.push(Entry {
                namespace: namespace.clone(),
                name,
                definition,
            });
        }
    }

    /// Definition registered under `namespace.name`.
    pub fn get(&self, namespace: &str, name: &str) -> Option<&ErrorDefinition> {
        self.by_name
            .get(&(namespace.to_owned(), name.to_owned()))
            .map(|&index| &self.entries[index].definition)
    }

    /// Definition owning `code`.
    pub fn by_code(&self, code: &str) -> Option<&ErrorDefinition> {
        self.by_code
            .get(code)
            .map(|&index| &self.entries[index].definition)
    }

    /// `(namespace, name, definition)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ErrorDefinition)> {
        self.entries
            .iter()
            .map(|e| (e.namespace.as_ref(), e.name.as_ref(), &e.definition))
    }

    /// Number of definitions across all namespaces.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no definitions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry whose definition fails validation.
    pub fn validate_all(&self) -> Vec<RegistryProblem<'_>> {
        self.iter()
            .filter_map(|(namespace, name, definition)| {
                let problems = validate(definition);
                (!problems.is_empty()).then_some(RegistryProblem {
                    namespace,
                    name,
                    problems,
                })
            })
            .collect()
    }
}
