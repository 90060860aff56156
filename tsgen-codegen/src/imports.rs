//! Import resolution across generated files.
//!
//! Each output file gets an [`ImportCollector`]: locally declared names are
//! reserved first, then every layer requests the symbols it references. A
//! symbol whose name is already taken receives the first free numeric suffix
//! (`Address as Address1`), so aliases depend only on request order.

use crate::code_writer::CodeWriter;
use crate::cw_writeln;
use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Where an imported symbol comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImportSource {
    /// External package or user module, imported by path as given.
    Library(String),
    /// Helper module synthesized by the generator.
    Helper(String),
    /// Another generated namespace file.
    Namespace(String),
}

impl ImportSource {
    /// Returns the module specifier used in the import statement.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Library(path) => path.clone(),
            Self::Helper(name) | Self::Namespace(name) => format!("./{name}"),
        }
    }
}

/// Accumulates the imports of one output file.
#[derive(Debug, Default)]
pub struct ImportCollector {
    taken: HashSet<String>,
    entries: IndexMap<ImportSource, IndexMap<String, String>>,
}

impl ImportCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a name declared in the file itself.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Returns true if `name` is declared locally or already imported.
    #[must_use]
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Requests `symbol` from `source` and returns the name to use for it.
    ///
    /// Repeated requests for the same symbol return the same alias.
    pub fn request(&mut self, source: ImportSource, symbol: &str) -> String {
        if let Some(alias) = self
            .entries
            .get(&source)
            .and_then(|symbols| symbols.get(symbol))
        {
            return alias.clone();
        }

        let alias = if self.taken.contains(symbol) {
            (1..)
                .map(|n| format!("{symbol}{n}"))
                .find(|candidate| !self.taken.contains(candidate))
                .unwrap_or_else(|| symbol.to_string())
        } else {
            symbol.to_string()
        };

        self.taken.insert(alias.clone());
        self.entries
            .entry(source)
            .or_default()
            .insert(symbol.to_string(), alias.clone());
        alias
    }

    /// Freezes the collected imports.
    #[must_use]
    pub fn finish(self) -> ImportTable {
        let mut entries: Vec<_> = self.entries.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        ImportTable {
            entries: entries.into_iter().collect(),
        }
    }
}

/// Resolved imports of one output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    entries: IndexMap<ImportSource, IndexMap<String, String>>,
}

impl ImportTable {
    /// Returns the local name of `symbol` imported from `source`.
    #[must_use]
    pub fn alias(&self, source: &ImportSource, symbol: &str) -> Option<&str> {
        self.entries
            .get(source)
            .and_then(|symbols| symbols.get(symbol))
            .map(String::as_str)
    }

    /// Returns true if nothing is imported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the symbols imported from `source` in request order.
    pub fn symbols(&self, source: &ImportSource) -> impl Iterator<Item = &str> {
        self.entries
            .get(source)
            .into_iter()
            .flat_map(|symbols| symbols.keys().map(String::as_str))
    }

    /// Returns the generated namespaces this file imports from.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().filter_map(|source| match source {
            ImportSource::Namespace(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Returns the helper modules this file imports from.
    pub fn helpers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().filter_map(|source| match source {
            ImportSource::Helper(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Writes one import statement per source.
    pub fn write_to(&self, w: &mut CodeWriter) {
        for (source, symbols) in &self.entries {
            let list: Vec<String> = symbols
                .iter()
                .map(|(symbol, alias)| {
                    if symbol == alias {
                        symbol.clone()
                    } else {
                        format!("{symbol} as {alias}")
                    }
                })
                .collect();
            cw_writeln!(w, "import {{ {} }} from '{}';", list.join(", "), source.path());
        }
    }
}

/// Orders namespaces so that every namespace follows the ones it imports.
///
/// Ties and cycles fall back to name order.
#[must_use]
pub fn dependency_order(dependencies: &BTreeMap<String, BTreeSet<String>>) -> Vec<String> {
    let mut remaining: BTreeMap<&str, BTreeSet<&str>> = dependencies
        .iter()
        .map(|(name, deps)| {
            let deps = deps
                .iter()
                .map(String::as_str)
                .filter(|dep| *dep != name.as_str() && dependencies.contains_key(*dep))
                .collect();
            (name.as_str(), deps)
        })
        .collect();

    let mut ordered: IndexSet<String> = IndexSet::new();
    while !remaining.is_empty() {
        let ready = remaining
            .iter()
            .find(|(_, deps)| deps.is_empty())
            .map(|(name, _)| *name);
        // A cycle leaves no ready namespace; break it at the smallest name.
        let next = match ready {
            Some(name) => name,
            None => match remaining.keys().next() {
                Some(name) => *name,
                None => break,
            },
        };
        remaining.remove(next);
        for deps in remaining.values_mut() {
            deps.remove(next);
        }
        ordered.insert(next.to_string());
    }
    ordered.into_iter().collect()
}
