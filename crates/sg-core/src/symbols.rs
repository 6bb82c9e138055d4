//! Symbol definitions and name→code resolution
//!
//! Game configs refer to symbols by name ("HP1", "WILD"); the grid stores
//! integer codes. The table is built once at load time from the paytable
//! document and handed to every component constructor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SgError, SgResult};

/// Sentinel code for an empty grid cell
pub const EMPTY_SYMBOL: i32 = -1;

/// Symbol classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Regular paying symbol
    #[default]
    Regular,
    /// Wild - substitutes for others
    Wild,
    /// Scatter - counts regardless of position
    Scatter,
    /// Collector / coin symbol carrying a per-cell value
    Collector,
}

/// A symbol definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Grid code
    pub code: i32,
    /// Symbol name (e.g., "HP1", "WILD", "SCATTER")
    pub name: String,
    /// Classification
    #[serde(default)]
    pub kind: SymbolKind,
    /// Pay values per match count, index 0 = 3-of-a-kind
    #[serde(default)]
    pub pays: Vec<i64>,
}

impl SymbolDef {
    /// Pay value for a left-to-right match count (0 below 3-of-a-kind)
    pub fn pay(&self, match_count: usize) -> i64 {
        if match_count < 3 {
            return 0;
        }
        self.pays.get(match_count - 3).copied().unwrap_or(0)
    }
}

/// Name↔code table resolved from the paytable document
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    defs: Vec<SymbolDef>,
    by_name: HashMap<String, usize>,
    by_code: HashMap<i32, usize>,
}

impl SymbolTable {
    /// Build a table, rejecting duplicate names or codes
    pub fn new(defs: Vec<SymbolDef>) -> SgResult<Self> {
        let mut by_name = HashMap::with_capacity(defs.len());
        let mut by_code = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if by_name.insert(def.name.clone(), i).is_some() {
                return Err(SgError::config(
                    "symbols",
                    format!("duplicate symbol name {}", def.name),
                ));
            }
            if by_code.insert(def.code, i).is_some() {
                return Err(SgError::config(
                    "symbols",
                    format!("duplicate symbol code {}", def.code),
                ));
            }
        }
        Ok(Self {
            defs,
            by_name,
            by_code,
        })
    }

    /// Resolve a name to its grid code
    pub fn code(&self, name: &str) -> SgResult<i32> {
        self.by_name
            .get(name)
            .map(|&i| self.defs[i].code)
            .ok_or_else(|| SgError::UnknownSymbol(name.to_string()))
    }

    /// Look up the definition for a grid code
    pub fn get(&self, code: i32) -> Option<&SymbolDef> {
        self.by_code.get(&code).map(|&i| &self.defs[i])
    }

    /// Look up a definition by name
    pub fn get_by_name(&self, name: &str) -> Option<&SymbolDef> {
        self.by_name.get(name).map(|&i| &self.defs[i])
    }

    /// All codes of a given kind, in definition order
    pub fn codes_of(&self, kind: SymbolKind) -> Vec<i32> {
        self.defs
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.code)
            .collect()
    }

    /// All definitions, in declaration order
    pub fn defs(&self) -> &[SymbolDef] {
        &self.defs
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        SymbolTable::new(vec![
            SymbolDef {
                code: 1,
                name: "HP1".into(),
                kind: SymbolKind::Regular,
                pays: vec![20, 100, 500],
            },
            SymbolDef {
                code: 10,
                name: "WILD".into(),
                kind: SymbolKind::Wild,
                pays: vec![],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_name() {
        let t = table();
        assert_eq!(t.code("HP1").unwrap(), 1);
        assert!(matches!(t.code("NOPE"), Err(SgError::UnknownSymbol(_))));
    }

    #[test]
    fn test_pay_lookup() {
        let t = table();
        let hp1 = t.get(1).unwrap();
        assert_eq!(hp1.pay(2), 0);
        assert_eq!(hp1.pay(3), 20);
        assert_eq!(hp1.pay(5), 500);
    }

    #[test]
    fn test_duplicate_rejected() {
        let dup = SymbolTable::new(vec![
            SymbolDef {
                code: 1,
                name: "A".into(),
                kind: SymbolKind::Regular,
                pays: vec![],
            },
            SymbolDef {
                code: 1,
                name: "B".into(),
                kind: SymbolKind::Regular,
                pays: vec![],
            },
        ]);
        assert!(dup.is_err());
    }
}
