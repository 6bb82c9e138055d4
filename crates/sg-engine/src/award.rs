//! Awards — declarative side effects fired by a component's outcome
//!
//! An award rewrites a named component's published value: set it, add to
//! it, or copy another component's published value. The engine applies a
//! component's configured list in declaration order, each effect exactly
//! once per pass; applying an effect never evaluates further awards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use sg_core::{ScalarValue, SgError, SgResult};

use crate::context::RoundContext;

/// The effect an award performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AwardEffect {
    /// Overwrite the target value
    Set { value: ScalarValue },
    /// Add to the target integer value
    Add { value: i64 },
    /// Copy a value published by another component
    Copy { source: String, source_key: String },
}

/// One declarative side effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
    /// Component whose value is rewritten
    pub target: String,
    /// Key under the target component
    pub key: String,
    #[serde(flatten)]
    pub effect: AwardEffect,
    /// Fire at most once per round per (target, key)
    #[serde(default)]
    pub once: bool,
}

/// Applies award lists against a known set of component names
#[derive(Debug, Clone, Default)]
pub struct AwardEngine {
    known: HashSet<String>,
}

impl AwardEngine {
    /// Engine that accepts the given component names as targets
    pub fn new(known: HashSet<String>) -> Self {
        Self { known }
    }

    /// Load-time validation: every target and copy source must be a known
    /// component
    pub fn validate(&self, owner: &str, awards: &[Award]) -> SgResult<()> {
        for award in awards {
            if !self.known.contains(&award.target) {
                return Err(SgError::config(
                    owner,
                    format!("award targets unknown component {}", award.target),
                ));
            }
            if let AwardEffect::Copy { source, .. } = &award.effect {
                if !self.known.contains(source) {
                    return Err(SgError::config(
                        owner,
                        format!("award copies from unknown component {source}"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Apply `owner`'s award list, returning how many effects fired
    pub fn apply(
        &self,
        owner: &str,
        awards: &[Award],
        ctx: &mut RoundContext,
    ) -> SgResult<u32> {
        let mut applied = 0u32;
        for award in awards {
            if !self.known.contains(&award.target) {
                return Err(SgError::config(
                    owner,
                    format!("award targets unknown component {}", award.target),
                ));
            }
            if award.once {
                let guard = format!("award:{}:{}", award.target, award.key);
                if !ctx.fire_once(owner, &guard)? {
                    log::debug!("{owner}: award {guard} already fired, skipping");
                    continue;
                }
            }
            match &award.effect {
                AwardEffect::Set { value } => {
                    ctx.set_value(&award.target, &award.key, value.clone());
                }
                AwardEffect::Add { value } => {
                    let current = ctx.int_value(&award.target, &award.key);
                    ctx.set_value(&award.target, &award.key, ScalarValue::Int(current + value));
                }
                AwardEffect::Copy { source, source_key } => {
                    let value = ctx.value(source, source_key).cloned().ok_or_else(|| {
                        SgError::config(
                            owner,
                            format!("award copy source {source}.{source_key} has no value"),
                        )
                    })?;
                    ctx.set_value(&award.target, &award.key, value);
                }
            }
            applied += 1;
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BasicData;

    fn engine() -> AwardEngine {
        AwardEngine::new(
            ["spin", "respin", "pick"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    fn ctx() -> RoundContext {
        let mut ctx = RoundContext::new(100);
        for name in ["spin", "respin", "pick"] {
            ctx.insert_data(name, Box::new(BasicData::default()));
        }
        ctx
    }

    #[test]
    fn test_set_and_add() {
        let engine = engine();
        let mut ctx = ctx();
        let awards = vec![
            Award {
                target: "respin".into(),
                key: "extra".into(),
                effect: AwardEffect::Set {
                    value: ScalarValue::Int(2),
                },
                once: false,
            },
            Award {
                target: "respin".into(),
                key: "extra".into(),
                effect: AwardEffect::Add { value: 3 },
                once: false,
            },
        ];

        let applied = engine.apply("pick", &awards, &mut ctx).unwrap();
        assert_eq!(applied, 2);
        assert_eq!(ctx.int_value("respin", "extra"), 5);
    }

    #[test]
    fn test_copy() {
        let engine = engine();
        let mut ctx = ctx();
        ctx.set_value("pick", "feature", ScalarValue::Text("bonus".into()));

        let awards = vec![Award {
            target: "spin".into(),
            key: "mode".into(),
            effect: AwardEffect::Copy {
                source: "pick".into(),
                source_key: "feature".into(),
            },
            once: false,
        }];
        engine.apply("pick", &awards, &mut ctx).unwrap();
        assert_eq!(
            ctx.value("spin", "mode").and_then(ScalarValue::as_text),
            Some("bonus")
        );
    }

    #[test]
    fn test_copy_missing_source_is_hard_error() {
        let engine = engine();
        let mut ctx = ctx();
        let awards = vec![Award {
            target: "spin".into(),
            key: "mode".into(),
            effect: AwardEffect::Copy {
                source: "pick".into(),
                source_key: "absent".into(),
            },
            once: false,
        }];
        assert!(engine.apply("pick", &awards, &mut ctx).is_err());
    }

    #[test]
    fn test_unknown_target_is_hard_error() {
        let engine = engine();
        let awards = vec![Award {
            target: "ghost".into(),
            key: "k".into(),
            effect: AwardEffect::Add { value: 1 },
            once: false,
        }];
        assert!(engine.validate("pick", &awards).is_err());
        assert!(engine.apply("pick", &awards, &mut ctx()).is_err());
    }

    #[test]
    fn test_once_guard_survives_double_trigger() {
        let engine = engine();
        let mut ctx = ctx();
        let awards = vec![Award {
            target: "respin".into(),
            key: "extra".into(),
            effect: AwardEffect::Add { value: 2 },
            once: true,
        }];

        engine.apply("pick", &awards, &mut ctx).unwrap();
        // Simulated double trigger with the same key: must not compound
        engine.apply("pick", &awards, &mut ctx).unwrap();
        assert_eq!(ctx.int_value("respin", "extra"), 2);
    }
}
