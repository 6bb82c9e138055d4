//! Win check — left-to-right line evaluation
//!
//! Scores each row of the current scene as a payline: consecutive matching
//! symbols from the leftmost reel, wilds substituting. Appends one result
//! per paying line; a blank spin is a soft no-op.

use std::any::Any;

use serde::{Deserialize, Serialize};

use sg_core::{EMPTY_SYMBOL, SgError, SgResult, SymbolTable};

use crate::component::{Component, Links, StepOutput, StepParams, Transition};
use crate::config::{BuildContext, ComponentDoc, parse_params};
use crate::context::{ResultKind, RoundContext, RoundResult};
use crate::data::{ComponentData, DataBase, DataRecord};

/// Typed config for `win_check`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WinCheckConfig {
    /// Wild symbol name, if the game has one
    #[serde(default)]
    pub wild: Option<String>,
}

/// Round state of a win check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinCheckData {
    pub base: DataBase,
    /// Paying lines found
    pub line_count: u32,
    /// Sum of line amounts
    pub total_win: i64,
}

impl ComponentData for WinCheckData {
    fn base(&self) -> &DataBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DataBase {
        &mut self.base
    }

    fn on_new_round(&mut self) {
        self.base.on_new_round();
        self.line_count = 0;
        self.total_win = 0;
    }

    fn on_new_step(&mut self) {
        self.line_count = 0;
    }

    fn clone_data(&self) -> Box<dyn ComponentData> {
        Box::new(self.clone())
    }

    fn record(&self, component: &str) -> DataRecord {
        DataRecord::new(component, self.base.clone())
            .with_field("line_count", self.line_count)
            .with_field("total_win", self.total_win)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Line win evaluator
pub struct WinCheck {
    name: String,
    links: Links,
    symbols: SymbolTable,
    wild: i32,
}

impl WinCheck {
    /// Build from resolved parts
    pub fn new(name: impl Into<String>, links: Links, symbols: SymbolTable, wild: i32) -> Self {
        Self {
            name: name.into(),
            links,
            symbols,
            wild,
        }
    }

    /// Registry builder
    pub fn build(doc: &ComponentDoc, links: Links, bctx: &BuildContext<'_>) -> SgResult<Box<dyn Component>> {
        let config: WinCheckConfig = parse_params(doc)?;
        let wild = match &config.wild {
            Some(name) => bctx.symbols.code(name)?,
            None => EMPTY_SYMBOL,
        };
        Ok(Box::new(Self::new(&doc.name, links, bctx.symbols.clone(), wild)))
    }

    /// Length and symbol of the match starting at the left edge of a row
    fn score_row(&self, scene: &crate::scene::Scene, y: usize) -> (i32, usize) {
        let mut line_symbol = EMPTY_SYMBOL;
        let mut count = 0;
        for x in 0..scene.width() {
            let code = scene.get(x, y);
            if code == EMPTY_SYMBOL {
                break;
            }
            let is_wild = self.wild != EMPTY_SYMBOL && code == self.wild;
            if line_symbol == EMPTY_SYMBOL {
                if !is_wild {
                    line_symbol = code;
                }
                count += 1;
            } else if code == line_symbol || is_wild {
                count += 1;
            } else {
                break;
            }
        }
        (line_symbol, count)
    }
}

impl Component for WinCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "win_check"
    }

    fn links(&self) -> &Links {
        &self.links
    }

    fn new_data(&self) -> Box<dyn ComponentData> {
        Box::new(WinCheckData::default())
    }

    fn run(
        &self,
        ctx: &mut RoundContext,
        data: &mut dyn ComponentData,
        _step: &mut StepParams<'_>,
    ) -> SgResult<StepOutput> {
        let scene = ctx
            .current_scene()
            .cloned()
            .ok_or_else(|| SgError::config(&self.name, "round has no scene to evaluate"))?;
        let scene_index = ctx.scene_count() - 1;

        let mut wins = Vec::new();
        for y in 0..scene.height() {
            let (line_symbol, count) = self.score_row(&scene, y);
            if line_symbol == EMPTY_SYMBOL || count < 3 {
                continue;
            }
            let Some(def) = self.symbols.get(line_symbol) else {
                continue;
            };
            let pay = def.pay(count);
            if pay == 0 {
                continue;
            }
            let positions = (0..count).map(|x| (x as u8, y as u8)).collect();
            wins.push(RoundResult {
                component: self.name.clone(),
                kind: ResultKind::LineWin,
                scene_index,
                positions,
                symbol: line_symbol,
                amount: pay * ctx.stake,
            });
        }

        if wins.is_empty() {
            return Ok(StepOutput::did_nothing(Transition::Default));
        }

        data.base_mut().used_scenes.push(scene_index);
        let mut line_count = 0u32;
        let mut total_win = 0i64;
        for win in wins {
            total_win += win.amount;
            line_count += 1;
            let index = ctx.push_result(win);
            data.base_mut().used_results.push(index);
        }
        if let Some(check) = data.as_any_mut().downcast_mut::<WinCheckData>() {
            check.line_count += line_count;
            check.total_win += total_win;
        }

        Ok(StepOutput::applied(Transition::Default))
    }
}
