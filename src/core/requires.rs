//! Cross-unit requirement resolution.
//!
//! Requirements are declared on the static `UnitSpec`, so the graph over
//! unit identifiers is fully known before anything is instantiated. Cycle
//! detection runs first (depth-first coloring); only a clean graph is then
//! ordered, requirements before requirers.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::registry::Registry;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Topological order over the units reachable from `touched` through
/// requirement edges. A unit appears after everything it requires, exactly
/// once, and a cycle fails before any instantiation could happen.
pub fn resolve_order(registry: &Registry, touched: &[String]) -> Result<Vec<String>> {
    let mut colors: HashMap<String, Color> = HashMap::new();
    let mut stack: Vec<String> = Vec::new();
    let mut order: Vec<String> = Vec::new();

    for id in touched {
        visit(registry, id, &mut colors, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn visit(
    registry: &Registry,
    id: &str,
    colors: &mut HashMap<String, Color>,
    stack: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<()> {
    match colors.get(id).copied().unwrap_or(Color::White) {
        Color::Black => return Ok(()),
        Color::Gray => {
            let start = stack
                .iter()
                .position(|entry| entry == id)
                .unwrap_or_default();
            let mut cycle: Vec<String> = stack[start..].to_vec();
            cycle.push(id.to_string());
            return Err(Error::requirement_cycle(cycle));
        }
        Color::White => {}
    }

    let def = registry.def(id)?;
    colors.insert(id.to_string(), Color::Gray);
    stack.push(id.to_string());

    for required in def.spec.requires {
        visit(registry, required, colors, stack, order)?;
    }

    stack.pop();
    colors.insert(id.to_string(), Color::Black);
    order.push(id.to_string());
    Ok(())
}
