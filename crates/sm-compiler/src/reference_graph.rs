use std::collections::{BTreeMap, HashMap};

use sm_core::TemplateSchema;

use crate::diagnostics::Diagnostics;
use crate::expressions::expression_ref_regex;

/// Checks the named references inside a schema before building: expression
/// macros referring to each other and variable groups nesting other groups.
/// Problems are reported, never fatal; expansion cuts the same cycles.
pub fn validate_reference_graph(schema: &TemplateSchema) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    let expression_edges = schema
        .expressions
        .iter()
        .map(|(name, expression)| {
            let targets = expression_ref_regex()
                .captures_iter(&expression.value)
                .filter_map(|captures| captures.get(1))
                .map(|target| target.as_str().trim().to_string())
                .collect::<Vec<_>>();
            (name.clone(), targets)
        })
        .collect::<BTreeMap<_, _>>();
    check_graph(
        &expression_edges,
        GraphKind {
            unknown_code: "EXPRESSION_UNKNOWN",
            cycle_code: "EXPRESSION_CYCLE",
            label: "Expression",
        },
        &mut diagnostics,
    );

    let group_edges = schema
        .variable_groups
        .iter()
        .map(|(name, group)| {
            let targets = group
                .group_refs
                .iter()
                .map(|link| link.name.clone())
                .collect::<Vec<_>>();
            (name.clone(), targets)
        })
        .collect::<BTreeMap<_, _>>();
    check_graph(
        &group_edges,
        GraphKind {
            unknown_code: "VARIABLE_GROUP_UNKNOWN",
            cycle_code: "VARIABLE_GROUP_CYCLE",
            label: "Variable group",
        },
        &mut diagnostics,
    );

    diagnostics
}

#[derive(Debug, Clone, Copy)]
struct GraphKind {
    unknown_code: &'static str,
    cycle_code: &'static str,
    label: &'static str,
}

fn check_graph(
    edges: &BTreeMap<String, Vec<String>>,
    kind: GraphKind,
    diagnostics: &mut Diagnostics,
) {
    for (node, targets) in edges {
        for target in targets {
            if !edges.contains_key(target) {
                diagnostics.push(
                    kind.unknown_code,
                    format!("{} \"{target}\" referenced by \"{node}\" is not defined.", kind.label),
                );
            }
        }
    }

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum State {
        Visiting,
        Done,
    }

    fn dfs(
        node: &str,
        edges: &BTreeMap<String, Vec<String>>,
        states: &mut HashMap<String, State>,
        stack: &mut Vec<String>,
        kind: GraphKind,
        diagnostics: &mut Diagnostics,
    ) {
        if let Some(state) = states.get(node) {
            if *state == State::Visiting {
                let start = stack.iter().position(|entry| entry == node).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(node.to_string());
                diagnostics.push(
                    kind.cycle_code,
                    format!("{} cycle detected: {}", kind.label, cycle.join(" -> ")),
                );
            }
            return;
        }
        let Some(targets) = edges.get(node) else {
            return;
        };

        states.insert(node.to_string(), State::Visiting);
        stack.push(node.to_string());
        for target in targets {
            dfs(target, edges, states, stack, kind, diagnostics);
        }
        stack.pop();
        states.insert(node.to_string(), State::Done);
    }

    let mut states = HashMap::new();
    for node in edges.keys() {
        dfs(node, edges, &mut states, &mut Vec::new(), kind, diagnostics);
    }
}
