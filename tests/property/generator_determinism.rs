// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Config Generator
//!
//! Artifacts depend only on entity state: the same component always renders
//! the same bytes, inputs appear in key order, and no string value can open
//! an HCL template sequence.

use cim_terragrunt::domain::{Component, Environment, Inputs};
use cim_terragrunt::generator::generate_component;
use cim_terragrunt::generator::hcl::{quote, render_inputs};
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// Strategies
// ============================================================================

fn input_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::from(n)),
        "[ -~]{0,16}".prop_map(Value::String),
        Just(Value::String("${var.secret}".to_string())),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn inputs() -> impl Strategy<Value = Inputs> {
    prop::collection::btree_map("[a-z_]{1,10}", input_value(), 0..6)
}

fn environment() -> Environment {
    Environment {
        id: "e1".into(),
        name: "dev".to_string(),
        description: None,
        region_id: "r1".into(),
        bucket_name: "tg-bucket".to_string(),
    }
}

fn component(inputs: Inputs) -> Component {
    Component {
        id: "c1".into(),
        name: "vpc".to_string(),
        description: None,
        environment_id: "e1".into(),
        source: "terraform-aws-modules/vpc/aws".to_string(),
        version: "3.5.0".to_string(),
        inputs,
        outputs: Inputs::new(),
        registry_namespace: None,
        registry_module: None,
    }
}

/// Whether `text` contains a `${` or `%{` opener that is not escaped
fn has_open_template(text: &str) -> bool {
    let mut rest = text;
    while !rest.is_empty() {
        if rest.starts_with("$${") || rest.starts_with("%%{") {
            rest = &rest[3..];
        } else if rest.starts_with("${") || rest.starts_with("%{") {
            return true;
        } else {
            let step = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            rest = &rest[step..];
        }
    }
    false
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: generation is deterministic
    #[test]
    fn prop_component_artifact_is_stable(inputs in inputs()) {
        let env = environment();
        let first = generate_component(&env, &component(inputs.clone()));
        let second = generate_component(&env, &component(inputs));

        prop_assert_eq!(first.content, second.content);
        prop_assert_eq!(first.path, second.path);
    }

    /// Property: top-level input keys are written in lexicographic order
    #[test]
    fn prop_inputs_rendered_in_key_order(inputs in inputs()) {
        let rendered = render_inputs(&inputs);
        let positions: Vec<usize> = inputs
            .keys()
            .map(|key| rendered.find(&format!("\n  \"{}\": ", key)).unwrap_or(usize::MAX))
            .collect();

        prop_assert!(positions.iter().all(|p| *p != usize::MAX), "every key is rendered");
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]), "keys are sorted");
    }

    /// Property: quoted strings are single-line and never interpolate
    #[test]
    fn prop_quote_escapes_templates(raw in "[ -~\n\t]{0,32}") {
        let quoted = quote(&raw);

        prop_assert!(quoted.starts_with('"') && quoted.ends_with('"'));
        prop_assert!(!quoted.contains('\n'));
        prop_assert!(!has_open_template(&quoted), "unescaped template in {}", quoted);
    }
}
