//! `vfactory constraints` command

use std::collections::BTreeMap;

use anyhow::Result;

use crate::cli::ConstraintsArgs;
use validator_factory::core::ConstraintRegistry;

pub fn execute(args: ConstraintsArgs) -> Result<()> {
    let registry = ConstraintRegistry::new();

    let constraints: BTreeMap<_, _> = registry
        .constraint_types()
        .into_iter()
        .map(|ty| (ty, registry.validator_descriptors(ty)))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&constraints)?);
        return Ok(());
    }

    println!("Built-in constraints ({}):", constraints.len());
    for (constraint_type, validators) in &constraints {
        println!();
        println!("  {} ({})", constraint_type.simple_name(), constraint_type);
        for validator in validators {
            println!("    {}", validator);
        }
    }

    Ok(())
}
