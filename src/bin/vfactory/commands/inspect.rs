//! `vfactory inspect` command

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::cli::InspectArgs;
use validator_factory::core::{MappingContributorSource, MappingId, ValidatorDescriptor};
use validator_factory::factory::EffectiveConfiguration;
use validator_factory::util::config::{
    global_properties_path, load_properties, project_properties_path, Properties, PropertiesFile,
};
use validator_factory::{ConfigurationState, ConstraintType, ValidatorFactory};

#[derive(Serialize)]
struct InspectReport {
    properties: Properties,
    configuration: EffectiveConfiguration,
    providers: BTreeMap<&'static str, &'static str>,
    mappings: Vec<MappingSummary>,
    constraints: BTreeMap<ConstraintType, Vec<ValidatorDescriptor>>,
}

#[derive(Serialize)]
struct MappingSummary {
    id: MappingId,
    source: MappingContributorSource,
    constraint_definitions: Vec<ConstraintType>,
    beans: Vec<String>,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let properties = resolve_properties(&args)?;

    let configuration = ConfigurationState::new()
        .with_fail_fast(args.fail_fast)
        .with_properties(properties.clone());
    let factory = ValidatorFactory::new(configuration)?;

    let report = build_report(&factory, properties);
    factory.close();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn resolve_properties(args: &InspectArgs) -> Result<Properties> {
    let file = if args.properties.is_empty() {
        let cwd = std::env::current_dir()?;
        let global = global_properties_path().unwrap_or_default();
        load_properties(&global, &project_properties_path(&cwd))
    } else {
        let mut merged = PropertiesFile::default();
        for path in &args.properties {
            merged.merge(PropertiesFile::load(path)?);
        }
        merged
    };

    let mut properties = file.to_properties();
    properties.extend(args.set.iter().cloned());
    Ok(properties)
}

fn build_report(factory: &ValidatorFactory, properties: Properties) -> InspectReport {
    let mut providers = BTreeMap::new();
    providers.insert(
        "message-interpolator",
        factory.message_interpolator().provider_name(),
    );
    providers.insert(
        "traversable-resolver",
        factory.traversable_resolver().provider_name(),
    );
    providers.insert(
        "parameter-name-provider",
        factory.parameter_name_provider().provider_name(),
    );
    providers.insert("clock-provider", factory.clock_provider().provider_name());
    providers.insert(
        "constraint-validator-factory",
        factory.constraint_validator_factory().provider_name(),
    );
    providers.insert(
        "script-evaluator-factory",
        factory.script_evaluator_factory().provider_name(),
    );

    let mappings = factory
        .constraint_mappings()
        .iter()
        .map(|mapping| MappingSummary {
            id: mapping.id(),
            source: mapping.source().clone(),
            constraint_definitions: mapping
                .constraint_definition_contributions()
                .iter()
                .map(|c| c.constraint_type())
                .collect(),
            beans: mapping
                .bean_configurations()
                .iter()
                .map(|b| b.type_name().to_string())
                .collect(),
        })
        .collect();

    let registry = factory.constraint_registry();
    let constraints = registry
        .constraint_types()
        .into_iter()
        .map(|ty| (ty, registry.validator_descriptors(ty)))
        .collect();

    InspectReport {
        properties,
        configuration: factory.effective_configuration(),
        providers,
        mappings,
        constraints,
    }
}

fn print_report(report: &InspectReport) {
    println!("Properties:");
    if report.properties.is_empty() {
        println!("  (none)");
    }
    for (key, value) in &report.properties {
        println!("  {} = {}", key, value);
    }
    println!();

    let configuration = &report.configuration;
    let method_validation = &configuration.method_validation;
    println!("Effective configuration:");
    println!("  fail fast: {}", configuration.fail_fast);
    println!(
        "  allow parameter constraint override: {}",
        method_validation.is_allow_overriding_method_alter_parameter_constraint()
    );
    println!(
        "  allow multiple cascaded validation on result: {}",
        method_validation.is_allow_multiple_cascaded_validation_on_return_values()
    );
    println!(
        "  allow parallel method parameter constraints: {}",
        method_validation.is_allow_parallel_methods_define_parameter_constraints()
    );
    println!(
        "  traversable resolver result cache: {}",
        configuration.traversable_resolver_result_cache
    );
    println!();

    println!("Providers:");
    for (role, provider) in &report.providers {
        println!("  {}: {}", role, provider);
    }
    println!();

    println!("Constraint mappings ({}):", report.mappings.len());
    for mapping in &report.mappings {
        println!(
            "  {} from {}: {} definition(s), {} bean(s)",
            mapping.id,
            mapping.source,
            mapping.constraint_definitions.len(),
            mapping.beans.len()
        );
    }
    println!();

    println!("Constraint registry ({} types):", report.constraints.len());
    for (constraint_type, validators) in &report.constraints {
        println!("  {}", constraint_type);
        for validator in validators {
            println!("    {}", validator);
        }
    }
}
