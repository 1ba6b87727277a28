use clap::Parser;
use patchgate::{
    config::PatchgateConfig,
    observability::init_tracing,
    scim::{Match, ResourceType, locate_by},
};
use serde::Serialize;
use serde_json::{Value, json};

/// CLI arguments for patchgate
#[derive(Parser, Debug)]
#[command(version, about = "SCIM PATCH parsing and schema path resolution", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (an empty default config is used when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Parse one PATCH operation and print the result as JSON
    Parse {
        /// Operation code (add, replace, remove)
        #[arg(long)]
        op: String,
        /// SCIM attribute path, e.g. `emails[type eq "work"].value`
        #[arg(long)]
        path: String,
        /// Operation value as JSON; anything that is not valid JSON is taken
        /// as a plain string
        #[arg(long)]
        value: Option<String>,
        /// Resource type whose schema the path is resolved against
        #[arg(long, value_enum, default_value_t = ResourceType::User)]
        resource: ResourceType,
    },
    /// Print the storage path of an attribute in a resource schema
    Locate {
        attribute: String,
        #[arg(long, value_enum, default_value_t = ResourceType::User)]
        resource: ResourceType,
        /// Match leaf values (storage attribute names) instead of keys
        #[arg(long)]
        leaf: bool,
    },
    /// Validate the config file and print a summary
    Check,
}

fn main() {
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => match PatchgateConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => PatchgateConfig::default(),
    };

    if let Err(e) = init_tracing(&config.observability) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    let output = match args.command {
        Command::Parse {
            op,
            path,
            value,
            resource,
        } => {
            let value = value.map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw)));
            let parser = config.schema.parser(resource);
            match parser.parse(&op, Some(&path), value.as_ref()) {
                Ok(operation) => to_json(&operation),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Locate {
            attribute,
            resource,
            leaf,
        } => {
            let mode = if leaf { Match::Leaf } else { Match::Key };
            let path = locate_by(&attribute, config.schema.for_resource(resource), mode);
            json!({ "attribute": attribute, "resource": resource, "path": path })
        }
        Command::Check => json!({
            "searchable_attribute": config.auth.searchable_attribute,
            "bearer_enabled": config.auth.bearer_enabled(),
            "user_attributes": config.schema.user.attribute_names().collect::<Vec<_>>(),
            "group_attributes": config.schema.group.attribute_names().collect::<Vec<_>>(),
        }),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(1);
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        eprintln!("Failed to serialize output: {}", e);
        std::process::exit(1);
    })
}
