//! # CRD Generator
//!
//! Generates Kubernetes CustomResourceDefinition (CRD) YAML from the record types.
//!
//! ## Usage
//!
//! ```bash
//! # Every CRD as a multi-document stream
//! cargo run --bin crdgen > config/crd/all.yaml
//!
//! # A single kind, applied directly
//! cargo run --bin crdgen -- --kind role | kubectl apply -f -
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use kube::core::CustomResourceExt;
use search_security_operator::crd::{Alert, Role, RoleMapping, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Alert,
    Role,
    User,
    #[value(name = "rolemapping")]
    RoleMapping,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Print the operator's CustomResourceDefinitions as YAML")]
struct Args {
    /// Record kind to print
    #[arg(long, value_enum, default_value = "all")]
    kind: KindArg,
}

fn print_crd<K: CustomResourceExt>() -> Result<()> {
    println!("---");
    print!("{}", serde_yaml::to_string(&K::crd())?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.kind {
        KindArg::Alert => print_crd::<Alert>(),
        KindArg::Role => print_crd::<Role>(),
        KindArg::User => print_crd::<User>(),
        KindArg::RoleMapping => print_crd::<RoleMapping>(),
        KindArg::All => {
            print_crd::<Alert>()?;
            print_crd::<Role>()?;
            print_crd::<User>()?;
            print_crd::<RoleMapping>()
        }
    }
}
