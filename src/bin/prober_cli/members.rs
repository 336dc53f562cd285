//! Members command - dry run listing of what explore would call

use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;

use package_prober::types::Member;
use package_prober::{Catalog, PackageLoader, PackageSpec, UnitLoad};

#[derive(Parser, Debug)]
pub struct MembersCmd {
    /// Package name (see `list`)
    pub package: String,
}

#[derive(Debug, Serialize)]
struct MemberView {
    name: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ModuleView {
    Loaded {
        module: String,
        members: Vec<MemberView>,
    },
    ImportFailed {
        module: String,
        message: String,
    },
    EnumerationFailed {
        module: String,
        message: String,
    },
}

impl MemberView {
    fn new(name: String, member: &Member) -> Self {
        let (methods, description) = match member {
            Member::Type(ty) => (
                ty.methods()
                    .iter()
                    .map(|m| format!("{}{}", m.name(), m.signature()))
                    .collect(),
                None,
            ),
            Member::Other { description } => (Vec::new(), Some(description.clone())),
            Member::Function(_) => (Vec::new(), None),
        };
        Self {
            name,
            kind: member.kind_name(),
            signature: member.signature().map(ToString::to_string),
            methods,
            description,
        }
    }
}

impl MembersCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let catalog = Catalog::builtin();
        let spec = PackageSpec::new(&self.package);

        let mut modules = Vec::new();
        for load in catalog.load(&spec)? {
            modules.push(match load {
                UnitLoad::Loaded(source) => match source.members() {
                    Ok(members) => ModuleView::Loaded {
                        module: source.unit_name().to_string(),
                        members: members
                            .into_iter()
                            .map(|(name, member)| MemberView::new(name, &member))
                            .collect(),
                    },
                    Err(e) => ModuleView::EnumerationFailed {
                        module: e.unit,
                        message: e.message,
                    },
                },
                UnitLoad::Failed { module, message } => ModuleView::ImportFailed { module, message },
            });
        }

        if json_output {
            println!("{}", serde_json::to_string_pretty(&modules)?);
        } else {
            print_modules(&modules);
        }

        let unreadable = modules
            .iter()
            .filter(|m| matches!(m, ModuleView::EnumerationFailed { .. }))
            .count();
        if unreadable > 0 {
            bail!("{} module(s) of {} could not be enumerated", unreadable, self.package);
        }
        Ok(())
    }
}

fn print_modules(modules: &[ModuleView]) {
    for module in modules {
        match module {
            ModuleView::Loaded { module, members } => {
                println!("\x1b[1m{}\x1b[0m", module);
                for member in members {
                    match &member.signature {
                        Some(sig) => println!("  {:<9} {}{}", member.kind, member.name, sig),
                        None => println!(
                            "  {:<9} {} ({})",
                            member.kind,
                            member.name,
                            member.description.as_deref().unwrap_or("")
                        ),
                    }
                    for method in &member.methods {
                        println!("  {:<9}   .{}", "", method);
                    }
                }
            }
            ModuleView::ImportFailed { module, message } => {
                println!("\x1b[1m{}\x1b[0m \x1b[31mimport failed:\x1b[0m {}", module, message);
            }
            ModuleView::EnumerationFailed { module, message } => {
                println!(
                    "\x1b[1m{}\x1b[0m \x1b[31mcannot enumerate members:\x1b[0m {}",
                    module, message
                );
            }
        }
    }
}
