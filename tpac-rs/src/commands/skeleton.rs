//! Skeleton definition command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::path::{Path, PathBuf};

use tpac_anim::SkeletonDefinition;
use tpac_anim::plan::load_skeleton;

use crate::utils::{TableRow, create_table};

#[derive(Subcommand)]
pub enum SkeletonCommands {
    /// List the bones of a skeleton definition
    Info {
        /// Skeleton definition (JSON or YAML)
        file: PathBuf,
    },

    /// List the bones of a custom skeleton that the reference lacks
    Diff {
        /// Custom skeleton definition
        custom: PathBuf,

        /// Reference skeleton definition
        reference: PathBuf,
    },
}

pub fn execute(cmd: SkeletonCommands) -> Result<()> {
    match cmd {
        SkeletonCommands::Info { file } => handle_info(&file),
        SkeletonCommands::Diff { custom, reference } => handle_diff(&custom, &reference),
    }
}

fn load(path: &Path) -> Result<SkeletonDefinition> {
    load_skeleton(path).with_context(|| format!("Failed to load skeleton: {}", path.display()))
}

fn handle_info(path: &Path) -> Result<()> {
    let skeleton = load(path)?;
    let globals = skeleton.global_rest_matrices(false)?;

    println!("\n{}", style("Skeleton Information").bold().underlined());
    println!("Name: {}", style(&skeleton.name).yellow());
    println!("Bones: {}", style(skeleton.bone_count()).green());

    let mut table = create_table(&["Index", "Name", "Parent", "Rest Head"]);
    for (index, (bone, global)) in skeleton.bones.iter().zip(&globals).enumerate() {
        let head = global.w_axis;
        TableRow::new()
            .number(style(index).cyan())
            .cell(&bone.name)
            .parent(bone.parent)
            .cell(format!("({:.3}, {:.3}, {:.3})", head.x, head.y, head.z))
            .add_to(&mut table);
    }
    table.printstd();
    Ok(())
}

fn handle_diff(custom: &Path, reference: &Path) -> Result<()> {
    let custom = load(custom)?;
    let reference = load(reference)?;

    let extra = custom.bones_missing_from(&reference);
    if extra.is_empty() {
        println!("No extra bones");
        return Ok(());
    }
    for index in extra {
        println!("{index}\t{}", custom.bones[index].name);
    }
    Ok(())
}
