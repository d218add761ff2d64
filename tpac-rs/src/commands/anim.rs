//! Animation section command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tpac_anim::batch::BatchRequest;
use tpac_anim::plan::{GenerationPlan, load_skeleton};
use tpac_anim::{AnimationId, SkeletalAnimation, Skeleton, generate_animations, validate};

use crate::utils::{
    TableRow, batch_callback, create_progress_bar, create_table, format_bytes, format_components,
    format_time_range,
};

#[derive(Subcommand)]
pub enum AnimCommands {
    /// Display information about an animation file
    Info {
        /// Path to the animation file
        file: PathBuf,

        /// Show per-bone details
        #[arg(short, long)]
        detailed: bool,
    },

    /// Check the reserved fields and structure of an animation file
    Validate {
        /// Path to the animation file
        file: PathBuf,
    },

    /// Decode and re-encode an animation file
    Convert {
        /// Input animation file
        input: PathBuf,

        /// Output animation file
        output: PathBuf,

        /// Recompute the trailing offset instead of keeping the stored one
        #[arg(long)]
        recompute_offset: bool,
    },

    /// Sample a bone rotation at a given time
    Sample {
        /// Path to the animation file
        file: PathBuf,

        /// Bone index
        #[arg(short, long, default_value = "0")]
        bone: usize,

        /// Time to sample at
        #[arg(short, long)]
        time: f32,
    },

    /// Generate tracks for the extra bones of a custom skeleton
    Generate {
        /// Custom skeleton definition (JSON or YAML)
        #[arg(short, long)]
        skeleton: PathBuf,

        /// Skeleton the input animations were made for (JSON or YAML)
        #[arg(short, long)]
        reference: PathBuf,

        /// Generation plan assigning methods to bones (JSON or YAML)
        #[arg(short, long)]
        plan: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Additional animations that methods may copy from
        #[arg(short, long)]
        library: Vec<PathBuf>,

        /// Name prefix for generated animations, overriding the plan
        #[arg(long)]
        prefix: Option<String>,

        /// Animations to generate from
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

pub fn execute(cmd: AnimCommands) -> Result<()> {
    match cmd {
        AnimCommands::Info { file, detailed } => handle_info(&file, detailed),
        AnimCommands::Validate { file } => handle_validate(&file),
        AnimCommands::Convert {
            input,
            output,
            recompute_offset,
        } => handle_convert(&input, &output, recompute_offset),
        AnimCommands::Sample { file, bone, time } => handle_sample(&file, bone, time),
        AnimCommands::Generate {
            skeleton,
            reference,
            plan,
            output,
            library,
            prefix,
            inputs,
        } => handle_generate(GenerateArgs {
            skeleton,
            reference,
            plan,
            output,
            library,
            prefix,
            inputs,
        }),
    }
}

fn load_animation(path: &Path) -> Result<SkeletalAnimation> {
    SkeletalAnimation::load(path)
        .with_context(|| format!("Failed to load animation: {}", path.display()))
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let anim = load_animation(path)?;
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or_default();

    println!("\n{}", style("Animation Information").bold().underlined());
    println!("File: {} ({})", style(path.display()).cyan(), format_bytes(size));
    println!("Name: {}", style(&anim.name).yellow());
    println!("Skeleton: {}", style(&anim.skeleton).yellow());
    println!(
        "Frames: {} (duration {})",
        style(anim.frame_count).green(),
        anim.duration
    );
    println!("Bone Tracks: {}", style(anim.bone_count()).green());
    println!("Root Position Keys: {}", style(anim.root_positions.len()).green());
    println!(
        "Activity: {} frames x {} bones",
        anim.activity.frame_count(),
        anim.activity.bone_count()
    );

    if detailed {
        println!("\n{}", style("Bone Tracks").bold());
        let mut table = create_table(&["Bone", "Keys", "Time Range", "Tags"]);
        for (bone, track) in anim.bone_tracks.iter().enumerate() {
            let tags = &track.tags;
            TableRow::new()
                .number(style(bone).cyan())
                .number(style(track.len()).green())
                .cell(format_time_range(&track.rotations))
                .cell(format!("{} / {} / {}", tags.leading, tags.trailing_a, tags.trailing_b))
                .add_to(&mut table);
        }
        table.printstd();
    }

    Ok(())
}

fn handle_validate(path: &Path) -> Result<()> {
    let anim = load_animation(path)?;
    let report = validate(&anim);
    report.print();

    if report.is_clean() {
        println!("{} {}", style("✓").green(), path.display());
    } else {
        println!(
            "{} {}: {} issue(s)",
            style("!").yellow(),
            path.display(),
            report.len()
        );
    }
    Ok(())
}

fn handle_convert(input: &Path, output: &Path, recompute_offset: bool) -> Result<()> {
    let mut anim = load_animation(input)?;
    if recompute_offset {
        anim.reserved.trailing_offset = None;
    }

    anim.save(output)
        .with_context(|| format!("Failed to write animation: {}", output.display()))?;
    println!(
        "Wrote {} ({})",
        output.display(),
        format_bytes(anim.encoded_len() as u64)
    );
    Ok(())
}

fn handle_sample(path: &Path, bone: usize, time: f32) -> Result<()> {
    let anim = load_animation(path)?;
    let sample = anim.bone_track(bone)?.interpolated_rotation(time)?;

    println!(
        "Bone {bone} at {time}: {}",
        format_components(sample.value.to_array())
    );
    println!("Keys: {} - {}", sample.lower, sample.upper);
    if !anim.root_positions.is_empty() {
        let root = anim.root_positions.get_interpolated(time)?;
        println!("Root position: {}", format_components(root.value.to_array()));
    }
    Ok(())
}

struct GenerateArgs {
    skeleton: PathBuf,
    reference: PathBuf,
    plan: PathBuf,
    output: PathBuf,
    library: Vec<PathBuf>,
    prefix: Option<String>,
    inputs: Vec<PathBuf>,
}

fn handle_generate(args: GenerateArgs) -> Result<()> {
    let custom = load_skeleton(&args.skeleton)
        .with_context(|| format!("Failed to load skeleton: {}", args.skeleton.display()))?;
    let reference = load_skeleton(&args.reference)
        .with_context(|| format!("Failed to load skeleton: {}", args.reference.display()))?;
    let plan = GenerationPlan::load(&args.plan)
        .with_context(|| format!("Failed to load plan: {}", args.plan.display()))?;

    let mut skeleton = Skeleton::new(custom);
    plan.apply(&mut skeleton)?;

    let mut assets: HashMap<AnimationId, SkeletalAnimation> = HashMap::new();
    let mut animations = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let anim = load_animation(path)?;
        animations.push(anim.id());
        assets.insert(anim.id(), anim);
    }
    for path in &args.library {
        let anim = load_animation(path)?;
        assets.entry(anim.id()).or_insert(anim);
    }

    let mut request = BatchRequest::new(&skeleton, &reference);
    request.animations = animations;
    request.prefix = args.prefix.unwrap_or(plan.prefix);

    let extra = request.extra_bones();
    if extra.is_empty() {
        bail!(
            "skeleton '{}' has no bones missing from '{}'",
            skeleton.name(),
            reference.name
        );
    }
    log::info!("Generating bones {extra:?}");

    let pb = create_progress_bar(request.animations.len() as u64, "Generating");
    let report = generate_animations(&request, &assets, batch_callback(&pb));
    pb.finish_and_clear();

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create directory: {}", args.output.display()))?;
    for anim in &report.generated {
        let path = args.output.join(format!("{}.anim", anim.name));
        anim.save(&path)
            .with_context(|| format!("Failed to write animation: {}", path.display()))?;
    }

    println!(
        "Generated {} animation(s) into {}",
        style(report.generated.len()).green(),
        args.output.display()
    );
    for (name, error) in &report.failed {
        println!("{} {name}: {error}", style("✗").red());
    }
    if !report.failed.is_empty() {
        bail!("{} animation(s) failed", report.failed.len());
    }
    Ok(())
}
