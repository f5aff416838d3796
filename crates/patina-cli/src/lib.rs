//! # Patina CLI
//!
//! Command-line interface for working with material snapshot files.
//!
//! ## Commands
//! - `convert` - Convert a snapshot between text, binary, and JSON
//! - `inspect` - Summarize a snapshot file
//! - `apply` - Apply a shader-family mode change to a snapshot
//! - `diff` - Compare two snapshots semantically
//!
//! Formats are chosen by file extension: `.mat` (text), `.matb` (binary),
//! `.json` (JSON).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use glam::Vec4;

use patina_codec::{decode_binary, decode_text, encode_binary, encode_text};
use patina_state::{
    BlendMode, EmissionGiMode, MaterialSnapshot, ModeChange, RenderFace, ShaderFamilyRegistry,
    SurfaceType, TextureSlot, WorkflowMode,
};

/// Patina material snapshot tool
#[derive(Parser)]
#[command(name = "patina")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Convert a snapshot between text, binary, and JSON
    Convert {
        /// Input snapshot file
        input: PathBuf,

        /// Output snapshot file
        output: PathBuf,
    },

    /// Summarize a snapshot file
    Inspect {
        /// Input snapshot file
        input: PathBuf,
    },

    /// Apply a shader-family mode change to a snapshot
    Apply {
        /// Input snapshot file
        input: PathBuf,

        /// Mode to change (surface, blend, face, workflow, alpha-clip,
        /// alpha-cutoff, receive-shadows, emission, emission-gi,
        /// texture-map, base-color)
        #[arg(short, long)]
        mode: String,

        /// New mode value
        #[arg(long)]
        value: String,

        /// Output file (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two snapshots semantically
    Diff {
        /// First snapshot file
        a: PathBuf,

        /// Second snapshot file
        b: PathBuf,
    },
}

/// Snapshot file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Binary,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mat") => Ok(Self::Text),
            Some("matb") => Ok(Self::Binary),
            Some("json") => Ok(Self::Json),
            other => bail!(
                "cannot infer snapshot format of '{}' (extension {:?}); use .mat, .matb, or .json",
                path.display(),
                other
            ),
        }
    }
}

fn read_snapshot(path: &Path) -> Result<MaterialSnapshot> {
    let format = Format::from_path(path)?;
    let snapshot = match format {
        Format::Text => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            decode_text(&text).with_context(|| format!("decoding {}", path.display()))?
        }
        Format::Binary => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            decode_binary(&bytes).with_context(|| format!("decoding {}", path.display()))?
        }
        Format::Json => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("decoding {}", path.display()))?
        }
    };
    Ok(snapshot)
}

fn write_snapshot(path: &Path, snapshot: &MaterialSnapshot) -> Result<()> {
    let format = Format::from_path(path)?;
    match format {
        Format::Text => std::fs::write(path, encode_text(snapshot)),
        Format::Binary => std::fs::write(path, encode_binary(snapshot)),
        Format::Json => std::fs::write(path, serde_json::to_string_pretty(snapshot)?),
    }
    .with_context(|| format!("writing {}", path.display()))
}

/// Parse a mode/value string pair into a [`ModeChange`]
pub fn parse_mode_change(mode: &str, value: &str) -> Result<ModeChange> {
    let change = match mode {
        "surface" => ModeChange::Surface(match value {
            "opaque" => SurfaceType::Opaque,
            "transparent" => SurfaceType::Transparent,
            _ => bail!("surface expects 'opaque' or 'transparent', got '{value}'"),
        }),
        "blend" => ModeChange::Blend(match value {
            "alpha" => BlendMode::Alpha,
            "premultiply" => BlendMode::Premultiply,
            "additive" => BlendMode::Additive,
            "multiply" => BlendMode::Multiply,
            _ => bail!("blend expects alpha|premultiply|additive|multiply, got '{value}'"),
        }),
        "face" => ModeChange::Face(match value {
            "both" => RenderFace::Both,
            "back" => RenderFace::Back,
            "front" => RenderFace::Front,
            _ => bail!("face expects both|back|front, got '{value}'"),
        }),
        "workflow" => ModeChange::Workflow(match value {
            "specular" => WorkflowMode::Specular,
            "metallic" => WorkflowMode::Metallic,
            _ => bail!("workflow expects specular|metallic, got '{value}'"),
        }),
        "alpha-clip" => ModeChange::AlphaClip(parse_switch(value)?),
        "alpha-cutoff" => ModeChange::AlphaCutoff(
            value
                .parse()
                .with_context(|| format!("alpha-cutoff expects a float, got '{value}'"))?,
        ),
        "receive-shadows" => ModeChange::ReceiveShadows(parse_switch(value)?),
        "emission" => ModeChange::Emission(parse_switch(value)?),
        "emission-gi" => ModeChange::EmissionGi(match value {
            "none" => EmissionGiMode::None,
            "realtime" => EmissionGiMode::Realtime,
            "baked" => EmissionGiMode::Baked,
            _ => bail!("emission-gi expects none|realtime|baked, got '{value}'"),
        }),
        "texture-map" => {
            let Some((slot, handle)) = value.split_once('=') else {
                bail!("texture-map expects '<slot>=<handle>' (use '-' to unbind), got '{value}'");
            };
            let slot = match slot {
                "base" => TextureSlot::Base,
                "metallic" => TextureSlot::Metallic,
                "normal" => TextureSlot::Normal,
                "occlusion" => TextureSlot::Occlusion,
                "emission" => TextureSlot::Emission,
                "detail-mask" => TextureSlot::DetailMask,
                _ => bail!("unknown texture slot '{slot}'"),
            };
            let handle = (handle != "-").then(|| handle.to_string());
            ModeChange::TextureMap(slot, handle)
        }
        "base-color" => {
            let mut parts = value.split(',');
            let mut rgba = [0.0f32; 4];
            for slot in &mut rgba {
                let part = parts
                    .next()
                    .with_context(|| "base-color expects 'r,g,b,a'".to_string())?;
                *slot = part
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid color component '{part}'"))?;
            }
            if parts.next().is_some() {
                bail!("base-color expects exactly four components");
            }
            ModeChange::BaseColor(Vec4::from_array(rgba))
        }
        _ => bail!("unknown mode '{mode}'"),
    };
    Ok(change)
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => bail!("expected on|off, got '{value}'"),
    }
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<ExitCode> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Convert { input, output } => {
            let snapshot = read_snapshot(&input)?;
            write_snapshot(&output, &snapshot)?;
            log::info!("Converted {} -> {}", input.display(), output.display());
        }

        Commands::Inspect { input } => {
            let snapshot = read_snapshot(&input)?;
            let registry = ShaderFamilyRegistry::new();

            log::info!("Shader: {}", snapshot.shader);
            match registry.resolve(&snapshot.shader) {
                Ok(family) => log::info!("Family: {}", family.name()),
                Err(_) => log::warn!("Family: unknown (raw property editing only)"),
            }
            log::info!("Properties: {}", snapshot.properties.len());
            log::info!("Keywords: {}", snapshot.keywords.len());
            for keyword in &snapshot.keywords {
                log::debug!("  {}", keyword);
            }
            log::info!("Tags: {}", snapshot.tags.len());
            for (name, value) in &snapshot.tags {
                log::debug!("  {} = {}", name, value);
            }
            log::info!("Passes: {}", snapshot.passes.len());
            log::info!("Render queue: {}", snapshot.render_queue);
            log::info!("GI flags: {}", snapshot.gi_flags.bits());
            log::info!("Double-sided GI: {}", snapshot.double_sided_gi);
            log::info!(
                "Tiling: ({}, {})  Offset: ({}, {})",
                snapshot.uv_tiling.x,
                snapshot.uv_tiling.y,
                snapshot.uv_offset.x,
                snapshot.uv_offset.y
            );
        }

        Commands::Apply {
            input,
            mode,
            value,
            output,
        } => {
            let mut snapshot = read_snapshot(&input)?;
            let change = parse_mode_change(&mode, &value)?;
            let registry = ShaderFamilyRegistry::new();
            registry
                .apply(&mut snapshot, change)
                .with_context(|| format!("applying {mode}={value}"))?;

            let target = output.unwrap_or(input);
            write_snapshot(&target, &snapshot)?;
            log::info!("Applied {}={} -> {}", mode, value, target.display());
        }

        Commands::Diff { a, b } => {
            let snap_a = read_snapshot(&a)?;
            let snap_b = read_snapshot(&b)?;

            if snap_a.semantic_eq(&snap_b) {
                log::info!("Snapshots are semantically equal");
            } else {
                if snap_a.shader != snap_b.shader {
                    log::info!("shader: {} != {}", snap_a.shader, snap_b.shader);
                }
                if snap_a.keywords != snap_b.keywords {
                    log::info!(
                        "keywords differ: {:?} vs {:?}",
                        snap_a.keywords,
                        snap_b.keywords
                    );
                }
                if snap_a.tags != snap_b.tags {
                    log::info!("tags differ: {:?} vs {:?}", snap_a.tags, snap_b.tags);
                }
                if snap_a.render_queue != snap_b.render_queue {
                    log::info!("queue: {} != {}", snap_a.render_queue, snap_b.render_queue);
                }
                for record in &snap_a.properties {
                    if snap_b.property(&record.name, record.kind()) != Some(&record.value) {
                        log::info!("property '{}' differs", record.name);
                    }
                }
                for record in &snap_b.properties {
                    if snap_a.property(&record.name, record.kind()).is_none() {
                        log::info!("property '{}' only in {}", record.name, b.display());
                    }
                }
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
