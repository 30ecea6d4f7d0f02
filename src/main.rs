use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use blendup_import::host::{HostCapabilities, HostScene};
use blendup_import::import_scene_from_path;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Cli {
    scene_json: PathBuf,
    output: Option<PathBuf>,
    pack_images: bool,
    cycles: bool,
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut scene_json = None;
    let mut output = None;
    let mut pack_images = true;
    let mut cycles = true;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--scene-json" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --scene-json"));
                };
                scene_json = Some(PathBuf::from(v));
                i += 2;
            }
            "--output" | "-o" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --output"));
                };
                output = Some(PathBuf::from(v));
                i += 2;
            }
            "--no-pack" => {
                pack_images = false;
                i += 1;
            }
            "--without-cycles" => {
                cycles = false;
                i += 1;
            }
            other => {
                return Err(anyhow!(
                    "unknown argument: {other} (supported: --scene-json <scene.json>, --output <file>, --no-pack, --without-cycles)"
                ));
            }
        }
    }
    let scene_json = scene_json.ok_or_else(|| anyhow!("--scene-json <scene.json> is required"))?;
    Ok(Cli {
        scene_json,
        output,
        pack_images,
        cycles,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;

    let mut host = HostScene::startup(HostCapabilities { cycles: cli.cycles });
    let report = import_scene_from_path(&mut host, &cli.scene_json, cli.pack_images)?;

    let dump = serde_json::json!({ "report": report, "scene": host });
    let text = serde_json::to_string_pretty(&dump).context("serialize host scene")?;
    match cli.output {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote host scene");
        }
        None => println!("{text}"),
    }
    Ok(())
}
