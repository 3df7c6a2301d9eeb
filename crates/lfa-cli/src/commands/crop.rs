use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

use lfa_cli::{determine_output_path, image_name, RegionArgs};
use lfa_core::exporters::{export_image, ExportFormat};
use lfa_core::AnalysisWorkspace;

pub fn cmd_crop(input: PathBuf, region: RegionArgs, out: Option<PathBuf>) -> Result<()> {
    let spec = region
        .spec()
        .map_err(|e| anyhow!(e))?
        .context("crop needs a region: pass --roi or --drag")?;

    println!("Cropping {}...", input.display());
    let decoded = lfa_core::decode_image(&input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    println!("  Image: {}x{}", decoded.width, decoded.height);

    let mut workspace = AnalysisWorkspace::new();
    workspace.load_image(image_name(&input), decoded);
    spec.apply(&mut workspace)?;

    let Some(crop) = workspace.cropped() else {
        bail!("no region was extracted");
    };
    println!("  Region: {}x{}", crop.width, crop.height);

    let extension = match &out {
        Some(path) if !path.is_dir() && path.extension().is_some() => {
            ExportFormat::from_path(path)?.extension()
        }
        _ => ExportFormat::default().extension(),
    };
    let output_path = determine_output_path(&input, &out, extension).map_err(|e| anyhow!(e))?;

    export_image(crop, &output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    println!("Saved crop to {}", output_path.display());

    Ok(())
}
