use crate::output::{print_json, print_warnings};
use anyhow::Context;
use phasegate_core::{
    config::{GateConfig, WarnLevel},
    paths,
};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config_path = paths::config_path(root);
    let created = !config_path.exists();

    let config = if created {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        let cfg = GateConfig::new(name);
        cfg.save(root).context("failed to write config.yaml")?;
        cfg
    } else {
        GateConfig::load(root).context("existing config.yaml is invalid")?
    };

    let warnings: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|w| w.level == WarnLevel::Warning)
        .map(|w| w.message)
        .collect();

    if json {
        #[derive(serde::Serialize)]
        struct InitOutput<'a> {
            root: &'a Path,
            config: &'a Path,
            created: bool,
            phases: usize,
            warnings: &'a [String],
        }
        return print_json(&InitOutput {
            root,
            config: &config_path,
            created,
            phases: config.phases.len(),
            warnings: &warnings,
        });
    }

    println!("Initializing phasegate in: {}", root.display());
    if created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    for phase in &config.phases {
        println!("  phase {}: {} ({})", phase.number, phase.name, phase.dir);
    }
    print_warnings(&warnings);
    Ok(())
}
