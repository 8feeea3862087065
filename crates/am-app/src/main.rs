use am_ascii::TileRenderer;
use anyhow::Result;
use clap::Parser;

pub mod batch;
pub mod cli;
pub mod pipeline;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let (config, animation) = cli.resolve_config()?;
    let renderer = TileRenderer::new(config)?;

    // Conversion par lots
    if let Some(folder) = cli.batch_folder.as_deref() {
        let report = batch::run_batch(
            folder,
            cli.batch_out.as_deref(),
            &renderer,
            &animation,
            cli.animated,
        )?;
        if !report.failed.is_empty() {
            anyhow::bail!(
                "{} fichier(s) en échec sur {}",
                report.failed.len(),
                report.failed.len() + report.converted
            );
        }
        return Ok(());
    }

    // 5. Conversion d'un fichier
    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        anyhow::bail!("<INPUT> et --output sont requis.");
    };
    let done = pipeline::convert_file(&renderer, &animation, input, output, cli.animated)?;
    log::info!(
        "Terminé : {} frame(s), animé = {}",
        done.frames,
        done.animated
    );
    Ok(())
}
