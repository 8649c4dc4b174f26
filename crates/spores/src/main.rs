mod cli;
mod config;
mod paths;
mod run;

use anyhow::Result;
use cli::{Command, RunArgs};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Where) => run_where(),
        Some(Command::Config) => run_config(&cli.run),
        None => run::run(cli.run),
    }
}

fn run_where() -> Result<()> {
    let paths = AppPaths::discover()?;
    println!("Spores directories:");
    println!("  config:      {}", paths.config_dir().display());
    println!("  config file: {}", paths.config_file().display());
    println!("  cache:       {}", paths.cache_dir().display());
    println!("  textures:    {}", paths.texture_cache_dir().display());
    Ok(())
}

fn run_config(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let (config_path, config) = run::effective_config(&paths, args)?;
    // Validate before printing so a broken file fails here rather than at launch.
    run::renderer_config(&paths, &config)?;
    println!("# effective configuration (source: {})", config_path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}
