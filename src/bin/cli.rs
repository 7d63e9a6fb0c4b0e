use clap::Parser;
use mapgen::preview::save_preview;
use mapgen::{AleaPrng, MapConfig, SeedValue, generate_world};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Генератор карт: рельеф, реки и города
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML (без него - параметры по умолчанию)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Сиды генератора; можно указать несколько. Без сидов генерация не воспроизводима
    #[arg(short, long, num_args = 1..)]
    seed: Vec<String>,

    /// Путь для сохранения результата в JSON
    #[arg(short, long, default_value = "world.json")]
    output: PathBuf,

    /// Путь для сохранения цветного превью (PNG)
    #[arg(short, long)]
    preview: Option<PathBuf>,

    /// Путь для сохранения карты высот в оттенках серого (PNG)
    #[arg(long)]
    heightmap: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mapgen=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Загрузка конфигурации из {}", path.display());
            MapConfig::from_toml_file(path)?
        }
        None => MapConfig::default(),
    };

    let mut prng = if cli.seed.is_empty() {
        tracing::warn!("Сид не задан, результат не будет воспроизводим");
        AleaPrng::unseeded()
    } else {
        AleaPrng::from_seeds(cli.seed.iter().cloned().map(SeedValue::from))
    };

    tracing::info!(
        "Генерация карты (размер: {}×{}, октав: {})...",
        config.width,
        config.height,
        config.octaves
    );
    let world = generate_world(&config, &mut prng)?;

    tracing::info!("Сохранение в {}", cli.output.display());
    fs::write(&cli.output, world.to_json()?)?;

    if let Some(path) = &cli.preview {
        tracing::info!("Сохранение превью в {}", path.display());
        save_preview(&world, &config, &path.to_string_lossy())?;
    }

    if let Some(path) = &cli.heightmap {
        tracing::info!("Сохранение карты высот в {}", path.display());
        world.heightmap.save_as_png(&path.to_string_lossy())?;
    }

    tracing::info!(
        "Готово: рек {}, городов {}",
        world.rivers.len(),
        world.cities.len()
    );
    Ok(())
}
