// src/error.rs
use thiserror::Error;

/// Ошибки генератора карт
///
/// Сама генерация для валидной конфигурации не падает; ошибки возникают
/// только при проверке входных данных и при вводе-выводе.
#[derive(Error, Debug)]
pub enum MapGenError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid heightmap: {0}")]
    InvalidHeightmap(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MapGenError>;
