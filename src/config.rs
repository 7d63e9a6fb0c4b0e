// src/config.rs
//! Конфигурация генерации мира
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией карты:
//! - Размеры сетки и масштаб клетки для отрисовки
//! - Параметры шума (масштаб, количество октав)
//! - Количество рек и городов
//!
//! Конфигурация неизменяема в рамках одного запуска: внешний слой управления
//! создаёт новый снимок и заново вызывает генерацию при любом изменении.
//! Поддерживается загрузка из TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{MapGenError, Result};

/// Способ раздачи случайных чисел рекам
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum RiverStreams {
    /// Все реки последовательно берут числа из общего потока генератора
    #[default]
    Shared,
    /// Каждая река получает собственный подпоток `[base, i]`; реки трассируются параллельно
    Partitioned,
}

/// Основные параметры генерации карты
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    /// Ширина сетки в клетках
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота сетки в клетках
    #[serde(default = "default_height")]
    pub height: u32,

    /// Масштаб шума: чем больше, тем крупнее формы рельефа
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f64,

    /// Количество октав фрактального шума
    #[serde(default = "default_octaves")]
    pub octaves: u32,

    /// Сколько рек попытаться проложить
    #[serde(default = "default_river_count")]
    pub river_count: usize,

    /// Сколько городов попытаться разместить
    #[serde(default = "default_city_count")]
    pub city_count: usize,

    /// Размер клетки в пикселях. Используется только при отрисовке
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,

    #[serde(default)]
    pub river_streams: RiverStreams,
}

fn default_width() -> u32 {
    100
}
fn default_height() -> u32 {
    100
}
fn default_noise_scale() -> f64 {
    50.0
}
fn default_octaves() -> u32 {
    4
}
fn default_river_count() -> usize {
    5
}
fn default_city_count() -> usize {
    10
}
fn default_cell_size() -> u32 {
    8
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            noise_scale: 50.0,
            octaves: 4,
            river_count: 5,
            city_count: 10,
            cell_size: 8,
            river_streams: RiverStreams::Shared,
        }
    }
}

impl MapConfig {
    /// Проверяет, что параметры допустимы для генерации.
    ///
    /// Нулевые размеры, октавы или размер клетки, а также неположительный
    /// масштаб шума считаются ошибкой программиста и отклоняются сразу.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MapGenError::InvalidConfig(format!(
                "grid size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.noise_scale.is_finite() || self.noise_scale <= 0.0 {
            return Err(MapGenError::InvalidConfig(format!(
                "noise_scale must be a positive finite number, got {}",
                self.noise_scale
            )));
        }
        if self.octaves == 0 {
            return Err(MapGenError::InvalidConfig(
                "octaves must be positive".to_string(),
            ));
        }
        if self.cell_size == 0 {
            return Err(MapGenError::InvalidConfig(
                "cell_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Количество клеток сетки
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Разбирает параметры из строки TOML и проверяет их
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # world.toml
    /// width = 200
    /// height = 120
    /// noise_scale = 40.0
    /// river_count = 8
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
