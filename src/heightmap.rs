use crate::config::MapConfig;
use crate::error::{MapGenError, Result};
use crate::prng::AleaPrng;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use image::{ImageBuffer, Luma};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Координаты клетки сетки: столбец `x` и строка `y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Расстояние Чебышёва (максимум из разностей по осям)
    #[must_use]
    pub fn chebyshev_distance(self, other: GridPoint) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Двумерная карта высот: значения от 0.0 (глубокая вода) до 1.0 (пики)
///
/// Данные хранятся построчно: клетка `(x, y)` лежит по индексу `y * width + x`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heightmap {
    pub width: u32,
    pub height: u32,
    data: Vec<f32>,
}

impl Heightmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Строит карту из готовых данных, проверяя размер и диапазон значений
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 {
            return Err(MapGenError::InvalidHeightmap(format!(
                "grid size must be positive, got {width}x{height}"
            )));
        }
        if data.len() != expected {
            return Err(MapGenError::InvalidHeightmap(format!(
                "expected {expected} values for {width}x{height}, got {}",
                data.len()
            )));
        }
        if let Some((i, v)) = data
            .iter()
            .enumerate()
            .find(|&(_, v)| !(0.0..=1.0).contains(v))
        {
            return Err(MapGenError::InvalidHeightmap(format!(
                "value {v} at index {i} is outside [0, 1]"
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[self.index(x, y)]
    }

    pub fn at(&self, point: GridPoint) -> f32 {
        self.get(point.x, point.y)
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        point.x < self.width && point.y < self.height
    }

    /// Высота в клетке со знаковыми координатами; за пределами сетки `None`
    pub fn try_get(&self, x: i64, y: i64) -> Option<f32> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(self.data[self.index(x as u32, y as u32)])
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, y: u32) -> &[f32] {
        let start = self.index(0, y);
        &self.data[start..start + self.width as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.width as usize)
    }

    pub fn to_grayscale_image(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0) as u8)
            .collect()
    }

    pub fn save_as_png(&self, path: &str) -> Result<()> {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(self.width, self.height, self.to_grayscale_image()).ok_or_else(
                || MapGenError::InvalidHeightmap("failed to create image buffer".to_string()),
            )?;
        img.save(path)?;
        Ok(())
    }
}

/// Генерирует карту высот суммированием октав когерентного шума.
///
/// Сид шума - первое `uint32()` генератора, поэтому одинаковые
/// (сиды, конфигурация) дают побитово одинаковую карту.
pub fn generate_heightmap(config: &MapConfig, prng: &mut AleaPrng) -> Heightmap {
    let width = config.width;
    let height = config.height;

    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(prng.uint32() as i32));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    // Октавы суммируем сами, координаты передаём без дополнительного масштаба
    noise.set_fractal_type(Some(FractalType::None));
    noise.set_frequency(Some(1.0));

    let octaves = config.octaves;
    let scale = config.noise_scale;
    let sample = |i: usize| -> f32 {
        let x = (i % width as usize) as f64;
        let y = (i / width as usize) as f64;

        let mut value = 0.0_f64;
        let mut amplitude = 1.0_f64;
        let mut frequency = 1.0_f64;
        for _ in 0..octaves {
            let nx = (x / scale) * frequency;
            let ny = (y / scale) * frequency;
            value += f64::from(noise.get_noise_2d(nx as f32, ny as f32)) * amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        // При нескольких октавах сумма может выйти за [-1, 1]
        (((value + 1.0) / 2.0) as f32).clamp(0.0, 1.0)
    };

    let cells = config.cell_count();
    #[cfg(feature = "parallel")]
    let data: Vec<f32> = (0..cells).into_par_iter().map(sample).collect();
    #[cfg(not(feature = "parallel"))]
    let data: Vec<f32> = (0..cells).map(sample).collect();

    tracing::debug!(width, height, octaves, "heightmap generated");

    Heightmap {
        width,
        height,
        data,
    }
}
