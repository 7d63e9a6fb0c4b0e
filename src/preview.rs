use crate::config::MapConfig;
use crate::error::Result;
use crate::world::GenerationResult;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

const RIVER_COLOR: Rgb<u8> = Rgb([0x61, 0xaf, 0xef]);
const CITY_COLOR: Rgb<u8> = Rgb([0xe0, 0x6c, 0x66]);
const CITY_RADIUS: i32 = 4;

/// Цвет рельефа по высоте
#[must_use]
pub fn terrain_color(height: f32) -> Rgb<u8> {
    let hex: u32 = if height < 0.3 {
        0x2c_5a_a0 // глубокая вода
    } else if height < 0.4 {
        0x56_80_c1 // мелководье
    } else if height < 0.5 {
        0xe0_dd_a0 // берег
    } else if height < 0.7 {
        0x7d_ab_6d // равнины
    } else if height < 0.9 {
        0x55_55_55 // нагорья
    } else {
        0xff_ff_ff
    };
    let [_, r, g, b] = hex.to_be_bytes();
    Rgb([r, g, b])
}

/// Рисует карту: клетки `cell_size × cell_size`, реки линиями, города кружками
pub fn render_preview(result: &GenerationResult, config: &MapConfig) -> RgbImage {
    let cell = config.cell_size;
    let map = &result.heightmap;
    let mut img = RgbImage::new(map.width * cell, map.height * cell);

    for (px, py, pixel) in img.enumerate_pixels_mut() {
        *pixel = terrain_color(map.get(px / cell, py / cell));
    }

    let scale = cell as f32;
    for river in &result.rivers {
        for pair in river.points().windows(2) {
            let from = (pair[0].x as f32 * scale, pair[0].y as f32 * scale);
            let to = (pair[1].x as f32 * scale, pair[1].y as f32 * scale);
            draw_line_segment_mut(&mut img, from, to, RIVER_COLOR);
        }
    }

    for city in &result.cities {
        let center = ((city.x * cell) as i32, (city.y * cell) as i32);
        draw_filled_circle_mut(&mut img, center, CITY_RADIUS, CITY_COLOR);
    }

    img
}

pub fn save_preview(result: &GenerationResult, config: &MapConfig, path: &str) -> Result<()> {
    render_preview(result, config).save(path)?;
    Ok(())
}
