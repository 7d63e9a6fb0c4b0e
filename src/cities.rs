use crate::heightmap::{GridPoint, Heightmap};
use crate::prng::AleaPrng;

/// Город - просто клетка сетки
pub type City = GridPoint;

/// Пригодные для поселений высоты (низкие холмы), границы не включаются
pub const HABITABLE_BAND: (f32, f32) = (0.5, 0.8);

#[must_use]
pub fn is_habitable(height: f32) -> bool {
    height > HABITABLE_BAND.0 && height < HABITABLE_BAND.1
}

/// Все пригодные клетки в порядке обхода сетки (построчно)
pub fn collect_candidates(heightmap: &Heightmap) -> Vec<GridPoint> {
    let mut candidates = Vec::new();
    for y in 0..heightmap.height {
        for (x, &h) in heightmap.row(y).iter().enumerate() {
            if is_habitable(h) {
                candidates.push(GridPoint::new(x as u32, y));
            }
        }
    }
    candidates
}

/// Выбирает до `count` различных городов среди пригодных клеток.
///
/// Выборка без возвращения: выбранный кандидат удаляется из списка.
/// Если кандидаты кончились раньше, возвращается сколько набралось.
/// Порядок результата - порядок выбора.
pub fn place_cities(heightmap: &Heightmap, count: usize, prng: &mut AleaPrng) -> Vec<City> {
    let mut candidates = collect_candidates(heightmap);
    let pool = candidates.len();
    let mut cities = Vec::with_capacity(count.min(pool));

    while cities.len() < count && !candidates.is_empty() {
        let remaining = candidates.len();
        let idx = (prng.next_f64() * remaining as f64).floor() as usize;
        cities.push(candidates.remove(idx.min(remaining - 1)));
    }

    tracing::debug!(requested = count, pool, placed = cities.len(), "cities placed");
    cities
}
