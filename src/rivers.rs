use crate::heightmap::{GridPoint, Heightmap};
use crate::prng::{AleaPrng, SeedValue};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

/// Ниже этой высоты клетка считается водой, и река заканчивается
pub const WET_THRESHOLD: f32 = 0.3;

// Порядок просмотра важен: при равных высотах побеждает первый кандидат
const CANDIDATES: [(i64, i64); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Русло реки: соседние (по Чебышёву) клетки от истока к устью
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RiverPath {
    points: Vec<GridPoint>,
}

impl RiverPath {
    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn source(&self) -> Option<GridPoint> {
        self.points.first().copied()
    }

    pub fn mouth(&self) -> Option<GridPoint> {
        self.points.last().copied()
    }
}

/// Спуск по наибольшему уклону из клетки `start`.
///
/// Пока клетка выше [`WET_THRESHOLD`], она добавляется в русло, и поток
/// переходит в самого низкого из 8 соседей, только если тот строго ниже
/// текущей клетки. Клетки за пределами сетки не рассматриваются.
/// Длина русла не превышает числа клеток карты. Исток вне сетки даёт пустое русло.
pub fn trace_river(heightmap: &Heightmap, start: GridPoint) -> RiverPath {
    if !heightmap.contains(start) {
        return RiverPath::default();
    }
    let max_steps = heightmap.width as usize * heightmap.height as usize;
    let mut points = Vec::new();
    let mut x = i64::from(start.x);
    let mut y = i64::from(start.y);
    let mut current = heightmap.at(start);

    while current > WET_THRESHOLD {
        if points.len() == max_steps {
            tracing::warn!(?start, max_steps, "river walk hit the step limit");
            break;
        }
        points.push(GridPoint::new(x as u32, y as u32));

        // Сама клетка выигрывает ничью, поэтому по плато поток не течёт
        let mut best = (0, 0, current);
        for &(dx, dy) in &CANDIDATES {
            let h = heightmap.try_get(x + dx, y + dy).unwrap_or(f32::INFINITY);
            if h < best.2 {
                best = (dx, dy, h);
            }
        }

        let (dx, dy, h) = best;
        if dx == 0 && dy == 0 {
            break;
        }
        x += dx;
        y += dy;
        current = h;
    }

    RiverPath { points }
}

fn random_start(heightmap: &Heightmap, prng: &mut AleaPrng) -> GridPoint {
    let x = (prng.next_f64() * f64::from(heightmap.width)).floor() as u32;
    let y = (prng.next_f64() * f64::from(heightmap.height)).floor() as u32;
    GridPoint::new(x.min(heightmap.width - 1), y.min(heightmap.height - 1))
}

/// Прокладывает до `count` рек из случайных истоков общего потока генератора.
///
/// Русла, исток которых уже под водой, отбрасываются.
pub fn trace_rivers(heightmap: &Heightmap, count: usize, prng: &mut AleaPrng) -> Vec<RiverPath> {
    let rivers: Vec<RiverPath> = (0..count)
        .map(|_| {
            let start = random_start(heightmap, prng);
            trace_river(heightmap, start)
        })
        .filter(|path| !path.is_empty())
        .collect();

    tracing::debug!(requested = count, traced = rivers.len(), "rivers traced");
    rivers
}

/// Как [`trace_rivers`], но река `i` берёт исток из собственного подпотока
/// `[base, i]`, где `base` - одно `uint32()` общего генератора.
///
/// Результат не зависит от того, трассируются ли реки параллельно.
pub fn trace_rivers_partitioned(
    heightmap: &Heightmap,
    count: usize,
    prng: &mut AleaPrng,
) -> Vec<RiverPath> {
    let base = prng.uint32();
    let trace_one = |i: usize| {
        let mut stream = AleaPrng::from_seeds([SeedValue::from(base), SeedValue::from(i)]);
        let start = random_start(heightmap, &mut stream);
        trace_river(heightmap, start)
    };

    #[cfg(feature = "parallel")]
    let rivers: Vec<RiverPath> = (0..count)
        .into_par_iter()
        .map(trace_one)
        .filter(|path| !path.is_empty())
        .collect();
    #[cfg(not(feature = "parallel"))]
    let rivers: Vec<RiverPath> = (0..count)
        .map(trace_one)
        .filter(|path| !path.is_empty())
        .collect();

    tracing::debug!(requested = count, traced = rivers.len(), base, "rivers traced");
    rivers
}
