// src/prng.rs
//! Детерминированный генератор псевдослучайных чисел Alea
//!
//! Генератор типа multiply-with-carry с тремя словами состояния и переносом.
//! Состояние инициализируется хешированием каждого сида через аккумулятор
//! `Mash`, поэтому одинаковый упорядоченный список сидов даёт один и тот же
//! поток на любой платформе с арифметикой IEEE-754 double.
//!
//! Генератор передаётся явно в каждую функцию генерации. Глобального
//! состояния нет; [`AleaPrng::unseeded`] существует только для удобства и
//! не воспроизводим.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const TWO_POW_32: f64 = 4_294_967_296.0;
const TWO_POW_NEG_32: f64 = 2.328_306_436_538_696_3e-10;
const TWO_POW_NEG_53: f64 = 1.110_223_024_625_156_5e-16;
const TWO_POW_21: f64 = 2_097_152.0;
const MULTIPLIER: f64 = 2_091_639.0;
const MASH_SEED: u32 = 0xefc8_249d;

/// Приведение к беззнаковому 32-битному целому по правилам `ToUint32`
fn to_uint32(x: f64) -> u32 {
    if !x.is_finite() {
        return 0;
    }
    x.trunc().rem_euclid(TWO_POW_32) as u32
}

fn to_int32(x: f64) -> i32 {
    to_uint32(x) as i32
}

/// Строковый хеш-аккумулятор. Состояние сохраняется между вызовами `mash`.
#[derive(Debug, Clone)]
pub struct Mash {
    n: f64,
}

impl Default for Mash {
    fn default() -> Self {
        Self::new()
    }
}

impl Mash {
    #[must_use]
    pub fn new() -> Self {
        Self {
            n: f64::from(MASH_SEED),
        }
    }

    /// Подмешивает строку (по кодовым единицам UTF-16) и возвращает число в [0, 1)
    pub fn mash(&mut self, data: &str) -> f64 {
        for unit in data.encode_utf16() {
            self.n += f64::from(unit);
            let mut h = 0.025_196_032_824_169_38 * self.n;
            self.n = f64::from(to_uint32(h));
            h -= self.n;
            h *= self.n;
            self.n = f64::from(to_uint32(h));
            h -= self.n;
            self.n += h * TWO_POW_32;
        }
        f64::from(to_uint32(self.n)) * TWO_POW_NEG_32
    }
}

/// Значение сида: строка или число. Хешируется его текстовое представление.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for SeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedValue::Int(v) => write!(f, "{v}"),
            SeedValue::Float(v) => write_number(f, *v),
            SeedValue::Text(s) => f.write_str(s),
        }
    }
}

/// Печатает число так же, как `Number.prototype.toString`: `3.0` → `3`,
/// `-0` → `0`, `1e21` → `1e+21`, `1e-7` → `1e-7`.
fn write_number(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        return f.write_str("NaN");
    }
    if v.is_infinite() {
        return f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if v == 0.0 {
        return f.write_str("0");
    }
    let magnitude = v.abs();
    if !(1.0e-6..1.0e21).contains(&magnitude) {
        let exp = format!("{v:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                write!(f, "{mantissa}e+{power}")
            }
            _ => f.write_str(&exp),
        };
    }
    write!(f, "{v}")
}

impl From<&str> for SeedValue {
    fn from(value: &str) -> Self {
        SeedValue::Text(value.to_string())
    }
}

impl From<String> for SeedValue {
    fn from(value: String) -> Self {
        SeedValue::Text(value)
    }
}

impl From<i64> for SeedValue {
    fn from(value: i64) -> Self {
        SeedValue::Int(value)
    }
}

impl From<i32> for SeedValue {
    fn from(value: i32) -> Self {
        SeedValue::Int(i64::from(value))
    }
}

impl From<u32> for SeedValue {
    fn from(value: u32) -> Self {
        SeedValue::Int(i64::from(value))
    }
}

impl From<usize> for SeedValue {
    fn from(value: usize) -> Self {
        SeedValue::Int(value as i64)
    }
}

impl From<f64> for SeedValue {
    fn from(value: f64) -> Self {
        SeedValue::Float(value)
    }
}

/// Снимок внутреннего состояния генератора
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AleaState {
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
    pub c: f64,
}

impl From<[f64; 4]> for AleaState {
    fn from([s0, s1, s2, c]: [f64; 4]) -> Self {
        Self { s0, s1, s2, c }
    }
}

/// Значения, которые умеет выдавать [`AleaPrng::range`].
///
/// Целые типы дают равномерное целое в `[lo, hi]` включительно,
/// вещественные - равномерное число в `[lo, hi)`.
pub trait RangeValue: Copy + PartialOrd {
    fn zero() -> Self;
    fn sample(lo: Self, hi: Self, unit: f64) -> Self;
}

macro_rules! int_range_value {
    ($($t:ty),*) => {$(
        impl RangeValue for $t {
            fn zero() -> Self {
                0
            }

            fn sample(lo: Self, hi: Self, unit: f64) -> Self {
                // Разность считаем в i128: для крайних границ она не влезает в исходный тип
                let span = hi as i128 - lo as i128;
                let offset = ((unit * (span as f64 + 1.0)).floor() as i128).min(span);
                (lo as i128 + offset) as $t
            }
        }
    )*};
}

int_range_value!(i32, i64, u32, u64, usize);

impl RangeValue for f64 {
    fn zero() -> Self {
        0.0
    }

    fn sample(lo: Self, hi: Self, unit: f64) -> Self {
        unit * (hi - lo) + lo
    }
}

impl RangeValue for f32 {
    fn zero() -> Self {
        0.0
    }

    fn sample(lo: Self, hi: Self, unit: f64) -> Self {
        (unit * f64::from(hi - lo) + f64::from(lo)) as f32
    }
}

/// Генератор Alea
#[derive(Debug, Clone)]
pub struct AleaPrng {
    s0: f64,
    s1: f64,
    s2: f64,
    c: f64,
    seeds: Vec<SeedValue>,
}

impl AleaPrng {
    /// Создаёт генератор из упорядоченного списка сидов
    pub fn from_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SeedValue>,
    {
        let mut prng = Self {
            s0: 0.0,
            s1: 0.0,
            s2: 0.0,
            c: 1.0,
            seeds: Vec::new(),
        };
        prng.seed(seeds);
        prng
    }

    /// Создаёт генератор из сохранённого состояния.
    ///
    /// Список сидов пуст, поэтому [`restart`](Self::restart) вернёт его
    /// к состоянию пустого сида, а не к снимку.
    #[must_use]
    pub fn from_state(state: AleaState) -> Self {
        let mut prng = Self::from_seeds(Vec::<SeedValue>::new());
        prng.import_state(state);
        prng
    }

    /// Недетерминированный генератор: сиды берутся из системного источника
    /// энтропии, а при его недоступности из часов. Не использовать там,
    /// где нужна воспроизводимость.
    #[must_use]
    pub fn unseeded() -> Self {
        let mut bytes = [0u8; 12];
        let seeds = match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => bytes
                .chunks_exact(4)
                .map(|c| SeedValue::from(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                .collect(),
            Err(err) => {
                tracing::warn!("OS entropy unavailable ({err}), seeding from clock");
                clock_seeds()
            }
        };
        Self::from_seeds(seeds)
    }

    /// Переинициализирует состояние из нового списка сидов
    pub fn seed<I, S>(&mut self, seeds: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<SeedValue>,
    {
        self.seeds = seeds.into_iter().map(Into::into).collect();
        self.initialize();
    }

    /// Возвращает генератор к началу потока для последнего списка сидов
    pub fn restart(&mut self) {
        self.initialize();
    }

    #[must_use]
    pub fn seeds(&self) -> &[SeedValue] {
        &self.seeds
    }

    fn initialize(&mut self) {
        let mut mash = Mash::new();
        self.s0 = mash.mash(" ");
        self.s1 = mash.mash(" ");
        self.s2 = mash.mash(" ");
        self.c = 1.0;

        for seed in &self.seeds {
            let text = seed.to_string();
            self.s0 -= mash.mash(&text);
            if self.s0 < 0.0 {
                self.s0 += 1.0;
            }
            self.s1 -= mash.mash(&text);
            if self.s1 < 0.0 {
                self.s1 += 1.0;
            }
            self.s2 -= mash.mash(&text);
            if self.s2 < 0.0 {
                self.s2 += 1.0;
            }
        }
    }

    /// Делает ровно один шаг и возвращает число в [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        let t = MULTIPLIER * self.s0 + self.c * TWO_POW_NEG_32;
        self.s0 = self.s1;
        self.s1 = self.s2;
        self.c = f64::from(to_int32(t));
        self.s2 = t - self.c;
        self.s2
    }

    /// Целое в [0, 2^32)
    pub fn uint32(&mut self) -> u32 {
        to_uint32(self.next_f64() * TWO_POW_32)
    }

    /// Число в [0, 1) с 53 битами точности (два шага генератора)
    pub fn fract53(&mut self) -> f64 {
        let high = self.next_f64();
        let low = f64::from(to_int32(self.next_f64() * TWO_POW_21));
        high + low * TWO_POW_NEG_53
    }

    /// Равномерное значение между `a` и `b` (порядок границ не важен)
    pub fn range<T: RangeValue>(&mut self, a: T, b: T) -> T {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        T::sample(lo, hi, self.next_f64())
    }

    /// То же, что `range(0, a)`
    pub fn range_to<T: RangeValue>(&mut self, a: T) -> T {
        self.range(T::zero(), a)
    }

    /// Пропускает `runs` шагов (не меньше одного)
    pub fn cycle(&mut self, runs: usize) {
        for _ in 0..runs.max(1) {
            self.next_f64();
        }
    }

    #[must_use]
    pub fn export_state(&self) -> AleaState {
        AleaState {
            s0: self.s0,
            s1: self.s1,
            s2: self.s2,
            c: self.c,
        }
    }

    pub fn import_state(&mut self, state: AleaState) {
        self.s0 = state.s0;
        self.s1 = state.s1;
        self.s2 = state.s2;
        self.c = state.c;
    }
}

fn clock_seeds() -> Vec<SeedValue> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mut aux = ChaCha8Rng::seed_from_u64(now.as_secs() ^ u64::from(now.subsec_nanos()));
    vec![
        SeedValue::Int(now.as_millis() as i64),
        SeedValue::Float(aux.gen_range(0.0..1.0e16)),
        SeedValue::Float(aux.gen_range(0.0..1.0e16)),
    ]
}

impl RngCore for AleaPrng {
    fn next_u32(&mut self) -> u32 {
        self.uint32()
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.uint32());
        let low = u64::from(self.uint32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.uint32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_stream() {
        let mut prng = AleaPrng::from_seeds(["my".into(), SeedValue::Int(3), "seeds".into()]);
        assert_eq!(prng.next_f64(), 0.308_021_893_259_137_87);
        assert_eq!(prng.next_f64(), 0.519_045_062_130_317_1);
        assert_eq!(prng.next_f64(), 0.436_352_622_928_097_84);
    }

    #[test]
    fn same_seeds_same_stream() {
        let mut a = AleaPrng::from_seeds(["test-seed"]);
        let mut b = AleaPrng::from_seeds(["test-seed"]);
        for _ in 0..1000 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn seed_order_matters() {
        let mut a = AleaPrng::from_seeds(["a", "b"]);
        let mut b = AleaPrng::from_seeds(["b", "a"]);
        assert_ne!(a.next_f64(), b.next_f64());
    }

    #[test]
    fn numbers_hash_as_their_text() {
        let mut numeric = AleaPrng::from_seeds([SeedValue::Int(42), SeedValue::Float(3.0)]);
        let mut textual = AleaPrng::from_seeds(["42", "3"]);
        for _ in 0..10 {
            assert_eq!(numeric.next_f64(), textual.next_f64());
        }
    }

    #[test]
    fn outputs_stay_in_unit_interval() {
        let mut prng = AleaPrng::from_seeds(["bounds"]);
        for _ in 0..10_000 {
            let v = prng.next_f64();
            assert!((0.0..1.0).contains(&v));
            let f = prng.fract53();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn uint32_scales_next() {
        let mut a = AleaPrng::from_seeds([7]);
        let mut b = AleaPrng::from_seeds([7]);
        let expected = (b.next_f64() * TWO_POW_32) as u32;
        assert_eq!(a.uint32(), expected);
    }

    #[test]
    fn export_import_reproduces_subsequence() {
        let mut prng = AleaPrng::from_seeds(["checkpoint"]);
        prng.cycle(17);
        let state = prng.export_state();
        let first: Vec<f64> = (0..20).map(|_| prng.next_f64()).collect();

        prng.import_state(state);
        let second: Vec<f64> = (0..20).map(|_| prng.next_f64()).collect();
        assert_eq!(first, second);

        let mut restored = AleaPrng::from_state(state);
        let third: Vec<f64> = (0..20).map(|_| restored.next_f64()).collect();
        assert_eq!(first, third);

        let words = AleaState::from([state.s0, state.s1, state.s2, state.c]);
        assert_eq!(words, state);
        let mut from_words = AleaPrng::from_state(words);
        assert_eq!(from_words.next_f64(), first[0]);
    }

    #[test]
    fn restart_rewinds_to_seed() {
        let mut prng = AleaPrng::from_seeds(["rewind", "2"]);
        assert_eq!(
            prng.seeds(),
            &[SeedValue::from("rewind"), SeedValue::from("2")][..]
        );
        let head: Vec<f64> = (0..5).map(|_| prng.next_f64()).collect();
        prng.cycle(100);
        prng.restart();
        let again: Vec<f64> = (0..5).map(|_| prng.next_f64()).collect();
        assert_eq!(head, again);
    }

    #[test]
    fn cycle_advances_at_least_once() {
        let mut a = AleaPrng::from_seeds(["cycle"]);
        let mut b = AleaPrng::from_seeds(["cycle"]);
        a.cycle(0);
        b.next_f64();
        assert_eq!(a.export_state(), b.export_state());
    }

    #[test]
    fn integer_range_is_inclusive_and_order_free() {
        let mut prng = AleaPrng::from_seeds(["range"]);
        let mut seen = [false; 7];
        for _ in 0..2000 {
            let v: i32 = prng.range(9, 3);
            assert!((3..=9).contains(&v));
            seen[(v - 3) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "some values never drawn: {seen:?}");

        for _ in 0..100 {
            let v: usize = prng.range_to(4);
            assert!(v <= 4);
        }
    }

    #[test]
    fn integer_range_handles_type_limits() {
        let mut prng = AleaPrng::from_seeds(["wide"]);
        for _ in 0..500 {
            let v: i32 = prng.range(i32::MIN, i32::MAX);
            let w: i64 = prng.range(i64::MIN, 0);
            let full: i64 = prng.range(i64::MAX, i64::MIN);
            let u: u32 = prng.range(0, u32::MAX);
            let big: u64 = prng.range(u64::MAX, 0);
            let size: usize = prng.range_to(usize::MAX);
            assert!(w <= 0);
            let _ = (v, full, u, big, size);
        }

        // Нижняя половина диапазона тоже достижима
        let below_zero = (0..200)
            .map(|_| prng.range(i32::MIN, i32::MAX))
            .filter(|&v: &i32| v < 0)
            .count();
        assert!(below_zero > 50 && below_zero < 150, "got {below_zero} negatives of 200");

        let high_half = (0..200)
            .map(|_| prng.range(0u64, u64::MAX))
            .filter(|&v| v > u64::MAX / 2)
            .count();
        assert!(high_half > 50 && high_half < 150, "got {high_half} of 200 in the upper half");

        for (lo, hi) in [(i32::MIN, i32::MIN + 1), (i32::MAX - 1, i32::MAX)] {
            let v: i32 = prng.range(lo, hi);
            assert!(v == lo || v == hi);
        }
        assert_eq!(prng.range(u64::MAX, u64::MAX), u64::MAX);
        assert_eq!(prng.range(i64::MIN, i64::MIN), i64::MIN);
    }

    #[test]
    fn f32_range_is_half_open() {
        let mut prng = AleaPrng::from_seeds(["f32"]);
        for _ in 0..1000 {
            let v: f32 = prng.range(0.25_f32, -4.0);
            assert!((-4.0..0.25).contains(&v));
        }
        let w: f32 = prng.range_to(2.0_f32);
        assert!((0.0..2.0).contains(&w));
    }

    #[test]
    fn float_seeds_print_like_numbers() {
        let text = |v: f64| SeedValue::Float(v).to_string();
        assert_eq!(text(3.0), "3");
        assert_eq!(text(0.5), "0.5");
        assert_eq!(text(-0.0), "0");
        assert_eq!(text(1.0e21), "1e+21");
        assert_eq!(text(1.5e22), "1.5e+22");
        assert_eq!(text(1.0e-7), "1e-7");
        assert_eq!(text(-2.5e-8), "-2.5e-8");
        assert_eq!(text(1.0e20), "100000000000000000000");
        assert_eq!(text(0.000_001), "0.000001");
        assert_eq!(text(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(text(f64::NAN), "NaN");

        let mut exp = AleaPrng::from_seeds([1.0e21]);
        let mut textual = AleaPrng::from_seeds(["1e+21"]);
        assert_eq!(exp.next_f64(), textual.next_f64());
    }

    #[test]
    fn float_range_is_half_open() {
        let mut prng = AleaPrng::from_seeds(["float-range"]);
        for _ in 0..2000 {
            let v: f64 = prng.range(2.5, -1.5);
            assert!((-1.5..2.5).contains(&v));
        }
    }

    #[test]
    fn integer_range_passes_ks_test() {
        const N: usize = 10_000;
        const LO: i64 = 1;
        const HI: i64 = 10;
        let mut prng = AleaPrng::from_seeds(["ks"]);
        let mut counts = [0usize; (HI - LO + 1) as usize];
        for _ in 0..N {
            let v: i64 = prng.range(LO, HI);
            assert!((LO..=HI).contains(&v));
            counts[(v - LO) as usize] += 1;
        }

        let buckets = counts.len() as f64;
        let mut cumulative = 0usize;
        let mut d: f64 = 0.0;
        for (k, &count) in counts.iter().enumerate() {
            cumulative += count;
            let empirical = cumulative as f64 / N as f64;
            let expected = (k + 1) as f64 / buckets;
            d = d.max((empirical - expected).abs());
        }
        let critical = 2.0 / (N as f64).sqrt();
        assert!(d < critical, "KS statistic {d} exceeds {critical}");
    }

    #[test]
    fn drives_rand_apis() {
        let mut prng = AleaPrng::from_seeds(["rand"]);
        let v = prng.gen_range(10..20);
        assert!((10..20).contains(&v));
        let mut buf = [0u8; 7];
        prng.fill_bytes(&mut buf);
    }

    #[test]
    fn unseeded_instances_differ() {
        let mut a = AleaPrng::unseeded();
        let mut b = AleaPrng::unseeded();
        let xs: Vec<f64> = (0..4).map(|_| a.next_f64()).collect();
        let ys: Vec<f64> = (0..4).map(|_| b.next_f64()).collect();
        assert_ne!(xs, ys);
    }
}
