//! Server-compatible hash buckets used by HASH/VALUE partitioning and
//! worker routing.

use crate::core::value::Value;
use std::borrow::Cow;

const MURMUR_M: u32 = 0x5bd1_e995;
const MURMUR_R: u32 = 24;

impl Value {
    /// Maps the cell onto `0..buckets`, or `-1` when it has no bucket
    /// (null, type minimum, FLOAT).
    pub fn hash_bucket(&self, buckets: i32) -> i32 {
        if buckets <= 0 {
            return -1;
        }

        match self {
            Value::Null => -1,
            Value::Char(v) => int_bucket(*v as i32, *v == i8::MIN, buckets),
            Value::Short(v) => int_bucket(*v as i32, *v == i16::MIN, buckets),
            Value::Int(v)
            | Value::Date(v)
            | Value::Month(v)
            | Value::Time(v)
            | Value::Minute(v)
            | Value::Second(v)
            | Value::DateTime(v)
            | Value::DateHour(v) => int_bucket(*v, *v == i32::MIN, buckets),
            Value::Long(v)
            | Value::Timestamp(v)
            | Value::NanoTime(v)
            | Value::NanoTimestamp(v) => long_bucket(*v, buckets),
            Value::Symbol(v) | Value::String(v) => {
                (murmur2(&server_bytes(v)) as i64 % buckets as i64) as i32
            }
            Value::Uuid(v) => {
                let bits = v.as_u128();
                (int128_hash(bits as u64, (bits >> 64) as u64) as i64 % buckets as i64) as i32
            }
            Value::Float(_) => -1,
            Value::Double(_) | Value::Bool(_) | Value::Blob(_) | Value::Vector(_) => 0,
        }
    }
}

fn int_bucket(value: i32, is_min: bool, buckets: i32) -> i32 {
    if is_min {
        -1
    } else if value >= 0 {
        value % buckets
    } else {
        ((value as i64 + (1_i64 << 32)) % buckets as i64) as i32
    }
}

fn long_bucket(value: i64, buckets: i32) -> i32 {
    let buckets = buckets as i64;
    if value >= 0 {
        (value % buckets) as i32
    } else if value == i64::MIN {
        -1
    } else {
        (((i64::MAX % buckets) + 2 + ((i64::MAX + value) % buckets)) % buckets) as i32
    }
}

/// Bytes the server hashes for a string: UTF-8, except that NUL takes two
/// bytes (`C0 80`) and characters above U+FFFF keep only their low 16 bits
/// in a three-byte sequence.
fn server_bytes(s: &str) -> Cow<'_, [u8]> {
    if !s.chars().any(|c| c == '\0' || c > '\u{ffff}') {
        return Cow::Borrowed(s.as_bytes());
    }

    let mut bytes = Vec::with_capacity(s.len() + 1);
    for c in s.chars() {
        let c = c as u32;
        match c {
            0x01..=0x7f => bytes.push(c as u8),
            0x00 | 0x80..=0x7ff => {
                bytes.push((0xc0 | (0x1f & (c >> 6))) as u8);
                bytes.push((0x80 | (0x3f & c)) as u8);
            }
            _ => {
                bytes.push((0xe0 | (0x0f & (c >> 12))) as u8);
                bytes.push((0x80 | (0x3f & (c >> 6))) as u8);
                bytes.push((0x80 | (0x3f & c)) as u8);
            }
        }
    }
    Cow::Owned(bytes)
}

/// 32-bit MurmurHash2 seeded with the input length.
pub fn murmur2(data: &[u8]) -> u32 {
    let mut h = data.len() as u32;
    let mut chunks = data.chunks_exact(4);

    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(MURMUR_M);
        k ^= k >> MURMUR_R;
        k = k.wrapping_mul(MURMUR_M);
        h = h.wrapping_mul(MURMUR_M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() == 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(MURMUR_M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(MURMUR_M);
    h ^= h >> 15;
    h
}

fn int128_hash(low: u64, high: u64) -> u32 {
    let words = [low as u32, (low >> 32) as u32, high as u32, (high >> 32) as u32];
    let mut h: u32 = 16;

    for mut k in words {
        k = k.wrapping_mul(MURMUR_M);
        k ^= k >> MURMUR_R;
        k = k.wrapping_mul(MURMUR_M);
        h = h.wrapping_mul(MURMUR_M);
        h ^= k;
    }

    h ^= h >> 13;
    h = h.wrapping_mul(MURMUR_M);
    h ^= h >> 15;
    h
}
