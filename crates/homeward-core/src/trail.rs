use crate::engine::Position;
use alloc::vec::Vec;
use zerocopy::{FromBytes, IntoBytes};

// ---------------------------------------------------------------------------
// 1. Quantization Helpers
// ---------------------------------------------------------------------------

/// Meters to whole centimeters, round to nearest.
#[inline]
pub fn m_to_cm(v: f32) -> i32 {
    libm::roundf(v * 100.0) as i32
}

/// Centimeters back to meters.
#[inline]
pub fn cm_to_m(v: i32) -> f32 {
    v as f32 / 100.0
}

// ---------------------------------------------------------------------------
// 2. Frame Structs (Zero-Copy)
// ---------------------------------------------------------------------------

const TAG_ANCHOR: u8 = 0x00;
const TAG_DELTA: u8 = 0x01;

const ANCHOR_LEN: usize = 8;
const DELTA_LEN: usize = 2;

/// Absolute trail point (8 bytes). Keyframe in the compressed stream.
#[repr(C, packed)]
#[derive(
    zerocopy::IntoBytes,
    zerocopy::FromBytes,
    zerocopy::KnownLayout,
    zerocopy::Immutable,
    Clone,
    Copy,
    Debug,
    PartialEq,
)]
pub struct TrailAnchor {
    pub x_cm: i32,
    pub y_cm: i32,
}

/// Offset from the previous point (2 bytes). Resolution drops to
/// decimeters so a hop fits in i8.
#[repr(C, packed)]
#[derive(
    zerocopy::IntoBytes,
    zerocopy::FromBytes,
    zerocopy::KnownLayout,
    zerocopy::Immutable,
    Clone,
    Copy,
    Debug,
    PartialEq,
)]
pub struct TrailDelta {
    pub dx_dm: i8,
    pub dy_dm: i8,
}

// ---------------------------------------------------------------------------
// 3. Batch Compressor
// ---------------------------------------------------------------------------

/// Packs a trail into one bounded byte frame: a full anchor first, then
/// decimeter deltas, re-anchoring whenever a hop overflows i8 (a pause can
/// leave a long straight gap in the path).
///
/// Deltas are taken against the point the decoder will have reconstructed,
/// so quantization error stays bounded instead of accumulating.
pub struct TrailPacker {
    buffer: [u8; 250], // Radio-friendly MTU
    offset: usize,
    last_cm: Option<(i32, i32)>,
}

impl Default for TrailPacker {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailPacker {
    pub fn new() -> Self {
        Self {
            buffer: [0u8; 250],
            offset: 0,
            last_cm: None,
        }
    }

    pub fn push(&mut self, point: Position) -> bool {
        let x_cm = m_to_cm(point.x);
        let y_cm = m_to_cm(point.y);

        let prev = match self.last_cm {
            Some(p) => p,
            None => return self.write_anchor(x_cm, y_cm),
        };

        let dx_dm = dm_round(x_cm - prev.0);
        let dy_dm = dm_round(y_cm - prev.1);

        if in_i8(dx_dm) && in_i8(dy_dm) {
            if self.offset + 1 + DELTA_LEN > self.buffer.len() {
                return false;
            }

            self.buffer[self.offset] = TAG_DELTA;
            self.offset += 1;

            let delta = TrailDelta {
                dx_dm: dx_dm as i8,
                dy_dm: dy_dm as i8,
            };
            self.buffer[self.offset..self.offset + DELTA_LEN].copy_from_slice(delta.as_bytes());
            self.offset += DELTA_LEN;

            // Track the decoder's view of the point, not the exact one.
            self.last_cm = Some((prev.0 + dx_dm * 10, prev.1 + dy_dm * 10));
            true
        } else {
            self.write_anchor(x_cm, y_cm)
        }
    }

    fn write_anchor(&mut self, x_cm: i32, y_cm: i32) -> bool {
        if self.offset + 1 + ANCHOR_LEN > self.buffer.len() {
            return false;
        }

        self.buffer[self.offset] = TAG_ANCHOR;
        self.offset += 1;

        let anchor = TrailAnchor { x_cm, y_cm };
        self.buffer[self.offset..self.offset + ANCHOR_LEN].copy_from_slice(anchor.as_bytes());
        self.offset += ANCHOR_LEN;

        self.last_cm = Some((x_cm, y_cm));
        true
    }

    pub fn finalize(&mut self) -> &[u8] {
        &self.buffer[0..self.offset]
    }

    pub fn len(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }
}

/// Centimeter difference to the nearest decimeter count.
fn dm_round(cm: i32) -> i32 {
    if cm >= 0 {
        (cm + 5) / 10
    } else {
        (cm - 5) / 10
    }
}

fn in_i8(val: i32) -> bool {
    (-128..=127).contains(&val)
}

// ---------------------------------------------------------------------------
// 4. Decoder
// ---------------------------------------------------------------------------

/// Rebuild trail points from a packed frame. `None` on a truncated frame
/// or unknown tag.
pub fn decode_trail(mut bytes: &[u8]) -> Option<Vec<Position>> {
    let mut out = Vec::new();
    let mut cursor = (0i32, 0i32);
    let mut anchored = false;

    while !bytes.is_empty() {
        let tag = bytes[0];
        bytes = &bytes[1..];

        match tag {
            TAG_ANCHOR => {
                let (anchor, rest) = TrailAnchor::read_from_prefix(bytes).ok()?;
                bytes = rest;
                cursor = (anchor.x_cm, anchor.y_cm);
                anchored = true;
            }
            TAG_DELTA => {
                if !anchored {
                    return None;
                }
                let (delta, rest) = TrailDelta::read_from_prefix(bytes).ok()?;
                bytes = rest;
                cursor.0 += i32::from(delta.dx_dm) * 10;
                cursor.1 += i32::from(delta.dy_dm) * 10;
            }
            _ => return None,
        }

        out.push(Position::new(cm_to_m(cursor.0), cm_to_m(cursor.1)));
    }

    Some(out)
}
