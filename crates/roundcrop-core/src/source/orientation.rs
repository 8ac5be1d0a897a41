//! EXIF orientation handling.
//!
//! Phone photos are usually stored sideways with an orientation tag. The
//! crop viewport must show (and export) the image the way the user sees it,
//! so decoding applies the tag before anything measures the natural size.
//!
//! Each of the eight tag values is expressed as clockwise quarter turns
//! followed by an optional horizontal mirror:
//!
//! ```text
//! tag  turns  mirror
//!  1     0      -
//!  2     0      x
//!  3     2      -
//!  4     2      x
//!  5     1      x
//!  6     1      -
//!  7     3      x
//!  8     3      -
//! ```

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// How to bring stored pixels upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Orientation {
    /// Clockwise quarter turns, 0-3.
    pub quarter_turns: u8,
    /// Mirror horizontally after turning.
    pub mirrored: bool,
}

impl Orientation {
    pub const UPRIGHT: Orientation = Orientation {
        quarter_turns: 0,
        mirrored: false,
    };

    /// Map an EXIF orientation tag value. Unknown values are upright.
    pub fn from_exif(tag: u32) -> Self {
        let (quarter_turns, mirrored) = match tag {
            2 => (0, true),
            3 => (2, false),
            4 => (2, true),
            5 => (1, true),
            6 => (1, false),
            7 => (3, true),
            8 => (3, false),
            _ => (0, false),
        };
        Self {
            quarter_turns,
            mirrored,
        }
    }

    pub fn is_upright(self) -> bool {
        self == Self::UPRIGHT
    }

    /// Odd quarter turns exchange width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        self.quarter_turns % 2 == 1
    }

    /// Turn, then mirror, a decoded image into display orientation.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        let turned = match self.quarter_turns % 4 {
            1 => img.rotate90(),
            2 => img.rotate180(),
            3 => img.rotate270(),
            _ => img,
        };
        if self.mirrored {
            turned.fliph()
        } else {
            turned
        }
    }
}

/// Read the orientation tag from a file's bytes.
///
/// Files without EXIF (PNG, GIF, most WebP) come back upright.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif)
            .unwrap_or_default(),
        Err(_) => Orientation::UPRIGHT,
    }
}
