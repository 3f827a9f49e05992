use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::index::AnnotationSet;
use crate::rectangle::{Point, Rectangle};

use super::VisualizeConfigs;

/// Draw the positive (and optionally negative) rectangles of one image
pub fn draw_rectangles(img: &mut RgbImage, set: &AnnotationSet, configs: &VisualizeConfigs) {
    let thickness = configs.thickness.max(1);

    for rect in &set.pos {
        draw_rectangle(img, rect, Rgb(configs.pos_color), thickness);
    }

    if configs.include_negatives {
        for rect in &set.neg {
            draw_rectangle(img, rect, Rgb(configs.neg_color), thickness);
        }
    }
}

pub fn draw_rectangle(img: &mut RgbImage, rect: &Rectangle, color: Rgb<u8>, thickness: u32) {
    for (start, end) in rect.edges() {
        draw_thick_segment(img, start, end, color, thickness);
    }
}

/// Line between pixel-rounded endpoints; out-of-bounds pixels are clipped by imageproc.
///
/// The stroke is `thickness` pixels wide. Even widths put the extra pixel right of / below the line.
fn draw_thick_segment(
    img: &mut RgbImage,
    start: Point,
    end: Point,
    color: Rgb<u8>,
    thickness: u32,
) {
    let (x1, y1) = start.to_pixel();
    let (x2, y2) = end.to_pixel();

    let before = (thickness.saturating_sub(1) / 2) as i32;
    let after = (thickness / 2) as i32;
    for tx in -before..=after {
        for ty in -before..=after {
            draw_line_segment_mut(
                img,
                ((x1 + tx) as f32, (y1 + ty) as f32),
                ((x2 + tx) as f32, (y2 + ty) as f32),
                color,
            );
        }
    }
}
