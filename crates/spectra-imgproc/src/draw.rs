//! Overlay drawing on `u8` images.
//!
//! Used to annotate detection results: object bounding boxes, centroid markers and traced
//! contours. Everything is clipped to the image, so shapes partially outside are drawn
//! partially.

use std::cmp::{max, min};

use spectra_image::Image;

use crate::contours::{Contour, DetectedObject};

#[inline]
fn set_pixel<const C: usize>(img: &mut Image<u8, C>, x: i64, y: i64, color: [u8; C]) {
    if x < 0 || y < 0 || x >= img.cols() as i64 || y >= img.rows() as i64 {
        return;
    }
    let start = (y as usize * img.cols() + x as usize) * C;
    img.as_slice_mut()[start..start + C].copy_from_slice(&color);
}

/// Draws a line on an image inplace using Bresenham's line algorithm.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `p0` - The start point of the line as a tuple of (x, y).
/// * `p1` - The end point of the line as a tuple of (x, y).
/// * `color` - The color of the line as an array of `C` elements.
/// * `thickness` - Side of the square stamped at every point of the line.
pub fn draw_line<const C: usize>(
    img: &mut Image<u8, C>,
    p0: (i64, i64),
    p1: (i64, i64),
    color: [u8; C],
    thickness: usize,
) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let half = thickness as i64 / 2;

    loop {
        for oy in -half..=half {
            for ox in -half..=half {
                set_pixel(img, x0 + ox, y0 + oy, color);
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws a rectangle outline on an image inplace.
///
/// Both corners are inclusive.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `top_left` - The top-left corner coordinates (x, y).
/// * `bottom_right` - The bottom-right corner coordinates (x, y).
/// * `color` - The color of the rectangle outline.
/// * `thickness` - The thickness of the lines.
pub fn draw_rect<const C: usize>(
    img: &mut Image<u8, C>,
    top_left: (i64, i64),
    bottom_right: (i64, i64),
    color: [u8; C],
    thickness: usize,
) {
    let (x0, y0) = top_left;
    let (x1, y1) = bottom_right;
    let (lx0, lx1) = (min(x0, x1), max(x0, x1));
    let (ly0, ly1) = (min(y0, y1), max(y0, y1));

    draw_line(img, (lx0, ly0), (lx1, ly0), color, thickness);
    draw_line(img, (lx0, ly1), (lx1, ly1), color, thickness);
    draw_line(img, (lx0, ly0), (lx0, ly1), color, thickness);
    draw_line(img, (lx1, ly0), (lx1, ly1), color, thickness);
}

/// Draws a closed contour as a polyline.
pub fn draw_contour<const C: usize>(img: &mut Image<u8, C>, contour: &Contour, color: [u8; C]) {
    let points = &contour.points;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        draw_line(img, (p.x, p.y), (q.x, q.y), color, 1);
    }
}

/// Draws a plus shaped marker with arms of `radius` pixels centered at `center`.
pub fn draw_marker<const C: usize>(
    img: &mut Image<u8, C>,
    center: (i64, i64),
    radius: i64,
    color: [u8; C],
) {
    let (x, y) = center;
    draw_line(img, (x - radius, y), (x + radius, y), color, 1);
    draw_line(img, (x, y - radius), (x, y + radius), color, 1);
}

/// Annotates detected objects with their bounding box and a centroid marker.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `objects` - The objects to annotate.
/// * `color` - The color used for boxes and markers.
pub fn draw_detected_objects<const C: usize>(
    img: &mut Image<u8, C>,
    objects: &[DetectedObject],
    color: [u8; C],
) {
    for object in objects {
        let bbox = &object.bbox;
        draw_rect(
            img,
            (bbox.min_x, bbox.min_y),
            (bbox.max_x, bbox.max_y),
            color,
            1,
        );
        let (cx, cy) = object.centroid;
        draw_marker(img, (cx.round() as i64, cy.round() as i64), 2, color);
    }
}
