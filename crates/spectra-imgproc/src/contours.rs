//! Border following and object extraction over binary images.
//!
//! [`find_contours`] implements the border following of Suzuki and Abe (1985): a raster
//! scan that labels every border it meets, so each outer border and hole border is traced
//! exactly once and linked to its enclosing border. [`find_objects`] turns the outer
//! borders of an [`EdgeMap`](crate::edge::EdgeMap) into numbered objects.

use serde::{Deserialize, Serialize};
use spectra_image::Image;

use crate::error::{ensure_valid_image, ProcessingError};

/// Kind of border found by the tracer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderType {
    /// Perimeter of foreground regions
    Outer,
    /// Perimeter of background regions enclosed by foreground.
    Hole,
}

/// Which borders [`find_contours`] returns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Outer borders that are not enclosed by any other border.
    #[default]
    External,
    /// Every border, with parent links into the returned list.
    List,
}

/// A pixel position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// x-coordinate (column).
    pub x: i64,
    /// y-coordinate (row).
    pub y: i64,
}

impl Point {
    /// Construct a point at (x, y).
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Axis aligned box with inclusive pixel bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Leftmost column.
    pub min_x: i64,
    /// Topmost row.
    pub min_y: i64,
    /// Rightmost column.
    pub max_x: i64,
    /// Bottom row.
    pub max_y: i64,
}

impl BoundingBox {
    /// Number of columns covered.
    pub fn width(&self) -> i64 {
        self.max_x - self.min_x + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> i64 {
        self.max_y - self.min_y + 1
    }

    /// Geometric center.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) as f64 / 2.0,
            (self.min_y + self.max_y) as f64 / 2.0,
        )
    }
}

/// The border of a region, as traced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    /// The border pixels in tracing order. The polygon is implicitly closed.
    pub points: Vec<Point>,
    /// The type of the border. Outer or Hole.
    pub border_type: BorderType,
    /// Index of the enclosing border, `None` when it is the image frame.
    pub parent: Option<usize>,
}

impl Contour {
    /// Signed polygon area from the shoelace formula.
    ///
    /// Positive for clockwise tracing on screen (rows growing downwards).
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let (p, q) = (self.points[i], self.points[(i + 1) % n]);
                p.x * q.y - q.x * p.y
            })
            .sum();
        twice as f64 / 2.0
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Min/max over the border coordinates.
    pub fn bounding_box(&self) -> BoundingBox {
        let first = self.points.first().copied().unwrap_or(Point::new(0, 0));
        self.points.iter().fold(
            BoundingBox {
                min_x: first.x,
                min_y: first.y,
                max_x: first.x,
                max_y: first.y,
            },
            |b, p| BoundingBox {
                min_x: b.min_x.min(p.x),
                min_y: b.min_y.min(p.y),
                max_x: b.max_x.max(p.x),
                max_y: b.max_y.max(p.y),
            },
        )
    }

    /// Area weighted centroid of the polygon, or the bounding box center when the polygon
    /// encloses no area.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.points.len();
        let mut a2 = 0.0;
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..n {
            let (p, q) = (self.points[i], self.points[(i + 1) % n]);
            let cross = (p.x * q.y - q.x * p.y) as f64;
            a2 += cross;
            cx += (p.x + q.x) as f64 * cross;
            cy += (p.y + q.y) as f64 * cross;
        }
        if a2.abs() < f64::EPSILON {
            return self.bounding_box().center();
        }
        (cx / (3.0 * a2), cy / (3.0 * a2))
    }
}

// E, SE, S, SW, W, NW, N, NE: clockwise on screen
const NEIGHBORS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Border labels over the image surrounded by a one pixel frame of background.
struct LabelGrid {
    stride: usize,
    labels: Vec<i32>,
}

impl LabelGrid {
    fn from_image(src: &Image<u8, 1>) -> Self {
        let stride = src.width() + 2;
        let mut labels = vec![0i32; stride * (src.height() + 2)];
        for (y, row) in src.as_slice().chunks_exact(src.width()).enumerate() {
            for (x, &v) in row.iter().enumerate() {
                if v > 0 {
                    labels[(y + 1) * stride + x + 1] = 1;
                }
            }
        }
        Self { stride, labels }
    }

    fn get(&self, p: Point) -> i32 {
        self.labels[p.y as usize * self.stride + p.x as usize]
    }

    fn set(&mut self, p: Point, v: i32) {
        self.labels[p.y as usize * self.stride + p.x as usize] = v;
    }
}

fn step(p: Point, dir: usize) -> Point {
    let (dx, dy) = NEIGHBORS[dir % 8];
    Point::new(p.x + dx, p.y + dy)
}

fn direction(from: Point, to: Point) -> usize {
    let d = (to.x - from.x, to.y - from.y);
    NEIGHBORS.iter().position(|&n| n == d).unwrap_or(0)
}

/// Follow the border that starts at `start`, whose background neighbor is `outside`,
/// writing `nbd` labels into the grid. Returns the traced pixels in grid coordinates.
fn follow_border(grid: &mut LabelGrid, start: Point, outside: Point, nbd: i32) -> Vec<Point> {
    let from = direction(start, outside);
    let Some(first) = (0..8)
        .map(|k| step(start, from + k))
        .find(|&p| grid.get(p) != 0)
    else {
        grid.set(start, -nbd);
        return vec![start];
    };

    let mut points = Vec::new();
    let (mut prev, mut curr) = (first, start);
    loop {
        points.push(curr);

        // counterclockwise from the neighbor after `prev`; `prev` itself ends the sweep
        let back = direction(curr, prev);
        let mut east_is_background = false;
        let mut next = prev;
        for k in 1..=8 {
            let dir = (back + 8 - k) % 8;
            let p = step(curr, dir);
            if grid.get(p) != 0 {
                next = p;
                break;
            }
            if dir == 0 {
                east_is_background = true;
            }
        }

        if east_is_background {
            grid.set(curr, -nbd);
        } else if grid.get(curr) == 1 {
            grid.set(curr, nbd);
        }

        if next == start && curr == first {
            break;
        }
        prev = curr;
        curr = next;
    }
    points
}

/// Finds the borders of the foreground regions of a binary image.
///
/// Every non-zero pixel is foreground and pixels outside the image are background, so
/// regions touching the image border are closed along it. Borders are discovered in raster
/// order (row by row, left to right).
///
/// # Arguments
///
/// * `src` - The binary image.
/// * `mode` - Which borders to return.
///
/// # Returns
///
/// The borders in discovery order. Points are in image coordinates.
///
/// # Examples
///
/// ```
/// use spectra_image::{Image, ImageSize};
/// use spectra_imgproc::contours::{find_contours, BorderType, RetrievalMode};
///
/// let mut img = Image::<u8, 1>::from_size_val(ImageSize { width: 5, height: 5 }, 0).unwrap();
/// for y in 1..4 {
///     for x in 1..4 {
///         img.set_pixel(x, y, 0, 255).unwrap();
///     }
/// }
///
/// let contours = find_contours(&img, RetrievalMode::List).unwrap();
/// assert_eq!(contours.len(), 1);
/// assert_eq!(contours[0].border_type, BorderType::Outer);
/// assert_eq!(contours[0].area(), 4.0);
/// ```
pub fn find_contours(
    src: &Image<u8, 1>,
    mode: RetrievalMode,
) -> Result<Vec<Contour>, ProcessingError> {
    ensure_valid_image(src)?;

    let mut grid = LabelGrid::from_image(src);
    let mut contours: Vec<Contour> = Vec::new();
    let mut nbd = 1i32;

    for y in 1..=src.height() as i64 {
        // the frame counts as border 1
        let mut lnbd = 1i32;

        for x in 1..=src.width() as i64 {
            let p = Point::new(x, y);
            let value = grid.get(p);
            if value == 0 {
                continue;
            }

            let west = Point::new(x - 1, y);
            let east = Point::new(x + 1, y);
            let found = if value == 1 && grid.get(west) == 0 {
                Some((BorderType::Outer, west))
            } else if value >= 1 && grid.get(east) == 0 {
                if value > 1 {
                    lnbd = value;
                }
                Some((BorderType::Hole, east))
            } else {
                None
            };

            if let Some((border_type, outside)) = found {
                nbd += 1;

                // labels start at 2 for the first traced border
                let parent = if lnbd >= 2 {
                    let index = (lnbd - 2) as usize;
                    let last = &contours[index];
                    if last.border_type != border_type {
                        Some(index)
                    } else {
                        last.parent
                    }
                } else {
                    None
                };

                let points = follow_border(&mut grid, p, outside, nbd)
                    .into_iter()
                    .map(|q| Point::new(q.x - 1, q.y - 1))
                    .collect();

                contours.push(Contour {
                    points,
                    border_type,
                    parent,
                });
            }

            let value = grid.get(p);
            if value != 1 {
                lnbd = value.abs();
            }
        }
    }

    Ok(match mode {
        RetrievalMode::List => contours,
        RetrievalMode::External => contours
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .collect(),
    })
}

/// An object found in an edge map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// 1-based position in discovery order.
    pub id: usize,
    /// Bounds of the outer border.
    pub bbox: BoundingBox,
    /// Shoelace area of the outer border.
    pub area: f64,
    /// Polygon centroid `(x, y)`.
    pub centroid: (f64, f64),
}

/// Extract objects from an edge map.
///
/// Outer borders that are not nested in another border become objects; holes and nested
/// shapes are never reported. Borders with `area < min_area` are discarded and the rest are
/// numbered from 1 in raster discovery order.
///
/// # Arguments
///
/// * `edge_map` - Binary image, non-zero on edges.
/// * `min_area` - Smallest area kept, in square pixels.
///
/// # Errors
///
/// [`ProcessingError::InvalidParameter`] if `min_area` is negative or not finite.
pub fn find_objects(
    edge_map: &Image<u8, 1>,
    min_area: f64,
) -> Result<Vec<DetectedObject>, ProcessingError> {
    if !min_area.is_finite() || min_area < 0.0 {
        return Err(ProcessingError::invalid_parameter(
            "min_area",
            "a finite value >= 0",
            min_area,
        ));
    }

    let contours = find_contours(edge_map, RetrievalMode::External)?;
    let total = contours.len();

    let objects = contours
        .iter()
        .filter(|c| c.area() >= min_area)
        .enumerate()
        .map(|(i, c)| DetectedObject {
            id: i + 1,
            bbox: c.bounding_box(),
            area: c.area(),
            centroid: c.centroid(),
        })
        .collect::<Vec<_>>();

    log::debug!(
        "find_objects: kept {} of {} external contours with min_area {}",
        objects.len(),
        total,
        min_area
    );

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectra_image::{ImageError, ImageSize};

    fn fill(img: &mut Image<u8, 1>, x0: usize, y0: usize, w: usize, h: usize, v: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let width = img.width();
                img.as_slice_mut()[y * width + x] = v;
            }
        }
    }

    fn blank(width: usize, height: usize) -> Result<Image<u8, 1>, ImageError> {
        Image::from_size_val(ImageSize { width, height }, 0)
    }

    #[test]
    fn test_basic_contours() -> Result<(), ProcessingError> {
        let mut img = blank(10, 10)?;
        fill(&mut img, 2, 2, 6, 6, 255);
        fill(&mut img, 4, 4, 2, 2, 0);

        let contours = find_contours(&img, RetrievalMode::List)?;
        assert_eq!(contours.len(), 2);

        let outer = &contours[0];
        assert_eq!(outer.border_type, BorderType::Outer);
        assert_eq!(outer.parent, None);
        for corner in [(2, 2), (7, 2), (7, 7), (2, 7)] {
            assert!(outer.points.contains(&Point::new(corner.0, corner.1)));
        }
        assert_eq!(outer.area(), 25.0);

        let hole = &contours[1];
        assert_eq!(hole.border_type, BorderType::Hole);
        assert_eq!(hole.parent, Some(0));
        assert!(hole.points.contains(&Point::new(3, 4)));
        assert!(hole.points.contains(&Point::new(6, 4)));
        assert!(hole.points.contains(&Point::new(5, 6)));
        assert!(hole.points.contains(&Point::new(5, 3)));

        let external = find_contours(&img, RetrievalMode::External)?;
        assert_eq!(external, vec![outer.clone()]);
        Ok(())
    }

    #[test]
    fn test_single_pixel() -> Result<(), ProcessingError> {
        let mut img = blank(5, 5)?;
        fill(&mut img, 2, 2, 1, 1, 255);

        let contours = find_contours(&img, RetrievalMode::List)?;
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![Point::new(2, 2)]);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(contours[0].centroid(), (2.0, 2.0));
        Ok(())
    }

    #[test]
    fn test_nested_contours() -> Result<(), ProcessingError> {
        let mut img = blank(20, 20)?;
        fill(&mut img, 2, 2, 16, 16, 255);
        fill(&mut img, 5, 5, 10, 10, 0);
        fill(&mut img, 8, 8, 4, 4, 255);

        let contours = find_contours(&img, RetrievalMode::List)?;
        assert_eq!(contours.len(), 3);
        assert_eq!(contours[0].border_type, BorderType::Outer);
        assert_eq!(contours[1].border_type, BorderType::Hole);
        assert_eq!(contours[1].parent, Some(0));
        assert_eq!(contours[2].border_type, BorderType::Outer);
        assert_eq!(contours[2].parent, Some(1));

        let external = find_contours(&img, RetrievalMode::External)?;
        assert_eq!(external.len(), 1);
        Ok(())
    }

    #[test]
    fn test_sibling_after_nested_shape() -> Result<(), ProcessingError> {
        let mut img = blank(16, 8)?;
        // ring with a dot inside, then a separate square on the same rows
        fill(&mut img, 1, 1, 6, 6, 255);
        fill(&mut img, 2, 2, 4, 4, 0);
        fill(&mut img, 3, 3, 2, 2, 255);
        fill(&mut img, 10, 2, 3, 3, 255);

        let contours = find_contours(&img, RetrievalMode::List)?;
        let outers = contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .collect::<Vec<_>>();
        assert_eq!(outers.len(), 3);

        let external = find_contours(&img, RetrievalMode::External)?;
        assert_eq!(external.len(), 2);
        assert_eq!(external[1].bounding_box().min_x, 10);
        Ok(())
    }

    #[test]
    fn test_shapes_touching_the_border() -> Result<(), ProcessingError> {
        let mut img = blank(6, 4)?;
        fill(&mut img, 0, 0, 3, 4, 255);

        let contours = find_contours(&img, RetrievalMode::External)?;
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].bounding_box(),
            BoundingBox {
                min_x: 0,
                min_y: 0,
                max_x: 2,
                max_y: 3
            }
        );
        assert_eq!(contours[0].area(), 6.0);
        Ok(())
    }

    #[test]
    fn test_find_objects_min_area() -> Result<(), ProcessingError> {
        let mut img = blank(30, 20)?;
        // 11x6 pixels enclose 10x5 through the pixel centers, 6x2 enclose 5x1
        fill(&mut img, 2, 2, 11, 6, 255);
        fill(&mut img, 18, 12, 6, 2, 255);

        let all = find_objects(&img, 0.0)?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].area, 50.0);
        assert_eq!(all[1].area, 5.0);

        let kept = find_objects(&img, 10.0)?;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
        assert_eq!(kept[0].area, 50.0);
        assert_eq!(
            kept[0].bbox,
            BoundingBox {
                min_x: 2,
                min_y: 2,
                max_x: 12,
                max_y: 7
            }
        );
        assert_eq!(kept[0].centroid, (7.0, 4.5));
        Ok(())
    }

    #[test]
    fn test_find_objects_numbering() -> Result<(), ProcessingError> {
        let mut img = blank(20, 20)?;
        fill(&mut img, 12, 1, 4, 4, 255);
        fill(&mut img, 1, 8, 4, 4, 255);
        fill(&mut img, 12, 14, 3, 3, 255);

        let objects = find_objects(&img, 1.0)?;
        let ids = objects.iter().map(|o| o.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3]);
        // raster order: the shape with the topmost first pixel comes first
        assert_eq!(objects[0].bbox.min_x, 12);
        assert_eq!(objects[1].bbox.min_x, 1);
        assert_eq!(objects[2].bbox.min_y, 14);
        Ok(())
    }

    #[test]
    fn test_find_objects_invalid_min_area() -> Result<(), ProcessingError> {
        let img = blank(4, 4)?;
        for min_area in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                find_objects(&img, min_area),
                Err(ProcessingError::InvalidParameter {
                    name: "min_area",
                    ..
                })
            ));
        }
        assert!(find_objects(&img, 0.0)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_signed_area_orientation() {
        let square = Contour {
            points: vec![
                Point::new(0, 0),
                Point::new(2, 0),
                Point::new(2, 2),
                Point::new(0, 2),
            ],
            border_type: BorderType::Outer,
            parent: None,
        };
        assert_eq!(square.signed_area(), 4.0);
        let mut reversed = square.clone();
        reversed.points.reverse();
        assert_eq!(reversed.signed_area(), -4.0);
        assert_eq!(square.centroid(), (1.0, 1.0));
    }
}
