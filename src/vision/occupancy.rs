//! Decides whether a cell contains a piece.
//!
//! The cell goes through grayscale conversion, Gaussian smoothing, Sobel
//! edge detection and a morphological closing; a cell counts as occupied
//! when its largest connected edge blob is bigger than a piece-sized
//! area. Flat board texture produces no edges, so empty cells stay below
//! the cutoff regardless of square color.

use image::{GrayImage, RgbImage, imageops};

/// 3x3 Sobel kernels.
const SOBEL_GX: [[i16; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_GY: [[i16; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Gradient magnitude at or above this marks an edge pixel.
const EDGE_THRESHOLD: u16 = 60;

/// Gaussian smoothing applied before the gradient pass.
const BLUR_SIGMA: f32 = 1.1;

/// Radius of the square structuring element used for closing (5x5).
const CLOSE_RADIUS: i64 = 2;

/// Minimum edge blob area, in pixels, for a cell to count as occupied.
/// Tuned for cells around 100x100 pixels; it is not scaled with cell
/// size, so boards far from that resolution need retuning.
const MIN_PIECE_AREA: usize = 500;

/// True when the cell holds something piece-shaped.
pub fn is_occupied(cell: &RgbImage) -> bool {
    largest_blob_area(cell) > MIN_PIECE_AREA
}

fn largest_blob_area(cell: &RgbImage) -> usize {
    let gray = imageops::grayscale(cell);
    let blurred = imageops::blur(&gray, BLUR_SIGMA);
    let edges = sobel_edges(&blurred);
    let closed = close(&edges);
    largest_component(&closed)
}

/// Binary pixel grid the morphology and labeling passes work on.
struct EdgeMap {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl EdgeMap {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; (width * height) as usize],
        }
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    #[inline]
    fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.idx(x, y)]
    }

    #[inline]
    fn set(&mut self, x: u32, y: u32) {
        let idx = self.idx(x, y);
        self.data[idx] = true;
    }
}

fn sobel_edges(gray: &GrayImage) -> EdgeMap {
    let (width, height) = gray.dimensions();
    let mut map = EdgeMap::new(width, height);
    if width < 3 || height < 3 {
        return map;
    }
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx: i32 = 0;
            let mut gy: i32 = 0;
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let px = i32::from(gray.get_pixel(x + kx - 1, y + ky - 1)[0]);
                    gx += i32::from(SOBEL_GX[ky as usize][kx as usize]) * px;
                    gy += i32::from(SOBEL_GY[ky as usize][kx as usize]) * px;
                }
            }
            let magnitude = f64::from(gx * gx + gy * gy).sqrt() as u16;
            if magnitude >= EDGE_THRESHOLD {
                map.set(x, y);
            }
        }
    }
    map
}

/// Morphological closing: dilate then erode with a square element.
fn close(map: &EdgeMap) -> EdgeMap {
    erode(&dilate(map))
}

fn dilate(map: &EdgeMap) -> EdgeMap {
    morph(map, |any_set, _all_set| any_set)
}

fn erode(map: &EdgeMap) -> EdgeMap {
    morph(map, |_any_set, all_set| all_set)
}

fn morph(map: &EdgeMap, keep: impl Fn(bool, bool) -> bool) -> EdgeMap {
    let mut out = EdgeMap::new(map.width, map.height);
    for y in 0..map.height {
        for x in 0..map.width {
            let mut any_set = false;
            let mut all_set = true;
            for dy in -CLOSE_RADIUS..=CLOSE_RADIUS {
                for dx in -CLOSE_RADIUS..=CLOSE_RADIUS {
                    let nx = i64::from(x) + dx;
                    let ny = i64::from(y) + dy;
                    if nx < 0
                        || ny < 0
                        || nx >= i64::from(map.width)
                        || ny >= i64::from(map.height)
                    {
                        continue;
                    }
                    if map.get(nx as u32, ny as u32) {
                        any_set = true;
                    } else {
                        all_set = false;
                    }
                }
            }
            if keep(any_set, all_set) {
                out.set(x, y);
            }
        }
    }
    out
}

/// Area of the largest 8-connected component of set pixels.
fn largest_component(map: &EdgeMap) -> usize {
    let mut visited = vec![false; map.data.len()];
    let mut stack = Vec::new();
    let mut largest = 0;

    for start in 0..map.data.len() {
        if !map.data[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let mut area = 0;

        while let Some(idx) = stack.pop() {
            area += 1;
            let x = idx as u32 % map.width;
            let y = idx as u32 / map.width;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = i64::from(x) + dx;
                    let ny = i64::from(y) + dy;
                    if nx < 0
                        || ny < 0
                        || nx >= i64::from(map.width)
                        || ny >= i64::from(map.height)
                    {
                        continue;
                    }
                    let nidx = map.idx(nx as u32, ny as u32);
                    if map.data[nidx] && !visited[nidx] {
                        visited[nidx] = true;
                        stack.push(nidx);
                    }
                }
            }
        }
        largest = largest.max(area);
    }
    largest
}
