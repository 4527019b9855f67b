//! Interior flood fill
//!
//! A depth-first walk over 4-connected pixels with an explicit breadcrumb
//! trail, so arbitrarily large regions never touch the call stack.

use crate::color::Color;
use crate::display::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    North,
    West,
    East,
    South,
}

impl Direction {
    /// Probe order for the walk
    const ALL: [Direction; 4] = [
        Direction::North,
        Direction::West,
        Direction::East,
        Direction::South,
    ];

    #[inline]
    fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
        }
    }

    #[inline]
    fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Neighbors tried, in order, when the seed already has the fill color
const SEED_PROBES: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Where the fill should actually start, and the color it replaces
fn resolve_seed(buffer: &PixelBuffer, x: i32, y: i32, fill: Color) -> Option<(i32, i32, Color)> {
    let seed_color = buffer.get_pixel(x, y)?;
    if seed_color != fill {
        return Some((x, y, seed_color));
    }
    SEED_PROBES.iter().find_map(|&(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        match buffer.get_pixel(nx, ny) {
            Some(c) if c != fill => Some((nx, ny, c)),
            _ => None,
        }
    })
}

/// Flood-fill the 4-connected region around `(x, y)` with `fill`
///
/// The region is every pixel reachable from the seed through pixels of the
/// seed's color. If the seed already has the fill color, the first of its
/// eight neighbors (N, NE, E, SE, S, SW, W, NW) with a different color becomes
/// the seed instead; with no such neighbor, or a seed outside the buffer,
/// nothing changes.
///
/// Returns the number of pixels painted.
pub fn flood_fill(buffer: &mut PixelBuffer, x: i32, y: i32, fill: Color) -> usize {
    let Some((sx, sy, target)) = resolve_seed(buffer, x, y, fill) else {
        return 0;
    };

    buffer.set_pixel(sx, sy, fill);
    let mut painted = 1;

    let (mut px, mut py) = (sx, sy);
    let mut trail: Vec<Direction> = Vec::new();
    let mut next = 0;

    loop {
        let mut advanced = false;
        while next < Direction::ALL.len() {
            let dir = Direction::ALL[next];
            let (dx, dy) = dir.offset();
            let (nx, ny) = (px + dx, py + dy);
            // Out-of-bounds probes read as None and count as not paintable
            if buffer.get_pixel(nx, ny) == Some(target) {
                px = nx;
                py = ny;
                buffer.set_pixel(px, py, fill);
                painted += 1;
                trail.push(dir);
                next = 0;
                advanced = true;
                break;
            }
            next += 1;
        }
        if advanced {
            continue;
        }

        let Some(came_from) = trail.pop() else {
            break;
        };
        let (bx, by) = came_from.opposite().offset();
        px += bx;
        py += by;
        next = came_from.index() + 1;
    }

    painted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(size: u32) -> PixelBuffer {
        // White interior with a black one-pixel frame at the given size
        let mut buf = PixelBuffer::filled(size, size, Color::WHITE);
        let s = size as i32 - 1;
        buf.hline(0, s, 0, Color::BLACK);
        buf.hline(0, s, s, Color::BLACK);
        buf.vline(0, 0, s, Color::BLACK);
        buf.vline(s, 0, s, Color::BLACK);
        buf
    }

    #[test]
    fn test_fills_bounded_interior() {
        let mut buf = boxed(10);
        let painted = flood_fill(&mut buf, 5, 5, Color::RED);
        assert_eq!(painted, 64);
        assert_eq!(buf.count_color(Color::RED), 64);
        assert_eq!(buf.count_color(Color::BLACK), 36);
    }

    #[test]
    fn test_fill_is_four_connected() {
        let mut buf = PixelBuffer::filled(3, 3, Color::WHITE);
        // Diagonal wall splits the grid only under 4-connectivity
        buf.set_pixel(1, 0, Color::BLACK);
        buf.set_pixel(0, 1, Color::BLACK);
        flood_fill(&mut buf, 0, 0, Color::RED);
        assert_eq!(buf.count_color(Color::RED), 1);
    }

    #[test]
    fn test_fill_whole_buffer() {
        let mut buf = PixelBuffer::filled(64, 48, Color::WHITE);
        assert_eq!(flood_fill(&mut buf, 10, 10, Color::BLUE), 64 * 48);
    }

    #[test]
    fn test_seed_outside_is_noop() {
        let mut buf = PixelBuffer::filled(4, 4, Color::WHITE);
        let before = buf.clone();
        assert_eq!(flood_fill(&mut buf, -1, 2, Color::RED), 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_seed_equal_fill_without_different_neighbor_is_noop() {
        let mut buf = PixelBuffer::filled(5, 5, Color::RED);
        buf.set_pixel(0, 0, Color::WHITE);
        let before = buf.clone();
        assert_eq!(flood_fill(&mut buf, 2, 2, Color::RED), 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_seed_equal_fill_moves_to_north_neighbor() {
        let mut buf = PixelBuffer::filled(5, 5, Color::RED);
        // White column above the seed; east neighbor is green
        buf.vline(2, 0, 1, Color::WHITE);
        buf.set_pixel(3, 2, Color::GREEN);
        let painted = flood_fill(&mut buf, 2, 2, Color::RED);
        assert_eq!(painted, 2);
        assert_eq!(buf.get_pixel(2, 0), Some(Color::RED));
        assert_eq!(buf.get_pixel(3, 2), Some(Color::GREEN));
    }

    #[test]
    fn test_corner_probe_skips_out_of_bounds() {
        let mut buf = PixelBuffer::filled(3, 3, Color::RED);
        buf.set_pixel(1, 1, Color::WHITE);
        // Seed at the top-left corner; N, NE are outside, E is red, SE is white
        assert_eq!(flood_fill(&mut buf, 0, 0, Color::RED), 1);
        assert_eq!(buf.count_color(Color::RED), 9);
    }
}
