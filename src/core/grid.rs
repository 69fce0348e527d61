//! Grid builders shared by the spatial puzzles: a numbered random walk, a
//! depth-first maze carve and a solvable sliding-tile scramble.
//!
//! All three draw exclusively from the caller's [`SeededRandom`], and each
//! runs in time proportional to the grid area.

use crate::core::rng::SeededRandom;
use crate::schema::puzzle::MazeCell;

/// Result of [`random_walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    /// `grid[y][x]`: 0 if never visited, else the 1-based order of first visit.
    pub grid: Vec<Vec<u32>>,
    /// First visits as `(x, y)`, starting at `(0, 0)`.
    pub path: Vec<(usize, usize)>,
}

/// Walk `size * 2 ..= size * 3` random steps over a `size`×`size` grid from
/// the top-left corner, numbering each cell the first time it is entered.
///
/// Steps onto already-visited cells are taken but not recorded, so the
/// numbered path is usually shorter than the step count.
pub fn random_walk(rng: &mut SeededRandom, size: usize) -> Walk {
    let mut grid = vec![vec![0u32; size]; size];
    let (mut x, mut y) = (0usize, 0usize);
    let mut path = vec![(x, y)];
    grid[y][x] = 1;

    let steps = rng.next_usize(size * 2, size * 3);

    for _ in 0..steps {
        let mut directions: Vec<(isize, isize)> = Vec::with_capacity(4);
        if x > 0 {
            directions.push((-1, 0));
        }
        if x + 1 < size {
            directions.push((1, 0));
        }
        if y > 0 {
            directions.push((0, -1));
        }
        if y + 1 < size {
            directions.push((0, 1));
        }
        if directions.is_empty() {
            break;
        }

        let (dx, dy) = *rng.pick(&directions);
        x = x.wrapping_add_signed(dx);
        y = y.wrapping_add_signed(dy);

        if grid[y][x] == 0 {
            grid[y][x] = path.len() as u32 + 1;
            path.push((x, y));
        }
    }

    Walk { grid, path }
}

const CARVE_DIRECTIONS: [(isize, isize); 4] = [(0, 2), (2, 0), (0, -2), (-2, 0)];

/// Carve a maze with a randomized depth-first backtracker.
///
/// Carving starts at `(1, 1)` and only ever opens cells strictly inside the
/// border, so row/column 0 and `size - 1` stay walls. `(1, 1)` is marked
/// `Start` and `(size - 2, size - 2)` is marked `End`. Sizes below 3 have no
/// interior and come back as solid wall.
pub fn carve_maze(rng: &mut SeededRandom, size: usize) -> Vec<Vec<MazeCell>> {
    let mut maze = vec![vec![MazeCell::Wall; size]; size];
    if size < 3 {
        return maze;
    }

    maze[1][1] = MazeCell::Path;

    // Explicit stack of (x, y, shuffled directions, next direction index).
    // Directions are shuffled when a cell is entered, matching the order
    // a recursive carve would consume the generator.
    let mut stack = vec![(1usize, 1usize, rng.shuffled(&CARVE_DIRECTIONS), 0usize)];

    while let Some(frame) = stack.last_mut() {
        let (x, y) = (frame.0, frame.1);
        if frame.3 >= frame.2.len() {
            stack.pop();
            continue;
        }
        let (dx, dy) = frame.2[frame.3];
        frame.3 += 1;

        let nx = x as isize + dx;
        let ny = y as isize + dy;
        let inside = |v: isize| v > 0 && v < size as isize - 1;
        if !inside(nx) || !inside(ny) {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        if maze[ny][nx] != MazeCell::Wall {
            continue;
        }

        maze[ny][nx] = MazeCell::Path;
        maze[(y + ny) / 2][(x + nx) / 2] = MazeCell::Path;
        stack.push((nx, ny, rng.shuffled(&CARVE_DIRECTIONS), 0));
    }

    maze[1][1] = MazeCell::Start;
    maze[size - 2][size - 2] = MazeCell::End;
    maze
}

/// Build the solved `size`×`size` arrangement (1..n², empty slot `0` last)
/// and scramble it with `moves` random slides of a tile into the empty slot.
/// Only legal slides are applied, so the result is always solvable.
pub fn scramble_tiles(rng: &mut SeededRandom, size: usize, moves: u32) -> Vec<u32> {
    let cells = size * size;
    if cells == 0 {
        return Vec::new();
    }
    let mut tiles: Vec<u32> = (1..cells as u32).collect();
    tiles.push(0);

    let mut empty_row = (cells - 1) / size;
    let mut empty_col = (cells - 1) % size;

    for _ in 0..moves {
        let mut valid: Vec<(isize, isize)> = Vec::with_capacity(4);
        if empty_row > 0 {
            valid.push((-1, 0));
        }
        if empty_row + 1 < size {
            valid.push((1, 0));
        }
        if empty_col > 0 {
            valid.push((0, -1));
        }
        if empty_col + 1 < size {
            valid.push((0, 1));
        }
        if valid.is_empty() {
            break;
        }

        let (dr, dc) = *rng.pick(&valid);
        let new_row = empty_row.wrapping_add_signed(dr);
        let new_col = empty_col.wrapping_add_signed(dc);
        tiles.swap(new_row * size + new_col, empty_row * size + empty_col);
        empty_row = new_row;
        empty_col = new_col;
    }

    tiles
}

/// Cells reachable from `(1, 1)` through open maze cells, 4-connected.
pub fn reachable_cells(maze: &[Vec<MazeCell>]) -> usize {
    let size = maze.len();
    if size < 3 || !maze[1][1].is_open() {
        return 0;
    }
    let mut seen = vec![vec![false; size]; size];
    let mut queue = vec![(1usize, 1usize)];
    seen[1][1] = true;
    let mut count = 0;
    while let Some((x, y)) = queue.pop() {
        count += 1;
        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbours {
            if ny < size && nx < maze[ny].len() && !seen[ny][nx] && maze[ny][nx].is_open() {
                seen[ny][nx] = true;
                queue.push((nx, ny));
            }
        }
    }
    count
}
