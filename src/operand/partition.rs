//! Zero-copy partitioning of matrix views
//!
//! The partition kit is how blocked variant bodies walk an operand: split
//! a view into 2, 3, 4, or 9 non-overlapping sub-views, compute with the
//! middle blocks, then merge back and advance. Requested block widths are
//! clamped to the remaining extent, so the trailing block is never
//! overrun. Partition and merge are exact inverses: merging the parts of
//! a partition restores a view with the same base pointer and extents as
//! the original. Everything here is index arithmetic; no element moves.

use super::matrix::Matrix;
use crate::dtype::Element;

/// Which edge of a view a partition measures from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cut {
    /// The first `b` rows
    Top,
    /// The last `b` rows
    Bottom,
    /// The first `b` columns
    Left,
    /// The last `b` columns
    Right,
}

/// Which corner of a view a 2x2 partition measures from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Quadrant {
    /// The `br x bc` corner at the top-left
    TopLeft,
    /// The `br x bc` corner at the top-right
    TopRight,
    /// The `br x bc` corner at the bottom-left
    BottomLeft,
    /// The `br x bc` corner at the bottom-right
    BottomRight,
}

/// Split a view into top and bottom parts
///
/// `cut` names the part that receives `b` rows (clamped to the extent).
pub fn part_2x1<T: Element>(a: &Matrix<T>, b: usize, cut: Cut) -> (Matrix<T>, Matrix<T>) {
    let m = a.rows();
    let b = b.min(m);
    let split = match cut {
        Cut::Top => b,
        Cut::Bottom => m - b,
        _ => panic!("part_2x1 cuts rows; use Cut::Top or Cut::Bottom"),
    };
    (
        a.view(0, 0, split, a.cols()),
        a.view(split, 0, m - split, a.cols()),
    )
}

/// Split a view into left and right parts
///
/// `cut` names the part that receives `b` columns (clamped to the extent).
pub fn part_1x2<T: Element>(a: &Matrix<T>, b: usize, cut: Cut) -> (Matrix<T>, Matrix<T>) {
    let n = a.cols();
    let b = b.min(n);
    let split = match cut {
        Cut::Left => b,
        Cut::Right => n - b,
        _ => panic!("part_1x2 cuts columns; use Cut::Left or Cut::Right"),
    };
    (
        a.view(0, 0, a.rows(), split),
        a.view(0, split, a.rows(), n - split),
    )
}

/// Split a view into four quadrants
///
/// The named quadrant receives `br x bc` elements (each clamped).
/// Returned in row-major order: (tl, tr, bl, br).
pub fn part_2x2<T: Element>(
    a: &Matrix<T>,
    br: usize,
    bc: usize,
    quadrant: Quadrant,
) -> (Matrix<T>, Matrix<T>, Matrix<T>, Matrix<T>) {
    let (m, n) = (a.rows(), a.cols());
    let br = br.min(m);
    let bc = bc.min(n);
    let (rsplit, csplit) = match quadrant {
        Quadrant::TopLeft => (br, bc),
        Quadrant::TopRight => (br, n - bc),
        Quadrant::BottomLeft => (m - br, bc),
        Quadrant::BottomRight => (m - br, n - bc),
    };
    (
        a.view(0, 0, rsplit, csplit),
        a.view(0, csplit, rsplit, n - csplit),
        a.view(rsplit, 0, m - rsplit, csplit),
        a.view(rsplit, csplit, m - rsplit, n - csplit),
    )
}

/// Merge a top/bottom pair back into one view
///
/// # Panics
///
/// Panics if the parts are not vertically adjacent views of one buffer.
pub fn merge_2x1<T: Element>(top: &Matrix<T>, bottom: &Matrix<T>) -> Matrix<T> {
    assert!(
        top.abuts_below(bottom),
        "merge_2x1: parts are not adjacent partitions of one view"
    );
    top.with_extent(top.rows() + bottom.rows(), top.cols())
}

/// Merge a left/right pair back into one view
///
/// # Panics
///
/// Panics if the parts are not horizontally adjacent views of one buffer.
pub fn merge_1x2<T: Element>(left: &Matrix<T>, right: &Matrix<T>) -> Matrix<T> {
    assert!(
        left.abuts_right(right),
        "merge_1x2: parts are not adjacent partitions of one view"
    );
    left.with_extent(left.rows(), left.cols() + right.cols())
}

/// Merge four quadrants back into one view
pub fn merge_2x2<T: Element>(
    tl: &Matrix<T>,
    tr: &Matrix<T>,
    bl: &Matrix<T>,
    br: &Matrix<T>,
) -> Matrix<T> {
    let top = merge_1x2(tl, tr);
    let bottom = merge_1x2(bl, br);
    merge_2x1(&top, &bottom)
}

/// Carve the next `b`-row block off a moving 2x1 partition
///
/// With `Cut::Bottom` the boundary moves downward: the block comes off
/// the top of `bottom`. With `Cut::Top` it moves upward: the block comes
/// off the bottom of `top`. Returns (first, middle, last).
pub fn repart_2x1_to_3x1<T: Element>(
    top: &Matrix<T>,
    bottom: &Matrix<T>,
    b: usize,
    cut: Cut,
) -> (Matrix<T>, Matrix<T>, Matrix<T>) {
    match cut {
        Cut::Bottom => {
            let (mid, last) = part_2x1(bottom, b, Cut::Top);
            (top.clone(), mid, last)
        }
        Cut::Top => {
            let (first, mid) = part_2x1(top, b, Cut::Bottom);
            (first, mid, bottom.clone())
        }
        _ => panic!("repart_2x1_to_3x1 cuts rows; use Cut::Top or Cut::Bottom"),
    }
}

/// Fold a processed middle block back into a 2x1 partition
///
/// `cut` names the side the middle block joins: `Cut::Top` grows the top
/// part (the usual forward walk), `Cut::Bottom` grows the bottom part.
pub fn cont_with_3x1_to_2x1<T: Element>(
    first: &Matrix<T>,
    mid: &Matrix<T>,
    last: &Matrix<T>,
    cut: Cut,
) -> (Matrix<T>, Matrix<T>) {
    match cut {
        Cut::Top => (merge_2x1(first, mid), last.clone()),
        Cut::Bottom => (first.clone(), merge_2x1(mid, last)),
        _ => panic!("cont_with_3x1_to_2x1 joins rows; use Cut::Top or Cut::Bottom"),
    }
}

/// Carve the next `b`-column block off a moving 1x2 partition
pub fn repart_1x2_to_1x3<T: Element>(
    left: &Matrix<T>,
    right: &Matrix<T>,
    b: usize,
    cut: Cut,
) -> (Matrix<T>, Matrix<T>, Matrix<T>) {
    match cut {
        Cut::Right => {
            let (mid, last) = part_1x2(right, b, Cut::Left);
            (left.clone(), mid, last)
        }
        Cut::Left => {
            let (first, mid) = part_1x2(left, b, Cut::Right);
            (first, mid, right.clone())
        }
        _ => panic!("repart_1x2_to_1x3 cuts columns; use Cut::Left or Cut::Right"),
    }
}

/// Fold a processed middle block back into a 1x2 partition
pub fn cont_with_1x3_to_1x2<T: Element>(
    first: &Matrix<T>,
    mid: &Matrix<T>,
    last: &Matrix<T>,
    cut: Cut,
) -> (Matrix<T>, Matrix<T>) {
    match cut {
        Cut::Left => (merge_1x2(first, mid), last.clone()),
        Cut::Right => (first.clone(), merge_1x2(mid, last)),
        _ => panic!("cont_with_1x3_to_1x2 joins columns; use Cut::Left or Cut::Right"),
    }
}

/// Carve the next `b x b` diagonal block off a moving 2x2 partition
///
/// Only the forward walk (`Quadrant::BottomRight`: the block comes off
/// the top-left corner of the bottom-right quadrant) is defined; it is
/// the shape every factorization body uses. Returns the nine blocks in
/// row-major order.
pub fn repart_2x2_to_3x3<T: Element>(
    tl: &Matrix<T>,
    tr: &Matrix<T>,
    bl: &Matrix<T>,
    br: &Matrix<T>,
    b: usize,
) -> [[Matrix<T>; 3]; 3] {
    let a = merge_2x2(tl, tr, bl, br);
    let m0 = tl.rows();
    let n0 = tl.cols();
    let b1 = b.min(a.rows() - m0);
    let b2 = b.min(a.cols() - n0);
    let rsplit = [0, m0, m0 + b1, a.rows()];
    let csplit = [0, n0, n0 + b2, a.cols()];
    std::array::from_fn(|i| {
        std::array::from_fn(|j| {
            a.view(
                rsplit[i],
                csplit[j],
                rsplit[i + 1] - rsplit[i],
                csplit[j + 1] - csplit[j],
            )
        })
    })
}

/// Fold a processed 3x3 repartition back into a 2x2 partition
///
/// The forward walk folds the middle row/column into the top-left
/// quadrant. Returns (tl, tr, bl, br).
pub fn cont_with_3x3_to_2x2<T: Element>(
    blocks: &[[Matrix<T>; 3]; 3],
) -> (Matrix<T>, Matrix<T>, Matrix<T>, Matrix<T>) {
    let a = merge_2x2(
        &merge_2x2(&blocks[0][0], &blocks[0][1], &blocks[1][0], &blocks[1][1]),
        &merge_2x1(&blocks[0][2], &blocks[1][2]),
        &merge_1x2(&blocks[2][0], &blocks[2][1]),
        &blocks[2][2],
    );
    let rsplit = blocks[0][0].rows() + blocks[1][0].rows();
    let csplit = blocks[0][0].cols() + blocks[0][1].cols();
    part_2x2(&a, rsplit, csplit, Quadrant::TopLeft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<f64> {
        Matrix::from_fn(6, 5, |i, j| (i * 10 + j) as f64)
    }

    #[test]
    fn test_part_merge_2x1_roundtrip() {
        let a = sample();
        let (t, b) = part_2x1(&a, 2, Cut::Top);
        assert_eq!(t.rows(), 2);
        assert_eq!(b.rows(), 4);
        assert!(merge_2x1(&t, &b).same_view(&a));
    }

    #[test]
    fn test_part_clamps_to_extent() {
        let a = sample();
        let (t, b) = part_2x1(&a, 100, Cut::Top);
        assert_eq!(t.rows(), 6);
        assert_eq!(b.rows(), 0);
        let (l, r) = part_1x2(&a, 100, Cut::Right);
        assert_eq!(l.cols(), 0);
        assert_eq!(r.cols(), 5);
    }

    #[test]
    fn test_part_merge_2x2_roundtrip() {
        let a = sample();
        let (tl, tr, bl, br) = part_2x2(&a, 2, 3, Quadrant::TopLeft);
        assert_eq!(tl.rows(), 2);
        assert_eq!(tl.cols(), 3);
        assert_eq!(br.rows(), 4);
        assert_eq!(br.cols(), 2);
        assert!(merge_2x2(&tl, &tr, &bl, &br).same_view(&a));
    }

    #[test]
    fn test_partition_is_aliasing() {
        let a = sample();
        let (t, _b) = part_2x1(&a, 2, Cut::Top);
        t.set(0, 0, -1.0);
        assert_eq!(a.get(0, 0), -1.0);
    }

    #[test]
    fn test_repart_cont_walk() {
        let a = sample();
        let (mut top, mut bottom) = part_2x1(&a, 0, Cut::Top);
        let mut seen = 0;
        while top.rows() < a.rows() {
            let (a0, a1, a2) = repart_2x1_to_3x1(&top, &bottom, 4, Cut::Bottom);
            seen += a1.rows();
            let (t, b) = cont_with_3x1_to_2x1(&a0, &a1, &a2, Cut::Top);
            top = t;
            bottom = b;
        }
        // 4-row blocks over 6 rows: 4 then the 2-row remainder.
        assert_eq!(seen, 6);
        assert!(merge_2x1(&top, &bottom).same_view(&a));
    }

    #[test]
    fn test_repart_3x3_walk() {
        let a = Matrix::from_fn(7, 7, |i, j| (i * 10 + j) as f64);
        let (mut tl, mut tr, mut bl, mut br) = part_2x2(&a, 0, 0, Quadrant::TopLeft);
        let mut diag = 0;
        while tl.rows() < a.rows() {
            let blocks = repart_2x2_to_3x3(&tl, &tr, &bl, &br, 3);
            assert_eq!(blocks[1][1].rows(), blocks[1][1].cols());
            diag += blocks[1][1].rows();
            let (ntl, ntr, nbl, nbr) = cont_with_3x3_to_2x2(&blocks);
            tl = ntl;
            tr = ntr;
            bl = nbl;
            br = nbr;
        }
        assert_eq!(diag, 7);
        assert!(merge_2x2(&tl, &tr, &bl, &br).same_view(&a));
    }
}
