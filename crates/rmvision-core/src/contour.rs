//! Nested contour extraction (Suzuki–Abe border following).
//!
//! Every border of a binary mask becomes one node of a [`ContourTree`]:
//! outer borders of foreground regions and hole borders of background
//! regions enclosed by them. Nodes link to their parent, first child and next
//! sibling by index, so the tree lives in two flat vectors that are reused
//! from frame to frame.
//!
//! Contours are compressed to the points where the chain direction changes.
//! Each new border is linked in front of its siblings, so sibling chains run
//! from the last border discovered in raster order to the first.

use crate::geometry::Point;
use crate::image::ImageView;
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

/// Neighbor directions `(dx, dy)`, counter-clockwise on screen starting east.
const DIRS: [(isize, isize); 8] = [(1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1), (0, 1), (1, 1)];
const EAST: usize = 0;
const WEST: usize = 4;

/// One border in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourNode {
    start: usize,
    len: usize,
    /// True for the border of a background region inside a foreground region.
    pub is_hole: bool,
    /// Enclosing border, `None` for top-level contours.
    pub parent: Option<usize>,
    /// First directly enclosed border.
    pub first_child: Option<usize>,
    /// Next border sharing the same parent.
    pub next_sibling: Option<usize>,
}

/// Flat storage of all contours found in one mask.
#[derive(Debug, Clone, Default)]
pub struct ContourTree {
    points: Vec<Point>,
    nodes: Vec<ContourNode>,
    first_root: Option<usize>,
}

impl ContourTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all contours, keeping the allocations.
    pub fn clear(&mut self) {
        self.points.clear();
        self.nodes.clear();
        self.first_root = None;
    }

    /// Number of contours.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no contour was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Points of contour `idx`.
    #[must_use]
    pub fn contour(&self, idx: usize) -> &[Point] {
        let node = &self.nodes[idx];
        &self.points[node.start..node.start + node.len]
    }

    /// Hierarchy links of contour `idx`.
    #[must_use]
    pub fn node(&self, idx: usize) -> &ContourNode {
        &self.nodes[idx]
    }

    /// Top-level contours, following sibling links.
    #[must_use]
    pub fn roots(&self) -> Siblings<'_> {
        Siblings {
            tree: self,
            next: self.first_root,
        }
    }

    /// Direct children of contour `idx`, following first-child then sibling links.
    #[must_use]
    pub fn children(&self, idx: usize) -> Siblings<'_> {
        Siblings {
            tree: self,
            next: self.nodes[idx].first_child,
        }
    }

    /// All contours in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &[Point]> + '_ {
        (0..self.nodes.len()).map(move |i| self.contour(i))
    }

    /// Parent of a new border given the last border met on its row (`lnbd`).
    ///
    /// `lnbd == 1` is the image frame, which behaves as a hole with no parent.
    fn parent_for(&self, lnbd: i32, is_hole: bool) -> Option<usize> {
        let (lnbd_is_hole, lnbd_node) = if lnbd <= 1 {
            (true, None)
        } else {
            let n = (lnbd - 2) as usize;
            (self.nodes[n].is_hole, Some(n))
        };
        if is_hole == lnbd_is_hole {
            lnbd_node.and_then(|n| self.nodes[n].parent)
        } else {
            lnbd_node
        }
    }

    fn push(&mut self, chain: &[Point], is_hole: bool, parent: Option<usize>) {
        let idx = self.nodes.len();
        let start = self.points.len();
        compress_chain(chain, &mut self.points);
        self.nodes.push(ContourNode {
            start,
            len: self.points.len() - start,
            is_hole,
            parent,
            first_child: None,
            next_sibling: None,
        });

        let head = match parent {
            Some(p) => &mut self.nodes[p].first_child,
            None => &mut self.first_root,
        };
        let next = head.replace(idx);
        self.nodes[idx].next_sibling = next;
    }
}

/// Iterator over a sibling chain.
pub struct Siblings<'a> {
    tree: &'a ContourTree,
    next: Option<usize>,
}

impl Iterator for Siblings<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let cur = self.next?;
        self.next = self.tree.nodes[cur].next_sibling;
        Some(cur)
    }
}

/// Keep only the points where the closed chain changes direction.
fn compress_chain(chain: &[Point], out: &mut Vec<Point>) {
    let n = chain.len();
    if n <= 2 {
        out.extend_from_slice(chain);
        return;
    }
    for k in 0..n {
        let prev = chain[(k + n - 1) % n];
        let cur = chain[k];
        let next = chain[(k + 1) % n];
        if cur - prev != next - cur {
            out.push(cur);
        }
    }
}

/// Extract the full contour hierarchy of a binary mask (any non-zero pixel is foreground).
///
/// The tree is cleared first; an empty mask leaves it empty.
pub fn find_contours(arena: &Bump, mask: &ImageView, tree: &mut ContourTree) {
    tree.clear();
    let (w, h) = (mask.width, mask.height);
    if w == 0 || h == 0 {
        return;
    }

    // One pixel of background padding on every side keeps all neighbor lookups in range.
    let stride = w + 2;
    let labels = arena.alloc_slice_fill_copy(stride * (h + 2), 0i32);
    for y in 0..h {
        let start = (y + 1) * stride + 1;
        for (dst, &src) in labels[start..start + w].iter_mut().zip(mask.get_row(y)) {
            *dst = i32::from(src != 0);
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    let offsets: [isize; 8] = DIRS.map(|(dx, dy)| dy * stride as isize + dx);
    let mut chain: BumpVec<usize> = BumpVec::new_in(arena);
    let mut points: BumpVec<Point> = BumpVec::new_in(arena);
    let mut nbd: i32 = 1;

    for y in 1..=h {
        let mut lnbd: i32 = 1;
        for x in 1..=w {
            let idx = y * stride + x;
            let v = labels[idx];
            if v == 0 {
                continue;
            }

            let border = if v == 1 && labels[idx - 1] == 0 {
                Some((false, WEST))
            } else if v >= 1 && labels[idx + 1] == 0 {
                if v > 1 {
                    lnbd = v;
                }
                Some((true, EAST))
            } else {
                None
            };

            if let Some((is_hole, from)) = border {
                nbd += 1;
                let parent = tree.parent_for(lnbd, is_hole);
                follow_border(labels, &offsets, idx, from, nbd, &mut chain);

                points.clear();
                #[allow(clippy::cast_precision_loss)]
                points.extend(chain.iter().map(|&i| {
                    Point::new((i % stride - 1) as f32, (i / stride - 1) as f32)
                }));
                tree.push(&points, is_hole, parent);
            }

            let v = labels[idx];
            if v != 1 {
                lnbd = v.abs();
            }
        }
    }
}

#[inline]
fn step(idx: usize, offset: isize) -> usize {
    idx.wrapping_add_signed(offset)
}

/// Trace one border starting at `start`, whose 0-neighbor lies in direction `from`.
///
/// Marks border pixels with `nbd` (or `-nbd` where the east neighbor is
/// background) and records the visited pixel indices in `chain`.
fn follow_border(
    labels: &mut [i32],
    offsets: &[isize; 8],
    start: usize,
    from: usize,
    nbd: i32,
    chain: &mut BumpVec<usize>,
) {
    chain.clear();

    // Clockwise search for the first non-zero neighbor.
    let mut first = None;
    for k in 0..8 {
        let d = (from + 8 - k) % 8;
        if labels[step(start, offsets[d])] != 0 {
            first = Some(d);
            break;
        }
    }
    let Some(first_dir) = first else {
        // Isolated pixel.
        labels[start] = -nbd;
        chain.push(start);
        return;
    };

    let first_pixel = step(start, offsets[first_dir]);
    let mut current = start;
    // Direction from `current` to the previously examined border pixel.
    let mut back = first_dir;

    loop {
        chain.push(current);

        // Counter-clockwise search starting just after `back`.
        let mut east_is_background = false;
        let mut next_dir = back;
        for k in 1..=8 {
            let d = (back + k) % 8;
            if labels[step(current, offsets[d])] != 0 {
                next_dir = d;
                break;
            }
            if d == EAST {
                east_is_background = true;
            }
        }

        if east_is_background {
            labels[current] = -nbd;
        } else if labels[current] == 1 {
            labels[current] = nbd;
        }

        let next = step(current, offsets[next_dir]);
        if next == start && current == first_pixel {
            break;
        }
        current = next;
        back = (next_dir + 4) % 8;
    }
}
