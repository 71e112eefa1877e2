//! Bounding-box spatial index
//!
//! Candidate retrieval for geometry-intersection queries: `query`
//! returns a superset of the items whose bounding box overlaps the
//! search box, and the caller re-checks every candidate against the
//! true geometry. The index is built once per batch and read-only
//! afterwards, so it can be shared across concurrent queries.

use geo::{BoundingRect, Coord, Intersects, Point, Polygon, Rect};

use epigis_core::{Error, Result};

/// Bounding-volume tree over item bounding boxes.
///
/// Built in O(n log n) by recursively splitting items at the median of
/// their box centers along the wider axis. Queries descend only into
/// subtrees whose combined box overlaps the search box: O(log n + k)
/// for k candidates.
#[derive(Debug)]
pub struct SpatialIndex {
    nodes: Vec<IndexNode>,
    len: usize,
}

#[derive(Debug)]
struct IndexNode {
    bounds: Rect<f64>,
    /// Index into the caller's item set (leaves only)
    item: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

impl SpatialIndex {
    /// Build an index over one bounding box per item.
    ///
    /// An empty set or a non-finite box cannot be indexed and fails
    /// with `IndexBuild`.
    pub fn build(boxes: &[Rect<f64>]) -> Result<Self> {
        if boxes.is_empty() {
            return Err(Error::IndexBuild("empty geometry set".to_string()));
        }
        for (i, b) in boxes.iter().enumerate() {
            if !is_finite_rect(b) {
                return Err(Error::IndexBuild(format!(
                    "non-finite bounding box for item {i}"
                )));
            }
        }

        let mut entries: Vec<(usize, Rect<f64>)> = boxes.iter().copied().enumerate().collect();
        let mut nodes = Vec::with_capacity(2 * boxes.len());
        build_recursive(&mut entries, &mut nodes);

        Ok(Self {
            nodes,
            len: boxes.len(),
        })
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indices of all items whose bounding box overlaps `search`.
    ///
    /// A superset in geometric terms: box overlap does not imply the
    /// true geometries intersect.
    pub fn query(&self, search: &Rect<f64>) -> Vec<usize> {
        let mut hits = Vec::new();
        self.query_recursive(0, search, &mut hits);
        hits
    }

    fn query_recursive(&self, node_idx: usize, search: &Rect<f64>, hits: &mut Vec<usize>) {
        let node = &self.nodes[node_idx];
        if !rects_overlap(&node.bounds, search) {
            return;
        }
        if let Some(item) = node.item {
            hits.push(item);
        }
        if let Some(left) = node.left {
            self.query_recursive(left, search, hits);
        }
        if let Some(right) = node.right {
            self.query_recursive(right, search, hits);
        }
    }
}

fn is_finite_rect(r: &Rect<f64>) -> bool {
    r.min().x.is_finite() && r.min().y.is_finite() && r.max().x.is_finite() && r.max().y.is_finite()
}

fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && a.max().x >= b.min().x
        && a.min().y <= b.max().y
        && a.max().y >= b.min().y
}

fn enclose(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Recursively build the tree, returning the new node's index.
fn build_recursive(entries: &mut [(usize, Rect<f64>)], nodes: &mut Vec<IndexNode>) -> usize {
    if entries.len() == 1 {
        let (item, bounds) = entries[0];
        let node_idx = nodes.len();
        nodes.push(IndexNode {
            bounds,
            item: Some(item),
            left: None,
            right: None,
        });
        return node_idx;
    }

    let mut bounds = entries[0].1;
    for (_, r) in entries[1..].iter() {
        bounds = enclose(bounds, *r);
    }

    // Split at the median box center along the wider axis
    let split_x = bounds.width() >= bounds.height();
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| {
        let ca = if split_x { a.1.center().x } else { a.1.center().y };
        let cb = if split_x { b.1.center().x } else { b.1.center().y };
        ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
    });

    let node_idx = nodes.len();
    nodes.push(IndexNode {
        bounds,
        item: None,
        left: None,
        right: None,
    });

    let (lower, upper) = entries.split_at_mut(mid);
    let left = build_recursive(lower, nodes);
    let right = build_recursive(upper, nodes);
    nodes[node_idx].left = Some(left);
    nodes[node_idx].right = Some(right);

    node_idx
}

/// A polygon set paired with its spatial index.
///
/// Bounding-box pruning happens inside; every candidate is re-checked
/// with an exact intersection test against the true polygon. One
/// instance serves a whole batch as shared read-only state.
#[derive(Debug)]
pub struct PolygonIndex {
    polygons: Vec<Polygon<f64>>,
    index: SpatialIndex,
}

impl PolygonIndex {
    /// Index a polygon set. Fails with `IndexBuild` on an empty set or
    /// a degenerate polygon without a bounding box.
    pub fn build(polygons: Vec<Polygon<f64>>) -> Result<Self> {
        let boxes = polygons
            .iter()
            .enumerate()
            .map(|(i, p)| {
                p.bounding_rect().ok_or_else(|| {
                    Error::IndexBuild(format!("polygon {i} has no bounding box"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let index = SpatialIndex::build(&boxes)?;
        Ok(Self { polygons, index })
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    /// Whether `point` lies inside or on the boundary of any polygon.
    pub fn intersects_point(&self, point: &Point<f64>) -> bool {
        let search = Rect::new(point.0, point.0);
        self.index
            .query(&search)
            .into_iter()
            .any(|i| self.polygons[i].intersects(point))
    }

    /// Number of indexed polygons whose geometry intersects `polygon`.
    pub fn count_intersections(&self, polygon: &Polygon<f64>) -> usize {
        match polygon.bounding_rect() {
            Some(search) => self
                .index
                .query(&search)
                .into_iter()
                .filter(|&i| self.polygons[i].intersects(polygon))
                .count(),
            None => 0,
        }
    }
}
