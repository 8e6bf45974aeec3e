//! Ordered traversal of simulation points.

use std::collections::{BTreeSet, btree_set};

/// Walks an ordered set of simulation points.
///
/// Points need not be contiguous nor start at zero; they are always visited
/// in ascending order.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use ts_mapper::mapping::PointClock;
///
/// let points = BTreeSet::from([7, 3, 12]);
/// let mut clock = PointClock::new(&points);
/// let mut seen = Vec::new();
///
/// clock
///     .try_run(|point| {
///         seen.push(point);
///         Ok::<(), ()>(())
///     })
///     .unwrap();
/// assert_eq!(seen, vec![3, 7, 12]);
/// ```
pub struct PointClock<'a> {
    /// Points not yet visited
    pending: btree_set::Iter<'a, usize>,
    /// Points visited so far
    elapsed: usize,
}

impl<'a> PointClock<'a> {
    pub fn new(points: &'a BTreeSet<usize>) -> Self {
        Self {
            pending: points.iter(),
            elapsed: 0,
        }
    }

    /// Advances to the next point.
    ///
    /// # Returns
    ///
    /// * `Some(point)` - The next point in ascending order
    /// * `None` - If every point has been visited
    pub fn tick(&mut self) -> Option<usize> {
        let point = self.pending.next().copied()?;
        self.elapsed += 1;
        Some(point)
    }

    /// Number of points handed out so far.
    pub fn elapsed(&self) -> usize {
        self.elapsed
    }

    /// Number of points still to visit.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Runs `f` on each remaining point, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`; later points are not visited.
    pub fn try_run<E>(&mut self, mut f: impl FnMut(usize) -> Result<(), E>) -> Result<(), E> {
        while let Some(point) = self.tick() {
            f(point)?;
        }
        Ok(())
    }
}
