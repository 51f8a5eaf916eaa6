//! Iteration over every index tuple of a list of domain sizes.

/// Visits every index tuple of a Cartesian product with dimension 0 varying
/// fastest, i.e. in undirected joint index order.
///
/// An empty size list yields a single empty tuple. Use
/// [`advance`](IndicesIterator::advance) to walk the tuples without allocating.
///
/// # Example
///
/// ```
/// use discrete_domain::IndicesIterator;
///
/// let tuples: Vec<Vec<usize>> = IndicesIterator::new(&[2, 2]).collect();
/// assert_eq!(tuples, vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]);
/// ```
#[derive(Debug, Clone)]
pub struct IndicesIterator {
    sizes: Box<[usize]>,
    current: Vec<usize>,
    started: bool,
    done: bool,
}

impl IndicesIterator {
    pub fn new(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.into(),
            current: vec![0; sizes.len()],
            started: false,
            done: sizes.contains(&0),
        }
    }

    /// Move to the next tuple and borrow it.
    pub fn advance(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.current);
        }
        for (index, &size) in self.current.iter_mut().zip(self.sizes.iter()) {
            *index += 1;
            if *index < size {
                return Some(&self.current);
            }
            *index = 0;
        }
        self.done = true;
        None
    }

    /// Restart from the all-zero tuple.
    pub fn reset(&mut self) {
        self.current.iter_mut().for_each(|i| *i = 0);
        self.started = false;
        self.done = self.sizes.contains(&0);
    }
}

impl Iterator for IndicesIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        self.advance().map(<[usize]>::to_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order() {
        let tuples: Vec<Vec<usize>> = IndicesIterator::new(&[3, 2]).collect();
        assert_eq!(
            tuples,
            vec![
                vec![0, 0],
                vec![1, 0],
                vec![2, 0],
                vec![0, 1],
                vec![1, 1],
                vec![2, 1]
            ]
        );
    }

    #[test]
    fn test_empty_sizes() {
        let tuples: Vec<Vec<usize>> = IndicesIterator::new(&[]).collect();
        assert_eq!(tuples, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_advance_and_reset() {
        let mut iter = IndicesIterator::new(&[2]);
        assert_eq!(iter.advance(), Some(&[0][..]));
        assert_eq!(iter.advance(), Some(&[1][..]));
        assert_eq!(iter.advance(), None);
        assert_eq!(iter.advance(), None);

        iter.reset();
        assert_eq!(iter.count(), 2);
    }
}
