//! Lazy k-of-n index combinations.
//!
//! The matcher needs every size-k subset of the current touches.  Rather
//! than recursively materialising all of them up front, [`Combinations`]
//! walks them in lexicographic order one at a time, so a caller can stop as
//! soon as the touches are used up.

/// Iterator over all `k`-element index subsets of `0..n`, lexicographic.
///
/// ```
/// use constellation::Combinations;
/// let all: Vec<Vec<usize>> = Combinations::new(4, 2).collect();
/// assert_eq!(all.len(), 6);
/// assert_eq!(all[0], vec![0, 1]);
/// assert_eq!(all[5], vec![2, 3]);
/// ```
#[derive(Clone, Debug)]
pub struct Combinations {
    n:       usize,
    indices: Vec<usize>,
    done:    bool,
}

impl Combinations {
    /// `k == 0` or `k > n` produce an empty sequence.
    pub fn new(n: usize, k: usize) -> Self {
        Combinations {
            n,
            indices: (0..k).collect(),
            done:    k == 0 || k > n,
        }
    }

    /// Start over from the first combination.
    pub fn restart(&mut self) {
        let k = self.indices.len();
        for (i, slot) in self.indices.iter_mut().enumerate() {
            *slot = i;
        }
        self.done = k == 0 || k > self.n;
    }

    /// Advance `indices` to the next combination in place.
    /// Returns `false` once the last one has been passed.
    fn advance(&mut self) -> bool {
        let k = self.indices.len();
        // Rightmost slot that can still move right.
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) else {
            return false;
        };
        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        true
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();
        self.done = !self.advance();
        Some(current)
    }
}
