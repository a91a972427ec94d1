//! Sparse Boolean matrix kernel.
//!
//! Shape-typed `n`x`m` bit matrices supporting the operations the
//! Boolean-matrix automaton engine and the matrix CFPQ engine are built on:
//! construction, single-cell mutation, Boolean OR, Boolean product,
//! Kronecker product, block-diagonal composition, and nonzero iteration.
//!
//! Storage switches between two representations the way the design notes
//! ask for: a `HashSet` of coordinates (DOK) while cells are being set one
//! at a time during construction, and a row-major compressed form (CSR-ish:
//! one sorted `Vec<u32>` of column indices per row) once a matrix is queried
//! or multiplied. The switch is internal; callers only see `BoolMatrix`.

use ahash::AHashSet;

#[derive(Clone, Debug)]
enum Repr {
    Dok(AHashSet<(u32, u32)>),
    Csr(Vec<Vec<u32>>),
}

/// A sparse `rows`x`cols` Boolean matrix.
#[derive(Clone, Debug)]
pub struct BoolMatrix {
    rows: usize,
    cols: usize,
    repr: Repr,
}

impl BoolMatrix {
    /// The zero matrix of the given shape.
    pub fn zero(rows: usize, cols: usize) -> Self {
        BoolMatrix {
            rows,
            cols,
            repr: Repr::Dok(AHashSet::default()),
        }
    }

    /// The `n`x`n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = BoolMatrix::zero(n, n);
        for i in 0..n {
            m.set(i, i);
        }
        m
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Sets a single cell to `true`. Thaws the matrix back into DOK form if
    /// it had been frozen into CSR by a prior read/multiply.
    pub fn set(&mut self, row: usize, col: usize) {
        debug_assert!(row < self.rows && col < self.cols);
        self.ensure_dok();
        if let Repr::Dok(set) = &mut self.repr {
            set.insert((row as u32, col as u32));
        }
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.rows && col < self.cols);
        match &self.repr {
            Repr::Dok(set) => set.contains(&(row as u32, col as u32)),
            Repr::Csr(rows) => rows[row].binary_search(&(col as u32)).is_ok(),
        }
    }

    pub fn count_nonzero(&self) -> usize {
        match &self.repr {
            Repr::Dok(set) => set.len(),
            Repr::Csr(rows) => rows.iter().map(|r| r.len()).sum(),
        }
    }

    /// Iterates nonzero `(row, col)` pairs. Row order is unspecified within
    /// a row only with respect to other rows; within a row, ascending.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows_view().enumerate().flat_map(|(r, cols)| {
            cols.iter().map(move |&c| (r, c as usize))
        })
    }

    fn rows_view(&self) -> RowsView<'_> {
        match &self.repr {
            Repr::Csr(rows) => RowsView::Borrowed(rows),
            Repr::Dok(set) => {
                let mut rows = vec![Vec::new(); self.rows];
                for &(r, c) in set {
                    rows[r as usize].push(c);
                }
                for row in &mut rows {
                    row.sort_unstable();
                }
                RowsView::Owned(rows)
            }
        }
    }

    fn ensure_dok(&mut self) {
        if let Repr::Csr(rows) = &self.repr {
            let mut set = AHashSet::default();
            for (r, cols) in rows.iter().enumerate() {
                for &c in cols {
                    set.insert((r as u32, c));
                }
            }
            self.repr = Repr::Dok(set);
        }
    }

    fn freeze(&mut self) {
        if let Repr::Dok(set) = &self.repr {
            let mut rows = vec![Vec::new(); self.rows];
            for &(r, c) in set {
                rows[r as usize].push(c);
            }
            for row in &mut rows {
                row.sort_unstable();
            }
            self.repr = Repr::Csr(rows);
        }
    }

    /// Boolean OR (the `+` of the Boolean semiring). Shapes must match.
    pub fn or(&self, other: &BoolMatrix) -> BoolMatrix {
        assert_eq!(self.shape(), other.shape(), "shape mismatch in or()");
        let mut result = self.clone();
        result.ensure_dok();
        if let Repr::Dok(set) = &mut result.repr {
            for pair in other.iter_nonzero() {
                set.insert((pair.0 as u32, pair.1 as u32));
            }
        }
        result
    }

    /// In-place Boolean OR; returns whether any new bit was set.
    pub fn or_assign(&mut self, other: &BoolMatrix) -> bool {
        assert_eq!(self.shape(), other.shape(), "shape mismatch in or_assign()");
        self.ensure_dok();
        let mut changed = false;
        let nonzero: Vec<_> = other.iter_nonzero().collect();
        if let Repr::Dok(set) = &mut self.repr {
            for (r, c) in nonzero {
                changed |= set.insert((r as u32, c as u32));
            }
        }
        changed
    }

    /// Boolean matrix product: `(A*B)[i,j] = OR_k A[i,k] AND B[k,j]`.
    ///
    /// Both operands are frozen into their row-major (CSR-ish) form first,
    /// since the product is read-heavy: every nonzero of `A` fans out into
    /// a row lookup in `B`.
    pub fn mul(&self, other: &BoolMatrix) -> BoolMatrix {
        assert_eq!(
            self.cols, other.rows,
            "inner dimensions must match for matrix product"
        );
        let mut a = self.clone();
        let mut b = other.clone();
        a.freeze();
        b.freeze();
        let mut result = BoolMatrix::zero(self.rows, other.cols);
        let a_rows = a.rows_view();
        let b_rows = b.rows_view();
        let mut acc: Vec<AHashSet<u32>> = vec![AHashSet::default(); self.rows];
        for (i, row) in a_rows.as_slice().iter().enumerate() {
            for &k in row {
                for &j in &b_rows.as_slice()[k as usize] {
                    acc[i].insert(j);
                }
            }
        }
        let mut set = AHashSet::default();
        for (i, cols) in acc.into_iter().enumerate() {
            for j in cols {
                set.insert((i as u32, j));
            }
        }
        result.repr = Repr::Dok(set);
        result
    }

    /// Kronecker product: shape `(rows_a*rows_b) x (cols_a*cols_b)`,
    /// `[(i*rows_b+p),(j*cols_b+q)] = A[i,j] AND B[p,q]`.
    pub fn kron(&self, other: &BoolMatrix) -> BoolMatrix {
        let (ra, ca) = self.shape();
        let (rb, cb) = other.shape();
        let mut result = BoolMatrix::zero(ra * rb, ca * cb);
        let a_nz: Vec<_> = self.iter_nonzero().collect();
        let b_nz: Vec<_> = other.iter_nonzero().collect();
        result.ensure_dok();
        if let Repr::Dok(set) = &mut result.repr {
            for &(i, j) in &a_nz {
                for &(p, q) in &b_nz {
                    set.insert(((i * rb + p) as u32, (j * cb + q) as u32));
                }
            }
        }
        result
    }

    /// Block-diagonal composition of a list of matrices.
    pub fn block_diag(blocks: &[BoolMatrix]) -> BoolMatrix {
        let rows: usize = blocks.iter().map(|m| m.rows).sum();
        let cols: usize = blocks.iter().map(|m| m.cols).sum();
        let mut result = BoolMatrix::zero(rows, cols);
        result.ensure_dok();
        let mut row_off = 0;
        let mut col_off = 0;
        if let Repr::Dok(set) = &mut result.repr {
            for block in blocks {
                for (r, c) in block.iter_nonzero() {
                    set.insert(((r + row_off) as u32, (c + col_off) as u32));
                }
                row_off += block.rows;
                col_off += block.cols;
            }
        }
        result
    }

    /// A 1xn row vector with the given columns set.
    pub fn row_vector(n: usize, set_cols: impl IntoIterator<Item = usize>) -> BoolMatrix {
        let mut m = BoolMatrix::zero(1, n);
        for c in set_cols {
            m.set(0, c);
        }
        m
    }

    /// Columns set in row 0 of a 1xn row vector.
    pub fn row_nonzero_cols(&self) -> Vec<usize> {
        assert_eq!(self.rows, 1, "row_nonzero_cols expects a row vector");
        self.iter_nonzero().map(|(_, c)| c).collect()
    }
}

enum RowsView<'a> {
    Borrowed(&'a [Vec<u32>]),
    Owned(Vec<Vec<u32>>),
}

impl<'a> RowsView<'a> {
    fn as_slice(&self) -> &[Vec<u32>] {
        match self {
            RowsView::Borrowed(r) => r,
            RowsView::Owned(r) => r,
        }
    }
}

impl<'a> std::ops::Deref for RowsView<'a> {
    type Target = [Vec<u32>];

    fn deref(&self) -> &[Vec<u32>] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let mut m = BoolMatrix::zero(3, 3);
        m.set(0, 1);
        m.set(2, 2);
        assert!(m.get(0, 1));
        assert!(m.get(2, 2));
        assert!(!m.get(1, 1));
        assert_eq!(m.count_nonzero(), 2);
    }

    #[test]
    fn or_is_union() {
        let mut a = BoolMatrix::zero(2, 2);
        a.set(0, 0);
        let mut b = BoolMatrix::zero(2, 2);
        b.set(1, 1);
        let c = a.or(&b);
        assert!(c.get(0, 0) && c.get(1, 1));
        assert_eq!(c.count_nonzero(), 2);
    }

    #[test]
    fn mul_matches_definition() {
        // A: 0->1, B: 1->2 => A*B: 0->2
        let mut a = BoolMatrix::zero(3, 3);
        a.set(0, 1);
        let mut b = BoolMatrix::zero(3, 3);
        b.set(1, 2);
        let c = a.mul(&b);
        assert!(c.get(0, 2));
        assert_eq!(c.count_nonzero(), 1);
    }

    #[test]
    fn kron_shape_and_bits() {
        let mut a = BoolMatrix::zero(2, 2);
        a.set(0, 1);
        let mut b = BoolMatrix::zero(3, 3);
        b.set(1, 2);
        let c = a.kron(&b);
        assert_eq!(c.shape(), (6, 6));
        // (0*3+1, 1*3+2) = (1, 5)
        assert!(c.get(1, 5));
        assert_eq!(c.count_nonzero(), 1);
    }

    #[test]
    fn block_diag_places_blocks_on_diagonal() {
        let mut a = BoolMatrix::zero(2, 2);
        a.set(0, 1);
        let mut b = BoolMatrix::zero(1, 1);
        b.set(0, 0);
        let c = BoolMatrix::block_diag(&[a, b]);
        assert_eq!(c.shape(), (3, 3));
        assert!(c.get(0, 1));
        assert!(c.get(2, 2));
        assert_eq!(c.count_nonzero(), 2);
    }

    #[test]
    fn identity_is_diagonal() {
        let id = BoolMatrix::identity(4);
        assert_eq!(id.count_nonzero(), 4);
        for i in 0..4 {
            assert!(id.get(i, i));
        }
    }
}
