/// A primitive that is a non-owning view over one row of a caller owned flat buffer.
///
/// A buffer holds many serialized primitives of the same kind back to back, `size()` values each.
/// One view per worker is rebound onto row after row, so queries never allocate.
pub trait IPrimitiveView<'a>: Clone {
    /// Number of `f64` slots of one serialized primitive.
    fn size(&self) -> usize;

    /// Points the view at a single serialized primitive. `row` must hold at least `size()` values.
    fn bind(&mut self, row: &'a [f64]);

    /// Points the view at row `index` of `buffer`.
    #[inline(always)]
    fn rebind(&mut self, buffer: &'a [f64], index: usize) {
        let size = self.size();
        self.bind(&buffer[size * index..size * (index + 1)]);
    }

    /// Number of complete rows stored in `buffer`.
    #[inline(always)]
    fn row_count(&self, buffer: &[f64]) -> usize {
        buffer.len() / self.size()
    }
}
