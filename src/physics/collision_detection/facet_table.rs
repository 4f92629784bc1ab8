use crate::utilities::vector::MAX_DIMENSION;

/// Maximum number of simplex vertices, `MAX_DIMENSION + 1`.
pub const MAX_VERTEX_COUNT: usize = MAX_DIMENSION + 1;

/// Number of subsets of the simplex vertex slots.
pub const FACET_COUNT: usize = 1 << MAX_VERTEX_COUNT;

/// A face of the simplex, encoded by the bitmask of its vertex slots.
#[derive(Clone, Copy, Debug)]
pub struct Facet {
    /// Number of vertices of the facet.
    pub size: usize,
    /// Vertex slots in increasing order. Only the first `size` entries are meaningful.
    pub vertices: [usize; MAX_VERTEX_COUNT],
    /// `faces[i]` is the facet with `vertices[i]` removed. Only the first `size` entries are meaningful.
    pub faces: [usize; MAX_VERTEX_COUNT],
}

impl Facet {
    const EMPTY: Facet = Facet {
        size: 0,
        vertices: [0; MAX_VERTEX_COUNT],
        faces: [0; MAX_VERTEX_COUNT],
    };

    #[inline(always)]
    pub fn vertices(&self) -> &[usize] {
        &self.vertices[..self.size]
    }

    #[inline(always)]
    pub fn faces(&self) -> &[usize] {
        &self.faces[..self.size]
    }

    /// Slot of the highest vertex of the facet.
    #[inline(always)]
    pub fn last(&self) -> usize {
        self.vertices[self.size - 1]
    }
}

const fn build_facets() -> [Facet; FACET_COUNT] {
    let mut table = [Facet::EMPTY; FACET_COUNT];
    let mut facet = 0;
    while facet < FACET_COUNT {
        let mut entry = Facet::EMPTY;
        let mut slot = 0;
        while slot < MAX_VERTEX_COUNT {
            if facet & (1 << slot) != 0 {
                entry.vertices[entry.size] = slot;
                entry.faces[entry.size] = facet & !(1 << slot);
                entry.size += 1;
            }
            slot += 1;
        }
        table[facet] = entry;
        facet += 1;
    }
    table
}

/// Every subset of `{0, ..., MAX_DIMENSION}`. A facet of a lower dimensional simplex only uses its low bits,
/// so the same table serves every supported dimension.
pub static FACETS: [Facet; FACET_COUNT] = build_facets();

/// Bitmask of the facet spanned by the first `simplex_size` vertex slots.
#[inline(always)]
pub const fn full(simplex_size: usize) -> usize {
    (1 << simplex_size) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_popcount() {
        for (facet, entry) in FACETS.iter().enumerate() {
            assert_eq!(entry.size, (facet as u32).count_ones() as usize);
        }
    }

    #[test]
    fn test_vertices_and_faces() {
        let entry = &FACETS[0b10110];
        assert_eq!(entry.vertices(), &[1, 2, 4]);
        assert_eq!(entry.faces(), &[0b10100, 0b10010, 0b00110]);
        assert_eq!(entry.last(), 4);
        for (vertex, face) in entry.vertices().iter().zip(entry.faces()) {
            assert_eq!(face | (1usize << *vertex), 0b10110);
            assert_eq!(FACETS[*face].size, 2);
        }
    }

    #[test]
    fn test_full() {
        assert_eq!(full(1), 0b1);
        assert_eq!(full(3), 0b111);
        assert_eq!(full(MAX_VERTEX_COUNT), FACET_COUNT - 1);
        assert_eq!(FACETS[full(4)].vertices(), &[0, 1, 2, 3]);
    }
}
