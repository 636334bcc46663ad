/// Sample indexing and weighted pattern extraction with symmetry variants
pub mod patterns;
/// Precomputed pattern adjacency table used as the propagation oracle
pub mod propagator;
