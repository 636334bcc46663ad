//! Validates sample indexing, pattern extraction, and the adjacency oracle

use ndarray::Array2;
use wavepath::analysis::patterns::{PatternSet, index_sample};
use wavepath::analysis::propagator::{Propagator, agrees};
use wavepath::spatial::grid::{direction_delta, opposite_direction};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn indexed(rows: &[Vec<char>]) -> Result<(Array2<usize>, Vec<char>), Box<dyn std::error::Error>> {
    Ok(index_sample(rows)?)
}

#[test]
fn test_index_sample_first_seen_order() -> TestResult {
    let rows = vec![vec!['a', 'b'], vec!['b', 'c']];
    let (grid, palette) = indexed(&rows)?;
    assert_eq!(palette, vec!['a', 'b', 'c']);
    assert_eq!(grid.get((0, 0)), Some(&0));
    assert_eq!(grid.get((0, 1)), Some(&1));
    assert_eq!(grid.get((1, 0)), Some(&1));
    assert_eq!(grid.get((1, 1)), Some(&2));
    Ok(())
}

#[test]
fn test_index_sample_rejects_empty_and_ragged() {
    let empty: Vec<Vec<char>> = vec![];
    assert!(index_sample(&empty).is_err());
    assert!(index_sample(&[Vec::<char>::new()]).is_err());
    assert!(index_sample(&[vec!['a', 'b'], vec!['a']]).is_err());
}

#[test]
fn test_extraction_counts_and_weights() -> TestResult {
    let rows = vec![vec!['a', 'a'], vec!['a', 'b']];
    let (grid, palette) = indexed(&rows)?;
    let patterns = PatternSet::extract(&grid, palette.len(), 1, false, 1)?;
    assert_eq!(patterns.len(), 2);
    assert!((patterns.weight(0) - 3.0).abs() < f64::EPSILON);
    assert!((patterns.weight(1) - 1.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn test_symmetry_variants_deduplicate() -> TestResult {
    // The 2x2 checkerboard window has only two distinct symmetry variants,
    // but all eight contribute weight
    let rows = vec![vec!['a', 'b'], vec!['b', 'a']];
    let (grid, palette) = indexed(&rows)?;
    let patterns = PatternSet::extract(&grid, palette.len(), 2, false, 8)?;
    assert_eq!(patterns.len(), 2);
    let total: f64 = patterns.weights().iter().sum();
    assert!((total - 8.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn test_symmetry_one_admits_base_only() -> TestResult {
    let rows = vec![vec!['a', 'b'], vec!['b', 'a']];
    let (grid, palette) = indexed(&rows)?;
    let patterns = PatternSet::extract(&grid, palette.len(), 2, false, 1)?;
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns.cells(0), &[0, 1, 1, 0]);
    Ok(())
}

#[test]
fn test_periodic_input_wraps_windows() -> TestResult {
    let rows = vec![vec!['a', 'b'], vec!['b', 'a']];
    let (grid, palette) = indexed(&rows)?;
    let patterns = PatternSet::extract(&grid, palette.len(), 2, true, 1)?;
    // Four anchor positions, two distinct phases of the checkerboard
    assert_eq!(patterns.len(), 2);
    assert!((patterns.weight(0) - 2.0).abs() < f64::EPSILON);
    assert!((patterns.weight(1) - 2.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn test_extraction_validation_errors() -> TestResult {
    let rows = vec![vec!['a', 'b', 'a'], vec!['b', 'a', 'b'], vec!['a', 'b', 'a']];
    let (grid, palette) = indexed(&rows)?;
    assert!(PatternSet::extract(&grid, palette.len(), 0, false, 1).is_err());
    assert!(PatternSet::extract(&grid, palette.len(), 4, false, 1).is_err());
    assert!(PatternSet::extract(&grid, palette.len(), 2, false, 5).is_err());
    assert!(PatternSet::extract(&grid, 0, 2, false, 1).is_err());
    // A wrapped window larger than the sample is fine
    assert!(PatternSet::extract(&grid, palette.len(), 4, true, 1).is_ok());
    Ok(())
}

#[test]
fn test_checkerboard_adjacency() -> TestResult {
    let rows = vec![vec!['a', 'b'], vec!['b', 'a']];
    let (grid, palette) = indexed(&rows)?;
    let patterns = PatternSet::extract(&grid, palette.len(), 2, true, 1)?;
    let propagator = Propagator::build(&patterns);

    // The two checkerboard phases alternate in every direction
    for direction in 0..4 {
        assert_eq!(propagator.compatible(direction, 0), &[1]);
        assert_eq!(propagator.compatible(direction, 1), &[0]);
        assert_eq!(propagator.support_count(direction, 0), 1);
    }
    Ok(())
}

#[test]
fn test_compatibility_is_mirrored() -> TestResult {
    let rows = vec![
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['r', 'r', 'r', 'r', 'r'],
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['w', 'w', 'r', 'w', 'w'],
    ];
    let (grid, palette) = indexed(&rows)?;
    let patterns = PatternSet::extract(&grid, palette.len(), 3, false, 8)?;
    let propagator = Propagator::build(&patterns);

    // b may sit in direction d of a exactly when a may sit opposite of b
    for direction in 0..4 {
        for a in 0..patterns.len() {
            for &b in propagator.compatible(direction, a) {
                assert!(
                    propagator
                        .compatible(opposite_direction(direction), b)
                        .contains(&a)
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_agrees_matches_direct_overlap() -> TestResult {
    let rows = vec![
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['r', 'r', 'r', 'r', 'r'],
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['w', 'w', 'r', 'w', 'w'],
    ];
    let (grid, palette) = indexed(&rows)?;
    let window = 3;
    let patterns = PatternSet::extract(&grid, palette.len(), window, false, 1)?;

    for direction in 0..4 {
        let (dx, dy) = direction_delta(direction);
        for a in 0..patterns.len() {
            for b in 0..patterns.len() {
                let mut expected = true;
                for y in 0..window as i32 {
                    for x in 0..window as i32 {
                        let (ox, oy) = (x - dx, y - dy);
                        if ox < 0 || oy < 0 || ox >= window as i32 || oy >= window as i32 {
                            continue;
                        }
                        if patterns.tile_at(a, x as usize, y as usize)
                            != patterns.tile_at(b, ox as usize, oy as usize)
                        {
                            expected = false;
                        }
                    }
                }
                assert_eq!(agrees(&patterns, a, b, dx, dy, window), expected);
            }
        }
    }
    Ok(())
}
