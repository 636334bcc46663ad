//! End-to-end solver behavior: decided runs, determinism, and backtracking

use wavepath::algorithm::executor::{GenerationOutcome, Generator, OverlappingModel};
use wavepath::algorithm::wave::{Resolution, Wave};
use wavepath::analysis::patterns::{PatternSet, index_sample};
use wavepath::analysis::propagator::Propagator;
use wavepath::constraint::BorderConstraint;
use wavepath::io::configuration::GeneratorConfig;
use wavepath::spatial::GridTopology;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn cross_sample() -> Vec<Vec<char>> {
    vec![
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['r', 'r', 'r', 'r', 'r'],
        vec!['w', 'w', 'r', 'w', 'w'],
        vec!['w', 'w', 'r', 'w', 'w'],
    ]
}

fn cross_wave() -> Result<Wave, Box<dyn std::error::Error>> {
    let (grid, palette) = index_sample(&cross_sample())?;
    let patterns = PatternSet::extract(&grid, palette.len(), 3, false, 8)?;
    let propagator = Propagator::build(&patterns);
    let topology = GridTopology::new(10, 10, 3, false);
    Ok(Wave::new(topology, patterns, propagator))
}

fn cross_config() -> GeneratorConfig {
    GeneratorConfig {
        window: 3,
        output_width: 16,
        output_height: 16,
        symmetry: 8,
        seed: 42,
        max_attempts: 30,
        ..GeneratorConfig::default()
    }
}

#[test]
fn test_cross_sample_generation_decides() -> TestResult {
    let model = OverlappingModel::new(&cross_sample(), &cross_config(), vec![])?;
    let mut generator = Generator::new(model, 42, 30);
    let outcome = generator.generate()?;

    let GenerationOutcome::Decided { grid, attempts } = outcome else {
        return Err("every attempt ended in contradiction".into());
    };
    assert!(attempts >= 1);
    assert_eq!(grid.dim(), (16, 16));
    // Every cell resolves to one of the two sample tiles, and since every
    // extracted pattern contains both tiles, so does the output
    assert!(grid.iter().all(|&tile| tile < 2));
    assert!(grid.iter().any(|&tile| tile == 0));
    assert!(grid.iter().any(|&tile| tile == 1));
    Ok(())
}

#[test]
fn test_same_seed_reproduces_output() -> TestResult {
    let mut first = OverlappingModel::new(&cross_sample(), &cross_config(), vec![])?;
    let mut second = OverlappingModel::new(&cross_sample(), &cross_config(), vec![])?;

    first.reseed(7);
    second.reseed(7);
    let status_first = first.run();
    let status_second = second.run();

    assert_eq!(status_first, status_second);
    if status_first == Resolution::Decided {
        assert_eq!(first.output()?, second.output()?);
    }
    Ok(())
}

#[test]
fn test_decided_output_respects_adjacency() -> TestResult {
    let mut model = OverlappingModel::new(&cross_sample(), &cross_config(), vec![])?;
    let mut status = Resolution::Contradiction;
    for attempt in 0..30u64 {
        model.reseed(100 + attempt);
        status = model.run();
        if status == Resolution::Decided {
            break;
        }
    }
    assert_eq!(status, Resolution::Decided);

    let wave = model.wave();
    let topology = wave.topology();
    let observed = wave
        .observed()
        .ok_or("decided wave yielded no observation")?;

    for cell in 0..topology.cell_count() {
        let (x, y) = topology.coordinates(cell);
        if topology.on_boundary(x as i32, y as i32) {
            continue;
        }
        let own = observed.get(cell).copied().ok_or("missing observation")?;
        for direction in 0..4 {
            let Some(neighbor) = topology.propagation_neighbor(cell, direction) else {
                continue;
            };
            let other = observed.get(neighbor).copied().ok_or("missing neighbor")?;
            assert!(
                wave.propagator().compatible(direction, own).contains(&other),
                "patterns {own} and {other} disagree in direction {direction}"
            );
        }
    }
    Ok(())
}

#[test]
fn test_single_pattern_sample_decides_immediately() -> TestResult {
    let sample = vec![vec!['a', 'a'], vec!['a', 'a']];
    let config = GeneratorConfig {
        window: 2,
        output_width: 6,
        output_height: 6,
        symmetry: 1,
        ..GeneratorConfig::default()
    };
    let mut model = OverlappingModel::new(&sample, &config, vec![])?;
    assert_eq!(model.run(), Resolution::Decided);
    let tiles = model.output_tiles()?;
    assert!(tiles.iter().flatten().all(|&tile| tile == 'a'));
    Ok(())
}

#[test]
fn test_weighted_draws_follow_sample_frequencies() -> TestResult {
    // Window 1 removes adjacency constraints entirely, so cell draws are
    // independent and the output should reflect the 3:1 sample weights
    let sample = vec![vec!['a', 'a'], vec!['a', 'b']];
    let config = GeneratorConfig {
        window: 1,
        output_width: 40,
        output_height: 40,
        symmetry: 1,
        ..GeneratorConfig::default()
    };
    let mut model = OverlappingModel::new(&sample, &config, vec![])?;
    model.reseed(11);
    assert_eq!(model.run(), Resolution::Decided);

    let grid = model.output()?;
    let majority = grid.iter().filter(|&&tile| tile == 0).count();
    let fraction = majority as f64 / grid.len() as f64;
    assert!(
        (fraction - 0.75).abs() < 0.1,
        "tile frequency {fraction} drifts from the sample weight 0.75"
    );
    Ok(())
}

#[test]
fn test_snapshots_track_collapse_progress() -> TestResult {
    let sample = vec![vec!['a', 'a'], vec!['a', 'a']];
    let config = GeneratorConfig {
        window: 2,
        output_width: 6,
        output_height: 6,
        symmetry: 1,
        ..GeneratorConfig::default()
    };
    let mut model = OverlappingModel::new(&sample, &config, vec![])?;
    model.enable_snapshots();
    assert_eq!(model.run(), Resolution::Decided);

    let capture = model.snapshots().ok_or("capture not enabled")?;
    let last = capture.frames().last().ok_or("no frames recorded")?;
    assert_eq!(last.width(), 6);
    assert_eq!(last.height(), 6);
    for cell in 0..36 {
        assert_eq!(last.cell_tiles(cell), &[0]);
        assert!(last.is_settled(cell));
    }
    Ok(())
}

#[test]
fn test_conflicting_forcings_terminate_in_contradiction() -> TestResult {
    // The border demands 'b' along the top ring, but no extracted pattern
    // places 'b' in its top row, so every attempt must contradict on every
    // seed; the ground forcing runs first and must not mask the conflict
    let sample = vec![
        vec!['a', 'a', 'a'],
        vec!['a', 'a', 'a'],
        vec!['b', 'b', 'b'],
    ];
    let config = GeneratorConfig {
        window: 2,
        output_width: 6,
        output_height: 6,
        symmetry: 1,
        ground: Some(0),
        max_attempts: 3,
        ..GeneratorConfig::default()
    };
    let constraints: Vec<Box<dyn wavepath::constraint::Constraint<char>>> =
        vec![Box::new(BorderConstraint::new('b'))];
    let model = OverlappingModel::new(&sample, &config, constraints)?;
    let mut generator = Generator::new(model, 42, 3);

    let outcome = generator.generate()?;
    assert!(matches!(
        outcome,
        GenerationOutcome::Exhausted { attempts: 3 }
    ));
    Ok(())
}

#[test]
fn test_ground_pattern_out_of_range_rejected() {
    let sample = vec![vec!['a', 'a'], vec!['a', 'a']];
    let config = GeneratorConfig {
        window: 2,
        output_width: 6,
        output_height: 6,
        symmetry: 1,
        ground: Some(99),
        ..GeneratorConfig::default()
    };
    assert!(OverlappingModel::new(&sample, &config, vec![]).is_err());
}

#[test]
fn test_backtrack_restores_wave_state() -> TestResult {
    let mut wave = cross_wave()?;

    let before: Vec<usize> = (0..wave.topology().cell_count())
        .map(|cell| wave.possible_count(cell))
        .collect();
    let mark = wave.checkpoint();
    assert_eq!(mark, 0);

    // Ban a handful of patterns in an interior cell and let it cascade
    let cell = wave.topology().index(4, 4);
    for pattern in 0..wave.pattern_count() / 2 {
        wave.ban(cell, pattern);
    }
    wave.propagate();
    let banned_total = wave.ban_count();
    assert!(banned_total >= wave.pattern_count() / 2);

    let undone = wave.backtrack_to(mark);
    assert_eq!(undone.len(), banned_total);
    assert_eq!(wave.ban_count(), 0);
    assert_eq!(wave.status(), Resolution::Undecided);

    let after: Vec<usize> = (0..wave.topology().cell_count())
        .map(|cell| wave.possible_count(cell))
        .collect();
    assert_eq!(before, after);
    for cell in 0..wave.topology().cell_count() {
        for pattern in 0..wave.pattern_count() {
            assert!(wave.is_possible(cell, pattern));
        }
    }
    Ok(())
}

#[test]
fn test_backtrack_recovers_from_contradiction() -> TestResult {
    let mut wave = cross_wave()?;

    let mark = wave.checkpoint();
    let cell = wave.topology().index(5, 5);
    for pattern in 0..wave.pattern_count() {
        wave.ban(cell, pattern);
    }
    assert_eq!(wave.status(), Resolution::Contradiction);

    wave.backtrack_to(mark);
    assert_eq!(wave.status(), Resolution::Undecided);
    assert_eq!(wave.possible_count(cell), wave.pattern_count());
    Ok(())
}

#[test]
fn test_backtracked_wave_cascades_like_a_fresh_one() -> TestResult {
    // An undone excursion must leave no trace in the support counters: a
    // later, different run of bans has to cascade exactly as it does on a
    // wave that never took the excursion. Bit-level equality alone would not
    // catch stale counters, so the cascades themselves are compared
    let mut seasoned = cross_wave()?;
    let mut fresh = cross_wave()?;
    let pattern_count = seasoned.pattern_count();

    let mark = seasoned.checkpoint();
    let cell = seasoned.topology().index(4, 4);
    for pattern in 0..pattern_count / 2 {
        seasoned.ban(cell, pattern);
    }
    for (k, &(x, y)) in [(2, 2), (7, 3), (4, 6), (8, 8), (1, 7), (6, 1)]
        .iter()
        .enumerate()
    {
        let scatter = seasoned.topology().index(x, y);
        seasoned.ban(scatter, k % pattern_count);
    }
    seasoned.propagate();
    seasoned.backtrack_to(mark);
    assert_eq!(seasoned.ban_count(), 0);

    let cell = seasoned.topology().index(5, 5);
    for pattern in pattern_count / 2..pattern_count.saturating_sub(1) {
        seasoned.ban(cell, pattern);
        fresh.ban(cell, pattern);
    }
    for (k, &(x, y)) in [(3, 5), (6, 6), (2, 8), (5, 2), (8, 4), (1, 3)]
        .iter()
        .enumerate()
    {
        let scatter = seasoned.topology().index(x, y);
        let pattern = (2 * k + 1) % pattern_count;
        seasoned.ban(scatter, pattern);
        fresh.ban(scatter, pattern);
    }
    seasoned.propagate();
    fresh.propagate();

    assert_eq!(
        seasoned.ban_count(),
        fresh.ban_count(),
        "cascade sizes diverge after the undone excursion"
    );
    assert_eq!(seasoned.status(), fresh.status());
    for cell in 0..seasoned.topology().cell_count() {
        assert_eq!(seasoned.possible_count(cell), fresh.possible_count(cell));
        for pattern in 0..pattern_count {
            assert_eq!(
                seasoned.is_possible(cell, pattern),
                fresh.is_possible(cell, pattern),
                "cell {cell} pattern {pattern} differs between the two waves"
            );
        }
    }
    Ok(())
}
