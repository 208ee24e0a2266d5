// Integration tests (native) for the particle engine. Seeded systems keep
// them deterministic.

use contrastive_goat::particles::{MAX_COUNT, ParticleOptions, ParticleSystem, Size, line_alpha};

fn options(count: usize, speed: f64) -> ParticleOptions {
    ParticleOptions {
        count,
        speed,
        ..ParticleOptions::default()
    }
}

#[test]
fn thirty_particles_survive_a_thousand_ticks() {
    let mut system = ParticleSystem::with_seed(Size::new(800.0, 600.0), options(30, 0.3), 7);
    for _ in 0..1000 {
        system.tick();
    }
    assert_eq!(system.len(), 30);
}

#[test]
fn positions_stay_inside_bounds() {
    let bounds = Size::new(320.0, 240.0);
    // Fast particles cross edges often.
    let mut system = ParticleSystem::with_seed(bounds, options(60, 40.0), 11);
    for step in 0..500 {
        system.tick();
        for p in system.particles() {
            assert!(p.x >= 0.0 && p.x < bounds.width, "x={} at step {step}", p.x);
            assert!(p.y >= 0.0 && p.y < bounds.height, "y={} at step {step}", p.y);
        }
    }
}

#[test]
fn line_alpha_decreases_with_distance() {
    let c = 100.0;
    let mut last = f64::INFINITY;
    for d in 0..=120 {
        let a = line_alpha(d as f64, c);
        assert!(a <= last, "alpha rose at distance {d}");
        last = a;
    }
    assert_eq!(line_alpha(c, c), 0.0);
    assert!(line_alpha(99.9, c) > 0.0);
}

#[test]
fn bursts_never_exceed_twice_the_target() {
    let mut system = ParticleSystem::with_seed(Size::new(800.0, 600.0), options(30, 0.3), 3);
    for i in 0..200 {
        system.add_burst(i as f64 * 5.0, 300.0);
        assert!(system.len() <= 60);
    }
    assert_eq!(system.len(), 60);
    // The newest burst is kept at the back, wrapped into the field.
    let last = system.particles().last().unwrap();
    assert_eq!((last.x, last.y), (995.0 % 800.0, 300.0));
}

#[test]
fn oversized_count_is_clamped() {
    let opts: ParticleOptions = serde_json::from_str(&format!(r#"{{"count": {}}}"#, usize::MAX)).unwrap();
    let mut system = ParticleSystem::with_seed(Size::new(100.0, 100.0), opts, 1);
    assert_eq!(system.len(), MAX_COUNT);
    system.add_burst(5.0, 5.0);
    assert_eq!(system.len(), MAX_COUNT + 1);
}

#[test]
fn reinitialize_resets_to_target() {
    let mut system = ParticleSystem::with_seed(Size::new(800.0, 600.0), options(30, 0.3), 5);
    for _ in 0..10 {
        system.add_burst(10.0, 10.0);
    }
    system.initialize(Size::new(400.0, 400.0), Some(options(12, 0.1)));
    assert_eq!(system.len(), 12);
    assert_eq!(system.bounds(), Size::new(400.0, 400.0));
}

#[test]
fn options_deserialize_with_defaults() {
    let opts: ParticleOptions = serde_json::from_str(r##"{"count": 10, "connectDistance": 50, "color": "#fff"}"##).unwrap();
    assert_eq!(opts.count, 10);
    assert_eq!(opts.connect_distance, 50.0);
    assert_eq!(opts.color, "#fff");
    assert_eq!(opts.speed, 0.3);
}
