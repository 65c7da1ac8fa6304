//! Property tests for the simulation core.
//!
//! These use `proptest` to check the invariants the systems promise for any
//! input: rate limiting stays on the segment toward the goal, collision
//! records come in mirrored pairs, the pathfinder never enters the wall
//! buffer and always produces a usable direction, and scheduled events fire
//! exactly once.

use proptest::prelude::*;
use sneak_engine::collision::{detect, CollisionRecord, CollisionSet};
use sneak_engine::motion::approach;
use sneak_engine::pathfinder::{reachable, DIRECTIONS};
use sneak_engine::prelude::*;

/// Strategy that generates finite f32 values in a game-sized range.
fn finite_f32() -> impl Strategy<Value = f32> {
    (-100_000i32..100_000i32).prop_map(|v| v as f32 * 0.01)
}

fn vec2() -> impl Strategy<Value = Vec2> {
    (finite_f32(), finite_f32()).prop_map(|(x, y)| Vec2::new(x, y))
}

/// Random grid text: each cell is a wall with probability `density / 100`.
fn grid_strategy() -> impl Strategy<Value = LevelGrid> {
    (4usize..24, 4usize..24, 0u32..40).prop_flat_map(|(cols, rows, density)| {
        prop::collection::vec(0u32..100, cols * rows).prop_map(move |rolls| {
            let text: String = rolls
                .chunks(cols)
                .map(|row| {
                    row.iter()
                        .map(|&r| if r < density { 'W' } else { ' ' })
                        .collect::<String>()
                })
                .collect::<Vec<_>>()
                .join("\n");
            LevelGrid::parse(&text).unwrap()
        })
    })
}

fn on_segment(from: f32, to: f32, value: f32) -> bool {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    value >= lo && value <= hi
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn approach_stays_between_current_and_goal(
        goal in vec2(),
        cur in vec2(),
        dt in 0i32..50_000,
    ) {
        let dt = dt as f32 * 0.01;
        let out = approach(goal, cur, dt);
        prop_assert!(on_segment(cur.x, goal.x, out.x));
        prop_assert!(on_segment(cur.y, goal.y, out.y));
        if (goal.x - cur.x).abs() <= dt {
            prop_assert_eq!(out.x, goal.x);
        }
        if (goal.y - cur.y).abs() <= dt {
            prop_assert_eq!(out.y, goal.y);
        }
    }

    #[test]
    fn collision_records_are_mirrored(
        bodies in prop::collection::vec((vec2(), 1i32..200, 1i32..200, any::<bool>()), 0..40),
    ) {
        let mut world = World::new();
        for (pos, w, h, is_light) in bodies {
            let e = world.spawn_with(Motion::at(pos * 0.1, Vec2::new(w as f32, h as f32)));
            if is_light {
                world.insert_component(e, Light::default()).unwrap();
            }
        }
        let mut set = CollisionSet::new();
        detect(&world, Vec2::new(90.0, -30.0), &mut set);

        prop_assert_eq!(set.len() % 2, 0);
        for r in set.records() {
            let mirrored = CollisionRecord { subject: r.other, other: r.subject };
            let forward = set.records().iter().filter(|x| *x == r).count();
            let backward = set.records().iter().filter(|x| **x == mirrored).count();
            prop_assert_eq!(forward, backward);
            prop_assert_ne!(r.subject, r.other);
        }
    }

    #[test]
    fn reachable_cells_respect_wall_buffer(
        grid in grid_strategy(),
        start_col in 0i32..24,
        start_row in 0i32..24,
    ) {
        let start = GridCell::new(start_col, start_row);
        for cell in reachable(&grid, start, 3) {
            prop_assert!(!grid.has_wall_within(cell, 3), "entered buffer at {:?}", cell);
            for row in cell.row - 3..=cell.row + 3 {
                for col in cell.col - 3..=cell.col + 3 {
                    prop_assert!(!grid.is_wall(GridCell::new(col, row)));
                }
            }
        }
    }

    #[test]
    fn chase_vector_is_always_a_unit_candidate(
        grid in grid_strategy(),
        seed in any::<u64>(),
        from in (0i32..24, 0i32..24),
        to in (0i32..24, 0i32..24),
    ) {
        let config = SimConfig { seed, ..SimConfig::default() };
        let mut pursuit = Pursuit::new(&config);
        let (from, to) = (GridCell::new(from.0, from.1), GridCell::new(to.0, to.1));
        let v = pursuit.chase_vector(&grid, from, to);
        prop_assert!(v.is_finite());
        prop_assert!((v.length() - 1.0).abs() < 1e-5);
        let matches_candidate = DIRECTIONS.iter().any(|&(dx, dy)| {
            let c = Vec2::new(dx as f32, dy as f32);
            let c = c / c.length();
            (c - v).length() < 1e-5
        });
        prop_assert!(matches_candidate);
    }

    #[test]
    fn scheduled_events_fire_exactly_once(
        fire_times in prop::collection::vec(0u32..2_000, 1..30),
        ticks in prop::collection::vec(0u32..300, 1..40),
    ) {
        let mut scheduler: Scheduler<usize> = Scheduler::new();
        for (i, &t) in fire_times.iter().enumerate() {
            scheduler.schedule(f64::from(t), i);
        }

        let mut fired = vec![0u32; fire_times.len()];
        let mut now = 0.0f64;
        for step in ticks {
            now += f64::from(step);
            scheduler.tick(now, |event, _| {
                assert!(event.fire_at_ms <= now, "fired early");
                fired[event.action] += 1;
            });
        }
        scheduler.tick(f64::MAX, |event, _| fired[event.action] += 1);

        prop_assert!(fired.iter().all(|&n| n == 1));
        prop_assert!(scheduler.is_empty());
    }
}
