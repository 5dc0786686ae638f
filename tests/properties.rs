use endless_elevator::consts::*;
use endless_elevator::sim::obstacle::{DynamicVariant, StaticVariant, TimedVariant};
use endless_elevator::sim::{
    CollisionDetector, DifficultyTuning, EventKind, EventManager, Obstacle, ObstacleKind, PhysicsEngine,
    Player, SegmentPool, ShaftGenerator,
};
use endless_elevator::{Direction, Size, Span};
use glam::Vec2;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Move {
    Left,
    Right,
    Dash(Direction),
    Idle,
}

fn any_move() -> impl Strategy<Value = Move> {
    prop_oneof![
        Just(Move::Left),
        Just(Move::Right),
        Just(Move::Dash(Direction::Left)),
        Just(Move::Dash(Direction::Right)),
        Just(Move::Idle),
    ]
}

#[derive(Debug, Clone)]
enum EventOp {
    Activate(usize),
    Deactivate(usize),
    Advance(f32),
}

fn any_event_op() -> impl Strategy<Value = EventOp> {
    prop_oneof![
        (0..4usize).prop_map(EventOp::Activate),
        (0..4usize).prop_map(EventOp::Deactivate),
        (0.001f32..2.0).prop_map(EventOp::Advance),
    ]
}

proptest! {
    #[test]
    fn grounded_player_is_snapped(
        offset in -9.0f32..0.0,
        vy in 0.0f32..200.0,
        dt in 0.001f32..0.02,
    ) {
        let mut physics = PhysicsEngine::default();
        let mut player = Player::new(Vec2::new(180.0, GROUND_Y - PLAYER_HEIGHT + offset), PLAYER_MAX_HEALTH);
        player.can_jump = false;
        player.velocity.y = vy;

        physics.apply_gravity(&mut player, dt, GROUND_Y);

        prop_assert!(player.can_jump);
        prop_assert_eq!(player.velocity.y, 0.0);
        prop_assert!((player.bottom() - GROUND_Y).abs() < 1e-3);
    }

    #[test]
    fn player_stays_on_track(moves in prop::collection::vec(any_move(), 1..200)) {
        let mut physics = PhysicsEngine::default();
        let mut player = Player::new(Vec2::new(PLAYER_START_X, PLAYER_START_Y), PLAYER_MAX_HEALTH);

        for m in moves {
            match m {
                Move::Left => physics.move_left(&mut player, false),
                Move::Right => physics.move_right(&mut player, false),
                Move::Dash(direction) => physics.dash(&mut player, direction),
                Move::Idle => {}
            }
            physics.update_dash(&mut player, SIM_DT);
            physics.apply_gravity(&mut player, SIM_DT, GROUND_Y);
            let in_air = !player.can_jump;
            physics.apply_horizontal_movement(&mut player, SIM_DT, in_air);

            prop_assert!(player.position.x >= TRACK_MIN_X);
            prop_assert!(player.position.x <= TRACK_MAX_X - player.size.width);
        }
    }

    #[test]
    fn dynamic_obstacle_stays_in_range(
        start in 60.0f32..300.0,
        speed in 10.0f32..400.0,
        steps in prop::collection::vec(0.001f32..0.1, 1..300),
    ) {
        let range = Span::new(50.0, 300.0);
        let mut obstacle = Obstacle::new_dynamic(
            1,
            Vec2::new(start, 0.0),
            Size::new(60.0, 30.0),
            Vec2::new(speed, 0.0),
            range,
            DynamicVariant::Sliding,
        )
        .unwrap();

        for dt in steps {
            obstacle.update(dt);
            prop_assert!(obstacle.position.x >= range.min && obstacle.position.x <= range.max);
        }
    }

    #[test]
    fn timed_obstacle_cycles(
        interval in 0.6f32..2.0,
        active_time in 0.2f32..1.0,
        dt in 0.005f32..0.05,
    ) {
        let mut obstacle = Obstacle::new_timed(
            1,
            Vec2::ZERO,
            Size::new(60.0, 30.0),
            interval,
            active_time,
            TimedVariant::Electric,
        )
        .unwrap();

        // (active, ticks) for each run of identical state
        let mut runs: Vec<(bool, usize)> = Vec::new();
        let ticks = ((interval + active_time) * 3.0 / dt) as usize + 2;
        for _ in 0..ticks {
            obstacle.update(dt);
            if let ObstacleKind::Timed { timer, .. } = obstacle.kind {
                let phase_len = if obstacle.active { active_time } else { interval };
                prop_assert!(timer < phase_len + dt);
            }
            match runs.last_mut() {
                Some((active, count)) if *active == obstacle.active => *count += 1,
                _ => runs.push((obstacle.active, 1)),
            }
        }

        // The first dormant run starts mid-count and the last may be cut off
        let complete = &runs[1..runs.len() - 1];
        prop_assert!(complete.len() >= 2);
        for &(active, count) in complete {
            let expected = if active { active_time } else { interval };
            let measured = count as f32 * dt;
            prop_assert!(measured >= expected - 1e-3, "{} run of {} < {}", active, measured, expected);
            prop_assert!(measured < expected + dt + 1e-3, "{} run of {} > {}", active, measured, expected);
        }
        for pair in complete.windows(2) {
            let period = (pair[0].1 + pair[1].1) as f32 * dt;
            prop_assert!(period >= interval + active_time - 2e-3);
            prop_assert!(period < interval + active_time + 2.0 * dt + 2e-3);
        }
    }

    #[test]
    fn near_miss_excludes_collision(
        px in 0.0f32..400.0,
        py in 0.0f32..500.0,
        vy in -800.0f32..800.0,
        crouching in any::<bool>(),
        ox in 0.0f32..400.0,
        oy in 0.0f32..500.0,
        w in 10.0f32..120.0,
        h in 10.0f32..80.0,
    ) {
        let detector = CollisionDetector::default();
        let mut player = Player::new(Vec2::new(px, py), PLAYER_MAX_HEALTH);
        player.velocity.y = vy;
        player.is_crouching = crouching;
        let obstacle = Obstacle::new_static(1, Vec2::new(ox, oy), Size::new(w, h), StaticVariant::Cable).unwrap();

        let hit = detector.check_player_obstacle_collision(&player, &obstacle);
        let near = detector.check_near_miss(&player, &obstacle);
        prop_assert!(!(hit && near));
    }

    #[test]
    fn pool_never_exceeds_capacity(ops in prop::collection::vec(any::<bool>(), 1..80)) {
        let mut pool = SegmentPool::new(ShaftGenerator::with_seed(3));
        let mut live = Vec::new();
        let mut y = 0.0;

        for get in ops {
            if get || live.is_empty() {
                y -= SEGMENT_HEIGHT;
                live.push(pool.get(y, 1.0));
            } else if let Some(segment) = live.pop() {
                pool.release(segment);
            }
            prop_assert!(pool.len() <= SEGMENT_POOL_CAPACITY);
        }
    }

    #[test]
    fn at_most_one_event_active(ops in prop::collection::vec(any_event_op(), 1..100)) {
        let mut manager = EventManager::with_seed(8);

        for op in ops {
            match op {
                EventOp::Activate(i) => manager.activate(EventKind::ALL[i]),
                EventOp::Deactivate(i) => manager.deactivate(EventKind::ALL[i]),
                EventOp::Advance(dt) => {
                    manager.update_active(dt);
                }
            }
            let active = manager.events().iter().filter(|e| e.is_active()).count();
            prop_assert!(active <= 1);
        }
    }

    #[test]
    fn difficulty_is_monotonic(a in 0.0f32..400.0, b in 0.0f32..400.0) {
        let tuning = DifficultyTuning::default();
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        let early = tuning.at_time(early, BASE_ELEVATOR_SPEED);
        let late = tuning.at_time(late, BASE_ELEVATOR_SPEED);

        prop_assert!(late.speed_multiplier >= early.speed_multiplier);
        prop_assert!(late.obstacle_frequency >= early.obstacle_frequency);
        prop_assert!(late.event_frequency >= early.event_frequency);
        prop_assert!(late.reaction_time <= early.reaction_time);
        prop_assert!(late.level <= tuning.max_level);
    }
}
