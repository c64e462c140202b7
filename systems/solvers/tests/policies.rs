use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use rand::SeedableRng;
use snail_maze_core::{Upgrades, Variant};
use snail_maze_system_generation::generate;
use snail_maze_system_solvers::{
    LearningMemory, Policy, Scene, SolverRng, StepContext, TELEPORT_INTERVAL,
};

/// Steps a policy for `steps` iterations, regenerating the maze on every
/// solve, and fingerprints what was drawn along the way.
fn replay(variant: Variant, seed: u64, steps: usize) -> (u64, u64) {
    let size = variant.maze_size();
    let mut maze = generate(size, size, seed).expect("valid dimensions");
    let mut rng = SolverRng::seed_from_u64(seed);
    let mut memory = LearningMemory::default();
    let mut ctx = StepContext {
        upgrades: Upgrades::from_mask(0b111),
        rng: &mut rng,
        memory: &mut memory,
        clone_capacity: 64,
    };
    let mut policy = Policy::new(variant);
    policy.setup(&maze, &mut ctx);

    let mut solves = 0_u64;
    let mut hasher = DefaultHasher::new();
    let mut scene = Scene::default();
    for _ in 0..steps {
        let outcome = policy.step(&mut maze, &mut ctx);
        solves += u64::from(outcome.solves());
        if outcome.is_solved() {
            snail_maze_system_generation::regenerate(&mut maze, ctx.rng)
                .expect("same dimensions");
            policy.setup(&maze, &mut ctx);
        }
        scene.clear();
        policy.scene(&mut scene);
        scene.agents.hash(&mut hasher);
        scene.marks.hash(&mut hasher);
        scene.path.hash(&mut hasher);
        scene.bombs.hash(&mut hasher);
        maze.hash(&mut hasher);
    }
    (solves, hasher.finish())
}

#[test]
fn every_variant_replays_identically_from_a_seed() {
    for variant in Variant::ALL {
        let first = replay(variant, 11, 600);
        let second = replay(variant, 11, 600);
        assert_eq!(first, second, "{variant} diverged between runs");
    }
}

#[test]
fn every_variant_solves_repeatedly() {
    for variant in Variant::ALL {
        let (solves, _) = replay(variant, 5, 20_000);
        assert!(solves >= 2, "{variant} solved only {solves} times");
    }
}

#[test]
fn scenes_always_contain_a_snail() {
    for variant in Variant::ALL {
        let size = variant.maze_size();
        let maze = generate(size, size, 1).expect("valid dimensions");
        let mut rng = SolverRng::seed_from_u64(1);
        let mut memory = LearningMemory::default();
        let mut ctx = StepContext {
            upgrades: Upgrades::default(),
            rng: &mut rng,
            memory: &mut memory,
            clone_capacity: 1,
        };
        let mut policy = Policy::new(variant);
        policy.setup(&maze, &mut ctx);
        let mut scene = Scene::default();
        policy.scene(&mut scene);
        let drawn = scene.agents.len() + scene.path.len();
        assert!(drawn > 0, "{variant} drew nothing");
    }
}

#[test]
fn teleport_charge_bar_counts_up_to_the_jump() {
    let mut maze = generate(7, 7, 3).expect("valid dimensions");
    let mut rng = SolverRng::seed_from_u64(3);
    let mut memory = LearningMemory::default();
    let mut ctx = StepContext {
        upgrades: Upgrades::default(),
        rng: &mut rng,
        memory: &mut memory,
        clone_capacity: 1,
    };
    let mut policy = Policy::new(Variant::RandomTeleport);
    policy.setup(&maze, &mut ctx);

    let mut scene = Scene::default();
    for step in 1..=TELEPORT_INTERVAL * 3 {
        if policy.step(&mut maze, &mut ctx).is_solved() {
            policy.setup(&maze, &mut ctx);
            continue;
        }
        scene.clear();
        policy.scene(&mut scene);
        let charge = scene.charge.expect("teleporter shows its charge");
        assert_eq!(charge.period, TELEPORT_INTERVAL);
        assert_eq!(charge.elapsed, step % TELEPORT_INTERVAL);
    }
}
