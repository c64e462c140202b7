use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    thread,
    time::{Duration, Instant},
};

use snail_maze_core::{Command, Event, PageBuffer, Upgrades, Variant};
use snail_maze_worker::{Directory, Machine, WorkerConfig};

/// Scripted command stream with caller-supplied timestamps.
fn script(variant: Variant) -> Vec<(u64, Option<Command>)> {
    vec![
        (0, Some(Command::Resize { delta: 6 })),
        (0, Some(Command::Setup { variant })),
        (100_000, None),
        (200_000, Some(Command::SetTickRate { multiplier: 4 })),
        (300_000, None),
        (
            350_000,
            Some(Command::SetUpgrades {
                upgrades: Upgrades::new(0b101, 2),
            }),
        ),
        (400_000, Some(Command::Resize { delta: 9 })),
        (500_000, None),
        (600_000, Some(Command::SetWidth { width: 2 })),
        (
            700_000,
            Some(Command::RequestRender {
                pages: Vec::new(),
            }),
        ),
        (800_000, None),
        (900_000, Some(Command::Resize { delta: -4 })),
        (1_000_000, None),
        (1_100_000, Some(Command::QueryCount)),
        (1_900_000, None),
    ]
}

/// Replays the script and hashes every emitted event.
fn replay(variant: Variant) -> (Vec<Event>, u64) {
    let mut machine = Machine::new(WorkerConfig::new().with_seed(31));
    let mut events = Vec::new();
    for (now, command) in script(variant) {
        match command {
            Some(Command::RequestRender { .. }) => {
                let bytes = machine
                    .session()
                    .map(|session| snail_maze_lattice::query::page_bytes(session.lattice()))
                    .expect("ready");
                let pages = (0..3).map(|page| PageBuffer::new(page, vec![0; bytes])).collect();
                machine.handle(Command::RequestRender { pages }, now, &mut events);
            }
            Some(command) => machine.handle(command, now, &mut events),
            None => machine.on_timer(now, &mut events),
        }
    }

    let mut hasher = DefaultHasher::new();
    for event in &events {
        match event {
            Event::Score {
                delta,
                solves,
                solve_counts,
                ..
            } => (delta, solves, solve_counts).hash(&mut hasher),
            Event::RenderedPages { pages, .. } => {
                for page in pages {
                    (page.page, &page.buffer).hash(&mut hasher);
                }
            }
            Event::PopulationUpdated {
                width_px,
                height_px,
                page_count,
                ..
            } => (width_px, height_px, page_count).hash(&mut hasher),
        }
    }
    (events, hasher.finish())
}

#[test]
fn scripted_sessions_replay_identically() {
    for variant in Variant::ALL {
        let (first_events, first) = replay(variant);
        let (second_events, second) = replay(variant);
        assert_eq!(first, second, "{variant}");
        assert_eq!(first_events, second_events, "{variant}");
        assert!(
            first_events
                .iter()
                .any(|event| matches!(event, Event::RenderedPages { pages, .. } if pages.len() == 3)),
            "{variant}"
        );
    }
}

#[test]
fn directory_collects_score_and_pages_from_worker_threads() {
    let config = WorkerConfig::new().with_tick_interval(Duration::from_millis(10));
    let mut directory =
        Directory::new(config, [Variant::Flying, Variant::RandomWalk]).expect("workers start");
    assert_eq!(
        directory.variants().collect::<Vec<_>>(),
        vec![Variant::RandomWalk, Variant::Flying]
    );
    directory
        .send(Variant::Flying, Command::SetTickRate { multiplier: 100 })
        .expect("worker alive");
    directory
        .send(Variant::Flying, Command::Resize { delta: 3 })
        .expect("worker alive");

    let deadline = Instant::now() + Duration::from_secs(20);
    while directory.currency() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
        let _ = directory.pump();
    }
    assert!(directory.currency() > 0);
    assert_eq!(directory.currency() % Variant::Flying.base_reward(), 0);
    assert_eq!(directory.solve_counts(Variant::Flying).len(), 3);

    let layout = directory.layout(Variant::Flying).expect("layout reported");
    assert_eq!(layout.page_count, 1);
    let requested = directory
        .request_visible(Variant::Flying, 0, u64::from(layout.height_px))
        .expect("worker alive");
    assert_eq!(requested, 0..1);

    let mut rendered = Vec::new();
    while rendered.is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
        let _ = directory.pump();
        rendered = directory.take_rendered(Variant::Flying);
    }
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].buffer.len(), layout.page_bytes());
    assert!(rendered[0].buffer.iter().any(|byte| *byte != 0));

    directory.shutdown().expect("workers stop cleanly");
}
