use snail_maze_core::{Command, Event, Variant};
use snail_maze_lattice::{query, Lattice, LatticeConfig, LatticeError};
use tracing::{debug, info, warn};

use crate::WorkerConfig;

/// Ready state of a worker: one lattice plus its pending score.
///
/// Time is supplied by the caller as a monotonic microsecond reading, so the
/// same command stream with the same readings always produces the same
/// events.
#[derive(Debug)]
pub struct Session {
    lattice: Lattice,
    seed: u64,
    tick_rate: u32,
    last_advance: u64,
    pending_score: u64,
    pending_solves: u64,
}

impl Session {
    /// Builds the lattice for `variant` at the variant's default width.
    pub fn new(variant: Variant, config: &WorkerConfig, now_us: u64) -> Result<Self, LatticeError> {
        let lattice = Lattice::new(LatticeConfig::new(variant).with_seed(config.seed))?;
        Ok(Self {
            lattice,
            seed: config.seed,
            tick_rate: 1,
            last_advance: now_us,
            pending_score: 0,
            pending_solves: 0,
        })
    }

    /// Lattice owned by the session.
    #[must_use]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Current tick-rate multiplier.
    #[must_use]
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Score accumulated since the last flush.
    #[must_use]
    pub const fn pending_score(&self) -> u64 {
        self.pending_score
    }

    /// Advances the lattice by the time elapsed since the previous advance,
    /// scaled by the tick rate, and folds the result into the pending score.
    pub fn advance(&mut self, now_us: u64) {
        let elapsed = now_us.saturating_sub(self.last_advance);
        self.last_advance = self.last_advance.max(now_us);
        let dt = elapsed.saturating_mul(u64::from(self.tick_rate));
        if dt == 0 {
            return;
        }
        let summary = self.lattice.tick(dt);
        self.pending_score = self.pending_score.saturating_add(summary.score);
        self.pending_solves = self.pending_solves.saturating_add(summary.solves);
    }

    /// Posts the pending score, if any, and starts a new accumulation window.
    pub fn flush(&mut self, out_events: &mut Vec<Event>) {
        if self.pending_score == 0 && self.pending_solves == 0 {
            return;
        }
        out_events.push(Event::Score {
            variant: query::variant(&self.lattice),
            delta: self.pending_score,
            solves: self.pending_solves,
            solve_counts: query::solve_counts(&self.lattice),
        });
        self.pending_score = 0;
        self.pending_solves = 0;
    }

    fn population_updated(&self) -> Event {
        let (width_px, height_px) = query::dimensions(&self.lattice);
        Event::PopulationUpdated {
            variant: query::variant(&self.lattice),
            width_px,
            height_px,
            page_count: u32::try_from(query::page_count(&self.lattice)).unwrap_or(u32::MAX),
        }
    }

    /// Replaces the lattice with an empty one for `variant`, posting any
    /// score the old lattice earned first.
    fn rebuild(&mut self, variant: Variant, now_us: u64, out_events: &mut Vec<Event>) {
        self.advance(now_us);
        let lattice = match Lattice::new(LatticeConfig::new(variant).with_seed(self.seed)) {
            Ok(lattice) => lattice,
            Err(error) => {
                warn!(%variant, %error, "setup rejected, keeping the running lattice");
                return;
            }
        };
        self.flush(out_events);
        self.lattice = lattice;
        info!(%variant, "session rebuilt");
        out_events.push(self.population_updated());
    }

    fn resize(&mut self, delta: i64, out_events: &mut Vec<Event>) {
        let pages_before = query::page_count(&self.lattice);
        let _ = self.lattice.resize(delta);
        if query::page_count(&self.lattice) != pages_before {
            out_events.push(self.population_updated());
        }
    }
}

/// Applies the provided command to a ready session.
pub fn apply(session: &mut Session, command: Command, now_us: u64, out_events: &mut Vec<Event>) {
    match command {
        Command::Setup { variant } => session.rebuild(variant, now_us, out_events),
        Command::SetWidth { width } => {
            session.lattice.set_width(width);
            out_events.push(session.population_updated());
        }
        Command::SetTickRate { multiplier } => {
            session.advance(now_us);
            session.tick_rate = multiplier;
            debug!(multiplier, "tick rate changed");
        }
        Command::SetUpgrades { upgrades } => {
            session.advance(now_us);
            session.lattice.set_upgrades(upgrades);
        }
        Command::Resize { delta } => {
            session.advance(now_us);
            session.resize(delta, out_events);
        }
        Command::Reset => {
            session.advance(now_us);
            let count = query::count(&session.lattice);
            info!(
                variant = %query::variant(&session.lattice),
                count,
                "population reset"
            );
            session.resize(-i64::try_from(count).unwrap_or(i64::MAX), out_events);
        }
        Command::RequestRender { mut pages } => {
            session.advance(now_us);
            let page_size = query::page_size(&session.lattice);
            for page in &mut pages {
                let start = page.page as usize * page_size;
                if let Err(error) = session.lattice.render(&mut page.buffer, start, page_size) {
                    warn!(page = page.page, %error, "render request rejected");
                }
            }
            out_events.push(Event::RenderedPages {
                variant: query::variant(&session.lattice),
                pages,
            });
        }
        Command::QueryCount => out_events.push(session.population_updated()),
    }
}

#[derive(Debug)]
enum State {
    Uninitialized { queued: Vec<Command> },
    Ready(Session),
}

/// Worker state machine: `Uninitialized` until a setup command arrives,
/// `Ready` afterwards.
///
/// Commands other than [`Command::QueryCount`] that arrive before setup are
/// queued and replayed in order once the session exists.
#[derive(Debug)]
pub struct Machine {
    config: WorkerConfig,
    state: State,
}

impl Machine {
    /// Creates an uninitialized machine.
    #[must_use]
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            state: State::Uninitialized { queued: Vec::new() },
        }
    }

    /// Reports whether setup has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Ready session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            State::Ready(session) => Some(session),
            State::Uninitialized { .. } => None,
        }
    }

    /// Commands waiting for setup.
    #[must_use]
    pub fn queued(&self) -> usize {
        match &self.state {
            State::Uninitialized { queued } => queued.len(),
            State::Ready(_) => 0,
        }
    }

    /// Handles one command received at `now_us`.
    pub fn handle(&mut self, command: Command, now_us: u64, out_events: &mut Vec<Event>) {
        match &mut self.state {
            State::Ready(session) => apply(session, command, now_us, out_events),
            State::Uninitialized { queued } => match command {
                Command::Setup { variant } => {
                    let backlog = std::mem::take(queued);
                    self.setup(variant, backlog, now_us, out_events);
                }
                Command::QueryCount => debug!("count query dropped before setup"),
                command => queued.push(command),
            },
        }
    }

    fn setup(
        &mut self,
        variant: Variant,
        backlog: Vec<Command>,
        now_us: u64,
        out_events: &mut Vec<Event>,
    ) {
        let mut session = match Session::new(variant, &self.config, now_us) {
            Ok(session) => session,
            Err(error) => {
                warn!(%variant, %error, "setup failed");
                self.state = State::Uninitialized { queued: backlog };
                return;
            }
        };
        info!(%variant, replayed = backlog.len(), "session ready");
        out_events.push(session.population_updated());
        for command in backlog {
            apply(&mut session, command, now_us, out_events);
        }
        self.state = State::Ready(session);
    }

    /// Timer callback: advances the lattice and flushes any score.
    pub fn on_timer(&mut self, now_us: u64, out_events: &mut Vec<Event>) {
        if let State::Ready(session) = &mut self.state {
            session.advance(now_us);
            session.flush(out_events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snail_maze_core::PageBuffer;

    fn ready(variant: Variant) -> (Machine, Vec<Event>) {
        let mut machine = Machine::new(WorkerConfig::new());
        let mut events = Vec::new();
        machine.handle(Command::Setup { variant }, 0, &mut events);
        (machine, events)
    }

    #[test]
    fn setup_reports_the_empty_layout() {
        let (machine, events) = ready(Variant::HoldLeft);
        assert!(machine.is_ready());
        assert_eq!(
            events,
            vec![Event::PopulationUpdated {
                variant: Variant::HoldLeft,
                width_px: 4 * 91,
                height_px: 4 * 91,
                page_count: 0,
            }]
        );
    }

    #[test]
    fn commands_before_setup_are_queued_and_count_queries_dropped() {
        let mut machine = Machine::new(WorkerConfig::new());
        let mut events = Vec::new();
        machine.handle(Command::Resize { delta: 5 }, 0, &mut events);
        machine.handle(Command::QueryCount, 0, &mut events);
        machine.handle(Command::SetWidth { width: 1 }, 0, &mut events);
        assert!(events.is_empty());
        assert_eq!(machine.queued(), 2);

        machine.handle(Command::Setup { variant: Variant::RandomWalk }, 0, &mut events);
        let session = machine.session().expect("ready");
        assert_eq!(query::count(session.lattice()), 5);
        assert_eq!(query::width(session.lattice()), 1);
        let page_counts: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                Event::PopulationUpdated { page_count, .. } => Some(*page_count),
                _ => None,
            })
            .collect();
        assert_eq!(page_counts, vec![0, 1, 2]);
    }

    #[test]
    fn resize_reports_only_page_count_changes() {
        let (mut machine, _) = ready(Variant::RandomWalk);
        let mut events = Vec::new();
        machine.handle(Command::Resize { delta: 3 }, 0, &mut events);
        assert_eq!(events.len(), 1);
        machine.handle(Command::Resize { delta: 3 }, 0, &mut events);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn score_flushes_only_when_nonzero() {
        let (mut machine, _) = ready(Variant::Flying);
        let mut events = Vec::new();
        machine.on_timer(5_000_000, &mut events);
        assert!(events.is_empty(), "empty lattice earns nothing");

        machine.handle(Command::Resize { delta: 2 }, 5_000_000, &mut events);
        events.clear();
        machine.on_timer(5_100_000, &mut events);
        assert!(events.is_empty(), "flight still under way");
        machine.on_timer(7_500_000, &mut events);
        match events.as_slice() {
            [Event::Score {
                variant,
                delta,
                solves,
                solve_counts,
            }] => {
                assert_eq!(*variant, Variant::Flying);
                assert_eq!(*solves, 12);
                assert_eq!(*delta, 12 * Variant::Flying.base_reward());
                assert_eq!(solve_counts, &vec![6, 6]);
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn long_clock_gaps_do_a_bounded_amount_of_work() {
        let (mut machine, _) = ready(Variant::Flying);
        let mut events = Vec::new();
        machine.handle(Command::Resize { delta: 2 }, 0, &mut events);
        machine.handle(Command::SetTickRate { multiplier: u32::MAX }, 0, &mut events);
        events.clear();

        machine.on_timer(3_600_000_000, &mut events);
        let [Event::Score { solves, .. }] = events.as_slice() else {
            panic!("unexpected events {events:?}");
        };
        assert_eq!(*solves, 2 * snail_maze_lattice::MAX_STEPS_PER_TICK * 6);
    }

    #[test]
    fn zero_tick_rate_pauses_the_lattice() {
        let (mut machine, _) = ready(Variant::RandomWalk);
        let mut events = Vec::new();
        machine.handle(Command::Resize { delta: 4 }, 0, &mut events);
        machine.handle(Command::SetTickRate { multiplier: 0 }, 0, &mut events);
        machine.on_timer(60_000_000, &mut events);
        let lattice = machine.session().expect("ready").lattice();
        assert_eq!(query::clock(lattice), 0);
    }

    #[test]
    fn setup_on_a_running_session_rebuilds_the_lattice() {
        let (mut machine, _) = ready(Variant::Flying);
        let mut events = Vec::new();
        machine.handle(Command::Resize { delta: 2 }, 0, &mut events);
        machine.on_timer(2_000_000, &mut events);
        events.clear();

        machine.handle(Command::Setup { variant: Variant::Tremaux }, 2_500_000, &mut events);
        assert!(matches!(
            events.as_slice(),
            [
                Event::Score {
                    variant: Variant::Flying,
                    solves: 12,
                    ..
                },
                Event::PopulationUpdated {
                    variant: Variant::Tremaux,
                    page_count: 0,
                    ..
                },
            ]
        ));
        let lattice = machine.session().expect("ready").lattice();
        assert_eq!(query::variant(lattice), Variant::Tremaux);
        assert_eq!(query::count(lattice), 0);
    }

    #[test]
    fn reset_empties_the_population() {
        let (mut machine, _) = ready(Variant::Tremaux);
        let mut events = Vec::new();
        machine.handle(Command::Resize { delta: 7 }, 0, &mut events);
        machine.handle(Command::Reset, 1_000_000, &mut events);
        let lattice = machine.session().expect("ready").lattice();
        assert_eq!(query::count(lattice), 0);
        assert!(query::solve_counts(lattice).is_empty());
    }

    #[test]
    fn render_requests_return_every_buffer() {
        let (mut machine, _) = ready(Variant::RandomWalk);
        let mut events = Vec::new();
        machine.handle(Command::Resize { delta: 40 }, 0, &mut events);
        let bytes = query::page_bytes(machine.session().expect("ready").lattice());
        events.clear();

        let pages = vec![
            PageBuffer::new(1, vec![0; bytes]),
            PageBuffer::new(0, vec![0; bytes]),
            PageBuffer::new(9, vec![0; bytes]),
        ];
        machine.handle(Command::RequestRender { pages }, 300_000, &mut events);
        let [Event::RenderedPages { pages, .. }] = events.as_slice() else {
            panic!("unexpected events {events:?}");
        };
        let order: Vec<u32> = pages.iter().map(|page| page.page).collect();
        assert_eq!(order, vec![1, 0, 9]);
        assert!(pages[0].buffer.iter().any(|byte| *byte != 0));
        assert!(pages[2].buffer.iter().all(|byte| *byte == 0), "page past the population");
    }
}
