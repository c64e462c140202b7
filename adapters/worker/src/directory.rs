use std::{collections::BTreeMap, ops::Range};

use snail_maze_core::{Command, Event, PageBuffer, Variant};
use tracing::{debug, info};

use crate::{LatticeWorker, WorkerConfig, WorkerError};

/// Latest page geometry reported by a worker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageLayout {
    /// Width of one page in pixels.
    pub width_px: u32,
    /// Height of one page in pixels.
    pub height_px: u32,
    /// Pages needed to show every slot.
    pub page_count: u32,
}

impl PageLayout {
    /// Bytes of one RGBA page buffer.
    #[must_use]
    pub const fn page_bytes(&self) -> usize {
        self.width_px as usize * self.height_px as usize * 4
    }
}

/// Headless owner of one worker per variant.
///
/// Folds worker events into player currency, per-variant layouts and solve
/// counters, and turns a scrolling viewport into render requests. Pages of a
/// variant are stacked vertically starting at offset zero.
#[derive(Debug, Default)]
pub struct Directory {
    workers: BTreeMap<Variant, LatticeWorker>,
    currency: u64,
    layouts: BTreeMap<Variant, PageLayout>,
    solve_counts: BTreeMap<Variant, Vec<u64>>,
    rendered: BTreeMap<Variant, Vec<PageBuffer>>,
}

impl Directory {
    /// Spawns and sets up a worker for every listed variant.
    pub fn new(
        config: WorkerConfig,
        variants: impl IntoIterator<Item = Variant>,
    ) -> Result<Self, WorkerError> {
        let mut directory = Self::default();
        for variant in variants {
            if directory.workers.contains_key(&variant) {
                continue;
            }
            let worker = LatticeWorker::spawn(config);
            worker.send(Command::Setup { variant })?;
            let _ = directory.workers.insert(variant, worker);
        }
        info!(workers = directory.workers.len(), "directory ready");
        Ok(directory)
    }

    /// Variants with a running worker.
    pub fn variants(&self) -> impl Iterator<Item = Variant> + '_ {
        self.workers.keys().copied()
    }

    /// Routes a command to the worker of `variant`.
    pub fn send(&self, variant: Variant, command: Command) -> Result<(), WorkerError> {
        self.workers
            .get(&variant)
            .ok_or(WorkerError::UnknownVariant(variant))?
            .send(command)
    }

    /// Drains every worker's pending events and folds them in. Returns how
    /// many events were processed.
    pub fn pump(&mut self) -> usize {
        let events: Vec<Event> = self.workers.values().flat_map(LatticeWorker::drain).collect();
        let processed = events.len();
        for event in events {
            self.observe(event);
        }
        processed
    }

    /// Folds one worker event into the directory state.
    pub fn observe(&mut self, event: Event) {
        match event {
            Event::Score {
                variant,
                delta,
                solves,
                solve_counts,
            } => {
                self.currency = self.currency.saturating_add(delta);
                debug!(%variant, delta, solves, currency = self.currency, "score received");
                let _ = self.solve_counts.insert(variant, solve_counts);
            }
            Event::RenderedPages { variant, pages } => {
                self.rendered.entry(variant).or_default().extend(pages);
            }
            Event::PopulationUpdated {
                variant,
                width_px,
                height_px,
                page_count,
            } => {
                let _ = self.layouts.insert(
                    variant,
                    PageLayout {
                        width_px,
                        height_px,
                        page_count,
                    },
                );
            }
        }
    }

    /// Total currency earned across every variant.
    #[must_use]
    pub const fn currency(&self) -> u64 {
        self.currency
    }

    /// Latest layout reported for `variant`.
    #[must_use]
    pub fn layout(&self, variant: Variant) -> Option<PageLayout> {
        self.layouts.get(&variant).copied()
    }

    /// Latest per-slot solve counters reported for `variant`.
    #[must_use]
    pub fn solve_counts(&self, variant: Variant) -> &[u64] {
        self.solve_counts.get(&variant).map_or(&[][..], Vec::as_slice)
    }

    /// Hands over every rendered page received for `variant`.
    pub fn take_rendered(&mut self, variant: Variant) -> Vec<PageBuffer> {
        self.rendered.remove(&variant).unwrap_or_default()
    }

    /// Requests the pages of `variant` that intersect the viewport. Returns
    /// the requested page range, empty when nothing is visible or no layout
    /// has been reported yet.
    pub fn request_visible(
        &self,
        variant: Variant,
        viewport_top: u64,
        viewport_height: u64,
    ) -> Result<Range<u32>, WorkerError> {
        let Some(layout) = self.layout(variant) else {
            return Ok(0..0);
        };
        let range = visible_pages(
            layout.height_px,
            layout.page_count,
            viewport_top,
            viewport_height,
        );
        if range.is_empty() {
            return Ok(range);
        }
        let pages = range
            .clone()
            .map(|page| PageBuffer::new(page, vec![0; layout.page_bytes()]))
            .collect();
        self.send(variant, Command::RequestRender { pages })?;
        Ok(range)
    }

    /// Stops every worker.
    pub fn shutdown(self) -> Result<(), WorkerError> {
        self.workers
            .into_values()
            .try_for_each(LatticeWorker::shutdown)
    }
}

/// Pages of height `page_height` intersecting the viewport
/// `[viewport_top, viewport_top + viewport_height)`, clamped to `page_count`.
#[must_use]
pub fn visible_pages(
    page_height: u32,
    page_count: u32,
    viewport_top: u64,
    viewport_height: u64,
) -> Range<u32> {
    if page_height == 0 || page_count == 0 || viewport_height == 0 {
        return 0..0;
    }
    let height = u64::from(page_height);
    let bottom = viewport_top.saturating_add(viewport_height);
    let clamp = |page: u64| u32::try_from(page).unwrap_or(u32::MAX).min(page_count);
    let first = clamp(viewport_top / height);
    let end = clamp(bottom.div_ceil(height));
    first..end.max(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_selects_intersecting_pages() {
        assert_eq!(visible_pages(100, 5, 0, 100), 0..1);
        assert_eq!(visible_pages(100, 5, 0, 101), 0..2);
        assert_eq!(visible_pages(100, 5, 99, 2), 0..2);
        assert_eq!(visible_pages(100, 5, 250, 300), 2..5);
        assert_eq!(visible_pages(100, 5, 100, 100), 1..2);
    }

    #[test]
    fn viewport_past_the_population_selects_nothing() {
        assert_eq!(visible_pages(100, 3, 300, 50), 3..3);
        assert_eq!(visible_pages(100, 3, u64::MAX, u64::MAX), 3..3);
        assert!(visible_pages(100, 0, 0, 500).is_empty());
        assert!(visible_pages(0, 4, 0, 500).is_empty());
        assert!(visible_pages(100, 4, 40, 0).is_empty());
    }

    #[test]
    fn observed_events_fold_into_directory_state() {
        let mut directory = Directory::default();
        directory.observe(Event::PopulationUpdated {
            variant: Variant::Rpg,
            width_px: 333,
            height_px: 444,
            page_count: 2,
        });
        directory.observe(Event::Score {
            variant: Variant::Rpg,
            delta: 121_000,
            solves: 1,
            solve_counts: vec![1, 0],
        });
        directory.observe(Event::Score {
            variant: Variant::Flying,
            delta: u64::MAX,
            solves: 6,
            solve_counts: vec![6],
        });
        directory.observe(Event::RenderedPages {
            variant: Variant::Rpg,
            pages: vec![PageBuffer::new(1, vec![7; 4])],
        });

        assert_eq!(directory.currency(), u64::MAX);
        assert_eq!(
            directory.layout(Variant::Rpg),
            Some(PageLayout {
                width_px: 333,
                height_px: 444,
                page_count: 2,
            })
        );
        assert_eq!(directory.layout(Variant::Flying), None);
        assert_eq!(directory.solve_counts(Variant::Rpg), &[1, 0]);
        assert!(directory.solve_counts(Variant::Clone).is_empty());
        let rendered = directory.take_rendered(Variant::Rpg);
        assert_eq!(rendered.len(), 1);
        assert!(directory.take_rendered(Variant::Rpg).is_empty());
    }

    #[test]
    fn unknown_variants_are_rejected() {
        let directory = Directory::default();
        assert_eq!(
            directory.send(Variant::Clone, Command::QueryCount),
            Err(WorkerError::UnknownVariant(Variant::Clone))
        );
        assert_eq!(directory.request_visible(Variant::Clone, 0, 100), Ok(0..0));
    }
}
