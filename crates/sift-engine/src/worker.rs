//! Item accumulation, filtering, and streaming load management.
//!
//! One worker per session. Loads either fill the item buffer at once or
//! stream through a task pump; every view the session renders comes out of
//! `filter_items` against the current prompt input.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use sift_core::item::{spans_from_indices, Item};
use sift_core::matcher::{
    compile_terms, fuzzy_match_terms, parse_terms, regex_match, strict_match, MatcherKind,
};
use sift_core::options::ListOptions;

use crate::provider::{ListContext, ListProvider, LoadResult, ProviderError, TaskEvent, TaskHandle};

/// Streamed batches flush once this many items are pending...
const FLUSH_COUNT: usize = 500;
/// ...or this much time has passed since the last flush.
const FLUSH_INTERVAL: Duration = Duration::from_millis(200);

/// One view-change event: a filtered item set for the surface.
#[derive(Debug)]
pub struct ItemsBatch {
    pub items: Vec<Item>,
    /// Extend the current view instead of replacing it.
    pub append: bool,
    /// This batch comes from an explicit reload.
    pub reload: bool,
    /// No more batches will follow for this load cycle.
    pub finished: bool,
}

/// Events the worker raises toward the host loop.
#[derive(Debug)]
pub enum WorkerEvent {
    Items(ItemsBatch),
    Loading(bool),
    /// Raw streaming event, tagged with the load generation that produced
    /// it. The session routes these back into `on_task_event`.
    Task { generation: u64, event: TaskEvent },
}

/// What applying a task event did.
#[derive(Debug, PartialEq)]
pub enum TaskOutcome {
    /// Stale generation or canceled load; nothing happened.
    Ignored,
    Progress,
    Finished,
    Failed(String),
}

struct StreamState {
    reload: bool,
    last_flush: Instant,
}

pub struct Worker {
    events: UnboundedSender<WorkerEvent>,
    items: Vec<Item>,
    loading: bool,
    token: Option<CancellationToken>,
    pub(crate) generation: u64,
    /// Input the last flush was filtered against; appends are only valid
    /// while it matches the live input.
    last_flush_input: Option<String>,
    /// Number of accumulated items already reflected in the view.
    taken: usize,
    stream: Option<StreamState>,
    extended: bool,
}

impl Worker {
    pub fn new(events: UnboundedSender<WorkerEvent>, extended: bool) -> Self {
        Self {
            events,
            items: Vec::new(),
            loading: false,
            token: None,
            generation: 0,
            last_flush_input: None,
            taken: 0,
            stream: None,
            extended,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Invalidate any in-flight load and ask the provider for items. The
    /// previous cancellation token is canceled before the provider runs.
    pub fn load_items(
        &mut self,
        provider: &mut dyn ListProvider,
        context: &ListContext,
        reload: bool,
        now: Instant,
    ) -> Result<(), ProviderError> {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.stream = None;
        // every load gets a fresh tag, even atomic ones, so events from a
        // superseded stream can never slip past the generation guard
        self.generation += 1;
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        self.set_loading(true);
        let result = match provider.load(context, &token) {
            Ok(result) => result,
            Err(err) => {
                self.set_loading(false);
                return Err(err);
            }
        };
        match result {
            None => {
                self.items.clear();
                self.set_loading(false);
                self.flush_full(context, reload, true);
            }
            Some(LoadResult::Items(mut items)) => {
                for item in &mut items {
                    item.convert_label();
                }
                debug!(count = items.len(), "atomic load");
                self.items = items;
                self.set_loading(false);
                self.flush_full(context, reload, true);
            }
            Some(LoadResult::Stream(task)) => {
                self.items.clear();
                self.taken = 0;
                self.last_flush_input = None;
                self.stream = Some(StreamState {
                    reload,
                    last_flush: now,
                });
                self.spawn_pump(task, token);
            }
        }
        Ok(())
    }

    fn spawn_pump(&self, mut task: TaskHandle, token: CancellationToken) {
        let sender = self.events.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        task.dispose();
                        break;
                    }
                    event = task.events.recv() => {
                        let event = event.unwrap_or(TaskEvent::End);
                        let last = matches!(event, TaskEvent::End | TaskEvent::Error(_));
                        if sender.send(WorkerEvent::Task { generation, event }).is_err() {
                            task.dispose();
                            break;
                        }
                        if last {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Apply one streaming event. Events from a superseded load are ignored.
    pub fn on_task_event(
        &mut self,
        generation: u64,
        event: TaskEvent,
        context: &ListContext,
        now: Instant,
    ) -> TaskOutcome {
        let canceled = self.token.as_ref().map_or(true, |t| t.is_cancelled());
        if generation != self.generation || canceled {
            return TaskOutcome::Ignored;
        }
        match event {
            TaskEvent::Item(mut item) => {
                item.convert_label();
                self.items.push(item);
                self.maybe_flush(context, now);
                TaskOutcome::Progress
            }
            TaskEvent::End => {
                self.set_loading(false);
                self.flush_stream(context, now, true);
                self.stream = None;
                TaskOutcome::Finished
            }
            TaskEvent::Error(message) => {
                self.stop();
                TaskOutcome::Failed(message)
            }
        }
    }

    fn maybe_flush(&mut self, context: &ListContext, now: Instant) {
        let Some(stream) = &self.stream else { return };
        let pending = self.items.len() - self.taken;
        if pending >= FLUSH_COUNT || now.duration_since(stream.last_flush) >= FLUSH_INTERVAL {
            self.flush_stream(context, now, false);
        }
    }

    fn flush_stream(&mut self, context: &ListContext, now: Instant, finished: bool) {
        let reload = self.stream.as_ref().map_or(false, |s| s.reload);
        let same_input = self.last_flush_input.as_deref() == Some(context.input.as_str());
        if same_input && self.taken > 0 {
            // the view is already filtered on this input; only the new tail
            // needs to go out
            let fresh = filter_items(
                &self.items[self.taken..],
                &context.input,
                &context.options,
                self.extended,
            );
            self.emit(ItemsBatch {
                items: fresh,
                append: true,
                reload,
                finished,
            });
        } else {
            let view = filter_items(&self.items, &context.input, &context.options, self.extended);
            self.emit(ItemsBatch {
                items: view,
                append: false,
                reload,
                finished,
            });
        }
        self.taken = self.items.len();
        self.last_flush_input = Some(context.input.clone());
        if let Some(stream) = &mut self.stream {
            stream.last_flush = now;
        }
    }

    fn flush_full(&mut self, context: &ListContext, reload: bool, finished: bool) {
        let view = filter_items(&self.items, &context.input, &context.options, self.extended);
        self.taken = self.items.len();
        self.last_flush_input = Some(context.input.clone());
        self.emit(ItemsBatch {
            items: view,
            append: false,
            reload,
            finished,
        });
    }

    /// Recompute the view from accumulated items against the current input,
    /// without touching the provider.
    pub fn draw_items(&mut self, context: &ListContext) {
        let view = filter_items(&self.items, &context.input, &context.options, self.extended);
        self.taken = self.items.len();
        self.last_flush_input = Some(context.input.clone());
        self.emit(ItemsBatch {
            items: view,
            append: false,
            reload: false,
            finished: !self.loading,
        });
    }

    /// Cancel the in-flight load, if any. Idempotent.
    pub fn stop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.stream = None;
        self.generation += 1;
        if self.loading {
            self.set_loading(false);
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        let _ = self.events.send(WorkerEvent::Loading(loading));
    }

    fn emit(&self, batch: ItemsBatch) {
        let _ = self.events.send(WorkerEvent::Items(batch));
    }
}

// ── filtering ──

fn recent(item: &Item) -> f64 {
    item.recent_score.unwrap_or(-1.0)
}

fn compare_tied(a: &Item, b: &Item) -> Ordering {
    match (a.sort_text.as_deref(), b.sort_text.as_deref()) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.label.cmp(&b.label))
}

/// Attach search highlight spans for matched character indices of the
/// item's filter text, mapped onto the label where they differ.
fn apply_search_spans(item: &mut Item, indices: &[usize]) {
    item.clear_search_highlights();
    if indices.is_empty() {
        return;
    }
    let text = item.filter_label().to_string();
    if text == item.label {
        let spans = spans_from_indices(&item.label, indices);
        item.highlights.extend(spans);
    } else if let Some(byte) = item.label.find(&text) {
        let offset = item.label[..byte].chars().count();
        let shifted: Vec<usize> = indices.iter().map(|i| i + offset).collect();
        let spans = spans_from_indices(&item.label, &shifted);
        item.highlights.extend(spans);
    }
    // filter text not present in the label: matched, but nothing to mark
}

/// Pure view computation: identical (items, input, options) always produce
/// identical ordering and spans.
pub fn filter_items(
    items: &[Item],
    input: &str,
    options: &ListOptions,
    extended: bool,
) -> Vec<Item> {
    if options.interactive {
        // interactive lists are filtered by the provider; only highlight
        let terms = if extended {
            parse_terms(input)
        } else if input.is_empty() {
            Vec::new()
        } else {
            vec![input.to_string()]
        };
        return items
            .iter()
            .map(|item| {
                let mut out = item.clone();
                match fuzzy_match_terms(out.filter_label(), &terms) {
                    Some(res) if !terms.is_empty() => apply_search_spans(&mut out, &res.matches),
                    _ => out.clear_search_highlights(),
                }
                out
            })
            .collect();
    }
    if input.is_empty() {
        let mut view: Vec<Item> = items
            .iter()
            .map(|item| {
                let mut out = item.clone();
                out.clear_search_highlights();
                out
            })
            .collect();
        if options.sort && view.iter().any(|i| i.recent_score.is_some()) {
            view.sort_by(|a, b| recent(b).partial_cmp(&recent(a)).unwrap_or(Ordering::Equal));
        }
        return view;
    }
    let terms = if extended {
        parse_terms(input)
    } else {
        vec![input.to_string()]
    };
    match options.matcher {
        MatcherKind::Fuzzy => {
            let mut scored: Vec<(f64, Item)> = Vec::new();
            for item in items {
                if !item.filterable() {
                    continue;
                }
                if let Some(res) = fuzzy_match_terms(item.filter_label(), &terms) {
                    let mut out = item.clone();
                    apply_search_spans(&mut out, &res.matches);
                    scored.push((res.score, out));
                }
            }
            if options.sort {
                scored.sort_by(|a, b| {
                    b.0.partial_cmp(&a.0)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| {
                            recent(&b.1)
                                .partial_cmp(&recent(&a.1))
                                .unwrap_or(Ordering::Equal)
                        })
                        .then_with(|| compare_tied(&a.1, &b.1))
                });
            }
            scored.into_iter().map(|(_, item)| item).collect()
        }
        MatcherKind::Strict => items
            .iter()
            .filter(|item| item.filterable())
            .filter_map(|item| {
                strict_match(item.filter_label(), &terms, options.ignore_case).map(|res| {
                    let mut out = item.clone();
                    apply_search_spans(&mut out, &res.matches);
                    out
                })
            })
            .collect(),
        MatcherKind::Regex => {
            let regexes = compile_terms(&terms, options.ignore_case);
            items
                .iter()
                .filter(|item| item.filterable())
                .filter_map(|item| {
                    regex_match(item.filter_label(), &regexes).map(|res| {
                        let mut out = item.clone();
                        apply_search_spans(&mut out, &res.matches);
                        out
                    })
                })
                .collect()
        }
    }
}
