//! Lifecycle tracing for Quetzal components.
//!
//! Wrap components with [`Trace::wrap`] (or define them through
//! [`Trace::define`]) and read the result back through an [`Inspector`].

mod trace;

use std::collections::BTreeMap;

use serde::Serialize;

use quetzal_core::Hook;

pub use trace::{Trace, TraceEvent, Traced};

/// Per-tag hook call counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HookCounts {
    pub before_created: u32,
    pub render: u32,
    pub created: u32,
    pub mounted: u32,
    pub unmounted: u32,
    pub failures: u32,
}

impl HookCounts {
    fn add(&mut self, event: &TraceEvent) {
        let slot = match event.hook {
            Hook::BeforeCreated => &mut self.before_created,
            Hook::Render => &mut self.render,
            Hook::Created => &mut self.created,
            Hook::Mounted => &mut self.mounted,
            Hook::Unmounted => &mut self.unmounted,
        };
        *slot += 1;
        if !event.ok {
            self.failures += 1;
        }
    }

    /// Instances of this tag currently in the tree, going by the counts.
    pub fn live(&self) -> u32 {
        self.mounted.saturating_sub(self.unmounted)
    }
}

#[derive(Serialize)]
struct Report<'a> {
    counts: &'a BTreeMap<String, HookCounts>,
    events: &'a [TraceEvent],
}

pub struct Inspector {
    pub enabled: bool,
    trace: Trace,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(Trace::new())
    }
}

impl Inspector {
    pub fn new(trace: Trace) -> Self {
        Self {
            enabled: true,
            trace,
        }
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn counts(&self) -> BTreeMap<String, HookCounts> {
        let mut counts: BTreeMap<String, HookCounts> = BTreeMap::new();
        for event in self.trace.events() {
            counts.entry(event.tag.clone()).or_default().add(&event);
        }
        counts
    }

    /// One line per tag.
    pub fn summary(&self) -> String {
        self.counts()
            .iter()
            .map(|(tag, c)| {
                format!(
                    "<{tag}> created {}  |  mounted {}  |  unmounted {}  |  failed {}",
                    c.created, c.mounted, c.unmounted, c.failures
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let counts = self.counts();
        let events = self.trace.events();
        serde_json::to_string_pretty(&Report {
            counts: &counts,
            events: &events,
        })
    }

    /// Logs the summary at info level when enabled.
    pub fn report(&self) {
        if !self.enabled {
            return;
        }
        for line in self.summary().lines() {
            log::info!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quetzal_core::dom::Document;
    use quetzal_core::{Component, HookResult, Instance, Registry, RenderResult};

    #[derive(Default)]
    struct Card;

    impl Component for Card {
        fn render(&self) -> RenderResult {
            Ok("<div>card</div>".into())
        }
    }

    #[derive(Default)]
    struct Broken;

    impl Component for Broken {
        async fn before_created(&mut self) -> HookResult {
            anyhow::bail!("no data")
        }

        fn render(&self) -> RenderResult {
            Ok(String::new())
        }
    }

    #[test]
    fn test_traced_hook_order() {
        let trace = Trace::new();
        let doc = Document::new();
        let node = doc.create_element("x-card");
        let instance = Instance::new(trace.wrap("x-card", Card), doc.clone(), node);

        pollster::block_on(instance.activate()).unwrap();
        instance.connected().unwrap();
        instance.disconnected().unwrap();

        assert_eq!(
            trace.hooks_for("x-card"),
            vec![
                Hook::BeforeCreated,
                Hook::Render,
                Hook::Created,
                Hook::Mounted,
                Hook::Unmounted
            ]
        );
        assert!(trace.events().iter().all(|e| e.ok));
        assert_eq!(
            doc.boundary_html(node).as_deref(),
            Some("<div>card<style></style></div>")
        );
    }

    #[test]
    fn test_counts_and_failures() {
        let trace = Trace::new();
        let mut registry: Registry<Document> = Registry::new();
        trace.define::<Card, _>(&mut registry, "x-card").unwrap();
        trace.define::<Broken, _>(&mut registry, "x-broken").unwrap();

        let doc = Document::new();
        for tag in ["x-card", "x-card", "x-broken"] {
            let node = doc.create_element(tag);
            let instance = registry.create(tag, doc.clone(), node).unwrap();
            let _ = pollster::block_on(instance.activate());
            instance.connected().unwrap();
        }

        let inspector = Inspector::new(trace.clone());
        let counts = inspector.counts();
        assert_eq!(
            counts["x-card"],
            HookCounts {
                before_created: 2,
                render: 2,
                created: 2,
                mounted: 2,
                unmounted: 0,
                failures: 0,
            }
        );
        assert_eq!(counts["x-card"].live(), 2);
        assert_eq!(
            counts["x-broken"],
            HookCounts {
                before_created: 1,
                failures: 1,
                ..HookCounts::default()
            }
        );
        assert_eq!(
            inspector.summary(),
            "<x-broken> created 0  |  mounted 0  |  unmounted 0  |  failed 1\n\
             <x-card> created 2  |  mounted 2  |  unmounted 0  |  failed 0"
        );
    }

    #[test]
    fn test_json_report() {
        let trace = Trace::new();
        trace.record("x-a", Hook::Render, true);
        trace.record("x-a", Hook::Created, false);

        let json = Inspector::new(trace).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["counts"]["x-a"]["render"], 1);
        assert_eq!(value["counts"]["x-a"]["failures"], 1);
        assert_eq!(value["events"][0]["hook"], "render");
        assert_eq!(value["events"][1]["ok"], false);
        assert!(value["events"][0]["at_ms"].is_f64());
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut inspector = Inspector::default();
        inspector.trace().record("x-a", Hook::Mounted, true);
        inspector.toggle();
        assert!(!inspector.enabled);
        inspector.report();

        inspector.trace().clear();
        assert!(inspector.trace().is_empty());
        assert_eq!(inspector.summary(), "");
    }
}
