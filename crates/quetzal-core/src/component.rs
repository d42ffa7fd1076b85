use std::fmt;
use std::future::{self, Future};

pub type HookResult = anyhow::Result<()>;
pub type RenderResult = anyhow::Result<String>;

/// Author-facing half of a component.
///
/// Only [`render`](Component::render) is required. Every hook defaults to a
/// no-op, so implement just the ones you need:
///
/// ```rust
/// use quetzal_core::*;
///
/// struct Badge {
///     label: String,
/// }
///
/// impl Component for Badge {
///     async fn before_created(&mut self) -> HookResult {
///         self.label = self.label.to_uppercase();
///         Ok(())
///     }
///
///     fn render(&self) -> RenderResult {
///         Ok(format!("<span>{}</span>", self.label))
///     }
///
///     fn styles(&self) -> &str {
///         "span { font-weight: bold }"
///     }
/// }
/// ```
pub trait Component: 'static {
    /// Runs first. Boundary construction waits until the returned future
    /// resolves; an `Err` stops the instance for good.
    fn before_created(&mut self) -> impl Future<Output = HookResult> {
        future::ready(Ok(()))
    }

    /// The boundary now holds the rendered markup and styles.
    fn created(&mut self) -> HookResult {
        Ok(())
    }

    fn mounted(&mut self) -> HookResult {
        Ok(())
    }

    fn unmounted(&mut self) -> HookResult {
        Ok(())
    }

    /// Complete markup for this instance. Called once, after `before_created`.
    fn render(&self) -> RenderResult;

    /// CSS placed next to the rendered markup. Read once.
    fn styles(&self) -> &str {
        ""
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    BeforeCreated,
    Render,
    Created,
    Mounted,
    Unmounted,
}

impl Hook {
    pub const ALL: [Hook; 5] = [
        Hook::BeforeCreated,
        Hook::Render,
        Hook::Created,
        Hook::Mounted,
        Hook::Unmounted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Hook::BeforeCreated => "before_created",
            Hook::Render => "render",
            Hook::Created => "created",
            Hook::Mounted => "mounted",
            Hook::Unmounted => "unmounted",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Renders nothing. Handy as a placeholder definition.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blank;

impl Component for Blank {
    fn render(&self) -> RenderResult {
        Ok(String::new())
    }
}
