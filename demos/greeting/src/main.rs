use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use quetzal_core::prelude::*;
use quetzal_devtools::{Inspector, Trace};
use quetzal_platform::{Headless, HeadlessOptions};

type Pending = Rc<RefCell<Vec<oneshot::Sender<String>>>>;

/// Waits for a name before building its boundary.
struct Greeting {
    name: Option<oneshot::Receiver<String>>,
    text: String,
}

impl Component for Greeting {
    async fn before_created(&mut self) -> HookResult {
        if let Some(name) = self.name.take() {
            self.text = format!("Hello, {}!", name.await?);
        }
        Ok(())
    }

    fn mounted(&mut self) -> HookResult {
        log::info!("mounted: {}", self.text);
        Ok(())
    }

    fn render(&self) -> RenderResult {
        Ok(format!("<p class=\"greeting\">{}</p>", self.text))
    }

    fn styles(&self) -> &str {
        ".greeting { font-family: sans-serif; color: #d2691e; }"
    }
}

fn main() -> anyhow::Result<()> {
    let mut env = Headless::new(HeadlessOptions {
        log_filter: Some("info".into()),
        ..Default::default()
    });

    let trace = Trace::new();
    let pending: Pending = Rc::default();
    {
        let trace = trace.clone();
        let pending = pending.clone();
        env.registry_mut().define_with("x-greeting", move || {
            let (tx, rx) = oneshot::channel();
            pending.borrow_mut().push(tx);
            trace.wrap(
                "x-greeting",
                Greeting {
                    name: Some(rx),
                    text: String::new(),
                },
            )
        })?;
    }

    let page = env
        .document()
        .parse("<main><x-greeting></x-greeting><x-greeting></x-greeting></main>");
    env.append_to_body(page)?;
    env.run_until_stalled();
    log::info!("{} greetings waiting for a name", pending.borrow().len());

    let senders: Vec<_> = pending.borrow_mut().drain(..).collect();
    for (tx, name) in senders.into_iter().zip(["Ada", "Grace"]) {
        let _ = tx.send(name.to_string());
    }
    env.run_until_stalled();

    let doc = env.document();
    for node in doc.descendants(doc.body()) {
        if let Some(html) = doc.boundary_html(node) {
            println!("{html}");
        }
    }
    for failure in env.take_errors() {
        log::error!("{failure}");
    }

    println!("{}", Inspector::new(trace).summary());
    Ok(())
}
