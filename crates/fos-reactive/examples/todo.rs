//! Example: a todo list driven by binding attributes
//!
//! Run with `RUST_LOG=fos_reactive=debug` to see activation and rebuild logs.

use std::rc::Rc;

use fos_reactive::{Activation, ReactiveDom, Registry, Signal};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const PAGE: &str = r#"
<main>
  <input id="draft" bind:value="draft">
  <p bind:text="draft"></p>
  <ul id="todos">
    <li foreach="todos" data-id="${index}" class:compact="compact" onclick="toggle">
      <span>${item.title}</span>
      <input type="checkbox" value="${item.title}" bind:group="done">
    </li>
  </ul>
  <p id="empty" if="nothing_left">All done!</p>
</main>
"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let doc = Rc::new(fos_html::parse(PAGE)?);
    let dom = ReactiveDom::new(doc.clone());

    let todos = Signal::new(json!([
        {"title": "write parser"},
        {"title": "bind signals"}
    ]));
    let done = Signal::new(json!([]));
    let nothing_left = Signal::new(false);
    let draft = Signal::new("");

    // Keep the "all done" banner in step with the checkbox group.
    {
        let todos = todos.clone();
        let nothing_left = nothing_left.clone();
        done.subscribe(move |change| {
            let total = todos.with(|v| v.as_array().map_or(0, Vec::len));
            let finished = change.new.as_array().map_or(0, Vec::len);
            nothing_left.set(total > 0 && finished >= total);
        });
    }

    let data = Registry::new()
        .with_signal("todos", todos.clone())
        .with_signal("done", done.clone())
        .with_signal("nothing_left", nothing_left)
        .with_signal("compact", Signal::new(true))
        .with_signal("draft", draft.clone())
        .with_handler("toggle", |_event, index, item, _todos| {
            tracing::info!("clicked todo {} ({})", index, item["title"]);
        });
    let scope = dom.activate(Activation::Implicit, data)?;
    println!("{}", fos_html::outer_html(&doc, doc.body()));

    // Type a new todo and append it.
    let input = doc.get_element_by_id("draft").ok_or_else(|| anyhow::anyhow!("no draft input"))?;
    doc.input(input, "ship it")?;
    let title = draft.get();
    todos.update(|v| {
        if let Some(list) = v.as_array_mut() {
            list.push(json!({ "title": title }));
        }
    });
    draft.set("");

    // Tick every box.
    let list = doc.get_element_by_id("todos").ok_or_else(|| anyhow::anyhow!("no list"))?;
    for li in doc.element_children(list) {
        for child in doc.element_children(li) {
            if doc.input_type(child).as_deref() == Some("checkbox") {
                doc.click(child)?;
            }
        }
    }
    println!("done: {}", done.get());
    println!("{}", fos_html::outer_html(&doc, doc.body()));

    scope.dispose();
    Ok(())
}
