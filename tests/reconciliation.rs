use std::{cell::RefCell, rc::Rc};

use ripple::{
    Config, Dispatch, DuplicateKeyPolicy, Event, HandlerId, Listener, ObservableObject, Patch,
    PatchOp, PatchSink, ReconcileError, Runtime, State, VNode,
};
use ripple_memory::MemoryHost;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Registered(HandlerId),
    Retired(HandlerId),
    Patch(&'static str),
}

#[derive(Debug, Default)]
struct Journal {
    host: MemoryHost,
    steps: Vec<Step>,
}

impl PatchSink for Journal {
    fn apply_patch(&mut self, patch: Patch) {
        self.steps.push(Step::Patch(patch.op.name()));
        self.host.apply_patch(patch);
    }

    fn handler_registered(&mut self, id: HandlerId, listener: &Listener) {
        self.steps.push(Step::Registered(id));
        self.host.handler_registered(id, listener);
    }

    fn handler_retired(&mut self, id: HandlerId) {
        self.steps.push(Step::Retired(id));
        self.host.handler_retired(id);
    }
}

fn shared<T>(value: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(value))
}

#[test]
fn counter_renders_and_coalesces_writes() {
    let mut runtime = Runtime::default();
    let host = shared(MemoryHost::new());
    let count = State::new(0);

    let root = runtime.mount_fn(
        {
            let count = count.clone();
            move || VNode::element("p").child(VNode::text(count.read().to_string()))
        },
        host.clone(),
    );
    root.observe(&count);
    assert_eq!(runtime.flush().cycles, 1);
    assert_eq!(host.borrow().render_html(), "<p>0</p>");
    host.borrow_mut().take_applied();

    for value in 1..=5 {
        count.write(value);
    }
    let report = runtime.flush();

    assert_eq!(report.cycles, 1);
    assert_eq!(
        host.borrow().applied(),
        [Patch::new([0].into(), PatchOp::SetText("5".into()))]
    );
    assert_eq!(host.borrow().render_html(), "<p>5</p>");
    assert!(runtime.flush().is_empty());
}

#[test]
fn removed_handlers_are_retired_before_the_patches() {
    let mut runtime = Runtime::default();
    let journal = shared(Journal::default());
    let show = State::new(true);
    let clicks = State::new(0);
    let listener = {
        let clicks = clicks.clone();
        Listener::new(move |_: &Event| clicks.update(|count| *count += 1))
    };
    let id = listener.id();

    let root = runtime.mount_fn(
        {
            let show = show.clone();
            move || {
                let panel = VNode::element("div");
                if show.read() {
                    panel.child(VNode::element("button").on("click", listener.clone()))
                } else {
                    panel
                }
            }
        },
        journal.clone(),
    );
    root.observe(&show);
    runtime.flush();
    assert_eq!(
        journal.borrow().steps,
        [Step::Registered(id), Step::Patch("replace")]
    );
    assert_eq!(journal.borrow().host.handler_at(&[0], "click"), Some(id));
    assert!(runtime.dispatch(id, &Event::new("click")).is_delivered());
    assert_eq!(clicks.read(), 1);

    journal.borrow_mut().steps.clear();
    show.write(false);
    runtime.flush();

    assert_eq!(
        journal.borrow().steps,
        [Step::Retired(id), Step::Patch("remove-child")]
    );
    assert!(!journal.borrow().host.is_bound(id));
    assert!(!runtime.context().is_registered(id));

    assert_eq!(runtime.dispatch(id, &Event::new("click")), Dispatch::Stale);
    assert_eq!(clicks.read(), 1);
    assert_eq!(runtime.context().diagnostics().counters().stale_dispatches, 1);
    assert!(matches!(
        runtime.context().diagnostics().recent().last(),
        Some(ReconcileError::HandlerNotFound(stale)) if *stale == id
    ));
}

#[test]
fn handler_swap_updates_props_without_remounting() {
    let mut runtime = Runtime::default();
    let host = shared(MemoryHost::new());
    let version = State::new(0);

    let root = runtime.mount_fn(
        {
            let version = version.clone();
            move || {
                let _ = version.read();
                VNode::element("button").on("click", Listener::new(|_: &Event| {}))
            }
        },
        host.clone(),
    );
    root.observe(&version);
    runtime.flush();
    let first = host.borrow().handler_at(&[], "click").unwrap();
    let node = host.borrow().root().unwrap().id();

    version.write(1);
    runtime.flush();

    let second = host.borrow().handler_at(&[], "click").unwrap();
    assert_ne!(first, second);
    assert_eq!(host.borrow().root().unwrap().id(), node);
    assert_eq!(runtime.context().handler_count(), 1);
    assert_eq!(runtime.dispatch(first, &Event::new("click")), Dispatch::Stale);
    assert!(runtime.dispatch(second, &Event::new("click")).is_delivered());
}

#[test]
fn handlers_may_write_state_of_other_roots() {
    let mut runtime = Runtime::default();
    let left = shared(MemoryHost::new());
    let right = shared(MemoryHost::new());
    let total = State::new(0);

    let button = runtime.mount_fn(
        {
            let total = total.clone();
            let listener = Listener::new(move |_: &Event| total.update(|value| *value += 10));
            move || VNode::element("button").on("click", listener.clone())
        },
        left.clone(),
    );
    let label = runtime.mount_fn(
        {
            let total = total.clone();
            move || VNode::text(total.read().to_string())
        },
        right.clone(),
    );
    label.observe(&total);
    assert_eq!(runtime.flush().cycles, 2);

    let click = left.borrow().handler_at(&[], "click").unwrap();
    runtime.dispatch(click, &Event::new("click"));
    runtime.dispatch(click, &Event::new("click"));
    let report = runtime.flush();

    assert_eq!(report.cycles, 1);
    assert_eq!(right.borrow().render_html(), "20");
    assert_eq!(runtime.context().mounted_roots(), 2);
    drop(button);
}

#[test]
fn unmounting_retires_every_handler() {
    let mut runtime = Runtime::default();
    let journal = shared(Journal::default());
    let listeners: Vec<Listener> = (0..3).map(|_| Listener::new(|_: &Event| {})).collect();
    let ids: Vec<HandlerId> = listeners.iter().map(Listener::id).collect();

    let root = runtime.mount_fn(
        move || {
            VNode::element("ul").children(
                listeners
                    .iter()
                    .enumerate()
                    .map(|(index, listener)| {
                        VNode::element("li").key(index).on("click", listener.clone())
                    }),
            )
        },
        journal.clone(),
    );
    runtime.flush();
    assert_eq!(runtime.context().handler_count(), 3);
    journal.borrow_mut().steps.clear();

    root.unmount();
    let report = runtime.flush();

    assert_eq!(report.teardowns, 1);
    assert_eq!(report.cycles, 0);
    assert_eq!(runtime.context().handler_count(), 0);
    assert_eq!(runtime.context().diagnostics().counters().teardowns, 1);
    let mut retired: Vec<_> = journal
        .borrow()
        .steps
        .iter()
        .filter_map(|step| match step {
            Step::Retired(id) => Some(*id),
            _ => None,
        })
        .collect();
    retired.sort();
    let mut expected = ids;
    expected.sort();
    assert_eq!(retired, expected);
    assert_eq!(runtime.dispatch(expected[0], &Event::new("click")), Dispatch::Stale);
}

#[test]
fn keyed_reorder_keeps_host_nodes() {
    let mut runtime = Runtime::default();
    let host = shared(MemoryHost::new());
    let items = State::new(vec!["a", "b", "c", "d"]);

    let root = runtime.mount_fn(
        {
            let items = items.clone();
            move || {
                VNode::element("ul").children(items.read().into_iter().map(|item| {
                    VNode::element("li").key(item).child(VNode::text(item))
                }))
            }
        },
        host.clone(),
    );
    root.observe(&items);
    runtime.flush();
    let ids: Vec<_> = (0..4)
        .map(|index| host.borrow().node_at(&[index]).unwrap().id())
        .collect();
    host.borrow_mut().take_applied();

    items.write(vec!["d", "a", "b", "c"]);
    runtime.flush();

    let applied = host.borrow_mut().take_applied();
    assert_eq!(applied.len(), 1);
    assert!(matches!(applied[0].op, PatchOp::MoveChild { to: 0, .. }));
    assert_eq!(
        host.borrow().render_html(),
        "<ul><li>d</li><li>a</li><li>b</li><li>c</li></ul>"
    );
    assert_eq!(host.borrow().node_at(&[0]).unwrap().id(), ids[3]);
    assert_eq!(host.borrow().node_at(&[1]).unwrap().id(), ids[0]);
}

#[test]
fn duplicate_keys_are_reported_and_still_rendered() {
    for policy in [DuplicateKeyPolicy::Shadow, DuplicateKeyPolicy::Positional] {
        let mut runtime = Runtime::new(Config::default().with_duplicate_keys(policy));
        let host = shared(MemoryHost::with_policy(policy));
        let labels = State::new(vec!["x", "y"]);

        let root = runtime.mount_fn(
            {
                let labels = labels.clone();
                move || {
                    VNode::element("ul").children(
                        labels
                            .read()
                            .into_iter()
                            .map(|label| VNode::element("li").key(1).child(VNode::text(label))),
                    )
                }
            },
            host.clone(),
        );
        root.observe(&labels);
        runtime.flush();
        labels.write(vec!["y", "x", "z"]);
        runtime.flush();

        assert!(host.borrow().errors().is_empty());
        assert_eq!(
            host.borrow().render_html(),
            "<ul><li>y</li><li>x</li><li>z</li></ul>"
        );
        let diagnostics = runtime.context().diagnostics();
        assert_eq!(diagnostics.counters().structural_ambiguities, 2);
        assert!(matches!(
            diagnostics.recent().next(),
            Some(ReconcileError::StructuralAmbiguity { count: 2, .. })
        ));
    }
}

#[test]
fn observable_object_batches_field_writes() {
    let mut runtime = Runtime::default();
    let host = shared(MemoryHost::new());
    let profile = ObservableObject::new();
    let name = profile.field("name", String::from("ada"));
    let age = profile.field("age", 36);

    let root = runtime.mount_fn(
        {
            let name = name.clone();
            let age = age.clone();
            move || VNode::text(format!("{} ({})", name.read(), age.read()))
        },
        host.clone(),
    );
    root.observe(&profile);
    runtime.flush();

    profile.mutate(|| {
        name.write(String::from("grace"));
        age.write(45);
    });
    assert_eq!(profile.last_changed(), ["name", "age"]);
    assert_eq!(runtime.flush().cycles, 1);
    assert_eq!(host.borrow().render_html(), "grace (45)");
}
