//! Integration Tests for Model-Backed Components
//!
//! These tests mount components built with `with_model` and verify the
//! lifecycle end to end: props synchronization, re-render suppression,
//! ref forwarding, statics and disposal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use propmodel_core::host::{observer, Component, NodeRef, Root, Scope, View};
use propmodel_core::{
    props, with_model, Comparer, Memo, Model, ModelBase, ModelError, PropComparers, Signal,
    WithModel, WrapError,
};

props! {
    pub struct CounterProps {
        pub raw_value: i64 => RAW_VALUE,
    }
}

/// `value = raw_value * multiplier`, with the multiplier as internal state.
struct Counter {
    base: ModelBase<CounterProps>,
    multiplier: Signal<i64>,
    value: Memo<i64>,
}

impl Model for Counter {
    type Props = CounterProps;

    fn create() -> Self {
        let base = ModelBase::new();
        let multiplier = Signal::new(10);

        let reader = base.clone();
        let factor = multiplier.clone();
        let value = Memo::new(move || reader.prop(CounterProps::RAW_VALUE) * factor.get());

        Self {
            base,
            multiplier,
            value,
        }
    }

    fn base(&self) -> &ModelBase<CounterProps> {
        &self.base
    }
}

impl Counter {
    fn value(&self) -> i64 {
        self.value.get()
    }

    fn set_multiplier(&self, multiplier: i64) {
        self.multiplier.set(multiplier);
    }
}

/// A counter component that counts its renders and exposes what it was given.
struct CounterHarness {
    renders: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<WithModel<Counter>>>>,
}

impl CounterHarness {
    fn new() -> Self {
        Self {
            renders: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn component(&self) -> Component<CounterProps> {
        let renders = self.renders.clone();
        let seen = self.seen.clone();
        let target = Component::function(move |wm: &WithModel<Counter>, _: &mut Scope<'_>| {
            renders.fetch_add(1, Ordering::SeqCst);
            seen.lock().push(wm.clone());
            View::text(format!("Value: {}", wm.model().value()))
        })
        .with_display_name("Counter");

        with_model(target).unwrap()
    }

    fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    fn model(&self) -> Arc<Counter> {
        let seen = self.seen.lock();
        Arc::clone(seen.last().unwrap().model())
    }
}

/// Prop and internal state changes each re-render exactly once.
#[test]
fn counter_follows_props_and_internal_state() {
    let harness = CounterHarness::new();
    let mut root = Root::new(harness.component());

    root.render(CounterProps { raw_value: 10 });
    assert_eq!(root.text(), "Value: 100");
    assert_eq!(harness.renders(), 1);

    root.render(CounterProps { raw_value: 11 });
    assert_eq!(root.text(), "Value: 110");
    assert_eq!(harness.renders(), 2);

    let model = harness.model();
    root.act(|| model.set_multiplier(100));
    assert_eq!(root.text(), "Value: 1100");
    assert_eq!(harness.renders(), 3);
}

/// A parent re-render with identical props does not render.
#[test]
fn identical_props_skip_the_render() {
    let harness = CounterHarness::new();
    let mut root = Root::new(harness.component());

    root.render(CounterProps { raw_value: 10 });
    for _ in 0..3 {
        root.render(CounterProps { raw_value: 10 });
    }

    assert_eq!(harness.renders(), 1);
    assert_eq!(root.text(), "Value: 100");
}

/// Model and box keep their identity until unmount.
#[test]
fn model_and_box_are_identity_stable() {
    let harness = CounterHarness::new();
    let mut root = Root::new(harness.component());

    root.render(CounterProps { raw_value: 1 });
    root.render(CounterProps { raw_value: 2 });
    let model = harness.model();
    root.act(|| model.set_multiplier(3));
    root.render(CounterProps { raw_value: 4 });

    let seen = harness.seen.lock();
    assert_eq!(seen.len(), 4);
    for wm in seen.iter() {
        assert!(Arc::ptr_eq(wm.model(), seen[0].model()));
        assert!(wm.snapshot().ptr_eq(seen[0].snapshot()));
    }
}

/// A remount starts over with a fresh model.
#[test]
fn remount_creates_a_new_model() {
    let harness = CounterHarness::new();
    let mut root = Root::new(harness.component());

    root.render(CounterProps { raw_value: 1 });
    let first = harness.model();
    root.unmount();

    root.render(CounterProps { raw_value: 1 });
    let second = harness.model();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!first.base().is_initialized());
    assert!(second.base().is_initialized());
}

/// After unmount the accessor fails with "not initialized".
#[test]
fn unmount_disposes_the_model() {
    let harness = CounterHarness::new();
    let mut root = Root::new(harness.component());

    root.render(CounterProps { raw_value: 5 });
    let model = harness.model();
    assert_eq!(model.try_prop(CounterProps::RAW_VALUE), Ok(5));

    root.unmount();
    assert!(!root.is_mounted());

    let err = model.try_prop(CounterProps::RAW_VALUE).unwrap_err();
    assert!(matches!(err, ModelError::NotInitialized { .. }));
    assert!(err.to_string().contains("not initialized"));
}

/// Reading a prop through a model that was never mounted panics.
#[test]
#[should_panic(expected = "not initialized")]
fn detached_model_panics_on_read() {
    let model = Counter::create();
    model.value();
}

props! {
    pub struct LabelProps {
        pub label: String => LABEL,
        pub hint: String => HINT,
    }
}

/// Compares labels case-insensitively and counts how often it derives.
struct Label {
    base: ModelBase<LabelProps>,
    shouted: Memo<String>,
    derivations: Arc<AtomicUsize>,
}

impl Model for Label {
    type Props = LabelProps;

    fn create() -> Self {
        let base = ModelBase::with_comparers(PropComparers::new().with(
            LabelProps::LABEL,
            Comparer::new(|a: &String, b: &String| a.eq_ignore_ascii_case(b)),
        ));

        let derivations = Arc::new(AtomicUsize::new(0));
        let reader = base.clone();
        let counter = derivations.clone();
        let shouted = Memo::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            reader.prop(LabelProps::LABEL).to_uppercase()
        });

        Self {
            base,
            shouted,
            derivations,
        }
    }

    fn base(&self) -> &ModelBase<LabelProps> {
        &self.base
    }
}

fn label(label: &str, hint: &str) -> LabelProps {
    LabelProps {
        label: label.into(),
        hint: hint.into(),
    }
}

type Seen<M> = Arc<Mutex<Option<WithModel<M>>>>;

fn label_component(renders: &Arc<AtomicUsize>, seen: &Seen<Label>) -> Component<LabelProps> {
    let renders = renders.clone();
    let seen = seen.clone();
    with_model(Component::function(
        move |wm: &WithModel<Label>, _: &mut Scope<'_>| {
            renders.fetch_add(1, Ordering::SeqCst);
            *seen.lock() = Some(wm.clone());
            View::text(wm.model().shouted.get())
        },
    ))
    .unwrap()
}

/// Values the comparer calls equal do not recompute dependents.
#[test]
fn comparer_suppresses_equal_values() {
    let renders = Arc::new(AtomicUsize::new(0));
    let seen: Seen<Label> = Arc::default();
    let mut root = Root::new(label_component(&renders, &seen));

    root.render(label("hello", ""));
    root.render(label("HELLO", ""));
    root.render(label("Hello", ""));

    let wm = seen.lock().clone().unwrap();
    assert_eq!(wm.snapshot().revision(), 2);
    assert_eq!(wm.model().derivations.load(Ordering::SeqCst), 1);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(root.text(), "HELLO");

    root.render(label("bye", ""));
    assert_eq!(root.text(), "BYE");
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

/// Changes to props nobody read neither render nor recompute.
#[test]
fn unread_props_are_not_tracked() {
    let renders = Arc::new(AtomicUsize::new(0));
    let seen: Seen<Label> = Arc::default();
    let mut root = Root::new(label_component(&renders, &seen));

    root.render(label("hello", "first"));
    root.render(label("hello", "second"));

    let wm = seen.lock().clone().unwrap();
    assert_eq!(wm.model().base().tracked_keys(), 1);
    assert_eq!(wm.snapshot().read_untracked().hint, "second");
    assert_eq!(wm.model().derivations.load(Ordering::SeqCst), 1);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

/// A re-render with shallow-equal props leaves the box untouched.
#[test]
fn equal_props_do_not_rewrite_the_box() {
    let tick = Signal::new(0);
    let reads = Arc::new(AtomicUsize::new(0));
    let seen: Seen<Label> = Arc::default();

    let source = tick.clone();
    let counter = reads.clone();
    let exported = seen.clone();
    let component = with_model(Component::function(
        move |wm: &WithModel<Label>, _: &mut Scope<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            *exported.lock() = Some(wm.clone());
            View::text(format!("{} #{}", wm.model().shouted.get(), source.get()))
        },
    ))
    .unwrap();

    let mut root = Root::new(component);
    root.render(label("a", "b"));

    // Forces the body to run again with the same props
    root.act(|| tick.set(1));
    root.act(|| tick.set(2));

    let wm = seen.lock().clone().unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 3);
    assert_eq!(wm.snapshot().revision(), 0);
    assert_eq!(wm.model().derivations.load(Ordering::SeqCst), 1);
    assert_eq!(root.text(), "A #2");
}

props! {
    pub struct FieldProps {
        pub placeholder: String => PLACEHOLDER,
    }
}

struct Field {
    base: ModelBase<FieldProps>,
}

impl Model for Field {
    type Props = FieldProps;

    fn create() -> Self {
        Self {
            base: ModelBase::new(),
        }
    }

    fn base(&self) -> &ModelBase<FieldProps> {
        &self.base
    }
}

/// The forwarded ref resolves to the node the target rendered.
#[test]
fn forwarded_ref_resolves_to_the_rendered_node() {
    let target = Component::forward_ref(|wm: &WithModel<Field>, scope: &mut Scope<'_>| {
        View::element("label")
            .child(
                View::element("input")
                    .attr("placeholder", wm.prop(FieldProps::PLACEHOLDER))
                    .node_ref(scope.forwarded_ref()),
            )
            .into()
    });
    let component = with_model(target).unwrap();
    assert!(component.forwards_ref());

    let node_ref = NodeRef::new();
    let mut root = Root::new(component).with_ref(node_ref.clone());
    root.render(FieldProps {
        placeholder: "Name".into(),
    });

    let input = node_ref.get().expect("ref should resolve after the first commit");
    assert_eq!(input.tag(), Some("input"));
    assert_eq!(input.attr("placeholder"), Some("Name"));
    assert!(input.ptr_eq(&root.output().unwrap().children()[0]));

    root.render(FieldProps {
        placeholder: "Email".into(),
    });
    let updated = node_ref.get().unwrap();
    assert_eq!(updated.attr("placeholder"), Some("Email"));
    assert!(!updated.ptr_eq(&input));

    root.unmount();
    assert!(node_ref.get().is_none());
}

/// Wrapping an already memoized target fails at wrap time.
#[test]
fn double_wrap_is_rejected() {
    let target = observer("Field", |_: &WithModel<Field>, _: &mut Scope<'_>| View::Empty).unwrap();

    match with_model(target) {
        Err(WrapError::AlreadyMemoized { component }) => assert_eq!(component, "Field"),
        other => panic!("expected AlreadyMemoized, got {other:?}"),
    }
}

/// A first render that panics leaves no model behind, and the retried mount
/// is disposed on unmount.
#[test]
fn model_from_retried_mount_is_disposed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::<Arc<Counter>>::new()));

    let counter = calls.clone();
    let models = seen.clone();
    let target = Component::function(move |wm: &WithModel<Counter>, _: &mut Scope<'_>| {
        models.lock().push(Arc::clone(wm.model()));
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first render failed");
        }
        View::text(wm.model().value().to_string())
    });
    let mut root = Root::new(with_model(target).unwrap());

    let failed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        root.render(CounterProps { raw_value: 1 });
    }));
    assert!(failed.is_err());
    assert!(!root.is_mounted());

    root.render(CounterProps { raw_value: 2 });
    assert_eq!(root.text(), "20");

    let model = Arc::clone(seen.lock().last().unwrap());
    assert!(!Arc::ptr_eq(&model, &seen.lock()[0]));
    assert!(model.base().is_initialized());

    root.unmount();
    assert!(!model.base().is_initialized());
}

/// Statics are copied onto the wrapper, reserved names excepted.
#[test]
fn statics_are_copied_except_reserved() {
    let target = Component::function(|_: &WithModel<Field>, _: &mut Scope<'_>| View::Empty)
        .with_display_name("Field")
        .with_static("category", "form")
        .with_static("compare", "custom")
        .with_static("default_props", serde_json::json!({ "placeholder": "" }));

    let component = with_model(target).unwrap();
    let statics = component.statics();

    assert_eq!(component.display_name(), Some("WithModel(Field)"));
    assert_eq!(statics.get("category"), Some(&serde_json::json!("form")));
    assert!(statics.get("compare").is_none());
    assert!(statics.get("default_props").is_none());
}
