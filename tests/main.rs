use mockall::predicate::eq;
use reactive_hooks::{computed, Computed, Evaluation, Signal, Value};

mod mock;

use mock::Spy;

fn spied(count: &Signal<i32>, mock: &mock::SharedMock) -> Computed<i32> {
	Computed::new(Box::new({
		let count = count.clone();
		let mock = mock.clone();
		move |cx| {
			let value = *count.get(cx) * 2;
			mock.get().observe(value);
			value
		}
	}))
}

#[test]
fn computed() {
	let count = Signal::new(0);
	let mock = mock::SharedMock::new();
	let doubled = spied(&count, &mock);

	mock.get().expect_observe().with(eq(0)).times(1).return_const(());
	assert_eq!(*doubled.get_once(), 0);
	mock.get().checkpoint();

	mock.get().expect_observe().with(eq(4)).times(1).return_const(());
	count.set(2);
	assert_eq!(*doubled.get_once(), 4);
	assert_eq!(*doubled.get_once(), 4);
	mock.get().checkpoint();
}

#[test]
fn unrelated_write_does_not_invalidate() {
	let count = Signal::new(1);
	let other = Signal::new(10);
	let mock = mock::SharedMock::new();
	let doubled = spied(&count, &mock);

	mock.get().expect_observe().times(1).return_const(());
	assert_eq!(*doubled.get_once(), 2);

	other.set(20);
	assert!(doubled.is_valid());
	assert_eq!(*doubled.get_once(), 2);
	mock.get().checkpoint();
}

#[test]
fn rapid_writes_evaluate_once() {
	let count = Signal::new(0);
	let mock = mock::SharedMock::new();
	let doubled = spied(&count, &mock);

	mock.get().expect_observe().with(eq(0)).times(1).return_const(());
	assert_eq!(*doubled.get_once(), 0);
	mock.get().checkpoint();

	for _ in 0..100 {
		count.update(|v| *v += 1);
	}

	mock.get().expect_observe().with(eq(200)).times(1).return_const(());
	assert_eq!(*doubled.get_once(), 200);
	mock.get().checkpoint();
}

#[derive(Hash)]
struct Outer {
	inner: i32,
	tags: Vec<&'static str>,
}

#[test]
fn nested_mutation_propagates() {
	let outer = Signal::new(Outer {
		inner: 0,
		tags: vec![],
	});
	let doubled = outer.map(|o| o.inner * 2);
	let tagged = computed!((outer) cx => outer.get(cx).tags.len());

	assert_eq!(*doubled.get_once(), 0);
	assert_eq!(*tagged.get_once(), 0);

	outer.update(|o| o.inner = 5);
	assert_eq!(*doubled.get_once(), 10);

	outer.update(|o| o.tags.push("new"));
	assert_eq!(*tagged.get_once(), 1);
}

#[test]
fn chained_computed() {
	let a = Signal::new(1);
	let b = a.map(|a| a + 1);
	let sum = computed!((a, b) cx => *b.get(cx) + *a.get(cx));

	assert_eq!(*sum.get_once(), 3);

	a.set(3);
	assert_eq!(*b.get_once(), 4);
	assert_eq!(*sum.get_once(), 7);
}

#[test]
fn branch_switch_refreshes_dependencies() {
	let flag = Signal::new(true);
	let left = Signal::new(1);
	let right = Signal::new(100);

	let picked = computed!((flag, left, right) cx => {
		if *flag.get(cx) {
			*left.get(cx)
		} else {
			*right.get(cx)
		}
	});

	assert_eq!(*picked.get_once(), 1);
	assert_eq!(right.observers(), 0);

	flag.set(false);
	assert_eq!(*picked.get_once(), 100);
	assert_eq!(left.observers(), 0);
	assert_eq!(right.observers(), 1);

	left.set(2);
	assert!(picked.is_valid());

	right.set(200);
	assert!(!picked.is_valid());
	assert_eq!(*picked.get_once(), 200);
}

#[test]
fn dropped_computed_leaves_signal_pristine() {
	let count = Signal::new(0);
	let doubled = computed!((count) cx => *count.get(cx) * 2);
	let alias = doubled.clone();

	assert_eq!(*doubled.get_once(), 0);
	assert_eq!(count.observers(), 1);

	drop(doubled);
	count.set(1);
	assert_eq!(*alias.get_once(), 2);

	drop(alias);
	assert_eq!(count.observers(), 0);
	count.set(2);
	assert_eq!(*count.get_once(), 2);
}

fn total(cx: &Evaluation, parts: &[Value<i32>]) -> i32 {
	parts.iter().map(|part| *part.get(cx)).sum()
}

#[test]
fn values_mix_signals_and_computeds() {
	let base = Signal::new(2);
	let squared = base.map(|b| b * b);
	let parts: Vec<Value<i32>> = vec![base.clone().into(), squared.into()];

	let sum = computed!((parts) cx => total(cx, &parts));
	assert_eq!(*sum.get_once(), 6);

	base.set(3);
	assert_eq!(*sum.get_once(), 12);
}
