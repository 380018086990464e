#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stoat_core::{Derived, Store, Unsubscriber, Writable, derived};

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Target {
    A,
    B,
    Sum,
    Doubled,
}

#[derive(Arbitrary, Debug)]
enum StoreOp {
    SetA(i8),
    SetB(i8),
    UpdateA(i8),
    Subscribe(Target),
    Unsubscribe(u8),
    UnsubscribeAll,
}

struct Graph {
    a: Writable<i16>,
    b: Writable<i16>,
    sum: Derived<i16>,
    doubled: Derived<i16>,
}

impl Graph {
    fn new() -> Self {
        let a = Writable::new(0i16);
        let b = Writable::new(0i16);
        let sum = derived((a.clone(), b.clone()), |(x, y): (i16, i16)| x.wrapping_add(y))
            .expect("tuple sources are never empty");
        let doubled = sum.pipe(|v| v.wrapping_mul(2));
        Self { a, b, sum, doubled }
    }

    fn subscribe(&self, target: Target, hits: &Rc<Cell<u64>>) -> Unsubscriber {
        let hits = Rc::clone(hits);
        let bump = move |_: &i16| hits.set(hits.get() + 1);
        match target {
            Target::A => self.a.subscribe(bump),
            Target::B => self.b.subscribe(bump),
            Target::Sum => self.sum.subscribe(bump),
            Target::Doubled => self.doubled.subscribe(bump),
        }
    }

    fn check(&self) {
        let expected_sum = self.a.get().wrapping_add(self.b.get());
        if self.sum.subscriber_count() > 0 {
            assert_eq!(self.sum.get(), expected_sum);
        }
        if self.doubled.subscriber_count() > 0 {
            assert_eq!(self.doubled.get(), expected_sum.wrapping_mul(2));
        }
        // A derived store is subscribed to its sources iff it is observed.
        let sum_live = usize::from(self.sum.subscriber_count() > 0);
        assert!(self.a.subscriber_count() >= sum_live);
        assert!(self.b.subscriber_count() >= sum_live);
    }
}

fuzz_target!(|ops: Vec<StoreOp>| {
    let graph = Graph::new();
    let hits = Rc::new(Cell::new(0u64));
    let mut live: Vec<Unsubscriber> = Vec::new();

    for op in ops.into_iter().take(512) {
        match op {
            StoreOp::SetA(v) => graph.a.set(i16::from(v)),
            StoreOp::SetB(v) => graph.b.set(i16::from(v)),
            StoreOp::UpdateA(delta) => graph.a.update(|v| v.wrapping_add(i16::from(delta))),
            StoreOp::Subscribe(target) => {
                let before = hits.get();
                live.push(graph.subscribe(target, &hits));
                assert_eq!(hits.get(), before + 1, "subscribe notifies exactly once");
            }
            StoreOp::Unsubscribe(index) => {
                if !live.is_empty() {
                    let handle = live.remove(usize::from(index) % live.len());
                    handle.unsubscribe();
                    handle.unsubscribe();
                }
            }
            StoreOp::UnsubscribeAll => {
                for handle in live.drain(..) {
                    handle.unsubscribe();
                }
            }
        }
        graph.check();
    }

    for handle in live.drain(..) {
        handle.unsubscribe();
    }
    assert_eq!(graph.a.subscriber_count(), 0);
    assert_eq!(graph.b.subscriber_count(), 0);
    assert_eq!(graph.sum.subscriber_count(), 0);
});
