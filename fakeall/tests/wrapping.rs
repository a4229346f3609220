// vim: tw=80
//! Wrapping fakes forward unconfigured calls to a real implementation
use fakeall::*;

#[fake]
trait Counter {
    fn add(&mut self, n: u32) -> u32;
    fn get(&self) -> u32;
    fn label(&self, prefix: &str, out: &mut String);
}

#[derive(Default)]
struct Real {
    total: u32,
}

impl Counter for Real {
    fn add(&mut self, n: u32) -> u32 {
        self.total += n;
        self.total
    }

    fn get(&self) -> u32 {
        self.total
    }

    fn label(&self, prefix: &str, out: &mut String) {
        *out = format!("{}{}", prefix, self.total);
    }
}

#[test]
fn forwards_unconfigured_calls() {
    let fake = FakeCounter::wrapping(Real::default());
    assert_eq!(FakeMode::Wrapping, fake.fake_manager().mode());
    assert_eq!(2, fake.add(2));
    assert_eq!(5, fake.add(3));
    fake.call_to_get().returns(100u32).unwrap();
    assert_eq!(100, fake.get());
    fake.assert_that(FakeCounter::add_call(arg::any::<u32>()))
        .must_have_happened(Repeated::twice())
        .unwrap();
}

#[test]
fn forwarded_ref_parameters() {
    let fake = FakeCounter::wrapping(Real { total: 9 });
    let mut out = String::new();
    fake.label("n=", &mut out);
    assert_eq!("n=9", out);
}

#[test]
fn calls_wrapped_method_from_a_rule() {
    let options = FakeOptions::new()
        .strict()
        .named("strict counter");
    let fake = FakeCounter::wrapping_with(Real { total: 4 }, options).unwrap();
    assert_eq!("strict counter", fake.fake_manager().name());
    fake.call_to_get().calls_wrapped_method().unwrap();
    assert_eq!(4, fake.get());
}

#[test]
#[should_panic(expected = "There is no wrapped instance to forward Counter.get()")]
fn no_wrapped_instance() {
    let fake = FakeCounter::new();
    fake.call_to_get().calls_wrapped_method().unwrap();
    fake.get();
}
