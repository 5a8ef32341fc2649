//! Objects invoked as functions through `$call`

use strata_core::{
    args, DispatchConfig, Extensible, ForkOptions, Implementation, Value, CALL_METHOD,
};
use strata_testkit::{assert_strata_err, CapturedCallback};

fn echo_self() -> Implementation {
    Implementation::labeled("echo-self").method(CALL_METHOD, |call| {
        Ok(call.self_object().cloned().map(Value::from).unwrap_or_default())
    })
}

#[test]
fn self_slot_is_the_callable_duplicate() {
    let base = Extensible::new();
    base.define_method(CALL_METHOD, "", None).unwrap();
    base.use_layer(echo_self());

    let callable = base.fork_callable();
    let result = callable.call(Vec::new()).unwrap();
    assert_eq!(result.as_object(), Some(&callable));
    assert_ne!(result.as_object(), Some(&base));
}

#[test]
fn later_duplicates_do_not_capture_self() {
    let callable = Extensible::new().fork_callable();
    callable.use_layer(echo_self());

    let instance = callable.instance(Vec::new()).unwrap();
    let fork = callable.fork(ForkOptions::callable());

    let from_callable = callable.call(Vec::new()).unwrap();
    assert_eq!(from_callable.as_object(), Some(&callable));
    assert_eq!(instance.call(Vec::new()).unwrap().as_object(), Some(&instance));
    assert_eq!(fork.call(Vec::new()).unwrap().as_object(), Some(&fork));
}

#[test]
fn receiver_binding_is_preserved_for_ordinary_methods() {
    let callable = Extensible::new().fork_callable();
    callable.define_method("name", "", None).unwrap();
    callable.use_layer(Implementation::new().method("name", |call| {
        assert!(call.self_object().is_none());
        Ok(Value::from(call.receiver().id().get()))
    }));

    let id = callable.invoke("name", Vec::new()).unwrap();
    assert_eq!(id.as_i64(), i64::try_from(callable.id().get()).ok());
}

#[test]
fn call_layers_chain_like_any_method() {
    let callable = Extensible::new().fork_callable();
    callable.define_method(CALL_METHOD, "input, cb", None).unwrap();
    callable.use_layer(Implementation::labeled("respond").method(CALL_METHOD, |call| {
        let me = call.self_object().map(|me| me.id().get()).unwrap_or_default();
        match call.named("cb").as_callback() {
            Some(cb) => cb.invoke(vec![Value::null(), Value::from(me)]),
            None => Ok(Value::Undefined),
        }
    }));
    callable.use_layer(Implementation::labeled("passthrough").method(CALL_METHOD, |call| {
        call.next(call.args().to_vec())
    }));

    let done = CapturedCallback::new();
    callable.call(args!["ping", done.callback()]).unwrap();
    assert_eq!(done.last_result(), Some(Value::from(callable.id().get())));
}

#[test]
fn missing_call_implementation_is_rejected() {
    let strict = Extensible::with_config(DispatchConfig::strict()).fork_callable();
    assert_strata_err!(strict.call(Vec::new()), CallNotSupported);

    let lenient = Extensible::new().fork_callable();
    lenient.use_layer(Implementation::labeled("unrelated"));
    assert_strata_err!(lenient.call(Vec::new()), CallNotSupported);

    let plain = Extensible::new();
    plain.use_layer(echo_self());
    assert_strata_err!(plain.call(Vec::new()), CallNotSupported);
}

#[test]
fn callable_passes_as_a_callback() {
    let doubler = Extensible::new().fork_callable();
    doubler.use_layer(Implementation::new().method(CALL_METHOD, |call| {
        Ok(Value::from(call.arg(0).as_i64().unwrap_or(0) * 2))
    }));

    let host = Extensible::new();
    host.define_method("apply", "f, x", None).unwrap();
    host.use_layer(Implementation::new().method("apply", |call| {
        match call.named("f").as_callback() {
            Some(f) => f.invoke(vec![call.named("x").clone()]),
            None => Ok(Value::Undefined),
        }
    }));

    let result = host.invoke("apply", args![doubler.to_callback(), 21]).unwrap();
    assert_eq!(result, Value::from(42));
}
