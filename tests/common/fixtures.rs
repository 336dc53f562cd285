//! Units used across the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use package_prober::types::{Fault, Instance, LazySeq, Parameter, Signature, TypeDef, Unit, Value};

/// Counts how often a callable body ran.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// `fixture` with two zero-parameter functions `f` and `g`.
pub fn zero_param_unit(f_calls: CallCounter, g_calls: CallCounter) -> Unit {
    Unit::builder("fixture")
        .function("f", Signature::empty(), move |_ctx, _args| {
            f_calls.hit();
            Ok(Value::Int(1))
        })
        .function("g", Signature::empty(), move |_ctx, _args| {
            g_calls.hit();
            Ok(Value::Int(2))
        })
        .build()
}

/// `fixture` with `f(a, b=5)` returning `[a is synthetic, b]`.
pub fn adder_unit() -> Unit {
    Unit::builder("fixture")
        .function(
            "f",
            Signature::new(vec![
                Parameter::positional("a"),
                Parameter::positional("b").with_default(5),
            ]),
            |_ctx, args| {
                Ok(Value::list([
                    Value::Bool(args.value("a")?.is_synthetic()),
                    args.value("b")?.clone(),
                ]))
            },
        )
        .build()
}

/// `fixture` where the first function raises and the second returns.
pub fn raising_unit() -> Unit {
    Unit::builder("fixture")
        .function("explode", Signature::empty(), |_ctx, _args| {
            Err(Fault::new("ValueError", "bad input"))
        })
        .function("after", Signature::empty(), |_ctx, _args| Ok(Value::str("still here")))
        .build()
}

/// `fixture` with a function that only returns after an hour.
pub fn hanging_unit() -> Unit {
    Unit::builder("fixture")
        .function("hang", Signature::empty(), |ctx, _args| {
            ctx.sleep(Duration::from_secs(3600))?;
            Ok(Value::Nothing)
        })
        .function("after", Signature::empty(), |_ctx, _args| Ok(Value::Int(7)))
        .build()
}

/// `fixture` listing type `T` and two functions that return fresh `T`s.
pub fn two_paths_unit(method_calls: CallCounter) -> Unit {
    let ty = TypeDef::builder("fixture", "T")
        .method("poke", Signature::empty(), move |_ctx, _this, _args| {
            method_calls.hit();
            Ok(Value::Nothing)
        })
        .build();
    let first = Arc::clone(&ty);
    let second = Arc::clone(&ty);

    Unit::builder("fixture")
        .type_def(ty)
        .function("make_one", Signature::empty(), move |_ctx, _args| {
            Ok(Value::Instance(Instance::new(Arc::clone(&first))))
        })
        .function("make_two", Signature::empty(), move |_ctx, _args| {
            Ok(Value::Instance(Instance::new(Arc::clone(&second))))
        })
        .build()
}

/// `fixture` with a function returning a lazy sequence of 1, 2, 3.
pub fn lazy_unit() -> Unit {
    Unit::builder("fixture")
        .function("numbers", Signature::empty(), |_ctx, _args| {
            Ok(Value::Lazy(LazySeq::from_values(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
            ])))
        })
        .build()
}

/// `sample` with `greet(name="world")` and a `Counter` type.
pub fn greet_counter_unit() -> Unit {
    let counter = TypeDef::builder("sample", "Counter")
        .init(|_ctx, this, _args| {
            this.set("count", Value::Int(0));
            Ok(())
        })
        .method("increment", Signature::empty(), |_ctx, this, _args| {
            let next = this.get("count").unwrap_or(Value::Int(0)).as_int()? + 1;
            this.set("count", Value::Int(next));
            Ok(Value::Int(next))
        })
        .build();

    Unit::builder("sample")
        .function(
            "greet",
            Signature::new(vec![Parameter::positional("name").with_default("world")]),
            |_ctx, args| Ok(Value::str(format!("hello {}", args.value("name")?.as_str()?))),
        )
        .type_def(counter)
        .build()
}
