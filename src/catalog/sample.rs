//! `sample`: a small, well-behaved package.

use std::sync::Arc;

use prober_types::{Instance, LazySeq, Parameter, Signature, TypeDef, Unit, Value};

use crate::package::UnitLoad;

const UNIT: &str = "sample";

fn counter() -> Arc<TypeDef> {
    TypeDef::builder(UNIT, "Counter")
        .constructor_signature(Signature::new(vec![
            Parameter::positional("start").with_default(0)
        ]))
        .init(|_ctx, this, args| {
            this.set("count", Value::Int(args.value("start")?.as_int()?));
            Ok(())
        })
        .method("increment", Signature::empty(), |_ctx, this, _args| {
            let next = this.get("count").unwrap_or(Value::Int(0)).as_int()? + 1;
            this.set("count", Value::Int(next));
            Ok(Value::Int(next))
        })
        .method(
            "advance",
            Signature::new(vec![Parameter::positional("amount")]),
            |_ctx, this, args| {
                let next = this.get("count").unwrap_or(Value::Int(0)).as_int()?
                    + args.value("amount")?.as_int()?;
                this.set("count", Value::Int(next));
                Ok(Value::Int(next))
            },
        )
        .method("reset", Signature::empty(), |_ctx, this, _args| {
            this.set("count", Value::Int(0));
            Ok(Value::Nothing)
        })
        .build()
}

/// Only ever produced as a return value; never listed as a member.
fn session() -> Arc<TypeDef> {
    TypeDef::builder(UNIT, "Session")
        .method("user", Signature::empty(), |_ctx, this, _args| {
            Ok(this.get("user").unwrap_or(Value::Nothing))
        })
        .method("close", Signature::empty(), |_ctx, this, _args| {
            this.set("open", Value::Bool(false));
            Ok(Value::Nothing)
        })
        .build()
}

pub(super) fn units() -> Vec<UnitLoad> {
    let counter = counter();
    let session = session();
    let made = Arc::clone(&counter);

    let unit = Unit::builder(UNIT)
        .function(
            "greet",
            Signature::new(vec![Parameter::positional("name").with_default("world")]),
            |_ctx, args| Ok(Value::str(format!("hello {}", args.value("name")?.as_str()?))),
        )
        .function(
            "add",
            Signature::new(vec![
                Parameter::positional("a"),
                Parameter::positional("b").with_default(5),
            ]),
            |_ctx, args| Ok(Value::Int(args.value("a")?.as_int()? + args.value("b")?.as_int()?)),
        )
        .function(
            "shout",
            Signature::new(vec![Parameter::positional_only("text")]),
            |_ctx, args| Ok(Value::str(args.value("text")?.as_str()?.to_uppercase())),
        )
        .function(
            "configure",
            Signature::new(vec![
                Parameter::positional("path"),
                Parameter::named_only("strict").with_default(false),
                Parameter::variadic_named("options"),
            ]),
            |_ctx, args| {
                let path = args.value("path")?;
                Ok(Value::Map(vec![
                    ("path".to_string(), path.attr("resolve")?.call(&[])?),
                    ("strict".to_string(), args.value("strict")?.clone()),
                ]))
            },
        )
        .type_def(counter)
        .function("make_counter", Signature::empty(), move |_ctx, _args| {
            let instance = Instance::new(Arc::clone(&made));
            instance.set("count", Value::Int(10));
            Ok(Value::Instance(instance))
        })
        .function(
            "open_session",
            Signature::new(vec![Parameter::positional("user")]),
            move |_ctx, args| {
                let instance = Instance::new(Arc::clone(&session));
                instance.set("user", args.value("user")?.clone());
                instance.set("open", Value::Bool(true));
                Ok(Value::Instance(instance))
            },
        )
        .function("numbers", Signature::empty(), |_ctx, _args| {
            Ok(Value::Lazy(LazySeq::from_values(
                (1..=3).map(Value::Int).collect::<Vec<_>>(),
            )))
        })
        .function("nothing", Signature::empty(), |_ctx, _args| Ok(Value::Nothing))
        .other("VERSION", "constant '1.2.0'")
        .other("util", "submodule")
        .build();

    vec![UnitLoad::loaded(unit)]
}
