//! `hostile`: members that misbehave in every way a call can.

use std::sync::Arc;
use std::time::Duration;

use prober_types::{Deferred, Fault, LazySeq, Parameter, Signature, TypeDef, Unit, Value};

use crate::package::UnitLoad;

const UNIT: &str = "hostile";

/// Refuses to be constructed.
fn guard() -> Arc<TypeDef> {
    TypeDef::builder(UNIT, "Guard")
        .constructor_signature(Signature::new(vec![Parameter::positional("token")]))
        .init(|_ctx, _this, args| {
            Err(Fault::new(
                "PermissionError",
                format!("invalid token {}", args.value("token")?),
            ))
        })
        .method("open", Signature::empty(), |_ctx, _this, _args| {
            Ok(Value::Bool(true))
        })
        .build()
}

/// Constructs fine, but its methods hang or exit.
fn daemon() -> Arc<TypeDef> {
    TypeDef::builder(UNIT, "Daemon")
        .method("serve", Signature::empty(), |ctx, _this, _args| {
            ctx.print("listening on 0.0.0.0:4444");
            ctx.sleep(Duration::from_secs(3600))?;
            Ok(Value::Nothing)
        })
        .method("stop", Signature::empty(), |_ctx, _this, _args| {
            Err(Fault::exit(0))
        })
        .build()
}

pub(super) fn units() -> Vec<UnitLoad> {
    let unit = Unit::builder(UNIT)
        .function("fail", Signature::empty(), |_ctx, _args| {
            Err(Fault::new("ValueError", "refusing to run"))
        })
        .function(
            "quit",
            Signature::new(vec![Parameter::positional("code").with_default(3)]),
            |_ctx, args| {
                let code = i32::try_from(args.value("code")?.as_int()?).unwrap_or(1);
                Err(Fault::exit(code))
            },
        )
        .function("hang", Signature::empty(), |ctx, _args| {
            ctx.sleep(Duration::from_secs(3600))?;
            Ok(Value::Nothing)
        })
        .function("crash", Signature::empty(), |_ctx, _args| {
            panic!("index out of bounds: the len is 0 but the index is 0")
        })
        .function("forever", Signature::empty(), |_ctx, _args| {
            Ok(Value::Lazy(LazySeq::new((0..).map(|i| {
                std::thread::sleep(Duration::from_millis(1));
                Ok(Value::Int(i))
            }))))
        })
        .function("never", Signature::empty(), |_ctx, _args| {
            Ok(Value::Deferred(Deferred::new(futures::future::pending())))
        })
        .function(
            "beacon",
            Signature::new(vec![Parameter::positional("host")]),
            |ctx, args| {
                ctx.print(format!("connecting to {}", args.value("host")?));
                ctx.print("\x1b[2Jsent 512 bytes");
                Ok(Value::Nothing)
            },
        )
        .function(
            "broken",
            Signature::new(vec![
                Parameter::positional("a").with_default(1),
                Parameter::positional("b"),
            ]),
            |_ctx, _args| Ok(Value::Nothing),
        )
        .type_def(guard())
        .type_def(daemon())
        .other("PAYLOAD", "bytes constant")
        .build();

    vec![
        UnitLoad::loaded(unit),
        UnitLoad::failed(
            "hostile.native",
            "ImportError: libcrypt.so.1: cannot open shared object file",
        ),
    ]
}
