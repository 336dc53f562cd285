//! `async_sample`: deferred results and asynchronous streams.

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use prober_types::{AsyncSeq, Deferred, Fault, Instance, Parameter, Signature, TypeDef, Unit, Value};

use crate::package::UnitLoad;

const UNIT: &str = "async_sample";

fn client() -> Arc<TypeDef> {
    TypeDef::builder(UNIT, "Client")
        .method(
            "send",
            Signature::new(vec![Parameter::positional("message")]),
            |_ctx, this, args| {
                let host = this.get("host").unwrap_or(Value::Nothing);
                let message = args.value("message")?.clone();
                Ok(Value::Deferred(Deferred::new(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Value::str(format!("{host} <- {message}")))
                })))
            },
        )
        .method("events", Signature::empty(), |_ctx, _this, _args| {
            Ok(Value::AsyncLazy(AsyncSeq::new(stream::iter(
                ["connected", "ready"].map(|e| Ok::<_, Fault>(Value::str(e))),
            ))))
        })
        .build()
}

pub(super) fn units() -> Vec<UnitLoad> {
    let client = client();

    let unit = Unit::builder(UNIT)
        .function(
            "fetch",
            Signature::new(vec![Parameter::positional("url")]),
            |_ctx, args| {
                let url = args.value("url")?.as_str()?;
                Ok(Value::Deferred(Deferred::new(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Value::str(format!("payload from {url}")))
                })))
            },
        )
        .function(
            "connect",
            Signature::new(vec![
                Parameter::positional("host"),
                Parameter::named_only("port").with_default(443),
            ]),
            move |_ctx, args| {
                let instance = Instance::new(Arc::clone(&client));
                instance.set("host", args.value("host")?.clone());
                instance.set("port", args.value("port")?.clone());
                Ok(Value::Deferred(Deferred::new(async move {
                    Ok(Value::Instance(instance))
                })))
            },
        )
        .function("ticker", Signature::empty(), |_ctx, _args| {
            Ok(Value::AsyncLazy(AsyncSeq::new(stream::iter(
                (1..=3).map(|i| Ok::<_, Fault>(Value::Int(i))),
            ))))
        })
        .function("refuse", Signature::empty(), |_ctx, _args| {
            Ok(Value::Deferred(Deferred::new(async {
                Err(Fault::new("ConnectionRefusedError", "[Errno 111] Connection refused"))
            })))
        })
        .build();

    vec![UnitLoad::loaded(unit)]
}
