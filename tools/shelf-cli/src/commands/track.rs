//! Event recording and raw router calls.

use anyhow::{anyhow, bail, Context as _, Result};
use http::{Method, Request};
use serde_json::json;
use shelf_api::{ShelfApi, REQUEST_ID_HEADER};
use shelf_core::{Counter, VariantId};
use shelf_store::Store;

use super::{CallArgs, TrackArgs};
use crate::context::Context;

/// Run the track command.
pub async fn run(args: TrackArgs, ctx: &Context) -> Result<()> {
    let counter = Counter::from_str(&args.counter)
        .ok_or_else(|| anyhow!("Unknown event '{}', expected impression or click", args.counter))?;
    let variant_id = VariantId::new(args.variant_id.trim());
    if variant_id.is_blank() {
        bail!("variantId is required");
    }

    let shelf = ctx.open_store()?;
    let mut stat = None;
    for _ in 0..args.count {
        stat = Some(
            shelf
                .store
                .increment_daily_counter(&variant_id, counter)
                .await
                .with_context(|| format!("Failed to track {}", counter.as_str()))?,
        );
    }
    shelf.persist()?;

    let Some(stat) = stat else {
        ctx.output.warn("Nothing recorded (--count 0)");
        return Ok(());
    };

    if ctx.output.is_json() {
        ctx.output.json(&stat);
    } else {
        ctx.output.success(&format!(
            "{} {}: {} impressions, {} clicks today ({:.2}%)",
            variant_id,
            counter.as_str(),
            stat.impressions,
            stat.clicks,
            stat.ctr
        ));
    }
    Ok(())
}

/// Run the call command.
pub async fn call(args: CallArgs, ctx: &Context) -> Result<()> {
    let method: Method = args
        .method
        .to_uppercase()
        .parse()
        .with_context(|| format!("Invalid HTTP method: {}", args.method))?;
    let request = Request::builder()
        .method(method)
        .uri(&args.path)
        .body(args.body.unwrap_or_default().into_bytes())
        .with_context(|| format!("Invalid request path: {}", args.path))?;

    let shelf = ctx.open_store()?;
    let api = ShelfApi::new(shelf.store.clone()).with_logger(ctx.logger("api"));
    let response = api.handle(request).await;
    shelf.persist()?;

    let status = response.status();
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let body: serde_json::Value = if response.body().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(response.body())
            .unwrap_or_else(|_| json!(String::from_utf8_lossy(response.body())))
    };

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "status": status.as_u16(),
            "requestId": request_id,
            "body": body,
        }));
    } else {
        ctx.output.kv("Status", &status.to_string());
        ctx.output.kv("Request", &request_id);
        if !body.is_null() {
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    if status.is_server_error() {
        bail!("Request failed with {}", status);
    }
    Ok(())
}
