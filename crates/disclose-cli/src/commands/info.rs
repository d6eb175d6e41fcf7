//! Info command implementation.

use anyhow::Result;
use serde_json::json;
use std::path::Path;

use super::{call, client, load_config, read_receipt};
use crate::output::Report;

pub async fn run(receipt_path: &Path) -> Result<Report> {
    let config = load_config(None, None)?;
    let client = client(&config);
    let receipt = read_receipt(receipt_path).await?;

    let info = call(&config, client.describe(&receipt)).await?;
    Ok(Report::Done(json!({ "info": info })))
}
