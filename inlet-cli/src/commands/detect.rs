//! Detect command - inspect a statement file without parsing it

use std::path::Path;

use anyhow::Result;

use crate::commands::get_context;
use crate::output;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let ctx = get_context(None)?;

    let detector = inlet_core::services::FileDetector::new(ctx.config.max_file_size);
    let info = detector.get_file_info(file)?;
    let encoding = detector.detect_encoding(file)?;
    let (valid, errors) = detector.validate_file(file)?;

    let filename = info.name.clone();
    let parser = ctx
        .registry
        .find_parser(&filename, info.mime.as_deref())
        .map(|p| p.name().to_string());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "name": info.name,
                "extension": info.extension,
                "size": info.size,
                "mime": info.mime,
                "encoding": encoding,
                "valid": valid,
                "errors": errors,
                "parser": parser,
            }))?
        );
        return Ok(());
    }

    println!("File:      {}", info.name);
    println!("Size:      {}", output::format_size(info.size));
    println!("MIME:      {}", info.mime.as_deref().unwrap_or("unknown"));
    println!("Encoding:  {encoding}");
    match parser {
        Some(name) => println!("Parser:    {name}"),
        None => output::warning("Parser:    none (unsupported format)"),
    }

    if valid {
        output::success("Validation passed");
    } else {
        for error in &errors {
            output::warning(&format!("Validation: {error}"));
        }
    }
    Ok(())
}
