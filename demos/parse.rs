use anyhow::Context;
use cascara::{parse_stylesheet, stringify, ParseOptions, StringifyOptions};

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/sample.css".to_string());
    let input = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;

    let nodes = parse_stylesheet(&input, &ParseOptions::default());
    println!("tree: {nodes:#?}");

    let output = stringify(&nodes, &StringifyOptions::default());
    println!("roundtrip ok: {}", output == input);
    print!("{output}");

    Ok(())
}
